//! Project/build manifest emitter.
//!
//! Lists the runtime library plus one package entry per referenced
//! connector, in first-reference order.

use super::connectors::connector_assembly;
use crate::ir::ProgramIr;

/// Render the `.csproj` build manifest.
pub fn emit_project(ir: &ProgramIr) -> String {
    let mut out = String::new();
    out.push_str("<Project Sdk=\"Microsoft.NET.Sdk\">\n");
    out.push_str("  <PropertyGroup>\n");
    out.push_str("    <OutputType>Exe</OutputType>\n");
    out.push_str("    <TargetFramework>net8.0</TargetFramework>\n");
    out.push_str("    <Nullable>enable</Nullable>\n");
    out.push_str("  </PropertyGroup>\n");
    out.push_str("  <ItemGroup>\n");
    out.push_str("    <PackageReference Include=\"Pansynchro.Core\" Version=\"*\" />\n");
    for connector in &ir.connectors {
        out.push_str(&format!(
            "    <PackageReference Include=\"{}\" Version=\"*\" />\n",
            connector_assembly(connector)
        ));
    }
    out.push_str("  </ItemGroup>\n");
    out.push_str("</Project>\n");
    out
}
