//! C# rendering helpers: type names, reader accessors, string escaping.

use pansql_dict::TypeTag;

/// The typed `IDataReader` accessor for a tag, when one exists.
/// Tags without a dedicated accessor go through `GetValue` plus a cast.
pub fn accessor(tag: TypeTag) -> Option<&'static str> {
    use TypeTag::*;
    match tag {
        Boolean => Some("GetBoolean"),
        Byte => Some("GetByte"),
        Short => Some("GetInt16"),
        Int => Some("GetInt32"),
        Long => Some("GetInt64"),
        Single => Some("GetFloat"),
        Double => Some("GetDouble"),
        Decimal | Money => Some("GetDecimal"),
        Date | DateTime => Some("GetDateTime"),
        Char | Varchar | Text | Nchar | Nvarchar | Ntext | Json | Xml => Some("GetString"),
        Guid => Some("GetGuid"),
        DateTimeTZ | Time | Interval | Binary | Varbinary | Blob => None,
    }
}

/// The CLR type a tag maps to.
pub fn clr_type(tag: TypeTag) -> &'static str {
    use TypeTag::*;
    match tag {
        Boolean => "bool",
        Byte => "byte",
        Short => "short",
        Int => "int",
        Long => "long",
        Single => "float",
        Double => "double",
        Decimal | Money => "decimal",
        Date | DateTime => "DateTime",
        DateTimeTZ => "DateTimeOffset",
        Time | Interval => "TimeSpan",
        Char | Varchar | Text | Nchar | Nvarchar | Ntext | Json | Xml => "string",
        Binary | Varbinary | Blob => "byte[]",
        Guid => "Guid",
    }
}

/// The CLR type with a `?` suffix when nullable.
pub fn clr_type_opt(tag: TypeTag, nullable: bool) -> String {
    if nullable {
        format!("{}?", clr_type(tag))
    } else {
        clr_type(tag).to_string()
    }
}

/// Whether the CLR mapping is a value type (`.Value` unwraps a nullable).
pub fn is_value_type(tag: TypeTag) -> bool {
    use TypeTag::*;
    !matches!(
        tag,
        Char | Varchar | Text | Nchar | Nvarchar | Ntext | Json | Xml | Binary | Varbinary | Blob
    )
}

/// Whether values of this tag compare through `string.Compare`.
pub fn is_text(tag: TypeTag) -> bool {
    tag.is_text()
}

/// Render the typed read of column `ordinal` from reader local `r`.
pub fn reader_access(reader: &str, ordinal: usize, tag: TypeTag) -> String {
    match accessor(tag) {
        Some(method) => format!("{}.{}({})", reader, method, ordinal),
        None => format!("({}){}.GetValue({})", clr_type(tag), reader, ordinal),
    }
}

/// Render a C# string literal.
pub fn cs_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(accessor(TypeTag::Int), Some("GetInt32"));
        assert_eq!(accessor(TypeTag::Varchar), Some("GetString"));
        assert_eq!(accessor(TypeTag::Time), None);
    }

    #[test]
    fn test_reader_access_forms() {
        assert_eq!(reader_access("r", 2, TypeTag::Int), "r.GetInt32(2)");
        assert_eq!(
            reader_access("r", 4, TypeTag::Interval),
            "(TimeSpan)r.GetValue(4)"
        );
        assert_eq!(
            reader_access("r", 0, TypeTag::Blob),
            "(byte[])r.GetValue(0)"
        );
    }

    #[test]
    fn test_clr_types() {
        assert_eq!(clr_type_opt(TypeTag::Int, true), "int?");
        assert_eq!(clr_type_opt(TypeTag::Varchar, false), "string");
        assert_eq!(clr_type_opt(TypeTag::Nvarchar, true), "string?");
    }

    #[test]
    fn test_cs_string_escaping() {
        assert_eq!(cs_string("plain"), "\"plain\"");
        assert_eq!(cs_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(cs_string("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(cs_string("line\nbreak"), "\"line\\nbreak\"");
    }
}
