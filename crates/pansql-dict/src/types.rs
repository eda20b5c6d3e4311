//! Field type system.
//!
//! Every dictionary field carries a `FieldType`: a type tag plus
//! nullability and collection flags. Assignability between a source and a
//! destination field is decided by a fixed tag-compatibility matrix
//! combined with the nullability rule (a nullable source may only feed a
//! nullable destination).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying the primitive type of a field.
///
/// The set is closed; connectors map their native types onto it when a
/// dictionary is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Single,
    Double,
    Decimal,
    Money,
    Date,
    DateTime,
    DateTimeTZ,
    Time,
    Interval,
    Char,
    Varchar,
    Text,
    Nchar,
    Nvarchar,
    Ntext,
    Binary,
    Varbinary,
    Blob,
    Json,
    Xml,
    Guid,
}

impl TypeTag {
    /// Whether a value of this tag can be stored into a field of tag `dst`
    /// without loss.
    ///
    /// Identity always holds; beyond that the matrix admits integral
    /// widening, integer-to-float/decimal widening, date-to-datetime, and
    /// unification within the text and binary families.
    pub fn compatible_with(self, dst: TypeTag) -> bool {
        use TypeTag::*;
        if self == dst {
            return true;
        }
        matches!(
            (self, dst),
            (Byte, Short | Int | Long)
                | (Short, Int | Long)
                | (Int, Long)
                | (Byte | Short | Int | Long, Single | Double | Decimal | Money)
                | (Single, Double)
                | (Decimal, Money)
                | (Money, Decimal)
                | (Date, DateTime | DateTimeTZ)
                | (DateTime, DateTimeTZ)
                | (Char, Varchar | Text | Nchar | Nvarchar | Ntext)
                | (Varchar, Text | Nvarchar | Ntext)
                | (Nchar, Nvarchar | Ntext)
                | (Nvarchar, Ntext)
                | (Text, Ntext)
                | (Binary, Varbinary | Blob)
                | (Varbinary, Blob)
        )
    }

    /// Whether the tag belongs to the text family (rendered as strings).
    pub fn is_text(self) -> bool {
        use TypeTag::*;
        matches!(self, Char | Varchar | Text | Nchar | Nvarchar | Ntext | Json | Xml)
    }

    /// Whether the tag is an integral or floating numeric type.
    pub fn is_numeric(self) -> bool {
        use TypeTag::*;
        matches!(
            self,
            Byte | Short | Int | Long | Single | Double | Decimal | Money
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Complete type of a dictionary field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Primitive type tag
    pub tag: TypeTag,
    /// Whether the field admits NULL
    #[serde(default)]
    pub nullable: bool,
    /// Whether the field is a collection of the tagged type
    #[serde(default)]
    pub collection: bool,
    /// Connector-specific refinement (length, precision), opaque here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_info: Option<String>,
}

impl FieldType {
    /// A plain, non-nullable scalar of the given tag.
    pub fn plain(tag: TypeTag) -> Self {
        Self {
            tag,
            nullable: false,
            collection: false,
            type_info: None,
        }
    }

    /// A nullable scalar of the given tag.
    pub fn nullable(tag: TypeTag) -> Self {
        Self {
            nullable: true,
            ..Self::plain(tag)
        }
    }

    /// Whether a value of this type may be assigned to a field of type
    /// `dst`.
    ///
    /// Requires tag compatibility, matching collection-ness, and that the
    /// source is non-nullable or the destination nullable.
    pub fn assignable_to(&self, dst: &FieldType) -> bool {
        self.tag.compatible_with(dst.tag)
            && self.collection == dst.collection
            && (!self.nullable || dst.nullable)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if self.collection {
            write!(f, "[]")?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_always_compatible() {
        for tag in [TypeTag::Int, TypeTag::Varchar, TypeTag::Guid, TypeTag::Blob] {
            assert!(tag.compatible_with(tag));
        }
    }

    #[test]
    fn test_integral_widening() {
        assert!(TypeTag::Byte.compatible_with(TypeTag::Int));
        assert!(TypeTag::Short.compatible_with(TypeTag::Long));
        assert!(TypeTag::Int.compatible_with(TypeTag::Long));
        assert!(!TypeTag::Long.compatible_with(TypeTag::Int));
        assert!(!TypeTag::Int.compatible_with(TypeTag::Short));
    }

    #[test]
    fn test_int_to_float_and_decimal() {
        assert!(TypeTag::Int.compatible_with(TypeTag::Double));
        assert!(TypeTag::Long.compatible_with(TypeTag::Decimal));
        assert!(TypeTag::Single.compatible_with(TypeTag::Double));
        assert!(!TypeTag::Double.compatible_with(TypeTag::Int));
        assert!(!TypeTag::Double.compatible_with(TypeTag::Decimal));
    }

    #[test]
    fn test_text_family() {
        assert!(TypeTag::Char.compatible_with(TypeTag::Varchar));
        assert!(TypeTag::Varchar.compatible_with(TypeTag::Text));
        assert!(TypeTag::Varchar.compatible_with(TypeTag::Nvarchar));
        assert!(!TypeTag::Text.compatible_with(TypeTag::Varchar));
        assert!(!TypeTag::Varchar.compatible_with(TypeTag::Int));
    }

    #[test]
    fn test_binary_family() {
        assert!(TypeTag::Binary.compatible_with(TypeTag::Blob));
        assert!(TypeTag::Varbinary.compatible_with(TypeTag::Blob));
        assert!(!TypeTag::Blob.compatible_with(TypeTag::Binary));
    }

    #[test]
    fn test_temporal() {
        assert!(TypeTag::Date.compatible_with(TypeTag::DateTime));
        assert!(TypeTag::DateTime.compatible_with(TypeTag::DateTimeTZ));
        assert!(!TypeTag::DateTime.compatible_with(TypeTag::Date));
    }

    #[test]
    fn test_nullability_rule() {
        let src = FieldType::nullable(TypeTag::Int);
        let dst = FieldType::plain(TypeTag::Int);
        assert!(!src.assignable_to(&dst));
        assert!(dst.assignable_to(&src));
        assert!(src.assignable_to(&src));
    }

    #[test]
    fn test_collection_must_match() {
        let scalar = FieldType::plain(TypeTag::Int);
        let coll = FieldType {
            collection: true,
            ..FieldType::plain(TypeTag::Int)
        };
        assert!(!scalar.assignable_to(&coll));
        assert!(!coll.assignable_to(&scalar));
        assert!(coll.assignable_to(&coll));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::plain(TypeTag::Int).to_string(), "Int");
        assert_eq!(FieldType::nullable(TypeTag::Varchar).to_string(), "Varchar?");
    }
}
