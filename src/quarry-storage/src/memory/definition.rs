//! JSON form of product definitions.
//!
//! Definitions are deserialized into plain structures first and then
//! validated while being turned into shared [`TypeNode`]s.

use std::collections::HashSet;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};
use quarry_core::shape::MAX_NUM_DIMS;
use quarry_core::{
    Conversion, NativeReadType, RecordField, SpecialType, TypeClass, TypeKind, TypeNode,
};
use serde::Deserialize;

/// A whole product description: identification, layout and content.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDescription {
    #[serde(default, rename = "class")]
    pub product_class: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub version: i32,
    pub definition: TypeDefinition,
    pub data: serde_json::Value,
}

/// Definition of one node.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub attributes: Option<Box<TypeDefinition>>,
    #[serde(flatten)]
    pub kind: KindDefinition,
}

/// Class-specific part of a definition, tagged by `"class"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum KindDefinition {
    Record {
        #[serde(default)]
        fields: Vec<FieldDefinition>,
    },
    Array {
        dims: Vec<i64>,
        base: Box<TypeDefinition>,
    },
    Integer {
        read_type: NativeReadType,
        #[serde(default)]
        conversion: Option<Conversion>,
    },
    Real {
        #[serde(default = "default_real_read_type")]
        read_type: NativeReadType,
        #[serde(default)]
        conversion: Option<Conversion>,
    },
    Text {
        #[serde(default = "default_text_read_type")]
        read_type: NativeReadType,
        #[serde(default)]
        length: Option<u64>,
    },
    Raw {
        #[serde(default)]
        length: Option<u64>,
    },
    Special {
        special_type: SpecialType,
        base: Box<TypeDefinition>,
    },
}

fn default_real_read_type() -> NativeReadType {
    NativeReadType::Double
}

fn default_text_read_type() -> NativeReadType {
    NativeReadType::String
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_definition: TypeDefinition,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub optional: bool,
}

impl TypeDefinition {
    /// Validate and convert into a schema node.
    pub fn into_node(self) -> QuarryResult<Arc<TypeNode>> {
        self.build("")
    }

    fn build(self, path: &str) -> QuarryResult<Arc<TypeNode>> {
        let here = if path.is_empty() { "/" } else { path };
        let kind = match self.kind {
            KindDefinition::Record { fields } => {
                let mut seen = HashSet::new();
                let mut built = Vec::with_capacity(fields.len());
                for field in fields {
                    if !seen.insert(field.name.clone()) {
                        return Err(QuarryError::data_definition(format!(
                            "duplicate field '{}' in record at {}",
                            field.name, here
                        )));
                    }
                    let child = field.type_definition.build(&format!("{path}/{}", field.name))?;
                    built.push(
                        RecordField::new(field.name, child)
                            .with_hidden(field.hidden)
                            .with_optional(field.optional),
                    );
                }
                TypeKind::Record { fields: built }
            }
            KindDefinition::Array { dims, base } => {
                if dims.len() > MAX_NUM_DIMS {
                    return Err(QuarryError::data_definition(format!(
                        "array at {here} has {} dimensions (max {MAX_NUM_DIMS})",
                        dims.len()
                    )));
                }
                if dims.iter().any(|&d| d < -1) {
                    return Err(QuarryError::data_definition(format!(
                        "array at {here} has an invalid dimension in {dims:?}"
                    )));
                }
                TypeKind::Array {
                    dims,
                    base: base.build(&format!("{path}[]"))?,
                }
            }
            KindDefinition::Integer {
                read_type,
                conversion,
            } => {
                if !read_type.is_integer() {
                    return Err(read_type_error(here, "integer", read_type));
                }
                TypeKind::Integer {
                    read_type,
                    conversion,
                }
            }
            KindDefinition::Real {
                read_type,
                conversion,
            } => {
                if !read_type.is_floating() {
                    return Err(read_type_error(here, "real", read_type));
                }
                TypeKind::Real {
                    read_type,
                    conversion,
                }
            }
            KindDefinition::Text { read_type, length } => {
                match read_type {
                    NativeReadType::String => {}
                    NativeReadType::Char if length.unwrap_or(1) == 1 => {}
                    other => return Err(read_type_error(here, "text", other)),
                }
                let length = match read_type {
                    NativeReadType::Char => Some(1),
                    _ => length,
                };
                TypeKind::Text { read_type, length }
            }
            KindDefinition::Raw { length } => TypeKind::Raw { length },
            KindDefinition::Special { special_type, base } => {
                let base = base.build(path)?;
                check_special_base(here, special_type, &base)?;
                TypeKind::Special { special_type, base }
            }
        };

        let attributes = match self.attributes {
            Some(attributes) => {
                if !matches!(kind, TypeKind::Record { .. }) {
                    return Err(QuarryError::data_definition(format!(
                        "attributes at {here} are only supported on records"
                    )));
                }
                let attributes = attributes.build(&format!("{path}@"))?;
                if attributes.type_class() != TypeClass::Record {
                    return Err(QuarryError::data_definition(format!(
                        "attributes at {here} must be a record"
                    )));
                }
                Some(attributes)
            }
            None => None,
        };

        Ok(Arc::new(TypeNode {
            name: self.name,
            description: self.description,
            unit: self.unit,
            attributes,
            kind,
        }))
    }
}

fn read_type_error(here: &str, class: &str, read_type: NativeReadType) -> QuarryError {
    QuarryError::data_definition(format!(
        "read type '{read_type}' is not valid for {class} node at {here}"
    ))
}

fn check_special_base(here: &str, special_type: SpecialType, base: &TypeNode) -> QuarryResult<()> {
    let valid = match special_type {
        SpecialType::NoData => true,
        SpecialType::Time => matches!(
            base.type_class(),
            TypeClass::Integer | TypeClass::Real | TypeClass::Text
        ),
        SpecialType::VsfInteger => {
            base.record_field_index("value").is_ok()
                && base.record_field_index("scale_factor").is_ok()
        }
        SpecialType::Complex => match &base.kind {
            TypeKind::Record { fields } => fields.len() == 2,
            TypeKind::Array { dims, .. } => dims.len() == 1 && dims[0] == 2,
            _ => false,
        },
    };
    if valid {
        Ok(())
    } else {
        Err(QuarryError::data_definition(format!(
            "invalid base type ({}) for {} special node at {here}",
            base.type_class(),
            special_type.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(value: serde_json::Value) -> QuarryResult<Arc<TypeNode>> {
        let def: TypeDefinition = serde_json::from_value(value)?;
        def.into_node()
    }

    #[test]
    fn test_nested_definition() {
        let node = definition(json!({
            "class": "record",
            "fields": [
                {"name": "count", "type": {"class": "integer", "read_type": "int32"}},
                {"name": "samples", "type": {
                    "class": "array", "dims": [-1],
                    "base": {"class": "real", "unit": "K"}
                }, "hidden": true}
            ]
        }))
        .unwrap();
        assert_eq!(node.num_record_fields().unwrap(), 2);
        let samples = node.record_field(1).unwrap();
        assert!(samples.hidden);
        assert_eq!(samples.type_node.array_dims().unwrap(), &[-1]);
        let base = samples.type_node.array_base().unwrap();
        assert_eq!(base.unit.as_deref(), Some("K"));
        assert_eq!(base.read_type(true), Some(NativeReadType::Double));
    }

    #[test]
    fn test_invalid_read_type() {
        let err = definition(json!({"class": "integer", "read_type": "double"})).unwrap_err();
        assert_eq!(err.code(), -400);
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let err = definition(json!({
            "class": "record",
            "fields": [
                {"name": "a", "type": {"class": "raw"}},
                {"name": "a", "type": {"class": "raw"}}
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    fn test_special_base_checked() {
        assert!(definition(json!({
            "class": "special", "special_type": "time",
            "base": {"class": "real"}
        }))
        .is_ok());
        assert!(definition(json!({
            "class": "special", "special_type": "complex",
            "base": {"class": "real"}
        }))
        .is_err());
    }

    #[test]
    fn test_too_many_dims() {
        let err = definition(json!({
            "class": "array", "dims": [1, 1, 1, 1, 1, 1, 1, 1, 1],
            "base": {"class": "raw"}
        }))
        .unwrap_err();
        assert_eq!(err.code(), -400);
    }
}
