//! Product content loaded into an arena of data nodes.
//!
//! Every node of the loaded tree gets an id; cursor frames use that id as
//! their locator.

use common_error::{QuarryError, QuarryResult};
use quarry_core::{LeafValue, NativeReadType, SpecialType, TypeKind, TypeNode};
use serde_json::Value as JsonValue;

/// Key under which a record's attribute record is stored.
pub const ATTRIBUTES_KEY: &str = "@attributes";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DataNode {
    /// `None` marks an unavailable optional field.
    Record {
        fields: Vec<Option<usize>>,
        attributes: Option<usize>,
    },
    Array {
        dims: Vec<usize>,
        elements: Vec<usize>,
    },
    Leaf(LeafValue),
    Raw(Vec<u8>),
    Special {
        base: usize,
    },
}

/// Builds the arena while validating content against the definition.
#[derive(Debug, Default)]
pub(crate) struct Loader {
    nodes: Vec<DataNode>,
}

impl Loader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_nodes(self) -> Vec<DataNode> {
        self.nodes
    }

    pub(crate) fn push(&mut self, node: DataNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Load `value` as an instance of `node`, returning the new node id.
    pub(crate) fn load(&mut self, node: &TypeNode, value: &JsonValue, path: &str) -> QuarryResult<usize> {
        let here = if path.is_empty() { "/" } else { path };
        let data = match &node.kind {
            TypeKind::Record { fields } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| mismatch(here, "an object", value))?;
                for key in object.keys() {
                    if key != ATTRIBUTES_KEY && !fields.iter().any(|field| &field.name == key) {
                        return Err(QuarryError::data_definition(format!(
                            "unknown field '{key}' in record at {here}"
                        )));
                    }
                }
                let mut ids = Vec::with_capacity(fields.len());
                for field in fields {
                    let child_path = format!("{path}/{}", field.name);
                    match object.get(&field.name) {
                        Some(child) => ids.push(Some(self.load(&field.type_node, child, &child_path)?)),
                        None if field.optional => ids.push(None),
                        None => {
                            return Err(QuarryError::data_definition(format!(
                                "missing mandatory field '{}' in record at {here}",
                                field.name
                            )))
                        }
                    }
                }
                let attributes = match (&node.attributes, object.get(ATTRIBUTES_KEY)) {
                    (Some(attr_type), Some(attr_value)) => {
                        Some(self.load(attr_type, attr_value, &format!("{path}@"))?)
                    }
                    (Some(_), None) => {
                        return Err(QuarryError::data_definition(format!(
                            "missing attributes for record at {here}"
                        )))
                    }
                    (None, Some(_)) => {
                        return Err(QuarryError::data_definition(format!(
                            "record at {here} does not define attributes"
                        )))
                    }
                    (None, None) => None,
                };
                DataNode::Record {
                    fields: ids,
                    attributes,
                }
            }
            TypeKind::Array { dims, base } => {
                let (actual, items) = array_content(dims, value, here)?;
                let mut elements = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    elements.push(self.load(base, item, &format!("{path}[{i}]"))?);
                }
                DataNode::Array {
                    dims: actual,
                    elements,
                }
            }
            TypeKind::Integer { read_type, .. } => DataNode::Leaf(integer_leaf(*read_type, value, here)?),
            TypeKind::Real { .. } => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| mismatch(here, "a number", value))?;
                DataNode::Leaf(LeafValue::Real(v))
            }
            TypeKind::Text { read_type, length } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| mismatch(here, "a string", value))?;
                if let Some(length) = length {
                    if text.len() as u64 != *length {
                        return Err(QuarryError::data_definition(format!(
                            "text at {here} has length {} instead of {length}",
                            text.len()
                        )));
                    }
                }
                if *read_type == NativeReadType::Char && text.chars().count() != 1 {
                    return Err(mismatch(here, "a single character", value));
                }
                DataNode::Leaf(LeafValue::Text(text.to_string()))
            }
            TypeKind::Raw { length } => {
                let bytes = raw_bytes(value, here)?;
                if let Some(length) = length {
                    if bytes.len() as u64 != *length {
                        return Err(QuarryError::data_definition(format!(
                            "raw data at {here} has {} bytes instead of {length}",
                            bytes.len()
                        )));
                    }
                }
                DataNode::Raw(bytes)
            }
            TypeKind::Special { special_type, base } => {
                let base_id = if *special_type == SpecialType::NoData && value.is_null() {
                    self.push(DataNode::Raw(Vec::new()))
                } else {
                    self.load(base, value, path)?
                };
                DataNode::Special { base: base_id }
            }
        };
        Ok(self.push(data))
    }
}

fn mismatch(here: &str, expected: &str, value: &JsonValue) -> QuarryError {
    QuarryError::data_definition(format!("expected {expected} at {here}, found {value}"))
}

/// Actual extents and flat element list of an array instance.
fn array_content<'a>(
    dims: &[i64],
    value: &'a JsonValue,
    here: &str,
) -> QuarryResult<(Vec<usize>, &'a [JsonValue])> {
    let (declared, items): (Option<Vec<usize>>, &[JsonValue]) = match value {
        JsonValue::Array(items) => (None, items.as_slice()),
        JsonValue::Object(object) => {
            let declared = object
                .get("dims")
                .and_then(JsonValue::as_array)
                .map(|list| {
                    list.iter()
                        .map(|d| d.as_u64().map(|d| d as usize))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| mismatch(here, "an array object with 'dims'", value))?
                .ok_or_else(|| mismatch(here, "non-negative integer dims", value))?;
            let items = object
                .get("elements")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| mismatch(here, "an array object with 'elements'", value))?;
            (Some(declared), items.as_slice())
        }
        _ => return Err(mismatch(here, "a list", value)),
    };

    let actual: Vec<usize> = match declared {
        Some(declared) => {
            if declared.len() != dims.len() {
                return Err(QuarryError::data_definition(format!(
                    "array at {here} has {} dimensions instead of {}",
                    declared.len(),
                    dims.len()
                )));
            }
            declared
        }
        None if dims.len() == 1 => vec![items.len()],
        None if dims.iter().all(|&d| d >= 0) => dims.iter().map(|&d| d as usize).collect(),
        None => {
            return Err(QuarryError::data_definition(format!(
                "array at {here} has variable dimensions and needs an explicit 'dims' list"
            )))
        }
    };
    for (&fixed, &extent) in dims.iter().zip(&actual) {
        if fixed >= 0 && fixed as usize != extent {
            return Err(QuarryError::data_definition(format!(
                "array at {here} has extent {extent} where {fixed} is required"
            )));
        }
    }
    let count: usize = actual.iter().product();
    if count != items.len() {
        return Err(QuarryError::data_definition(format!(
            "array at {here} has {} elements instead of {count}",
            items.len()
        )));
    }
    Ok((actual, items))
}

fn integer_leaf(read_type: NativeReadType, value: &JsonValue, here: &str) -> QuarryResult<LeafValue> {
    let (min, max) = read_type
        .integer_range()
        .ok_or_else(|| QuarryError::internal("integer node with non-integer read type"))?;
    let v: i128 = if let Some(v) = value.as_i64() {
        i128::from(v)
    } else if let Some(v) = value.as_u64() {
        i128::from(v)
    } else {
        return Err(mismatch(here, "an integer", value));
    };
    if v < min || v > max {
        return Err(QuarryError::data_definition(format!(
            "value {v} at {here} is out of range for {read_type}"
        )));
    }
    Ok(match read_type {
        NativeReadType::Uint8
        | NativeReadType::Uint16
        | NativeReadType::Uint32
        | NativeReadType::Uint64 => LeafValue::UInt(v as u64),
        _ => LeafValue::Int(v as i64),
    })
}

fn raw_bytes(value: &JsonValue, here: &str) -> QuarryResult<Vec<u8>> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| mismatch(here, "a byte value", item))
            })
            .collect(),
        JsonValue::String(hex) => {
            if hex.len() % 2 != 0 {
                return Err(mismatch(here, "an even-length hex string", value));
            }
            (0..hex.len())
                .step_by(2)
                .map(|i| {
                    hex.get(i..i + 2)
                        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                        .ok_or_else(|| mismatch(here, "a hex string", value))
                })
                .collect()
        }
        _ => Err(mismatch(here, "a byte list or hex string", value)),
    }
}
