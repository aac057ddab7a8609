//! Host structure definitions built from record layouts.

use std::collections::HashMap;
use std::sync::Arc;

use common_config::EngineOptions;
use common_error::QuarryResult;
use quarry_core::shape::host_dims;
use quarry_core::{Cursor, NativeType, PrimitiveType, StructDef, StructField};

use crate::classify::{classify_cursor, element_type, Classification};

/// Deduplicates structure definitions by their layout.
///
/// Records with identical host layouts share one `Arc<StructDef>`, so
/// repeated fetches of the same record type do not allocate new
/// definitions.
#[derive(Debug, Default)]
pub struct StructCache {
    defs: HashMap<StructDef, Arc<StructDef>>,
}

impl StructCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared instance of a definition.
    pub fn intern(&mut self, def: StructDef) -> Arc<StructDef> {
        if let Some(shared) = self.defs.get(&def) {
            return Arc::clone(shared);
        }
        let shared = Arc::new(def.clone());
        self.defs.insert(def, Arc::clone(&shared));
        shared
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }
}

/// Indices of the fields of the record at `cursor` that appear in its host
/// structure, in schema order.
pub fn included_fields(cursor: &Cursor, options: &EngineOptions) -> QuarryResult<Vec<usize>> {
    let node = Arc::clone(cursor.type_node());
    let fields = node.record_fields()?;
    let mut included = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if !cursor.record_field_available(index)? {
            continue;
        }
        if options.filter_record_fields && field.hidden {
            continue;
        }
        included.push(index);
    }
    Ok(included)
}

/// Host-visible name of a record field.
pub fn host_field_name(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Builds structure definitions for records.
#[derive(Debug)]
pub struct StructBuilder<'a> {
    options: EngineOptions,
    cache: &'a mut StructCache,
}

impl<'a> StructBuilder<'a> {
    pub fn new(options: EngineOptions, cache: &'a mut StructCache) -> Self {
        Self { options, cache }
    }

    /// Host type of the record at `cursor`: a structure, or no-data when
    /// no field survives filtering.
    pub fn record_type(&mut self, cursor: &Cursor) -> QuarryResult<NativeType> {
        let node = Arc::clone(cursor.type_node());
        let fields = node.record_fields()?;
        let mut host_fields = Vec::new();
        for index in included_fields(cursor, &self.options)? {
            let mut field_cursor = cursor.clone();
            field_cursor.goto_record_field_by_index(index)?;
            let name = host_field_name(&fields[index].name);
            host_fields.push(self.field(name, &field_cursor)?);
        }
        if host_fields.is_empty() {
            return Ok(NativeType::NoData);
        }
        let def = self.cache.intern(StructDef::new(host_fields));
        Ok(NativeType::Struct(def))
    }

    fn field(&mut self, name: String, cursor: &Cursor) -> QuarryResult<StructField> {
        let field = match classify_cursor(cursor)? {
            Classification::Record => StructField::scalar(name, self.record_type(cursor)?),
            Classification::Array => {
                if cursor.num_elements()? == 0 {
                    return Ok(StructField::scalar(name, NativeType::NoData));
                }
                let base = cursor.type_node().array_base()?;
                let native_type = element_type(base, &cursor.options())?;
                let dims = host_dims(&cursor.array_dims()?, self.options.swap_dimensions);
                StructField::array(name, native_type, dims)
            }
            Classification::Raw => {
                let size = cursor.byte_size()?;
                if size == 0 {
                    return Ok(StructField::scalar(name, NativeType::NoData));
                }
                StructField::array(
                    name,
                    NativeType::Primitive(PrimitiveType::Byte),
                    vec![size as usize],
                )
            }
            Classification::Leaf(kind) => StructField::scalar(name, kind.native_type()),
        };
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_config::StorageOptions;
    use quarry_storage::MemoryProduct;
    use serde_json::json;

    fn cursor(description: serde_json::Value) -> Cursor {
        let product = MemoryProduct::from_json_value("test", description).unwrap();
        Cursor::new(Arc::new(product), StorageOptions::default()).unwrap()
    }

    fn nested() -> Cursor {
        cursor(json!({
            "class": "TEST",
            "type": "NESTED",
            "version": 1,
            "definition": {
                "class": "record",
                "fields": [
                    { "name": "a", "type": { "class": "integer", "read_type": "int32" } },
                    { "name": "hidden_b", "hidden": true,
                      "type": { "class": "integer", "read_type": "uint8" } },
                    { "name": "inner", "type": { "class": "record", "fields": [
                        { "name": "x", "type": { "class": "real", "read_type": "double" } }
                    ] } },
                    { "name": "grid", "type": { "class": "array", "dims": [2, 3],
                        "base": { "class": "integer", "read_type": "int16" } } },
                    { "name": "empty", "type": { "class": "array", "dims": [-1],
                        "base": { "class": "integer", "read_type": "int16" } } },
                    { "name": "bytes", "type": { "class": "raw", "length": 3 } }
                ]
            },
            "data": {
                "a": 1,
                "hidden_b": 2,
                "inner": { "x": 0.5 },
                "grid": [1, 2, 3, 4, 5, 6],
                "empty": [],
                "bytes": [1, 2, 3]
            }
        }))
    }

    #[test]
    fn test_record_type_filters_and_upper_cases() {
        let mut cache = StructCache::new();
        let mut builder = StructBuilder::new(EngineOptions::default(), &mut cache);
        let NativeType::Struct(def) = builder.record_type(&nested()).unwrap() else {
            panic!("expected a structure");
        };
        let names: Vec<&str> = def.field_names().collect();
        assert_eq!(names, vec!["A", "INNER", "GRID", "EMPTY", "BYTES"]);
        assert_eq!(def.fields()[2].dims, Some(vec![2, 3]));
        assert_eq!(def.fields()[3].native_type, NativeType::NoData);
        assert_eq!(def.fields()[4].dims, Some(vec![3]));
        assert!(matches!(def.fields()[1].native_type, NativeType::Struct(_)));
    }

    #[test]
    fn test_hidden_fields_kept_without_filtering() {
        let options = EngineOptions {
            filter_record_fields: false,
            swap_dimensions: false,
            ..EngineOptions::default()
        };
        let mut cache = StructCache::new();
        let mut builder = StructBuilder::new(options, &mut cache);
        let NativeType::Struct(def) = builder.record_type(&nested()).unwrap() else {
            panic!("expected a structure");
        };
        assert_eq!(def.field_index("HIDDEN_B"), Some(1));
        assert_eq!(def.fields()[3].dims, Some(vec![3, 2]));
    }

    #[test]
    fn test_all_fields_filtered_is_no_data() {
        let record = cursor(json!({
            "definition": { "class": "record", "fields": [
                { "name": "h", "hidden": true, "type": { "class": "integer", "read_type": "int8" } }
            ] },
            "data": { "h": 1 }
        }));
        let mut cache = StructCache::new();
        let mut builder = StructBuilder::new(EngineOptions::default(), &mut cache);
        assert_eq!(builder.record_type(&record).unwrap(), NativeType::NoData);
    }

    #[test]
    fn test_cache_shares_identical_definitions() {
        let mut cache = StructCache::new();
        let first = {
            let mut builder = StructBuilder::new(EngineOptions::default(), &mut cache);
            builder.record_type(&nested()).unwrap()
        };
        let second = {
            let mut builder = StructBuilder::new(EngineOptions::default(), &mut cache);
            builder.record_type(&nested()).unwrap()
        };
        match (first, second) {
            (NativeType::Struct(a), NativeType::Struct(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("unexpected types {other:?}"),
        }
        // outer record plus the nested one
        assert_eq!(cache.len(), 2);
    }
}
