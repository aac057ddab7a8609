//! Shared sample product for storage tests.

#![allow(dead_code)]

use std::sync::Arc;

use common_config::StorageOptions;
use quarry_core::Cursor;
use quarry_storage::MemoryProduct;
use serde_json::{json, Value};

/// A product touching every type class and special type.
pub fn sample_description() -> Value {
    json!({
        "class": "TEST",
        "type": "SAMPLE",
        "version": 2,
        "definition": {
            "class": "record",
            "fields": [
                {"name": "id", "type": {"class": "integer", "read_type": "int32", "description": "Identifier"}},
                {"name": "label", "type": {"class": "text"}},
                {"name": "flag", "type": {"class": "text", "read_type": "char"}},
                {"name": "matrix", "type": {"class": "array", "dims": [2, 3],
                    "base": {"class": "integer", "read_type": "int16"}}},
                {"name": "temps", "type": {"class": "array", "dims": [-1],
                    "base": {"class": "real", "read_type": "float", "unit": "K"}}},
                {"name": "scaled", "type": {"class": "integer", "read_type": "uint16",
                    "conversion": {"numerator": 1.0, "denominator": 10.0}}},
                {"name": "stamp", "type": {"class": "special", "special_type": "time",
                    "base": {"class": "real"}}},
                {"name": "iso", "type": {"class": "special", "special_type": "time",
                    "base": {"class": "text"}}},
                {"name": "vsf", "type": {"class": "special", "special_type": "vsf_integer",
                    "base": {"class": "record", "fields": [
                        {"name": "value", "type": {"class": "integer", "read_type": "int32"}},
                        {"name": "scale_factor", "type": {"class": "integer", "read_type": "int8"}}
                    ]}}},
                {"name": "z", "type": {"class": "special", "special_type": "complex",
                    "base": {"class": "array", "dims": [2], "base": {"class": "real"}}}},
                {"name": "blob", "type": {"class": "raw", "length": 4}},
                {"name": "secret", "type": {"class": "integer", "read_type": "uint8"}, "hidden": true},
                {"name": "extra", "type": {"class": "integer", "read_type": "int64"}, "optional": true},
                {"name": "records", "type": {"class": "array", "dims": [-1],
                    "base": {"class": "record", "fields": [
                        {"name": "x", "type": {"class": "real"}},
                        {"name": "tag", "type": {"class": "text"}}
                    ]}}},
                {"name": "header", "type": {"class": "record",
                    "attributes": {"class": "record", "fields": [
                        {"name": "origin", "type": {"class": "text"}}
                    ]},
                    "fields": [
                        {"name": "n", "type": {"class": "integer", "read_type": "uint32"}}
                    ]}},
                {"name": "empty", "type": {"class": "array", "dims": [-1],
                    "base": {"class": "integer", "read_type": "int32"}}},
                {"name": "nothing", "type": {"class": "special", "special_type": "no_data",
                    "base": {"class": "raw", "length": 0}}}
            ]
        },
        "data": {
            "id": 7,
            "label": "alpha",
            "flag": "Q",
            "matrix": [1, 2, 3, 4, 5, 6],
            "temps": [250.5, 260.25, 270.0],
            "scaled": 123,
            "stamp": 86400.5,
            "iso": "2000-01-02 00:00:00",
            "vsf": {"value": 12345, "scale_factor": 2},
            "z": [1.5, -2.0],
            "blob": "deadbeef",
            "secret": 9,
            "records": [{"x": 1.0, "tag": "a"}, {"x": 2.0, "tag": "b"}],
            "header": {"n": 5, "@attributes": {"origin": "lab"}},
            "empty": [],
            "nothing": null
        }
    })
}

pub fn sample_product() -> Arc<MemoryProduct> {
    Arc::new(MemoryProduct::from_json_value("sample.json", sample_description()).unwrap())
}

pub fn root_cursor(options: StorageOptions) -> Cursor {
    Cursor::new(sample_product(), options).unwrap()
}

pub fn cursor_at(options: StorageOptions, field: &str) -> Cursor {
    let mut cursor = root_cursor(options);
    cursor.goto_record_field_by_name(field).unwrap();
    cursor
}
