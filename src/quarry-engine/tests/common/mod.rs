//! Shared fixtures for engine tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common_config::StorageOptions;
use common_error::QuarryResult;
use quarry_core::{ArrayData, HostArray, HostValue, Product, Scalar};
use quarry_engine::Engine;
use quarry_storage::{MemoryProduct, ProductOpener};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Sample product covering records, arrays, specials and optional fields.
pub fn sample_description() -> Value {
    let cube: Vec<u32> = (0..24).collect();
    json!({
        "class": "TEST",
        "type": "ENGINE",
        "version": 3,
        "definition": {
            "class": "record",
            "fields": [
                {"name": "id", "type": {"class": "integer", "read_type": "int32", "description": "Identifier"}},
                {"name": "name", "type": {"class": "text"}},
                {"name": "matrix", "type": {"class": "array", "dims": [2, 3],
                    "base": {"class": "integer", "read_type": "int16"}}},
                {"name": "temps", "type": {"class": "array", "dims": [-1], "unit": "K",
                    "base": {"class": "real", "read_type": "float", "unit": "K"}}},
                {"name": "stamp", "type": {"class": "special", "special_type": "time",
                    "base": {"class": "real"}}},
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
                {"name": "grid", "type": {"class": "array", "dims": [2, 2],
                    "base": {"class": "record", "fields": [
                        {"name": "v", "type": {"class": "integer", "read_type": "int32"}}
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
                    "base": {"class": "raw", "length": 0}}},
                {"name": "single", "type": {"class": "array", "dims": [],
                    "base": {"class": "integer", "read_type": "int32"}}},
                {"name": "cube", "type": {"class": "array", "dims": [2, 3, 4],
                    "base": {"class": "integer", "read_type": "uint8"}}}
            ]
        },
        "data": {
            "id": 7,
            "name": "alpha",
            "matrix": [1, 2, 3, 4, 5, 6],
            "temps": [250.5, 260.25, 270.0],
            "stamp": 86400.5,
            "z": [1.5, -2.0],
            "blob": "deadbeef",
            "secret": 9,
            "records": [
                {"x": 1.0, "tag": "a"},
                {"x": 2.0, "tag": "b"},
                {"x": 3.0, "tag": "c"}
            ],
            "grid": [{"v": 1}, {"v": 2}, {"v": 3}, {"v": 4}],
            "header": {"n": 5, "@attributes": {"origin": "lab"}},
            "empty": [],
            "nothing": null,
            "single": [42],
            "cube": cube
        }
    })
}

/// Write a JSON product into `dir`.
pub fn write_product(dir: &Path, name: &str, description: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(description).unwrap()).unwrap();
    path
}

/// An engine with the sample product open.
pub struct Fixture {
    pub engine: Engine,
    pub pf: HostValue,
    pub path: PathBuf,
    _dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }

    pub fn with_engine(mut engine: Engine) -> Self {
        let dir = TempDir::new().unwrap();
        let path = write_product(dir.path(), "sample.json", &sample_description());
        let handle = engine.open(&path).unwrap();
        Self {
            engine,
            pf: HostValue::Scalar(Scalar::ULong64(handle.0)),
            path,
            _dir: dir,
        }
    }

    /// Argument list starting at the open product.
    pub fn args(&self, selectors: &[HostValue]) -> Vec<HostValue> {
        let mut args = vec![self.pf.clone()];
        args.extend_from_slice(selectors);
        args
    }

    pub fn fetch(&mut self, selectors: &[HostValue]) -> QuarryResult<HostValue> {
        let args = self.args(selectors);
        self.engine.fetch(&args)
    }
}

pub fn s(name: &str) -> HostValue {
    HostValue::from(name)
}

pub fn i(index: i64) -> HostValue {
    HostValue::Scalar(Scalar::Long(index as i32))
}

pub fn v(indices: &[i64]) -> HostValue {
    HostValue::from(indices.to_vec())
}

pub fn doubles(value: &HostValue) -> Vec<f64> {
    match &value.as_array().expect("array value").data {
        ArrayData::Double(values) => values.clone(),
        other => panic!("expected a DOUBLE array, got {}", other.type_name()),
    }
}

pub fn array(value: &HostValue) -> &HostArray {
    value.as_array().expect("array value")
}

/// Opener that hands out the same in-memory product for every path.
#[derive(Debug, Clone)]
pub struct FixedOpener(pub Arc<MemoryProduct>);

impl FixedOpener {
    pub fn from_json(description: Value) -> Self {
        Self(Arc::new(
            MemoryProduct::from_json_value("fixed.json", description).unwrap(),
        ))
    }
}

impl ProductOpener for FixedOpener {
    fn open(&self, _path: &Path, _options: &StorageOptions) -> QuarryResult<Arc<dyn Product>> {
        let product: Arc<dyn Product> = self.0.clone();
        Ok(product)
    }
}
