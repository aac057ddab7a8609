//! Integration tests for the metadata routines and expression evaluation.
//!
//! Covers:
//! - `size`, `unit` and `description`
//! - record field queries
//! - attribute records
//! - `eval` for every result kind
//! - routine-level conversions of the same calls

mod common;

use common::{array, i, s, Fixture};
use quarry_core::{ArrayData, HostValue, Scalar};
use quarry_engine::NOT_AVAILABLE;

// ============================================================================
// Size, unit, description
// ============================================================================

#[test]
fn test_size() {
    let mut fx = Fixture::new();
    let size = fx.engine.size(&fx.args(&[s("matrix")])).unwrap();
    assert_eq!(array(&size).data, ArrayData::ULong(vec![2, 3]));
    assert_eq!(
        fx.engine.size(&fx.args(&[s("id")])).unwrap(),
        HostValue::Scalar(Scalar::ULong(0))
    );
    assert!(fx.engine.size(&fx.args(&[s("single")])).unwrap().is_no_data());
    // a wildcard selects the first element here
    assert_eq!(
        fx.engine.size(&fx.args(&[s("records"), i(-1)])).unwrap(),
        HostValue::Scalar(Scalar::ULong(0))
    );

    fx.engine.setopt("SwapDimensions", false).unwrap();
    let size = fx.engine.size(&fx.args(&[s("cube")])).unwrap();
    assert_eq!(array(&size).data, ArrayData::ULong(vec![4, 3, 2]));
}

#[test]
fn test_unit_and_description() {
    let fx = Fixture::new();
    assert_eq!(fx.engine.unit(&fx.args(&[s("temps")])).unwrap(), "K");
    assert_eq!(fx.engine.unit(&fx.args(&[s("temps"), i(2)])).unwrap(), "K");
    assert_eq!(fx.engine.unit(&fx.args(&[s("id")])).unwrap(), NOT_AVAILABLE);
    assert_eq!(
        fx.engine.description(&fx.args(&[s("id")])).unwrap(),
        "Identifier"
    );
    assert_eq!(
        fx.engine.description(&fx.args(&[s("name")])).unwrap(),
        "not available"
    );
}

// ============================================================================
// Record fields
// ============================================================================

#[test]
fn test_field_count_and_names() {
    let mut fx = Fixture::new();
    assert_eq!(fx.engine.field_count(&fx.args(&[])).unwrap(), 14);
    let names = fx.engine.field_names(&fx.args(&[s("header")])).unwrap();
    assert_eq!(array(&names).data, ArrayData::String(vec!["N".into()]));
    assert_eq!(
        fx.engine.field_count(&fx.args(&[s("id")])).unwrap_err().code(),
        -994
    );

    fx.engine.setopt("FilterRecordFields", false).unwrap();
    assert_eq!(fx.engine.field_count(&fx.args(&[])).unwrap(), 15);
}

#[test]
fn test_field_available() {
    let fx = Fixture::new();
    let available = |selectors: &[HostValue]| fx.engine.field_available(&fx.args(selectors));
    assert!(available(&[s("id")]).unwrap());
    assert!(available(&[s("secret")]).unwrap());
    assert!(!available(&[s("extra")]).unwrap());
    assert!(available(&[s("records"), i(0), s("tag")]).unwrap());
    assert_eq!(available(&[s("nosuchfield")]).unwrap_err().code(), -102);
    assert_eq!(available(&[s("id"), s("x")]).unwrap_err().code(), -994);
    assert_eq!(available(&[i(3)]).unwrap_err().code(), -907);
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_attributes() {
    let mut fx = Fixture::new();
    let attributes = fx.engine.attributes(&fx.args(&[s("header")])).unwrap();
    let record = attributes.as_struct().expect("attribute record");
    assert_eq!(
        record.field("ORIGIN"),
        Some(&HostValue::Scalar(Scalar::String("lab".into())))
    );
    assert!(fx
        .engine
        .attributes(&fx.args(&[s("id")]))
        .unwrap()
        .is_no_data());
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_eval_result_kinds() {
    let mut fx = Fixture::new();
    let pf = fx.args(&[]);
    let mut eval = |source: &str| fx.engine.eval(source, &pf);

    assert_eq!(eval("numelements(temps)").unwrap(), HostValue::Scalar(Scalar::Long64(3)));
    assert_eq!(eval("int(id) + 1").unwrap(), HostValue::Scalar(Scalar::Long64(8)));
    assert_eq!(
        eval("float(temps[1])").unwrap(),
        HostValue::Scalar(Scalar::Double(260.25))
    );
    assert_eq!(
        eval("str(name) + \"!\"").unwrap(),
        HostValue::Scalar(Scalar::String("alpha!".into()))
    );
    assert_eq!(eval("exists(extra)").unwrap(), HostValue::Scalar(Scalar::Int(0)));
    assert_eq!(eval("goto(header)").unwrap_err().code(), -995);
    assert_eq!(eval("1 +").unwrap_err().code(), -401);
}

#[test]
fn test_eval_node_returns_handle() {
    let mut fx = Fixture::new();
    let node = fx.engine.eval("/header", &fx.args(&[])).unwrap();
    assert!(node.as_handle().is_some());
    assert_eq!(
        fx.engine.fetch(&[node, s("n")]).unwrap(),
        HostValue::Scalar(Scalar::ULong(5))
    );
}

#[test]
fn test_eval_relative_to_selection() {
    let mut fx = Fixture::new();
    let args = fx.args(&[s("records"), i(2)]);
    assert_eq!(
        fx.engine.eval("str(tag)", &args).unwrap(),
        HostValue::Scalar(Scalar::String("c".into()))
    );
    assert_eq!(fx.engine.eval("int(id)", &[]).unwrap_err().code(), -904);
}

// ============================================================================
// Routines
// ============================================================================

#[test]
fn test_metadata_routines() {
    let mut fx = Fixture::new();
    let pf = fx.pf.clone();

    assert_eq!(
        fx.engine.call("QUARRY_UNIT", &[pf.clone(), s("temps")]),
        HostValue::from("K")
    );
    assert_eq!(
        fx.engine.call("QUARRY_FIELDCOUNT", &[pf.clone(), s("header")]),
        HostValue::Scalar(Scalar::Int(1))
    );
    assert_eq!(
        fx.engine.call("QUARRY_FIELDAVAILABLE", &[pf.clone(), s("extra")]),
        HostValue::Scalar(Scalar::Int(0))
    );
    assert_eq!(
        fx.engine.call("QUARRY_EVAL", &[s("bytesize(blob)"), pf.clone()]),
        HostValue::Scalar(Scalar::Long64(4))
    );
    assert_eq!(
        fx.engine
            .call("QUARRY_TIME_TO_STRING", &[HostValue::Scalar(Scalar::Double(0.0))]),
        HostValue::from("2000-01-01 00:00:00.000000")
    );

    let err = fx.engine.call("QUARRY_FETCH", &[pf.clone(), s("extra")]);
    let err = err.as_error().expect("error value");
    assert_eq!(err.code, -993);
    assert_eq!(
        fx.engine.call("QUARRY_IS_ERROR", &[HostValue::Error(err.clone())]),
        HostValue::Scalar(Scalar::Int(1))
    );

    let nothing = fx.engine.call("QUARRY_FETCH", &[pf, s("nothing")]);
    assert_eq!(
        fx.engine.call("QUARRY_IS_NO_DATA", &[nothing]),
        HostValue::Scalar(Scalar::Int(1))
    );
}
