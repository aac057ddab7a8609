//! Integration tests for cursors over `MemoryProduct`.
//!
//! ## Test Categories
//!
//! 1. **Navigation**: fields, arrays, parents, attributes
//! 2. **Reads**: integers, reals, text, raw, conversions
//! 3. **Special types**: time, scaled integers, complex, no data
//! 4. **Options**: special type bypass, boundary checks
//! 5. **Opening**: JSON files on disk

mod common;

use std::io::Write;

use common::{cursor_at, root_cursor, sample_product};
use common_config::StorageOptions;
use quarry_core::{ArrayOrdering, Product, SpecialType, TypeClass};
use quarry_storage::{JsonOpener, MemoryProduct, ProductOpener};

fn no_special_types() -> StorageOptions {
    StorageOptions {
        use_special_types: false,
        ..StorageOptions::default()
    }
}

// ============================================================================
// Navigation Tests
// ============================================================================

#[test]
fn test_root_is_record() {
    let cursor = root_cursor(StorageOptions::default());
    assert_eq!(cursor.type_class(), TypeClass::Record);
    assert_eq!(cursor.depth(), 0);
    assert_eq!(cursor.num_record_fields().unwrap(), 17);
    assert_eq!(cursor.record_field_index("records").unwrap(), 13);
}

#[test]
fn test_product_identification() {
    let product = sample_product();
    assert_eq!(product.product_class(), Some("TEST"));
    assert_eq!(product.product_type(), Some("SAMPLE"));
    assert_eq!(product.product_version(), 2);
    assert_eq!(product.filename(), "sample.json");
}

#[test]
fn test_unknown_field_name() {
    let mut cursor = root_cursor(StorageOptions::default());
    let err = cursor.goto_record_field_by_name("missing").unwrap_err();
    assert_eq!(err.code(), -102);
    // a failed move leaves the cursor where it was
    assert_eq!(cursor.depth(), 0);
}

#[test]
fn test_field_walk_and_parent() {
    let mut cursor = root_cursor(StorageOptions::default());
    cursor.goto_first_record_field().unwrap();
    assert_eq!(cursor.read_i32().unwrap(), 7);
    cursor.goto_next_record_field().unwrap();
    assert_eq!(cursor.read_string().unwrap(), "alpha");
    assert_eq!(cursor.index(), 1);
    cursor.goto_parent().unwrap();
    assert_eq!(cursor.type_class(), TypeClass::Record);
    assert_eq!(cursor.goto_parent().unwrap_err().code(), -108);
}

#[test]
fn test_multi_dimensional_element() {
    let mut cursor = cursor_at(StorageOptions::default(), "matrix");
    assert_eq!(cursor.array_dims().unwrap(), vec![2, 3]);
    assert_eq!(cursor.num_elements().unwrap(), 6);
    cursor.goto_array_element(&[1, 0]).unwrap();
    assert_eq!(cursor.read_i16().unwrap(), 4);
    cursor.goto_parent().unwrap();
    assert_eq!(cursor.goto_array_element(&[1]).unwrap_err().code(), -106);
    assert_eq!(cursor.goto_array_element(&[2, 0]).unwrap_err().code(), -107);
}

#[test]
fn test_next_array_element_stops_at_end() {
    let mut cursor = cursor_at(StorageOptions::default(), "temps");
    cursor.goto_first_array_element().unwrap();
    cursor.goto_next_array_element().unwrap();
    cursor.goto_next_array_element().unwrap();
    assert_eq!(cursor.read_f32().unwrap(), 270.0);
    assert_eq!(cursor.goto_next_array_element().unwrap_err().code(), -107);
}

#[test]
fn test_array_of_records() {
    let mut cursor = cursor_at(StorageOptions::default(), "records");
    cursor.goto_array_element_by_index(1).unwrap();
    assert_eq!(cursor.type_class(), TypeClass::Record);
    cursor.goto_record_field_by_name("tag").unwrap();
    assert_eq!(cursor.read_string().unwrap(), "b");
}

#[test]
fn test_attributes() {
    let mut cursor = cursor_at(StorageOptions::default(), "header");
    cursor.goto_attributes().unwrap();
    cursor.goto_record_field_by_name("origin").unwrap();
    assert_eq!(cursor.read_string().unwrap(), "lab");

    // nodes without attributes expose an empty record
    let mut cursor = cursor_at(StorageOptions::default(), "id");
    cursor.goto_attributes().unwrap();
    assert_eq!(cursor.num_record_fields().unwrap(), 0);
}

#[test]
fn test_unavailable_optional_field() {
    let cursor = root_cursor(StorageOptions::default());
    let extra = cursor.record_field_index("extra").unwrap();
    assert!(!cursor.record_field_available(extra).unwrap());
    assert!(cursor.record_field_available(0).unwrap());

    let cursor = cursor_at(StorageOptions::default(), "extra");
    assert_eq!(cursor.type_class(), TypeClass::Special);
    assert_eq!(cursor.special_type().unwrap(), SpecialType::NoData);
}

// ============================================================================
// Read Tests
// ============================================================================

#[test]
fn test_integer_widening() {
    let cursor = cursor_at(StorageOptions::default(), "id");
    assert_eq!(cursor.read_i64().unwrap(), 7);
    assert_eq!(cursor.read_f64().unwrap(), 7.0);
    // int32 does not fit every value into int16
    assert_eq!(cursor.read_i16().unwrap_err().code(), -105);
    assert_eq!(cursor.read_string().unwrap_err().code(), -105);
}

#[test]
fn test_conversion_applied() {
    let cursor = cursor_at(StorageOptions::default(), "scaled");
    assert!((cursor.read_f64().unwrap() - 12.3).abs() < 1e-12);
    assert!(cursor.read_u16().is_err());

    let raw = cursor_at(
        StorageOptions {
            perform_conversions: false,
            ..StorageOptions::default()
        },
        "scaled",
    );
    assert_eq!(raw.read_u16().unwrap(), 123);
    assert_eq!(raw.read_f64().unwrap(), 123.0);
}

#[test]
fn test_text_reads() {
    let flag = cursor_at(StorageOptions::default(), "flag");
    assert_eq!(flag.read_char().unwrap(), 'Q');
    let label = cursor_at(StorageOptions::default(), "label");
    assert_eq!(label.string_length().unwrap(), 5);
    assert!(label.read_char().is_err());
}

#[test]
fn test_raw_bytes() {
    let blob = cursor_at(StorageOptions::default(), "blob");
    assert_eq!(blob.byte_size().unwrap(), 4);
    assert_eq!(blob.read_bytes(0, 4).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(blob.read_bytes(2, 1).unwrap(), vec![0xbe]);
    assert_eq!(blob.read_bytes(2, 3).unwrap_err().code(), -301);
}

#[test]
fn test_bulk_read_ordering() {
    let matrix = cursor_at(StorageOptions::default(), "matrix");
    let c = matrix.read_array(ArrayOrdering::C, |c| c.read_i16()).unwrap();
    assert_eq!(c, vec![1, 2, 3, 4, 5, 6]);
    let fortran = matrix
        .read_array(ArrayOrdering::Fortran, |c| c.read_i16())
        .unwrap();
    assert_eq!(fortran, vec![1, 4, 2, 5, 3, 6]);
}

#[test]
fn test_empty_array() {
    let empty = cursor_at(StorageOptions::default(), "empty");
    assert_eq!(empty.array_dims().unwrap(), vec![0]);
    assert!(empty.read_f64_array(ArrayOrdering::C).unwrap().is_empty());
    let mut element = empty.clone();
    assert_eq!(element.goto_first_array_element().unwrap_err().code(), -107);
}

// ============================================================================
// Special Type Tests
// ============================================================================

#[test]
fn test_time_special() {
    let stamp = cursor_at(StorageOptions::default(), "stamp");
    assert_eq!(stamp.special_type().unwrap(), SpecialType::Time);
    assert_eq!(stamp.read_f64().unwrap(), 86400.5);
    let iso = cursor_at(StorageOptions::default(), "iso");
    assert_eq!(iso.read_f64().unwrap(), 86400.0);
}

#[test]
fn test_vsf_integer_special() {
    let vsf = cursor_at(StorageOptions::default(), "vsf");
    assert!((vsf.read_f64().unwrap() - 123.45).abs() < 1e-9);
}

#[test]
fn test_complex_special() {
    let z = cursor_at(StorageOptions::default(), "z");
    assert_eq!(z.read_complex().unwrap(), (1.5, -2.0));
    assert!(cursor_at(StorageOptions::default(), "stamp").read_complex().is_err());
}

#[test]
fn test_special_bypass() {
    let stamp = cursor_at(no_special_types(), "stamp");
    assert_eq!(stamp.type_class(), TypeClass::Real);
    assert_eq!(stamp.read_f64().unwrap(), 86400.5);

    let iso = cursor_at(no_special_types(), "iso");
    assert_eq!(iso.read_string().unwrap(), "2000-01-02 00:00:00");

    let vsf = cursor_at(no_special_types(), "vsf");
    assert_eq!(vsf.type_class(), TypeClass::Record);

    let nothing = cursor_at(no_special_types(), "nothing");
    assert_eq!(nothing.type_class(), TypeClass::Raw);
    assert_eq!(nothing.byte_size().unwrap(), 0);
}

#[test]
fn test_bypass_parent_skips_special() {
    let mut cursor = root_cursor(no_special_types());
    cursor.goto_record_field_by_name("vsf").unwrap();
    cursor.goto_record_field_by_name("value").unwrap();
    cursor.goto_parent().unwrap();
    assert_eq!(cursor.type_class(), TypeClass::Record);
    cursor.goto_parent().unwrap();
    assert_eq!(cursor.depth(), 0);
}

#[test]
fn test_set_options_reapplies_bypass() {
    let mut cursor = cursor_at(StorageOptions::default(), "stamp");
    assert_eq!(cursor.type_class(), TypeClass::Special);
    cursor.set_options(no_special_types()).unwrap();
    assert_eq!(cursor.type_class(), TypeClass::Real);
}

#[test]
fn test_boundary_checks_option() {
    let mut cursor = cursor_at(
        StorageOptions {
            perform_boundary_checks: false,
            ..StorageOptions::default()
        },
        "matrix",
    );
    // per-dimension checks are skipped, the linear index is still valid
    cursor.goto_array_element(&[0, 4]).unwrap();
    assert_eq!(cursor.read_i16().unwrap(), 5);
}

// ============================================================================
// Opening Tests
// ============================================================================

#[test]
fn test_open_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", common::sample_description()).unwrap();

    let product = JsonOpener
        .open(file.path(), &StorageOptions::default())
        .unwrap();
    assert_eq!(product.product_type(), Some("SAMPLE"));

    let product = JsonOpener
        .open_as(file.path(), "TEST", "SAMPLE", 2, &StorageOptions::default())
        .unwrap();
    assert_eq!(product.product_version(), 2);

    let any_version = JsonOpener.open_as(file.path(), "TEST", "SAMPLE", -1, &StorageOptions::default());
    assert!(any_version.is_ok());

    let err = JsonOpener
        .open_as(file.path(), "TEST", "OTHER", -1, &StorageOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), -200);
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = MemoryProduct::open(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.code(), -20);
}

#[test]
fn test_open_invalid_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = MemoryProduct::open(file.path()).unwrap_err();
    assert_eq!(err.code(), -200);
}

#[test]
fn test_data_must_match_definition() {
    let mut description = common::sample_description();
    description["data"]["matrix"] = serde_json::json!([1, 2, 3]);
    let err = MemoryProduct::from_json_value("bad.json", description).unwrap_err();
    assert_eq!(err.code(), -400);
}
