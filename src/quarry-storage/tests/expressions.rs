//! Expressions evaluated against the sample product.

mod common;

use common::{cursor_at, root_cursor};
use common_config::StorageOptions;
use quarry_core::TypeClass;
use quarry_storage::{ExprType, Expression};

fn eval_int(source: &str) -> i64 {
    let cursor = root_cursor(StorageOptions::default());
    Expression::parse(source)
        .unwrap()
        .eval_integer(Some(&cursor))
        .unwrap()
}

#[test]
fn test_node_reads() {
    assert_eq!(eval_int("int(id)"), 7);
    assert_eq!(eval_int("int(./matrix[4]) * 2"), 10);
    assert_eq!(eval_int("int(/records[1]/x) + 1"), 3);
    assert_eq!(eval_int("int(scaled)"), 12);
}

#[test]
fn test_shape_functions() {
    assert_eq!(eval_int("numelements(matrix)"), 6);
    assert_eq!(eval_int("numdims(matrix)"), 2);
    assert_eq!(eval_int("dim(matrix, 1)"), 3);
    assert_eq!(eval_int("numdims(id)"), 0);
    assert_eq!(eval_int("numelements(empty)"), 0);
    assert_eq!(eval_int("bytesize(blob)"), 4);
    assert_eq!(eval_int("length(label)"), 5);
}

#[test]
fn test_exists() {
    let cursor = root_cursor(StorageOptions::default());
    let check = |source: &str| {
        Expression::parse(source)
            .unwrap()
            .eval_bool(Some(&cursor))
            .unwrap()
    };
    assert!(check("exists(label)"));
    assert!(!check("exists(extra)"));
    assert!(!check("exists(nosuchfield)"));
    assert!(!check("exists(temps[7])"));
    assert!(check("exists(header@/origin)"));
}

#[test]
fn test_relative_paths() {
    let cursor = cursor_at(StorageOptions::default(), "header");
    let expr = Expression::parse("str(@/origin) + \"/\" + str(../label)").unwrap();
    assert_eq!(expr.result_type(), ExprType::String);
    assert_eq!(expr.eval_string(Some(&cursor)).unwrap(), "lab/alpha");
}

#[test]
fn test_float_and_time() {
    let cursor = root_cursor(StorageOptions::default());
    let expr = Expression::parse("float(stamp) - float(iso)").unwrap();
    assert_eq!(expr.eval_float(Some(&cursor)).unwrap(), 0.5);
}

#[test]
fn test_eval_node() {
    let cursor = root_cursor(StorageOptions::default());
    let expr = Expression::parse("/records[0]").unwrap();
    let node = expr.eval_node(&cursor).unwrap();
    assert_eq!(node.type_class(), TypeClass::Record);
    assert_eq!(node.index(), 0);
    // the input cursor is untouched
    assert_eq!(cursor.depth(), 0);
}

#[test]
fn test_goto_moves_cursor() {
    let mut cursor = root_cursor(StorageOptions::default());
    let expr = Expression::parse("goto(header/n)").unwrap();
    assert_eq!(expr.result_type(), ExprType::Void);
    expr.eval_void(&mut cursor).unwrap();
    assert_eq!(cursor.read_u32().unwrap(), 5);
}

#[test]
fn test_missing_node_is_error() {
    let cursor = root_cursor(StorageOptions::default());
    let expr = Expression::parse("int(nosuchfield)").unwrap();
    assert_eq!(expr.eval_integer(Some(&cursor)).unwrap_err().code(), -102);
}
