//! Property-based tests for constant expressions.

use proptest::prelude::*;
use quarry_storage::{ExprType, Expression};

proptest! {
    #[test]
    fn prop_integer_arithmetic_matches_rust(
        a in 0i64..10_000,
        b in 0i64..10_000,
        c in 0i64..10_000,
    ) {
        let expr = Expression::parse(&format!("{a} - {b} * ({c} + 1)")).unwrap();
        prop_assert_eq!(expr.result_type(), ExprType::Integer);
        prop_assert!(expr.is_constant());
        prop_assert_eq!(expr.eval_integer(None).unwrap(), a - b * (c + 1));
    }

    #[test]
    fn prop_comparisons_are_consistent(a in 0i64..1000, b in 0i64..1000) {
        let check = |op: &str| {
            Expression::parse(&format!("{a} {op} {b}"))
                .unwrap()
                .eval_bool(None)
                .unwrap()
        };
        prop_assert_eq!(check("<"), a < b);
        prop_assert_eq!(check("<="), a <= b);
        prop_assert_eq!(check("=="), a == b);
        prop_assert_eq!(check("!="), !check("=="));
        prop_assert_eq!(check(">"), !check("<="));
    }

    #[test]
    fn prop_mixed_arithmetic_promotes_to_float(a in 0i64..1000, tenths in 0u32..10) {
        let expr = Expression::parse(&format!("{a} + 0.{tenths}")).unwrap();
        prop_assert_eq!(expr.result_type(), ExprType::Float);
        let expected = a as f64 + f64::from(tenths) / 10.0;
        prop_assert!((expr.eval_float(None).unwrap() - expected).abs() < 1e-9);
    }
}
