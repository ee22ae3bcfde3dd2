//! Property-based tests for the expression evaluator.
//!
//! Uses proptest to check that evaluation never panics on arbitrary input
//! and that checked arithmetic agrees with the `checked_*` i64 operations.

use questline_core::expr::{ExprError, Value, evaluate, evaluate_condition};
use std::collections::BTreeMap;

use proptest::prelude::*;

fn two_vars(a: i64, b: i64) -> BTreeMap<String, i64> {
    [("a".to_string(), a), ("b".to_string(), b)].into()
}

// `i64::MIN` cannot appear as a literal (its magnitude does not fit before
// the unary minus is applied), so substituted values stay above it.
fn substitutable() -> impl Strategy<Value = i64> {
    (i64::MIN + 1)..=i64::MAX
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Evaluation is total: any input string yields Ok or Err, never a panic.
    #[test]
    fn never_panics_on_operator_soup(s in "[0-9a-z+*/%()<>=!&| -]{0,24}") {
        let _ = evaluate(&s, &BTreeMap::new());
    }

    /// Addition agrees with checked_add: same value on success, an
    /// evaluation error exactly when i64 overflows.
    #[test]
    fn addition_matches_checked_add(a in substitutable(), b in substitutable()) {
        let result = evaluate("<a> + <b>", &two_vars(a, b));
        match a.checked_add(b) {
            Some(sum) => prop_assert_eq!(result.unwrap(), Value::Int(sum)),
            None => prop_assert!(matches!(result, Err(ExprError::Evaluation(_)))),
        }
    }

    /// Multiplication agrees with checked_mul.
    #[test]
    fn multiplication_matches_checked_mul(a in substitutable(), b in substitutable()) {
        let result = evaluate("<a> * <b>", &two_vars(a, b));
        match a.checked_mul(b) {
            Some(product) => prop_assert_eq!(result.unwrap(), Value::Int(product)),
            None => prop_assert!(matches!(result, Err(ExprError::Evaluation(_)))),
        }
    }

    /// Division never panics: by-zero is an error, otherwise the quotient.
    #[test]
    fn division_is_safe(a in substitutable(), b in substitutable()) {
        let result = evaluate("<a> / <b>", &two_vars(a, b));
        if b == 0 {
            prop_assert!(matches!(result, Err(ExprError::Evaluation(_))));
        } else {
            prop_assert_eq!(result.unwrap(), Value::Int(a / b));
        }
    }

    /// Comparisons mirror the native i64 ordering.
    #[test]
    fn comparison_matches_native_ordering(a in substitutable(), b in substitutable()) {
        let v = two_vars(a, b);
        prop_assert_eq!(evaluate("<a> < <b>", &v).unwrap(), Value::Bool(a < b));
        prop_assert_eq!(evaluate("<a> >= <b>", &v).unwrap(), Value::Bool(a >= b));
        prop_assert_eq!(evaluate("<a> == <b>", &v).unwrap(), Value::Bool(a == b));
    }

    /// Condition coercion: a bare variable is true iff nonzero.
    #[test]
    fn truthiness_of_bare_variable(x in substitutable()) {
        let v: BTreeMap<String, i64> = [("x".to_string(), x)].into();
        prop_assert_eq!(evaluate_condition("<x>", &v).unwrap(), x != 0);
    }
}
