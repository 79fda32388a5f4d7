//! Property-based tests for column validation.
//!
//! These cover behavior that must hold for any table content:
//! - validating a passing table twice yields the same table and no failures
//! - a regex that matches no column always reports `no_regex_column_match`

use framecheck::{DataType, ReasonCode, Schema, SchemaComponent, Table, ValidateOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

fn int_cells() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<i64>().prop_map(|v| json!(v)),
            1 => Just(Value::Null),
        ],
        0..20,
    )
}

proptest! {
    #[test]
    fn prop_validation_is_idempotent(cells in int_cells(), lazy in any::<bool>()) {
        let table = Table::from_columns(vec![("x", cells)]).unwrap();
        let schema = Schema::column(DataType::Int64).name("x").nullable(true);
        let options = ValidateOptions::new().lazy(lazy);

        let once = schema.validate(&table, &options).unwrap().into_result().unwrap();
        let twice = schema.validate(&once, &options).unwrap().into_result().unwrap();

        prop_assert_eq!(&once, &table);
        prop_assert_eq!(&twice, &once);
    }

    #[test]
    fn prop_unmatched_regex_always_fails(
        names in prop::collection::btree_set("[a-z]{1,5}", 1..6),
        lazy in any::<bool>(),
    ) {
        let table = Table::from_columns(
            names.iter().map(|name| (name.as_str(), vec![json!(1)])).collect::<Vec<_>>(),
        )
        .unwrap();
        let schema = Schema::column(None).name("ZZ").regex(true);

        let errors = schema
            .validate(&table, &ValidateOptions::new().lazy(lazy))
            .unwrap()
            .into_result()
            .unwrap_err();

        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors.first().reason, ReasonCode::NoRegexColumnMatch);
    }
}
