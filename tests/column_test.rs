//! Integration tests for column schema components.

use framecheck::{
    Abort, Check, CheckFault, DataType, Label, ReasonCode, Schema, SchemaComponent, SchemaContext,
    SchemaInitError, Series, Table, ValidateOptions,
};
use serde_json::{json, Value};
use stillwater::Validation;

fn lazy() -> ValidateOptions {
    ValidateOptions::new().lazy(true)
}

#[test]
fn test_non_nullable_lazy_reports_row() {
    let schema = Schema::column(DataType::Int64).name("x").nullable(false);
    let table = Table::from_columns(vec![("x", vec![json!(1), json!(2), Value::Null])]).unwrap();

    let errors = schema
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    let error = errors.first();
    assert_eq!(error.reason, ReasonCode::SeriesContainsNulls);
    assert_eq!(error.check.as_deref(), Some("not_nullable"));
    assert_eq!(error.failure_rows(), vec![2]);
    assert_eq!(error.schema, SchemaContext::Column(Some(Label::from("x"))));
}

#[test]
fn test_non_nullable_fail_fast_single_error() {
    let schema = Schema::column(DataType::Int64)
        .name("x")
        .check(Check::greater_than(5.0));
    let table = Table::from_columns(vec![("x", vec![json!(1), json!(2), Value::Null])]).unwrap();

    let errors = schema
        .validate(&table, &ValidateOptions::new())
        .unwrap()
        .into_result()
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().reason, ReasonCode::SeriesContainsNulls);
}

#[test]
fn test_regex_resolves_matching_columns() {
    let schema = Schema::column(DataType::Int64)
        .name("^col_[0-9]+$")
        .regex(true);
    let table = Table::from_columns(vec![
        ("col_1", vec![json!(1)]),
        ("col_2", vec![json!(2)]),
        ("other", vec![json!("a")]),
    ])
    .unwrap();

    assert_eq!(
        schema.matching_columns(&table).unwrap(),
        vec![Label::from("col_1"), Label::from("col_2")]
    );
    assert!(schema.validate(&table, &lazy()).unwrap().is_success());
}

#[test]
fn test_regex_without_match_fails_in_both_modes() {
    let schema = Schema::column(None).name("^col_[0-9]+$").regex(true);
    let table = Table::from_columns(vec![("other", vec![json!(1)])]).unwrap();

    for options in [ValidateOptions::new(), lazy()] {
        let errors = schema
            .validate(&table, &options)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.first();
        assert_eq!(error.reason, ReasonCode::NoRegexColumnMatch);
        assert_eq!(
            error.check.as_deref(),
            Some("no_regex_column_match('^col_[0-9]+$')")
        );
        assert!(error.message.contains("did not match any columns"));
    }
}

#[test]
fn test_regex_checks_each_match_under_its_own_name() {
    let schema = Schema::column(DataType::Int64)
        .name("^v")
        .regex(true)
        .check(Check::greater_than(0.0));
    let table = Table::from_columns(vec![
        ("v1", vec![json!(1), json!(-1)]),
        ("v2", vec![json!(-2), json!(2)]),
    ])
    .unwrap();

    let errors = schema
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();

    let failing: Vec<_> = errors.iter().map(|e| e.schema.clone()).collect();
    assert_eq!(
        failing,
        vec![
            SchemaContext::Column(Some(Label::from("v1"))),
            SchemaContext::Column(Some(Label::from("v2"))),
        ]
    );
    assert_eq!(errors.iter().next().unwrap().failure_rows(), vec![1]);
}

#[test]
fn test_duplicate_columns_validated_per_occurrence() {
    let schema = Schema::column(DataType::Int64)
        .name("x")
        .check(Check::greater_than(0.0));
    let table = Table::from_columns(vec![
        ("x", vec![json!(-1), json!(1)]),
        ("x", vec![json!(1), json!(-1)]),
    ])
    .unwrap();

    let errors = schema
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();

    assert_eq!(errors.len(), 2);
    let rows: Vec<_> = errors.iter().map(|e| e.failure_rows()).collect();
    assert_eq!(rows, vec![vec![0], vec![1]]);
}

#[test]
fn test_duplicate_columns_coerced_independently() {
    let schema = Schema::column(DataType::Int64).name("x").coerce(true);
    let table = Table::from_columns(vec![
        ("x", vec![json!("1"), json!("2")]),
        ("x", vec![json!("a"), json!("3")]),
    ])
    .unwrap();

    let errors = schema
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();

    let reasons: Vec<_> = errors.iter().map(|e| e.reason).collect();
    assert_eq!(
        reasons,
        vec![ReasonCode::DtypeCoercionError, ReasonCode::WrongDtype]
    );
    assert_eq!(errors.first().failure_rows(), vec![0]);

    let mut in_place = table.clone();
    let _ = schema.validate_in_place(&mut in_place, &lazy()).unwrap();
    assert_eq!(in_place.columns()[0].values(), &[json!(1), json!(2)]);
    assert_eq!(in_place.columns()[1].values(), &[json!("a"), json!("3")]);
}

#[test]
fn test_coercion_success_returns_coerced_copy() {
    let schema = Schema::column(DataType::Float64).name("x").coerce(true);
    let table = Table::from_columns(vec![("x", vec![json!("1.5"), json!(2)])]).unwrap();

    let validated = schema
        .validate(&table, &ValidateOptions::new())
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(validated.columns()[0].dtype(), DataType::Float64);
    assert_eq!(validated.columns()[0].values(), &[json!(1.5), json!(2.0)]);
    assert_eq!(table.columns()[0].values(), &[json!("1.5"), json!(2)]);
}

#[test]
fn test_faulting_check_is_reported_not_propagated() {
    let schema = Schema::column(None)
        .name("x")
        .check(Check::new("divide", |_: &Series| -> Result<bool, CheckFault> {
            Err("division by zero".into())
        }))
        .check(Check::new("explode", |_: &Series| -> Result<bool, CheckFault> {
            panic!("unexpected state")
        }));
    let table = Table::from_columns(vec![("x", vec![json!(1)])]).unwrap();

    let errors = schema
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();

    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.reason == ReasonCode::CheckError));
    let indexes: Vec<_> = errors.iter().map(|e| e.check_index).collect();
    assert_eq!(indexes, vec![Some(0), Some(1)]);
    assert!(errors.first().message.contains("division by zero"));
}

#[test]
fn test_missing_name_is_configuration_error() {
    let schema = Schema::column(DataType::Int64);
    let table = Table::from_columns(vec![("x", vec![json!(1)])]).unwrap();

    for options in [ValidateOptions::new(), lazy()] {
        assert_eq!(
            schema.validate(&table, &options).err(),
            Some(SchemaInitError::MissingName)
        );
    }

    let bound = schema.set_name(Some(Label::from("x")));
    assert!(bound.validate(&table, &lazy()).unwrap().is_success());
    assert!(schema.field().name().is_none());
}

#[test]
fn test_non_string_regex_is_configuration_error() {
    let schema = Schema::column(None).name(7_i64).regex(true);
    let table = Table::from_columns(vec![("x", vec![json!(1)])]).unwrap();

    assert_eq!(
        schema.validate(&table, &lazy()).err(),
        Some(SchemaInitError::NonStringPattern(Label::Int(7)))
    );
    assert!(matches!(schema.matching_columns(&table), Err(Abort::Init(_))));
}

#[test]
fn test_missing_column() {
    let table = Table::from_columns(vec![("x", vec![json!(1)])]).unwrap();

    let errors = Schema::column(None)
        .name("y")
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(errors.first().reason, ReasonCode::ColumnNotInDataframe);

    let result = Schema::column(None)
        .name("y")
        .required(false)
        .validate(&table, &lazy())
        .unwrap();
    assert!(result.is_success());
}

#[test]
fn test_unique_with_report_policy() {
    use framecheck::ReportDuplicates;

    let table = Table::from_columns(vec![("x", vec![json!(1), json!(1), json!(2), json!(1)])])
        .unwrap();
    let schema = Schema::column(DataType::Int64).name("x").unique(true);

    let all = schema.validate(&table, &lazy()).unwrap().into_result().unwrap_err();
    assert_eq!(all.first().failure_rows(), vec![0, 1, 3]);

    let last = schema
        .clone()
        .report_duplicates(ReportDuplicates::ExcludeLast)
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(last.first().failure_rows(), vec![0, 1]);
}

#[test]
fn test_head_and_tail_restrict_checked_rows() {
    let schema = Schema::column(DataType::Int64)
        .name("x")
        .check(Check::greater_than(0.0));
    let table = Table::from_columns(vec![(
        "x",
        vec![json!(1), json!(-1), json!(-2), json!(3)],
    )])
    .unwrap();

    let result = schema
        .validate(&table, &ValidateOptions::new().head(1).tail(1))
        .unwrap();
    assert!(matches!(result, Validation::Success(_)));

    let errors = schema
        .validate(&table, &ValidateOptions::new().head(2).tail(2).lazy(true))
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(errors.first().failure_rows(), vec![1, 2]);
}

#[test]
fn test_multi_level_column_regex() {
    let table = Table::from_columns(vec![
        (Label::tuple(["price", "usd"]), vec![json!(1.0)]),
        (Label::tuple(["price", "eur"]), vec![json!(2.0)]),
        (Label::tuple(["volume", "usd"]), vec![json!(3.0)]),
    ])
    .unwrap();

    let schema = Schema::column(DataType::Float64)
        .name(Label::tuple(["price", ".*"]))
        .regex(true);
    assert_eq!(schema.matching_columns(&table).unwrap().len(), 2);

    let wrong_arity = Schema::column(None)
        .name(Label::tuple(["price"]))
        .regex(true)
        .validate(&table, &lazy())
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(wrong_arity.first().reason, ReasonCode::InvalidColumnLevels);
}
