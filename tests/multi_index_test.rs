//! Integration tests for multi-level index schema components.

use std::collections::BTreeSet;

use framecheck::{
    Check, DataType, IndexSchema, Label, MultiLevelIndex, ReasonCode, RowIndex, Schema,
    SchemaComponent, SchemaContext, SchemaErrors, SchemaInitError, Series, Table,
    ValidateOptions,
};
use serde_json::{json, Value};

fn indexed(levels: Vec<(Option<&str>, Vec<Value>)>) -> Table {
    let rows = levels[0].1.len();
    let index = MultiLevelIndex::from_arrays(
        levels
            .into_iter()
            .map(|(name, values)| (name.map(Label::from), values)),
    )
    .unwrap();
    Table::from_columns(vec![("v", vec![json!(0); rows])])
        .unwrap()
        .with_index(index)
        .unwrap()
}

fn lazy() -> ValidateOptions {
    ValidateOptions::new().lazy(true)
}

fn failures(result: framecheck::ValidationResult<Table>) -> SchemaErrors {
    result.into_result().unwrap_err()
}

#[test]
fn test_joint_uniqueness_references_levels() {
    let schema = Schema::multi_index(vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64).name("b"),
    ])
    .unique(["a", "b"])
    .build()
    .unwrap();
    let table = indexed(vec![
        (Some("a"), vec![json!("x"), json!("y"), json!("x")]),
        (Some("b"), vec![json!(1), json!(2), json!(1)]),
    ]);

    let errors = failures(schema.validate(&table, &lazy()).unwrap());

    assert_eq!(errors.len(), 1);
    let error = errors.first();
    assert_eq!(error.reason, ReasonCode::Duplicates);
    assert_eq!(error.schema, SchemaContext::MultiIndex(None));
    assert_eq!(error.failure_rows(), vec![0, 0, 2, 2]);
    let columns: BTreeSet<_> = error
        .failure_cases
        .iter()
        .filter_map(|c| c.column.as_ref().and_then(Label::as_str))
        .collect();
    assert_eq!(columns, BTreeSet::from(["a", "b"]));
}

#[test]
fn test_unordered_unnamed_level_rejected_at_construction() {
    let result = Schema::multi_index(vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64),
    ])
    .ordered(false)
    .build();

    assert_eq!(result.err(), Some(SchemaInitError::UnnamedUnorderedLevel));

    let ordered = Schema::multi_index(vec![Schema::index(None), Schema::index(None)]).build();
    assert!(ordered.is_ok());
}

#[test]
fn test_level_coercion_failures_reported_before_checks() {
    let schema = Schema::multi_index(vec![
        Schema::index(DataType::Int64).name("a"),
        Schema::index(DataType::Int64).name("b").check(Check::greater_than(100.0)),
    ])
    .coerce(true)
    .build()
    .unwrap();
    let table = indexed(vec![
        (Some("a"), vec![json!("1"), json!("x")]),
        (Some("b"), vec![json!("y"), Value::Null]),
    ]);

    let errors = failures(schema.validate(&table, &lazy()).unwrap());
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.reason == ReasonCode::DtypeCoercionError));
    assert_eq!(
        errors.iter().map(|e| e.schema.clone()).collect::<Vec<_>>(),
        vec![
            SchemaContext::Index(Some(Label::from("a"))),
            SchemaContext::Index(Some(Label::from("b"))),
        ]
    );

    let errors = failures(schema.validate(&table, &ValidateOptions::new()).unwrap());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().schema, SchemaContext::Index(Some(Label::from("a"))));
}

#[test]
fn test_coerced_levels_installed() {
    let schema = Schema::multi_index(vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64).name("b").coerce(true),
    ])
    .build()
    .unwrap();
    let table = indexed(vec![
        (Some("a"), vec![json!("x"), json!("y")]),
        (Some("b"), vec![json!("1"), json!("2")]),
    ]);

    let validated = schema
        .validate(&table, &ValidateOptions::new())
        .unwrap()
        .into_result()
        .unwrap();

    let RowIndex::Multi(index) = validated.index() else {
        panic!("expected a multi-level index");
    };
    assert_eq!(index.names(), vec![Some(Label::from("a")), Some(Label::from("b"))]);
    assert_eq!(index.levels()[1].dtype(), DataType::Int64);
    assert_eq!(index.levels()[1].values(), &[json!(1), json!(2)]);
    assert!(table.index().to_levels().levels()[1].values()[0].is_string());
}

#[test]
fn test_flattened_failures_match_per_level_validation() {
    let levels = vec![
        Schema::index(DataType::String)
            .name("a")
            .check(Check::isin(vec![json!("x"), json!("y")])),
        Schema::index(DataType::Int64)
            .name("b")
            .unique(true)
            .check(Check::greater_than(0.0)),
    ];
    let schema = Schema::multi_index(levels.clone()).build().unwrap();
    let a = vec![json!("x"), json!("z"), Value::Null, json!("y")];
    let b = vec![json!(1), json!(-1), json!(1), json!(2)];
    let table = indexed(vec![(Some("a"), a.clone()), (Some("b"), b.clone())]);

    let flattened: BTreeSet<(String, String, Vec<usize>)> =
        failures(schema.validate(&table, &lazy()).unwrap())
            .iter()
            .map(|e| {
                let level = e.failure_cases[0].column.as_ref().unwrap().to_string();
                (level, e.reason.to_string(), e.failure_rows())
            })
            .collect();

    let mut per_level = BTreeSet::new();
    for (level, values) in levels.iter().zip([a, b]) {
        let name = level.field().name().unwrap().clone();
        let single = Table::from_columns(vec![("v", vec![json!(0); values.len()])])
            .unwrap()
            .with_index(Series::new(name.clone(), values))
            .unwrap();
        if let Err(errors) = level.validate(&single, &lazy()).unwrap().into_result() {
            for e in errors.iter() {
                per_level.insert((name.to_string(), e.reason.to_string(), e.failure_rows()));
            }
        }
    }

    assert!(!flattened.is_empty());
    assert_eq!(flattened, per_level);
}

#[test]
fn test_unordered_levels_found_by_name() {
    let levels = vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64).name("b"),
    ];
    let table = indexed(vec![
        (Some("b"), vec![json!(1)]),
        (Some("a"), vec![json!("x")]),
    ]);

    let unordered = Schema::multi_index(levels.clone()).ordered(false).build().unwrap();
    assert!(unordered.validate(&table, &lazy()).unwrap().is_success());

    let ordered = Schema::multi_index(levels).build().unwrap();
    let errors = failures(ordered.validate(&table, &lazy()).unwrap());
    assert_eq!(errors.first().reason, ReasonCode::ColumnNotOrdered);
}

#[test]
fn test_strict_rejects_undeclared_level() {
    let schema = Schema::multi_index(vec![Schema::index(DataType::String).name("a")])
        .strict(true)
        .name("keys")
        .build()
        .unwrap();
    let table = indexed(vec![
        (Some("a"), vec![json!("x")]),
        (Some("c"), vec![json!(1)]),
    ]);

    let errors = failures(schema.validate(&table, &lazy()).unwrap());
    assert_eq!(errors.len(), 1);
    let error = errors.first();
    assert_eq!(error.reason, ReasonCode::ColumnNotInSchema);
    assert_eq!(error.schema, SchemaContext::MultiIndex(Some("keys".to_string())));
    assert_eq!(error.failure_cases[0].column, Some(Label::from("c")));
}

#[test]
fn test_repeated_level_names_remapped() {
    let schema = Schema::multi_index(vec![
        Schema::index(DataType::Int64).name("a"),
        Schema::index(DataType::Int64),
    ])
    .build()
    .unwrap();

    let valid = indexed(vec![
        (Some("a"), vec![json!(1)]),
        (Some("a"), vec![json!(2)]),
    ]);
    assert!(schema.validate(&valid, &lazy()).unwrap().is_success());

    let invalid = indexed(vec![
        (Some("a"), vec![json!(1)]),
        (Some("a"), vec![json!("two")]),
    ]);
    let errors = failures(schema.validate(&invalid, &lazy()).unwrap());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().reason, ReasonCode::WrongDtype);
    assert_eq!(errors.first().failure_cases[0].column, Some(Label::from("a")));
}

#[test]
fn test_multi_index_inside_table_schema() {
    let index = Schema::multi_index(vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64).name("b"),
    ])
    .build()
    .unwrap();
    let schema = Schema::table()
        .column("v", Schema::column(DataType::Int64).check(Check::greater_than(0.0)))
        .index(index)
        .coerce(true);
    let table = indexed(vec![
        (Some("a"), vec![json!("x"), json!("y")]),
        (Some("b"), vec![json!("1"), json!("oops")]),
    ]);

    let errors = failures(schema.validate(&table, &lazy()).unwrap());
    let reasons: Vec<_> = errors.iter().map(|e| e.reason).collect();
    assert_eq!(
        reasons,
        vec![ReasonCode::DataframeCheck, ReasonCode::DtypeCoercionError]
    );
}

#[test]
fn test_multi_index_schema_is_reusable() {
    let levels: Vec<IndexSchema> = vec![Schema::index(DataType::Int64).name("a")];
    let schema = Schema::multi_index(levels).coerce(true).build().unwrap();
    let table = indexed(vec![(Some("a"), vec![json!("1")])]);

    for _ in 0..3 {
        assert!(schema.validate(&table, &lazy()).unwrap().is_success());
    }
    assert!(table.index().to_levels().levels()[0].values()[0].is_string());
}

#[test]
fn test_joint_uniqueness_respects_row_subset() {
    let schema = Schema::multi_index(vec![
        Schema::index(DataType::String).name("a"),
        Schema::index(DataType::Int64).name("b"),
    ])
    .unique(["a", "b"])
    .build()
    .unwrap();
    let table = indexed(vec![
        (Some("a"), vec![json!("x"), json!("y"), json!("z"), json!("z")]),
        (Some("b"), vec![json!(1), json!(2), json!(3), json!(3)]),
    ]);

    let head = ValidateOptions::new().head(2);
    assert!(schema.validate(&table, &head).unwrap().is_success());

    let errors = failures(schema.validate(&table, &ValidateOptions::new().tail(2)).unwrap());
    assert_eq!(errors.first().reason, ReasonCode::Duplicates);
    assert_eq!(errors.first().failure_rows(), vec![2, 2, 3, 3]);
}
