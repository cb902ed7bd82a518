use std::sync::Arc;

use crate::clause::{BindVar, Clause, ClauseBuilder, ClauseExpression, InsertValue};
use crate::db::{ClauseBuilderFn, Db};

pub fn initialize_builders(db: &mut Db) {
    let values: ClauseBuilderFn = Arc::new(build_values);
    db.register_clause_builder("VALUES", values);
}

/// Renders `(c1,c2,...) VALUES (v1,v2,...),(...)`, or `DEFAULT VALUES`
/// when there are no columns. Sequences are written as warehouse array literals.
pub fn build_values(clause: &Clause, builder: &mut dyn ClauseBuilder) {
    let Some(ClauseExpression::Values(values)) = &clause.expression else {
        return;
    };

    if values.columns.is_empty() {
        builder.write_str("DEFAULT VALUES");
        return;
    }

    builder.write_char('(');
    for (idx, column) in values.columns.iter().enumerate() {
        if idx > 0 {
            builder.write_char(',');
        }
        builder.write_quoted(column);
    }
    builder.write_char(')');

    builder.write_str(" VALUES ");

    for (idx, row) in values.values.iter().enumerate() {
        if idx > 0 {
            builder.write_char(',');
        }
        builder.write_char('(');
        build_values_arguments(builder, row);
        builder.write_char(')');
    }
}

fn build_values_arguments(builder: &mut dyn ClauseBuilder, row: &[InsertValue]) {
    for (idx, value) in row.iter().enumerate() {
        if idx > 0 {
            builder.write_char(',');
        }
        match value {
            InsertValue::Passthrough(var) => builder.add_var(var),
            InsertValue::Scalar(value) => builder.add_var(&BindVar::Value(value.clone())),
            InsertValue::Sequence(items) if items.is_empty() => builder.write_str("[]"),
            InsertValue::Sequence(items) => {
                builder.write_char('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        builder.write_char(',');
                    }
                    builder.add_var(item);
                }
                builder.write_char(']');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bq_driver::value::{DriverValue, NamedValue};

    use super::*;
    use crate::clause::{SqlBuilder, Values};

    fn render(values: Values) -> (String, Vec<NamedValue>) {
        let mut builder = SqlBuilder::new();
        build_values(
            &Clause::new("VALUES", ClauseExpression::Values(values)),
            &mut builder,
        );
        builder.into_parts()
    }

    #[test]
    fn test_build_values_default_values() {
        let (sql, args) = render(Values::default());
        assert_eq!(sql, "DEFAULT VALUES");
        assert!(args.is_empty());
    }

    #[test]
    fn test_build_values_ignores_other_clauses() {
        let mut builder = SqlBuilder::new();
        build_values(
            &Clause::new(
                "VALUES",
                ClauseExpression::Insert {
                    table: "users".to_string(),
                },
            ),
            &mut builder,
        );
        build_values(
            &Clause {
                name: "VALUES".to_string(),
                expression: None,
            },
            &mut builder,
        );
        assert_eq!(builder.sql(), "");
    }

    #[test]
    fn test_build_values_rows() {
        let (sql, args) = render(Values {
            columns: vec!["id".to_string(), "name".to_string()],
            values: vec![
                vec![InsertValue::scalar(1i64), InsertValue::scalar("ada")],
                vec![InsertValue::scalar(2i64), InsertValue::scalar("bob")],
            ],
        });
        assert_eq!(sql, "(`id`,`name`) VALUES (?,?),(?,?)");
        assert_eq!(
            args,
            vec![
                NamedValue::positional(1, 1i64),
                NamedValue::positional(2, "ada"),
                NamedValue::positional(3, 2i64),
                NamedValue::positional(4, "bob"),
            ]
        );
    }

    #[test]
    fn test_build_values_array_literals() {
        let (sql, args) = render(Values {
            columns: vec!["id".to_string(), "tags".to_string(), "scores".to_string()],
            values: vec![vec![
                InsertValue::scalar(1i64),
                InsertValue::sequence(["a", "b"]),
                InsertValue::sequence(Vec::<f64>::new()),
            ]],
        });
        assert_eq!(sql, "(`id`,`tags`,`scores`) VALUES (?,[?,?],[])");
        assert_eq!(
            args,
            vec![
                NamedValue::positional(1, 1i64),
                NamedValue::positional(2, "a"),
                NamedValue::positional(3, "b"),
            ]
        );
    }

    #[test]
    fn test_build_values_passthrough_kinds() {
        let (sql, args) = render(Values {
            columns: vec![
                "owner".to_string(),
                "payload".to_string(),
                "created".to_string(),
                "ids".to_string(),
                "parent".to_string(),
            ],
            values: vec![vec![
                BindVar::named("owner", "ada").into(),
                InsertValue::bytes(vec![1, 2]),
                BindVar::expr("CURRENT_TIMESTAMP()", vec![]).into(),
                BindVar::List(vec![BindVar::Value(DriverValue::Int64(1))]).into(),
                BindVar::SubQuery {
                    sql: "SELECT MAX(id) FROM users".to_string(),
                    vars: vec![],
                }
                .into(),
            ]],
        });
        assert_eq!(
            sql,
            "(`owner`,`payload`,`created`,`ids`,`parent`) VALUES \
             (@owner,?,CURRENT_TIMESTAMP(),(?),(SELECT MAX(id) FROM users))"
        );
        assert_eq!(
            args,
            vec![
                NamedValue::named("owner", 1, "ada"),
                NamedValue::positional(2, vec![1u8, 2]),
                NamedValue::positional(3, 1i64),
            ]
        );
    }
}
