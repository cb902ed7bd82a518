use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bq_driver::connection::{Connection, ExecResult};
use bq_driver::context::ExecutionContext;
use bq_driver::value::{DriverValue, NamedValue};
use log::debug;

use crate::builders::initialize_builders;
use crate::callbacks::initialize_callbacks;
use crate::clause::{
    BindVar, Clause, ClauseBuilder, ClauseExpression, InsertValue, SqlBuilder, Values,
};
use crate::error::{OrmError, OrmResult};
use crate::schema::{EntitySchema, SchemaRegistry};

pub type ClauseBuilderFn = Arc<dyn Fn(&Clause, &mut dyn ClauseBuilder) + Send + Sync>;

pub type CallbackFn = Arc<dyn Fn(&mut OrmStatement) -> OrmResult<()> + Send + Sync>;

/// The name of the default query callback.
pub const QUERY_CALLBACK: &str = "orm:query";

/// One ORM operation on its way to the driver.
#[derive(Debug, Clone, Default)]
pub struct OrmStatement {
    pub schema: Option<Arc<EntitySchema>>,
    pub context: ExecutionContext,
    /// Builds the SQL text without running it.
    pub dry_run: bool,
    pub sql: String,
    pub args: Vec<NamedValue>,
}

#[derive(Debug, Clone, Default)]
pub struct CallbacksConfig {
    pub create_clauses: Vec<String>,
}

/// The callback chains of the ORM pipelines.
#[derive(Default, Clone)]
pub struct Callbacks {
    create_clauses: Vec<String>,
    query: Vec<(String, CallbackFn)>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("create_clauses", &self.create_clauses)
            .field(
                "query",
                &self.query.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Callbacks {
    pub fn register_default(&mut self, config: CallbacksConfig) {
        self.create_clauses = config.create_clauses;
        let query: CallbackFn = Arc::new(default_query);
        self.query = vec![(QUERY_CALLBACK.to_string(), query)];
    }

    pub fn create_clauses(&self) -> &[String] {
        &self.create_clauses
    }

    pub fn replace_query(&mut self, name: &str, callback: CallbackFn) -> OrmResult<()> {
        let Some(entry) = self.query.iter_mut().find(|(x, _)| x == name) else {
            let message = format!("query callback not found: {name}");
            return Err(OrmError::invalid(message));
        };
        entry.1 = callback;
        Ok(())
    }

    pub fn run_query(&self, statement: &mut OrmStatement) -> OrmResult<()> {
        for (_, callback) in &self.query {
            callback(statement)?;
        }
        Ok(())
    }
}

/// Builds the SELECT statement for the entity unless the SQL text is already set.
pub fn default_query(statement: &mut OrmStatement) -> OrmResult<()> {
    if !statement.sql.is_empty() {
        return Ok(());
    }
    let Some(schema) = &statement.schema else {
        return Err(OrmError::missing("entity schema for query"));
    };
    let mut builder = SqlBuilder::new();
    builder.write_str("SELECT ");
    if schema.fields.is_empty() {
        builder.write_char('*');
    }
    for (i, column) in schema.column_names().into_iter().enumerate() {
        if i > 0 {
            builder.write_char(',');
        }
        builder.add_var(&BindVar::Column(column.to_string()));
    }
    builder.write_str(" FROM ");
    builder.add_var(&BindVar::Table(schema.table.clone()));
    let (sql, args) = builder.into_parts();
    statement.sql = sql;
    statement.args = args;
    Ok(())
}

/// The ORM handle bound to one driver connection.
pub struct Db {
    connection: Connection,
    registry: Arc<SchemaRegistry>,
    clause_builders: HashMap<String, ClauseBuilderFn>,
    callbacks: Callbacks,
    dry_run: bool,
}

impl Db {
    pub fn open(connection: Connection, registry: Arc<SchemaRegistry>) -> OrmResult<Self> {
        let mut db = Self {
            connection,
            registry,
            clause_builders: HashMap::new(),
            callbacks: Callbacks::default(),
            dry_run: false,
        };
        initialize_callbacks(&mut db)?;
        initialize_builders(&mut db);
        Ok(db)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    pub fn register_clause_builder(&mut self, name: impl Into<String>, builder: ClauseBuilderFn) {
        self.clause_builders.insert(name.into(), builder);
    }

    fn entity(&self, name: &str) -> OrmResult<Arc<EntitySchema>> {
        self.registry
            .get(name)
            .ok_or_else(|| OrmError::invalid(format!("unknown entity: {name}")))
    }

    /// Prepares a query statement for the entity by running the query callbacks.
    pub fn prepare_query(&self, entity: &str) -> OrmResult<OrmStatement> {
        let mut statement = OrmStatement {
            schema: Some(self.entity(entity)?),
            dry_run: self.dry_run,
            ..Default::default()
        };
        self.callbacks.run_query(&mut statement)?;
        Ok(statement)
    }

    /// Reads all rows of the entity table.
    pub async fn find(&self, entity: &str) -> OrmResult<Vec<Vec<DriverValue>>> {
        let statement = self.prepare_query(entity)?;
        if statement.dry_run {
            debug!("dry run: {}", statement.sql);
            return Ok(vec![]);
        }
        let mut rows = self
            .connection
            .query(&statement.context, statement.sql, statement.args)
            .await?;
        let rows = rows.collect_rows()?;
        Ok(rows)
    }

    /// Renders one clause with the registered builder,
    /// or with the generic rendering if there is none.
    pub fn build_clause(&self, clause: &Clause, builder: &mut dyn ClauseBuilder) {
        match self.clause_builders.get(&clause.name) {
            Some(build) => build(clause, builder),
            None => build_generic_clause(clause, builder),
        }
    }

    /// Builds an INSERT statement from the configured create clauses.
    pub fn build_insert(
        &self,
        entity: &str,
        values: Values,
    ) -> OrmResult<(String, Vec<NamedValue>)> {
        let schema = self.entity(entity)?;
        let table = schema.table.clone();
        let insert = Clause::new("INSERT", ClauseExpression::Insert { table });
        let values = Clause::new("VALUES", ClauseExpression::Values(values));
        let mut clauses = HashMap::from([
            ("INSERT".to_string(), insert),
            ("VALUES".to_string(), values),
        ]);
        let mut builder = SqlBuilder::new();
        let mut first = true;
        for name in self.callbacks.create_clauses() {
            let Some(clause) = clauses.remove(name) else {
                continue;
            };
            if !first {
                builder.write_char(' ');
            }
            first = false;
            self.build_clause(&clause, &mut builder);
        }
        Ok(builder.into_parts())
    }

    pub async fn create(&self, entity: &str, values: Values) -> OrmResult<ExecResult> {
        let (sql, args) = self.build_insert(entity, values)?;
        if self.dry_run {
            debug!("dry run: {sql}");
            return Ok(ExecResult::new(0));
        }
        Ok(self
            .connection
            .exec(&ExecutionContext::new(), sql, args)
            .await?)
    }
}

fn build_generic_clause(clause: &Clause, builder: &mut dyn ClauseBuilder) {
    match &clause.expression {
        Some(ClauseExpression::Insert { table }) => {
            builder.write_str("INSERT INTO ");
            builder.write_quoted(table);
        }
        Some(ClauseExpression::Values(values)) => {
            builder.write_char('(');
            for (i, column) in values.columns.iter().enumerate() {
                if i > 0 {
                    builder.write_char(',');
                }
                builder.write_quoted(column);
            }
            builder.write_str(") VALUES ");
            for (i, row) in values.values.iter().enumerate() {
                if i > 0 {
                    builder.write_char(',');
                }
                builder.write_char('(');
                for (j, value) in row.iter().enumerate() {
                    if j > 0 {
                        builder.write_char(',');
                    }
                    match value {
                        InsertValue::Passthrough(var) => builder.add_var(var),
                        InsertValue::Sequence(vars) => {
                            builder.add_var(&BindVar::List(vars.clone()))
                        }
                        InsertValue::Scalar(value) => {
                            builder.add_var(&BindVar::Value(value.clone()))
                        }
                    }
                }
                builder.write_char(')');
            }
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use bq_driver::connection::ConnectionConfig;
    use bq_driver::memory::MemoryQuerySource;

    use super::*;
    use crate::schema::EntityField;

    fn db() -> OrmResult<Db> {
        let registry = SchemaRegistry::new().with_entity(
            EntitySchema::new("User", "users")
                .with_field(EntityField::new("Id", "id"))
                .with_field(EntityField::new("Name", "name")),
        );
        let source = Arc::new(MemoryQuerySource::new());
        let connection = Connection::new(source, ConnectionConfig::default());
        Db::open(connection, Arc::new(registry))
    }

    #[test]
    fn test_default_query_sql() -> OrmResult<()> {
        let statement = db()?.prepare_query("User")?;
        assert_eq!(statement.sql, "SELECT `id`,`name` FROM `users`");
        assert!(statement.args.is_empty());
        Ok(())
    }

    #[test]
    fn test_default_query_requires_schema() {
        let mut statement = OrmStatement::default();
        assert!(matches!(
            default_query(&mut statement),
            Err(OrmError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_unknown_entity() {
        assert!(matches!(
            db().and_then(|db| db.prepare_query("Nobody")),
            Err(OrmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_replace_unknown_callback() -> OrmResult<()> {
        let mut db = db()?;
        let result = db
            .callbacks_mut()
            .replace_query(
                "orm:unknown",
                Arc::new(|_: &mut OrmStatement| -> OrmResult<()> { Ok(()) }),
            );
        assert!(matches!(result, Err(OrmError::InvalidArgument(_))));
        Ok(())
    }

    #[test]
    fn test_generic_values_clause() {
        let clause = Clause::new(
            "VALUES",
            ClauseExpression::Values(Values {
                columns: vec!["id".to_string(), "tags".to_string()],
                values: vec![vec![
                    InsertValue::scalar(1i64),
                    InsertValue::sequence(["a", "b"]),
                ]],
            }),
        );
        let mut builder = SqlBuilder::new();
        build_generic_clause(&clause, &mut builder);
        assert_eq!(builder.sql(), "(`id`,`tags`) VALUES (?,(?,?))");
    }
}
