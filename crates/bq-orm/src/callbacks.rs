use std::sync::Arc;

use crate::db::{default_query, CallbackFn, CallbacksConfig, Db, OrmStatement, QUERY_CALLBACK};
use crate::error::OrmResult;
use crate::schema::{OrmSchemaAdaptor, SchemaRegistry};

pub fn initialize_callbacks(db: &mut Db) -> OrmResult<()> {
    db.callbacks_mut().register_default(CallbacksConfig {
        create_clauses: ["INSERT", "VALUES", "ON CONFLICT", "RETURNING"]
            .into_iter()
            .map(String::from)
            .collect(),
    });

    let root = db.registry().clone();
    let query: CallbackFn = Arc::new(move |statement: &mut OrmStatement| {
        if !statement.dry_run {
            apply_statement_schema_context(statement, &root);
        }
        default_query(statement)
    });
    db.callbacks_mut().replace_query(QUERY_CALLBACK, query)
}

/// Attaches the entity schema of the statement to its execution context,
/// so that the driver can find the column adaptors for the result.
pub fn apply_statement_schema_context(statement: &mut OrmStatement, root: &Arc<SchemaRegistry>) {
    let adaptor = OrmSchemaAdaptor::new(statement.schema.clone(), root.clone());
    statement.context.set_schema_adaptor(Arc::new(adaptor));
}
