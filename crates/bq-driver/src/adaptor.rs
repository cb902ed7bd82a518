use std::fmt::Debug;
use std::sync::Arc;

use crate::error::DriverResult;
use crate::value::DriverValue;

/// The SQL text that asks the statement executor to scan the nested payload
/// given as the only argument, instead of running a query.
/// It is a comment-only statement, so the warehouse would reject it as a query.
pub const REROUTE_QUERY: &str = "/* bq-driver: reroute nested column */";

/// Converts the values of one result column into the representation
/// expected by the caller.
pub trait ColumnAdaptor: Debug + Send + Sync {
    fn adapt_value(&self, value: DriverValue) -> DriverResult<DriverValue>;
}

/// Looks up column adaptors for the entity a query is reading into.
/// Implementations are shared across cursors and must be safe for concurrent reads.
pub trait SchemaAdaptor: Debug + Send + Sync {
    fn get_column_adaptor(&self, name: &str) -> Option<Arc<dyn ColumnAdaptor>>;
}
