use crate::context::ExecutionContext;
use crate::error::DriverResult;
use crate::parameter::QueryParameter;
use crate::schema::Schema;
use crate::value::Value;

/// A query ready to be sent to the warehouse.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub sql: String,
    pub project_id: Option<String>,
    /// The dataset used to resolve unqualified table names.
    pub default_dataset: Option<String>,
    pub parameters: Vec<QueryParameter>,
}

/// The warehouse query execution capability.
///
/// Transport, authentication, and retries are the responsibility of the
/// implementation. The execution context is passed through unchanged,
/// so the implementation is expected to honor its timeout.
#[async_trait::async_trait]
pub trait QuerySource: Send + Sync {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: QueryRequest,
    ) -> DriverResult<Box<dyn RowIterator>>;
}

/// An open query result. Rows are pulled one at a time.
pub trait RowIterator: Send {
    /// Returns the next row, or `None` when the result is exhausted.
    fn next(&mut self) -> DriverResult<Option<Vec<Value>>>;

    fn schema(&self) -> &Schema;

    /// The total number of rows in the result, or the number of rows
    /// modified by a DML statement.
    fn total_rows(&self) -> u64;
}
