use std::sync::Arc;
use std::time::Duration;

use crate::adaptor::SchemaAdaptor;

/// State carried through one query execution.
///
/// The context is passed explicitly from the caller down to the column model,
/// and is handed to the query source unchanged.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    schema_adaptor: Option<Arc<dyn SchemaAdaptor>>,
    timeout: Option<Duration>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_adaptor(mut self, adaptor: Arc<dyn SchemaAdaptor>) -> Self {
        self.schema_adaptor = Some(adaptor);
        self
    }

    pub fn set_schema_adaptor(&mut self, adaptor: Arc<dyn SchemaAdaptor>) {
        self.schema_adaptor = Some(adaptor);
    }

    pub fn schema_adaptor(&self) -> Option<&Arc<dyn SchemaAdaptor>> {
        self.schema_adaptor.as_ref()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The deadline for the warehouse call. The driver does not enforce it;
    /// it is left to the query source.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
