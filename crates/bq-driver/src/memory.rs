use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;

use crate::context::ExecutionContext;
use crate::error::{DriverError, DriverResult};
use crate::query::{QueryRequest, QuerySource, RowIterator};
use crate::schema::Schema;
use crate::value::Value;

/// A row iterator over rows held in memory.
#[derive(Debug)]
pub struct MemoryRowIterator {
    schema: Schema,
    rows: VecDeque<Vec<Value>>,
    total_rows: u64,
}

impl MemoryRowIterator {
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self {
            schema,
            total_rows: rows.len() as u64,
            rows: rows.into(),
        }
    }
}

impl RowIterator for MemoryRowIterator {
    fn next(&mut self) -> DriverResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn total_rows(&self) -> u64 {
        self.total_rows
    }
}

#[derive(Debug, Clone)]
enum MemoryResult {
    Rows {
        schema: Schema,
        rows: Vec<Vec<Value>>,
    },
    Error(String),
}

#[derive(Debug, Clone)]
struct ReceivedRequest {
    request: QueryRequest,
    timeout: Option<Duration>,
}

/// A query source that answers registered SQL texts with canned results.
/// Every request is recorded so that callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct MemoryQuerySource {
    results: HashMap<String, MemoryResult>,
    received: Mutex<Vec<ReceivedRequest>>,
}

impl MemoryQuerySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(
        mut self,
        sql: impl Into<String>,
        schema: Schema,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        self.results
            .insert(sql.into(), MemoryResult::Rows { schema, rows });
        self
    }

    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.results
            .insert(sql.into(), MemoryResult::Error(message.into()));
        self
    }

    /// Requests are pushed whole, so the log is read even if the lock is poisoned.
    fn received(&self) -> MutexGuard<'_, Vec<ReceivedRequest>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The requests received so far, in order.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.received().iter().map(|x| x.request.clone()).collect()
    }

    /// The timeout of the execution context of each request received so far.
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.received().iter().map(|x| x.timeout).collect()
    }
}

#[async_trait::async_trait]
impl QuerySource for MemoryQuerySource {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: QueryRequest,
    ) -> DriverResult<Box<dyn RowIterator>> {
        debug!("memory query source: {}", request.sql);
        let result = self.results.get(&request.sql).cloned();
        self.received().push(ReceivedRequest {
            request: request.clone(),
            timeout: ctx.timeout(),
        });
        match result {
            Some(MemoryResult::Rows { schema, rows }) => {
                Ok(Box::new(MemoryRowIterator::new(schema, rows)))
            }
            Some(MemoryResult::Error(message)) => Err(DriverError::execution(message)),
            None => Err(DriverError::execution(format!(
                "no result registered for query: {}",
                request.sql
            ))),
        }
    }
}
