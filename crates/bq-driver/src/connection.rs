use std::sync::Arc;

use bq_common::config::{AppConfig, DriverConfig};

use crate::columns::ReroutedColumn;
use crate::context::ExecutionContext;
use crate::convert::StringFallback;
use crate::error::{DriverError, DriverResult};
use crate::query::QuerySource;
use crate::rows::Rows;
use crate::statement::{scan_nested, Statement};
use crate::value::NamedValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub project_id: Option<String>,
    /// The dataset used to resolve unqualified table names.
    pub dataset: Option<String>,
    pub string_fallback: StringFallback,
}

impl From<&DriverConfig> for ConnectionConfig {
    fn from(config: &DriverConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            string_fallback: config.string_fallback.into(),
        }
    }
}

/// The outcome of a statement run for its side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    total_rows: u64,
}

impl ExecResult {
    pub fn new(total_rows: u64) -> Self {
        Self { total_rows }
    }

    pub fn rows_affected(&self) -> DriverResult<i64> {
        i64::try_from(self.total_rows).map_err(|e| DriverError::internal(e.to_string()))
    }

    pub fn last_insert_id(&self) -> DriverResult<i64> {
        Err(DriverError::unsupported("last insert ID"))
    }
}

/// A connection to the warehouse through a query source.
#[derive(Clone)]
pub struct Connection {
    source: Arc<dyn QuerySource>,
    config: Arc<ConnectionConfig>,
}

impl Connection {
    pub fn new(source: Arc<dyn QuerySource>, config: ConnectionConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }

    pub fn try_from_app_config(source: Arc<dyn QuerySource>) -> DriverResult<Self> {
        let config = AppConfig::load()?;
        Ok(Self::new(source, (&config.driver).into()))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn prepare(&self, sql: impl Into<String>) -> Statement {
        Statement::new(self.source.clone(), self.config.clone(), sql)
    }

    pub async fn query(
        &self,
        ctx: &ExecutionContext,
        sql: impl Into<String>,
        args: Vec<NamedValue>,
    ) -> DriverResult<Rows> {
        self.prepare(sql).query(ctx, args).await
    }

    pub async fn exec(
        &self,
        ctx: &ExecutionContext,
        sql: impl Into<String>,
        args: Vec<NamedValue>,
    ) -> DriverResult<ExecResult> {
        self.prepare(sql).exec(ctx, args).await
    }

    /// Scans the payload of a nested column as rows without running a query.
    pub fn scan_nested(
        &self,
        ctx: &ExecutionContext,
        column: ReroutedColumn,
    ) -> DriverResult<Rows> {
        let rows = scan_nested(ctx, column)?;
        Ok(rows.with_string_fallback(self.config.string_fallback))
    }

    /// The warehouse has no transactional write path.
    pub fn begin(&self) -> DriverResult<()> {
        Err(DriverError::unsupported("transactions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQuerySource;

    #[test]
    fn test_connection_config_from_driver_config() {
        let config = ConnectionConfig::from(&DriverConfig {
            project_id: Some("project".to_string()),
            dataset: None,
            string_fallback: false,
        });
        assert_eq!(
            config,
            ConnectionConfig {
                project_id: Some("project".to_string()),
                dataset: None,
                string_fallback: StringFallback::Disabled,
            }
        );
    }

    #[test]
    fn test_connection_begin_not_supported() {
        let connection = Connection::new(
            Arc::new(MemoryQuerySource::new()),
            ConnectionConfig::default(),
        );
        assert!(matches!(
            connection.begin(),
            Err(DriverError::NotSupported(_))
        ));
    }

    #[test]
    fn test_exec_result_overflow() {
        assert!(ExecResult::new(u64::MAX).rows_affected().is_err());
        assert!(matches!(ExecResult::new(3).rows_affected(), Ok(3)));
    }
}
