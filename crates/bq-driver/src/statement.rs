use std::sync::Arc;

use bq_telemetry::common::{SpanAttribute, DB_SYSTEM_NAME};
use fastrace::future::FutureExt;
use fastrace::local::LocalSpan;
use fastrace::Span;
use log::{debug, log_enabled, Level};

use crate::adaptor::REROUTE_QUERY;
use crate::columns::ReroutedColumn;
use crate::connection::{ConnectionConfig, ExecResult};
use crate::context::ExecutionContext;
use crate::convert::StringFallback;
use crate::error::{DriverError, DriverResult};
use crate::parameter::{build_parameters, count_query_parameters};
use crate::query::{QueryRequest, QuerySource, RowIterator};
use crate::rows::Rows;
use crate::source::LiveRowSource;
use crate::value::{DriverValue, NamedValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Built,
    Executing,
    Done,
}

/// A prepared SQL statement. A statement is executed at most once.
pub struct Statement {
    source: Arc<dyn QuerySource>,
    config: Arc<ConnectionConfig>,
    sql: String,
    state: StatementState,
}

impl Statement {
    pub(crate) fn new(
        source: Arc<dyn QuerySource>,
        config: Arc<ConnectionConfig>,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            source,
            config,
            sql: sql.into(),
            state: StatementState::Built,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn state(&self) -> StatementState {
        self.state
    }

    /// The number of parameters in the SQL text,
    /// or `None` if it cannot be determined.
    pub fn num_input(&self) -> Option<usize> {
        if self.sql == REROUTE_QUERY {
            return Some(1);
        }
        count_query_parameters(&self.sql).ok()
    }

    pub fn close(&mut self) -> DriverResult<()> {
        self.state = StatementState::Done;
        Ok(())
    }

    fn start(&mut self, args: &[NamedValue]) -> DriverResult<()> {
        match self.state {
            StatementState::Built => {
                self.state = StatementState::Executing;
            }
            StatementState::Executing | StatementState::Done => {
                return Err(DriverError::invalid(format!(
                    "statement has already been executed: {}",
                    self.sql
                )));
            }
        }
        debug!("query:{}", self.sql);
        if log_enabled!(Level::Debug) {
            for arg in args {
                debug!("- param:{}", arg.value);
            }
        }
        Ok(())
    }

    /// Runs the statement and returns a cursor over its rows.
    ///
    /// If the SQL text is [`REROUTE_QUERY`], the only argument must be a
    /// rerouted column, whose payload is scanned without running a query.
    pub async fn query(
        &mut self,
        ctx: &ExecutionContext,
        args: Vec<NamedValue>,
    ) -> DriverResult<Rows> {
        self.start(&args)?;
        let result = if self.sql == REROUTE_QUERY {
            reroute(ctx, args, self.config.string_fallback)
        } else {
            self.read(ctx, args).await.map(|iterator| {
                let source = LiveRowSource::new(iterator, ctx.schema_adaptor().cloned());
                Rows::new(Box::new(source)).with_string_fallback(self.config.string_fallback)
            })
        };
        self.state = StatementState::Done;
        result
    }

    /// Runs the statement for its side effects.
    pub async fn exec(
        &mut self,
        ctx: &ExecutionContext,
        args: Vec<NamedValue>,
    ) -> DriverResult<ExecResult> {
        self.start(&args)?;
        let result = self
            .read(ctx, args)
            .await
            .map(|iterator| ExecResult::new(iterator.total_rows()));
        self.state = StatementState::Done;
        result
    }

    async fn read(
        &self,
        ctx: &ExecutionContext,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn RowIterator>> {
        let request = self.build_query(args)?;
        let span = Span::enter_with_local_parent("Statement::read").with_properties(|| {
            [
                (SpanAttribute::DB_SYSTEM, DB_SYSTEM_NAME.to_string()),
                (SpanAttribute::DB_STATEMENT, request.sql.clone()),
                (
                    SpanAttribute::DB_PARAMETER_COUNT,
                    request.parameters.len().to_string(),
                ),
                (
                    SpanAttribute::DB_DEFAULT_DATASET,
                    request.default_dataset.clone().unwrap_or_default(),
                ),
            ]
        });
        async move {
            let result = self.source.execute(ctx, request).await;
            if let Err(e) = &result {
                LocalSpan::add_property(|| (SpanAttribute::EXCEPTION_MESSAGE, e.to_string()));
            }
            result
        }
        .in_span(span)
        .await
    }

    fn build_query(&self, args: Vec<NamedValue>) -> DriverResult<QueryRequest> {
        if self.sql.trim().is_empty() {
            return Err(DriverError::invalid("empty SQL text"));
        }
        Ok(QueryRequest {
            sql: self.sql.clone(),
            project_id: self.config.project_id.clone(),
            default_dataset: self.config.dataset.clone(),
            parameters: build_parameters(args),
        })
    }
}

fn reroute(
    ctx: &ExecutionContext,
    args: Vec<NamedValue>,
    fallback: StringFallback,
) -> DriverResult<Rows> {
    let mut args = args.into_iter();
    let (Some(arg), None) = (args.next(), args.next()) else {
        return Err(DriverError::reroute("expected a single rerouting argument"));
    };
    let DriverValue::Rerouted(column) = arg.value else {
        return Err(DriverError::reroute(
            "expected a rerouting argument with rows",
        ));
    };
    Ok(scan_nested(ctx, column)?.with_string_fallback(fallback))
}

/// Scans the payload of a nested column as rows, using the schema adaptor
/// of the execution context for the nested columns. No query is issued.
pub fn scan_nested(ctx: &ExecutionContext, column: ReroutedColumn) -> DriverResult<Rows> {
    let Some(schema_adaptor) = ctx.schema_adaptor() else {
        return Err(DriverError::reroute("expected a rerouting schema adaptor"));
    };
    debug!(
        "rerouting {} nested rows with {} columns",
        column.len(), column.schema().len()
    );
    Ok(Rows::rerouted(column, Some(schema_adaptor.as_ref())))
}
