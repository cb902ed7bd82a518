use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use bq_common::config::TelemetryConfig;
use fastrace::collector::{Config, ConsoleReporter, Reporter, SpanRecord};
use log::{debug, Log};

use crate::error::{TelemetryError, TelemetryResult};
use crate::loggers::composite::CompositeLogger;
use crate::loggers::span::SpanEventLogger;

enum TelemetryStatus {
    Uninitialized,
    Initialized,
    Failed,
    Finalized,
}

/// Log targets whose records are attached to the current span when traces are exported.
const SPAN_EVENT_TARGETS: &[&str] = &["bq_driver", "bq_orm"];

static TELEMETRY_STATUS: Mutex<TelemetryStatus> = Mutex::new(TelemetryStatus::Uninitialized);

pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    let mut status = TELEMETRY_STATUS
        .lock()
        .map_err(|e| TelemetryError::internal(e.to_string()))?;

    match *status {
        TelemetryStatus::Uninitialized => {
            init_traces(config);
            match init_logs(config) {
                Ok(()) => {
                    debug!("telemetry initialized");
                    *status = TelemetryStatus::Initialized;
                    Ok(())
                }
                Err(e) => {
                    *status = TelemetryStatus::Failed;
                    Err(e)
                }
            }
        }
        TelemetryStatus::Initialized => {
            Err(TelemetryError::internal("telemetry already initialized"))
        }
        TelemetryStatus::Failed => Err(TelemetryError::internal(
            "telemetry failed to initialize previously",
        )),
        TelemetryStatus::Finalized => Err(TelemetryError::internal(
            "telemetry has been finalized and cannot be re-initialized",
        )),
    }
}

fn init_traces(config: &TelemetryConfig) {
    if config.export_traces {
        fastrace::set_reporter(ConsoleReporter, Config::default());
    } else {
        let reporter_config = Config::default().report_interval(Duration::MAX);
        fastrace::set_reporter(NoOpReporter, reporter_config);
    }
}

fn init_logs(config: &TelemetryConfig) -> TelemetryResult<()> {
    if config.log_filter.trim().is_empty() {
        return Err(TelemetryError::invalid("empty log filter"));
    }
    let primary = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .format(move |buf, record| {
        let level = record.level();
        let target = record.target();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp();
        let args = record.args();
        writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
    })
    .build();
    let max_level = primary.filter();
    let primary = Box::new(primary);

    let mut secondary: Vec<Box<dyn Log>> = vec![];
    if config.export_traces {
        secondary.push(Box::new(SpanEventLogger));
    }

    let logger =
        CompositeLogger::new(primary, secondary).with_secondary_targets(SPAN_EVENT_TARGETS);
    log::set_boxed_logger(Box::new(logger)).map_err(|e| TelemetryError::internal(e.to_string()))?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn shutdown_telemetry() {
    debug!("shutting down telemetry...");
    fastrace::flush();
    if let Ok(mut status) = TELEMETRY_STATUS.lock() {
        if let TelemetryStatus::Initialized = *status {
            *status = TelemetryStatus::Finalized;
        }
    }
}

/// A fastrace reporter that does nothing.
pub struct NoOpReporter;

impl Reporter for NoOpReporter {
    fn report(&mut self, _spans: Vec<SpanRecord>) {}
}
