use log::{Log, Metadata, Record};

/// A logger that delegates logging to a primary logger,
/// and if the primary logger is enabled, delegates to secondary loggers as well.
///
/// Secondary loggers can be restricted to a set of log target prefixes,
/// so that only driver and ORM records are attached to query spans.
pub struct CompositeLogger {
    primary: Box<dyn Log>,
    secondary: Vec<Box<dyn Log>>,
    secondary_targets: Vec<&'static str>,
}

impl CompositeLogger {
    pub fn new(primary: Box<dyn Log>, secondary: Vec<Box<dyn Log>>) -> Self {
        CompositeLogger {
            primary,
            secondary,
            secondary_targets: vec![],
        }
    }

    /// Only forwards records whose target starts with one of the prefixes
    /// to the secondary loggers. An empty list forwards every record.
    pub fn with_secondary_targets(mut self, targets: &[&'static str]) -> Self {
        self.secondary_targets = targets.to_vec();
        self
    }

    fn is_secondary_target(&self, target: &str) -> bool {
        self.secondary_targets.is_empty()
            || self.secondary_targets.iter().any(|x| target.starts_with(x))
    }
}

impl Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.primary.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.primary.enabled(record.metadata()) {
            self.primary.log(record);
            if self.is_secondary_target(record.target()) {
                for logger in &self.secondary {
                    logger.log(record);
                }
            }
        }
    }

    fn flush(&self) {
        self.primary.flush();
        for logger in &self.secondary {
            logger.flush();
        }
    }
}
