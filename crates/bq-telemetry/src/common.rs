/// Common span attribute names.
/// The names follow the OpenTelemetry semantic conventions for database
/// clients where one exists.
pub struct SpanAttribute;

impl SpanAttribute {
    pub const DB_SYSTEM: &'static str = "db.system";
    pub const DB_STATEMENT: &'static str = "db.statement";
    pub const DB_PARAMETER_COUNT: &'static str = "db.parameter_count";
    pub const DB_DEFAULT_DATASET: &'static str = "db.default_dataset";
    pub const EXCEPTION_MESSAGE: &'static str = "exception.message";
}

pub const DB_SYSTEM_NAME: &str = "bigquery";
