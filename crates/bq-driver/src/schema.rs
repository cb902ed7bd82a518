use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{DriverError, DriverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Bytes,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Record,
    Date,
    Time,
    DateTime,
    Numeric,
    BigNumeric,
    Geography,
    Interval,
    Json,
    Range,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Bytes => "BYTES",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Record => "RECORD",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::DateTime => "DATETIME",
            FieldType::Numeric => "NUMERIC",
            FieldType::BigNumeric => "BIGNUMERIC",
            FieldType::Geography => "GEOGRAPHY",
            FieldType::Interval => "INTERVAL",
            FieldType::Json => "JSON",
            FieldType::Range => "RANGE",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DriverError;

    /// Parses a type name, accepting the standard SQL aliases
    /// the warehouse uses in its schema JSON.
    fn from_str(s: &str) -> DriverResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STRING" => Ok(FieldType::String),
            "BYTES" => Ok(FieldType::Bytes),
            "INTEGER" | "INT64" => Ok(FieldType::Integer),
            "FLOAT" | "FLOAT64" => Ok(FieldType::Float),
            "BOOLEAN" | "BOOL" => Ok(FieldType::Boolean),
            "TIMESTAMP" => Ok(FieldType::Timestamp),
            "RECORD" | "STRUCT" => Ok(FieldType::Record),
            "DATE" => Ok(FieldType::Date),
            "TIME" => Ok(FieldType::Time),
            "DATETIME" => Ok(FieldType::DateTime),
            "NUMERIC" | "DECIMAL" => Ok(FieldType::Numeric),
            "BIGNUMERIC" | "BIGDECIMAL" => Ok(FieldType::BigNumeric),
            "GEOGRAPHY" => Ok(FieldType::Geography),
            "INTERVAL" => Ok(FieldType::Interval),
            "JSON" => Ok(FieldType::Json),
            "RANGE" => Ok(FieldType::Range),
            other => Err(DriverError::invalid(format!("unknown field type: {other}"))),
        }
    }
}

/// One field of a warehouse result schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub repeated: bool,
    pub required: bool,
    /// The fields of a RECORD. Empty for every other type.
    pub schema: Schema,
    pub description: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            repeated: false,
            required: false,
            schema: Schema::default(),
            description: None,
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldType::Record).with_schema(Schema::new(fields))
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An ordered list of fields, in warehouse declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a schema in the warehouse JSON format, e.g.
    /// `[{"name": "tags", "type": "STRING", "mode": "REPEATED"}]`.
    pub fn from_json(json: &str) -> DriverResult<Self> {
        let fields: Vec<JsonField> = serde_json::from_str(json)?;
        Self::try_from_json_fields(fields)
    }

    fn try_from_json_fields(fields: Vec<JsonField>) -> DriverResult<Self> {
        let fields = fields
            .into_iter()
            .map(|field| {
                let field_type: FieldType = field.r#type.parse()?;
                let (repeated, required) = match field.mode {
                    JsonFieldMode::Nullable => (false, false),
                    JsonFieldMode::Required => (false, true),
                    JsonFieldMode::Repeated => (true, false),
                };
                Ok(FieldSchema {
                    name: field.name,
                    field_type,
                    repeated,
                    required,
                    schema: Self::try_from_json_fields(field.fields)?,
                    description: field.description,
                })
            })
            .collect::<DriverResult<Vec<_>>>()?;
        Ok(Self::new(fields))
    }
}

impl From<Vec<FieldSchema>> for Schema {
    fn from(fields: Vec<FieldSchema>) -> Self {
        Self::new(fields)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum JsonFieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

#[derive(Debug, Deserialize)]
struct JsonField {
    name: String,
    r#type: String,
    #[serde(default)]
    mode: JsonFieldMode,
    #[serde(default)]
    fields: Vec<JsonField>,
    #[serde(default)]
    description: Option<String>,
}
