use std::sync::Arc;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::adaptor::{ColumnAdaptor, SchemaAdaptor};
use crate::error::DriverResult;
use crate::schema::{FieldType, Schema};
use crate::value::{DriverValue, Value};

/// The type name reported for repeated columns, whatever the element type.
pub const ARRAY_TYPE_NAME: &str = "ARRAY";

/// The type name reported when introspecting a column index beyond the schema width.
pub const COLUMN_INDEX_OUT_OF_RANGE: &str = "<INDEX OUT OF RANGE>";

/// The nested payload of a RECORD column together with its schema.
/// It is passed back to the statement executor to scan the payload as rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReroutedColumn {
    values: Vec<Value>,
    schema: Schema,
}

impl ReroutedColumn {
    /// Creates a rerouted column from a nested payload.
    /// A flat list of values is a single record and is promoted to one row,
    /// so that the payload is always a list of rows.
    pub fn new(values: Vec<Value>, schema: Schema) -> Self {
        let values = match values.first() {
            Some(Value::List(_)) | None => values,
            Some(_) => vec![Value::List(values)],
        };
        Self { values, schema }
    }

    /// Creates a rerouted column from the payload of a single record.
    pub fn record(values: Vec<Value>, schema: Schema) -> Self {
        Self {
            values: vec![Value::List(values)],
            schema,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The number of rows in the payload.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Value>, Schema) {
        (self.values, self.schema)
    }
}

impl Serialize for ReroutedColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(x) => serializer.serialize_bool(*x),
            Value::Int64(x) => serializer.serialize_i64(*x),
            Value::Float64(x) => serializer.serialize_f64(*x),
            Value::String(x) | Value::Json(x) | Value::Geography(x) => serializer.serialize_str(x),
            Value::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// One column of a result schema.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub field_type: FieldType,
    pub repeated: bool,
    pub required: bool,
    /// The fields of a RECORD column. Empty for every other column.
    pub schema: Schema,
    pub adaptor: Option<Arc<dyn ColumnAdaptor>>,
}

impl Column {
    /// Converts one warehouse value of this column into a driver value.
    ///
    /// A nested payload of a RECORD column is wrapped as a [`ReroutedColumn`]
    /// so that it can be scanned later. The result is then passed through
    /// the column adaptor, if any.
    pub fn convert_value(&self, value: Value) -> DriverResult<DriverValue> {
        let value = match value {
            Value::List(values) if !self.schema.is_empty() => {
                let column = if self.is_single_record(&values) {
                    ReroutedColumn::record(values, self.schema.clone())
                } else {
                    ReroutedColumn::new(values, self.schema.clone())
                };
                DriverValue::Rerouted(column)
            }
            value => DriverValue::Native(value),
        };
        match &self.adaptor {
            Some(adaptor) => adaptor.adapt_value(value),
            None => Ok(value),
        }
    }

    /// A STRUCT whose first field is an ARRAY or a STRUCT starts with a list,
    /// just like a payload of rows. Such a payload of a non-repeated column
    /// is one record.
    fn is_single_record(&self, values: &[Value]) -> bool {
        let first_field_is_list = self
            .schema
            .fields()
            .first()
            .is_some_and(|x| x.repeated || x.field_type == FieldType::Record);
        !self.repeated && first_field_is_list && matches!(values.first(), Some(Value::List(_)))
    }

    /// The type name reported to the client.
    pub fn type_name(&self) -> &'static str {
        if self.repeated {
            ARRAY_TYPE_NAME
        } else {
            self.field_type.as_str()
        }
    }

    pub fn nullable(&self) -> bool {
        !self.required
    }
}

/// The resolved columns of one result set, in warehouse declaration order.
/// Columns are addressed by index only.
#[derive(Debug, Clone, Default)]
pub struct ColumnModel {
    columns: Vec<Column>,
}

impl ColumnModel {
    pub fn new(schema: &Schema, schema_adaptor: Option<&dyn SchemaAdaptor>) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| Column {
                name: field.name.clone(),
                field_type: field.field_type,
                repeated: field.repeated,
                required: field.required,
                schema: field.schema.clone(),
                adaptor: schema_adaptor.and_then(|x| x.get_column_adaptor(&field.name)),
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|x| x.name.clone()).collect()
    }

    /// Converts the value at the given column index.
    /// Values beyond the schema width are returned unchanged.
    pub fn convert_column_value(&self, index: usize, value: Value) -> DriverResult<DriverValue> {
        match self.columns.get(index) {
            Some(column) => column.convert_value(value),
            None => Ok(DriverValue::Native(value)),
        }
    }

    pub fn column_types(&self) -> Vec<&'static str> {
        self.columns.iter().map(|x| x.type_name()).collect()
    }

    /// Returns [`COLUMN_INDEX_OUT_OF_RANGE`] for an index beyond the schema width.
    pub fn column_type_name(&self, index: usize) -> &'static str {
        self.columns
            .get(index)
            .map(|x| x.type_name())
            .unwrap_or(COLUMN_INDEX_OUT_OF_RANGE)
    }

    pub fn required_flags(&self) -> Vec<bool> {
        self.columns.iter().map(|x| x.required).collect()
    }

    pub fn nullable(&self, index: usize) -> Option<bool> {
        self.columns.get(index).map(|x| x.nullable())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::DriverError;
    use crate::schema::FieldSchema;

    #[derive(Debug)]
    struct UppercaseAdaptor;

    impl ColumnAdaptor for UppercaseAdaptor {
        fn adapt_value(&self, value: DriverValue) -> DriverResult<DriverValue> {
            match value {
                DriverValue::Native(Value::String(x)) => Ok(DriverValue::String(x.to_uppercase())),
                DriverValue::Native(Value::Null) => Ok(DriverValue::Null),
                other => {
                    let message = format!("unexpected value: {other}");
                    Err(DriverError::conversion(message))
                }
            }
        }
    }

    #[derive(Debug, Default)]
    struct TestSchemaAdaptor {
        adaptors: HashMap<String, Arc<dyn ColumnAdaptor>>,
    }

    impl SchemaAdaptor for TestSchemaAdaptor {
        fn get_column_adaptor(&self, name: &str) -> Option<Arc<dyn ColumnAdaptor>> {
            self.adaptors.get(name).cloned()
        }
    }

    fn address_schema() -> Schema {
        Schema::new(vec![
            FieldSchema::new("city", FieldType::String),
            FieldSchema::new("zip", FieldType::String),
        ])
    }

    #[test]
    fn test_column_type_names() {
        let addresses = FieldSchema::record("addresses", address_schema().fields().to_vec());
        let model = ColumnModel::new(
            &Schema::new(vec![
                FieldSchema::new("string", FieldType::String),
                FieldSchema::new("numeric", FieldType::Numeric),
                FieldSchema::new("boolean", FieldType::Boolean),
                FieldSchema::new("array_of_string", FieldType::String).repeated(),
                addresses.repeated(),
            ]),
            None,
        );
        assert_eq!(
            model.column_types(),
            vec!["STRING", "NUMERIC", "BOOLEAN", "ARRAY", "ARRAY"]
        );
        assert_eq!(model.column_type_name(1), "NUMERIC");
        assert_eq!(model.column_type_name(5), COLUMN_INDEX_OUT_OF_RANGE);
        let name = model.column_type_name(usize::MAX);
        assert_eq!(name, COLUMN_INDEX_OUT_OF_RANGE);
    }

    #[test]
    fn test_column_nullability() {
        let model = ColumnModel::new(
            &Schema::new(vec![
                FieldSchema::new("id", FieldType::Integer).required(),
                FieldSchema::new("name", FieldType::String),
            ]),
            None,
        );
        assert_eq!(model.required_flags(), vec![true, false]);
        assert_eq!(model.nullable(0), Some(false));
        assert_eq!(model.nullable(1), Some(true));
        assert_eq!(model.nullable(2), None);
    }

    #[test]
    fn test_convert_plain_value_unchanged() -> DriverResult<()> {
        let model = ColumnModel::new(
            &Schema::new(vec![FieldSchema::new("id", FieldType::Integer)]),
            None,
        );
        assert_eq!(
            model.convert_column_value(0, Value::Int64(1))?,
            DriverValue::Native(Value::Int64(1))
        );
        assert_eq!(
            model.convert_column_value(3, Value::Int64(2))?,
            DriverValue::Native(Value::Int64(2))
        );
        Ok(())
    }

    #[test]
    fn test_convert_with_column_adaptor() -> DriverResult<()> {
        let mut adaptor = TestSchemaAdaptor::default();
        adaptor
            .adaptors
            .insert("name".to_string(), Arc::new(UppercaseAdaptor));
        let model = ColumnModel::new(
            &Schema::new(vec![
                FieldSchema::new("id", FieldType::Integer),
                FieldSchema::new("name", FieldType::String),
            ]),
            Some(&adaptor),
        );
        assert!(model.columns()[0].adaptor.is_none());
        assert_eq!(
            model.convert_column_value(1, Value::String("ada".to_string()))?,
            DriverValue::String("ADA".to_string())
        );
        assert!(matches!(
            model.convert_column_value(1, Value::Int64(1)),
            Err(DriverError::ConversionError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_convert_nested_value_is_rerouted() -> DriverResult<()> {
        let model = ColumnModel::new(
            &Schema::new(vec![FieldSchema::record(
                "address",
                address_schema().fields().to_vec(),
            )]),
            None,
        );
        let value = model.convert_column_value(
            0,
            Value::List(vec![
                Value::String("Paris".to_string()),
                Value::String("75001".to_string()),
            ]),
        )?;
        let DriverValue::Rerouted(column) = value else {
            panic!("expected a rerouted column");
        };
        assert_eq!(column.schema(), &address_schema());
        assert_eq!(
            column.values(),
            &[Value::List(vec![
                Value::String("Paris".to_string()),
                Value::String("75001".to_string()),
            ])]
        );
        Ok(())
    }

    #[test]
    fn test_record_with_array_first_field() -> DriverResult<()> {
        let schema = Schema::new(vec![
            FieldSchema::new("tags", FieldType::String).repeated(),
            FieldSchema::new("name", FieldType::String),
        ]);
        let model = ColumnModel::new(
            &Schema::new(vec![FieldSchema::record("item", schema.fields().to_vec())]),
            None,
        );
        let record = vec![
            Value::List(vec![Value::String("a".to_string())]),
            Value::String("x".to_string()),
        ];
        let value = model.convert_column_value(0, Value::List(record.clone()))?;
        let DriverValue::Rerouted(column) = value else {
            panic!("expected a rerouted column");
        };
        assert_eq!(column.values(), &[Value::List(record)]);
        Ok(())
    }

    #[test]
    fn test_nested_repeated_type_name() -> DriverResult<()> {
        let tags = FieldSchema::new("tags", FieldType::Integer).repeated();
        let inner = FieldSchema::record("inner", vec![tags]);
        let outer = FieldSchema::record("outer", vec![inner.repeated()]);
        let model = ColumnModel::new(&Schema::new(vec![outer]), None);
        assert_eq!(model.column_types(), vec!["RECORD"]);

        let value = Value::List(vec![Value::List(vec![])]);
        let DriverValue::Rerouted(column) = model.convert_column_value(0, value)? else {
            panic!("expected a rerouted column");
        };
        let nested = ColumnModel::new(column.schema(), None);
        assert_eq!(nested.column_types(), vec!["ARRAY"]);
        let inner = &nested.columns()[0];
        let inner = ColumnModel::new(&inner.schema, None);
        assert_eq!(inner.column_types(), vec!["ARRAY"]);
        Ok(())
    }

    #[test]
    fn test_column_payloads_converge() -> DriverResult<()> {
        let record = FieldSchema::record("address", address_schema().fields().to_vec());
        for field in [record.clone(), record.repeated()] {
            let model = ColumnModel::new(&Schema::new(vec![field]), None);
            let flat = Value::List(vec![Value::Int64(1), Value::Int64(2)]);
            let rows = Value::List(vec![Value::List(vec![Value::Int64(1), Value::Int64(2)])]);
            assert_eq!(
                model.convert_column_value(0, flat)?,
                model.convert_column_value(0, rows)?
            );
        }
        Ok(())
    }

    #[test]
    fn test_flat_and_nested_payloads_converge() {
        let flat = ReroutedColumn::new(
            vec![Value::Int64(1), Value::Int64(2)],
            address_schema(),
        );
        let rows = ReroutedColumn::new(
            vec![Value::List(vec![Value::Int64(1), Value::Int64(2)])],
            address_schema(),
        );
        assert_eq!(flat, rows);
        assert_eq!(flat.len(), 1);

        let empty = ReroutedColumn::new(vec![], address_schema());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_nested_null_is_not_rerouted() -> DriverResult<()> {
        let model = ColumnModel::new(
            &Schema::new(vec![FieldSchema::record(
                "address",
                address_schema().fields().to_vec(),
            )]),
            None,
        );
        assert_eq!(
            model.convert_column_value(0, Value::Null)?,
            DriverValue::Native(Value::Null)
        );
        Ok(())
    }

    #[test]
    fn test_rerouted_column_json() -> DriverResult<()> {
        let column = ReroutedColumn::new(
            vec![
                Value::List(vec![Value::String("a".to_string()), Value::Int64(1)]),
                Value::List(vec![Value::Null, Value::Bool(true)]),
            ],
            address_schema(),
        );
        assert_eq!(serde_json::to_string(&column)?, r#"[["a",1],[null,true]]"#);
        Ok(())
    }
}
