use std::sync::Arc;
use std::vec;

use crate::adaptor::SchemaAdaptor;
use crate::columns::{ColumnModel, ReroutedColumn};
use crate::error::DriverResult;
use crate::query::RowIterator;
use crate::value::Value;

/// A producer of warehouse rows for a rows cursor.
/// A source is traversed once and is not restartable.
pub trait RowSource: Send {
    /// Returns the next row, or `None` at the end of data.
    fn next(&mut self) -> DriverResult<Option<Vec<Value>>>;

    /// Builds the column model describing the rows of this source.
    fn column_model(&self) -> ColumnModel;
}

/// A source backed by an open query result.
pub struct LiveRowSource {
    iterator: Box<dyn RowIterator>,
    schema_adaptor: Option<Arc<dyn SchemaAdaptor>>,
}

impl LiveRowSource {
    pub fn new(
        iterator: Box<dyn RowIterator>,
        schema_adaptor: Option<Arc<dyn SchemaAdaptor>>,
    ) -> Self {
        Self {
            iterator,
            schema_adaptor,
        }
    }
}

impl RowSource for LiveRowSource {
    fn next(&mut self) -> DriverResult<Option<Vec<Value>>> {
        self.iterator.next()
    }

    fn column_model(&self) -> ColumnModel {
        ColumnModel::new(self.iterator.schema(), self.schema_adaptor.as_deref())
    }
}

/// A source backed by the nested payload of a column that was already fetched.
pub struct ReroutedRowSource {
    columns: ColumnModel,
    rows: vec::IntoIter<Value>,
}

impl ReroutedRowSource {
    pub fn new(column: ReroutedColumn, schema_adaptor: Option<&dyn SchemaAdaptor>) -> Self {
        let (values, schema) = column.into_parts();
        Self {
            columns: ColumnModel::new(&schema, schema_adaptor),
            rows: values.into_iter(),
        }
    }
}

impl RowSource for ReroutedRowSource {
    fn next(&mut self) -> DriverResult<Option<Vec<Value>>> {
        Ok(self.rows.next().map(|row| match row {
            Value::List(values) => values,
            value => vec![value],
        }))
    }

    fn column_model(&self) -> ColumnModel {
        self.columns.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRowIterator;
    use crate::schema::{FieldSchema, FieldType, Schema};

    #[test]
    fn test_live_source_end_of_data() -> DriverResult<()> {
        let schema = Schema::new(vec![FieldSchema::new("id", FieldType::Integer)]);
        let mut source = LiveRowSource::new(
            Box::new(MemoryRowIterator::new(schema, vec![vec![Value::Int64(1)]])),
            None,
        );
        assert_eq!(source.column_model().column_names(), vec!["id"]);
        assert_eq!(source.next()?, Some(vec![Value::Int64(1)]));
        assert_eq!(source.next()?, None);
        assert_eq!(source.next()?, None);
        Ok(())
    }

    #[test]
    fn test_rerouted_source_rows() -> DriverResult<()> {
        let schema = Schema::new(vec![
            FieldSchema::new("a", FieldType::Integer),
            FieldSchema::new("b", FieldType::Integer),
        ]);
        let column = ReroutedColumn::new(
            vec![
                Value::List(vec![Value::Int64(1), Value::Int64(2)]),
                Value::List(vec![Value::Int64(3), Value::Int64(4)]),
            ],
            schema,
        );
        let mut source = ReroutedRowSource::new(column, None);
        assert_eq!(source.column_model().column_names(), vec!["a", "b"]);
        assert_eq!(source.next()?, Some(vec![Value::Int64(1), Value::Int64(2)]));
        assert_eq!(source.next()?, Some(vec![Value::Int64(3), Value::Int64(4)]));
        assert_eq!(source.next()?, None);
        Ok(())
    }

    #[test]
    fn test_rerouted_source_empty() -> DriverResult<()> {
        let schema = Schema::new(vec![FieldSchema::new("a", FieldType::Integer)]);
        let mut source = ReroutedRowSource::new(ReroutedColumn::new(vec![], schema), None);
        assert_eq!(source.next()?, None);
        Ok(())
    }
}
