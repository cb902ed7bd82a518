use log::trace;

use crate::adaptor::SchemaAdaptor;
use crate::columns::{ColumnModel, ReroutedColumn, COLUMN_INDEX_OUT_OF_RANGE};
use crate::convert::{unsupported_value_to_string, StringFallback};
use crate::error::DriverResult;
use crate::source::{ReroutedRowSource, RowSource};
use crate::value::DriverValue;

/// The row reader handed to the client for one statement execution.
///
/// The column model is resolved from the source on first use and kept
/// for the lifetime of the cursor.
pub struct Rows {
    source: Box<dyn RowSource>,
    columns: Option<ColumnModel>,
    fallback: StringFallback,
}

impl Rows {
    pub fn new(source: Box<dyn RowSource>) -> Self {
        Self {
            source,
            columns: None,
            fallback: StringFallback::default(),
        }
    }

    /// Creates a cursor whose column model is already known.
    pub fn with_columns(source: Box<dyn RowSource>, columns: ColumnModel) -> Self {
        Self {
            source,
            columns: Some(columns),
            fallback: StringFallback::default(),
        }
    }

    /// Creates a cursor over the nested payload of a column.
    /// No query is issued.
    pub fn rerouted(column: ReroutedColumn, schema_adaptor: Option<&dyn SchemaAdaptor>) -> Self {
        let source = ReroutedRowSource::new(column, schema_adaptor);
        let columns = source.column_model();
        Self::with_columns(Box::new(source), columns)
    }

    pub fn with_string_fallback(mut self, fallback: StringFallback) -> Self {
        self.fallback = fallback;
        self
    }

    fn column_model(&mut self) -> &ColumnModel {
        let source = &self.source;
        self.columns.get_or_insert_with(|| source.column_model())
    }

    pub fn columns(&mut self) -> Vec<String> {
        self.column_model().column_names()
    }

    /// Fetches the next row into `dest`.
    ///
    /// Returns the number of slots filled, or `None` at the end of data.
    /// Slots beyond the width of the row are left untouched.
    /// If any value fails to convert, the whole call fails.
    pub fn next(&mut self, dest: &mut [DriverValue]) -> DriverResult<Option<usize>> {
        let fallback = self.fallback;
        self.column_model();
        let Some(values) = self.source.next()? else {
            return Ok(None);
        };
        let columns = self.column_model();
        let mut converted = Vec::with_capacity(dest.len().min(values.len()));
        for (index, value) in values.into_iter().take(dest.len()).enumerate() {
            if fallback == StringFallback::Enabled {
                if let Some(text) = unsupported_value_to_string(&value) {
                    trace!("column {index} rendered as string");
                    converted.push(DriverValue::String(text));
                    continue;
                }
            }
            converted.push(columns.convert_column_value(index, value)?);
        }
        let count = converted.len();
        for (slot, value) in dest.iter_mut().zip(converted) {
            *slot = value;
        }
        Ok(Some(count))
    }

    /// Fetches the next row with one slot per column.
    pub fn next_row(&mut self) -> DriverResult<Option<Vec<DriverValue>>> {
        let width = self.column_model().len();
        let mut row = vec![DriverValue::Null; width];
        Ok(self.next(&mut row)?.map(|_| row))
    }

    /// Fetches all the remaining rows.
    pub fn collect_rows(&mut self) -> DriverResult<Vec<Vec<DriverValue>>> {
        let mut rows = vec![];
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// The result iterator belongs to the warehouse client,
    /// so there is nothing to release here.
    pub fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }

    pub fn column_type_database_type_name(&mut self, index: usize) -> &'static str {
        match self.column_model().columns().get(index) {
            Some(column) => column.type_name(),
            None => COLUMN_INDEX_OUT_OF_RANGE,
        }
    }

    /// Returns whether the column is nullable, and whether that is known.
    pub fn column_type_nullable(&mut self, index: usize) -> (bool, bool) {
        match self.column_model().nullable(index) {
            Some(nullable) => (nullable, true),
            None => (true, false),
        }
    }
}
