use std::collections::HashMap;
use std::sync::Arc;

use bq_driver::adaptor::{ColumnAdaptor, SchemaAdaptor};
use bq_driver::context::ExecutionContext;
use bq_driver::convert::StringFallback;
use bq_driver::error::{DriverError, DriverResult};
use bq_driver::statement::scan_nested;
use bq_driver::value::{DriverValue, Value};

#[derive(Debug, Clone)]
pub struct EntityField {
    pub name: String,
    /// The warehouse column the field is mapped to.
    pub db_name: String,
    pub adaptor: Option<Arc<dyn ColumnAdaptor>>,
    /// The entity the nested records of this column are read into.
    pub nested: Option<String>,
}

impl EntityField {
    pub fn new(name: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_name: db_name.into(),
            adaptor: None,
            nested: None,
        }
    }

    pub fn with_adaptor(mut self, adaptor: Arc<dyn ColumnAdaptor>) -> Self {
        self.adaptor = Some(adaptor);
        self
    }

    pub fn with_nested(mut self, entity: impl Into<String>) -> Self {
        self.nested = Some(entity.into());
        self
    }
}

/// The mapping between an entity and a warehouse table.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub fields: Vec<EntityField>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: vec![],
        }
    }

    pub fn with_field(mut self, field: EntityField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field_by_db_name(&self, db_name: &str) -> Option<&EntityField> {
        self.fields.iter().find(|x| x.db_name == db_name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|x| x.db_name.as_str()).collect()
    }
}

/// All entity schemas known to the ORM, by entity name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, schema: EntitySchema) -> Self {
        self.register(schema);
        self
    }

    pub fn register(&mut self, schema: EntitySchema) {
        self.entities.insert(schema.name.clone(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.entities.get(name).cloned()
    }
}

/// Resolves column adaptors from the entity a query reads into.
#[derive(Debug, Clone)]
pub struct OrmSchemaAdaptor {
    schema: Option<Arc<EntitySchema>>,
    root: Arc<SchemaRegistry>,
}

impl OrmSchemaAdaptor {
    pub fn new(schema: Option<Arc<EntitySchema>>, root: Arc<SchemaRegistry>) -> Self {
        Self { schema, root }
    }

    pub fn schema(&self) -> Option<&Arc<EntitySchema>> {
        self.schema.as_ref()
    }
}

impl SchemaAdaptor for OrmSchemaAdaptor {
    fn get_column_adaptor(&self, name: &str) -> Option<Arc<dyn ColumnAdaptor>> {
        let field = self.schema.as_ref()?.field_by_db_name(name)?;
        if let Some(adaptor) = &field.adaptor {
            return Some(adaptor.clone());
        }
        let nested = self.root.get(field.nested.as_ref()?)?;
        Some(Arc::new(NestedEntityAdaptor::new(OrmSchemaAdaptor::new(
            Some(nested),
            self.root.clone(),
        ))))
    }
}

/// Reads the nested records of a column into rows of the nested entity.
#[derive(Debug)]
pub struct NestedEntityAdaptor {
    context: ExecutionContext,
}

impl NestedEntityAdaptor {
    pub fn new(adaptor: OrmSchemaAdaptor) -> Self {
        Self {
            context: ExecutionContext::new().with_schema_adaptor(Arc::new(adaptor)),
        }
    }
}

impl ColumnAdaptor for NestedEntityAdaptor {
    fn adapt_value(&self, value: DriverValue) -> DriverResult<DriverValue> {
        match value {
            DriverValue::Rerouted(column) => {
                let rows = scan_nested(&self.context, column)?;
                let mut rows = rows.with_string_fallback(StringFallback::Disabled);
                Ok(DriverValue::Rows(rows.collect_rows()?))
            }
            DriverValue::Null | DriverValue::Native(Value::Null) => Ok(DriverValue::Null),
            other => {
                let message = format!("expected nested records: {other}");
                Err(DriverError::conversion(message))
            }
        }
    }
}
