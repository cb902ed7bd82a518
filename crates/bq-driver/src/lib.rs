pub mod adaptor;
pub mod columns;
pub mod connection;
pub mod context;
pub mod convert;
pub mod error;
pub mod memory;
pub mod parameter;
pub mod query;
pub mod rows;
pub mod schema;
pub mod source;
pub mod statement;
pub mod value;
