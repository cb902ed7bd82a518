pub mod builders;
pub mod callbacks;
pub mod clause;
pub mod db;
pub mod error;
pub mod schema;
