pub mod composite;
pub mod span;
