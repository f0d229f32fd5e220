pub mod bind;
pub mod connection;
pub mod decode;
pub mod query;
pub mod schema;
mod sqlite;
pub mod types;
