pub mod adapters;
pub mod cli;
pub mod core;
pub mod error;
pub mod logging;

pub use crate::adapters::http::{create_router, ErrorBody};
pub use crate::core::connection::Database;
