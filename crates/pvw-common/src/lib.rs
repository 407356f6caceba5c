//! pvw common types and errors.
//!
//! This crate provides the types shared across pvw-core modules:
//! - Process and connection records
//! - Parse-time filter configuration
//! - Display columns and column schemas
//! - Collection, parse and action error types

pub mod column;
pub mod error;
pub mod filter;
pub mod model;

pub use column::{Column, ColumnSchema, ColumnToggles, Row};
pub use error::{ActionError, CollectionError, Error, ErrorCategory, ParseError, Result};
pub use filter::FilterConfig;
pub use model::{Connection, Process, STATUS_CLOSED, STATUS_LISTEN};
