//! Shared types and utilities for the coursehub server and client.

pub mod authz;
pub mod error;
pub mod models;
pub mod pagination;
pub mod protocol;
pub mod validation;

pub use authz::*;
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use protocol::*;
pub use validation::*;
