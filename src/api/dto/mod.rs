//! Data Transfer Objects for API requests and responses.
//!
//! Request and response bodies use camelCase field names; request DTOs carry
//! `validator` rules for shape limits, while business rules stay in the
//! services.

pub mod health;
pub mod links;
pub mod shorten;
