//! Domain layer: entities, store contracts and background workers.
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Store trait definitions
//! - [`expiry_sweeper`] - Periodic deletion of expired aliases
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; business rules live in [`crate::application::services`].

pub mod entities;
pub mod expiry_sweeper;
pub mod repositories;
