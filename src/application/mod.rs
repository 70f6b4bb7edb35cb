//! Application layer (learning policies and the store facade).
//!
//! Metrics, pattern mining, preference rules and insight synthesis are pure
//! functions over domain types; `store` wires them to persistence.

pub mod insights;
pub mod metrics;
pub mod patterns;
pub mod preferences;
pub mod store;

pub use store::FeedbackStore;
