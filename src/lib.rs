pub mod application;
pub mod domain;
pub mod infra;
pub mod prompts;

pub use application::FeedbackStore;
pub use domain::{NewFeedback, StoreError, StoreResult, UserAction};
pub use infra::app_config::{StoreConfig, load_config};
