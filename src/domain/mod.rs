//! Domain types for the feedback learning store
//! Defines the events, aggregates and learned artefacts the store persists.

pub mod error;
pub mod feedback;
pub mod insight;
pub mod learned_pattern;
pub mod preference;
pub mod quality;
pub mod stats;

pub use error::*;
pub use feedback::*;
pub use insight::*;
pub use learned_pattern::*;
pub use preference::*;
pub use quality::*;
pub use stats::*;
