//! Infrastructure layer (adapters/implementations).
//!
//! This module contains the IO-facing pieces: SQLite storage, configuration
//! files and hashing.

pub mod app_config;
pub mod db;
pub mod hash;
