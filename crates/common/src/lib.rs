//! Common utilities and types shared across Spatial Rooms components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for common configuration
pub mod config;
