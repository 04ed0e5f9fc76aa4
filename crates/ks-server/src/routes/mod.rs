//! Route handlers for the HTTP API.

pub mod health;
pub mod media;
pub mod metrics;
pub mod streaming_helpers;
