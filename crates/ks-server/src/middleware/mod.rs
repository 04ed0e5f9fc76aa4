//! HTTP middleware: request ID and event-token access gate.

pub mod access;
pub mod request_id;
