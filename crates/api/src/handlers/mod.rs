//! HTTP request handlers, grouped per resource.

pub mod audit;
pub mod auth;
pub mod parameters;
pub mod samples;
