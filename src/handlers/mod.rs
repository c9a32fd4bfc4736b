//! HTTP handlers: common service routes, description endpoints, and the
//! catch-all translation dispatch.

pub mod common;
pub mod describe;
pub mod rest;
