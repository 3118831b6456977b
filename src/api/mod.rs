//! REST API client module for the Nova backend.
//!
//! This module provides the `ApiClient` shared by every screen. It owns
//! the two cross-cutting behaviors of the request pipeline: attaching the
//! bearer credential once known, and funneling every response through a
//! single interception point that raises the `UnauthorizedLatch` on
//! HTTP 401. Nothing else in the system reacts to authorization failures.

pub mod client;
pub mod error;

pub use client::{ApiClient, UnauthorizedLatch};
pub use error::ApiError;
