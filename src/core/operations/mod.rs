//! Key-wrap operations.
//!
//! This module provides the RFC 3394 wrap and unwrap transforms:
//!
//! - [`wrap`] / [`wrap_with`] - encrypt key material under a KEK
//! - [`unwrap`] / [`unwrap_with`] - decrypt and integrity-check wrapped
//!   key material

mod kw;

pub use kw::{unwrap, unwrap_with, wrap, wrap_with};
