//! Wire schema for uploaded editor activity
//!
//! This module defines the compact, delta-encoded upload format and the
//! adapter that parses and validates it.

mod adapter;
mod wire;

pub use adapter::*;
pub use wire::*;
