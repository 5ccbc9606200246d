//! Policy engine.
//!
//! This module contains the name-based allow/deny policy, the request gate
//! applied before forwarding, and the filter applied to list responses.

pub mod filter;
pub mod gate;
pub mod pattern_matcher;
pub mod policy;
