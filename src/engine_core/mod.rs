//! Core domain types shared by the engine and the MCP plumbing.

pub mod audit;
pub mod constants;
pub mod errors;
pub mod models;
