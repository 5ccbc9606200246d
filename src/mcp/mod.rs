//! Model Context Protocol (MCP) plumbing.
//!
//! This module handles framing, stdio transport, child process management,
//! and the guard session that ties them together.

pub mod codec;
pub mod pipeline;
pub mod process;
pub mod server;
pub mod transport;
