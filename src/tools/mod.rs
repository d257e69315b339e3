//! caltrack tools
//!
//! Tool implementations behind the MCP server.

pub mod ledger;
pub mod status;
