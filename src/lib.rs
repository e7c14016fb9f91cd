//! Searchlight is a line-oriented chat client whose messages can trigger
//! searches on MCP tool gateways.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the per-turn pipeline: topic extraction, search dispatch,
//!   context assembly, conversation history, configuration, and the
//!   language model client.
//! - [`mcp`] provides the Model Context Protocol client: streamable HTTP
//!   transport, per-call sessions, and result parsing.
//! - [`api`] defines the chat completion payloads sent to the model server.
//! - [`cli`] parses arguments and runs the `chat`, `say`, `call`, and `tools`
//!   commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod mcp;
pub mod utils;
