pub mod client;
pub mod error;
pub mod transport;

pub use client::{GatewayClient, ToolCallRequest, ToolGateway, ToolOutput};
pub use error::{GatewayError, GatewayErrorKind};
