pub mod chat_stream;
pub mod config;
pub mod context;
pub mod conversation;
pub mod message;
pub mod search;
pub mod topic;
pub mod turn;
