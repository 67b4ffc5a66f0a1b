//! Backend for a browser Lean 4 editor: a checker gateway, a document store
//! and an advisory chat, served over HTTP.

pub mod advisor;
pub mod config;
pub mod execution;
pub mod llm;
pub mod messages;
pub mod prompt;
pub mod server;
pub mod store;
