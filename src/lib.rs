//! Migration-portfolio answering assistant — core library.
//!
//! One question goes in; the intent router picks the backend(s) — a
//! structured business-data assistant, a semantic document index, or both —
//! the response cache and adapters fetch the answers, and the orchestrator
//! merges them into labeled sections with optional extracted tables.
//!
//! The binary entry point is `src/main.rs`.

pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod routing;
pub mod server;
pub mod session;
pub mod tabular;
