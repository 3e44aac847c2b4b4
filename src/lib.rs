#![forbid(unsafe_code)]

//! Workspace activity discovery and participant identity resolution for
//! Slack workspaces authenticated through a slackdump credential cache.

pub mod activity;
pub mod config;
pub mod credentials;
pub mod discovery;
pub mod errors;
pub mod identity;
pub mod models;
pub mod slack;
pub mod window;

pub use config::EngineConfig;
pub use errors::{AppError, Result};
