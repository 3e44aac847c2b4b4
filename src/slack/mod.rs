//! Slack API access: transport, payloads, and timestamp handling.

pub mod api;
pub mod gateway;
pub mod timestamp;

pub use gateway::{ApiGateway, ApiScope};
pub use timestamp::parse_slack_ts;
