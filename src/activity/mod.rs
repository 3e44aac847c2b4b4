//! Active-conversation discovery from the roster and recency snapshots.

pub mod aggregator;
pub mod filter;

pub use aggregator::{aggregate, build_activity_index, ActiveConversations, ActivityAggregator};
pub use filter::ConversationFilter;
