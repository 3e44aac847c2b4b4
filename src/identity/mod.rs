//! Participant identity resolution: directory, persistent cache, network.

pub mod cache;
pub mod directory;
pub mod resolver;

pub use cache::IdentityCache;
pub use directory::DirectoryIndex;
pub use resolver::{CacheTier, DirectoryTier, IdentityLookup, IdentityResolver, UserFetcher};
