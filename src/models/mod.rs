//! Domain model module declarations.

pub mod conversation;
pub mod credentials;
pub mod export;
pub mod user;
pub mod window;
