//! Domain types and client-side state shared by every LogiTrack crate.

pub mod error;
pub mod fleet;
pub mod orders;
pub mod reports;
pub mod roles;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;
