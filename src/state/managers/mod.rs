//! Domain managers for server state.
//!
//! Each manager owns one slice of the shared state and its own
//! synchronization. The [`Matrix`](crate::state::Matrix) holds one of each.

pub mod lifecycle;
pub mod moderation;
pub mod room;
pub mod session;
