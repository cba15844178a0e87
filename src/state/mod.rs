//! State management module.
//!
//! Contains the Matrix (shared server state) and related entities.

mod color;
pub mod dashmap_ext;
pub mod managers;
mod matrix;
pub mod room;
mod session;
mod uid;

pub use color::{Color, UnknownColor};
pub use matrix::{Matrix, MatrixConfig, SessionGuard};
pub use room::{GENERAL, Room};
pub use session::{Line, Session};
pub use uid::{AddressAllocator, SessionId, SessionIdGenerator};

/// Case-folded form of a username, used wherever names are compared.
pub fn username_key(name: &str) -> String {
    name.to_lowercase()
}
