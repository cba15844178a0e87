//! Background services that run alongside the gateway.

pub mod enforce;

pub use enforce::spawn_mute_sweeper;
