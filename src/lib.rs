//! roomchat - a multi-room TCP chat server.
//!
//! Clients speak newline-delimited UTF-8 text. Plain lines are chat for the
//! sender's current room; lines starting with `/` are commands. Every client
//! starts in the permanent `General` room.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod services;
pub mod state;
pub mod telemetry;
