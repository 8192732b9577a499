//! Shared types and error definitions used across all muster crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage},
    types::PostJoinAction,
};
