//! Account and channel directories loaded from delimited files.
//!
//! Both sources start with a header row that is skipped. The account source
//! carries a session identifier in its first column; the channel source
//! carries `display name, channel id, invite token` in that order.

pub mod accounts;
pub mod channels;
pub mod error;
mod reader;

pub use {
    accounts::AccountDirectory,
    channels::{ChannelDirectory, ChannelEntry},
    error::{Error, Result},
};
