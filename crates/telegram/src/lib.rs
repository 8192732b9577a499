//! Telegram adapters for the join engine.
//!
//! Account sessions are hosted by an HTTP session gateway that speaks the
//! user-account API on our behalf; completion reports go out through the
//! Bot API via teloxide.

pub mod error;
pub mod gateway;
pub mod notify;
pub mod session;

pub use {
    error::{Error, Result},
    gateway::GatewayClient,
    notify::BotNotifier,
    session::{GatewayConnector, GatewaySession},
};
