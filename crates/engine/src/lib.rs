//! Join orchestration: for every channel, walk the selected accounts,
//! join by invite token, apply the post-join notification setting, and
//! report completion to the operator.
//!
//! Network access goes through the [`SessionConnector`], [`MessagingClient`]
//! and [`NotificationSink`] contracts; this crate never talks to a host
//! directly.

pub mod client;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod pause;
pub mod report;
pub mod select;
pub mod types;

pub use {
    client::{MessagingClient, NotifySettings, SessionConnector, apply_action},
    error::{Error, Result},
    muster_common::PostJoinAction,
    notify::{Notification, NotificationSink},
    orchestrator::Orchestrator,
    pause::{Pause, TokioPause},
    report::{BatchReport, OutcomeCounts},
    select::{check_sample_size, select_accounts},
    types::{Account, Channel, JoinOutcome, JoinResult, PairState, RunConfig},
};
