use std::{fmt, time::Duration};

use {
    muster_common::PostJoinAction,
    muster_directory::{AccountDirectory, ChannelDirectory},
};

/// A client identity, addressed by its session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub session_id: String,
}

impl Account {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// Accounts in directory order.
    #[must_use]
    pub fn from_directory(directory: &AccountDirectory) -> Vec<Self> {
        directory.sessions().iter().map(Self::new).collect()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.session_id)
    }
}

/// A joinable destination reachable through an invite token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub id: String,
    pub display_name: String,
    pub invite_token: String,
}

impl Channel {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        invite_token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            invite_token: invite_token.into(),
        }
    }

    /// Channels in directory (source) order.
    #[must_use]
    pub fn from_directory(directory: &ChannelDirectory) -> Vec<Self> {
        directory
            .iter()
            .map(|(id, entry)| Self::new(id, &entry.display_name, &entry.invite_token))
            .collect()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Settings for one run, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub post_join_action: PostJoinAction,
    /// Draw this many accounts at random; all accounts when `None`.
    pub account_sample_size: Option<usize>,
    pub inter_channel_delay_secs: u64,
    /// Chat that receives completion reports.
    pub notification_target: Option<String>,
    /// Fixes the account draw when set.
    pub seed: Option<u64>,
}

impl RunConfig {
    #[must_use]
    pub fn inter_channel_delay(&self) -> Duration {
        Duration::from_secs(self.inter_channel_delay_secs)
    }
}

/// How the host answered a join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Membership granted.
    Joined,
    /// The account was already in the channel.
    AlreadyMember,
    /// The host asked the account to back off. Not retried within the run.
    RateLimited { retry_after: Option<Duration> },
    /// Anything else.
    Failed { reason: String },
}

impl JoinOutcome {
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the post-join action may follow this outcome.
    #[must_use]
    pub fn allows_action(&self) -> bool {
        matches!(self, Self::Joined | Self::AlreadyMember)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::AlreadyMember => "already_member",
            Self::RateLimited { .. } => "rate_limited",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a processed (account, channel) pair ended up.
///
/// A join that succeeds, or finds the account already present, always moves
/// on to `ActionApplied` and possibly `Notified`, so those two outcomes never
/// end a pair. `ActionApplied` is reached whether or not the action
/// succeeded; see [`JoinResult::action_applied`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    RateLimited,
    Failed,
    ActionApplied,
    Notified,
}

impl PairState {
    /// `RateLimited` and `Failed` admit no further transitions.
    #[must_use]
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, Self::RateLimited | Self::Failed)
    }
}

/// Record of one processed pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    pub account: Account,
    pub channel: Channel,
    pub outcome: JoinOutcome,
    pub action_applied: bool,
    pub notified: bool,
}

impl JoinResult {
    #[must_use]
    pub fn new(account: &Account, channel: &Channel, outcome: JoinOutcome) -> Self {
        Self {
            account: account.clone(),
            channel: channel.clone(),
            outcome,
            action_applied: false,
            notified: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> PairState {
        match self.outcome {
            JoinOutcome::RateLimited { .. } => PairState::RateLimited,
            JoinOutcome::Failed { .. } => PairState::Failed,
            JoinOutcome::Joined | JoinOutcome::AlreadyMember if self.notified => {
                PairState::Notified
            },
            JoinOutcome::Joined | JoinOutcome::AlreadyMember => PairState::ActionApplied,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::path::Path};

    #[test]
    fn only_membership_outcomes_allow_action() {
        assert!(JoinOutcome::Joined.allows_action());
        assert!(JoinOutcome::AlreadyMember.allows_action());
        assert!(!JoinOutcome::RateLimited { retry_after: None }.allows_action());
        assert!(!JoinOutcome::failed("boom").allows_action());
    }

    #[test]
    fn state_follows_outcome_and_flags() {
        let account = Account::new("a");
        let channel = Channel::new("1", "One", "h");

        let mut result = JoinResult::new(&account, &channel, JoinOutcome::Joined);
        assert_eq!(result.state(), PairState::ActionApplied);
        result.notified = true;
        assert_eq!(result.state(), PairState::Notified);

        let limited = JoinResult::new(
            &account,
            &channel,
            JoinOutcome::RateLimited {
                retry_after: Some(Duration::from_secs(5)),
            },
        );
        assert_eq!(limited.state(), PairState::RateLimited);
        assert!(limited.state().is_terminal_failure());
    }

    #[test]
    fn channels_follow_directory_order() {
        let directory = ChannelDirectory::from_reader(
            "name,id,hash\nChan2,200,hashY\nChan1,100,hashX\n".as_bytes(),
            Path::new("channels.csv"),
            b',',
        )
        .unwrap();
        let channels = Channel::from_directory(&directory);
        assert_eq!(channels, vec![
            Channel::new("200", "Chan2", "hashY"),
            Channel::new("100", "Chan1", "hashX"),
        ]);
    }

    #[test]
    fn delay_in_seconds() {
        let config = RunConfig {
            inter_channel_delay_secs: 45,
            ..Default::default()
        };
        assert_eq!(config.inter_channel_delay(), Duration::from_secs(45));
    }
}
