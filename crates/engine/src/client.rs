use {anyhow::Result, async_trait::async_trait, muster_common::PostJoinAction};

use crate::types::{Account, Channel, JoinOutcome};

/// Notification settings for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifySettings {
    /// Unix time until which notifications stay silent; `0` means deliver.
    pub mute_until: i32,
}

impl NotifySettings {
    /// Silence that lasts until someone reverses it by hand.
    pub const MUTED_FOREVER: Self = Self {
        mute_until: i32::MAX,
    };
    /// Host default delivery.
    pub const DEFAULT_DELIVERY: Self = Self { mute_until: 0 };
}

/// A live session for one account.
///
/// Sessions are exclusively owned by the pair being processed and are
/// released with [`disconnect`](Self::disconnect) before the next account
/// starts.
#[async_trait]
pub trait MessagingClient: Send {
    /// Join the channel behind `invite_token`. Host errors are classified
    /// into the outcome rather than returned.
    async fn join_by_invite(&mut self, invite_token: &str) -> JoinOutcome;

    /// Replace the notification settings of `channel_id`.
    async fn update_notify_settings(
        &mut self,
        channel_id: &str,
        settings: NotifySettings,
    ) -> Result<()>;

    /// Release the session.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Opens sessions for accounts.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, account: &Account) -> Result<Box<dyn MessagingClient>>;
}

/// Apply `action` to `channel` through `client`.
///
/// Both actions set an absolute value, so applying one twice leaves the
/// channel as applying it once does.
pub async fn apply_action(
    client: &mut dyn MessagingClient,
    channel: &Channel,
    action: PostJoinAction,
) -> Result<()> {
    let settings = match action {
        PostJoinAction::Mute => NotifySettings::MUTED_FOREVER,
        PostJoinAction::Unmute => NotifySettings::DEFAULT_DELIVERY,
    };
    client.update_notify_settings(&channel.id, settings).await
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    #[derive(Default)]
    struct SettingsOnly {
        settings: HashMap<String, NotifySettings>,
        writes: usize,
    }

    #[async_trait]
    impl MessagingClient for SettingsOnly {
        async fn join_by_invite(&mut self, _invite_token: &str) -> JoinOutcome {
            JoinOutcome::Joined
        }

        async fn update_notify_settings(
            &mut self,
            channel_id: &str,
            settings: NotifySettings,
        ) -> Result<()> {
            self.writes += 1;
            self.settings.insert(channel_id.to_string(), settings);
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn mute_sets_maximum_suppression() {
        let mut client = SettingsOnly::default();
        let channel = Channel::new("100", "Chan1", "hashX");
        apply_action(&mut client, &channel, PostJoinAction::Mute)
            .await
            .unwrap();
        assert_eq!(client.settings["100"].mute_until, 2_147_483_647);
    }

    #[tokio::test]
    async fn unmute_restores_default_delivery() {
        let mut client = SettingsOnly::default();
        let channel = Channel::new("100", "Chan1", "hashX");
        apply_action(&mut client, &channel, PostJoinAction::Mute)
            .await
            .unwrap();
        apply_action(&mut client, &channel, PostJoinAction::Unmute)
            .await
            .unwrap();
        assert_eq!(client.settings["100"], NotifySettings::DEFAULT_DELIVERY);
    }

    #[tokio::test]
    async fn actions_are_idempotent() {
        let channel = Channel::new("100", "Chan1", "hashX");
        for action in [PostJoinAction::Mute, PostJoinAction::Unmute] {
            let mut once = SettingsOnly::default();
            apply_action(&mut once, &channel, action).await.unwrap();

            let mut twice = SettingsOnly::default();
            apply_action(&mut twice, &channel, action).await.unwrap();
            apply_action(&mut twice, &channel, action).await.unwrap();

            assert_eq!(once.settings, twice.settings, "{action}");
            assert_eq!(twice.writes, 2);
        }
    }
}
