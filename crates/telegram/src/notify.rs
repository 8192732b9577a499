use {
    async_trait::async_trait,
    muster_engine::{Notification, NotificationSink},
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{LinkPreviewOptions, Recipient},
    },
    tracing::{debug, info},
};

use crate::error::Context;

/// Sends completion reports through a Telegram bot.
pub struct BotNotifier {
    bot: Bot,
}

impl BotNotifier {
    pub fn new(token: &Secret<String>) -> crate::Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build bot HTTP client")?;
        Ok(Self {
            bot: Bot::with_client(token.expose_secret(), client),
        })
    }

    /// Point the bot at a different Bot API server.
    #[must_use]
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    /// Verify the token and log the bot's username.
    pub async fn check(&self, label: Option<&str>) -> crate::Result<()> {
        let me = self.bot.get_me().await?;
        info!(
            bot = label.unwrap_or("notifier"),
            username = ?me.username,
            "notification bot connected"
        );
        Ok(())
    }
}

/// Numeric targets are chat ids; anything else is taken as `@channel`.
fn recipient(target: &str) -> Recipient {
    match target.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(target.trim().to_string()),
    }
}

fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl NotificationSink for BotNotifier {
    async fn notify(&self, target: &str, notification: &Notification) -> anyhow::Result<()> {
        self.bot
            .send_message(recipient(target), notification.text())
            .link_preview_options(no_preview())
            .await?;
        debug!(
            target_chat = target,
            account = %notification.account,
            channel = %notification.channel,
            "completion notification sent"
        );
        Ok(())
    }
}
