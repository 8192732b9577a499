use {
    anyhow::Result,
    async_trait::async_trait,
    chrono::{DateTime, SecondsFormat, Utc},
};

/// Completion report for one (account, channel) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub account: String,
    pub channel: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Short plain-text rendering sent to the operator.
    #[must_use]
    pub fn text(&self) -> String {
        format!(
            "{} joined {} at {}",
            self.account,
            self.channel,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Best-effort delivery of completion reports to an operator destination.
///
/// Errors are logged by the caller and never change a pair's result.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, target: &str, notification: &Notification) -> Result<()>;
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    #[test]
    fn text_names_account_channel_and_time() {
        let notification = Notification {
            account: "acctA".into(),
            channel: "Chan1".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
        };
        assert_eq!(
            notification.text(),
            "acctA joined Chan1 at 2024-03-01T12:30:05Z"
        );
    }
}
