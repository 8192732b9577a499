use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    futures::FutureExt,
    muster_directory::{AccountDirectory, ChannelDirectory},
    tracing::{Instrument, debug, error, info, info_span, warn},
};

use crate::{
    client::{MessagingClient, SessionConnector, apply_action},
    error::Result,
    notify::{Notification, NotificationSink},
    pause::{Pause, TokioPause},
    report::BatchReport,
    select::select_accounts,
    types::{Account, Channel, JoinOutcome, JoinResult, RunConfig},
};

/// Drives join, post-join action and notification for every
/// (account, channel) pair, one pair at a time.
pub struct Orchestrator {
    connector: Arc<dyn SessionConnector>,
    sink: Option<Arc<dyn NotificationSink>>,
    pause: Arc<dyn Pause>,
}

impl Orchestrator {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            connector,
            sink: None,
            pause: Arc::new(TokioPause),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Select accounts from the directories and run the batch.
    ///
    /// Fails before any pair is processed when the sample size exceeds the
    /// number of accounts.
    pub async fn run(
        &self,
        accounts: &AccountDirectory,
        channels: &ChannelDirectory,
        config: &RunConfig,
    ) -> Result<BatchReport> {
        let all = Account::from_directory(accounts);
        let selected = match config.account_sample_size {
            Some(size) => select_accounts(&all, size, config.seed)?,
            None => all,
        };
        let channels = Channel::from_directory(channels);
        if selected.is_empty() || channels.is_empty() {
            warn!(
                accounts = selected.len(),
                channels = channels.len(),
                "nothing to do"
            );
        }
        Ok(self.run_batch(&channels, &selected, config).await)
    }

    /// Process every channel in order, pausing between channels but not
    /// after the last one.
    pub async fn run_batch(
        &self,
        channels: &[Channel],
        accounts: &[Account],
        config: &RunConfig,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let delay = config.inter_channel_delay();

        for (index, channel) in channels.iter().enumerate() {
            debug!(
                channel_name = %channel.display_name,
                channel_id = %channel.id,
                invite_token = %channel.invite_token,
                "retrieved channel"
            );
            report
                .results
                .extend(self.run_for_channel(channel, accounts, config).await);

            if index + 1 < channels.len() {
                info!(
                    delay_secs = delay.as_secs(),
                    next = %channels[index + 1].display_name,
                    "pausing before next channel"
                );
                self.pause.pause(delay).await;
                report.delays += 1;
            }
        }

        let counts = report.counts();
        info!(
            attempts = report.attempts(),
            joined = counts.joined,
            already_member = counts.already_member,
            rate_limited = counts.rate_limited,
            failed = counts.failed,
            actions_applied = report.actions_applied(),
            notified = report.notified(),
            "batch finished"
        );
        report
    }

    /// Process `accounts` against one channel, strictly in order.
    pub async fn run_for_channel(
        &self,
        channel: &Channel,
        accounts: &[Account],
        config: &RunConfig,
    ) -> Vec<JoinResult> {
        let mut results = Vec::with_capacity(accounts.len());
        for account in accounts {
            results.push(self.process_pair(account, channel, config).await);
        }
        results
    }

    /// Join, act and notify for a single pair.
    ///
    /// Never fails: every problem, including a panic inside a client
    /// adapter, is recorded in the returned result. The session is released
    /// on every path once it has been opened.
    pub async fn process_pair(
        &self,
        account: &Account,
        channel: &Channel,
        config: &RunConfig,
    ) -> JoinResult {
        let span = info_span!(
            "pair",
            account = %account.session_id,
            channel_name = %channel.display_name,
            channel_id = %channel.id,
        );
        async {
            info!("connecting to account");
            let mut client = match AssertUnwindSafe(self.connector.connect(account))
                .catch_unwind()
                .await
            {
                Ok(Ok(client)) => client,
                Ok(Err(e)) => {
                    error!(error = %e, "failed to open session");
                    return JoinResult::new(
                        account,
                        channel,
                        JoinOutcome::failed(format!("connect: {e:#}")),
                    );
                },
                Err(panic) => {
                    let msg = panic_message(&*panic);
                    error!(panic = %msg, "session connector panicked");
                    return JoinResult::new(account, channel, JoinOutcome::failed(msg));
                },
            };

            let attempt = AssertUnwindSafe(self.drive(client.as_mut(), account, channel, config))
                .catch_unwind()
                .await;

            match AssertUnwindSafe(client.disconnect()).catch_unwind().await {
                Ok(Ok(())) => debug!("session released"),
                Ok(Err(e)) => warn!(error = %e, "failed to release session"),
                Err(panic) => error!(panic = %panic_message(&*panic), "session release panicked"),
            }

            match attempt {
                Ok(result) => {
                    debug!(state = ?result.state(), "pair finished");
                    result
                },
                Err(panic) => {
                    let msg = panic_message(&*panic);
                    error!(panic = %msg, "pair processing panicked");
                    JoinResult::new(account, channel, JoinOutcome::failed(msg))
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        client: &mut dyn MessagingClient,
        account: &Account,
        channel: &Channel,
        config: &RunConfig,
    ) -> JoinResult {
        info!(invite_token = %channel.invite_token, "attempt to join");
        let outcome = client.join_by_invite(&channel.invite_token).await;
        match &outcome {
            JoinOutcome::Joined => info!(outcome = %outcome, "joined channel"),
            JoinOutcome::AlreadyMember => warn!(outcome = %outcome, "account already a member"),
            JoinOutcome::RateLimited { retry_after } => error!(
                outcome = %outcome,
                retry_after_secs = retry_after.map(|d| d.as_secs()),
                "join rate limited, not retrying"
            ),
            JoinOutcome::Failed { reason } => {
                error!(outcome = %outcome, reason = %reason, "join failed")
            },
        }

        let mut result = JoinResult::new(account, channel, outcome);
        if !result.outcome.allows_action() {
            return result;
        }

        let action = config.post_join_action;
        info!(%action, "applying post-join action");
        match apply_action(client, channel, action).await {
            Ok(()) => result.action_applied = true,
            Err(e) => warn!(%action, error = %e, "post-join action failed"),
        }

        if let (Some(sink), Some(target)) = (&self.sink, config.notification_target.as_deref()) {
            let notification = Notification {
                account: account.session_id.clone(),
                channel: channel.display_name.clone(),
                timestamp: chrono::Utc::now(),
            };
            match sink.notify(target, &notification).await {
                Ok(()) => result.notified = true,
                Err(e) => warn!(notify_target = target, error = %e, "completion notification failed"),
            }
        }

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
