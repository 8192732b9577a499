use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    muster_engine::{Account, JoinOutcome, MessagingClient, NotifySettings, SessionConnector},
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    tracing::debug,
};

use crate::{error::Error, gateway::GatewayClient};

/// Reported by the host when the account is already in the channel.
const ALREADY_PARTICIPANT: &str = "USER_ALREADY_PARTICIPANT";
/// Prefix of flood-control descriptions, e.g. `FLOOD_WAIT_30`.
const FLOOD_WAIT_PREFIX: &str = "FLOOD_WAIT_";
/// Error code the host uses for flood control.
const FLOOD_CODE: i32 = 420;

/// Opens gateway-hosted sessions using the shared credential pair.
pub struct GatewayConnector {
    gateway: Arc<GatewayClient>,
    api_id: i32,
    api_hash: Secret<String>,
}

impl GatewayConnector {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        api_id: i32,
        api_hash: Secret<String>,
    ) -> crate::Result<Self> {
        Ok(Self {
            gateway: Arc::new(GatewayClient::new(base_url, timeout)?),
            api_id,
            api_hash,
        })
    }
}

#[async_trait]
impl SessionConnector for GatewayConnector {
    async fn connect(&self, account: &Account) -> anyhow::Result<Box<dyn MessagingClient>> {
        let _: serde_json::Value = self
            .gateway
            .call(
                "connect",
                &json!({
                    "session": account.session_id,
                    "api_id": self.api_id,
                    "api_hash": self.api_hash.expose_secret(),
                }),
            )
            .await?;
        debug!(session = %account.session_id, "gateway session opened");
        Ok(Box::new(GatewaySession {
            gateway: Arc::clone(&self.gateway),
            session: account.session_id.clone(),
            open: true,
        }))
    }
}

/// One account's session on the gateway.
pub struct GatewaySession {
    gateway: Arc<GatewayClient>,
    session: String,
    open: bool,
}

#[async_trait]
impl MessagingClient for GatewaySession {
    async fn join_by_invite(&mut self, invite_token: &str) -> JoinOutcome {
        let reply: Result<serde_json::Value, Error> = self
            .gateway
            .call(
                "importChatInvite",
                &json!({ "session": self.session, "hash": invite_token }),
            )
            .await;
        match reply {
            Ok(_) => JoinOutcome::Joined,
            Err(e) => classify_join_error(&e),
        }
    }

    async fn update_notify_settings(
        &mut self,
        channel_id: &str,
        settings: NotifySettings,
    ) -> anyhow::Result<()> {
        let peer: i64 = channel_id
            .parse()
            .map_err(|e| anyhow::anyhow!("channel id {channel_id:?} is not numeric: {e}"))?;
        let _: serde_json::Value = self
            .gateway
            .call(
                "updateNotifySettings",
                &json!({
                    "session": self.session,
                    "peer": peer,
                    "mute_until": settings.mute_until,
                }),
            )
            .await?;
        Ok(())
    }

    async fn disconnect(&mut self) -> anyhow::Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let _: serde_json::Value = self
            .gateway
            .call("disconnect", &json!({ "session": self.session }))
            .await?;
        debug!(session = %self.session, "gateway session closed");
        Ok(())
    }
}

/// Map a failed join call onto the outcome the engine acts on.
fn classify_join_error(error: &Error) -> JoinOutcome {
    let Error::Gateway {
        code,
        description,
        retry_after,
    } = error
    else {
        return JoinOutcome::failed(error.to_string());
    };

    if description.contains(ALREADY_PARTICIPANT) {
        return JoinOutcome::AlreadyMember;
    }
    let flood_secs = description
        .strip_prefix(FLOOD_WAIT_PREFIX)
        .and_then(|s| s.parse::<u64>().ok());
    if *code == FLOOD_CODE || flood_secs.is_some() || retry_after.is_some() {
        return JoinOutcome::RateLimited {
            retry_after: retry_after.or(flood_secs).map(Duration::from_secs),
        };
    }
    JoinOutcome::failed(format!("{code}: {description}"))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, rstest::rstest};

    fn gateway_error(code: i32, description: &str, retry_after: Option<u64>) -> Error {
        Error::Gateway {
            code,
            description: description.into(),
            retry_after,
        }
    }

    #[rstest]
    #[case(400, "USER_ALREADY_PARTICIPANT", None, JoinOutcome::AlreadyMember)]
    #[case(420, "FLOOD_WAIT_30", Some(30), JoinOutcome::RateLimited { retry_after: Some(Duration::from_secs(30)) })]
    #[case(420, "FLOOD_WAIT_45", None, JoinOutcome::RateLimited { retry_after: Some(Duration::from_secs(45)) })]
    #[case(420, "SLOWMODE", None, JoinOutcome::RateLimited { retry_after: None })]
    #[case(400, "INVITE_HASH_EXPIRED", None, JoinOutcome::failed("400: INVITE_HASH_EXPIRED"))]
    #[case(400, "CHANNELS_TOO_MUCH", None, JoinOutcome::failed("400: CHANNELS_TOO_MUCH"))]
    fn classifies_gateway_errors(
        #[case] code: i32,
        #[case] description: &str,
        #[case] retry_after: Option<u64>,
        #[case] expected: JoinOutcome,
    ) {
        assert_eq!(
            classify_join_error(&gateway_error(code, description, retry_after)),
            expected
        );
    }

    #[test]
    fn non_gateway_errors_fail() {
        let outcome = classify_join_error(&Error::message("connection reset"));
        assert_eq!(outcome, JoinOutcome::failed("connection reset"));
    }

    async fn connect(server: &mockito::Server) -> Box<dyn MessagingClient> {
        let connector = GatewayConnector::new(
            &server.url(),
            Duration::from_secs(5),
            12345,
            Secret::new("hash".into()),
        )
        .unwrap();
        connector.connect(&Account::new("acctA")).await.unwrap()
    }

    async fn ok_mock(server: &mut mockito::Server, path: &str) -> mockito::Mock {
        server
            .mock("POST", path)
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn connect_sends_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/connect")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "session": "acctA",
                "api_id": 12345,
                "api_hash": "hash"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        connect(&server).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn join_and_mute_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let _connect = ok_mock(&mut server, "/connect").await;
        let join = server
            .mock("POST", "/importChatInvite")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"session": "acctA", "hash": "hashX"}),
            ))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"chat_id":100}}"#)
            .create_async()
            .await;
        let mute = server
            .mock("POST", "/updateNotifySettings")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "peer": 100,
                "mute_until": 2_147_483_647
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        let mut session = connect(&server).await;
        assert_eq!(session.join_by_invite("hashX").await, JoinOutcome::Joined);
        session
            .update_notify_settings("100", NotifySettings::MUTED_FOREVER)
            .await
            .unwrap();
        join.assert_async().await;
        mute.assert_async().await;
    }

    #[tokio::test]
    async fn already_participant_reply_maps_to_already_member() {
        let mut server = mockito::Server::new_async().await;
        let _connect = ok_mock(&mut server, "/connect").await;
        let _join = server
            .mock("POST", "/importChatInvite")
            .with_status(400)
            .with_body(
                r#"{"ok":false,"error_code":400,"description":"USER_ALREADY_PARTICIPANT"}"#,
            )
            .create_async()
            .await;

        let mut session = connect(&server).await;
        assert_eq!(
            session.join_by_invite("hashX").await,
            JoinOutcome::AlreadyMember
        );
    }

    #[tokio::test]
    async fn non_numeric_channel_id_rejected_locally() {
        let mut server = mockito::Server::new_async().await;
        let _connect = ok_mock(&mut server, "/connect").await;

        let mut session = connect(&server).await;
        let err = session
            .update_notify_settings("not-a-number", NotifySettings::DEFAULT_DELIVERY)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[tokio::test]
    async fn disconnect_only_once() {
        let mut server = mockito::Server::new_async().await;
        let _connect = ok_mock(&mut server, "/connect").await;
        let disconnect = server
            .mock("POST", "/disconnect")
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .expect(1)
            .create_async()
            .await;

        let mut session = connect(&server).await;
        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();
        disconnect.assert_async().await;
    }
}
