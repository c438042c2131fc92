//! The three-legged handshake: request token, user approval, access token.

use http::Method;

use crate::secrets::CredentialStore;
use crate::token_reader::read_token_response;
use crate::{Approval, Authorizer, Client, Error, ParamMap, Result, Secrets, Token, Transport};

/// Where a client stands in the handshake.
///
/// A handshake in progress reports `RequestTokenObtained` even when an older
/// access token is still in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    RequestTokenObtained,
    AccessTokenObtained,
}

impl<T> Client<T>
where
    T: Transport,
{
    pub async fn token_state(&self) -> TokenState {
        let store = self.store.lock().await;
        if store.pending_request_token().is_some() {
            TokenState::RequestTokenObtained
        } else if store.access_token().is_some() {
            TokenState::AccessTokenObtained
        } else {
            TokenState::NoToken
        }
    }

    /// Obtain a request token and return the URL the user has to visit to
    /// approve it.
    pub async fn request_authorization_url(&self) -> Result<String> {
        let mut store = self.store.lock().await;
        self.obtain_request_token(&mut store).await
    }

    /// Exchange the approved request token for an access token.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no request token is pending, i.e.
    /// [`Client::request_authorization_url`] was not called first or the
    /// token was already exchanged.
    pub async fn convert_to_access_token(&self, verifier: Option<&str>) -> Result<Token> {
        let mut store = self.store.lock().await;
        self.exchange_request_token(&mut store, verifier).await
    }

    pub(crate) async fn obtain_request_token(&self, store: &mut CredentialStore) -> Result<String> {
        let url = self.endpoints.url(&self.endpoints.request_token_path)?;
        let parameters = self.oauth_parameters.clone().callback(self.callback.clone());
        let request = self.build_request(
            Method::GET,
            url,
            ParamMap::new(),
            &Secrets::new(store.consumer()),
            parameters,
        )?;

        let response = self.transport.send(request).await?;
        let token = read_token_response(&response)?;
        let authorization_url = self.endpoints.authorization_url(token.value())?;
        tracing::info!("obtained request token");
        store.set_pending_request_token(token);
        Ok(authorization_url)
    }

    /// The pending token stays in place when the exchange fails, so the
    /// caller may retry; it is cleared once an access token is stored.
    pub(crate) async fn exchange_request_token(
        &self,
        store: &mut CredentialStore,
        verifier: Option<&str>,
    ) -> Result<Token> {
        let request_token = store.pending_request_token().cloned().ok_or_else(|| {
            Error::Configuration(
                "obtain a request token and have the user authorize it first".to_string(),
            )
        })?;
        let url = self.endpoints.url(&self.endpoints.access_token_path)?;
        let mut parameters = self.oauth_parameters.clone();
        if let Some(verifier) = verifier {
            parameters = parameters.verifier(verifier.to_string());
        }
        let request = self.build_request(
            Method::GET,
            url,
            ParamMap::new(),
            &Secrets::new(store.consumer()).token(&request_token),
            parameters,
        )?;

        let response = self.transport.send(request).await?;
        let access_token = read_token_response(&response)?;
        tracing::info!("exchanged request token for access token");
        store.set_access_token(access_token.clone());
        Ok(access_token)
    }

    pub(crate) async fn authorize_interactively(
        &self,
        store: &mut CredentialStore,
        authorizer: &dyn Authorizer,
    ) -> Result<()> {
        let url = self.obtain_request_token(store).await?;
        match authorizer.authorize(&url).await? {
            Approval::Granted { verifier } => {
                self.exchange_request_token(store, verifier.as_deref())
                    .await?;
                Ok(())
            }
            Approval::Denied => {
                store.clear_pending_request_token();
                Err(Error::AuthorizationRequired(
                    "user declined to authorize the request token".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::{ClientConfig, OAuthParameters};

    const REQUEST_TOKEN_BODY: &str = "oauth_token=req&oauth_token_secret=req-secret&oauth_callback_confirmed=true";
    const ACCESS_TOKEN_BODY: &str = "oauth_token=acc&oauth_token_secret=acc-secret";

    #[derive(Clone)]
    struct FakeAuthorizer {
        approval: Approval,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl FakeAuthorizer {
        fn new(approval: Approval) -> Self {
            FakeAuthorizer {
                approval,
                seen: Default::default(),
            }
        }
    }

    #[async_trait]
    impl Authorizer for FakeAuthorizer {
        async fn authorize(&self, url: &str) -> Result<Approval> {
            self.seen.lock().unwrap().push(url.to_string());
            Ok(self.approval.clone())
        }
    }

    fn client(config: ClientConfig, transport: &MockTransport) -> Client<MockTransport> {
        Client::with_transport(config, transport.clone())
            .unwrap()
            .with_oauth_parameters(OAuthParameters::new().nonce("n").timestamp(1u64))
    }

    fn consumer_only() -> ClientConfig {
        ClientConfig::new("consumer-key", "consumer-secret")
    }

    #[tokio::test]
    async fn request_token_yields_authorization_url() {
        let transport = MockTransport::new().reply(200, REQUEST_TOKEN_BODY);
        let client = client(consumer_only(), &transport);
        assert_eq!(client.token_state().await, TokenState::NoToken);

        let url = client.request_authorization_url().await.unwrap();
        assert_eq!(url, "https://fireeagle.yahoo.net/oauth/authorize?oauth_token=req");
        assert_eq!(client.token_state().await, TokenState::RequestTokenObtained);

        let sent = transport.sent();
        assert_eq!(sent[0].url().path(), "/oauth/request_token");
        assert_eq!(sent[0].oauth().get("oauth_token"), None);
        assert_eq!(sent[0].oauth().get("oauth_callback"), Some("oob"));
    }

    #[tokio::test]
    async fn exchange_without_request_token_is_rejected() {
        let transport = MockTransport::new();
        let client = client(consumer_only(), &transport);

        assert!(matches!(
            client.convert_to_access_token(None).await,
            Err(Error::Configuration(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn full_handshake_stores_access_token() {
        let transport = MockTransport::new()
            .reply(200, REQUEST_TOKEN_BODY)
            .reply(200, ACCESS_TOKEN_BODY)
            .reply(200, r#"<rsp stat="ok"/>"#);
        let client = client(consumer_only(), &transport);

        client.request_authorization_url().await.unwrap();
        let token = client.convert_to_access_token(Some("v1")).await.unwrap();
        assert_eq!(token, Token::new("acc", "acc-secret"));
        assert_eq!(client.access_token().await, Some(token));
        assert_eq!(client.token_state().await, TokenState::AccessTokenObtained);

        client.user().await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[1].url().path(), "/oauth/access_token");
        assert_eq!(sent[1].oauth().get("oauth_token"), Some("req"));
        assert_eq!(sent[1].oauth().get("oauth_verifier"), Some("v1"));
        assert_eq!(sent[2].oauth().get("oauth_token"), Some("acc"));

        // the request token is spent
        assert!(matches!(
            client.convert_to_access_token(None).await,
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn rejected_exchange_is_a_service_error() {
        let transport = MockTransport::new()
            .reply(200, REQUEST_TOKEN_BODY)
            .reply(401, "oauth_problem=token_used");
        let client = client(consumer_only(), &transport);

        client.request_authorization_url().await.unwrap();
        match client.convert_to_access_token(None).await {
            Err(Error::Service(message)) => assert_eq!(message, "oauth_problem=token_used"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(client.access_token().await, None);
        assert_eq!(client.token_state().await, TokenState::RequestTokenObtained);
    }

    #[tokio::test]
    async fn interactive_mode_runs_handshake_before_call() {
        let transport = MockTransport::new()
            .reply(200, REQUEST_TOKEN_BODY)
            .reply(200, ACCESS_TOKEN_BODY)
            .reply(200, r#"{"stat":"ok","user":{}}"#);
        let authorizer = FakeAuthorizer::new(Approval::Granted {
            verifier: Some("123456".to_string()),
        });
        let client = client(
            consumer_only().debug(true).format(crate::Format::Json),
            &transport,
        )
        .with_authorizer(authorizer.clone());

        client.user().await.unwrap();

        assert_eq!(
            *authorizer.seen.lock().unwrap(),
            vec!["https://fireeagle.yahoo.net/oauth/authorize?oauth_token=req".to_string()]
        );
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].oauth().get("oauth_verifier"), Some("123456"));
        assert_eq!(sent[2].url().path(), "/api/0.1/user.json");
        assert_eq!(client.token_state().await, TokenState::AccessTokenObtained);
    }

    #[tokio::test]
    async fn declined_authorization_stops_the_call() {
        let transport = MockTransport::new().reply(200, REQUEST_TOKEN_BODY);
        let client = client(consumer_only().debug(true), &transport)
            .with_authorizer(FakeAuthorizer::new(Approval::Denied));

        assert!(matches!(
            client.user().await,
            Err(Error::AuthorizationRequired(_))
        ));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(client.token_state().await, TokenState::NoToken);
    }

    #[tokio::test]
    async fn authorizer_is_ignored_outside_debug_mode() {
        let transport = MockTransport::new();
        let client = client(consumer_only(), &transport)
            .with_authorizer(FakeAuthorizer::new(Approval::Granted { verifier: None }));

        assert!(matches!(
            client.update(&[("q", "Soho")]).await,
            Err(Error::AuthorizationRequired(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_exchanges_spend_the_request_token_once() {
        let transport = MockTransport::new()
            .reply(200, REQUEST_TOKEN_BODY)
            .reply(200, ACCESS_TOKEN_BODY)
            .reply(200, ACCESS_TOKEN_BODY);
        let client = Arc::new(client(consumer_only(), &transport));
        client.request_authorization_url().await.unwrap();

        let exchanges: Vec<_> = (0..2)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.convert_to_access_token(None).await })
            })
            .collect();
        let mut results = Vec::new();
        for exchange in exchanges {
            results.push(exchange.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(Error::Configuration(_))))
                .count(),
            1
        );
        let exchanged: Vec<_> = transport
            .sent()
            .into_iter()
            .filter(|request| request.url().path() == "/oauth/access_token")
            .collect();
        assert_eq!(exchanged.len(), 1);
        assert_eq!(client.access_token().await, Some(Token::new("acc", "acc-secret")));
        assert_eq!(client.token_state().await, TokenState::AccessTokenObtained);
    }
}
