use std::fmt;

use http::Method;
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use crate::decoder::decode_response;
use crate::params::{filter_update_params, to_param_map, validate_update_params};
use crate::secrets::CredentialStore;
use crate::{
    Authorizer, ClientConfig, Consumer, Decoded, Endpoints, Error, Format, OAuthParameters,
    ParamMap, RequestBuilder, ReqwestTransport, Result, Secrets, SignedRequest, Signer, Token,
    Transport, OOB_CALLBACK,
};

/// Fire Eagle API client.
///
/// Holds the consumer credentials and the current token for one user. Token
/// transitions are serialized internally, so a client can be shared behind
/// an `Arc`.
pub struct Client<T = ReqwestTransport> {
    pub(crate) transport: T,
    pub(crate) endpoints: Endpoints,
    pub(crate) format: Format,
    pub(crate) debug: bool,
    pub(crate) callback: String,
    pub(crate) store: Mutex<CredentialStore>,
    pub(crate) authorizer: Option<Box<dyn Authorizer>>,
    pub(crate) oauth_parameters: OAuthParameters<'static>,
}

impl Client<ReqwestTransport> {
    /// Constructs a new `Client` talking over `reqwest`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] when the consumer key or secret
    /// is missing.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = match config.timeout_duration() {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        Client::with_transport(config, transport)
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Constructs a new `Client` with specifying the transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let consumer = match (config.consumer_key, config.consumer_secret) {
            (Some(key), Some(secret)) => Consumer::new(key, secret)?,
            _ => {
                return Err(Error::Configuration(
                    "OAuth consumer key and secret required".to_string(),
                ))
            }
        };
        let access_token = match (config.access_token, config.access_token_secret) {
            (Some(token), Some(secret)) => Some(Token::new(token, secret)),
            _ => None,
        };
        Ok(Client {
            transport,
            endpoints: config.endpoints,
            format: config.format,
            debug: config.debug,
            callback: config
                .callback
                .unwrap_or_else(|| OOB_CALLBACK.to_string()),
            store: Mutex::new(CredentialStore::new(consumer, access_token)),
            authorizer: None,
            oauth_parameters: OAuthParameters::new(),
        })
    }

    /// Use `authorizer` for the user approval step when the client is in
    /// debug mode and has no access token.
    pub fn with_authorizer<A>(self, authorizer: A) -> Self
    where
        A: Authorizer + 'static,
    {
        Client {
            authorizer: Some(Box::new(authorizer)),
            ..self
        }
    }

    /// Base OAuth parameters for every request, e.g. a fixed nonce and
    /// timestamp.
    pub fn with_oauth_parameters(self, parameters: OAuthParameters<'_>) -> Self {
        Client {
            oauth_parameters: parameters.into_owned(),
            ..self
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_json(&self) -> bool {
        self.format == Format::Json
    }

    pub fn is_xml(&self) -> bool {
        self.format == Format::Xml
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The current access token, for callers that persist it.
    pub async fn access_token(&self) -> Option<Token> {
        self.store.lock().await.access_token().cloned()
    }

    pub async fn set_access_token(&self, token: Token) {
        self.store.lock().await.set_access_token(token);
    }

    /// Look up places matching free-form hints (`q`, `lat`/`lon`, `woeid`,
    /// ...). Parameters are passed through as given.
    pub async fn lookup<P>(&self, params: &P) -> Result<Decoded>
    where
        P: Serialize + ?Sized,
    {
        let params = to_param_map(params)?;
        self.call(Method::GET, &self.endpoints.lookup_path, params)
            .await
    }

    /// Tell the service where the user is.
    ///
    /// Unrecognized keys are dropped. `lat`/`lon` must come together, as
    /// must `mnc`/`mcc`/`lac`/`cid`; otherwise this fails with
    /// [`Error::Validation`] before anything is sent.
    pub async fn update<P>(&self, params: &P) -> Result<Decoded>
    where
        P: Serialize + ?Sized,
    {
        let params = filter_update_params(to_param_map(params)?);
        validate_update_params(&params)?;
        self.call(Method::POST, &self.endpoints.update_path, params)
            .await
    }

    /// The user's current location.
    pub async fn user(&self) -> Result<Decoded> {
        self.call(Method::GET, &self.endpoints.user_path, ParamMap::new())
            .await
    }

    /// Alias of [`Client::user`].
    pub async fn location(&self) -> Result<Decoded> {
        self.user().await
    }

    async fn call(&self, method: Method, path: &str, params: ParamMap) -> Result<Decoded> {
        let url = self.endpoints.api_url(path, self.format)?;
        let request = {
            let mut store = self.store.lock().await;
            self.ensure_access_token(&mut store).await?;
            let token = store
                .access_token()
                .ok_or_else(|| Error::AuthorizationRequired("no access token".to_string()))?;
            let secrets = Secrets::new(store.consumer()).token(token);
            self.build_request(method, url, params, &secrets, self.oauth_parameters.clone())?
        };

        tracing::debug!(
            method = %request.method(),
            path = request.url().path(),
            "sending signed request"
        );
        let response = self.transport.send(request).await?;
        if self.debug {
            tracing::debug!(status = response.status, body = %response.body, "raw response");
        }
        decode_response(&response, self.format)
    }

    async fn ensure_access_token(&self, store: &mut CredentialStore) -> Result<()> {
        if store.access_token().is_some() {
            return Ok(());
        }
        match self.authorizer.as_deref() {
            Some(authorizer) if self.debug => {
                self.authorize_interactively(store, authorizer).await
            }
            _ => Err(Error::AuthorizationRequired(
                "OAuth access token required; authorize a request token first".to_string(),
            )),
        }
    }

    pub(crate) fn build_request(
        &self,
        method: Method,
        url: Url,
        params: ParamMap,
        secrets: &Secrets<'_>,
        parameters: OAuthParameters<'_>,
    ) -> Result<SignedRequest> {
        RequestBuilder::new(method, url, Signer::new(secrets, parameters))
            .parameters(params)
            .build()
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.endpoints)
            .field("format", &self.format)
            .field("debug", &self.debug)
            .field("authorizer", &self.authorizer.is_some())
            .finish()
    }
}
