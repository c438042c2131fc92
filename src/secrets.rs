use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Provides the key material a [`Signer`](crate::Signer) needs.
pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);

    fn get_token_pair_option(&self) -> Option<(&str, &str)>;

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or_else(|| (None, None))
    }
}

/// The registered application identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    key: String,
    secret: String,
}

impl Consumer {
    /// Fails with [`Error::Configuration`] when either half is empty.
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret) -> Result<Self>
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        let key = key.into();
        let secret = secret.into();
        if key.is_empty() || secret.is_empty() {
            return Err(Error::Configuration(
                "OAuth consumer key and secret required".to_string(),
            ));
        }
        Ok(Consumer { key, secret })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A request token or an access token. Both share the same shape; the phase
/// of the handshake decides which one it is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    secret: String,
}

impl Token {
    pub fn new<TValue, TSecret>(value: TValue, secret: TSecret) -> Self
    where
        TValue: Into<String>,
        TSecret: Into<String>,
    {
        Token {
            value: value.into(),
            secret: secret.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &self.value)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Borrowed view over a consumer and, optionally, the token to sign with.
#[derive(Debug, Clone, Copy)]
pub struct Secrets<'a> {
    consumer: &'a Consumer,
    token: Option<&'a Token>,
}

impl<'a> Secrets<'a> {
    pub fn new(consumer: &'a Consumer) -> Self {
        Secrets {
            consumer,
            token: None,
        }
    }

    pub fn token(self, token: &'a Token) -> Self {
        Secrets {
            token: Some(token),
            ..self
        }
    }

    pub fn token_option(self, token: Option<&'a Token>) -> Self {
        Secrets { token, ..self }
    }
}

impl SecretsProvider for Secrets<'_> {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (self.consumer.key(), self.consumer.secret())
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        self.token.map(|t| (t.value(), t.secret()))
    }
}

/// Owns every credential of one client.
///
/// `pending_request_token` only lives between obtaining a request token and
/// exchanging it; tokens are always replaced wholesale.
#[derive(Debug)]
pub(crate) struct CredentialStore {
    consumer: Consumer,
    access_token: Option<Token>,
    pending_request_token: Option<Token>,
}

impl CredentialStore {
    pub(crate) fn new(consumer: Consumer, access_token: Option<Token>) -> Self {
        CredentialStore {
            consumer,
            access_token,
            pending_request_token: None,
        }
    }

    pub(crate) fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    pub(crate) fn access_token(&self) -> Option<&Token> {
        self.access_token.as_ref()
    }

    pub(crate) fn pending_request_token(&self) -> Option<&Token> {
        self.pending_request_token.as_ref()
    }

    pub(crate) fn set_pending_request_token(&mut self, token: Token) {
        self.pending_request_token = Some(token);
    }

    pub(crate) fn clear_pending_request_token(&mut self) {
        self.pending_request_token = None;
    }

    /// Stores a freshly exchanged access token and retires the request token.
    pub(crate) fn set_access_token(&mut self, token: Token) {
        self.access_token = Some(token);
        self.pending_request_token = None;
    }
}
