use std::{collections::HashMap, str::FromStr};

use serde::Deserialize;

use crate::{Error, Result, Token, TokenReaderError, TokenReaderResult, TransportResponse};

const OAUTH_TOKEN_KEY: &str = "oauth_token";

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Represents response of token acquisition.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Token {
        Token::new(self.oauth_token, self.oauth_token_secret)
    }
}

impl FromStr for TokenResponse {
    type Err = TokenReaderError;

    fn from_str(s: &str) -> TokenReaderResult<Self> {
        read_oauth_token(s)
    }
}

/// Turn the reply of a token endpoint into a [`Token`].
///
/// A non-2xx reply is the service refusing the exchange, e.g. a request
/// token that was already used.
pub(crate) fn read_token_response(response: &TransportResponse) -> Result<Token> {
    if !response.is_success() {
        return Err(Error::Service(response.failure_text()));
    }
    Ok(response.body.trim().parse::<TokenResponse>()?.into_token())
}

fn read_oauth_token(text: &str) -> TokenReaderResult<TokenResponse> {
    let mut destructured = url::form_urlencoded::parse(text.as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>();
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}
