/*!
fireeagle: a Fire Eagle location API client, signed with OAuth 1.0a.

# Overview

This library talks to the Fire Eagle location service. Every call is signed
with OAuth 1.0a (HMAC-SHA1) through the [oauth1-request](https://crates.io/crates/oauth1-request)
crate and, by default, sent with [reqwest](https://crates.io/crates/reqwest).
Any other HTTP stack can be plugged in by implementing [`Transport`].

# How to use

## Basic usecase 1 - reading the user's location

```rust,no_run
use fireeagle::{Client, ClientConfig, Format};

# async fn run() -> fireeagle::Result<()> {
// prepare authorization info
let config = ClientConfig::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .format(Format::Json)
    .access_token("[ACCESS_TOKEN]", "[ACCESS_TOKEN_SECRET]");

let client = Client::new(config)?;
let location = client.user().await?;
println!("{:#?}", location.as_json());

// tell the service where the user is now
client.update(&[("lat", "51.5"), ("lon", "-0.12")]).await?;
# Ok(())
# }
```

## Basic usecase 2 - acquiring an access token

```rust,no_run
use std::io;
use fireeagle::{Client, ClientConfig};

# async fn run() -> fireeagle::Result<()> {
let client = Client::new(ClientConfig::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"))?;

// step 1: acquire a request token
let url = client.request_authorization_url().await?;

// step 2: let the user approve it
println!("please access to: {}", url);
println!("input verifier (or just press enter): ");
let mut user_input = String::new();
io::stdin().read_line(&mut user_input)?;
let verifier = user_input.trim();

// step 3: exchange it for an access token
let token = client
    .convert_to_access_token(Some(verifier).filter(|v| !v.is_empty()))
    .await?;
println!("your token is: {}", token.value());
# Ok(())
# }
```

Callers own persistence: store the token returned above and pass it back
through [`ClientConfig::access_token`] next time.

Without an access token, API calls fail with [`Error::AuthorizationRequired`].
Enabling [`ClientConfig::debug`] and injecting an [`Authorizer`] (for example
[`StdinAuthorizer`]) runs the handshake on demand instead.
*/
mod authorizer;
mod client;
mod config;
mod decoder;
mod error;
mod exchange;
pub mod params;
mod request;
mod secrets;
mod signer;
mod token_reader;
mod transport;

// exposed to external program
pub use authorizer::{Approval, Authorizer, StdinAuthorizer};
pub use client::Client;
pub use config::{ClientConfig, Endpoints, Format};
pub use decoder::{decode, Decoded, XmlElement};
pub use error::{
    BoxError, Error, Result, SignError, SignResult, TokenReaderError, TokenReaderResult,
};
pub use exchange::TokenState;
pub use params::{all_or_none, ParamMap};
pub use request::{RequestBuilder, SignedRequest};
pub use secrets::{Consumer, Secrets, SecretsProvider, Token};
pub use signer::{OAuthAuthorization, OAuthParameters, Signer};
pub use token_reader::TokenResponse;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";
/// Out-of-band callback: the user copies the verifier by hand.
pub const OOB_CALLBACK: &str = "oob";

/// Fire Eagle API server.
pub const SERVER: &str = "https://fireeagle.yahooapis.com";
pub const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
pub const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
/// Page where the user approves a request token.
pub const AUTHORIZATION_URL: &str = "https://fireeagle.yahoo.net/oauth/authorize";
pub const LOOKUP_API_PATH: &str = "/api/0.1/lookup";
pub const UPDATE_API_PATH: &str = "/api/0.1/update";
pub const USER_API_PATH: &str = "/api/0.1/user";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
