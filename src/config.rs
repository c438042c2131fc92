use std::{fmt, str::FromStr, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    Error, Result, ACCESS_TOKEN_PATH, AUTHORIZATION_URL, LOOKUP_API_PATH, REQUEST_TOKEN_PATH,
    SERVER, UPDATE_API_PATH, USER_API_PATH,
};

/// Response body format, chosen by the suffix of the API path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Xml,
    Json,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            other => Err(Error::Configuration(format!("unknown format {}", other))),
        }
    }
}

/// Where the service lives. Paths are appended to `server`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub server: String,
    pub request_token_path: String,
    pub access_token_path: String,
    pub authorization_url: String,
    pub lookup_path: String,
    pub update_path: String,
    pub user_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            server: SERVER.to_string(),
            request_token_path: REQUEST_TOKEN_PATH.to_string(),
            access_token_path: ACCESS_TOKEN_PATH.to_string(),
            authorization_url: AUTHORIZATION_URL.to_string(),
            lookup_path: LOOKUP_API_PATH.to_string(),
            update_path: UPDATE_API_PATH.to_string(),
            user_path: USER_API_PATH.to_string(),
        }
    }
}

impl Endpoints {
    /// Same paths, different server. Handy for staging hosts and tests.
    pub fn with_server<T: Into<String>>(server: T) -> Self {
        Endpoints {
            server: server.into(),
            ..Default::default()
        }
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.server.trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| Error::Configuration(format!("invalid endpoint {}: {}", joined, e)))
    }

    /// An API path with its format suffix, e.g. `/api/0.1/user.json`.
    pub fn api_url(&self, path: &str, format: Format) -> Result<Url> {
        self.url(&format!("{}.{}", path, format.extension()))
    }

    /// The page the user visits to approve `request_token`.
    pub fn authorization_url(&self, request_token: &str) -> Result<String> {
        Url::parse_with_params(&self.authorization_url, &[("oauth_token", request_token)])
            .map(|url| url.to_string())
            .map_err(|e| {
                Error::Configuration(format!(
                    "invalid authorization url {}: {}",
                    self.authorization_url, e
                ))
            })
    }
}

/// Construction-time options of a [`Client`](crate::Client).
///
/// Can be built in code or deserialized (e.g. from a config file).
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub format: Format,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    /// Log raw bodies and allow interactive authorization.
    pub debug: bool,
    /// `oauth_callback` sent with the request token call.
    pub callback: Option<String>,
    pub endpoints: Endpoints,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        ClientConfig {
            consumer_key: Some(consumer_key.into()),
            consumer_secret: Some(consumer_secret.into()),
            ..Default::default()
        }
    }

    pub fn format(self, format: Format) -> Self {
        ClientConfig { format, ..self }
    }

    /// Pre-seed an already authorized access token.
    pub fn access_token<TToken, TSecret>(self, token: TToken, secret: TSecret) -> Self
    where
        TToken: Into<String>,
        TSecret: Into<String>,
    {
        ClientConfig {
            access_token: Some(token.into()),
            access_token_secret: Some(secret.into()),
            ..self
        }
    }

    pub fn debug(self, debug: bool) -> Self {
        ClientConfig { debug, ..self }
    }

    pub fn callback<T: Into<String>>(self, callback: T) -> Self {
        ClientConfig {
            callback: Some(callback.into()),
            ..self
        }
    }

    pub fn endpoints(self, endpoints: Endpoints) -> Self {
        ClientConfig { endpoints, ..self }
    }

    /// Sub-millisecond parts round up, so a non-zero timeout never becomes
    /// zero.
    pub fn timeout(self, timeout: Duration) -> Self {
        let millis = (timeout.as_nanos() + 999_999) / 1_000_000;
        ClientConfig {
            timeout_ms: Some(u64::try_from(millis).unwrap_or(u64::MAX)),
            ..self
        }
    }

    pub(crate) fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &redacted(&self.consumer_secret))
            .field("format", &self.format)
            .field("access_token", &self.access_token)
            .field("access_token_secret", &redacted(&self.access_token_secret))
            .field("debug", &self.debug)
            .field("callback", &self.callback)
            .field("endpoints", &self.endpoints)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_xml() {
        assert_eq!(ClientConfig::default().format, Format::Xml);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn api_urls_carry_format_suffix() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.api_url(&endpoints.user_path, Format::Json).unwrap().as_str(),
            "https://fireeagle.yahooapis.com/api/0.1/user.json"
        );
        assert_eq!(
            endpoints.api_url(&endpoints.lookup_path, Format::Xml).unwrap().as_str(),
            "https://fireeagle.yahooapis.com/api/0.1/lookup.xml"
        );
    }

    #[test]
    fn server_override_keeps_paths() {
        let endpoints = Endpoints::with_server("http://127.0.0.1:8080/");
        assert_eq!(
            endpoints.url(&endpoints.request_token_path).unwrap().as_str(),
            "http://127.0.0.1:8080/oauth/request_token"
        );
        assert!(Endpoints::with_server("not a url").url("/x").is_err());
    }

    #[test]
    fn authorization_url_appends_token() {
        assert_eq!(
            Endpoints::default().authorization_url("AAA").unwrap(),
            "https://fireeagle.yahoo.net/oauth/authorize?oauth_token=AAA"
        );
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"consumer_key":"k","consumer_secret":"s","format":"json","timeout_ms":1500}"#,
        )
        .unwrap();
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.timeout_ms, Some(1500));
        assert_eq!(config.timeout_duration(), Some(Duration::from_millis(1500)));
        assert_eq!(config.endpoints, Endpoints::default());
        assert!(!config.debug);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = ClientConfig::new("key", "consumer-secret").access_token("tok", "tok-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("consumer-secret"));
        assert!(!printed.contains("tok-secret"));
    }

    #[test]
    fn timeout_keeps_sub_second_precision() {
        let config = ClientConfig::new("k", "s").timeout(Duration::from_millis(500));
        assert_eq!(config.timeout_ms, Some(500));

        let config = ClientConfig::new("k", "s").timeout(Duration::from_micros(10));
        assert_eq!(config.timeout_ms, Some(1));

        let config = ClientConfig::new("k", "s").timeout(Duration::from_secs(2));
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(2)));
        assert_eq!(ClientConfig::default().timeout_duration(), None);
    }
}
