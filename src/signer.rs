use std::borrow::Cow;
use std::collections::BTreeMap;

use http::Method;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{SecretsProvider, SignError, SignResult, OAUTH_KEY_PREFIX, REALM_KEY};

const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
const AUTHORIZATION_SCHEME: &str = "OAuth ";

// RFC 5849 section 3.6: everything but ALPHA, DIGIT, '-', '.', '_' and '~'
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn oauth_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Computes OAuth 1.0a HMAC-SHA1 signatures.
#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign a request.
    ///
    /// `url` may carry a query; its pairs are signed along with `parameters`.
    /// Request parameters whose key starts with `oauth_` are not signed.
    pub fn sign<'p, I>(
        &self,
        method: &Method,
        url: &Url,
        parameters: I,
    ) -> SignResult<OAuthAuthorization>
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        if url.cannot_be_a_base() {
            return Err(SignError::InvalidBaseUrl(url.to_string()));
        }
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_option_pair();
        let options = self.parameters.build_options(token);

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        // oauth1-request wants parameters in ascending order of their encoded
        // form, with the oauth_* block slotted in where its prefix sorts.
        let mut sorted: Vec<(String, String)> = url
            .query_pairs()
            .chain(
                parameters
                    .into_iter()
                    .map(|(k, v)| (Cow::from(k), Cow::from(v))),
            )
            .filter(|(k, _)| !k.starts_with(OAUTH_KEY_PREFIX))
            .map(|(k, v)| (oauth_encode(&k), oauth_encode(&v)))
            .collect();
        sorted.sort();
        let split = sorted.partition_point(|(k, _)| k.as_str() < OAUTH_KEY_PREFIX);
        let (before_oauth, after_oauth) = sorted.split_at(split);

        let mut signer = if *method == Method::POST {
            OAuthSigner::form_with_signature_method(
                HmacSha1,
                method.as_str(),
                base_url,
                consumer_secret,
                token_secret,
            )
        } else {
            OAuthSigner::with_signature_method(
                HmacSha1,
                method.as_str(),
                base_url,
                consumer_secret,
                token_secret,
            )
        };
        // keys go into the base string verbatim, values get encoded once more
        for (key, value) in before_oauth {
            signer.parameter_encoded(&oauth_encode(key), value);
        }
        let mut signer = signer.oauth_parameters(consumer_key, &options);
        for (key, value) in after_oauth {
            signer.parameter_encoded(&oauth_encode(key), value);
        }

        let header = signer.finish().authorization;
        let header = match self.parameters.realm {
            // OAuth oauth_...,realm="realm"
            Some(ref realm) => {
                format!("{},{}=\"{}\"", header, REALM_KEY, oauth_encode(realm))
            }
            None => header,
        };
        OAuthAuthorization::from_header(header)
    }
}

/// Optional OAuth protocol values.
///
/// Leaving `nonce` and `timestamp` unset makes every signature use a fresh
/// random nonce and the current clock; fixing them makes signing
/// deterministic.
#[derive(Debug, Clone)]
pub struct OAuthParameters<'a> {
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    realm: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl Default for OAuthParameters<'_> {
    fn default() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            realm: None,
            timestamp: None,
            verifier: None,
            version: true,
        }
    }
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_callback value
    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the realm value of the Authorization header
    pub fn realm<T>(self, realm: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            realm: Some(realm.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// Defaults to `true`, which sends `oauth_version="1.0"`.
    /// With `false` the parameter is left out entirely, which OAuth 1.0a
    /// also allows.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }

    /// Detach from any borrowed data.
    pub fn into_owned(self) -> OAuthParameters<'static> {
        OAuthParameters {
            callback: self.callback.map(|v| Cow::Owned(v.into_owned())),
            nonce: self.nonce.map(|v| Cow::Owned(v.into_owned())),
            realm: self.realm.map(|v| Cow::Owned(v.into_owned())),
            timestamp: self.timestamp,
            verifier: self.verifier.map(|v| Cow::Owned(v.into_owned())),
            version: self.version,
        }
    }

    fn build_options<'s>(&'s self, token: Option<&'s str>) -> Options<'s> {
        let mut opt = Options::new();

        // NOTE: items must be added by alphabetical order

        if let Some(ref callback) = self.callback {
            opt.callback(callback.as_ref());
        }
        if let Some(ref nonce) = self.nonce {
            opt.nonce(nonce.as_ref());
        }
        if let Some(timestamp) = self.timestamp {
            opt.timestamp(timestamp);
        }
        if let Some(token) = token {
            opt.token(token);
        }
        if let Some(ref verifier) = self.verifier {
            opt.verifier(verifier.as_ref());
        }
        opt.version(self.version);

        opt
    }
}

/// The outcome of signing: the ready `Authorization` header and the decoded
/// protocol parameters it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAuthorization {
    header: String,
    parameters: BTreeMap<String, String>,
}

impl OAuthAuthorization {
    fn from_header(header: String) -> SignResult<Self> {
        let content = header
            .strip_prefix(AUTHORIZATION_SCHEME)
            .ok_or_else(|| SignError::MalformedAuthorization(header.clone()))?;
        let mut parameters = BTreeMap::new();
        for item in content.split(',') {
            let mut pair = item.trim().splitn(2, '=');
            let key = pair.next().unwrap_or_default();
            let value = pair
                .next()
                .ok_or_else(|| SignError::MalformedAuthorization(header.clone()))?
                .trim_matches('"');
            let value = percent_decode_str(value)
                .decode_utf8()
                .map_err(|_| SignError::MalformedAuthorization(header.clone()))?;
            parameters.insert(key.to_string(), value.into_owned());
        }
        Ok(OAuthAuthorization { header, parameters })
    }

    /// Value for the `Authorization` HTTP header.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Every decoded parameter of the header, `realm` included.
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn signature(&self) -> Option<&str> {
        self.get(OAUTH_SIGNATURE_KEY)
    }

    /// The `oauth_*` pairs, suitable for transmission as query parameters.
    pub fn oauth_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .filter(|(k, _)| k.starts_with(OAUTH_KEY_PREFIX))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
