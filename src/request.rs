use http::Method;
use serde::Serialize;
use url::Url;

use crate::params::to_param_map;
use crate::{OAuthAuthorization, ParamMap, Result, SecretsProvider, Signer};

/// A fully signed request, ready for a [`Transport`](crate::Transport).
///
/// GET requests carry every parameter, the OAuth ones included, in the URL
/// query. Other methods send the form body and put the OAuth parameters in
/// the `Authorization` header.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    url: Url,
    authorization: Option<String>,
    body: Option<String>,
    oauth: OAuthAuthorization,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `Authorization` header value, absent for GET.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Form-encoded body, absent when nothing is posted.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The OAuth protocol parameters this request was signed with.
    pub fn oauth(&self) -> &OAuthAuthorization {
        &self.oauth
    }

    /// Every `(key, value)` the request transmits besides the OAuth header:
    /// decoded query pairs followed by decoded form pairs.
    pub fn parameters(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();
        if let Some(body) = self.body.as_deref() {
            pairs.extend(url::form_urlencoded::parse(body.as_bytes()).into_owned());
        }
        pairs
    }
}

pub struct RequestBuilder<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    method: Method,
    url: Url,
    signer: Signer<'a, TSecretsProvider>,
    query: ParamMap,
    form: ParamMap,
}

impl<'a, TSecretsProvider> RequestBuilder<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(method: Method, url: Url, signer: Signer<'a, TSecretsProvider>) -> Self {
        RequestBuilder {
            method,
            url,
            signer,
            query: ParamMap::new(),
            form: ParamMap::new(),
        }
    }

    /// Add parameters to the query string of the URL.
    ///
    /// Accepts anything `serde_urlencoded` can serialize: slices of pairs,
    /// maps or plain structs. Later values replace earlier ones for the same
    /// key.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Result<Self> {
        self.query.extend(to_param_map(query)?);
        Ok(self)
    }

    /// Add parameters to the form body.
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Result<Self> {
        self.form.extend(to_param_map(form)?);
        Ok(self)
    }

    /// Add already collected parameters, routed by method: the query for
    /// GET, the form body otherwise.
    pub fn parameters(mut self, params: ParamMap) -> Self {
        if self.method == Method::GET {
            self.query.extend(params);
        } else {
            self.form.extend(params);
        }
        self
    }

    /// Sign and assemble the request. No I/O happens here.
    pub fn build(self) -> Result<SignedRequest> {
        let signed_pairs = self
            .query
            .iter()
            .chain(self.form.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()));
        let oauth = self.signer.sign(&self.method, &self.url, signed_pairs)?;
        let oauth_in_query = self.method == Method::GET;

        let mut url = self.url;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
            if oauth_in_query {
                for (key, value) in oauth.oauth_pairs() {
                    pairs.append_pair(key, value);
                }
            }
        }
        // cleanup
        if let Some("") = url.query() {
            url.set_query(None);
        }

        let body = if self.form.is_empty() {
            None
        } else {
            Some(serde_urlencoded::to_string(&self.form).map_err(|e| {
                crate::Error::Validation(format!("cannot encode form body: {}", e))
            })?)
        };
        let authorization = if oauth_in_query {
            None
        } else {
            Some(oauth.header().to_string())
        };

        Ok(SignedRequest {
            method: self.method,
            url,
            authorization,
            body,
            oauth,
        })
    }
}
