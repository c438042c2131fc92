use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

/// Opaque error raised by a [`Transport`](crate::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error : {0}")]
    Configuration(String),
    #[error("invalid parameters : {0}")]
    Validation(String),
    #[error("authorization required : {0}")]
    AuthorizationRequired(String),
    #[error("service returned an error : {0}")]
    Service(String),
    #[error("malformed response : {0}")]
    MalformedResponse(String),
    #[error("OAuth sign failed : {0}")]
    Signer(#[from] SignError),
    #[error("request failed : {0}")]
    Transport(#[source] BoxError),
    #[error("interactive authorization failed : {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary transport failure without interpreting it.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Transport(err.into())
    }

    /// The verbatim message of a [`Error::Service`] failure.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Error::Service(message) => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::transport(err)
    }
}

impl From<TokenReaderError> for Error {
    fn from(err: TokenReaderError) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}

#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("url {0} cannot be used as a signature base")]
    InvalidBaseUrl(String),
    #[error("generated authorization header is malformed: {0}")]
    MalformedAuthorization(String),
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}
