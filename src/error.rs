use std::{error::Error as Err, fmt};

#[derive(Debug)]
pub enum Error {
    /// The access token handed to us was empty
    InvalidToken,
    /// An error occurred trying to create an HTTP request
    Http(http::Error),
    /// A request URL could not be built from the configured API base
    Url(url::ParseError),
    /// The API rejected the token, it is invalid, expired, or lacks the
    /// required scope. Re-authenticating may fix this.
    Authentication {
        status: http::StatusCode,
        /// The API's own description of the failure, if the body happened to
        /// contain one
        message: Option<String>,
    },
    /// The request did not complete, retrying later may succeed
    Transport(TransportError),
    /// The response body did not match the shape we expect from the API
    ResponseFormat(serde_json::Error),
    /// The project details did not include a root folder, so its files can't
    /// be listed
    MissingRootFolder { project_id: String },
    /// A folder listing was supplied to a [`FileWalk`](crate::FileWalk) that
    /// was not waiting for one
    WalkOutOfSync,
    /// The external token source failed to provide a token
    TokenSource(Box<dyn Err + Send + Sync>),
    /// An environment variable used for configuration has an invalid value
    InvalidConfig { var: &'static str, reason: String },
}

/// The broad category of an [`Error`], useful for deciding how to react to it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Acquire a new token and try again
    Authentication,
    /// Try again later
    Transport,
    /// The API contract changed, retrying won't help
    ResponseFormat,
    /// The crate was used incorrectly or misconfigured
    Usage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } | Self::TokenSource(_) => ErrorKind::Authentication,
            Self::Transport(_) => ErrorKind::Transport,
            Self::ResponseFormat(_) | Self::MissingRootFolder { .. } => ErrorKind::ResponseFormat,
            Self::InvalidToken
            | Self::Http(_)
            | Self::Url(_)
            | Self::WalkOutOfSync
            | Self::InvalidConfig { .. } => ErrorKind::Usage,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #![allow(clippy::enum_glob_use)]
        use Error::*;

        match self {
            InvalidToken => f.write_str("The access token is empty"),
            Http(err) => write!(f, "{}", err),
            Url(err) => write!(f, "{}", err),
            Authentication { status, message } => {
                write!(f, "Authentication failed: {}", status)?;
                if let Some(msg) = message {
                    write!(f, " ({})", msg)?;
                }
                Ok(())
            }
            Transport(err) => write!(f, "{}", err),
            ResponseFormat(err) => write!(f, "Unexpected response body: {}", err),
            MissingRootFolder { project_id } => {
                write!(f, "Project '{}' has no root folder", project_id)
            }
            WalkOutOfSync => f.write_str("Received a folder listing that was never requested"),
            TokenSource(err) => write!(f, "Unable to acquire an access token: {}", err),
            InvalidConfig { var, reason } => write!(f, "Invalid value for {}: {}", var, reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn Err + 'static)> {
        use Error::{Http, ResponseFormat, TokenSource, Transport, Url};

        match self {
            Http(err) => Some(err as &dyn Err),
            Url(err) => Some(err as &dyn Err),
            Transport(err) => Some(err as &dyn Err),
            ResponseFormat(err) => Some(err as &dyn Err),
            TokenSource(err) => Some(err.as_ref() as &dyn Err),
            _ => None,
        }
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::Http(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Url(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ResponseFormat(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

/// Failures to get a usable response from the API
#[derive(Debug)]
pub enum TransportError {
    /// The request did not complete within the configured timeout
    Timeout,
    /// The network layer failed before a response was received
    Connection(Box<dyn Err + Send + Sync>),
    /// The API answered with a non-success status that isn't an
    /// authentication failure, eg. the service is unavailable
    Status(http::StatusCode),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("The request timed out"),
            Self::Connection(err) => write!(f, "Connection failed: {}", err),
            Self::Status(sc) => write!(f, "HTTP error status: {}", sc),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn Err + 'static)> {
        match self {
            Self::Connection(err) => Some(err.as_ref() as &dyn Err),
            _ => None,
        }
    }
}

/// The error body Trimble Connect sends back, when it sends one
#[derive(serde::Deserialize, Debug)]
pub(crate) struct ApiError {
    #[serde(alias = "errorcode")]
    pub(crate) error_code: Option<String>,
    pub(crate) message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error_code, &self.message) {
            (Some(code), Some(msg)) => write!(f, "{}: {}", code, msg),
            (Some(code), None) => f.write_str(code),
            (None, Some(msg)) => f.write_str(msg),
            (None, None) => Ok(()),
        }
    }
}

/// Classifies a non-success response. The body is only inspected as a best
/// effort, error bodies aren't guaranteed to be JSON.
pub(crate) fn status_error(status: http::StatusCode, body: &[u8]) -> Error {
    if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
        let message = serde_json::from_slice::<ApiError>(body)
            .ok()
            .map(|ae| ae.to_string())
            .filter(|msg| !msg.is_empty());

        return Error::Authentication { status, message };
    }

    Error::Transport(TransportError::Status(status))
}

#[cfg(test)]
mod test {
    use super::*;
    use http::StatusCode;

    #[test]
    fn unauthorized_is_authentication() {
        let err = status_error(StatusCode::UNAUTHORIZED, b"not json at all");

        match err {
            Error::Authentication { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(message.is_none());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn forbidden_keeps_api_message() {
        let err = status_error(
            StatusCode::FORBIDDEN,
            br#"{"errorcode":"FORBIDDEN","message":"missing scope"}"#,
        );

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(
            err.to_string(),
            "Authentication failed: 403 Forbidden (FORBIDDEN: missing scope)"
        );
    }

    #[test]
    fn server_errors_are_transport() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, b"");

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(matches!(
            err,
            Error::Transport(TransportError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }
}
