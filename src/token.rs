use crate::error::Error;
use std::fmt;

/// An opaque bearer token, as handed out by an `OAuth2` integration.
///
/// * It is short lived, and its lifecycle is owned entirely by the caller.
/// * It is never inspected, cached, or refreshed by this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a bearer token. Fails if the token is empty since it could never
    /// authenticate a request.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let token = token.into();

        if token.is_empty() {
            return Err(Error::InvalidToken);
        }

        Ok(Self(token))
    }

    /// The raw token
    #[inline]
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The first 20 characters of the token, enough to tell tokens apart
    /// without revealing them
    pub fn preview(&self) -> String {
        let mut preview: String = self.0.chars().take(20).collect();
        preview.push_str("...");
        preview
    }

    /// The value for an `Authorization` header
    pub fn header_value(&self) -> Result<http::header::HeaderValue, Error> {
        let mut hv = http::header::HeaderValue::from_str(&format!("Bearer {}", self.0))
            .map_err(|e| Error::from(http::Error::from(e)))?;
        hv.set_sensitive(true);
        Ok(hv)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken").finish_non_exhaustive()
    }
}

impl std::str::FromStr for AccessToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The seam to whatever `OAuth2` integration actually owns the token, eg. a
/// platform managed credential broker. Implementations are free to cache or
/// refresh, this crate only ever asks for the current token.
pub trait TokenSource {
    fn access_token(&self) -> Result<AccessToken, Error>;
}

impl TokenSource for AccessToken {
    #[inline]
    fn access_token(&self) -> Result<AccessToken, Error> {
        Ok(self.clone())
    }
}

impl<F> TokenSource for F
where
    F: Fn() -> Result<AccessToken, Error>,
{
    #[inline]
    fn access_token(&self) -> Result<AccessToken, Error> {
        (self)()
    }
}
