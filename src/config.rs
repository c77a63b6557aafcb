use crate::error::Error;
use std::time::Duration;

/// The Trimble Connect API root for the US region
pub const DEFAULT_API_BASE: &str = "https://app.connect.trimble.com/tc/api/2.0/";
/// How long a single request may take before it is abandoned
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const API_BASE_VAR: &str = "TRIMBLE_CONNECT_API_BASE";
const TIMEOUT_VAR: &str = "TRIMBLE_CONNECT_TIMEOUT_SECS";

/// Where requests are sent and how long we wait for them
#[derive(Clone, Debug)]
pub struct Config {
    api_base: url::Url,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: url::Url::parse(DEFAULT_API_BASE).expect("the default API base is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Creates a config for a different API root, eg. another region or a
    /// local mock.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, Error> {
        let api_base = url::Url::parse(api_base)?;

        if api_base.cannot_be_a_base() {
            return Err(Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self { api_base, timeout })
    }

    /// Builds a config from the environment, falling back to the defaults for
    /// anything that isn't set.
    ///
    /// * `TRIMBLE_CONNECT_API_BASE` - the API root
    /// * `TRIMBLE_CONNECT_TIMEOUT_SECS` - the request timeout in whole seconds
    pub fn from_env() -> Result<Self, Error> {
        let timeout = match std::env::var_os(TIMEOUT_VAR) {
            Some(secs) => {
                let secs = secs.to_string_lossy();
                let secs: u64 = secs.trim().parse().map_err(|e| Error::InvalidConfig {
                    var: TIMEOUT_VAR,
                    reason: format!("{}", e),
                })?;

                if secs == 0 {
                    return Err(Error::InvalidConfig {
                        var: TIMEOUT_VAR,
                        reason: "the timeout must be at least 1 second".to_owned(),
                    });
                }

                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        match std::env::var_os(API_BASE_VAR) {
            Some(base) => Self::new(&base.to_string_lossy(), timeout).map_err(|e| {
                Error::InvalidConfig {
                    var: API_BASE_VAR,
                    reason: e.to_string(),
                }
            }),
            None => Ok(Self {
                timeout,
                ..Self::default()
            }),
        }
    }

    #[inline]
    pub fn api_base(&self) -> &url::Url {
        &self.api_base
    }

    /// Resolves API path segments against the API root, each segment is
    /// percent encoded so ids can't escape their position in the path
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<url::Url, Error> {
        let mut url = self.api_base.clone();

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(segments);
        }

        Ok(url)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_endpoint() {
        let cfg = Config::default();

        assert_eq!(
            cfg.endpoint(&["projects"]).unwrap().as_str(),
            "https://app.connect.trimble.com/tc/api/2.0/projects"
        );
        assert_eq!(cfg.timeout, Duration::from_secs(15));
    }

    #[test]
    fn segments_are_encoded() {
        let cfg = Config::new("http://localhost:8080/api", DEFAULT_TIMEOUT).unwrap();

        assert_eq!(
            cfg.endpoint(&["projects", "a/b c"]).unwrap().as_str(),
            "http://localhost:8080/api/projects/a%2Fb%20c"
        );
    }
}
