use crate::{
    config::Config,
    error::{Error, TransportError},
    files::{FileWalk, ProjectFile, WalkStep},
    projects::{Project, ProjectRow, ProjectsClient},
    token::{AccessToken, TokenSource},
};
use std::time::Duration;

/// Sends a single request and waits, no longer than `timeout`, for the full
/// response. Non-success statuses are not errors at this level, they are
/// classified by the caller.
pub trait Transport {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
        timeout: Duration,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
        timeout: Duration,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        (**self).send(request, timeout)
    }
}

/// Drives the request/response halves over a [`Transport`], blocking the
/// calling thread until each call completes or times out.
///
/// Holds no mutable state, so a single client can be shared between threads,
/// each call carrying its own token.
#[derive(Debug)]
pub struct ConnectClient<T> {
    projects: ProjectsClient,
    transport: T,
}

impl<T> ConnectClient<T>
where
    T: Transport,
{
    pub fn new(config: Config, transport: T) -> Self {
        Self {
            projects: ProjectsClient::new(config),
            transport,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        self.projects.config()
    }

    fn send(&self, request: http::Request<Vec<u8>>) -> Result<http::Response<Vec<u8>>, Error> {
        let timeout = self.config().timeout;
        Ok(self.transport.send(request, timeout)?)
    }

    /// Fetches every project the token's user can see, as `(name, id)` rows in
    /// the order the API returned them
    pub fn fetch_projects(&self, token: &AccessToken) -> Result<Vec<ProjectRow>, Error> {
        let request = self.projects.projects_request(token)?;
        let response = self.send(request)?;
        self.projects.parse_project_rows(response)
    }

    /// Like [`ConnectClient::fetch_projects`], but asks the token source for
    /// the token first. A failing source is reported as is, nothing is retried.
    pub fn fetch_projects_with<S>(&self, source: &S) -> Result<Vec<ProjectRow>, Error>
    where
        S: TokenSource + ?Sized,
    {
        let token = source.access_token()?;
        self.fetch_projects(&token)
    }

    /// Fetches the details of a single project
    pub fn project(&self, token: &AccessToken, project_id: &str) -> Result<Project, Error> {
        let request = self.projects.project_request(token, project_id)?;
        let response = self.send(request)?;
        self.projects.parse_project_response(response)
    }

    /// Lists every file in the project, walking down from its root folder
    pub fn list_project_files(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<ProjectFile>, Error> {
        let project = self.project(token, project_id)?;
        let mut walk = FileWalk::new(self.config().clone(), &project)?;

        loop {
            match walk.step(token)? {
                WalkStep::Request { request, .. } => {
                    let response = self.send(request)?;
                    walk.parse_response(response)?;
                }
                WalkStep::Done(files) => {
                    tracing::debug!(project = project_id, count = files.len(), "listed files");
                    return Ok(files);
                }
            }
        }
    }
}

#[cfg(feature = "blocking")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "blocking")]
mod reqwest_transport {
    use super::*;

    /// A [`Transport`] on top of reqwest's blocking client
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestTransport {
        client: reqwest::blocking::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, Error> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(concat!("tame-connect/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| TransportError::Connection(Box::new(e)))?;

            Ok(Self { client })
        }

        /// Uses an existing client, eg. one configured with a proxy
        pub fn with_client(client: reqwest::blocking::Client) -> Self {
            Self { client }
        }
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(Box::new(err))
        }
    }

    impl Transport for ReqwestTransport {
        fn send(
            &self,
            request: http::Request<Vec<u8>>,
            timeout: Duration,
        ) -> Result<http::Response<Vec<u8>>, TransportError> {
            let (parts, body) = request.into_parts();
            let uri = parts.uri.to_string();

            // Build the full request from the headers and body that were
            // passed in, without modifying them
            let request = self
                .client
                .request(parts.method, &uri)
                .headers(parts.headers)
                .body(body)
                .timeout(timeout)
                .build()
                .map_err(classify)?;

            let response = self.client.execute(request).map_err(classify)?;

            let mut builder = http::Response::builder()
                .status(response.status())
                .version(response.version());

            if let Some(headers) = builder.headers_mut() {
                // http doesn't expose a way to just use an existing HeaderMap,
                // so we have to copy them
                headers.extend(
                    response
                        .headers()
                        .into_iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }

            let buffer = response.bytes().map_err(classify)?;

            builder
                .body(buffer.to_vec())
                .map_err(|e| TransportError::Connection(Box::new(e)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use http::StatusCode;
    use std::{collections::HashMap, sync::Mutex};

    /// Serves canned responses keyed by request path, and remembers what was
    /// asked of it
    #[derive(Default)]
    struct Canned {
        responses: HashMap<String, (StatusCode, &'static str)>,
        seen: Mutex<Vec<(String, Option<String>, Duration)>>,
    }

    impl Canned {
        fn with(mut self, path: &str, status: StatusCode, body: &'static str) -> Self {
            self.responses.insert(path.to_owned(), (status, body));
            self
        }
    }

    impl Transport for Canned {
        fn send(
            &self,
            request: http::Request<Vec<u8>>,
            timeout: Duration,
        ) -> Result<http::Response<Vec<u8>>, TransportError> {
            let path = request.uri().path().to_owned();
            let auth = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|hv| hv.to_str().ok())
                .map(String::from);

            self.seen.lock().unwrap().push((path.clone(), auth, timeout));

            let (status, body) = match self.responses.get(&path) {
                Some(canned) => *canned,
                None => return Err(TransportError::Timeout),
            };

            Ok(http::Response::builder()
                .status(status)
                .body(body.as_bytes().to_vec())
                .unwrap())
        }
    }

    fn token() -> AccessToken {
        AccessToken::new("tok").unwrap()
    }

    const PROJECTS: &str = "/tc/api/2.0/projects";

    #[test]
    fn fetches_rows() {
        let transport = Canned::default().with(
            PROJECTS,
            StatusCode::OK,
            r#"[{"name":"Bridge A","id":"p1"},{"id":"p2"}]"#,
        );
        let client = ConnectClient::new(Config::default(), &transport);

        let rows = client.fetch_projects(&token()).unwrap();

        assert_eq!(
            rows,
            vec![
                ProjectRow {
                    name: "Bridge A".to_owned(),
                    id: "p1".to_owned()
                },
                ProjectRow {
                    name: String::new(),
                    id: "p2".to_owned()
                },
            ]
        );

        let seen = transport.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(
                PROJECTS.to_owned(),
                Some("Bearer tok".to_owned()),
                Duration::from_secs(15)
            )]
        );
    }

    #[test]
    fn unauthorized() {
        let transport = Canned::default().with(PROJECTS, StatusCode::UNAUTHORIZED, "");
        let client = ConnectClient::new(Config::default(), transport);

        let err = client.fetch_projects(&token()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn timeouts_are_transport_errors() {
        let client = ConnectClient::new(Config::default(), Canned::default());

        let err = client.fetch_projects(&token()).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout)));
    }

    #[test]
    fn token_source_failures_surface() {
        let client = ConnectClient::new(Config::default(), Canned::default());
        let source = || -> Result<AccessToken, Error> {
            Err(Error::TokenSource("integration is not assigned".into()))
        };

        let err = client.fetch_projects_with(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(
            err.to_string(),
            "Unable to acquire an access token: integration is not assigned"
        );
    }

    #[test]
    fn lists_files() {
        let transport = Canned::default()
            .with(
                "/tc/api/2.0/projects/p1",
                StatusCode::OK,
                r#"{"id":"p1","name":"Bridge A","rootId":"root"}"#,
            )
            .with(
                "/tc/api/2.0/folders/root/items",
                StatusCode::OK,
                r#"[{"id":"d1","name":"Models","type":"FOLDER"},{"id":"f1","name":"a.ifc"}]"#,
            )
            .with(
                "/tc/api/2.0/folders/d1/items",
                StatusCode::OK,
                r#"[{"id":"f2","name":"b.ifc","type":"FILE"}]"#,
            );
        let client = ConnectClient::new(Config::default(), &transport);

        let files = client.list_project_files(&token(), "p1").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, vec!["Models/b.ifc", "a.ifc"]);
        assert_eq!(transport.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn files_need_a_root() {
        let transport = Canned::default().with(
            "/tc/api/2.0/projects/p1",
            StatusCode::OK,
            r#"{"id":"p1","name":"Bridge A"}"#,
        );
        let client = ConnectClient::new(Config::default(), transport);

        assert!(matches!(
            client.list_project_files(&token(), "p1"),
            Err(Error::MissingRootFolder { .. })
        ));
    }
}

#[cfg(all(test, feature = "blocking"))]
mod reqwest_test {
    use super::*;
    use std::net::TcpListener;

    fn client_for(addr: std::net::SocketAddr) -> ConnectClient<ReqwestTransport> {
        let config = Config::new(
            &format!("http://{}/tc/api/2.0", addr),
            Duration::from_millis(200),
        )
        .unwrap();

        ConnectClient::new(config, ReqwestTransport::new().unwrap())
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept the connection but never answer it
        std::thread::spawn(move || {
            let _held: Vec<_> = listener.incoming().take(1).collect();
            std::thread::sleep(Duration::from_secs(5));
        });

        let token = AccessToken::new("tok").unwrap();
        let err = client_for(addr).fetch_projects(&token).unwrap_err();

        assert!(
            matches!(err, Error::Transport(TransportError::Timeout)),
            "unexpected error {:?}",
            err
        );
    }

    #[test]
    fn closed_port_is_connection_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let token = AccessToken::new("tok").unwrap();
        let err = client_for(addr).fetch_projects(&token).unwrap_err();

        assert!(
            matches!(err, Error::Transport(TransportError::Connection(_))),
            "unexpected error {:?}",
            err
        );
    }
}
