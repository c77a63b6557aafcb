//! A (very) simple client for the [Trimble Connect](https://connect.trimble.com)
//! project API, authenticated with an `OAuth2` bearer token that someone else
//! has already acquired.
//!
//! Every call is split into building an [`http::Request`] and
//! parsing an [`http::Response`], so you can send them with the client of your
//! choice. [`ConnectClient`] wires the two halves together over a
//! [`Transport`], and with the `blocking` feature a reqwest based transport is
//! provided.

#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

mod client;
mod config;
mod error;
mod files;
mod projects;
mod response;
mod token;
pub mod viewer;

pub use client::{ConnectClient, Transport};
pub use config::{Config, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
pub use error::{Error, ErrorKind, TransportError};
pub use files::{FileWalk, FolderItem, ItemKind, ProjectFile, WalkStep};
pub use projects::{render_table, Project, ProjectRow, ProjectsClient};
pub use token::{AccessToken, TokenSource};

#[cfg(feature = "blocking")]
pub use client::ReqwestTransport;

/// Fetches every project visible to the token, using the default
/// configuration and reqwest's blocking client
#[cfg(feature = "blocking")]
pub fn fetch_projects(token: &AccessToken) -> Result<Vec<ProjectRow>, Error> {
    ConnectClient::new(Config::default(), ReqwestTransport::new()?).fetch_projects(token)
}
