use crate::{config::Config, error::Error, response, token::AccessToken};
use std::fmt::Write as _;

/// A Trimble Connect project, only the fields we use are kept
#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// The unique id of the project
    #[serde(default, deserialize_with = "response::string_or_null")]
    pub id: String,
    /// The display name, may be empty
    #[serde(default, deserialize_with = "response::string_or_null")]
    pub name: String,
    /// The id of the folder at the top of the project's file tree. Only
    /// present in the details of a single project.
    #[serde(default, rename = "rootId")]
    pub root_id: Option<String>,
}

/// A `(name, id)` pair, ready to be rendered as a row in a table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectRow {
    pub name: String,
    pub id: String,
}

impl ProjectRow {
    pub const HEADERS: [&'static str; 2] = ["Project Name", "ID"];
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            id: project.id.clone(),
        }
    }
}

impl From<Project> for ProjectRow {
    fn from(project: Project) -> Self {
        Self {
            name: project.name,
            id: project.id,
        }
    }
}

/// Renders rows as a two column, pipe separated table with a header
pub fn render_table(rows: &[ProjectRow]) -> String {
    let [name_header, id_header] = ProjectRow::HEADERS;

    let name_width = rows
        .iter()
        .map(|row| row.name.chars().count())
        .chain(std::iter::once(name_header.len()))
        .max()
        .unwrap_or_default();

    let mut table = String::new();
    let _ = writeln!(table, "{:<w$} | {}", name_header, id_header, w = name_width);
    let _ = writeln!(table, "{}-+-{}", "-".repeat(name_width), "-".repeat(id_header.len()));

    for row in rows {
        let _ = writeln!(table, "{:<w$} | {}", row.name, row.id, w = name_width);
    }

    table
}

/// Builds the requests for, and parses the responses of, the project
/// endpoints. Doesn't perform any I/O itself, so you can use whichever HTTP
/// client you like.
#[derive(Clone, Debug, Default)]
pub struct ProjectsClient {
    config: Config,
}

impl ProjectsClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The request for every project the token's user has access to
    pub fn projects_request(&self, token: &AccessToken) -> Result<http::Request<Vec<u8>>, Error> {
        let url = self.config.endpoint(&["projects"])?;
        get_request(url, token)
    }

    /// Parses the project list. The API doesn't paginate this endpoint, so
    /// this is the complete list, in the order the API returned it.
    pub fn parse_projects_response<S>(
        &self,
        response: http::Response<S>,
    ) -> Result<Vec<Project>, Error>
    where
        S: AsRef<[u8]>,
    {
        let body = response::success_body(response)?;
        let projects: Vec<Project> = response::object_array(body.as_ref())?;

        tracing::debug!(count = projects.len(), "received projects");
        Ok(projects)
    }

    /// Like [`ProjectsClient::parse_projects_response`], but maps the projects
    /// straight to display rows
    pub fn parse_project_rows<S>(
        &self,
        response: http::Response<S>,
    ) -> Result<Vec<ProjectRow>, Error>
    where
        S: AsRef<[u8]>,
    {
        Ok(self
            .parse_projects_response(response)?
            .into_iter()
            .map(ProjectRow::from)
            .collect())
    }

    /// The request for the details of a single project
    pub fn project_request(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<http::Request<Vec<u8>>, Error> {
        let url = self.config.endpoint(&["projects", project_id])?;
        get_request(url, token)
    }

    pub fn parse_project_response<S>(&self, response: http::Response<S>) -> Result<Project, Error>
    where
        S: AsRef<[u8]>,
    {
        let body = response::success_body(response)?;
        response::object(body.as_ref())
    }
}

/// Every call we make is an authenticated GET without a body
pub(crate) fn get_request(
    url: url::Url,
    token: &AccessToken,
) -> Result<http::Request<Vec<u8>>, Error> {
    tracing::debug!(uri = %url, "preparing request");

    let request = http::Request::builder()
        .method(http::Method::GET)
        .uri(url.as_str())
        .header(http::header::AUTHORIZATION, token.header_value()?)
        .header(http::header::ACCEPT, "application/json")
        .body(Vec::new())?;

    Ok(request)
}
