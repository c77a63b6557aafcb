use crate::{
    config::Config,
    error::Error,
    projects::{get_request, Project},
    response,
    token::AccessToken,
};

/// One entry in a folder listing
#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct FolderItem {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "response::string_or_null")]
    pub name: String,
    /// The API isn't consistent about which of these it fills in
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    #[serde(rename = "entityType")]
    pub entity_type: Option<String>,
    /// Anything that isn't a non-negative whole number is dropped
    #[serde(default, deserialize_with = "response::lenient_u64")]
    pub size: Option<u64>,
    #[serde(rename = "modifiedAt")]
    pub modified_at: Option<String>,
    #[serde(rename = "modifiedOn")]
    pub modified_on: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    /// Anything that isn't explicitly a folder
    File,
}

impl FolderItem {
    pub fn kind(&self) -> ItemKind {
        let kind = self
            .item_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.entity_type.as_deref())
            .unwrap_or_default();

        if kind.eq_ignore_ascii_case("FOLDER") {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }
}

/// A file somewhere in a project's folder tree
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectFile {
    pub id: Option<String>,
    pub name: String,
    /// The names of every folder from the root down to the file, joined by
    /// `/`, eg. `Models/SampleBuilding.ifc`
    pub path: String,
    pub size: Option<u64>,
    pub modified_at: Option<String>,
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{}/{}", parent, name)
    }
}

struct Frame {
    path: String,
    items: std::vec::IntoIter<FolderItem>,
}

struct Pending {
    folder_id: String,
    path: String,
}

/// The next thing a [`FileWalk`] needs from you
#[derive(Debug)]
pub enum WalkStep {
    /// Send this request and hand the response to [`FileWalk::parse_response`]
    Request {
        request: http::Request<Vec<u8>>,
        /// The folder being listed
        folder_id: String,
    },
    /// Every folder has been listed
    Done(Vec<ProjectFile>),
}

/// Walks a project's folder tree depth first, one folder listing at a time.
///
/// Files are collected in the order they are encountered, so the contents of
/// a folder always come before the folder's later siblings.
pub struct FileWalk {
    config: Config,
    stack: Vec<Frame>,
    next_folder: Option<Pending>,
    awaiting: Option<Pending>,
    files: Vec<ProjectFile>,
}

impl FileWalk {
    /// Starts a walk at the root folder of the project
    pub fn new(config: Config, project: &Project) -> Result<Self, Error> {
        let root_id = project
            .root_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MissingRootFolder {
                project_id: project.id.clone(),
            })?;

        Ok(Self::from_folder(config, root_id))
    }

    /// Starts a walk at an arbitrary folder, paths are relative to it
    pub fn from_folder(config: Config, folder_id: impl Into<String>) -> Self {
        Self {
            config,
            stack: Vec::new(),
            next_folder: Some(Pending {
                folder_id: folder_id.into(),
                path: String::new(),
            }),
            awaiting: None,
            files: Vec::new(),
        }
    }

    /// Advances the walk until it either needs another folder listing, or is
    /// finished
    pub fn step(&mut self, token: &AccessToken) -> Result<WalkStep, Error> {
        if self.awaiting.is_some() {
            return Err(Error::WalkOutOfSync);
        }

        if self.next_folder.is_none() {
            self.next_folder = self.advance();
        }

        let pending = match self.next_folder.take() {
            Some(pending) => pending,
            None => return Ok(WalkStep::Done(std::mem::take(&mut self.files))),
        };

        let request = self
            .config
            .endpoint(&["folders", &pending.folder_id, "items"])
            .and_then(|url| get_request(url, token));

        let request = match request {
            Ok(request) => request,
            Err(e) => {
                self.next_folder = Some(pending);
                return Err(e);
            }
        };

        let folder_id = pending.folder_id.clone();
        self.awaiting = Some(pending);
        Ok(WalkStep::Request { request, folder_id })
    }

    /// Supplies the listing for the folder requested by the last
    /// [`WalkStep::Request`]. If the listing is unusable the folder stays
    /// unlisted, and the next [`FileWalk::step`] requests it again.
    pub fn parse_response<S>(&mut self, response: http::Response<S>) -> Result<(), Error>
    where
        S: AsRef<[u8]>,
    {
        let pending = self.awaiting.take().ok_or(Error::WalkOutOfSync)?;

        let items = match response::success_body(response)
            .and_then(|body| response::object_array::<FolderItem>(body.as_ref()))
        {
            Ok(items) => items,
            Err(e) => {
                self.next_folder = Some(pending);
                return Err(e);
            }
        };

        tracing::debug!(folder = %pending.folder_id, count = items.len(), "listed folder");

        self.stack.push(Frame {
            path: pending.path,
            items: items.into_iter(),
        });

        Ok(())
    }

    /// Consumes listed items until a folder that needs listing is found
    fn advance(&mut self) -> Option<Pending> {
        while let Some(frame) = self.stack.last_mut() {
            let item = match frame.items.next() {
                Some(item) => item,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let path = join_path(&frame.path, &item.name);

            match item.kind() {
                ItemKind::Folder => match item.id {
                    Some(folder_id) if !folder_id.is_empty() => {
                        return Some(Pending { folder_id, path });
                    }
                    _ => {
                        tracing::warn!(%path, "skipping folder without an id");
                    }
                },
                ItemKind::File => self.files.push(ProjectFile {
                    id: item.id,
                    name: item.name,
                    path,
                    size: item.size,
                    modified_at: item.modified_at.or(item.modified_on),
                }),
            }
        }

        None
    }
}
