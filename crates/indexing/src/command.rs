use crate::document::{Document, DocumentRef, DocumentSession};
use crate::{IndexingError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Index,
    Update,
    UpdateSecurity,
    Delete,
}

impl CommandType {
    pub const ALL: [CommandType; 4] = [
        CommandType::Index,
        CommandType::Update,
        CommandType::UpdateSecurity,
        CommandType::Delete,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandType::Index => "INDEX",
            CommandType::Update => "UPDATE",
            CommandType::UpdateSecurity => "UPDATE_SECURITY",
            CommandType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self> {
        CommandType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| IndexingError::Wire(format!("unknown command type {s:?}")))
    }
}

/// A single instruction for the search-index writer, bound to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingCommand {
    id: String,
    command_type: CommandType,
    sync: bool,
    recurse: bool,
    target: DocumentRef,
    schemas: Vec<String>,
}

impl IndexingCommand {
    /// Build a command for `doc`.
    ///
    /// Recursive work is unbounded, so only a `Delete` may be both
    /// synchronous and recursive.
    pub fn new(
        doc: &(impl Document + ?Sized),
        command_type: CommandType,
        sync: bool,
        recurse: bool,
    ) -> Result<Self> {
        let target = DocumentRef::snapshot(doc)?;
        if sync && recurse && command_type != CommandType::Delete {
            return Err(IndexingError::SyncRecursive { command_type });
        }
        Ok(Self::from_parts(
            Uuid::new_v4().to_string(),
            command_type,
            sync,
            recurse,
            target,
        ))
    }

    /// Rebuild an existing command. Flags merged through `update` may
    /// legitimately combine sync and recurse, so they are not re-checked here.
    pub(crate) fn from_parts(
        id: String,
        command_type: CommandType,
        sync: bool,
        recurse: bool,
        target: DocumentRef,
    ) -> Self {
        Self {
            id,
            command_type,
            sync,
            recurse,
            target,
            schemas: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn command_type(&self) -> CommandType {
        self.command_type
    }

    #[must_use]
    pub const fn is_sync(&self) -> bool {
        self.sync
    }

    #[must_use]
    pub const fn is_recurse(&self) -> bool {
        self.recurse
    }

    #[must_use]
    pub const fn target(&self) -> &DocumentRef {
        &self.target
    }

    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.target.id
    }

    #[must_use]
    pub fn repository_name(&self) -> &str {
        &self.target.repository
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.target.path.as_deref()
    }

    /// Fold the flags of `other` into this command. Flags only ever escalate,
    /// so an async recursive command merged with a sync one ends up both.
    pub fn update(&mut self, other: &IndexingCommand) {
        self.sync |= other.sync;
        self.recurse |= other.recurse;
    }

    /// Try to make the command synchronous; returns whether it now is.
    /// Recursive commands other than `Delete` stay asynchronous.
    pub fn make_sync(&mut self) -> bool {
        if self.command_type == CommandType::Delete || !self.recurse {
            self.sync = true;
        }
        self.sync
    }

    pub fn add_schemas(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.schemas.contains(&name) {
            self.schemas.push(name);
        }
    }

    /// Schemas to (re)index. Without an explicit list this is every schema of
    /// the target, i.e. a full reindex.
    #[must_use]
    pub fn schemas(&self) -> Vec<String> {
        if self.schemas.is_empty() {
            self.target.schemas.clone()
        } else {
            self.schemas.clone()
        }
    }

    /// Re-resolve the target from `session`. A vanished document, or a
    /// session over another repository, keeps the stale target and yields
    /// `Ok(false)`.
    pub fn refresh(&mut self, session: &(impl DocumentSession + ?Sized)) -> Result<bool> {
        if session.repository_name() != self.target.repository {
            log::debug!(
                "Not refreshing {self} from a session on repository {:?}",
                session.repository_name()
            );
            return Ok(false);
        }
        match session.fetch(&self.target.id)? {
            Some(doc) => {
                self.target = doc;
                Ok(true)
            }
            None => {
                if self.command_type == CommandType::Delete {
                    log::debug!("Target of {self} is gone, keeping stale reference");
                } else {
                    log::warn!("Target of {self} vanished before indexing");
                }
                Ok(false)
            }
        }
    }

    /// Same command bound to another handle of the same document.
    pub fn with_target(&self, doc: &(impl Document + ?Sized)) -> Result<Self> {
        let target = DocumentRef::snapshot(doc)?;
        if target.id != self.target.id {
            return Err(IndexingError::TargetMismatch {
                expected: self.target.id.clone(),
                actual: target.id,
            });
        }
        Ok(Self {
            target,
            ..self.clone()
        })
    }
}

impl fmt::Display for IndexingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}:{}",
            self.command_type, self.target.repository, self.target.id
        )?;
        if self.sync {
            f.write_str(", sync")?;
        }
        if self.recurse {
            f.write_str(", recurse")?;
        }
        write!(f, ", id={})", self.id)
    }
}
