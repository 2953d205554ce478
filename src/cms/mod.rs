use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub mod channel;
pub mod content;
pub mod slug;
pub mod store;

pub use channel::Channel;
pub use content::{Placed, Publication};
pub use store::Store;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct DocId(pub u64);

impl DocId {
    pub fn is_unsaved(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub roles: BTreeSet<String>,
}

impl User {
    pub fn new(id: &str, name: &str) -> Self {
        User {
            id: id.to_owned(),
            name: name.to_owned(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_owned());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CmsError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} slug already exists")]
    DuplicateSlug(String),
    #[error("Home page already exists")]
    HomepageExists,
    #[error("There is no homepage")]
    MissingHomepage,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("No free {0} left")]
    Exhausted(&'static str),
}

/// A stored record the admin layer can act on generically.
pub trait Document: Clone + Serialize {
    const MODEL_NAME: &'static str;

    fn slug_mut(&mut self) -> &mut String;
    fn publication_mut(&mut self) -> &mut Publication;

    /// Forgets the identity of the record so that saving it inserts a copy.
    fn detach(&mut self);
}

pub trait Collection<D: Document> {
    fn get(&self, id: DocId) -> Option<D>;
    fn save(&self, document: D, user: Option<&User>, now: DateTime<Utc>) -> Result<DocId, CmsError>;
}
