//! Tag, category and project models
//!
//! Names are unique case-insensitively; the casing of the first record wins.

use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ProjectId, TagId};

/// A colored label attached to items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// CSS hex color
    pub color: String,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// A (possibly nested) folder for items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
    pub parent_id: Option<CategoryId>,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            icon: icon.into(),
            parent_id: None,
        }
    }
}

/// A project grouping items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub color: String,
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Case-insensitive name comparison shared by lookups and the resolver
pub fn names_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
