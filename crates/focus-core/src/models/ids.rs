//! Identifier newtypes
//!
//! Locally created records get UUID v7 identifiers, but ids are stored as
//! opaque strings because records pulled from the spreadsheet keep whatever
//! `ID` the sheet holds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new unique identifier using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(crate::Error::InvalidInput(format!(
                        "{} cannot be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

string_id!(
    /// Identifier of a task, bookmark or note
    ItemId
);
string_id!(
    /// Identifier of an AI prompt
    PromptId
);
string_id!(
    /// Identifier of a tag
    TagId
);
string_id!(
    /// Identifier of a category
    CategoryId
);
string_id!(
    /// Identifier of a project
    ProjectId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_unique() {
        let id1 = ItemId::new();
        let id2 = ItemId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_parse_trims_and_rejects_empty() {
        let parsed: TagId = "  a1 ".parse().unwrap();
        assert_eq!(parsed.as_str(), "a1");
        assert!("   ".parse::<PromptId>().is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = ProjectId::from("p-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p-1\"");
    }
}
