//! Identifiers for platform entities.
//!
//! The platform assigns ids; the client treats them as opaque strings and
//! only checks that they are non-empty before they are used in a request.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id, rejecting empty or blank values.
            pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ValidationError::EmptyId($label));
                }
                Ok(Self(raw))
            }

            /// Borrow the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a Project
    ProjectId,
    "project id"
);
entity_id!(
    /// Unique identifier for a Product
    ProductId,
    "product id"
);
entity_id!(
    /// Unique identifier for a Spec
    SpecId,
    "spec id"
);
entity_id!(
    /// Unique identifier for a Task
    TaskId,
    "task id"
);
entity_id!(
    /// Unique identifier for a SubTask
    SubTaskId,
    "subtask id"
);
