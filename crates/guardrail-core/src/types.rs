//! Shared identifier and pagination types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Unique identifier for a task
    TaskId
}

string_id! {
    /// Unique identifier for an evaluation unit within a task
    UnitId
}

string_id! {
    /// Identifier referencing a model registry entry
    ModelId
}

string_id! {
    /// Identifier referencing a catalog test case
    CaseId
}

impl TaskId {
    /// Generate a fresh random task id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl UnitId {
    /// Generate a fresh random unit id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One page of a paginated listing
///
/// Pages are 1-indexed; `total` is the size of the whole collection, not of
/// this page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Number of pages needed to cover `total` items
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
        assert_ne!(UnitId::generate(), UnitId::generate());
    }

    #[test]
    fn test_page_count() {
        let page = Page::<u8> {
            items: vec![],
            total: 15,
            page: 2,
            page_size: 10,
        };
        assert_eq!(page.page_count(), 2);
    }
}
