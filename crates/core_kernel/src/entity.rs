//! The contract shared by every persisted record

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// A named, stringified field value exposed to the search index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
    pub name: &'static str,
    pub value: String,
}

impl SearchField {
    pub fn new(name: &'static str, value: impl ToString) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }

    /// Builds a field only when the value is present
    pub fn optional<T: fmt::Display>(name: &'static str, value: Option<&T>) -> Option<Self> {
        value.map(|v| Self::new(name, v))
    }
}

/// A flat record mapped onto one table row and mirrored into one search index
///
/// Identity is the primary key: an entity without an id has not been
/// persisted yet, and the store assigns the id on first save.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Primary key type
    type Id: Copy
        + Eq
        + Ord
        + Hash
        + fmt::Display
        + fmt::Debug
        + From<i64>
        + Into<i64>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Name used in logs, alert headers and error bodies
    const ENTITY_NAME: &'static str;

    /// Name of the search index mirroring this entity
    const INDEX_NAME: &'static str;

    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    /// Entity-specific searchable fields, excluding the id
    fn search_fields(&self) -> Vec<SearchField>;

    /// Full searchable projection including the id
    fn search_document(&self) -> Vec<SearchField> {
        let mut fields = Vec::new();
        if let Some(id) = self.id() {
            fields.push(SearchField::new("id", id));
        }
        fields.extend(self.search_fields());
        fields
    }

    /// Identity equality: both persisted and sharing the same key
    fn same_identity(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}
