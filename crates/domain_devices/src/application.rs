//! Uploaded application builds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{ApplicationId, Entity, SearchField};

use crate::codec::{base64_bytes, show};

/// An application build distributed to devices
///
/// The binary payload is stored alongside its content type and travels as
/// base64 in JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    pub id: Option<ApplicationId>,
    #[validate(length(max = 255))]
    pub file_name: Option<String>,
    #[serde(with = "base64_bytes")]
    pub data: Option<Vec<u8>>,
    #[validate(length(max = 255))]
    pub data_content_type: Option<String>,
    #[validate(length(max = 255))]
    pub version: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: ApplicationId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Sets the payload together with its content type
    pub fn with_data(mut self, data: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.data = Some(data);
        self.data_content_type = Some(content_type.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn data_len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

impl Entity for Application {
    type Id = ApplicationId;
    const ENTITY_NAME: &'static str = "Application";
    const INDEX_NAME: &'static str = "application";

    fn id(&self) -> Option<ApplicationId> {
        self.id
    }

    fn set_id(&mut self, id: ApplicationId) {
        self.id = Some(id);
    }

    // The payload is not searchable
    fn search_fields(&self) -> Vec<SearchField> {
        [
            SearchField::optional("fileName", self.file_name.as_ref()),
            SearchField::optional("dataContentType", self.data_content_type.as_ref()),
            SearchField::optional("version", self.version.as_ref()),
            self.timestamp.map(|t| SearchField::new("timestamp", t.to_rfc3339())),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl PartialEq for Application {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Application{{id={}, fileName='{}', data='{} bytes', dataContentType='{}', version='{}', timestamp='{}'}}",
            show(&self.id),
            show(&self.file_name),
            self.data_len(),
            show(&self.data_content_type),
            show(&self.version),
            show(&self.timestamp),
        )
    }
}
