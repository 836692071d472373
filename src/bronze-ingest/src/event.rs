// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Storage-finalization events.
//!
//! Cloud Storage publishes an event when an object is finalized. Eventarc
//! delivers it as a [CloudEvent], either in *structured* mode (the whole
//! envelope is the JSON body) or in *binary* mode (the envelope attributes are
//! `ce-*` headers and the body is just the [StorageObjectData]).

use crate::{Error, Result};
use serde::Deserialize;

/// The Cloud Storage object payload of a finalization event.
///
/// Only `bucket` and `name` are needed to load the object. They are optional
/// here so a malformed event can be reported as
/// [MissingField][Error::MissingField] instead of a parse failure.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectData {
    pub bucket: Option<String>,
    pub name: Option<String>,
    pub content_type: Option<String>,
    /// Cloud Storage encodes `int64` values as strings.
    pub size: Option<String>,
    pub generation: Option<String>,
    pub time_created: Option<String>,
    pub updated: Option<String>,
}

/// A CloudEvent in structured content mode carrying a [StorageObjectData].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CloudEvent {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub data: StorageObjectData,
}

/// The object to ingest, extracted from a storage event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestionEvent {
    pub container: String,
    pub object_key: String,
    /// Opaque identifier of the triggering event, only used for logging.
    pub trigger_id: String,
}

impl IngestionEvent {
    pub fn new<C, K, T>(container: C, object_key: K, trigger_id: T) -> Self
    where
        C: Into<String>,
        K: Into<String>,
        T: Into<String>,
    {
        Self {
            container: container.into(),
            object_key: object_key.into(),
            trigger_id: trigger_id.into(),
        }
    }

    /// Extracts the bucket and object name from the event payload.
    ///
    /// Fails with [Error::MissingField] if either value is absent or empty.
    pub fn from_object<T: Into<String>>(data: StorageObjectData, trigger_id: T) -> Result<Self> {
        let container = required(data.bucket, "bucket")?;
        let object_key = required(data.name, "name")?;
        Ok(Self::new(container, object_key, trigger_id))
    }

    /// Extracts the object from a structured-mode CloudEvent.
    pub fn from_cloud_event(event: CloudEvent) -> Result<Self> {
        Self::from_object(event.data, event.id)
    }

    /// The `gs://` URI of the object, as the load job expects it.
    pub fn source_uri(&self) -> String {
        format!("gs://{}/{}", self.container, self.object_key)
    }

    /// The lower-cased text after the last `.` in the object key.
    ///
    /// Keys without a `.` return the whole (lower-cased) key, which then
    /// matches no known format.
    pub fn extension(&self) -> String {
        self.object_key
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}
