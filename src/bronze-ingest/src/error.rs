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

//! Errors returned by the ingestion pipeline.
//!
//! Nothing in this crate retries. Every error is either a problem with the
//! incoming event, a problem with the process configuration, or a failure
//! reported by the warehouse. The hosting platform owns redelivery.

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents errors that can occur while handling a storage event.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The storage event lacks a field required to locate the object.
    #[error("the storage event is missing the required `{0}` field")]
    MissingField(&'static str),

    /// The process configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The load job ran but the warehouse reported an error.
    #[error("load job {job_id} failed: {reason}: {message}")]
    LoadFailed {
        job_id: String,
        reason: String,
        message: String,
    },

    /// The load job did not finish before the configured deadline.
    #[error("load job {job_id} did not complete within {timeout:?}")]
    Timeout { job_id: String, timeout: Duration },

    /// The warehouse client returned an error.
    #[error("the warehouse service returned an error: {0}")]
    Service(#[source] BoxError),
}

impl Error {
    /// Creates an error wrapping a failure from the warehouse client.
    pub fn service<T: Into<BoxError>>(source: T) -> Self {
        Self::Service(source.into())
    }

    /// Creates an error describing invalid configuration.
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config(message.into())
    }

    /// The event did not carry enough information to do any work.
    pub fn is_configuration_gap(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::Config(_))
    }

    /// The failure happened in (or while talking to) the warehouse.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed { .. } | Self::Timeout { .. } | Self::Service(_)
        )
    }
}

impl From<google_cloud_gax::error::Error> for Error {
    fn from(value: google_cloud_gax::error::Error) -> Self {
        Self::service(value)
    }
}
