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

//! Lineage records for downstream provenance tracking.
//!
//! These records are write-only: they are serialized to JSON and emitted as
//! log events. Nothing in this crate reads them back.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Describes where a pipeline sits in the data platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineageMetadata {
    pub pipeline_name: String,
    pub source_system: String,
    pub destination_system: String,
    pub data_domain: String,
    pub processing_tier: String,
    pub downstream_datasets: Vec<String>,
    pub downstream_marts: Vec<String>,
    pub data_classification: String,
    pub contains_pii: bool,
}

/// Emitted before the load job is submitted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineageStart<'a> {
    pub execution_id: &'a str,
    pub source_uri: &'a str,
    pub source_system: &'a str,
    pub destination_system: &'a str,
    pub pipeline_name: &'a str,
    pub data_domain: &'a str,
    pub processing_tier: &'a str,
    pub execution_start: String,
}

impl<'a> LineageStart<'a> {
    pub fn new(
        metadata: &'a LineageMetadata,
        execution_id: &'a str,
        source_uri: &'a str,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            execution_id,
            source_uri,
            source_system: &metadata.source_system,
            destination_system: &metadata.destination_system,
            pipeline_name: &metadata.pipeline_name,
            data_domain: &metadata.data_domain,
            processing_tier: &metadata.processing_tier,
            execution_start: start.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Emitted after a successful load.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineageRecord<'a> {
    pub execution_id: &'a str,
    pub status: &'static str,
    pub source_uri: &'a str,
    pub destination_table: String,
    pub rows_processed: Option<u64>,
    pub total_rows_in_table: u64,
    pub execution_duration_seconds: f64,
    pub execution_end: String,
    pub downstream_datasets: &'a [String],
    pub downstream_marts: &'a [String],
    pub data_classification: &'a str,
    pub contains_pii: bool,
}

impl<'a> LineageRecord<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn success(
        metadata: &'a LineageMetadata,
        execution_id: &'a str,
        source_uri: &'a str,
        destination_table: String,
        rows_processed: Option<u64>,
        total_rows_in_table: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let duration = (end - start).to_std().unwrap_or_default();
        Self {
            execution_id,
            status: "SUCCESS",
            source_uri,
            destination_table,
            rows_processed,
            total_rows_in_table,
            execution_duration_seconds: duration.as_secs_f64(),
            execution_end: end.to_rfc3339_opts(SecondsFormat::Micros, true),
            downstream_datasets: &metadata.downstream_datasets,
            downstream_marts: &metadata.downstream_marts,
            data_classification: &metadata.data_classification,
            contains_pii: metadata.contains_pii,
        }
    }
}

/// Serializes a lineage record for logging.
pub fn to_json<T: Serialize>(record: &T) -> String {
    // The records only hold strings, numbers, and booleans.
    serde_json::to_string(record).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}
