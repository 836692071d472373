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

//! The entry point for each storage event.
//!
//! The handler runs one linear pipeline per event:
//!
//! 1. Extract the bucket and object from the event.
//! 2. Resolve the destination table. No match means there is nothing to do.
//! 3. Configure the load job for the object's format.
//! 4. Submit the job (append-only, creating the table if needed) and wait.
//! 5. Read the table's row count and log the outcome.
//!
//! There are no retries and no cleanup. Errors are logged with the object key
//! and returned unchanged, the caller (typically the event delivery platform)
//! decides whether to redeliver. Redelivery appends the same rows again.

use crate::config::SchemaMode;
use crate::event::{IngestionEvent, StorageObjectData};
use crate::job::{LoadJobSpec, is_supported_extension};
use crate::lineage::{self, LineageRecord, LineageStart};
use crate::profile::FormatPolicy;
use crate::warehouse::{LoadRequest, TableRef, WaitResult, Warehouse, wait_for_job};
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// What happened to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The object does not map to any table. Nothing was loaded.
    Skipped { object_key: String },
    /// The object was loaded.
    Loaded(LoadSummary),
    /// The wait deadline expired and the job was left running.
    Detached {
        job_id: String,
        destination: TableRef,
    },
}

/// The result of a successful load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    pub job_id: String,
    pub destination: TableRef,
    /// Rows appended by this job, if the warehouse reported them.
    pub rows_loaded: Option<u64>,
    /// Rows in the destination table after the load.
    pub total_rows: u64,
}

/// Loads staged objects into bronze tables.
///
/// The handler is immutable and can serve concurrent events.
///
/// # Example
/// ```no_run
/// # use bronze_ingest::{Config, Handler, Profile, bigquery::BigQueryWarehouse};
/// # use bronze_ingest::event::IngestionEvent;
/// async fn example(handler: &Handler<BigQueryWarehouse>) -> bronze_ingest::Result<()> {
///     let event = IngestionEvent::new("staging", "contributors_20250101.csv", "evt-1");
///     let outcome = handler.handle(event).await?;
///     println!("{outcome:?}");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Handler<W> {
    config: Config,
    warehouse: W,
}

impl<W> Handler<W>
where
    W: Warehouse,
{
    pub fn new(config: Config, warehouse: W) -> Self {
        Self { config, warehouse }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    /// Handles the object payload of a storage event.
    ///
    /// Fails with [MissingField][crate::Error::MissingField] if the payload
    /// does not name a bucket and an object.
    pub async fn handle_object(
        &self,
        trigger_id: &str,
        data: StorageObjectData,
    ) -> Result<Outcome> {
        let event = IngestionEvent::from_object(data, trigger_id).inspect_err(|e| {
            tracing::error!(trigger_id, error = %e, "cannot process storage event");
        })?;
        self.handle(event).await
    }

    /// Loads the object named by `event` into its bronze table.
    #[tracing::instrument(
        name = "bronze_ingest",
        skip_all,
        fields(
            trigger_id = %event.trigger_id,
            bucket = %event.container,
            object = %event.object_key,
        )
    )]
    pub async fn handle(&self, event: IngestionEvent) -> Result<Outcome> {
        let start = Utc::now();
        let source_uri = event.source_uri();
        if let Some(metadata) = &self.config.profile().lineage {
            let record = LineageStart::new(metadata, &event.trigger_id, &source_uri, start);
            tracing::info!(lineage = %lineage::to_json(&record), "LINEAGE_START");
        }
        tracing::info!(source_uri = %source_uri, "processing file");

        let Some(table) = self.config.resolver().resolve(&event.object_key) else {
            tracing::warn!(
                object_key = %event.object_key,
                "no table mapping found for file"
            );
            return Ok(Outcome::Skipped {
                object_key: event.object_key,
            });
        };

        self.load(&event, source_uri, table, start)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    object_key = %event.object_key,
                    error = %e,
                    "error processing file"
                );
            })
    }

    async fn load(
        &self,
        event: &IngestionEvent,
        source_uri: String,
        table: &str,
        start: DateTime<Utc>,
    ) -> Result<Outcome> {
        let destination = TableRef::new(
            self.config.project_id(),
            self.config.dataset_id(),
            table,
        );
        let request = LoadRequest {
            source_uri: source_uri.clone(),
            destination: destination.clone(),
            spec: self.load_spec(event, table),
            labels: self.labels(table),
        };
        tracing::debug!(?request, "submitting load job");
        let job = self.warehouse.submit_load(request).await?;
        tracing::info!(job_id = %job.job_id, %destination, "load job started");

        let waited = wait_for_job(&self.warehouse, &job, self.config.wait_policy()).await?;
        let output_rows = match waited {
            WaitResult::Done { output_rows } => output_rows,
            WaitResult::Detached => {
                tracing::warn!(
                    job_id = %job.job_id,
                    %destination,
                    "load job still running at the deadline, no longer waiting for it"
                );
                return Ok(Outcome::Detached {
                    job_id: job.job_id,
                    destination,
                });
            }
        };

        let total_rows = self.warehouse.table_row_count(&destination).await?;
        tracing::info!(
            rows_loaded = output_rows,
            total_rows,
            "successfully loaded {} rows into {}.{}. Total rows in table: {}",
            output_rows
                .map(|n| n.to_string())
                .unwrap_or_else(|| "an unknown number of".into()),
            destination.dataset,
            destination.table,
            total_rows
        );

        if let Some(metadata) = &self.config.profile().lineage {
            let record = LineageRecord::success(
                metadata,
                &event.trigger_id,
                &source_uri,
                destination.to_string(),
                output_rows,
                total_rows,
                start,
                Utc::now(),
            );
            tracing::info!(lineage = %lineage::to_json(&record), "LINEAGE_SUCCESS");
        }

        Ok(Outcome::Loaded(LoadSummary {
            job_id: job.job_id,
            destination,
            rows_loaded: output_rows,
            total_rows,
        }))
    }

    fn load_spec(&self, event: &IngestionEvent, table: &str) -> LoadJobSpec {
        let profile = self.config.profile();
        let extension = event.extension();
        if profile.format_policy == FormatPolicy::ByExtension
            && !is_supported_extension(&extension)
        {
            tracing::warn!(
                object_key = %event.object_key,
                %extension,
                "unsupported file extension, loading as CSV"
            );
        }
        let spec = profile.format_policy.spec_for(&extension);
        let spec = match self.config.schema_mode() {
            SchemaMode::AutoDetect => spec,
            SchemaMode::Explicit => spec.with_schema(profile.schema(table).iter().cloned()),
        };
        spec.with_datastream_metadata()
    }

    fn labels(&self, table: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("pipeline".to_string(), label_value(&self.config.profile().name)),
            ("table".to_string(), label_value(table)),
        ])
    }
}

// Label values are limited to 63 lowercase letters, digits, `_` or `-`.
fn label_value(value: &str) -> String {
    value
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .take(63)
        .collect()
}
