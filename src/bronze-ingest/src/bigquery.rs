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

//! Implements [Warehouse] with the BigQuery API.

use crate::job::{FieldSpec, LoadJobSpec};
use crate::warehouse::{JobHandle, JobState, LoadRequest, TableRef, Warehouse};
use crate::{Error, Result};
use google_cloud_bigquery_v2::client::{JobService, TableService};
use google_cloud_bigquery_v2::model;

/// A [Warehouse] backed by BigQuery load jobs.
///
/// # Example
/// ```no_run
/// # tokio_test::block_on(async {
/// # use bronze_ingest::bigquery::BigQueryWarehouse;
/// let warehouse = BigQueryWarehouse::new().await?;
/// # bronze_ingest::Result::<()>::Ok(()) });
/// ```
#[derive(Clone, Debug)]
pub struct BigQueryWarehouse {
    jobs: JobService,
    tables: TableService,
}

impl BigQueryWarehouse {
    /// Creates the BigQuery clients using Application Default Credentials.
    pub async fn new() -> Result<Self> {
        let jobs = JobService::builder()
            .build()
            .await
            .map_err(Error::service)?;
        let tables = TableService::builder()
            .build()
            .await
            .map_err(Error::service)?;
        Ok(Self::from_clients(jobs, tables))
    }

    /// Uses already configured clients, for example with a custom endpoint.
    pub fn from_clients(jobs: JobService, tables: TableService) -> Self {
        Self { jobs, tables }
    }
}

impl Warehouse for BigQueryWarehouse {
    async fn submit_load(&self, request: LoadRequest) -> Result<JobHandle> {
        let project_id = request.destination.project.clone();
        let job_id = new_job_id();
        let job = load_job(&project_id, &job_id, request);
        let response = self
            .jobs
            .insert_job()
            .set_project_id(&project_id)
            .set_job(job)
            .send()
            .await?;
        let reference = response.job_reference.unwrap_or_default();
        Ok(JobHandle {
            project_id,
            // The service echoes the id we chose, keep ours if it does not.
            job_id: if reference.job_id.is_empty() {
                job_id
            } else {
                reference.job_id
            },
            location: reference.location.filter(|l| !l.is_empty()),
        })
    }

    async fn job_state(&self, job: &JobHandle) -> Result<JobState> {
        let builder = self.jobs.get_job().set_job_id(&job.job_id);
        let builder = match &job.location {
            Some(location) => builder.set_location(location),
            None => builder,
        };
        let response = builder.set_project_id(&job.project_id).send().await?;
        Ok(job_state(response))
    }

    async fn table_row_count(&self, table: &TableRef) -> Result<u64> {
        let response = self
            .tables
            .get_table()
            .set_project_id(&table.project)
            .set_dataset_id(&table.dataset)
            .set_table_id(&table.table)
            .send()
            .await?;
        Ok(response.num_rows.unwrap_or_default())
    }
}

fn new_job_id() -> String {
    format!("bronze_ingest_{}", uuid::Uuid::new_v4().simple())
}

fn load_job(project_id: &str, job_id: &str, request: LoadRequest) -> model::Job {
    let LoadRequest {
        source_uri,
        destination,
        spec,
        labels,
    } = request;
    let load = load_configuration(spec)
        .set_source_uris([source_uri])
        .set_destination_table(
            model::TableReference::new()
                .set_project_id(destination.project)
                .set_dataset_id(destination.dataset)
                .set_table_id(destination.table),
        );
    model::Job::new()
        .set_job_reference(
            model::JobReference::new()
                .set_project_id(project_id)
                .set_job_id(job_id),
        )
        .set_configuration(
            model::JobConfiguration::new()
                .set_load(load)
                .set_labels(labels),
        )
}

fn load_configuration(spec: LoadJobSpec) -> model::JobConfigurationLoad {
    let load = model::JobConfigurationLoad::new()
        .set_source_format(spec.source_format.as_str())
        .set_write_disposition(spec.write_disposition.as_str())
        .set_create_disposition(spec.create_disposition.as_str())
        .set_or_clear_skip_leading_rows(
            spec.skip_leading_rows
                .and_then(|n| i32::try_from(n).ok()),
        )
        .set_or_clear_autodetect(spec.autodetect);
    if spec.schema.is_empty() {
        return load;
    }
    let fields = spec.schema.into_iter().map(field_schema);
    load.set_schema(model::TableSchema::new().set_fields(fields))
}

fn field_schema(field: FieldSpec) -> model::TableFieldSchema {
    model::TableFieldSchema::new()
        .set_name(field.name)
        .set_type(field.field_type.as_str())
        .set_mode(field.mode.as_str())
        .set_fields(field.fields.into_iter().map(field_schema))
}

fn job_state(job: model::Job) -> JobState {
    let status = job.status.unwrap_or_default();
    if let Some(error) = status.error_result {
        return JobState::Failed {
            reason: error.reason,
            message: error.message,
        };
    }
    match status.state.as_str() {
        "DONE" => JobState::Done {
            output_rows: job
                .statistics
                .and_then(|s| s.load)
                .and_then(|l| l.output_rows)
                .and_then(|n| u64::try_from(n).ok()),
        },
        "RUNNING" => JobState::Running,
        _ => JobState::Pending,
    }
}
