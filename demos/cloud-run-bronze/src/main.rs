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

//! Loads staged Cloud Storage objects into BigQuery bronze tables.
//!
//! Deploy this service to Cloud Run and route `google.cloud.storage.object.v1.finalized`
//! events from the staging bucket to it with an Eventarc trigger.

mod args;
mod server;

use args::Args;
use bronze_ingest::Handler;
use bronze_ingest::bigquery::BigQueryWarehouse;
use clap::Parser;
use std::sync::Arc;

const DESCRIPTION: &str = concat!(
    "This service receives storage finalization events for a staging bucket",
    " and appends each new object to its BigQuery bronze table.",
    " The destination table is inferred from the object name."
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;
    enable_tracing()?;

    let config = args.config()?;
    tracing::info!(
        project_id = config.project_id(),
        dataset_id = config.dataset_id(),
        profile = %config.profile().name,
        tables = config.resolver().mapping().len(),
        "configuration loaded"
    );

    let warehouse = BigQueryWarehouse::new().await?;
    let handler = Arc::new(Handler::new(config, warehouse));
    let app = server::router(handler);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// Cloud Logging parses one JSON object per line.
fn enable_tracing() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
