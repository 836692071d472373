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

//! Moves staged Cloud Storage objects into BigQuery bronze tables.
//!
//! Each invocation receives a storage-finalization event, infers the
//! destination table from the object name, configures a load job for the
//! object's format, submits it, waits for it, and logs the outcome.
//!
//! # Example
//! ```no_run
//! # tokio_test::block_on(async {
//! use bronze_ingest::{Config, Handler, Profile, bigquery::BigQueryWarehouse};
//! let config = Config::builder("my-project", Profile::contributor())
//!     .with_table_mapping_json(r#"{"contributors": "contributors"}"#)?
//!     .build();
//! let handler = Handler::new(config, BigQueryWarehouse::new().await?);
//! # bronze_ingest::Result::<()>::Ok(()) });
//! ```
//!
//! The heavy lifting (parsing, schema inference, table writes) happens in
//! the BigQuery load job. This crate only decides *where* and *how* to load.

pub mod bigquery;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod job;
pub mod lineage;
pub mod profile;
pub mod resolver;
pub mod warehouse;

pub use config::Config;
pub use error::Error;
pub use handler::{Handler, LoadSummary, Outcome};
pub use profile::Profile;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
