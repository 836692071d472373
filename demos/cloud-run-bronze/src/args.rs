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

use anyhow::bail;
use bronze_ingest::config::SchemaMode;
use bronze_ingest::warehouse::{TimeoutAction, WaitPolicy};
use bronze_ingest::{Config, Profile};
use clap::Parser;
use humantime::parse_duration;
use std::time::Duration;

/// Configuration options for the service.
///
/// Cloud Run passes configuration as environment variables, every option
/// can be set either way.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The project that owns the bronze datasets and runs the load jobs.
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: String,

    /// The destination dataset. Defaults to the pipeline profile's dataset.
    #[arg(long, env = "DATASET_ID")]
    pub dataset_id: Option<String>,

    /// A JSON object mapping object name keywords to table names.
    #[arg(long, env = "TABLE_MAPPING", default_value = "{}")]
    pub table_mapping: String,

    /// The pipeline profile.
    #[arg(long, env = "PIPELINE_PROFILE", value_enum, default_value_t = PipelineProfile::Contributor)]
    pub pipeline_profile: PipelineProfile,

    /// Use the profile's predefined schemas instead of schema inference.
    #[arg(long, env = "USE_EXPLICIT_SCHEMA")]
    pub use_explicit_schema: bool,

    /// How long to wait for each load job.
    #[arg(long, env = "LOAD_TIMEOUT", value_parser = parse_duration, default_value = "9m")]
    pub load_timeout: Duration,

    /// What to do with load jobs still running after `--load-timeout`.
    #[arg(long, env = "ON_LOAD_TIMEOUT", value_enum, default_value_t = OnTimeout::Fail)]
    pub on_load_timeout: OnTimeout,

    /// The port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

/// The built-in pipeline profiles.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum PipelineProfile {
    Contributor,
    ProgramOps,
    QualityAudit,
}

impl PipelineProfile {
    pub fn profile(&self) -> Profile {
        match self {
            Self::Contributor => Profile::contributor(),
            Self::ProgramOps => Profile::program_ops(),
            Self::QualityAudit => Profile::quality_audit(),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OnTimeout {
    /// Report the invocation as failed.
    Fail,
    /// Report success and let the job finish on its own.
    Detach,
}

impl From<OnTimeout> for TimeoutAction {
    fn from(value: OnTimeout) -> Self {
        match value {
            OnTimeout::Fail => Self::Fail,
            OnTimeout::Detach => Self::Detach,
        }
    }
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.project_id.is_empty() {
            bail!("the project id cannot be empty")
        }
        if self.load_timeout.is_zero() {
            bail!("invalid load timeout, should be > 0")
        }
        Ok(())
    }

    /// Builds the handler configuration.
    pub fn config(&self) -> anyhow::Result<Config> {
        let schema_mode = if self.use_explicit_schema {
            SchemaMode::Explicit
        } else {
            SchemaMode::AutoDetect
        };
        let wait = WaitPolicy::default()
            .with_timeout(Some(self.load_timeout))
            .with_on_timeout(self.on_load_timeout.into());
        let builder = Config::builder(&self.project_id, self.pipeline_profile.profile())
            .with_table_mapping_json(&self.table_mapping)?
            .with_schema_mode(schema_mode)
            .with_wait_policy(wait);
        let builder = self
            .dataset_id
            .iter()
            .fold(builder, |b, v| b.with_dataset_id(v));
        Ok(builder.build())
    }
}
