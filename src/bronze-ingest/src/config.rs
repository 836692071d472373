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

//! Process-wide configuration.
//!
//! The configuration is built once when the process starts and is immutable
//! afterwards. It is shared (read-only) by all concurrent invocations.

use crate::Result;
use crate::profile::Profile;
use crate::resolver::{TableMapping, TableResolver};
use crate::warehouse::WaitPolicy;

/// Where the load job schema comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaMode {
    /// Let the warehouse infer the schema (or read it from the file).
    #[default]
    AutoDetect,
    /// Use the profile's predefined schema for tables that have one.
    Explicit,
}

/// The configuration for a [Handler][crate::Handler].
#[derive(Clone, Debug)]
pub struct Config {
    project_id: String,
    dataset_id: String,
    profile: Profile,
    resolver: TableResolver,
    schema_mode: SchemaMode,
    wait: WaitPolicy,
}

impl Config {
    /// Returns a builder for [Config].
    ///
    /// ```
    /// # use bronze_ingest::{Config, Profile};
    /// let config = Config::builder("my-project", Profile::program_ops()).build();
    /// assert_eq!(config.dataset_id(), "programops_bronze");
    /// ```
    pub fn builder<P: Into<String>>(project_id: P, profile: Profile) -> ConfigBuilder {
        ConfigBuilder {
            project_id: project_id.into(),
            dataset_id: None,
            profile,
            mapping: TableMapping::default(),
            schema_mode: SchemaMode::default(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn resolver(&self) -> &TableResolver {
        &self.resolver
    }

    pub fn schema_mode(&self) -> SchemaMode {
        self.schema_mode
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }
}

/// A builder for [Config].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    project_id: String,
    dataset_id: Option<String>,
    profile: Profile,
    mapping: TableMapping,
    schema_mode: SchemaMode,
    wait: WaitPolicy,
}

impl ConfigBuilder {
    /// Overrides the profile's default dataset.
    pub fn with_dataset_id<T: Into<String>>(mut self, v: T) -> Self {
        self.dataset_id = Some(v.into());
        self
    }

    pub fn with_table_mapping(mut self, v: TableMapping) -> Self {
        self.mapping = v;
        self
    }

    /// Parses and sets the table mapping from its JSON representation.
    pub fn with_table_mapping_json(self, v: &str) -> Result<Self> {
        Ok(self.with_table_mapping(TableMapping::from_json(v)?))
    }

    pub fn with_schema_mode(mut self, v: SchemaMode) -> Self {
        self.schema_mode = v;
        self
    }

    pub fn with_wait_policy(mut self, v: WaitPolicy) -> Self {
        self.wait = v;
        self
    }

    pub fn build(self) -> Config {
        let dataset_id = self
            .dataset_id
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.profile.default_dataset.clone());
        let resolver = TableResolver::new(self.mapping, self.profile.segment_rule);
        Config {
            project_id: self.project_id,
            dataset_id,
            profile: self.profile,
            resolver,
            schema_mode: self.schema_mode,
            wait: self.wait,
        }
    }
}
