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

//! Per-domain pipeline profiles.
//!
//! Every staging-to-bronze deployment runs the same handler. A [Profile]
//! captures what differs between them: the default dataset, how table names
//! are derived, which formats are recognized, the predefined table schemas,
//! and the lineage metadata.

use crate::job::{FieldSpec, FieldType, LoadJobSpec};
use crate::lineage::LineageMetadata;
use crate::resolver::SegmentRule;
use std::collections::HashMap;

const DOWNSTREAM_MARTS: [&str; 4] = [
    "applemap_mart",
    "googleads_mart",
    "metaads_mart",
    "googlesearch_mart",
];

/// How the load job format is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatPolicy {
    /// Every object is loaded as CSV with a header row.
    #[default]
    CsvOnly,
    /// The format follows the object's extension.
    ByExtension,
}

impl FormatPolicy {
    pub fn spec_for(&self, extension: &str) -> LoadJobSpec {
        match self {
            Self::CsvOnly => LoadJobSpec::csv_with_header(),
            Self::ByExtension => LoadJobSpec::for_extension(extension),
        }
    }
}

/// The configuration that distinguishes one ingestion deployment from another.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub name: String,
    pub default_dataset: String,
    pub segment_rule: SegmentRule,
    pub format_policy: FormatPolicy,
    pub schemas: HashMap<String, Vec<FieldSpec>>,
    /// Only documented pipelines emit lineage records.
    pub lineage: Option<LineageMetadata>,
}

impl Profile {
    /// A profile with no schemas and no lineage metadata.
    pub fn new<N: Into<String>, D: Into<String>>(name: N, default_dataset: D) -> Self {
        Self {
            name: name.into(),
            default_dataset: default_dataset.into(),
            segment_rule: SegmentRule::default(),
            format_policy: FormatPolicy::default(),
            schemas: HashMap::new(),
            lineage: None,
        }
    }

    pub fn with_segment_rule(mut self, v: SegmentRule) -> Self {
        self.segment_rule = v;
        self
    }

    pub fn with_format_policy(mut self, v: FormatPolicy) -> Self {
        self.format_policy = v;
        self
    }

    pub fn with_schema<T, I>(mut self, table: T, fields: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = FieldSpec>,
    {
        self.schemas
            .insert(table.into(), fields.into_iter().collect());
        self
    }

    pub fn with_lineage(mut self, v: LineageMetadata) -> Self {
        self.lineage = Some(v);
        self
    }

    /// The predefined schema for `table`, if any.
    pub fn schema(&self, table: &str) -> &[FieldSpec] {
        self.schemas.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Looks up one of the built-in profiles by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "contributor" => Some(Self::contributor()),
            "program-ops" => Some(Self::program_ops()),
            "quality-audit" => Some(Self::quality_audit()),
            _ => None,
        }
    }

    /// Contributors, tasks, and task feedback. Restricted, contains PII.
    pub fn contributor() -> Self {
        use FieldSpec as F;
        use FieldType as T;
        Self::new("contributor", "contributor_bronze")
            .with_schema(
                "contributors",
                [
                    F::required("contributor_id", T::String),
                    F::nullable("name", T::String),
                    F::nullable("email", T::String),
                    F::nullable("created_at", T::Timestamp),
                ],
            )
            .with_schema(
                "tasks",
                [
                    F::required("task_id", T::String),
                    F::nullable("contributor_id", T::String),
                    F::nullable("task_type", T::String),
                    F::nullable("status", T::String),
                    F::nullable("created_at", T::Timestamp),
                    F::nullable("completed_at", T::Timestamp),
                ],
            )
            .with_schema(
                "task_feedback",
                [
                    F::required("feedback_id", T::String),
                    F::nullable("task_id", T::String),
                    F::nullable("rating", T::Integer),
                    F::nullable("comment", T::String),
                    F::nullable("created_at", T::Timestamp),
                ],
            )
            .with_lineage(lineage(
                "contributor",
                "contributor-management",
                "restricted",
                true,
            ))
    }

    /// Program operations exports, often MongoDB dumps in several formats.
    pub fn program_ops() -> Self {
        use FieldSpec as F;
        use FieldType as T;
        Self::new("program-ops", "programops_bronze")
            .with_segment_rule(SegmentRule::FirstTwo)
            .with_format_policy(FormatPolicy::ByExtension)
            .with_schema(
                "program_metadata",
                [
                    F::required("program_id", T::String),
                    F::nullable("program_name", T::String),
                    F::nullable("program_type", T::String),
                    F::nullable("status", T::String),
                    F::nullable("created_at", T::Timestamp),
                ],
            )
            .with_schema(
                "acknowledgements",
                [
                    F::required("ack_id", T::String),
                    F::nullable("program_id", T::String),
                    F::nullable("contributor_id", T::String),
                    F::nullable("ack_type", T::String),
                    F::nullable("created_at", T::Timestamp),
                ],
            )
    }

    /// Audits and audit issues. Internal, no PII.
    ///
    /// This pipeline does not emit lineage records.
    pub fn quality_audit() -> Self {
        use FieldSpec as F;
        use FieldType as T;
        Self::new("quality-audit", "qualityaudit_bronze")
            .with_schema(
                "audits",
                [
                    F::required("audit_id", T::String),
                    F::nullable("auditor_id", T::String),
                    F::nullable("audit_type", T::String),
                    F::nullable("status", T::String),
                    F::nullable("created_at", T::Timestamp),
                    F::nullable("completed_at", T::Timestamp),
                ],
            )
            .with_schema(
                "audit_issues",
                [
                    F::required("issue_id", T::String),
                    F::nullable("audit_id", T::String),
                    F::nullable("severity", T::String),
                    F::nullable("description", T::String),
                    F::nullable("created_at", T::Timestamp),
                ],
            )
    }
}

fn lineage(prefix: &str, domain: &str, classification: &str, pii: bool) -> LineageMetadata {
    LineageMetadata {
        pipeline_name: format!("{prefix}-staging-to-bronze"),
        source_system: "gcs-staging-bucket".to_string(),
        destination_system: "bigquery-bronze-layer".to_string(),
        data_domain: domain.to_string(),
        processing_tier: "bronze-ingestion".to_string(),
        downstream_datasets: vec![format!("{prefix}_silver"), "enterprise_gold".to_string()],
        downstream_marts: DOWNSTREAM_MARTS.iter().map(|m| m.to_string()).collect(),
        data_classification: classification.to_string(),
        contains_pii: pii,
    }
}
