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

//! Load job configuration.
//!
//! A [LoadJobSpec] describes *how* the warehouse should read a staged file.
//! It is built fresh for each event and discarded once the job is submitted.

/// The column that carries Datastream-style metadata.
pub const DATASTREAM_METADATA: &str = "_datastream_metadata";

const SUPPORTED_EXTENSIONS: [&str; 4] = ["csv", "json", "avro", "parquet"];

/// The file formats understood by the load job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    NewlineDelimitedJson,
    Avro,
    Parquet,
}

impl SourceFormat {
    /// The name used by the BigQuery API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::NewlineDelimitedJson => "NEWLINE_DELIMITED_JSON",
            Self::Avro => "AVRO",
            Self::Parquet => "PARQUET",
        }
    }

    /// Self-describing formats carry their own schema.
    pub fn is_self_describing(&self) -> bool {
        matches!(self, Self::Avro | Self::Parquet)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bronze tables are append-only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteDisposition {
    #[default]
    Append,
}

impl WriteDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "WRITE_APPEND",
        }
    }
}

/// Missing tables are created by the load job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CreateDisposition {
    #[default]
    CreateIfNeeded,
}

impl CreateDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateIfNeeded => "CREATE_IF_NEEDED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
    Record,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Record => "RECORD",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl FieldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nullable => "NULLABLE",
            Self::Required => "REQUIRED",
            Self::Repeated => "REPEATED",
        }
    }
}

/// A column in an explicit table schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub mode: FieldMode,
    /// Sub-fields, only used by [FieldType::Record].
    pub fields: Vec<FieldSpec>,
}

impl FieldSpec {
    pub fn nullable<T: Into<String>>(name: T, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: FieldMode::Nullable,
            fields: Vec::new(),
        }
    }

    pub fn required<T: Into<String>>(name: T, field_type: FieldType) -> Self {
        Self {
            mode: FieldMode::Required,
            ..Self::nullable(name, field_type)
        }
    }

    pub fn record<T, I>(name: T, fields: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = FieldSpec>,
    {
        Self {
            fields: fields.into_iter().collect(),
            ..Self::nullable(name, FieldType::Record)
        }
    }

    /// The nullable record holding the source timestamp and log file name.
    pub fn datastream_metadata() -> Self {
        Self::record(
            DATASTREAM_METADATA,
            [
                Self::nullable("source_timestamp", FieldType::Timestamp),
                Self::nullable("log_file", FieldType::String),
            ],
        )
    }
}

/// The configuration of a single load job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadJobSpec {
    pub source_format: SourceFormat,
    /// Header rows to skip, only meaningful for CSV.
    pub skip_leading_rows: Option<u32>,
    /// `None` when auto-detection does not apply to the format.
    pub autodetect: Option<bool>,
    pub write_disposition: WriteDisposition,
    pub create_disposition: CreateDisposition,
    /// An explicit schema, empty when the warehouse infers it.
    pub schema: Vec<FieldSpec>,
}

impl LoadJobSpec {
    fn new(source_format: SourceFormat) -> Self {
        Self {
            source_format,
            skip_leading_rows: None,
            autodetect: None,
            write_disposition: WriteDisposition::Append,
            create_disposition: CreateDisposition::CreateIfNeeded,
            schema: Vec::new(),
        }
    }

    /// CSV with a header row and an inferred schema.
    pub fn csv_with_header() -> Self {
        Self {
            skip_leading_rows: Some(1),
            autodetect: Some(true),
            ..Self::new(SourceFormat::Csv)
        }
    }

    /// Picks the configuration for a (lower-case) file extension.
    ///
    /// Unknown extensions load as headerless CSV with an inferred schema.
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "csv" => Self::csv_with_header(),
            "json" => Self {
                autodetect: Some(true),
                ..Self::new(SourceFormat::NewlineDelimitedJson)
            },
            "avro" => Self::new(SourceFormat::Avro),
            "parquet" => Self::new(SourceFormat::Parquet),
            _ => Self {
                autodetect: Some(true),
                ..Self::new(SourceFormat::Csv)
            },
        }
    }

    /// Replaces schema inference with an explicit schema.
    ///
    /// An empty `fields` leaves the job unchanged.
    pub fn with_schema<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        let fields = fields.into_iter().collect::<Vec<_>>();
        if fields.is_empty() {
            return self;
        }
        self.schema = fields;
        if !self.source_format.is_self_describing() {
            self.autodetect = Some(false);
        }
        self
    }

    /// Returns true if the warehouse infers the schema for this job.
    pub fn autodetect_enabled(&self) -> bool {
        self.autodetect == Some(true)
    }

    /// Appends the [DATASTREAM_METADATA] record to an explicit schema.
    ///
    /// Jobs that infer their schema, and jobs without an explicit schema, are
    /// returned unchanged. The record is never added twice.
    pub fn with_datastream_metadata(mut self) -> Self {
        if self.autodetect_enabled() || self.schema.is_empty() {
            return self;
        }
        if self.schema.iter().any(|f| f.name == DATASTREAM_METADATA) {
            return self;
        }
        self.schema.push(FieldSpec::datastream_metadata());
        self
    }
}

/// Returns true for the extensions with a dedicated load configuration.
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}
