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

//! Maps object names to destination tables.
//!
//! Staged files follow a `{table}_{timestamp}.{extension}` naming convention.
//! The resolver first looks for a configured keyword anywhere in the
//! (lower-cased) object name. If none matches, it derives a candidate from the
//! leading segment(s) of the name and accepts it only if the candidate is
//! already a known table.

use crate::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// An ordered mapping from keyword to table name.
///
/// The order is the declaration order of the JSON object it was loaded from.
/// When several keywords occur in the same object name the first declared
/// keyword wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableMapping {
    entries: Vec<(String, String)>,
}

impl TableMapping {
    /// Creates a mapping from `(keyword, table)` pairs, preserving their order.
    ///
    /// Keywords are lower-cased, object names are compared in lower case.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Parses the `TABLE_MAPPING` JSON object, e.g. `{"contributors": "contributors"}`.
    pub fn from_json(value: &str) -> Result<Self> {
        serde_json::from_str(value).map_err(|e| {
            Error::config(format!(
                "TABLE_MAPPING is not a JSON object of strings: {e}"
            ))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The `(keyword, table)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if `table` is one of the mapped table names.
    pub fn contains_table(&self, table: &str) -> bool {
        self.entries.iter().any(|(_, v)| v == table)
    }
}

impl<'de> Deserialize<'de> for TableMapping {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = TableMapping;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map from keyword to table name")
            }

            // Visit entries as they appear in the document, a `HashMap` or
            // `BTreeMap` would lose the declaration order.
            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or_default());
                while let Some((k, v)) = map.next_entry::<String, String>()? {
                    entries.push((k, v));
                }
                Ok(TableMapping::new(entries))
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// How the fallback candidate is derived from the object name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SegmentRule {
    /// `contributors_20250101.csv` -> `contributors`
    #[default]
    First,
    /// `program_metadata_20250101.json` -> `program_metadata`
    FirstTwo,
}

impl SegmentRule {
    /// Derives the candidate table name from an object key.
    ///
    /// The extension is dropped by splitting on the first `.`, keys without
    /// a `.` are used whole.
    pub fn candidate<'a>(&self, object_key: &'a str) -> &'a str {
        let base = object_key.split('.').next().unwrap_or_default();
        let count = match self {
            Self::First => 1,
            Self::FirstTwo => 2,
        };
        match base.match_indices('_').nth(count - 1) {
            Some((end, _)) => &base[..end],
            None => base,
        }
    }
}

/// Resolves object keys to table names.
#[derive(Clone, Debug, Default)]
pub struct TableResolver {
    mapping: TableMapping,
    rule: SegmentRule,
}

impl TableResolver {
    pub fn new(mapping: TableMapping, rule: SegmentRule) -> Self {
        Self { mapping, rule }
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    /// Returns the destination table for `object_key`, or `None` if the
    /// object does not belong to any known table.
    pub fn resolve(&self, object_key: &str) -> Option<&str> {
        let lower = object_key.to_lowercase();
        if let Some((_, table)) = self.mapping.iter().find(|(k, _)| lower.contains(k)) {
            return Some(table);
        }
        let candidate = self.rule.candidate(object_key);
        self.mapping
            .iter()
            .map(|(_, table)| table)
            .find(|table| *table == candidate)
    }
}
