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

//! The interface to the data warehouse.
//!
//! The handler only needs three operations from the warehouse: submit a load
//! job, check on it, and count the rows in a table. [Warehouse] abstracts
//! them so the handler can be tested without a BigQuery project. The
//! production implementation lives in [crate::bigquery].

use crate::job::LoadJobSpec;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// A fully qualified table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new<P, D, T>(project: P, dataset: D, table: T) -> Self
    where
        P: Into<String>,
        D: Into<String>,
        T: Into<String>,
    {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Everything needed to start a load job.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub source_uri: String,
    pub destination: TableRef,
    pub spec: LoadJobSpec,
    /// Labels attached to the job, useful to find the job from the console.
    pub labels: BTreeMap<String, String>,
}

/// Identifies a submitted job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobHandle {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

/// The state of a submitted job, as reported by the warehouse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    /// The job completed successfully.
    Done { output_rows: Option<u64> },
    /// The job completed with an error.
    Failed { reason: String, message: String },
}

/// The operations the handler needs from the warehouse.
pub trait Warehouse: std::fmt::Debug + Send + Sync {
    /// Starts a load job. Returns as soon as the warehouse accepts the job.
    fn submit_load(
        &self,
        request: LoadRequest,
    ) -> impl std::future::Future<Output = Result<JobHandle>> + Send;

    /// Fetches the current state of a job.
    fn job_state(
        &self,
        job: &JobHandle,
    ) -> impl std::future::Future<Output = Result<JobState>> + Send;

    /// Reads the current number of rows in a table.
    fn table_row_count(
        &self,
        table: &TableRef,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

/// What to do when a load job outlives the wait deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Report [Error::Timeout].
    #[default]
    Fail,
    /// Stop waiting and let the job finish on its own.
    Detach,
}

// Zero or tiny delays would poll the warehouse in a tight loop.
const MINIMUM_DELAY: Duration = Duration::from_millis(100);

/// Controls how long, and how often, the handler polls a load job.
///
/// Delays shorter than 100ms are rounded up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub initial_delay: Duration,
    pub maximum_delay: Duration,
    /// `None` waits until the job finishes.
    pub timeout: Option<Duration>,
    pub on_timeout: TimeoutAction,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            maximum_delay: Duration::from_secs(10),
            // Cloud Run functions cap event-driven invocations at 9 minutes.
            timeout: Some(Duration::from_secs(9 * 60)),
            on_timeout: TimeoutAction::Fail,
        }
    }
}

impl WaitPolicy {
    pub fn with_timeout(mut self, v: Option<Duration>) -> Self {
        self.timeout = v;
        self
    }

    pub fn with_on_timeout(mut self, v: TimeoutAction) -> Self {
        self.on_timeout = v;
        self
    }

    pub fn with_delays(mut self, initial: Duration, maximum: Duration) -> Self {
        self.initial_delay = initial;
        self.maximum_delay = maximum.max(initial);
        self
    }
}

/// The result of waiting on a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitResult {
    Done { output_rows: Option<u64> },
    /// The deadline expired and the policy says to detach.
    Detached,
}

/// Polls `job` until it finishes, fails, or the policy's deadline expires.
///
/// A failed job is reported as [Error::LoadFailed]. Errors while polling are
/// not retried.
pub async fn wait_for_job<W>(
    warehouse: &W,
    job: &JobHandle,
    policy: &WaitPolicy,
) -> Result<WaitResult>
where
    W: Warehouse,
{
    // A deadline too far in the future to represent is no deadline.
    let deadline = policy.timeout.and_then(|t| Instant::now().checked_add(t));
    let maximum_delay = policy.maximum_delay.max(MINIMUM_DELAY);
    let mut delay = policy.initial_delay.clamp(MINIMUM_DELAY, maximum_delay);
    loop {
        match warehouse.job_state(job).await? {
            JobState::Done { output_rows } => return Ok(WaitResult::Done { output_rows }),
            JobState::Failed { reason, message } => {
                return Err(Error::LoadFailed {
                    job_id: job.job_id.clone(),
                    reason,
                    message,
                });
            }
            JobState::Pending | JobState::Running => {}
        }
        let sleep = match deadline {
            None => delay,
            Some(d) => {
                let remaining = d.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return expired(job, policy);
                }
                delay.min(remaining)
            }
        };
        tokio::time::sleep(sleep).await;
        delay = delay.saturating_mul(2).min(maximum_delay);
    }
}

fn expired(job: &JobHandle, policy: &WaitPolicy) -> Result<WaitResult> {
    match policy.on_timeout {
        TimeoutAction::Detach => Ok(WaitResult::Detached),
        TimeoutAction::Fail => Err(Error::Timeout {
            job_id: job.job_id.clone(),
            timeout: policy.timeout.unwrap_or_default(),
        }),
    }
}
