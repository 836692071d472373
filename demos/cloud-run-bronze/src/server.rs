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

//! Receives storage events over HTTP.
//!
//! Eventarc delivers CloudEvents either in binary mode (the attributes in
//! `ce-*` headers, the object payload as the body) or in structured mode
//! (the whole event as an `application/cloudevents+json` body). Both are
//! accepted on `POST /`.
//!
//! Any non-2xx response makes the trigger redeliver the event, subject to its
//! retry policy.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::post,
};
use bronze_ingest::event::{CloudEvent, StorageObjectData};
use bronze_ingest::warehouse::Warehouse;
use bronze_ingest::{Handler, Outcome};
use std::sync::Arc;

const STRUCTURED_MODE: &str = "application/cloudevents+json";

#[derive(thiserror::Error, Debug)]
enum RequestError {
    #[error("cannot parse the event payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Ingest(#[from] bronze_ingest::Error),
}

impl RequestError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Payload(_) => StatusCode::BAD_REQUEST,
            Self::Ingest(bronze_ingest::Error::MissingField(_)) => StatusCode::BAD_REQUEST,
            Self::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn router<W>(handler: Arc<Handler<W>>) -> Router
where
    W: Warehouse + 'static,
{
    Router::new()
        .route("/", post(receive::<W>))
        .with_state(handler)
}

async fn receive<W>(
    State(handler): State<Arc<Handler<W>>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String)
where
    W: Warehouse + 'static,
{
    match receive_impl(&handler, &headers, &body).await {
        Ok(outcome) => describe(outcome),
        Err(e) => (e.status(), e.to_string()),
    }
}

async fn receive_impl<W>(
    handler: &Handler<W>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Outcome, RequestError>
where
    W: Warehouse,
{
    let (trigger_id, data) = parse_event(headers, body)?;
    let outcome = handler.handle_object(&trigger_id, data).await?;
    Ok(outcome)
}

fn parse_event(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(String, StorageObjectData), RequestError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.starts_with(STRUCTURED_MODE) {
        let event = serde_json::from_slice::<CloudEvent>(body)?;
        return Ok((trigger_id(Some(event.id)), event.data));
    }
    let id = headers
        .get("ce-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let data = serde_json::from_slice::<StorageObjectData>(body)?;
    Ok((trigger_id(id), data))
}

// Lineage records need an execution id, make one up if the event has none.
fn trigger_id(id: Option<String>) -> String {
    id.filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn describe(outcome: Outcome) -> (StatusCode, String) {
    match outcome {
        Outcome::Skipped { object_key } => {
            (StatusCode::OK, format!("no table mapping for {object_key}"))
        }
        Outcome::Loaded(summary) => (
            StatusCode::OK,
            format!(
                "loaded {} into {}, the table has {} rows",
                summary
                    .rows_loaded
                    .map(|n| format!("{n} rows"))
                    .unwrap_or_else(|| "an unknown number of rows".into()),
                summary.destination,
                summary.total_rows
            ),
        ),
        Outcome::Detached {
            job_id,
            destination,
        } => (
            StatusCode::ACCEPTED,
            format!("load job {job_id} into {destination} is still running"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use bronze_ingest::warehouse::{
        JobHandle, JobState, LoadRequest, TableRef, TimeoutAction, WaitPolicy,
    };
    use bronze_ingest::{Config, Profile};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use test_case::test_case;
    use tower::ServiceExt;

    type TestResult = anyhow::Result<()>;

    /// Accepts every load and reports five new rows per job.
    #[derive(Debug, Default)]
    struct FakeWarehouse {
        failure: Option<String>,
        /// Jobs never finish.
        stuck: bool,
        loads: Mutex<Vec<LoadRequest>>,
    }

    impl Warehouse for FakeWarehouse {
        async fn submit_load(&self, request: LoadRequest) -> bronze_ingest::Result<JobHandle> {
            let mut loads = self.loads.lock().unwrap();
            loads.push(request);
            Ok(JobHandle {
                project_id: "test-project".into(),
                job_id: format!("job-{}", loads.len()),
                location: None,
            })
        }

        async fn job_state(&self, _job: &JobHandle) -> bronze_ingest::Result<JobState> {
            if self.stuck {
                return Ok(JobState::Running);
            }
            let state = match &self.failure {
                None => JobState::Done {
                    output_rows: Some(5),
                },
                Some(message) => JobState::Failed {
                    reason: "invalid".into(),
                    message: message.clone(),
                },
            };
            Ok(state)
        }

        async fn table_row_count(&self, _table: &TableRef) -> bronze_ingest::Result<u64> {
            let loads = self.loads.lock().unwrap();
            Ok(5 * loads.len() as u64)
        }
    }

    fn app(warehouse: FakeWarehouse) -> anyhow::Result<(Router, Arc<Handler<FakeWarehouse>>)> {
        app_with_wait(warehouse, WaitPolicy::default())
    }

    fn app_with_wait(
        warehouse: FakeWarehouse,
        wait: WaitPolicy,
    ) -> anyhow::Result<(Router, Arc<Handler<FakeWarehouse>>)> {
        let config = Config::builder("test-project", Profile::contributor())
            .with_table_mapping_json(r#"{"contributors": "contributors"}"#)?
            .with_wait_policy(wait)
            .build();
        let handler = Arc::new(Handler::new(config, warehouse));
        Ok((router(handler.clone()), handler))
    }

    fn binary_mode(body: serde_json::Value) -> anyhow::Result<Request<Body>> {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .header("ce-id", "event-123")
            .header("ce-type", "google.cloud.storage.object.v1.finalized")
            .body(Body::from(body.to_string()))?;
        Ok(request)
    }

    async fn send(app: Router, request: Request<Body>) -> anyhow::Result<(StatusCode, String)> {
        let response = app.oneshot(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8(body.to_vec())?))
    }

    #[tokio::test]
    async fn binary_mode_loads() -> TestResult {
        let (app, handler) = app(FakeWarehouse::default())?;
        let request = binary_mode(json!({
            "bucket": "staging-bucket",
            "name": "contributors_20250101_120000.csv",
            "contentType": "text/csv",
        }))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(
            body,
            "loaded 5 rows into test-project.contributor_bronze.contributors, the table has 5 rows"
        );

        let loads = handler.warehouse().loads.lock().unwrap().clone();
        assert_eq!(loads.len(), 1);
        assert_eq!(
            loads[0].source_uri,
            "gs://staging-bucket/contributors_20250101_120000.csv"
        );
        Ok(())
    }

    #[tokio::test]
    async fn structured_mode_loads() -> TestResult {
        let (app, handler) = app(FakeWarehouse::default())?;
        let event = json!({
            "specversion": "1.0",
            "id": "event-456",
            "source": "//storage.googleapis.com/projects/_/buckets/staging-bucket",
            "type": "google.cloud.storage.object.v1.finalized",
            "data": {"bucket": "staging-bucket", "name": "contributors_001.csv"},
        });
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/cloudevents+json; charset=utf-8")
            .body(Body::from(event.to_string()))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(handler.warehouse().loads.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unmapped_objects_are_acknowledged() -> TestResult {
        let (app, handler) = app(FakeWarehouse::default())?;
        let request = binary_mode(json!({
            "bucket": "staging-bucket",
            "name": "unknownthing_001.csv",
        }))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body.contains("unknownthing_001.csv"), "{body}");
        assert!(handler.warehouse().loads.lock().unwrap().is_empty());
        Ok(())
    }

    #[test_case(json!({"bucket": "staging-bucket"}))]
    #[test_case(json!({"name": "contributors_001.csv"}))]
    #[test_case(json!({"bucket": "", "name": "contributors_001.csv"}))]
    #[tokio::test]
    async fn missing_fields_are_bad_requests(body: serde_json::Value) -> TestResult {
        let (app, handler) = app(FakeWarehouse::default())?;
        let (status, body) = send(app, binary_mode(body)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(handler.warehouse().loads.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_payload_is_a_bad_request() -> TestResult {
        let (app, _) = app(FakeWarehouse::default())?;
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        Ok(())
    }

    #[tokio::test]
    async fn load_failures_are_server_errors() -> TestResult {
        let (app, _) = app(FakeWarehouse {
            failure: Some("Error while reading data".into()),
            ..Default::default()
        })?;
        let request = binary_mode(json!({
            "bucket": "staging-bucket",
            "name": "contributors_001.csv",
        }))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
        assert!(body.contains("Error while reading data"), "{body}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn detached_loads_are_accepted() -> TestResult {
        let wait = WaitPolicy::default()
            .with_timeout(Some(Duration::from_secs(5)))
            .with_on_timeout(TimeoutAction::Detach);
        let warehouse = FakeWarehouse {
            stuck: true,
            ..Default::default()
        };
        let (app, handler) = app_with_wait(warehouse, wait)?;
        let request = binary_mode(json!({
            "bucket": "staging-bucket",
            "name": "contributors_001.csv",
        }))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::ACCEPTED, "{body}");
        assert_eq!(
            body,
            "load job job-1 into test-project.contributor_bronze.contributors is still running"
        );
        assert_eq!(handler.warehouse().loads.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_loads_are_server_errors() -> TestResult {
        let wait = WaitPolicy::default().with_timeout(Some(Duration::from_secs(5)));
        let warehouse = FakeWarehouse {
            stuck: true,
            ..Default::default()
        };
        let (app, _) = app_with_wait(warehouse, wait)?;
        let request = binary_mode(json!({
            "bucket": "staging-bucket",
            "name": "contributors_001.csv",
        }))?;
        let (status, body) = send(app, request).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
        Ok(())
    }

    #[test]
    fn event_trigger_id() {
        assert_eq!(trigger_id(Some("event-1".to_string())), "event-1");
    }

    #[test_case(None)]
    #[test_case(Some(""))]
    fn generated_trigger_ids(input: Option<&str>) {
        let got = trigger_id(input.map(str::to_string));
        assert_eq!(got.len(), 36, "{got}");
    }
}
