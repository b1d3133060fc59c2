//! The polling worker: claims nesting jobs from SQS, runs the pipeline and
//! reports job status to the output queue.
//!
//! One job is processed at a time, to completion or failure, before polling
//! resumes. A failure in one job never takes the loop down; horizontal
//! scaling is achieved by running more worker processes competing on the
//! same queue, not by concurrency inside this one.

use std::time::{SystemTime, UNIX_EPOCH};

use aws_sdk_sqs::Client as SqsClient;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use sheetnest::blf;
use sheetnest::entities::{NestJob, NestSolution, NestableItem};
use sheetnest::NestError;
use sheetnest_dxf::export::{drawing_to_bytes, sheet_to_drawing};
use sheetnest_dxf::extract::{primary_outline, read_outlines};
use sheetnest_dxf::manifest::NestManifest;
use tokio::sync::broadcast;

use crate::storage::{manifest_key, sheet_key, ArtifactStore};

fn default_spacing() -> f64 {
    5.0
}

fn default_rotation() -> bool {
    true
}

/// Job descriptor consumed from the input queue. Validated once at intake;
/// `spacing` and `rotationAllowed` are optional with engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestJobRequest {
    /// Unique identifier of the job.
    pub job_id: String,
    /// Project the artifacts are grouped under in storage.
    pub project_id: String,
    /// Sheet width in mm.
    pub sheet_width: f64,
    /// Sheet height in mm.
    pub sheet_height: f64,
    /// Minimum gap between parts in mm (default 5.0).
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Whether parts may be rotated by 90° (default true).
    #[serde(default = "default_rotation")]
    pub rotation_allowed: bool,
    /// Parts to nest, in order.
    pub parts: Vec<NestPartRequest>,
}

/// One part entry of a job descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestPartRequest {
    /// Source part identifier, used for labeling.
    pub ref_id: String,
    /// Storage key of the part's flat-pattern drawing.
    pub file_key: String,
    /// Requested quantity, at least 1.
    pub quantity: usize,
}

/// Job lifecycle states visible to the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Status message emitted to the output queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestJobStatus {
    pub job_id: String,
    pub status: JobState,
    /// Overall utilization percentage; present when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
    /// Number of sheets produced; present when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_count: Option<usize>,
    /// Storage key of the manifest; present when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_key: Option<String>,
    /// Human-readable failure description; present when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Seconds since epoch.
    pub timestamp: u64,
}

impl NestJobStatus {
    pub fn processing(job_id: &str) -> Self {
        NestJobStatus {
            job_id: job_id.to_string(),
            status: JobState::Processing,
            utilization: None,
            sheet_count: None,
            manifest_key: None,
            error_message: None,
            timestamp: current_timestamp(),
        }
    }

    pub fn completed(job_id: &str, utilization: f64, sheet_count: usize, manifest: String) -> Self {
        NestJobStatus {
            job_id: job_id.to_string(),
            status: JobState::Completed,
            utilization: Some(utilization),
            sheet_count: Some(sheet_count),
            manifest_key: Some(manifest),
            error_message: None,
            timestamp: current_timestamp(),
        }
    }

    pub fn failed(job_id: &str, error: &NestError) -> Self {
        NestJobStatus {
            job_id: job_id.to_string(),
            status: JobState::Failed,
            utilization: None,
            sheet_count: None,
            manifest_key: None,
            error_message: Some(error.to_string()),
            timestamp: current_timestamp(),
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Everything a successful pipeline run produces, ready to persist.
pub struct JobArtifacts {
    pub solution: NestSolution,
    /// `(storage key, DXF bytes)` per sheet, in sheet order.
    pub sheet_drawings: Vec<(String, Vec<u8>)>,
    pub manifest: NestManifest,
    pub manifest_key: String,
    pub manifest_bytes: Vec<u8>,
}

/// Runs extract → pack → export for one job. `inputs` holds the downloaded
/// drawing bytes, one entry per part in descriptor order. No storage or
/// queue access happens here.
pub fn run_pipeline(request: &NestJobRequest, inputs: &[Vec<u8>]) -> Result<JobArtifacts, NestError> {
    if inputs.len() != request.parts.len() {
        return Err(NestError::InvalidJob {
            message: format!(
                "job '{}': {} inputs for {} parts",
                request.job_id,
                inputs.len(),
                request.parts.len()
            ),
        });
    }

    let mut items = Vec::with_capacity(request.parts.len());
    for (part, bytes) in request.parts.iter().zip(inputs) {
        let outlines = read_outlines(bytes, &part.file_key)?;
        let outline = primary_outline(outlines, &part.file_key)?;
        items.push(NestableItem::new(part.ref_id.clone(), outline, part.quantity)?);
    }

    let job = NestJob::new(
        request.sheet_width,
        request.sheet_height,
        request.spacing,
        request.rotation_allowed,
        items,
    )?;
    let solution = blf::pack(&job)?;

    let sheet_keys: Vec<String> = (1..=solution.sheets.len())
        .map(|n| sheet_key(&request.project_id, &request.job_id, n))
        .collect();

    let mut sheet_drawings = Vec::with_capacity(solution.sheets.len());
    for (sheet, key) in solution.sheets.iter().zip(&sheet_keys) {
        let drawing = sheet_to_drawing(sheet, &job.items);
        sheet_drawings.push((key.clone(), drawing_to_bytes(&drawing)?));
    }

    let manifest = NestManifest::new(&request.job_id, &solution, &sheet_keys);
    let manifest_key = manifest_key(&request.project_id, &request.job_id);
    let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| NestError::Upload {
        key: manifest_key.clone(),
        message: e.to_string(),
    })?;

    Ok(JobArtifacts {
        solution,
        sheet_drawings,
        manifest,
        manifest_key,
        manifest_bytes,
    })
}

/// SQS worker processing nesting jobs one at a time.
#[derive(Clone)]
pub struct NestWorker {
    sqs_client: SqsClient,
    store: ArtifactStore,
    input_queue_url: String,
    output_queue_url: String,
}

impl NestWorker {
    pub fn new(
        sqs_client: SqsClient,
        store: ArtifactStore,
        input_queue_url: String,
        output_queue_url: String,
    ) -> Self {
        NestWorker {
            sqs_client,
            store,
            input_queue_url,
            output_queue_url,
        }
    }

    /// Poll loop: long-polls the input queue, claims one message at a time
    /// and processes it to completion before polling again. Exits only on
    /// shutdown signal.
    pub async fn listen_and_process(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        info!("worker polling queue: {}", self.input_queue_url);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("received shutdown signal");
                    break;
                }
                result = self.sqs_client
                    .receive_message()
                    .queue_url(&self.input_queue_url)
                    .max_number_of_messages(1)
                    .wait_time_seconds(20)
                    .send() => {
                    let response = match result {
                        Ok(response) => response,
                        Err(e) => {
                            error!("failed to receive messages: {e}");
                            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                            continue;
                        }
                    };

                    let Some(messages) = response.messages else {
                        continue;
                    };

                    for message in messages {
                        let Some(receipt_handle) = message.receipt_handle() else {
                            error!("message missing receipt handle, skipping");
                            continue;
                        };
                        let Some(body) = message.body() else {
                            error!("message missing body, skipping");
                            continue;
                        };

                        // deleting the message claims the job; the queue
                        // guarantees no other worker holds it
                        if let Err(e) = self
                            .sqs_client
                            .delete_message()
                            .queue_url(&self.input_queue_url)
                            .receipt_handle(receipt_handle)
                            .send()
                            .await
                        {
                            error!("failed to claim message: {e}");
                            continue;
                        }

                        self.process_message(body).await;
                    }
                }
            }
        }

        info!("worker exiting gracefully");
        Ok(())
    }

    /// Processes one claimed message. Never returns an error: every failure
    /// is reported as a `failed` job status so the loop keeps polling.
    pub async fn process_message(&self, body: &str) {
        let request: NestJobRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                error!(
                    "undecodable job descriptor: {e}. Body (first 200 chars): {}",
                    body.chars().take(200).collect::<String>()
                );
                // report the failure if the body at least carries a job id
                if let Ok(partial) = serde_json::from_str::<serde_json::Value>(body) {
                    if let Some(job_id) = partial.get("jobId").and_then(|v| v.as_str()) {
                        let err = NestError::InvalidJob {
                            message: e.to_string(),
                        };
                        self.send_status(&NestJobStatus::failed(job_id, &err)).await;
                    }
                }
                return;
            }
        };

        info!(
            "processing job '{}' ({} part(s), sheet {} x {} mm)",
            request.job_id,
            request.parts.len(),
            request.sheet_width,
            request.sheet_height
        );
        self.send_status(&NestJobStatus::processing(&request.job_id)).await;

        match self.process_job(&request).await {
            Ok(status) => {
                info!(
                    "job '{}' completed: {} sheet(s), {:.2}% utilization",
                    request.job_id,
                    status.sheet_count.unwrap_or(0),
                    status.utilization.unwrap_or(0.0)
                );
                self.send_status(&status).await;
            }
            Err(err) => {
                error!("job '{}' failed ({:?}): {err}", request.job_id, err.kind());
                self.send_status(&NestJobStatus::failed(&request.job_id, &err)).await;
            }
        }
    }

    /// Downloads inputs, runs the pipeline and persists the artifacts.
    /// Any error aborts the whole job; partial output is never reported
    /// as completed.
    async fn process_job(&self, request: &NestJobRequest) -> Result<NestJobStatus, NestError> {
        let mut inputs = Vec::with_capacity(request.parts.len());
        for part in &request.parts {
            inputs.push(self.store.download(&part.file_key).await?);
        }

        let artifacts = run_pipeline(request, &inputs)?;

        for (key, bytes) in &artifacts.sheet_drawings {
            self.store.upload(key, bytes.clone()).await?;
        }
        self.store
            .upload(&artifacts.manifest_key, artifacts.manifest_bytes.clone())
            .await?;

        Ok(NestJobStatus::completed(
            &request.job_id,
            artifacts.manifest.utilization,
            artifacts.manifest.total_sheets,
            artifacts.manifest_key.clone(),
        ))
    }

    /// Best-effort status emit; a reporting failure is logged, not fatal.
    async fn send_status(&self, status: &NestJobStatus) {
        let body = match serde_json::to_string(status) {
            Ok(body) => body,
            Err(e) => {
                error!("failed to serialize status for job '{}': {e}", status.job_id);
                return;
            }
        };

        if let Err(e) = self
            .sqs_client
            .send_message()
            .queue_url(&self.output_queue_url)
            .message_body(&body)
            .send()
            .await
        {
            warn!("failed to report status for job '{}': {e}", status.job_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_apply_when_fields_are_omitted() {
        let body = r#"{
            "jobId": "job-1",
            "projectId": "proj-1",
            "sheetWidth": 1220.0,
            "sheetHeight": 2440.0,
            "parts": [
                { "refId": "p1", "fileKey": "proj-1/parts/p1.dxf", "quantity": 2 }
            ]
        }"#;

        let request: NestJobRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.spacing, 5.0);
        assert!(request.rotation_allowed);
        assert_eq!(request.parts.len(), 1);
        assert_eq!(request.parts[0].quantity, 2);
    }

    #[test]
    fn descriptor_honors_explicit_fields() {
        let body = r#"{
            "jobId": "job-2",
            "projectId": "proj-1",
            "sheetWidth": 1000.0,
            "sheetHeight": 500.0,
            "spacing": 8.0,
            "rotationAllowed": false,
            "parts": []
        }"#;

        let request: NestJobRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.spacing, 8.0);
        assert!(!request.rotation_allowed);
    }

    #[test]
    fn completed_status_serializes_the_result_fields() {
        let status = NestJobStatus::completed("job-1", 42.5, 2, "p/nests/job-1/manifest.json".into());
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"completed\""));
        assert!(json.contains("\"utilization\":42.5"));
        assert!(json.contains("\"sheetCount\":2"));
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn failed_status_carries_the_error_message() {
        let err = NestError::NoClosedRing {
            source_ref: "p1.dxf".to_string(),
            open_chains: 1,
        };
        let status = NestJobStatus::failed("job-1", &err);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("p1.dxf"));
        assert!(!json.contains("utilization"));
    }
}
