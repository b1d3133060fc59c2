//! S3-backed artifact storage for nesting jobs.
//!
//! The storage layout is dictated by the surrounding system:
//! `{project}/nests/{job}/sheet_{n}.dxf` and
//! `{project}/nests/{job}/manifest.json`.

use std::time::Duration;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use log::debug;
use sheetnest::{NestError, Result};
use tokio::time::timeout;

/// Upper bound on any single storage operation.
const STORAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Storage key of a sheet drawing. `sheet_no` is 1-based.
pub fn sheet_key(project_id: &str, job_id: &str, sheet_no: usize) -> String {
    format!("{project_id}/nests/{job_id}/sheet_{sheet_no}.dxf")
}

/// Storage key of a job's manifest record.
pub fn manifest_key(project_id: &str, job_id: &str) -> String {
    format!("{project_id}/nests/{job_id}/manifest.json")
}

/// Thin wrapper over the S3 client, mapping failures and timeouts onto
/// [`Storage`](sheetnest::ErrorKind::Storage)-kind errors.
#[derive(Clone)]
pub struct ArtifactStore {
    client: S3Client,
    bucket: String,
}

impl ArtifactStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        ArtifactStore { client, bucket }
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        debug!("downloading s3://{}/{key}", self.bucket);
        let request = self.client.get_object().bucket(&self.bucket).key(key).send();
        let response = timeout(STORAGE_TIMEOUT, request)
            .await
            .map_err(|_| NestError::Download {
                key: key.to_string(),
                message: "timed out".to_string(),
            })?
            .map_err(|e| NestError::Download {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let body = timeout(STORAGE_TIMEOUT, response.body.collect())
            .await
            .map_err(|_| NestError::Download {
                key: key.to_string(),
                message: "timed out reading body".to_string(),
            })?
            .map_err(|e| NestError::Download {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(body.into_bytes().to_vec())
    }

    pub async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        debug!("uploading {} bytes to s3://{}/{key}", bytes.len(), self.bucket);
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send();
        timeout(STORAGE_TIMEOUT, request)
            .await
            .map_err(|_| NestError::Upload {
                key: key.to_string(),
                message: "timed out".to_string(),
            })?
            .map_err(|e| NestError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
