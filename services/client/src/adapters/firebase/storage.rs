//! services/client/src/adapters/firebase/storage.rs
//!
//! The `BlobStorage` port on top of the Firebase Storage REST API. Locations
//! handed out are token-bearing download URLs; delete and fetch accept either
//! such a URL or a bare object path.

use super::{read_json, FirebaseAuth};
use async_trait::async_trait;
use bytes::Bytes;
use crybaby_core::domain::UploadFile;
use crybaby_core::ports::{BlobStorage, PortError, PortResult};
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct FirebaseStorage {
    http: Client,
    auth: Arc<FirebaseAuth>,
    bucket: String,
}

impl FirebaseStorage {
    pub fn new(http: Client, auth: Arc<FirebaseAuth>, bucket: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            bucket: bucket.into(),
        }
    }

    /// `{base}/b/{bucket}/o`
    fn objects_root(&self) -> String {
        format!(
            "{}/b/{}/o",
            self.auth.endpoints().storage,
            urlencoding::encode(&self.bucket)
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_root(), urlencoding::encode(path))
    }

    /// Recovers the object path from a download URL produced by `upload`, or
    /// returns the input unchanged if it is already a path.
    pub fn object_path(&self, location: &str) -> PortResult<String> {
        let root = format!("{}/", self.objects_root());
        match location.strip_prefix(&root) {
            Some(rest) => {
                let encoded = rest.split('?').next().unwrap_or(rest);
                urlencoding::decode(encoded)
                    .map(|p| p.into_owned())
                    .map_err(|e| PortError::Malformed(format!("bad object path: {}", e)))
            }
            None if location.contains("://") => Err(PortError::Malformed(format!(
                "{} is not a location in bucket {}",
                location, self.bucket
            ))),
            None => Ok(location.to_string()),
        }
    }

    async fn with_token(&self, builder: RequestBuilder) -> PortResult<RequestBuilder> {
        let token = self.auth.id_token().await?;
        Ok(builder.header(header::AUTHORIZATION, format!("Firebase {}", token)))
    }
}

#[async_trait]
impl BlobStorage for FirebaseStorage {
    async fn upload(&self, path: &str, file: &UploadFile) -> PortResult<String> {
        let url = format!(
            "{}?uploadType=media&name={}",
            self.objects_root(),
            urlencoding::encode(path)
        );
        let request = self
            .with_token(
                self.http
                    .post(url)
                    .header(header::CONTENT_TYPE, file.content_type.as_str())
                    .body(file.bytes.clone()),
            )
            .await?;
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let metadata = read_json(response).await?;

        let name = metadata
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(path);
        let mut location = format!("{}?alt=media", self.object_url(name));
        if let Some(token) = metadata
            .get("downloadTokens")
            .and_then(Value::as_str)
            .and_then(|t| t.split(',').next())
            .filter(|t| !t.is_empty())
        {
            location.push_str("&token=");
            location.push_str(token);
        }
        info!("Uploaded {} ({} bytes)", name, file.bytes.len());
        Ok(location)
    }

    async fn delete(&self, location: &str) -> PortResult<()> {
        let path = self.object_path(location)?;
        let request = self.with_token(self.http.delete(self.object_url(&path))).await?;
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        read_json(response).await?;
        Ok(())
    }

    async fn fetch(&self, location: &str) -> PortResult<Bytes> {
        let path = self.object_path(location)?;
        let url = format!("{}?alt=media", self.object_url(&path));
        let request = self.with_token(self.http.get(url)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if !response.status().is_success() {
            return Err(read_json(response)
                .await
                .err()
                .unwrap_or_else(|| PortError::Unexpected("download failed".to_string())));
        }
        response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
