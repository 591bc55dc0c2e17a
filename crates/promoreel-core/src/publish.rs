use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::config::DriveConfig;
use crate::error::{PromoreelError, Result};

pub const DRIVE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id";

/// Google Drive uploader for the finished video.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
    parent_folder_id: String,
    upload_url: String,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, config: &DriveConfig) -> Self {
        Self {
            http,
            access_token: config.access_token.clone(),
            parent_folder_id: config.parent_folder_id.clone(),
            upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Upload a local file into the configured parent folder and
    /// return the remote file id.
    pub async fn upload(&self, path: &Path, name: &str) -> Result<String> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [self.parent_folder_id],
        });
        let bytes = fs::read(path).await?;
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(name.to_string())
                    .mime_str("video/mp4")?,
            );

        let response = self
            .http
            .post(&self.upload_url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PromoreelError::UploadFailed {
                reason: format!("upload returned status {}", response.status()),
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        let id = body["id"].as_str().ok_or_else(|| PromoreelError::UploadFailed {
            reason: format!("no file id in upload response: {:?}", body),
        })?;
        info!(file_id = id, "video uploaded");
        Ok(id.to_string())
    }
}

/// Shareable link for an uploaded file.
pub fn share_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view?usp=sharing", file_id)
}

/// Status line reported to the requester after a successful upload.
pub fn video_status(link: &str) -> String {
    format!("Video generated, link to video: {}", link)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn share_link_wraps_the_file_id() {
        assert_eq!(
            share_link("abc123"),
            "https://drive.google.com/file/d/abc123/view?usp=sharing"
        );
    }

    #[test]
    fn status_line_carries_the_link() {
        let status = video_status(&share_link("abc123"));
        assert!(status.starts_with("Video generated"));
        assert!(status.contains("abc123"));
    }

    #[tokio::test]
    async fn upload_returns_remote_file_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("Authorization", "Bearer drive-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "remote-1"})),
            )
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let video = tmp.path().join("video.mp4");
        fs::write(&video, b"mp4").await.unwrap();

        let client = DriveClient::new(
            reqwest::Client::new(),
            &DriveConfig {
                access_token: "drive-token".into(),
                parent_folder_id: "folder-1".into(),
            },
        )
        .with_upload_url(format!("{}/upload", server.uri()));

        let id = client.upload(&video, "video").await.unwrap();
        assert_eq!(id, "remote-1");
    }

    #[tokio::test]
    async fn upload_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let video = tmp.path().join("video.mp4");
        fs::write(&video, b"mp4").await.unwrap();

        let client = DriveClient::new(
            reqwest::Client::new(),
            &DriveConfig {
                access_token: "t".into(),
                parent_folder_id: "f".into(),
            },
        )
        .with_upload_url(format!("{}/upload", server.uri()));

        assert!(matches!(
            client.upload(&video, "video").await,
            Err(PromoreelError::UploadFailed { .. })
        ));
    }
}
