use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};
use tracing::{debug, info};

use crate::error::{PromoreelError, Result};
use crate::workdir::RunDir;

pub const OPENAI_IMAGE_URL: &str = "https://api.openai.com/v1/images/generations";
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

const IMAGE_MODEL: &str = "dall-e-2";
const IMAGE_SIZE: &str = "512x512";
const SPEECH_MODEL: &str = "tts-1";
const SPEECH_VOICE: &str = "echo";
/// Sample rate of the mp3 stream the speech endpoint returns.
const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// One scene's inputs, aligned explicitly rather than via directory
/// sort order: the image, the narration audio, and the caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAssets {
    pub image: PathBuf,
    pub speech: PathBuf,
    pub caption: String,
}

/// Client for the image and speech synthesis endpoints.
pub struct MediaClient {
    http: reqwest::Client,
    api_key: String,
    image_url: String,
    speech_url: String,
}

impl MediaClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            image_url: OPENAI_IMAGE_URL.to_string(),
            speech_url: OPENAI_SPEECH_URL.to_string(),
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn with_speech_url(mut self, url: impl Into<String>) -> Self {
        self.speech_url = url.into();
        self
    }

    async fn generate_image(&self, prompt: &str, index: usize, dest: &Path) -> Result<()> {
        let response = self
            .http
            .post(&self.image_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": IMAGE_MODEL,
                "prompt": prompt,
                "size": IMAGE_SIZE,
                "n": 1,
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let image_url =
            response["data"][0]["url"]
                .as_str()
                .ok_or_else(|| PromoreelError::ImageFailed {
                    index,
                    reason: format!("Invalid API response: {:?}", response),
                })?;

        let download = self.http.get(image_url).send().await?;
        if !download.status().is_success() {
            return Err(PromoreelError::ImageFailed {
                index,
                reason: format!("image download returned status {}", download.status()),
            });
        }
        fs::write(dest, download.bytes().await?).await?;
        Ok(())
    }

    /// Synthesize one square image per prompt into the run directory.
    /// Any failure aborts the whole run; there is no partial-image
    /// continuation.
    pub async fn generate_images(&self, prompts: &[String], run: &RunDir) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for (i, prompt) in prompts.iter().enumerate() {
            let dest = run.image_path(i);
            self.generate_image(prompt, i, &dest).await?;
            info!(index = i, "image generated");
            paths.push(dest);
        }
        Ok(paths)
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        index: usize,
        dest: &Path,
        speed: f64,
    ) -> Result<()> {
        let response = self
            .http
            .post(&self.speech_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": SPEECH_MODEL,
                "voice": SPEECH_VOICE,
                "input": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PromoreelError::SpeechFailed {
                index,
                reason: format!("speech endpoint returned status {}", response.status()),
            });
        }
        fs::write(dest, response.bytes().await?).await?;

        if speed != 1.0 {
            rescale_speed(dest, speed, index).await?;
        }
        Ok(())
    }

    /// Synthesize narration audio per pair into the run directory.
    pub async fn generate_speeches(
        &self,
        narrations: &[String],
        speed: f64,
        run: &RunDir,
    ) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for (i, narration) in narrations.iter().enumerate() {
            let dest = run.speech_path(i);
            self.synthesize_speech(narration, i, &dest, speed).await?;
            info!(index = i, "speech generated");
            paths.push(dest);
        }
        Ok(paths)
    }
}

/// Playback-speed rescale by sample-rate reinterpretation. No pitch
/// correction: the stream is retagged faster/slower, then resampled
/// back to the nominal rate.
async fn rescale_speed(path: &Path, speed: f64, index: usize) -> Result<()> {
    let scaled = path.with_extension("scaled.mp3");
    let filter = format!(
        "asetrate={},aresample={}",
        (SPEECH_SAMPLE_RATE as f64 * speed).round() as u32,
        SPEECH_SAMPLE_RATE
    );
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(path)
        .arg("-af")
        .arg(&filter)
        .arg(&scaled)
        .output()
        .await?;

    if !output.status.success() {
        return Err(PromoreelError::SpeechFailed {
            index,
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    fs::rename(&scaled, path).await?;
    debug!(?path, speed, "speech speed rescaled");
    Ok(())
}

/// Copy requester-supplied images into the run directory under
/// ordinal names (the alternate, non-generated image mode).
pub async fn copy_images(paths: &[PathBuf], run: &RunDir) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for (i, source) in paths.iter().enumerate() {
        let dest = run.image_path(i);
        fs::copy(source, &dest).await?;
        copied.push(dest);
    }
    Ok(copied)
}

/// Zip images, speeches, and captions into the ordered scene list.
/// The scene count is the minimum of the three inputs.
pub fn pair_assets(
    images: Vec<PathBuf>,
    speeches: Vec<PathBuf>,
    captions: Vec<String>,
) -> Vec<SceneAssets> {
    images
        .into_iter()
        .zip(speeches)
        .zip(captions)
        .map(|((image, speech), caption)| SceneAssets {
            image,
            speech,
            caption,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn pair_assets_zips_to_the_shortest_list() {
        let scenes = pair_assets(
            vec![PathBuf::from("i0"), PathBuf::from("i1")],
            vec![PathBuf::from("s0")],
            vec!["c0".into(), "c1".into()],
        );
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].image, PathBuf::from("i0"));
        assert_eq!(scenes[0].speech, PathBuf::from("s0"));
        assert_eq!(scenes[0].caption, "c0");
    }

    #[tokio::test]
    async fn generate_images_downloads_into_run_dir() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": format!("{}/file.png", server.uri()) }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let run = RunDir::create_in(tmp.path()).await.unwrap();
        let client = MediaClient::new(reqwest::Client::new(), "key")
            .with_image_url(format!("{}/images", server.uri()));

        let paths = client
            .generate_images(&["a bright sun".to_string()], &run)
            .await
            .unwrap();
        assert_eq!(paths, vec![run.image_path(0)]);
        assert_eq!(fs::read(&paths[0]).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn failed_image_download_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": format!("{}/missing.png", server.uri()) }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let run = RunDir::create_in(tmp.path()).await.unwrap();
        let client = MediaClient::new(reqwest::Client::new(), "key")
            .with_image_url(format!("{}/images", server.uri()));

        let err = client
            .generate_images(&["a bright sun".to_string()], &run)
            .await
            .unwrap_err();
        assert!(matches!(err, PromoreelError::ImageFailed { index: 0, .. }));
    }

    #[tokio::test]
    async fn speech_bytes_land_under_ordinal_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3-bytes".to_vec()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let run = RunDir::create_in(tmp.path()).await.unwrap();
        let client = MediaClient::new(reqwest::Client::new(), "key")
            .with_speech_url(format!("{}/speech", server.uri()));

        let paths = client
            .generate_speeches(&["one".to_string(), "two".to_string()], 1.0, &run)
            .await
            .unwrap();
        assert_eq!(paths, vec![run.speech_path(0), run.speech_path(1)]);
    }

    #[tokio::test]
    async fn copy_images_renames_to_ordinals() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunDir::create_in(tmp.path()).await.unwrap();
        let source = tmp.path().join("supplied.png");
        fs::write(&source, b"img").await.unwrap();

        let copied = copy_images(&[source], &run).await.unwrap();
        assert_eq!(copied, vec![run.image_path(0)]);
        assert!(copied[0].exists());
    }
}
