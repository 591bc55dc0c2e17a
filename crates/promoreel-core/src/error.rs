use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromoreelError {
    #[error("Missing configuration: {name} environment variable is not set")]
    MissingEnv { name: &'static str },

    #[error("Chat model call failed: {reason}")]
    ChatFailed { reason: String },

    #[error("Scrape failed for {url}: {reason}")]
    ScrapeFailed { url: String, reason: String },

    #[error("Transcript fetch failed for {url}: {reason}")]
    TranscriptFailed { url: String, reason: String },

    #[error("Script generation failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Image generation failed for pair {index}: {reason}")]
    ImageFailed { index: usize, reason: String },

    #[error("Speech synthesis failed for pair {index}: {reason}")]
    SpeechFailed { index: usize, reason: String },

    #[error("ffprobe failed for {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Video {stage} failed: {reason}")]
    RenderFailed { stage: &'static str, reason: String },

    #[error("Caption font not found: {0}")]
    FontNotFound(PathBuf),

    #[error("{tool} not found in PATH")]
    ToolNotFound { tool: &'static str },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Email send failed: {reason}")]
    EmailFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PromoreelError>;
