use std::path::PathBuf;

use crate::error::{PromoreelError, Result};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_FONT_PATH: &str = "Montserrat-Bold.ttf";

/// Credentials and endpoints for all external collaborators, loaded
/// once at startup and injected into the clients that need them.
/// Nothing here is ever written back to disk.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub chat_model: String,
    pub drive: DriveConfig,
    pub gmail: GmailConfig,
    /// Font file used for caption rendering.
    pub font_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub access_token: String,
    pub parent_folder_id: String,
}

#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub access_token: String,
}

fn required(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| PromoreelError::MissingEnv { name })
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required: `OPENAI_API_KEY`, `DRIVE_ACCESS_TOKEN`,
    /// `DRIVE_PARENT_FOLDER_ID`, `GMAIL_ACCESS_TOKEN`.
    /// Optional: `PROMOREEL_CHAT_MODEL`, `PROMOREEL_FONT`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            chat_model: std::env::var("PROMOREEL_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            drive: DriveConfig {
                access_token: required("DRIVE_ACCESS_TOKEN")?,
                parent_folder_id: required("DRIVE_PARENT_FOLDER_ID")?,
            },
            gmail: GmailConfig {
                access_token: required("GMAIL_ACCESS_TOKEN")?,
            },
            font_path: std::env::var("PROMOREEL_FONT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_FONT_PATH)),
        })
    }
}
