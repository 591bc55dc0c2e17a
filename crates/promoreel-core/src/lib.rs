//! Promoreel Core Library
//!
//! Core functionality for researching a topic on a company website,
//! generating a narrated two-scene promo script, synthesizing images
//! and speech, compositing a captioned video with ffmpeg, and
//! delivering the result via Google Drive and Gmail.

pub mod captions;
pub mod compose;
pub mod config;
pub mod error;
pub mod keywords;
pub mod llm;
pub mod media;
pub mod notify;
pub mod pipeline;
pub mod probe;
pub mod publish;
pub mod research;
pub mod scrape;
pub mod script;
pub mod transcript;
pub mod workdir;

// Re-export commonly used items at crate root
pub use compose::{VideoOptions, compose_video};
pub use config::Config;
pub use error::{PromoreelError, Result};
pub use llm::{ChatModel, OpenAiChat};
pub use media::{MediaClient, SceneAssets, copy_images, pair_assets};
pub use notify::{EMAIL_SUBJECT, GmailClient, recipient_name, render_email_body};
pub use pipeline::{RunOutcome, RunRequest, run};
pub use publish::{DriveClient, share_link, video_status};
pub use research::{SourceSummary, run_research};
pub use scrape::scraping_client;
pub use script::{ScenePair, generate_script, parse_script};
pub use workdir::RunDir;
