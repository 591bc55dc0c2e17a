use std::path::PathBuf;

use tracing::{info, warn};

use crate::compose::{VideoOptions, compose_video};
use crate::config::Config;
use crate::error::{PromoreelError, Result};
use crate::llm::ChatModel;
use crate::media::{MediaClient, SceneAssets, copy_images, pair_assets};
use crate::notify::{EMAIL_SUBJECT, GmailClient, recipient_name, render_email_body};
use crate::publish::{DriveClient, share_link, video_status};
use crate::research::run_research;
use crate::scrape::scraping_client;
use crate::script::{ScenePair, generate_script, parse_script};
use crate::workdir::RunDir;

/// One request to the pipeline: the subject, the site to research,
/// and the address to report to.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub topic: String,
    pub url: String,
    pub email: String,
    /// When non-empty, these files are used as the scene images
    /// instead of generated ones.
    pub image_paths: Vec<PathBuf>,
    /// Playback speed applied to synthesized speech.
    pub speech_speed: f64,
}

impl RunRequest {
    pub fn new(topic: impl Into<String>, url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            url: url.into(),
            email: email.into(),
            image_paths: Vec::new(),
            speech_speed: 1.0,
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The research stage found nothing; no video was built and no
    /// email was sent.
    NoContent,
    Completed {
        video_path: PathBuf,
        video_status: String,
        email_status: String,
    },
}

fn script_pairs(script: &str) -> Result<Vec<ScenePair>> {
    let pairs = parse_script(script);
    if pairs.is_empty() {
        return Err(PromoreelError::ScriptFailed {
            reason: "script contained no narration/image pairs".to_string(),
        });
    }
    Ok(pairs)
}

/// Run the whole pipeline for one request. Research emptiness
/// short-circuits; any video-stage failure aborts; upload and email
/// failures degrade to status strings in the outcome.
pub async fn run(
    config: &Config,
    chat: &dyn ChatModel,
    http: &reqwest::Client,
    request: &RunRequest,
    opts: &VideoOptions,
    run_dir: &RunDir,
) -> Result<RunOutcome> {
    // scraping goes out with the browser-UA client; API calls keep `http`
    let scraper = scraping_client()?;
    let summaries = run_research(
        chat,
        &scraper,
        &request.url,
        &request.topic,
        &run_dir.transcripts_dir(),
    )
    .await?;
    if summaries.is_empty() {
        info!("research produced nothing, stopping run");
        return Ok(RunOutcome::NoContent);
    }

    let script = generate_script(chat, &request.topic, &summaries).await?;
    let pairs = script_pairs(&script)?;
    info!(pairs = pairs.len(), "script parsed");

    let media = MediaClient::new(http.clone(), &config.openai_api_key);
    let prompts: Vec<String> = pairs.iter().map(|p| p.image_prompt.clone()).collect();
    let narrations: Vec<String> = pairs.iter().map(|p| p.narration.clone()).collect();

    let images = if request.image_paths.is_empty() {
        media.generate_images(&prompts, run_dir).await?
    } else {
        copy_images(&request.image_paths, run_dir).await?
    };
    let speeches = media
        .generate_speeches(&narrations, request.speech_speed, run_dir)
        .await?;
    let scenes: Vec<SceneAssets> = pair_assets(images, speeches, narrations);

    let video_path = compose_video(&scenes, opts, run_dir).await?;

    let drive = DriveClient::new(http.clone(), &config.drive);
    let status = match drive.upload(&video_path, &request.topic).await {
        Ok(file_id) => video_status(&share_link(&file_id)),
        Err(e) => {
            warn!(error = %e, "video upload failed");
            format!("Video upload failed: {}", e)
        }
    };

    let gmail = GmailClient::new(http.clone(), &config.gmail);
    let body = render_email_body(recipient_name(&request.email), Some(&status));
    let email_status = match gmail.send(&request.email, EMAIL_SUBJECT, &body).await {
        Ok(()) => format!("Email sent to {}!", request.email),
        Err(e) => {
            warn!(error = %e, "email send failed");
            format!("Error sending email: {}", e)
        }
    };

    Ok(RunOutcome::Completed {
        video_path,
        video_status: status,
        email_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriveConfig, GmailConfig};
    use crate::llm::testing::ScriptedChat;

    fn test_config() -> Config {
        Config {
            openai_api_key: "test".into(),
            chat_model: "test-model".into(),
            drive: DriveConfig {
                access_token: "t".into(),
                parent_folder_id: "f".into(),
            },
            gmail: GmailConfig {
                access_token: "g".into(),
            },
            font_path: PathBuf::from("missing.ttf"),
        }
    }

    #[test]
    fn zero_pair_script_is_an_error() {
        assert!(matches!(
            script_pairs("the model ignored the tag instructions"),
            Err(PromoreelError::ScriptFailed { .. })
        ));
    }

    #[test]
    fn tagged_script_yields_pairs() {
        let pairs =
            script_pairs("<narration>Solar energy is...</narration><image>a sun</image>").unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[tokio::test]
    async fn empty_keywords_stop_the_whole_run() {
        let chat = ScriptedChat::new([""]);
        let tmp = tempfile::tempdir().unwrap();
        let run_dir = RunDir::create_in(tmp.path()).await.unwrap();
        let request = RunRequest::new("carbon capture", "http://127.0.0.1:9/", "a@b.c");

        let outcome = run(
            &test_config(),
            &chat,
            &reqwest::Client::new(),
            &request,
            &VideoOptions::default(),
            &run_dir,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::NoContent));
        // only the keyword prompt was sent; no scrape, video, or email happened
        assert_eq!(chat.call_count(), 1);
        assert!(!run_dir.output_path().exists());
    }
}
