use std::path::Path;

use tokio::{fs, process::Command};
use tracing::{debug, warn};

use crate::error::{PromoreelError, Result};
use crate::scrape::{Link, ScrapedSource};

/// Fetch the transcript of a video as plain text, using yt-dlp's
/// auto-generated subtitles. `work_dir` receives the intermediate
/// subtitle file.
pub async fn fetch_transcript(video_url: &str, work_dir: &Path) -> Result<String> {
    let template = work_dir.join("transcript.%(ext)s");
    let output = Command::new("yt-dlp")
        .arg(video_url)
        .arg("--skip-download")
        .arg("--write-auto-subs")
        .arg("--sub-langs")
        .arg("en")
        .arg("--convert-subs")
        .arg("srt")
        .arg("-o")
        .arg(&template)
        .output()
        .await?;

    if !output.status.success() {
        return Err(PromoreelError::TranscriptFailed {
            url: video_url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let subtitle_path = work_dir.join("transcript.en.srt");
    if !subtitle_path.exists() {
        return Err(PromoreelError::TranscriptFailed {
            url: video_url.to_string(),
            reason: "no subtitles available".to_string(),
        });
    }

    let srt = fs::read_to_string(&subtitle_path).await?;
    fs::remove_file(&subtitle_path).await?;
    Ok(srt_to_plain_text(&srt))
}

/// Flatten an SRT document to plain text: drop cue indices and
/// timestamp lines, join the rest with single spaces.
pub fn srt_to_plain_text(srt: &str) -> String {
    srt.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains("-->")
                && !line.chars().all(|c| c.is_ascii_digit())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scan all links for video URLs and collect the transcripts that
/// mention at least one keyword. Unavailable transcripts are skipped.
pub async fn harvest_video_transcripts(
    links: &[Link],
    keywords: &[String],
    work_dir: &Path,
) -> Vec<ScrapedSource> {
    let mut sources = Vec::new();
    for link in links {
        if !link.href.contains("youtube") {
            continue;
        }
        let text = match fetch_transcript(&link.href, work_dir).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %link.href, error = %e, "transcript unavailable, skipping");
                continue;
            }
        };
        let lower = text.to_lowercase();
        if keywords.iter().any(|k| lower.contains(&k.to_lowercase())) {
            debug!(url = %link.href, "retained video transcript");
            sources.push(ScrapedSource {
                url: link.href.clone(),
                text,
            });
        }
    }
    sources
}
