use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{PromoreelError, Result};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_duration(json: &[u8]) -> Result<Option<f64>> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;
    Ok(probe.format.duration.as_deref().and_then(|d| d.parse().ok()))
}

/// Duration of a media file in seconds, via ffprobe.
pub async fn media_duration(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PromoreelError::ProbeFailed {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }
    which::which("ffprobe").map_err(|_| PromoreelError::ToolNotFound { tool: "ffprobe" })?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(PromoreelError::ProbeFailed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    parse_duration(&output.stdout)?.ok_or_else(|| PromoreelError::ProbeFailed {
        path: path.to_path_buf(),
        reason: "no duration in ffprobe output".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_from_format_section() {
        let json = br#"{"format": {"duration": "12.480000"}}"#;
        let duration = parse_duration(json).unwrap().unwrap();
        assert!((duration - 12.48).abs() < 1e-6);
    }

    #[test]
    fn missing_duration_is_none() {
        let json = br#"{"format": {}}"#;
        assert!(parse_duration(json).unwrap().is_none());
    }

    #[tokio::test]
    async fn probing_a_missing_file_fails_early() {
        let err = media_duration("/definitely/not/here.mp3").await.unwrap_err();
        assert!(matches!(err, PromoreelError::ProbeFailed { .. }));
    }
}
