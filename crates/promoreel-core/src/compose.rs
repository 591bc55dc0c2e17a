//! Video composition: per-scene still-image clips with a linear
//! zoom-in, timed caption overlays, narration muxing, and final
//! concatenation. All pixel work is delegated to ffmpeg; this module
//! builds the filtergraphs and drives the renders in scene order.

use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};
use tracing::{debug, info};

use crate::captions::{CaptionWindow, caption_windows, escape_drawtext};
use crate::config::DEFAULT_FONT_PATH;
use crate::error::{PromoreelError, Result};
use crate::media::SceneAssets;
use crate::probe::media_duration;
use crate::workdir::RunDir;

/// Distance of a single caption line from the bottom edge.
const CAPTION_BOTTOM_MARGIN: u32 = 100;
/// Bottom margin of the second line in the two-line layout.
const TWO_LINE_BOTTOM_MARGIN: u32 = 250;

/// Rendering parameters for the compositor.
#[derive(Debug, Clone)]
pub struct VideoOptions {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Final scale of the linear zoom-in (1.0 at t=0 up to this at t=duration).
    pub zoom_factor: f64,
    pub font_path: PathBuf,
    pub font_size: u32,
    pub font_color: String,
    pub outline_color: String,
    pub outline_thickness: u32,
    pub chunk_words: usize,
    /// Seconds each caption chunk stays visible.
    pub caption_secs: f64,
    /// Seconds of gap between consecutive chunks.
    pub gap_secs: f64,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            fps: 24,
            width: 512,
            height: 512,
            zoom_factor: 1.3,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size: 40,
            font_color: "white".to_string(),
            outline_color: "black".to_string(),
            outline_thickness: 2,
            chunk_words: 3,
            caption_secs: 1.0,
            gap_secs: 0.3,
        }
    }
}

/// Zoom scale at normalized clip time: 1.0 at t=0, `zoom_factor` at
/// t=duration, linear in between.
pub fn zoom_scale(t: f64, duration: f64, zoom_factor: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    1.0 + (zoom_factor - 1.0) * (t / duration)
}

/// Filtergraph for the zoomed still-image clip: normalize the frame
/// to the target size, then ramp `zoompan` linearly over the clip's
/// output frames with a centered crop window.
pub fn build_zoom_filter(opts: &VideoOptions, duration: f64) -> String {
    let frames = ((duration * opts.fps as f64).ceil() as u32).max(2);
    format!(
        "scale={w}:{h},zoompan=z='1+{delta:.6}*on/{last}':d=1:\
         x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={w}x{h}:fps={fps}",
        w = opts.width,
        h = opts.height,
        delta = opts.zoom_factor - 1.0,
        last = frames - 1,
        fps = opts.fps,
    )
}

fn drawtext(line: &str, y_expr: &str, window: &CaptionWindow, opts: &VideoOptions) -> String {
    format!(
        "drawtext=fontfile='{font}':text='{text}':fontsize={size}:fontcolor={color}:\
         borderw={borderw}:bordercolor={border_color}:x=(w-text_w)/2:y={y}:\
         enable='between(t,{start:.3},{end:.3})'",
        font = opts.font_path.display(),
        text = escape_drawtext(line),
        size = opts.font_size,
        color = opts.font_color,
        borderw = opts.outline_thickness,
        border_color = opts.outline_color,
        y = y_expr,
        start = window.start,
        end = window.end,
    )
}

/// Filtergraph overlaying the caption schedule: one drawtext per
/// visible line, stroke via border, fill on top, centered. Returns
/// `None` when the narration produced no chunks.
pub fn build_caption_filter(windows: &[CaptionWindow], opts: &VideoOptions) -> Option<String> {
    if windows.is_empty() {
        return None;
    }
    let line_height = opts.font_size;
    let mut filters = Vec::new();
    for window in windows {
        match window.lines.as_slice() {
            [line] => {
                let y = format!("h-{}", CAPTION_BOTTOM_MARGIN);
                filters.push(drawtext(line, &y, window, opts));
            }
            [first, second] => {
                let y1 = format!("h-{}", TWO_LINE_BOTTOM_MARGIN + line_height);
                let y2 = format!("h-{}", TWO_LINE_BOTTOM_MARGIN);
                filters.push(drawtext(first, &y1, window, opts));
                filters.push(drawtext(second, &y2, window, opts));
            }
            _ => {}
        }
    }
    Some(filters.join(","))
}

async fn run_ffmpeg(args: Vec<String>, stage: &'static str) -> Result<()> {
    debug!(stage, "ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg").args(&args).output().await?;
    if !output.status.success() {
        return Err(PromoreelError::RenderFailed {
            stage,
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

/// Render a still image into a video clip of exactly `duration`
/// seconds with the linear zoom-in applied.
pub async fn render_zoom_clip(
    image: &Path,
    duration: f64,
    opts: &VideoOptions,
    out: &Path,
) -> Result<()> {
    let args = vec![
        "-y".to_string(),
        "-loop".to_string(),
        "1".to_string(),
        "-framerate".to_string(),
        opts.fps.to_string(),
        "-i".to_string(),
        image.to_string_lossy().to_string(),
        "-t".to_string(),
        format!("{:.3}", duration),
        "-vf".to_string(),
        build_zoom_filter(opts, duration),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        opts.fps.to_string(),
        out.to_string_lossy().to_string(),
    ];
    run_ffmpeg(args, "zoom render").await
}

/// Burn the caption schedule for `caption` into a rendered clip. A
/// narration with no words passes the clip through unchanged.
pub async fn overlay_captions(
    input: &Path,
    caption: &str,
    opts: &VideoOptions,
    out: &Path,
) -> Result<()> {
    let windows = caption_windows(
        caption,
        opts.chunk_words,
        opts.fps,
        opts.caption_secs,
        opts.gap_secs,
        opts.font_size,
        opts.width,
    );
    let Some(filter) = build_caption_filter(&windows, opts) else {
        fs::copy(input, out).await?;
        return Ok(());
    };
    let args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        out.to_string_lossy().to_string(),
    ];
    run_ffmpeg(args, "caption overlay").await
}

/// Mux the narration track onto a captioned clip. The clip was built
/// to the audio's duration, so `-shortest` only trims encoder slack.
pub async fn attach_narration(video: &Path, audio: &Path, out: &Path) -> Result<()> {
    let args = vec![
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        audio.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-shortest".to_string(),
        out.to_string_lossy().to_string(),
    ];
    run_ffmpeg(args, "audio mux").await
}

/// Concatenate the finished scene clips, in order, into the final
/// video. Any pre-existing file at the output path is removed first.
pub async fn concat_scenes(
    clips: &[PathBuf],
    opts: &VideoOptions,
    run: &RunDir,
) -> Result<PathBuf> {
    let out = run.output_path();
    if out.exists() {
        fs::remove_file(&out).await?;
    }

    let mut list = String::new();
    for clip in clips {
        let name = clip
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| PromoreelError::RenderFailed {
                stage: "concat",
                reason: format!("invalid clip path: {}", clip.display()),
            })?;
        list.push_str(&format!("file '{}'\n", name));
    }
    let list_path = run.concat_list_path();
    fs::write(&list_path, list).await?;

    let output = Command::new("ffmpeg")
        .current_dir(run.clips_dir())
        .args([
            "-y",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            &list_path.to_string_lossy(),
            "-c:v",
            "libx264",
            "-c:a",
            "aac",
            "-r",
            &opts.fps.to_string(),
        ])
        .arg(&out)
        .output()
        .await?;
    if !output.status.success() {
        return Err(PromoreelError::RenderFailed {
            stage: "concat",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(out)
}

/// Compose the final video: for each scene (in order) build the
/// zoomed clip at the narration's duration, overlay captions, attach
/// the narration, then concatenate everything. Any scene failure
/// aborts the whole build.
pub async fn compose_video(
    scenes: &[SceneAssets],
    opts: &VideoOptions,
    run: &RunDir,
) -> Result<PathBuf> {
    which::which("ffmpeg").map_err(|_| PromoreelError::ToolNotFound { tool: "ffmpeg" })?;
    if !opts.font_path.exists() {
        return Err(PromoreelError::FontNotFound(opts.font_path.clone()));
    }

    let mut clips = Vec::new();
    for (i, scene) in scenes.iter().enumerate() {
        let duration = media_duration(&scene.speech).await?;
        info!(scene = i, duration, "composing scene");

        let zoomed = run.zoom_clip_path(i);
        render_zoom_clip(&scene.image, duration, opts, &zoomed).await?;

        let captioned = run.caption_clip_path(i);
        overlay_captions(&zoomed, &scene.caption, opts, &captioned).await?;

        let finished = run.scene_clip_path(i);
        attach_narration(&captioned, &scene.speech, &finished).await?;
        clips.push(finished);
    }

    concat_scenes(&clips, opts, run).await
}
