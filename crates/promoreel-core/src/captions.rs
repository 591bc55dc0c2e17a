//! Caption layout: word chunking, frame-based visibility windows, and
//! line wrapping. Everything here is pure so the timing laws are unit
//! testable; `compose` turns the result into drawtext filters.

/// Words shown per caption chunk.
pub const DEFAULT_CHUNK_WORDS: usize = 3;

/// Average glyph advance relative to the font size, used to estimate
/// rendered line width without rasterizing.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// One caption chunk with its on-screen time span. `lines` is one
/// centered line, or two stacked lines when the chunk is too wide for
/// the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionWindow {
    pub lines: Vec<String>,
    pub start: f64,
    pub end: f64,
}

/// Split text into fixed-size word chunks, preserving word order.
/// Every chunk except possibly the last holds exactly `chunk_words`
/// words; rejoining the chunks with single spaces reconstructs the
/// single-space-normalized text.
pub fn split_into_chunks(text: &str, chunk_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Number of frames a caption chunk stays visible.
pub fn visible_frames(visible_secs: f64, fps: u32) -> u32 {
    (visible_secs * fps as f64) as u32
}

/// Number of gap frames between chunks (truncated, like the source
/// frame arithmetic: 0.3 s at 24 fps is 7 frames).
pub fn gap_frames(gap_secs: f64, fps: u32) -> u32 {
    (gap_secs * fps as f64) as u32
}

/// Which chunk a frame belongs to. Increments exactly once per
/// (visible + gap) cycle.
pub fn chunk_index_at_frame(frame: u32, visible: u32, gap: u32) -> usize {
    (frame / (visible + gap).max(1)) as usize
}

/// Whether the frame falls inside the visible part of its cycle.
pub fn frame_shows_caption(frame: u32, visible: u32, gap: u32) -> bool {
    frame % (visible + gap).max(1) < visible
}

pub fn estimated_text_width(text: &str, font_size: u32) -> u32 {
    (text.chars().count() as f64 * font_size as f64 * GLYPH_WIDTH_RATIO) as u32
}

/// Lay a chunk out as one centered line, or split its words at the
/// midpoint into two lines when the estimated single-line width
/// exceeds the frame width.
pub fn wrap_chunk(chunk: &str, font_size: u32, frame_width: u32) -> Vec<String> {
    if estimated_text_width(chunk, font_size) <= frame_width {
        return vec![chunk.to_string()];
    }
    let words: Vec<&str> = chunk.split_whitespace().collect();
    let half = words.len() / 2;
    vec![words[..half].join(" "), words[half..].join(" ")]
}

/// Build the full caption schedule for a narration: chunk the text,
/// assign each chunk its frame window, and wrap over-wide chunks.
pub fn caption_windows(
    text: &str,
    chunk_words: usize,
    fps: u32,
    visible_secs: f64,
    gap_secs: f64,
    font_size: u32,
    frame_width: u32,
) -> Vec<CaptionWindow> {
    let visible = visible_frames(visible_secs, fps);
    let gap = gap_frames(gap_secs, fps);
    let cycle = visible + gap;

    split_into_chunks(text, chunk_words)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let start_frame = i as u32 * cycle;
            CaptionWindow {
                lines: wrap_chunk(&chunk, font_size, frame_width),
                start: start_frame as f64 / fps as f64,
                end: (start_frame + visible) as f64 / fps as f64,
            }
        })
        .collect()
}

/// Escape text for use inside a drawtext `text='...'` value.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}
