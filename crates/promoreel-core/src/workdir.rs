use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::Result;

/// Fresh working directory for a single run.
///
/// Every run gets its own uuid-named directory so ordinal asset names
/// (`image_0.png`, `speech_0.mp3`, ...) can never collide with the
/// leftovers of another run.
#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

pub fn get_root_work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("promoreel")
}

impl RunDir {
    /// Create a new isolated run directory under the user cache dir.
    pub async fn create() -> Result<Self> {
        Self::create_in(&get_root_work_dir()).await
    }

    /// Create a run directory under an explicit root (tests use a tempdir).
    pub async fn create_in(root: &Path) -> Result<Self> {
        let run = Self {
            root: root.join(Uuid::new_v4().to_string()),
        };
        for dir in [
            run.images_dir(),
            run.speeches_dir(),
            run.clips_dir(),
            run.transcripts_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        Ok(run)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn speeches_dir(&self) -> PathBuf {
        self.root.join("speeches")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.root.join("transcripts")
    }

    pub fn image_path(&self, index: usize) -> PathBuf {
        self.images_dir().join(format!("image_{}.png", index))
    }

    pub fn speech_path(&self, index: usize) -> PathBuf {
        self.speeches_dir().join(format!("speech_{}.mp3", index))
    }

    pub fn zoom_clip_path(&self, index: usize) -> PathBuf {
        self.clips_dir().join(format!("zoom_{}.mp4", index))
    }

    pub fn caption_clip_path(&self, index: usize) -> PathBuf {
        self.clips_dir().join(format!("caption_{}.mp4", index))
    }

    pub fn scene_clip_path(&self, index: usize) -> PathBuf {
        self.clips_dir().join(format!("scene_{}.mp4", index))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.clips_dir().join("scenes.txt")
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join("video.mp4")
    }
}
