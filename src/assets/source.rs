use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::foundation::{
    core::FrameIndex,
    error::{ReelError, ReelResult},
};

/// Layout of a numbered frame sequence: `{base_path}/frame_{index:03}.{extension}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSetSpec {
    /// Directory (or URL-like prefix) holding the frames.
    pub base_path: String,
    /// Number of frames, fixed for the lifetime of the player.
    pub count: u32,
    /// File extension without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "png".to_string()
}

impl Default for FrameSetSpec {
    fn default() -> Self {
        Self {
            base_path: "sequence".to_string(),
            count: 191,
            extension: default_extension(),
        }
    }
}

impl FrameSetSpec {
    /// Relative path of one frame, e.g. `sequence/frame_007.png`.
    pub fn frame_path(&self, index: FrameIndex) -> String {
        let base = self.base_path.trim_end_matches('/');
        let file = format!("frame_{:03}.{}", index.0, self.extension);
        if base.is_empty() {
            file
        } else {
            format!("{base}/{file}")
        }
    }

    /// Check the layout is usable.
    pub fn validate(&self) -> ReelResult<()> {
        if self.count == 0 {
            return Err(ReelError::validation("frame count must be > 0"));
        }
        if self.extension.trim().is_empty() {
            return Err(ReelError::validation("frame extension must not be empty"));
        }
        Ok(())
    }
}

/// Something that can produce the encoded bytes of a frame.
///
/// Implementations are called from loader worker threads.
pub trait FrameSource: Send + Sync {
    /// Fetch encoded bytes for `index`.
    fn fetch(&self, index: FrameIndex) -> ReelResult<Vec<u8>>;
}

/// Reads frames from the filesystem following a [`FrameSetSpec`] layout.
#[derive(Clone, Debug)]
pub struct DirFrameSource {
    root: PathBuf,
    spec: FrameSetSpec,
}

impl DirFrameSource {
    /// Resolve `spec.base_path` relative to `root`.
    pub fn new(root: impl Into<PathBuf>, spec: FrameSetSpec) -> Self {
        Self {
            root: root.into(),
            spec,
        }
    }

    /// Absolute (or root-relative) path of one frame.
    pub fn path_for(&self, index: FrameIndex) -> PathBuf {
        self.root.join(Path::new(&self.spec.frame_path(index)))
    }
}

impl FrameSource for DirFrameSource {
    fn fetch(&self, index: FrameIndex) -> ReelResult<Vec<u8>> {
        let path = self.path_for(index);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read frame '{}'", path.display()))?;
        Ok(bytes)
    }
}

/// Serves pre-encoded frames from memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryFrameSource {
    frames: HashMap<FrameIndex, Vec<u8>>,
}

impl MemoryFrameSource {
    /// Empty source; every fetch fails until frames are inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes for `index`, replacing any previous entry.
    pub fn insert(&mut self, index: FrameIndex, bytes: Vec<u8>) {
        self.frames.insert(index, bytes);
    }
}

impl FrameSource for MemoryFrameSource {
    fn fetch(&self, index: FrameIndex) -> ReelResult<Vec<u8>> {
        self.frames
            .get(&index)
            .cloned()
            .ok_or_else(|| ReelError::load(format!("no frame registered for index {}", index.0)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
