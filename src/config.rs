use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::Context;

use crate::{
    assets::{preloader::PreloadOpts, source::FrameSetSpec},
    foundation::error::{ReelError, ReelResult},
    playback::policy::MappingPolicy,
    render::compositor::RenderSettings,
};

/// Environment variable overriding [`PlayerConfig::threads`].
pub const ENV_THREADS: &str = "SCROLLREEL_THREADS";
/// Environment variable overriding [`PlayerConfig::load_timeout_ms`].
pub const ENV_LOAD_TIMEOUT_MS: &str = "SCROLLREEL_LOAD_TIMEOUT_MS";

/// Everything needed to build a [`ScrollPlayer`](crate::ScrollPlayer).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Frame sequence layout.
    pub frames: FrameSetSpec,
    /// Scroll-to-range mapping.
    pub policy: MappingPolicy,
    /// Pending loads older than this are failed. `None` waits forever.
    pub load_timeout_ms: Option<u64>,
    /// Loader worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Background the surface is cleared to before each frame.
    pub clear_rgba: Option<[u8; 4]>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frames: FrameSetSpec::default(),
            policy: MappingPolicy::default(),
            load_timeout_ms: Some(30_000),
            threads: None,
            clear_rgba: None,
        }
    }
}

impl PlayerConfig {
    /// Parse JSON text. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> ReelResult<Self> {
        serde_json::from_str(text).map_err(|e| ReelError::serde(format!("player config: {e}")))
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ReelError::serde(format!("parse config '{}': {e}", path.display())))
    }

    /// Apply `SCROLLREEL_*` overrides. Unparsable or zero values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = lookup(ENV_THREADS)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.threads = Some(n);
        }
        if let Some(ms) = lookup(ENV_LOAD_TIMEOUT_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.load_timeout_ms = Some(ms);
        }
    }

    /// Reject configurations the player cannot run with.
    pub fn validate(&self) -> ReelResult<()> {
        self.frames.validate()?;
        self.policy.validate()?;
        if self.threads == Some(0) {
            return Err(ReelError::validation("'threads' must be >= 1 when set"));
        }
        Ok(())
    }

    /// Loader options derived from this config.
    pub fn preload_opts(&self) -> PreloadOpts {
        PreloadOpts {
            threads: self.threads,
            timeout: self.load_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Compositor settings derived from this config.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            clear_rgba: self.clear_rgba,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
