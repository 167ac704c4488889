use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;

const FILE_PREFIX: &str = "voice_maker";
pub const OUTPUT_EXTENSION: &str = "wav";

static OUTPUT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^voice_maker_\d{8}_\d{6}_[0-9a-f]{8}\.wav$").expect("output name pattern is valid")
});

/// Allocates collision-free output file names inside the output directory.
///
/// Names look like `voice_maker_20250101_120000_1a2b3c4d.wav`: the timestamp
/// keeps them sortable, the random token keeps concurrent jobs apart.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    dir: PathBuf,
}

impl OutputNamer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Make sure the output directory exists
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn next_path(&self) -> PathBuf {
        self.dir.join(file_name_at(Utc::now()))
    }

    /// Resolve a client-supplied name to a path in the output directory.
    /// Returns `None` for anything this namer could not have produced.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        is_output_name(file_name).then(|| self.dir.join(file_name))
    }
}

fn file_name_at(now: DateTime<Utc>) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}.{}",
        FILE_PREFIX,
        now.format("%Y%m%d_%H%M%S"),
        &token[..8],
        OUTPUT_EXTENSION
    )
}

pub fn is_output_name(file_name: &str) -> bool {
    OUTPUT_NAME.is_match(file_name)
}
