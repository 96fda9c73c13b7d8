// Thumbnail placement. Image bytes are fetched elsewhere; this only decides
// where a thumbnail lives and reserves its owner-scoped directory.

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOwner {
    Community,
    User,
}

impl ThumbnailOwner {
    fn segment(self) -> &'static str {
        match self {
            ThumbnailOwner::Community => "community",
            ThumbnailOwner::User => "user",
        }
    }
}

pub trait ThumbnailStore: Send + Sync {
    /// Public URL the thumbnail referenced by `source` is served from. Must
    /// not touch the filesystem; it runs inside open transactions.
    fn public_url(&self, owner: ThumbnailOwner, owner_id: i64, source: &str) -> AppResult<String>;

    /// Creates the owner's directory. Called once the owning row is committed.
    fn reserve(&self, owner: ThumbnailOwner, owner_id: i64) -> AppResult<()>;
}

/// Keeps thumbnails under a local uploads root, one directory per owner.
pub struct LocalThumbnailStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalThumbnailStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    fn owner_dir(&self, owner: ThumbnailOwner, owner_id: i64) -> PathBuf {
        self.root.join(owner.segment()).join(owner_id.to_string())
    }
}

impl ThumbnailStore for LocalThumbnailStore {
    fn public_url(&self, owner: ThumbnailOwner, owner_id: i64, source: &str) -> AppResult<String> {
        let file_name = thumbnail_file_name(source)?;
        Ok(format!(
            "{}/{}/{}/{}",
            self.public_prefix,
            owner.segment(),
            owner_id,
            file_name
        ))
    }

    fn reserve(&self, owner: ThumbnailOwner, owner_id: i64) -> AppResult<()> {
        let dir = self.owner_dir(owner, owner_id);
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Reserved thumbnail directory");
        Ok(())
    }
}

/// Reserves the owner's directory once its row is committed. Failures are
/// logged only; the row is already durable.
pub fn reserve_after_commit(thumbnails: &dyn ThumbnailStore, owner: ThumbnailOwner, owner_id: i64) {
    if let Err(e) = thumbnails.reserve(owner, owner_id) {
        tracing::warn!(?owner, owner_id, error = %e, "Could not reserve thumbnail directory");
    }
}

/// Extracts the original file name from a thumbnail reference (an absolute
/// URL or a bare path) and checks that it names an image.
pub fn thumbnail_file_name(source: &str) -> AppResult<String> {
    let source = source.trim();
    let candidate = match url::Url::parse(source) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => Path::new(source)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string),
    };

    let file_name = candidate
        .filter(|name| !name.is_empty() && name != "..")
        .ok_or_else(|| AppError::BadRequest(format!("thumbnail has no file name: {source}")))?;

    let is_image = mime_guess::from_path(&file_name)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false);
    if !is_image {
        return Err(AppError::BadRequest(format!(
            "thumbnail is not an image: {file_name}"
        )));
    }

    Ok(file_name)
}
