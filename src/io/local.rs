use super::{ByteRange, ObjectRef, RangeFetcher};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};

/// Local directory exposed as an object store
///
/// Objects live at `root/bucket/key`; an empty bucket maps keys directly
/// under `root`.
pub struct LocalFileFetcher {
    root: PathBuf,
}

impl LocalFileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, object: &ObjectRef) -> PathBuf {
        let mut path = self.root.clone();
        if !object.bucket.is_empty() {
            path.push(&object.bucket);
        }
        path.push(&object.key);
        path
    }
}

impl RangeFetcher for LocalFileFetcher {
    type Body = Take<File>;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        let path = self.path_of(object);
        let metadata =
            std::fs::metadata(&path).with_context(|| format!("stat {}", path.display()))?;
        Ok(metadata.len())
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        let path = self.path_of(object);
        let mut file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        file.seek(SeekFrom::Start(range.start))?;
        Ok(file.take(range.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ranges_under_bucket_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("media"))?;
        std::fs::write(dir.path().join("media").join("clip.bin"), b"0123456789")?;

        let fetcher = LocalFileFetcher::new(dir.path());
        let object = ObjectRef::new("media", "clip.bin");
        assert_eq!(fetcher.head_size(&object)?, 10);

        let mut body = fetcher.fetch_range(&object, ByteRange::new(3, 6))?;
        let mut got = String::new();
        body.read_to_string(&mut got)?;
        assert_eq!(got, "3456");
        Ok(())
    }

    #[test]
    fn empty_bucket_maps_to_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("plain.txt"), b"hello")?;

        let fetcher = LocalFileFetcher::new(dir.path());
        assert_eq!(fetcher.head_size(&ObjectRef::new("", "plain.txt"))?, 5);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let fetcher = LocalFileFetcher::new("/nonexistent-chunkseek-root");
        let err = fetcher
            .head_size(&ObjectRef::new("b", "k"))
            .unwrap_err();
        assert!(err.to_string().starts_with("stat "));
    }
}
