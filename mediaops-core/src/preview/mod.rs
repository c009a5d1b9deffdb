//! Preview images for selected video files.
//!
//! Thumbnails are written once per distinct file content, named by the
//! BLAKE3 hash of the file, so renaming or copying a file reuses the existing
//! image. A small in-memory index maps recently selected paths to their
//! thumbnails so reselecting a file skips hashing.

use std::collections::{HashMap, VecDeque};
use std::fs::{self, File};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::Builder as TempFileBuilder;

use crate::error::{CoreError, CoreResult};
use crate::external::{ProcessRunner, quote_arg, run_collect};

/// Seek positions tried in order when grabbing a frame.
///
/// Clips shorter than the first position produce no frame and fall back to
/// the start of the file.
const FRAME_SEEK_SECONDS: &[u32] = &[1, 0];

/// Bounded map that evicts the oldest inserted key once full.
///
/// Lookups do not refresh an entry, and replacing the value of an existing
/// key keeps its original position.
#[derive(Debug, Clone)]
pub struct FifoCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    /// Creates a cache holding at most `capacity` entries. A capacity of 0 stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces `key`, evicting the oldest entry when over capacity.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Content-addressed thumbnail files in one directory.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    dir: PathBuf,
    width: u32,
}

impl ThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>, width: u32) -> Self {
        Self {
            dir: dir.into(),
            width,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex BLAKE3 digest of the file contents.
    pub fn content_hash(source: &Path) -> CoreResult<String> {
        let mut file = File::open(source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::FileNotFound(source.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        let mut hasher = blake3::Hasher::new();
        hasher.update_reader(&mut file)?;
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Where the thumbnail of `source` lives, whether or not it exists yet.
    pub fn thumbnail_path_for(&self, source: &Path) -> CoreResult<PathBuf> {
        Ok(self.dir.join(format!("{}.jpg", Self::content_hash(source)?)))
    }

    fn frame_command(&self, ffmpeg: &str, source: &Path, seek: u32, target: &Path) -> String {
        format!(
            "{} -hide_banner -loglevel error -ss {seek} -i {} -frames:v 1 -vf scale={}:-1 -y {}",
            quote_arg(ffmpeg),
            quote_arg(&source.to_string_lossy()),
            self.width,
            quote_arg(&target.to_string_lossy())
        )
    }

    /// Returns the thumbnail of `source`, extracting a frame if none exists yet.
    ///
    /// Frames are extracted into a temporary file in the store directory and
    /// renamed into place only once non-empty, so an interrupted run never
    /// leaves a truncated `<hash>.jpg` behind.
    pub fn ensure_thumbnail<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        ffmpeg: &str,
        source: &Path,
    ) -> CoreResult<PathBuf> {
        let target = self.thumbnail_path_for(source)?;
        if target.is_file() {
            log::debug!("Reusing thumbnail {}", target.display());
            return Ok(target);
        }

        fs::create_dir_all(&self.dir)?;
        let partial = TempFileBuilder::new()
            .prefix(".thumbnail-")
            .suffix(".jpg")
            .tempfile_in(&self.dir)?
            .into_temp_path();

        let mut last_code = 0;
        for seek in FRAME_SEEK_SECONDS {
            let command = self.frame_command(ffmpeg, source, *seek, &partial);
            let (outcome, output) = run_collect(runner, &command)?;
            let written = fs::metadata(&partial).map(|m| m.len() > 0).unwrap_or(false);
            if outcome.success() && written {
                partial.persist(&target).map_err(|e| CoreError::Io(e.error))?;
                log::debug!("Created thumbnail {} for {}", target.display(), source.display());
                return Ok(target);
            }
            last_code = outcome.exit_code().unwrap_or(-1);
            log::debug!(
                "No frame at {seek}s of {} (exit {last_code}): {}",
                source.display(),
                output.trim()
            );
        }
        Err(CoreError::ToolFailed(ffmpeg.to_string(), last_code))
    }
}

/// Thumbnail store fronted by a FIFO index of recently previewed paths.
#[derive(Debug)]
pub struct PreviewImages {
    store: ThumbnailStore,
    index: Mutex<FifoCache<PathBuf, PathBuf>>,
}

impl PreviewImages {
    pub fn new(store: ThumbnailStore, capacity: usize) -> Self {
        Self {
            store,
            index: Mutex::new(FifoCache::new(capacity)),
        }
    }

    pub fn store(&self) -> &ThumbnailStore {
        &self.store
    }

    /// Cached thumbnail for `source`, if it was previewed recently and still exists.
    pub fn get(&self, source: &Path) -> CoreResult<Option<PathBuf>> {
        let index = self
            .index
            .lock()
            .map_err(|_| CoreError::StatePoisoned("preview index"))?;
        Ok(index
            .get(&source.to_path_buf())
            .filter(|image| image.is_file())
            .cloned())
    }

    pub fn set(&self, source: &Path, image: PathBuf) -> CoreResult<()> {
        self.index
            .lock()
            .map_err(|_| CoreError::StatePoisoned("preview index"))?
            .insert(source.to_path_buf(), image);
        Ok(())
    }

    /// Returns a preview image for `source`, creating it on first use.
    pub fn preview_image_for<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        ffmpeg: &str,
        source: &Path,
    ) -> CoreResult<PathBuf> {
        if let Some(image) = self.get(source)? {
            return Ok(image);
        }
        // The index lock is not held while the transcoder runs.
        let image = self.store.ensure_thumbnail(runner, ffmpeg, source)?;
        self.set(source, image.clone())?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::{ScriptedResponse, ScriptedRunner};
    use tempfile::tempdir;

    #[test]
    fn test_fifo_eviction_ignores_reads() {
        let mut cache = FifoCache::new(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        assert_eq!(cache.get(&"A"), Some(&1));
        cache.insert("C", 3);
        assert!(!cache.contains_key(&"A"));
        assert_eq!(cache.get(&"B"), Some(&2));
        assert_eq!(cache.get(&"C"), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fifo_replace_keeps_position() {
        let mut cache = FifoCache::new(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        cache.insert("A", 10);
        cache.insert("C", 3);
        assert!(!cache.contains_key(&"A"));
        assert!(cache.contains_key(&"B"));
    }

    #[test]
    fn test_fifo_zero_capacity_and_remove() {
        let mut cache = FifoCache::new(0);
        cache.insert("A", 1);
        assert!(cache.is_empty());

        let mut cache = FifoCache::new(2);
        cache.insert("A", 1);
        cache.insert("B", 2);
        assert_eq!(cache.remove(&"A"), Some(1));
        cache.insert("C", 3);
        cache.insert("D", 4);
        assert!(!cache.contains_key(&"B"));
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_thumbnail_name_follows_content() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        let c = dir.path().join("c.mp4");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();
        fs::write(&c, b"other bytes").unwrap();

        let store = ThumbnailStore::new(dir.path().join("thumbs"), 320);
        let pa = store.thumbnail_path_for(&a).unwrap();
        assert_eq!(pa, store.thumbnail_path_for(&b).unwrap());
        assert_ne!(pa, store.thumbnail_path_for(&c).unwrap());
        assert_eq!(pa.extension().unwrap(), "jpg");
    }

    #[test]
    fn test_missing_source_is_file_not_found() {
        let store = ThumbnailStore::new("/tmp", 320);
        let err = store.thumbnail_path_for(Path::new("/no/such/clip.mp4")).unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound(_)));
    }

    #[test]
    fn test_preview_created_once_and_reused() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        fs::write(&source, b"fake video").unwrap();

        let runner = ScriptedRunner::new();
        runner.expect("-frames:v 1", ScriptedResponse::exit(0, &[]).creating_output());
        let previews = PreviewImages::new(ThumbnailStore::new(dir.path().join("thumbs"), 160), 20);

        let first = previews.preview_image_for(&runner, "ffmpeg", &source).unwrap();
        assert!(first.is_file());
        assert!(runner.received_calls()[0].contains("scale=160:-1"));

        let second = previews.preview_image_for(&runner, "ffmpeg", &source).unwrap();
        assert_eq!(first, second);
        assert_eq!(runner.received_calls().len(), 1);
    }

    #[test]
    fn test_existing_thumbnail_skips_transcoder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        fs::write(&source, b"fake video").unwrap();
        let store = ThumbnailStore::new(dir.path(), 320);
        fs::write(store.thumbnail_path_for(&source).unwrap(), b"jpeg").unwrap();

        let runner = ScriptedRunner::new();
        store.ensure_thumbnail(&runner, "ffmpeg", &source).unwrap();
        assert!(runner.received_calls().is_empty());
    }

    #[test]
    fn test_short_clip_falls_back_to_first_frame() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("short.mp4");
        fs::write(&source, b"tiny").unwrap();

        let runner = ScriptedRunner::new();
        runner.expect("-ss 1 ", ScriptedResponse::exit(0, &[]));
        runner.expect("-ss 0 ", ScriptedResponse::exit(0, &[]).creating_output());
        let store = ThumbnailStore::new(dir.path().join("thumbs"), 320);

        let image = store.ensure_thumbnail(&runner, "ffmpeg", &source).unwrap();
        assert!(image.is_file());
        assert_eq!(runner.received_calls().len(), 2);
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_interrupted_extraction_leaves_no_thumbnail() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        fs::write(&source, b"fake video").unwrap();
        let store = ThumbnailStore::new(dir.path().join("thumbs"), 320);

        // Writes part of the image, then dies.
        let runner = ScriptedRunner::new();
        runner.expect("-frames:v 1", ScriptedResponse::exit(-1, &[]).creating_output());
        assert!(store.ensure_thumbnail(&runner, "ffmpeg", &source).is_err());

        let target = store.thumbnail_path_for(&source).unwrap();
        assert!(!target.exists());
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 0);
        let frame_calls = runner.received_calls();
        assert!(frame_calls.iter().all(|call| !call.contains(&*target.to_string_lossy())));

        let runner = ScriptedRunner::new();
        runner.expect("-frames:v 1", ScriptedResponse::exit(0, &[]).creating_output());
        let image = store.ensure_thumbnail(&runner, "ffmpeg", &source).unwrap();
        assert_eq!(image, target);
        assert!(fs::metadata(&image).unwrap().len() > 0);
    }

    #[test]
    fn test_no_frame_is_an_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("broken.mp4");
        fs::write(&source, b"broken").unwrap();

        let runner = ScriptedRunner::new();
        runner.expect("-frames:v 1", ScriptedResponse::exit(1, &["Invalid data\n"]));
        let store = ThumbnailStore::new(dir.path().join("thumbs"), 320);
        let err = store.ensure_thumbnail(&runner, "ffmpeg", &source).unwrap_err();
        assert!(matches!(err, CoreError::ToolFailed(_, 1)));
    }
}
