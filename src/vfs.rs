use std::{
    borrow::Cow,
    collections::HashMap,
    fs::OpenOptions,
    future::Future,
    io::{Cursor, Error, ErrorKind},
    path::{Component, Path, PathBuf},
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use futures_util::future::{ready, Ready};
use hyper::body::Bytes;
use rust_embed::RustEmbed;
use tokio::{
    fs::File,
    io::{AsyncRead, ReadBuf},
    task::{spawn_blocking, JoinHandle},
};
use tracing::warn;

use crate::config::{ResolverConfig, DEFAULT_CONTENT_LOCATION, EMBEDDED_PREFIX};
use crate::util::sanitize_path;

/// Resource tree bundled into the binary at build time.
#[derive(RustEmbed)]
#[folder = "resources/"]
struct Bundled;

/// A file opened by a `FileOpener`, along with the metadata resolution needs.
#[derive(Debug)]
pub struct FileWithMetadata<F = File> {
    /// The handle to read from.
    pub handle: F,
    /// Length of the content.
    pub size: u64,
    /// Modification time, if the backing store knows it.
    pub modified: Option<SystemTime>,
    /// Set for directories, which exist but cannot be streamed.
    pub is_dir: bool,
}

impl<F> FileWithMetadata<F> {
    fn map_handle<G>(self, f: impl FnOnce(F) -> G) -> FileWithMetadata<G> {
        FileWithMetadata {
            handle: f(self.handle),
            size: self.size,
            modified: self.modified,
            is_dir: self.is_dir,
        }
    }
}

/// A backing store that relative paths can be opened in.
pub trait FileOpener {
    /// Handle type of opened files.
    type File;

    /// Future resolving to the opened file.
    type Future: Future<Output = Result<FileWithMetadata<Self::File>, Error>>;

    /// Open `path`, relative to the root of the store, and collect its metadata.
    ///
    /// Callers pass paths that went through `sanitize_path`.
    fn open(&self, path: &Path) -> Self::Future;
}

/// A live filesystem directory, opened through `tokio::fs`.
///
/// Every open goes to the filesystem, so changes to the directory are visible immediately.
#[derive(Debug)]
pub struct TokioFileOpener {
    /// Directory that paths are opened relative to.
    pub root: PathBuf,
}

impl TokioFileOpener {
    /// Open files relative to `root`, which may itself be relative to the working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileOpener for TokioFileOpener {
    type File = File;
    type Future = TokioFileFuture;

    fn open(&self, path: &Path) -> Self::Future {
        let mut full_path = self.root.clone();
        full_path.extend(path);

        // Open and metadata happen in a single blocking task.
        let inner = spawn_blocking(move || {
            let mut opts = OpenOptions::new();
            opts.read(true);

            let handle = opts.open(full_path)?;
            let metadata = handle.metadata()?;
            Ok(FileWithMetadata {
                handle: File::from_std(handle),
                size: metadata.len(),
                modified: metadata.modified().ok(),
                is_dir: metadata.is_dir(),
            })
        });

        TokioFileFuture { inner }
    }
}

/// Future of a `TokioFileOpener::open` call running on the blocking pool.
pub struct TokioFileFuture {
    inner: JoinHandle<Result<FileWithMetadata<File>, Error>>,
}

impl Future for TokioFileFuture {
    type Output = Result<FileWithMetadata<File>, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A failed join becomes an IO error of its own.
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(_)) => {
                Poll::Ready(Err(Error::new(ErrorKind::Other, "background task failed")))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

type MemoryFileMap = HashMap<PathBuf, FileWithMetadata<Bytes>>;

/// An in-memory virtual filesystem.
///
/// Directories are implied by the files added to it: they exist, but open as empty directory
/// entries.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: MemoryFileMap,
}

impl MemoryFs {
    /// Initialize a `MemoryFs` from the bundled resource tree.
    ///
    /// Only files below the directory `prefix` are included, with paths relative to it. An empty
    /// prefix includes the whole tree.
    pub fn bundled(prefix: &str) -> Self {
        Self::from_embedded::<Bundled>(prefix)
    }

    /// Initialize a `MemoryFs` from a `RustEmbed` resource tree.
    pub fn from_embedded<E: RustEmbed>(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        let mut fs = Self::default();
        for name in E::iter() {
            let relative = if prefix.is_empty() {
                Some(&*name)
            } else {
                name.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('/'))
            };
            let (relative, file) = match (relative, E::get(&name)) {
                (Some(relative), Some(file)) => (relative, file),
                _ => continue,
            };
            let modified = file
                .metadata
                .last_modified()
                .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
            let data = match file.data {
                Cow::Borrowed(data) => Bytes::from_static(data),
                Cow::Owned(data) => Bytes::from(data),
            };
            fs.add(relative, data, modified);
        }
        fs
    }

    /// Insert a file, along with entries for the directories containing it.
    ///
    /// An entry already at one of these paths is replaced.
    pub fn add(
        &mut self,
        path: impl Into<PathBuf>,
        data: Bytes,
        modified: Option<SystemTime>,
    ) -> &mut Self {
        let path = path.into();

        // Parent directories.
        let mut components: Vec<_> = path.components().collect();
        components.pop();
        let mut dir_path = PathBuf::new();
        for component in components {
            if let Component::Normal(x) = component {
                dir_path.push(x);
                self.files.insert(
                    dir_path.clone(),
                    FileWithMetadata {
                        handle: Bytes::new(),
                        size: 0,
                        modified: None,
                        is_dir: true,
                    },
                );
            }
        }

        let size = data.len() as u64;
        self.files.insert(
            path,
            FileWithMetadata {
                handle: data,
                size,
                modified,
                is_dir: false,
            },
        );

        self
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the filesystem has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileOpener for MemoryFs {
    type File = Cursor<Bytes>;
    type Future = Ready<Result<FileWithMetadata<Self::File>, Error>>;

    fn open(&self, path: &Path) -> Self::Future {
        // The root is always a directory, even when nothing was added.
        if path.components().next().is_none() {
            return ready(Ok(FileWithMetadata {
                handle: Cursor::new(Bytes::new()),
                size: 0,
                modified: None,
                is_dir: true,
            }));
        }

        ready(
            self.files
                .get(path)
                .map(|file| FileWithMetadata {
                    handle: Cursor::new(file.handle.clone()),
                    size: file.size,
                    modified: file.modified,
                    is_dir: file.is_dir,
                })
                .ok_or_else(|| Error::new(ErrorKind::NotFound, "Not found")),
        )
    }
}

/// File handle produced by a `ContentLocation`.
#[derive(Debug)]
pub enum ContentFile {
    /// A file opened on the filesystem.
    File(File),
    /// A file held in memory.
    Memory(Cursor<Bytes>),
}

impl AsyncRead for ContentFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<(), Error>> {
        match self.get_mut() {
            ContentFile::File(file) => Pin::new(file).poll_read(cx, buf),
            ContentFile::Memory(cursor) => Pin::new(cursor).poll_read(cx, buf),
        }
    }
}

/// Outcome of resolving a relative path against a `ContentLocation`.
#[derive(Debug)]
pub enum Resource<F = ContentFile> {
    /// Nothing exists at the path.
    Missing,
    /// Something exists at the path, but it cannot be streamed. Typically a directory.
    Unreadable,
    /// A file that can be streamed.
    Readable(FileWithMetadata<F>),
}

impl<F> Resource<F> {
    /// Whether something exists at the path.
    pub fn exists(&self) -> bool {
        !matches!(self, Resource::Missing)
    }

    /// Whether bytes can be streamed from the resource.
    pub fn is_readable(&self) -> bool {
        matches!(self, Resource::Readable(_))
    }
}

/// Some IO errors are expected when resolving, and mapped to a regular result here.
fn map_open_err<F>(err: Error) -> Result<Resource<F>, Error> {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => Ok(Resource::Missing),
        ErrorKind::PermissionDenied => Ok(Resource::Unreadable),
        _ => Err(err),
    }
}

fn embedded_prefix(location: &str) -> Option<&str> {
    let head = location.get(..EMBEDDED_PREFIX.len())?;
    if head.eq_ignore_ascii_case(EMBEDDED_PREFIX) {
        location.get(EMBEDDED_PREFIX.len()..)
    } else {
        None
    }
}

/// A root from which relative paths resolve to readable resources.
///
/// Either the bundled resource tree, or a live filesystem directory.
#[derive(Debug)]
pub enum ContentLocation {
    /// Read-only resources bundled at build time.
    Embedded(MemoryFs),
    /// A directory on the filesystem.
    FileSystem(TokioFileOpener),
}

impl ContentLocation {
    /// Select the backing store for a location string.
    ///
    /// Locations starting with `embedded:` select a directory of the bundled resource tree. Any
    /// other value is a filesystem path.
    pub fn parse(location: &str) -> Self {
        match embedded_prefix(location) {
            Some(prefix) => ContentLocation::Embedded(MemoryFs::bundled(prefix)),
            None => ContentLocation::FileSystem(TokioFileOpener::new(location)),
        }
    }

    /// Select the backing store for the content location of a `ResolverConfig`.
    ///
    /// If a filesystem location is not an existing directory, a warning is logged and the
    /// bundled default content is used instead.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let location = config.content_root();
        if embedded_prefix(&location).is_none() && !Path::new(&location).is_dir() {
            warn!(
                "Content location {} does not exist, using fallback location {}",
                location, DEFAULT_CONTENT_LOCATION
            );
            return Self::parse(DEFAULT_CONTENT_LOCATION);
        }
        Self::parse(&location)
    }

    /// Whether this location is backed by the bundled resource tree.
    pub fn is_embedded(&self) -> bool {
        matches!(self, ContentLocation::Embedded(_))
    }

    /// Resolve a relative path to a resource.
    ///
    /// `..` segments cannot escape the root. Errors are only returned for unexpected IO errors;
    /// a missing target is reflected as `Resource::Missing`.
    pub async fn resolve(&self, path: &str) -> Result<Resource, Error> {
        let relative = sanitize_path(path);
        let opened = match self {
            ContentLocation::Embedded(fs) => fs
                .open(&relative)
                .await
                .map(|file| file.map_handle(ContentFile::Memory)),
            ContentLocation::FileSystem(opener) => opener
                .open(&relative)
                .await
                .map(|file| file.map_handle(ContentFile::File)),
        };

        match opened {
            Ok(file) if file.is_dir => Ok(Resource::Unreadable),
            Ok(file) => Ok(Resource::Readable(file)),
            Err(err) => map_open_err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn memory_fs() -> MemoryFs {
        let mut fs = MemoryFs::default();
        fs.add("index.html", Bytes::from_static(b"index"), None)
            .add("dir/dir.html", Bytes::from_static(b"dir"), None);
        fs
    }

    #[tokio::test]
    async fn test_memory_fs_implies_directories() {
        assert_eq!(memory_fs().len(), 3);
        let location = ContentLocation::Embedded(memory_fs());

        let dir = location.resolve("dir").await.unwrap();
        assert!(dir.exists());
        assert!(!dir.is_readable());

        let missing = location.resolve("nope.html").await.unwrap();
        assert!(!missing.exists());
        assert!(!missing.is_readable());
    }

    #[tokio::test]
    async fn test_root_is_an_unreadable_directory() {
        for location in vec![
            ContentLocation::Embedded(memory_fs()),
            ContentLocation::Embedded(MemoryFs::default()),
            ContentLocation::parse(std::env::temp_dir().to_str().unwrap()),
        ] {
            for path in &["", "/", "."] {
                let root = location.resolve(path).await.unwrap();
                assert!(root.exists());
                assert!(!root.is_readable());
            }
        }
    }

    #[test]
    fn test_open_errors_map_to_resources() {
        assert!(matches!(
            map_open_err::<()>(Error::from(ErrorKind::NotFound)),
            Ok(Resource::Missing)
        ));
        assert!(matches!(
            map_open_err::<()>(Error::from(ErrorKind::NotADirectory)),
            Ok(Resource::Missing)
        ));
        assert!(matches!(
            map_open_err::<()>(Error::from(ErrorKind::PermissionDenied)),
            Ok(Resource::Unreadable)
        ));

        let err = map_open_err::<()>(Error::new(ErrorKind::Other, "disk on fire")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(map_open_err::<()>(Error::from(ErrorKind::InvalidData)).is_err());
    }

    #[tokio::test]
    async fn test_resolve_reads_file() {
        let location = ContentLocation::Embedded(memory_fs());
        let mut file = match location.resolve("/xxx/../dir/dir.html").await.unwrap() {
            Resource::Readable(file) => file,
            other => panic!("unexpected resource: {:?}", other),
        };
        assert_eq!(file.size, 3);

        let mut body = String::new();
        file.handle.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "dir");
    }

    #[tokio::test]
    async fn test_bundled_content() {
        let location = ContentLocation::parse("EMBEDDED:/content/");
        assert!(location.is_embedded());
        assert!(location.resolve("index.html").await.unwrap().is_readable());
        assert!(location.resolve("stra\u{df}e/enc.html").await.unwrap().is_readable());
        assert!(!location.resolve("dir").await.unwrap().is_readable());

        assert!(MemoryFs::bundled("no-such-dir").is_empty());
        assert!(!MemoryFs::bundled("").is_empty());
    }

    #[test]
    fn test_missing_directory_falls_back_to_bundled_content() {
        let mut config = ResolverConfig::new();
        config.content_location("/nonexistent/scs/content");
        assert!(ContentLocation::from_config(&config).is_embedded());
    }

    #[test]
    fn test_parse_selects_filesystem() {
        match ContentLocation::parse("/tmp/") {
            ContentLocation::FileSystem(opener) => assert_eq!(opener.root, PathBuf::from("/tmp/")),
            other => panic!("unexpected location: {:?}", other),
        }
    }
}
