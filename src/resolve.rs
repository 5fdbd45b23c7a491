use crate::config::ResolverConfig;
use crate::directory_index::DirectoryIndex;
use crate::pattern;
use crate::util::{decode_percents, sanitize_path, strip_blank_prefix};
use crate::vfs::{ContentFile, ContentLocation, FileWithMetadata, Resource};
use http::{Method, Request};
use mime_guess::{Mime, MimeGuess};
use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::debug;

/// A readable file found by `ResourceLookup`.
#[derive(Debug)]
pub struct ResolvedFile<F = ContentFile> {
    /// Open file handle.
    pub handle: F,
    /// Path of the file, relative to the content location.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// MIME type guessed from the file extension.
    pub content_type: Mime,
}

impl<F> ResolvedFile<F> {
    fn new(file: FileWithMetadata<F>, path: &str) -> Self {
        let path = sanitize_path(path);
        let content_type = MimeGuess::from_path(&path).first_or_octet_stream();
        ResolvedFile {
            handle: file.handle,
            path,
            size: file.size,
            modified: file.modified,
            content_type,
        }
    }
}

/// The result of `resolve`.
///
/// Covers all the possible 'normal' scenarios encountered when serving static content.
#[derive(Debug)]
pub enum ResolveResult {
    /// The request was not `GET` or `HEAD` request,
    MethodNotMatched,
    /// The request URI was not just a path.
    UriNotMatched,
    /// No resource was found for the request path.
    NotFound,
    /// The requested resource was found.
    Found(ResolvedFile),
}

/// Maps request paths to resources in a content location.
///
/// A lookup is built once from a `ResolverConfig` and is read-only afterwards, so it can be
/// shared between concurrent requests.
#[derive(Debug)]
pub struct ResourceLookup {
    pattern: String,
    location: ContentLocation,
    index: DirectoryIndex,
}

impl ResourceLookup {
    /// Create a lookup for the given configuration.
    ///
    /// If the configured content location is a filesystem directory that doesn't exist, this
    /// logs a warning and serves the bundled default content instead.
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_location(config, ContentLocation::from_config(config))
    }

    /// Create a lookup that resolves against an explicit content location.
    ///
    /// The `content_location` setting of the configuration is ignored.
    pub fn with_location(config: &ResolverConfig, location: ContentLocation) -> Self {
        ResourceLookup {
            pattern: config.pattern.clone(),
            location,
            index: DirectoryIndex::from_config(config),
        }
    }

    /// The content location paths are resolved against.
    pub fn location(&self) -> &ContentLocation {
        &self.location
    }

    /// Find the resource for a request path.
    ///
    /// The path must not contain a query string. Returns `None` if the path doesn't match the
    /// route pattern, or no readable resource exists for it, including directories without a
    /// usable index file. Only unexpected IO errors are returned as errors.
    pub async fn lookup(&self, request_path: &str) -> Result<Option<ResolvedFile>, IoError> {
        debug!("Looking for static content of request path {}", request_path);
        if !pattern::matches_route(&self.pattern, request_path) {
            debug!(
                "Pattern {} does not match request path, no static content",
                self.pattern
            );
            return Ok(None);
        }

        let extracted = pattern::extract_path_within_pattern(&self.pattern, request_path);
        debug!("Extracted path is {}", extracted);
        let mut path = decode_percents(&strip_blank_prefix(&extracted));
        debug!("Processed path is {}", path);

        if path.is_empty() {
            path = match self.index.find(&path) {
                Some(index) => index.to_owned(),
                None => {
                    debug!("No index file was found, no static content");
                    return Ok(None);
                }
            };
            debug!("Path is empty, using index file {}", path);
        }

        let mut resource = self.location.resolve(&path).await?;
        debug!(
            "Resource exists? {}, resource is readable? {}",
            resource.exists(),
            resource.is_readable()
        );
        if resource.exists() && !resource.is_readable() {
            // Compared against the candidate path, so an index equal to it counts as none.
            let with_index = self.directory_index_path(&path);
            if with_index == path {
                debug!("No index file was found, no static content");
                return Ok(None);
            }
            path = with_index;
            resource = self.location.resolve(&path).await?;
        }

        match resource {
            Resource::Readable(file) => {
                debug!("Returning static content resource {}", path);
                Ok(Some(ResolvedFile::new(file, &path)))
            }
            _ => {
                debug!("Resource {} does not exist or is not readable", path);
                Ok(None)
            }
        }
    }

    /// Append the directory index to `path`, or return `path` unchanged if there is none.
    fn directory_index_path(&self, path: &str) -> String {
        match self.index.find(path) {
            Some(index) if path.is_empty() => index.to_owned(),
            Some(index) => format!("{}/{}", path, index),
            None => path.to_owned(),
        }
    }
}

/// Resolve the request by looking up its path.
///
/// Only `GET` and `HEAD` requests with a plain path URI are resolved; the query string is
/// ignored. The returned future may error for unexpected IO errors, passing on the
/// `std::io::Error`. Missing content is reflected in the result as `NotFound`.
pub async fn resolve<B>(
    lookup: &ResourceLookup,
    req: &Request<B>,
) -> Result<ResolveResult, IoError> {
    // Handle only `GET`/`HEAD` and absolute paths.
    match *req.method() {
        Method::HEAD | Method::GET => {}
        _ => {
            return Ok(ResolveResult::MethodNotMatched);
        }
    }

    // Handle only simple path requests.
    if req.uri().scheme_str().is_some() || req.uri().host().is_some() {
        return Ok(ResolveResult::UriNotMatched);
    }

    Ok(match lookup.lookup(req.uri().path()).await? {
        Some(file) => ResolveResult::Found(file),
        None => ResolveResult::NotFound,
    })
}
