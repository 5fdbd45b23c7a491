use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::Error as IoError;
use std::iter::FromIterator;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location prefix that selects the bundled resource tree instead of the filesystem.
pub const EMBEDDED_PREFIX: &str = "embedded:";

/// The content location used by default, and as the fallback for a missing directory.
pub const DEFAULT_CONTENT_LOCATION: &str = "embedded:content/";

/// Errors that can occur while loading a `ResolverConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path:?}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: IoError,
    },
    /// The configuration is not valid TOML, or doesn't fit the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Ordered mapping of directory pattern to index file name.
///
/// The order of entries is significant: the first pattern matching a path wins. When
/// deserialized, entries keep the order in which they appear in the source document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryIndexMap {
    entries: Vec<(String, String)>,
}

impl DirectoryIndexMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the end of the map.
    ///
    /// If the pattern is already present, its index is replaced and it keeps its position.
    pub fn insert(&mut self, pattern: impl Into<String>, index: impl Into<String>) -> &mut Self {
        let pattern = pattern.into();
        let index = index.into();
        match self.entries.iter_mut().find(|(key, _)| *key == pattern) {
            Some(entry) => entry.1 = index,
            None => self.entries.push((pattern, index)),
        }
        self
    }

    /// Whether the map has an entry for exactly this (possibly bracket-wrapped) pattern.
    pub fn contains_key(&self, pattern: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == pattern)
    }

    /// Iterate over `(pattern, index)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(pattern, index)| (pattern.as_str(), index.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DirectoryIndexMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (pattern, index) in iter {
            map.insert(pattern, index);
        }
        map
    }
}

struct DirectoryIndexMapVisitor;

impl<'de> Visitor<'de> for DirectoryIndexMapVisitor {
    type Value = DirectoryIndexMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a table of directory pattern to index file name")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = DirectoryIndexMap::new();
        while let Some((pattern, index)) = access.next_entry::<String, String>()? {
            map.insert(pattern, index);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for DirectoryIndexMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DirectoryIndexMapVisitor)
    }
}

/// Settings for static content resolution.
///
/// This struct allows direct access to its fields, but these fields are typically initialized by
/// the accessors, using the builder pattern, or deserialized from a TOML document. Every field
/// has a default, so an empty document is a valid configuration:
///
/// ```toml
/// pattern = "/**"
/// content_location = "/var/www/content"
/// default_index = "index.html"
///
/// [directory_pattern_index_map]
/// "[/dir/**]" = "dir.html"
/// "[/**]" = "index.html"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Route pattern gating which request paths are resolved.
    pub pattern: String,
    /// Root to resolve paths against: `embedded:<dir>` or a filesystem directory.
    pub content_location: String,
    /// Index file name used when no directory pattern matches.
    pub default_index: String,
    /// Directory patterns and their index file names, in match order.
    pub directory_pattern_index_map: DirectoryIndexMap,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            pattern: "/**".to_owned(),
            content_location: DEFAULT_CONTENT_LOCATION.to_owned(),
            default_index: "index.html".to_owned(),
            directory_pattern_index_map: DirectoryIndexMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Set the route pattern.
    pub fn pattern(&mut self, value: impl Into<String>) -> &mut Self {
        self.pattern = value.into();
        self
    }

    /// Set the content location.
    pub fn content_location(&mut self, value: impl Into<String>) -> &mut Self {
        self.content_location = value.into();
        self
    }

    /// Set the default index file name.
    pub fn default_index(&mut self, value: impl Into<String>) -> &mut Self {
        self.default_index = value.into();
        self
    }

    /// Append a directory pattern with its index file name.
    pub fn directory_index(
        &mut self,
        pattern: impl Into<String>,
        index: impl Into<String>,
    ) -> &mut Self {
        self.directory_pattern_index_map.insert(pattern, index);
        self
    }

    /// The content location, trimmed and always ending with a slash.
    pub fn content_root(&self) -> String {
        let mut root = self.content_location.trim().to_owned();
        if !root.ends_with('/') {
            root.push('/');
        }
        root
    }
}
