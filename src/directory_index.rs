use crate::config::{DirectoryIndexMap, ResolverConfig};
use crate::pattern;
use tracing::debug;

const CATCH_ALL: &str = "/**";

/// Strip the bracket wrapping some configuration formats need around keys containing slashes.
fn unwrap_brackets(key: &str) -> &str {
    let key = key.strip_prefix('[').unwrap_or(key);
    key.strip_suffix(']').unwrap_or(key)
}

/// Decides which index file to serve for a path that denotes a directory.
///
/// Patterns are tried in configured order and the first match wins. A catch-all `/**` entry
/// mapping to the default index is appended at construction if the configuration has none, so
/// `find` returns a result for every path.
#[derive(Clone, Debug)]
pub struct DirectoryIndex {
    entries: Vec<(String, String)>,
}

impl DirectoryIndex {
    /// Build the effective index rules from a pattern map and a default index name.
    pub fn new(map: &DirectoryIndexMap, default_index: &str) -> Self {
        let mut entries: Vec<(String, String)> = map
            .iter()
            .map(|(key, index)| (unwrap_brackets(key).to_owned(), index.to_owned()))
            .collect();

        let bracketed = format!("[{}]", CATCH_ALL);
        if !(map.contains_key(CATCH_ALL) || map.contains_key(&bracketed)) {
            entries.push((CATCH_ALL.to_owned(), default_index.to_owned()));
        }

        DirectoryIndex { entries }
    }

    /// Build the effective index rules of a `ResolverConfig`.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(&config.directory_pattern_index_map, &config.default_index)
    }

    /// Find the index file name for `request_path`.
    ///
    /// The path is given a leading slash before matching; an empty path is treated as `/`.
    /// A leading slash on the configured index name is dropped.
    pub fn find(&self, request_path: &str) -> Option<&str> {
        let trimmed = request_path.trim_matches(|c: char| c <= ' ');
        let path = if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{}", trimmed)
        };
        debug!("Looking for index of {}", path);

        self.entries
            .iter()
            .find(|(glob, _)| pattern::matches(glob, &path))
            .map(|(glob, index)| {
                debug!("Pattern {} matches path {}", glob, path);
                index.strip_prefix('/').unwrap_or(index.as_str())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_for(entries: &[(&str, &str)], default_index: &str, path: &str) -> Option<String> {
        let map: DirectoryIndexMap = entries.iter().copied().collect();
        DirectoryIndex::new(&map, default_index)
            .find(path)
            .map(str::to_owned)
    }

    #[test]
    fn test_first_match_wins() {
        let entries = [("/dir/**", "dir.html"), ("/**", "index.html")];
        assert_eq!(
            index_for(&entries, "index.html", "/dir/anything").as_deref(),
            Some("dir.html")
        );

        let reversed = [("/**", "index.html"), ("/dir/**", "dir.html")];
        assert_eq!(
            index_for(&reversed, "index.html", "/dir/anything").as_deref(),
            Some("index.html")
        );
    }

    #[test]
    fn test_default_index_is_synthesized() {
        let entries = [("/somewhere/**", "some.html")];
        assert_eq!(
            index_for(&entries, "/home.html", "/somewhere/over/the/rainbow").as_deref(),
            Some("some.html")
        );
        assert_eq!(
            index_for(&entries, "/home.html", "/nowhere/man").as_deref(),
            Some("home.html")
        );
        assert_eq!(index_for(&entries, "/home.html", "").as_deref(), Some("home.html"));
    }

    #[test]
    fn test_bracketed_catch_all_is_not_duplicated() {
        let map: DirectoryIndexMap = vec![("[/**]", "main.html")].into_iter().collect();
        let index = DirectoryIndex::new(&map, "index.html");
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.find("/anything"), Some("main.html"));
    }

    #[test]
    fn test_bracketed_keys_match_like_plain_keys() {
        let entries = [("[/dir/**]", "dir.html"), ("[/**]", "index.html")];
        assert_eq!(index_for(&entries, "x.html", "dir").as_deref(), Some("dir.html"));
        assert_eq!(index_for(&entries, "x.html", "/other").as_deref(), Some("index.html"));
    }

    #[test]
    fn test_control_characters_are_trimmed() {
        let entries = [("/dir/**", "dir.html")];
        assert_eq!(
            index_for(&entries, "index.html", "\u{1}/dir/x").as_deref(),
            Some("dir.html")
        );
        assert_eq!(
            index_for(&entries, "index.html", " dir/x\t").as_deref(),
            Some("dir.html")
        );
    }

    #[test]
    fn test_find_is_total_with_catch_all() {
        let index = DirectoryIndex::new(&DirectoryIndexMap::new(), "index.html");
        for path in &["", "/", "a", "/a/b/c", " /x ", "//", "\u{7f}", "stra\u{df}e/"] {
            assert_eq!(index.find(path), Some("index.html"));
        }
    }
}
