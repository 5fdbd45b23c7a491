//! Ant-style path patterns.
//!
//! Patterns are split on `/` into segments. Within a segment, `*` matches any run of characters,
//! `?` matches exactly one character and `{name}` matches like `*`. A segment consisting of
//! exactly `**` matches zero or more whole segments.

use crate::util::decode_percents;

fn segments(value: &str) -> impl Iterator<Item = &str> {
    value.split('/').filter(|segment| !segment.is_empty())
}

fn is_wildcard(segment: &str) -> bool {
    segment.contains(|c: char| c == '*' || c == '?' || c == '{')
}

/// Test whether `path` matches the Ant-style `pattern`.
///
/// The pattern and the path must agree on having a leading slash. Once the pattern is used up,
/// they must also agree on having a trailing slash, unless the pattern ended in `**`.
pub fn matches(pattern: &str, path: &str) -> bool {
    if pattern.starts_with('/') != path.starts_with('/') {
        return false;
    }

    let pattern_segments: Vec<&str> = segments(pattern).collect();
    let path_segments: Vec<&str> = segments(path).collect();
    let trailing = TrailingSlash {
        pattern: pattern.ends_with('/'),
        path: path.ends_with('/'),
    };
    match_segments(&pattern_segments, &path_segments, trailing)
}

/// Test whether a request path falls under the route `pattern`.
///
/// Unlike `matches`, each path segment is percent-decoded before it is compared, so a literal
/// such as `/my docs/**` matches `/my%20docs/a.html`. An encoded `%2F` stays inside its segment.
/// A trailing slash on the path is optional when the pattern has none.
pub fn matches_route(pattern: &str, path: &str) -> bool {
    if pattern.starts_with('/') != path.starts_with('/') {
        return false;
    }

    let decoded: Vec<String> = segments(path).map(decode_percents).collect();
    let path_segments: Vec<&str> = decoded.iter().map(String::as_str).collect();
    let pattern_segments: Vec<&str> = segments(pattern).collect();
    let trailing = TrailingSlash {
        pattern: pattern.ends_with('/'),
        path: path.ends_with('/'),
    };
    match_segments(&pattern_segments, &path_segments, trailing)
        || (trailing.path
            && !trailing.pattern
            && match_segments(
                &pattern_segments,
                &path_segments,
                TrailingSlash {
                    pattern: false,
                    path: false,
                },
            ))
}

#[derive(Clone, Copy)]
struct TrailingSlash {
    pattern: bool,
    path: bool,
}

fn match_segments(pattern: &[&str], path: &[&str], trailing: TrailingSlash) -> bool {
    let (first, rest) = match pattern.split_first() {
        Some(pair) => pair,
        None => return path.is_empty() && trailing.pattern == trailing.path,
    };

    if *first == "**" {
        if rest.is_empty() {
            return true;
        }
        return (0..=path.len()).any(|skip| match_segments(rest, &path[skip..], trailing));
    }

    match path.split_first() {
        Some((segment, path_rest)) => {
            match_segment(first, segment) && match_segments(rest, path_rest, trailing)
        }
        // `/dir/*` still matches `/dir/`.
        None if pattern.len() == 1 && pattern[0] == "*" => trailing.path,
        None => pattern.iter().all(|p| *p == "**"),
    }
}

/// Replace every `{...}` variable with a plain `*`.
fn collapse_variables(pattern: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    out.push('*');
                }
                depth += 1;
            }
            '}' if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            _ => out.push(c),
        }
    }
    out
}

fn match_segment(pattern: &str, segment: &str) -> bool {
    let pattern = collapse_variables(pattern);
    let segment: Vec<char> = segment.chars().collect();

    let (mut p, mut s) = (0, 0);
    // Position of the last `*` seen, and the segment position it was tried against.
    let mut star: Option<(usize, usize)> = None;
    while s < segment.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == segment[s]) {
            p += 1;
            s += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, s));
            p += 1;
        } else if let Some((star_p, star_s)) = star {
            p = star_p + 1;
            s = star_s + 1;
            star = Some((star_p, star_s + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

/// Extract the part of `path` covered by the wildcard portion of `pattern`.
///
/// The leading literal segments of the pattern are dropped from the path, as are leading and
/// trailing separators, and runs of adjacent separators are collapsed. A pattern without any
/// wildcard yields the empty string.
///
/// The path is assumed to match the pattern.
pub fn extract_path_within_pattern(pattern: &str, path: &str) -> String {
    let mut literal_prefix = 0;
    let mut has_wildcard = false;
    for segment in segments(pattern) {
        if is_wildcard(segment) {
            has_wildcard = true;
            break;
        }
        literal_prefix += 1;
    }
    if !has_wildcard {
        return String::new();
    }

    segments(path)
        .skip(literal_prefix)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_star_matches_everything() {
        assert!(matches("/**", "/"));
        assert!(matches("/**", "/index.html"));
        assert!(matches("/**", "/dir/sub/file.html"));
        assert!(matches("/**", "/dir/"));
    }

    #[test]
    fn test_double_star_matches_zero_segments() {
        assert!(matches("/dir/**", "/dir"));
        assert!(matches("/dir/**", "/dir/"));
        assert!(matches("/dir/**", "/dir/anything"));
        assert!(!matches("/dir/**", "/directory"));
        assert!(!matches("/dir/**", "/other/dir"));
    }

    #[test]
    fn test_double_star_in_the_middle() {
        assert!(matches("/**/*.html", "/a/b/c.html"));
        assert!(matches("/**/*.html", "/c.html"));
        assert!(!matches("/**/*.html", "/a/b/c.css"));
        assert!(matches("/a/**/z", "/a/z"));
        assert!(matches("/a/**/z", "/a/b/c/z"));
    }

    #[test]
    fn test_single_star_stays_within_segment() {
        assert!(matches("/dir/*", "/dir/file.html"));
        assert!(!matches("/dir/*", "/dir/sub/file.html"));
        assert!(matches("/dir/*.html", "/dir/file.html"));
        assert!(!matches("/dir/*.html", "/dir/file.css"));
        assert!(matches("/dir/*", "/dir/"));
    }

    #[test]
    fn test_question_mark_and_variables() {
        assert!(matches("/file?.txt", "/file1.txt"));
        assert!(!matches("/file?.txt", "/file12.txt"));
        assert!(matches("/users/{id}/profile", "/users/42/profile"));
        assert!(!matches("/users/{id}/profile", "/users/42/43/profile"));
    }

    #[test]
    fn test_leading_and_trailing_slashes() {
        assert!(!matches("/**", "dir"));
        assert!(!matches("dir/**", "/dir"));
        assert!(matches("/dir", "/dir"));
        assert!(!matches("/dir", "/dir/"));
        assert!(!matches("/dir/", "/dir"));
    }

    #[test]
    fn test_route_decodes_segments() {
        assert!(matches_route("/my docs/**", "/my%20docs/a.html"));
        assert!(matches_route("/stra\u{df}e/**", "/stra%C3%9Fe/enc.html"));
        assert!(!matches("/my docs/**", "/my%20docs/a.html"));
        assert!(!matches_route("/a/**", "/a%2Fb"));
        assert!(!matches_route("/a/b", "/a%2Fb"));
    }

    #[test]
    fn test_route_accepts_optional_trailing_slash() {
        assert!(matches_route("/example.html", "/example.html/"));
        assert!(matches_route("/example.html", "/example.html"));
        assert!(!matches_route("/dir/", "/dir"));
        assert!(!matches("/example.html", "/example.html/"));
    }

    #[test]
    fn test_literal_patterns() {
        assert!(matches("/example.html", "/example.html"));
        assert!(!matches("/example.html", "/example.htm"));
        assert!(matches("/", "/"));
    }

    #[test]
    fn test_extract_path_within_pattern() {
        assert_eq!(extract_path_within_pattern("/**", "/"), "");
        assert_eq!(extract_path_within_pattern("/**", "/dir"), "dir");
        assert_eq!(extract_path_within_pattern("/**", "/dir/"), "dir");
        assert_eq!(
            extract_path_within_pattern("/docs/**", "/docs/cvs/commit"),
            "cvs/commit"
        );
        assert_eq!(
            extract_path_within_pattern("/docs/cvs/*.html", "/docs/cvs/commit.html"),
            "commit.html"
        );
        assert_eq!(
            extract_path_within_pattern("/docs/cvs/commit.html", "/docs/cvs/commit.html"),
            ""
        );
        assert_eq!(extract_path_within_pattern("/**", "//a///b//"), "a/b");
    }
}
