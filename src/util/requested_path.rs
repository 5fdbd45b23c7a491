use std::path::{Component, Path, PathBuf};

#[inline]
fn is_blank(c: char) -> bool {
    c <= ' ' || c == '\u{7f}'
}

/// Strip leading whitespace, control characters and slashes from a path.
///
/// A single leading slash is kept if any slash was skipped. A path consisting only of such
/// characters becomes `/` if it contained a slash, and the empty string otherwise.
pub fn strip_blank_prefix(path: &str) -> String {
    let mut slash = false;
    for (i, c) in path.char_indices() {
        if c == '/' {
            slash = true;
        } else if !is_blank(c) {
            if i == 0 || (i == 1 && slash) {
                return path.to_owned();
            }
            let rest = &path[i..];
            return if slash {
                format!("/{}", rest)
            } else {
                rest.to_owned()
            };
        }
    }
    String::from(if slash { "/" } else { "" })
}

/// Percent-decode a path as UTF-8. Paths without a `%` are returned as-is.
///
/// Invalid sequences are kept literally, and invalid UTF-8 is replaced, so this never fails.
#[inline]
pub fn decode_percents(string: &str) -> String {
    if !string.contains('%') {
        return string.to_owned();
    }
    percent_encoding::percent_decode_str(string)
        .decode_utf8_lossy()
        .into_owned()
}

/// Turn a request path into a relative path that cannot escape the root.
pub fn sanitize_path(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .fold(PathBuf::new(), |mut result, p| match p {
            Component::Normal(x) => {
                // Parse again to prevent a malicious component containing
                // a Windows drive letter, e.g.: `/anypath/c:/windows/win.ini`
                if Path::new(&x)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
                {
                    result.push(x);
                }
                result
            }
            Component::ParentDir => {
                result.pop();
                result
            }
            _ => result,
        })
}
