use super::FileBytesStream;
use crate::resolve::ResolvedFile;
use http::response::Builder as ResponseBuilder;
use http::{header, HeaderValue, Method, Request, Response, Result, StatusCode};
use hyper::Body;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time since the Unix epoch. HTTP dates only carry whole seconds of it.
fn unix_seconds(time: SystemTime) -> Option<Duration> {
    time.duration_since(UNIX_EPOCH).ok()
}

/// Utility to build responses for serving a `ResolvedFile`.
///
/// This struct allows direct access to its fields, but these fields are typically initialized by
/// the accessors, using the builder pattern. The fields are basically a bunch of settings that
/// determine the response details.
#[derive(Clone, Debug, Default)]
pub struct FileResponseBuilder {
    /// Whether to send cache headers, and what lifespan to indicate.
    pub cache_headers: Option<u32>,
    /// Whether this is a `HEAD` request, with no response body.
    pub is_head: bool,
    /// The parsed value of the `If-Modified-Since` request header.
    pub if_modified_since: Option<SystemTime>,
}

impl FileResponseBuilder {
    /// Create a new builder with a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply parameters based on a request.
    pub fn request<B>(&mut self, req: &Request<B>) -> &mut Self {
        self.method(req.method());
        self.if_modified_since_header(req.headers().get(header::IF_MODIFIED_SINCE));
        self
    }

    /// Add cache headers to responses for the given lifespan.
    pub fn cache_headers(&mut self, value: Option<u32>) -> &mut Self {
        self.cache_headers = value;
        self
    }

    /// Build responses for the given request method.
    pub fn method(&mut self, value: &Method) -> &mut Self {
        self.is_head = *value == Method::HEAD;
        self
    }

    /// Build responses for the given `If-Modified-Since` request header value.
    pub fn if_modified_since_header(&mut self, value: Option<&HeaderValue>) -> &mut Self {
        self.if_modified_since = value
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok());
        self
    }

    /// Build a response for the given resolved file.
    pub fn build(&self, file: ResolvedFile) -> Result<Response<Body>> {
        let mut res = ResponseBuilder::new();

        // Set `Last-Modified` and check `If-Modified-Since`.
        if let Some(modified) = file.modified {
            if let Some(modified_unix) = unix_seconds(modified) {
                let not_modified = self
                    .if_modified_since
                    .and_then(unix_seconds)
                    .map_or(false, |since| modified_unix.as_secs() <= since.as_secs());
                if not_modified {
                    return ResponseBuilder::new()
                        .status(StatusCode::NOT_MODIFIED)
                        .body(Body::empty());
                }

                res = res
                    .header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified))
                    .header(
                        header::ETAG,
                        format!(
                            "W/\"{0:x}-{1:x}.{2:x}\"",
                            file.size,
                            modified_unix.as_secs(),
                            modified_unix.subsec_nanos()
                        ),
                    );
            }
        }

        // Build remaining headers.
        res = res
            .header(header::CONTENT_LENGTH, file.size)
            .header(header::CONTENT_TYPE, file.content_type.as_ref());
        if let Some(seconds) = self.cache_headers {
            res = res.header(
                header::CACHE_CONTROL,
                format!("public, max-age={}", seconds),
            );
        }

        // Stream the body.
        res.status(StatusCode::OK).body(if self.is_head {
            Body::empty()
        } else {
            Body::wrap_stream(FileBytesStream::new(file.handle))
        })
    }
}
