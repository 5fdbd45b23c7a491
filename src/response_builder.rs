use crate::resolve::ResolveResult;
use crate::util::FileResponseBuilder;
use http::response::Builder as HttpResponseBuilder;
use http::{Request, Response, Result, StatusCode};
use hyper::Body;

/// Utility to build the default response for a `resolve` result.
///
/// This struct allows direct access to its fields, but these fields are typically initialized by
/// the accessors, using the builder pattern.
#[derive(Clone, Debug, Default)]
pub struct ResponseBuilder {
    /// Inner file response builder.
    pub file_response_builder: FileResponseBuilder,
}

impl ResponseBuilder {
    /// Create a new response builder with a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply parameters based on a request, for conditional and `HEAD` handling.
    pub fn request<B>(&mut self, req: &Request<B>) -> &mut Self {
        self.file_response_builder.request(req);
        self
    }

    /// Add cache headers to responses for the given lifespan.
    pub fn cache_headers(&mut self, value: Option<u32>) -> &mut Self {
        self.file_response_builder.cache_headers(value);
        self
    }

    /// Build a response for the given `resolve` result.
    ///
    /// Methods other than `GET` and `HEAD` get a 400 response. Anything that resolved to no
    /// content gets a 404 response.
    pub fn build(&self, result: ResolveResult) -> Result<Response<Body>> {
        match result {
            ResolveResult::MethodNotMatched => HttpResponseBuilder::new()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::empty()),
            ResolveResult::UriNotMatched | ResolveResult::NotFound => HttpResponseBuilder::new()
                .status(StatusCode::NOT_FOUND)
                .body(Body::empty()),
            ResolveResult::Found(file) => self.file_response_builder.build(file),
        }
    }
}
