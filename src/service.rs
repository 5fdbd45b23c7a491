use crate::config::ResolverConfig;
use crate::{resolve, ResourceLookup, ResponseBuilder};
use http::{Request, Response};
use hyper::{service::Service, Body};
use std::future::Future;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// High-level interface for serving static content.
///
/// Request paths are resolved by a shared `ResourceLookup`: they are gated by its route pattern,
/// mapped onto its content location, and directories fall back to their configured index file.
/// Anything that doesn't resolve to a readable file gets a 404 response.
///
/// This struct also implements the `hyper::Service` trait, which simply wraps `Static::serve`.
/// Cloning is cheap, the lookup is shared.
#[derive(Clone)]
pub struct Static {
    /// The lookup used to resolve request paths.
    pub lookup: Arc<ResourceLookup>,
    /// Whether to send cache headers, and what lifespan to indicate.
    pub cache_headers: Option<u32>,
}

impl Static {
    /// Create a new instance of `Static` for the given configuration.
    ///
    /// See `ResourceLookup::new` for how a missing content directory is handled.
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_lookup(ResourceLookup::new(config))
    }

    /// Create a new instance of `Static` using an existing lookup.
    pub fn with_lookup(lookup: ResourceLookup) -> Self {
        Static {
            lookup: Arc::new(lookup),
            cache_headers: None,
        }
    }

    /// Add cache headers to responses for the given lifespan.
    pub fn cache_headers(&mut self, value: Option<u32>) -> &mut Self {
        self.cache_headers = value;
        self
    }

    /// Serve a request.
    pub async fn serve<B>(self, request: Request<B>) -> Result<Response<Body>, IoError> {
        let result = resolve(&self.lookup, &request).await?;
        ResponseBuilder::new()
            .request(&request)
            .cache_headers(self.cache_headers)
            .build(result)
            .map_err(|err| IoError::new(IoErrorKind::Other, err))
    }
}

impl<B> Service<Request<B>> for Static {
    type Response = Response<Body>;
    type Error = IoError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // Only the request head is needed to resolve and respond.
        let (parts, _body) = request.into_parts();
        Box::pin(self.clone().serve(Request::from_parts(parts, ())))
    }
}
