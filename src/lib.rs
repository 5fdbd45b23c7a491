#![crate_name = "hyper_staticcontent"]
#![deny(missing_docs)]

//! Static content serving for [Hyper 0.14](https://github.com/hyperium/hyper), with route
//! patterns and per-directory index rules.
//!
//! This library exports a high-level service `Static`, and the lower-level pieces it is built
//! from: `ResourceLookup` to map a request path to a resource, `ResponseBuilder` to turn the
//! result into a response, and the `ContentLocation` the resources are read from.
//!
//! ## Basic usage
//!
//! ```rust
//! use hyper_staticcontent::{ResolverConfig, Static};
//!
//! let mut config = ResolverConfig::new();
//! config
//!     .content_location("my/doc/root/")
//!     .directory_index("/docs/**", "start.html");
//!
//! // Cheap to clone; the configuration is resolved once and shared.
//! let static_ = Static::new(&config);
//!
//! // A dummy request, but normally obtained from Hyper.
//! let request = http::Request::get("/docs/").body(()).unwrap();
//!
//! // Serve the request. Returns a future for a `hyper::Response`.
//! let response_future = static_.clone().serve(request);
//! ```
//!
//! ## Resolution
//!
//! A request path is first matched against the route pattern (`/**` by default). The part of the
//! path covered by the pattern's wildcards is stripped of leading control characters,
//! percent-decoded, and resolved against the content location.
//!
//! If that path is empty, or names something that exists but cannot be read as a file (such as a
//! directory), the directory index rules pick a file name to append. The rules are an ordered
//! list of Ant-style patterns, and the first one matching the path wins. A catch-all `/**` rule
//! for the default index (`index.html`) is always present.
//!
//! Anything else results in 'not found', which `ResponseBuilder` turns into a 404 response.
//!
//! ## Content locations
//!
//! A content location of the form `embedded:<dir>` serves a directory of the resource tree
//! bundled into the crate at build time. Any other location is a directory on the filesystem,
//! which is read on every request. If that directory doesn't exist when the lookup is created,
//! a warning is logged and the bundled `embedded:content/` tree is served instead.
//!
//! ## Advanced usage
//!
//! ```rust
//! use hyper_staticcontent::{resolve, ResolverConfig, ResourceLookup, ResponseBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let lookup = ResourceLookup::new(&ResolverConfig::new());
//!
//!     // A dummy request, but normally obtained from Hyper.
//!     let request = http::Request::get("/example.html").body(()).unwrap();
//!
//!     // First, resolve the request. Returns a future for a `ResolveResult`.
//!     let result = resolve(&lookup, &request).await.unwrap();
//!
//!     // Then, build a response based on the result.
//!     let response = ResponseBuilder::new()
//!         .request(&request)
//!         .build(result)
//!         .unwrap();
//! }
//! ```

mod config;
mod directory_index;
mod pattern;
mod resolve;
mod response_builder;
mod service;
mod util;
mod vfs;

pub use crate::config::*;
pub use crate::directory_index::*;
pub use crate::pattern::{extract_path_within_pattern, matches, matches_route};
pub use crate::resolve::*;
pub use crate::response_builder::*;
pub use crate::service::*;
pub use crate::util::{FileBytesStream, FileResponseBuilder};
pub use crate::vfs::*;
