// Serves static content with the resolution rules from a TOML configuration file.
//
// Run `cargo run --example content_server -- [config.toml]`, then point your browser to
// http://localhost:3000/. Without a configuration file, the bundled content is served.

use std::net::SocketAddr;

use hyper::service::make_service_fn;
use hyper::Server;
use hyper_staticcontent::{ResolverConfig, Static};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hyper_staticcontent=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::new(),
    };
    tracing::info!(
        pattern = %config.pattern,
        content_location = %config.content_location,
        "content server starting"
    );

    let mut static_ = Static::new(&config);
    static_.cache_headers(Some(60));

    let make_service = make_service_fn(move |_| {
        let static_ = static_.clone();
        async move { Ok::<_, hyper::Error>(static_) }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let server = Server::bind(&addr).serve(make_service);
    tracing::info!("listening on http://{}", addr);
    server.await?;

    Ok(())
}
