use nestrs::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod app_module;
mod infrastructure;
mod modules;

use app_module::AppModule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nestrs=debug")),
        )
        .init();

    tracing::info!("🚀 Starting Example Server...");

    let options = ServerOptions::from_env()
        .title("example-server")
        .description("Users and products on nestrs");
    let mut app = NestFactory::create::<AppModule>(options)?;
    app.use_middleware(|router| router.layer(TraceLayer::new_for_http()));

    for route in app.get_server().get_router().iter() {
        tracing::info!("Mapped {{{}, {}}} -> {}", route.path, route.method, route.endpoint);
    }

    let config = app.get::<ConfigService>()?;
    let host = config.get_or("HOST", "0.0.0.0");
    let port = config.get_or("PORT", "3000").parse::<u16>()?;

    app.listen(&host, port).await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
