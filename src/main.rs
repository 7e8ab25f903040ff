use placement_portal::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    middleware::auth::AuthKeys,
    repository::{
        InMemoryPipelineRepository, InMemoryStudentDirectory, PgPipelineRepository,
        PgStudentDirectory, PipelineRepository, StudentDirectory,
    },
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;
    init_tracing(config.log_format);

    let (repo, directory): (Arc<dyn PipelineRepository>, Arc<dyn StudentDirectory>) =
        if config.database_url.is_some() {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            info!("Using Postgres pipeline store");
            (
                Arc::new(PgPipelineRepository::new(pool.clone())),
                Arc::new(PgStudentDirectory::new(pool)),
            )
        } else {
            tracing::warn!("DATABASE_URL is not set; pipeline state lives in memory only");
            (
                Arc::new(InMemoryPipelineRepository::new()),
                Arc::new(InMemoryStudentDirectory::new()),
            )
        };

    let app_state = AppState::new(repo, directory, config.round_page_limit);
    let keys = AuthKeys::from_secret(&config.jwt_secret);

    let app = routes::router(app_state, keys).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
