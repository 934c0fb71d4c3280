use agent_poker_server::api::rate_limit::RateLimiter;
use agent_poker_server::{actor, api, config, create_app, db};
use std::net::SocketAddr;
use std::sync::Arc;

/// How often the clock task feeds ticks to the table actors. Fine enough
/// that action timeouts and the showdown cooldown land close to schedule.
const CLOCK_TICK_MS: u64 = 250;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env();
    tracing::info!("Starting agent poker server on {}", config.server_addr());

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");
    db::run_migrations(&pool).await?;

    let manager = Arc::new(actor::TableManager::load(pool.clone()).await?);
    tracing::info!("Restored {} tables", manager.table_count().await);

    let state = Arc::new(api::AppState {
        pool,
        manager: manager.clone(),
        limiter: RateLimiter::new(),
        admin_key: config.admin_key.clone(),
    });
    let app = create_app(state);

    // Background clock: drives action timeouts and between-hand scheduling
    // for every table.
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_millis(CLOCK_TICK_MS));
        loop {
            interval.tick().await;
            manager.tick(api::now_ms()).await;
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("Server listening on {}", config.server_addr());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
