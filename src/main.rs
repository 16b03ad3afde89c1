use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rainbow_social::{config::Config, routes, services::database, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                std::env::var("LOG_LEVEL")
                    .unwrap_or_else(|_| "rainbow_social=debug,tower_http=debug".into()),
            )
        });

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Rainbow-Social service...");
    if config.is_development() {
        warn!("Running in development mode");
    }

    // 初始化存储
    let db = match database::connect(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to create database connection: {}", e);
            return Err(anyhow::anyhow!("Database initialization failed"));
        }
    };
    db.verify_connection().await?;
    info!("Database connection established successfully");

    // 创建应用状态
    let app_state = Arc::new(AppState::build(config.clone(), db).await?);
    if app_state.is_production() && config.jwt_secret.len() < 32 {
        warn!("JWT_SECRET is shorter than 32 bytes in production");
    }

    let app = routes::build_router(app_state);

    // 启动主服务器
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}
