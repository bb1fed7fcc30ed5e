// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use chrono::Utc;
use dotenvy::dotenv;
use exam_portal::{
    config::Config,
    error::AppError,
    models::user::{Role, User},
    repositories::{MemoryStore, PgStore, UserRepository},
    routes,
    state::AppState,
    utils::hash::hash_password,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "exam-portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let state = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await?;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied successfully.");

            let store = Arc::new(PgStore::new(pool));
            seed_admin_user(store.as_ref(), &config).await;
            AppState::new(config.clone(), store)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            seed_admin_user(store.as_ref(), &config).await;
            AppState::new(config.clone(), store)?
        }
    };

    match &config.exam_service_url {
        Some(url) => tracing::info!(%url, "grading against remote exam directory"),
        None => tracing::info!("grading against in-process exam directory"),
    }

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_with_retry(url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return Ok(pool);
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// Creates the bootstrap admin from ADMIN_EMAIL / ADMIN_PASSWORD once.
async fn seed_admin_user(users: &dyn UserRepository, config: &Config) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    if let Err(e) = insert_admin(users, &email.trim().to_lowercase(), password).await {
        tracing::error!("Failed to seed admin user: {}", e);
    }
}

async fn insert_admin(users: &dyn UserRepository, email: &str, password: &str) -> Result<(), AppError> {
    if users.find_user_by_email(email).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    let admin = User {
        id: Uuid::new_v4(),
        name: "Administrator".to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        role: Role::Admin,
        created_at: Utc::now(),
    };
    users.insert_user(&admin).await?;
    tracing::info!("Admin user created successfully.");
    Ok(())
}
