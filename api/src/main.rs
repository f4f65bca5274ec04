//! Finvault API Server
//!
//! Personal finance tracking: accounts, transactions, investments and summaries.
//! Uses hexagonal (ports & adapters) architecture with a Redis read-through
//! cache in front of PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    run_migrations, CacheProvider, PostgresAccountRepository, PostgresInvestmentRepository,
    PostgresTransactionRepository, PostgresUserRepository,
};
use app::{
    AccountService, CacheJanitor, CacheLayer, CacheStats, InvestmentService, SummaryService,
    TransactionService, UserService,
};
use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<PostgresUserRepository>>,
    pub account_service: Arc<
        AccountService<PostgresAccountRepository, PostgresTransactionRepository, CacheProvider>,
    >,
    pub transaction_service: Arc<
        TransactionService<PostgresAccountRepository, PostgresTransactionRepository, CacheProvider>,
    >,
    pub investment_service: Arc<InvestmentService<PostgresInvestmentRepository, CacheProvider>>,
    pub summary_service: Arc<
        SummaryService<
            PostgresAccountRepository,
            PostgresTransactionRepository,
            PostgresInvestmentRepository,
            CacheProvider,
        >,
    >,
    pub cache: Arc<CacheLayer<CacheProvider>>,
}

impl AppState {
    /// Wire repositories and services. All services share one cache layer so
    /// hit/miss counters cover the whole API.
    pub fn new(
        db: DatabaseConnection,
        store: Arc<CacheProvider>,
        key_prefix: &str,
        cache_ttl: Duration,
    ) -> Self {
        let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
        let account_repo = Arc::new(PostgresAccountRepository::new(db.clone()));
        let transaction_repo = Arc::new(PostgresTransactionRepository::new(db.clone()));
        let investment_repo = Arc::new(PostgresInvestmentRepository::new(db));

        let cache = Arc::new(CacheLayer::new(store, key_prefix, cache_ttl));

        Self {
            user_service: Arc::new(UserService::new(user_repo)),
            account_service: Arc::new(AccountService::new(
                account_repo.clone(),
                transaction_repo.clone(),
                cache.clone(),
            )),
            transaction_service: Arc::new(TransactionService::new(
                account_repo.clone(),
                transaction_repo.clone(),
                cache.clone(),
            )),
            investment_service: Arc::new(InvestmentService::new(
                investment_repo.clone(),
                cache.clone(),
            )),
            summary_service: Arc::new(SummaryService::new(
                account_repo,
                transaction_repo,
                investment_repo,
                cache.clone(),
            )),
            cache,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: state.cache.stats(),
    })
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        // Profile
        .route("/me", get(handlers::me).patch(handlers::update_me))
        // Accounts
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/:id",
            get(handlers::get_account)
                .patch(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route(
            "/accounts/:id/recalculate",
            post(handlers::recalculate_account),
        )
        .route(
            "/accounts/:id/transactions",
            get(handlers::list_account_transactions).post(handlers::create_transaction),
        )
        // Transactions
        .route("/transactions", get(handlers::list_transactions))
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .patch(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Investments
        .route(
            "/investments",
            get(handlers::list_investments).post(handlers::create_investment),
        )
        .route(
            "/investments/:id",
            get(handlers::get_investment)
                .patch(handlers::update_investment)
                .delete(handlers::delete_investment),
        )
        .route("/portfolio", get(handlers::get_portfolio))
        // Summaries
        .route("/summary", get(handlers::get_summary))
        .route("/summary/monthly", get(handlers::get_monthly))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Public
        .route("/health", get(health))
        .route("/users/register", post(handlers::register))
        .merge(protected)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,finvault_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Finvault API...");

    let config = Config::from_env()?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    if config.run_migrations {
        run_migrations(&db).await?;
        tracing::info!("Schema applied");
    }

    // Cache
    let store = Arc::new(
        CacheProvider::from_url(config.redis_url.as_deref(), &config.cache_key_prefix).await,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let janitor = CacheJanitor::new(
        store.clone(),
        config.cache_sweep_interval,
        config.cache_ttl,
    )
    .spawn(shutdown_rx);

    let state = AppState::new(db, store, &config.cache_key_prefix, config.cache_ttl);
    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweep before exiting
    let _ = shutdown_tx.send(true);
    if let Some(handle) = janitor {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Cache janitor did not stop cleanly");
        }
    }

    tracing::info!("Finvault API stopped");
    Ok(())
}
