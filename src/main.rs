use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use latin_drill::config;
use latin_drill::db::{self, LogOnError, SqliteProgressStore};
use latin_drill::handlers;
use latin_drill::services::QuizService;
use latin_drill::session::MemorySessionTracker;
use latin_drill::state::AppState;
use latin_drill::vocabulary::JsonVocabularyStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "latin_drill=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::load_settings();

    let pool = db::init_db(&settings.database_path).expect("Failed to initialize database");

    if let Some(path) = &settings.legacy_users_file {
        let mut conn = db::try_lock(&pool).expect("Database lock failed during startup");
        db::import_legacy_users(&mut conn, path).log_warn("Legacy user import failed");
    }

    let sessions = match settings.learning.session_expiry_hours {
        Some(hours) => MemorySessionTracker::with_expiry_hours(hours),
        None => MemorySessionTracker::new(),
    };

    let quiz = QuizService::new(
        Arc::new(JsonVocabularyStore::new(settings.books.clone())),
        Arc::new(SqliteProgressStore::new(pool)),
        Arc::new(sessions),
        settings.learning.clone(),
    );

    let app = handlers::router(AppState::new(quiz)).layer(TraceLayer::new_for_http());

    let bind_addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

    tracing::info!("Server running on http://localhost:{}", settings.port);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
