mod config;
mod error;
mod models;
mod services;
mod utils;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{Html, Json, Response},
    routing::{get, post},
};
use error::ReaderError;
use models::{Book, CatalogPage, CatalogParams, CategorySummary, QueryEvent, QueryState, ReaderView};
use serde::Deserialize;
use services::catalog::{self, BookStore};
use services::content::ContentSource;
use services::live::live_query;
use services::reader::{Navigation, ReaderService};
use services::session::JsonPositionStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    books: Arc<BookStore>,
    reader: Arc<ReaderService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::Config::from_env();
    tracing::debug!("Configuration: {:?}", config);

    let books = Arc::new(BookStore::load(&config.books_path)?);
    if books.is_empty() {
        tracing::warn!("Book catalog {} is empty", config.books_path.display());
    }
    let source = match &config.content_url {
        Some(url) => ContentSource::http(url.as_str()),
        None => ContentSource::directory(&config.content_dir),
    };
    let positions = Arc::new(JsonPositionStore::open(&config.positions_path)?);
    let reader = Arc::new(ReaderService::new(books.clone(), source, positions));

    let app = router(AppState { books, reader });

    let listener = TcpListener::bind(&config.addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/catalog", get(catalog_page))
        .route("/api/catalog/live", get(live_catalog))
        .route("/api/categories", get(categories))
        .route("/api/books/:id", get(book_detail))
        .route("/api/reader", post(open_reader))
        .route("/api/reader/:session", get(reader_view).delete(close_reader))
        .route("/api/reader/:session/next", post(next_page))
        .route("/api/reader/:session/prev", post(prev_page))
        .route("/api/reader/:session/page/:page", post(jump_to_page))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>BookVoyage Catalog &amp; Reader</title>
        <meta charset="utf-8">
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .info-box { background-color: #f0f8ff; padding: 20px; border-radius: 8px; margin: 20px 0; }
            .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
        </style>
    </head>
    <body>
        <h1>BookVoyage Catalog &amp; Reader</h1>

        <div class="info-box">
            <p>Browse the book catalog and read books page by page.</p>
        </div>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET /api/catalog?cat=&amp;q=&amp;sort=&amp;min_rating=&amp;format=&amp;page=</div>
        <div class="endpoint">GET /api/catalog/live - WebSocket, debounced live search</div>
        <div class="endpoint">GET /api/categories - Counts and average rating per category</div>
        <div class="endpoint">GET /api/books/:id - A single book</div>
        <div class="endpoint">POST /api/reader?id= - Open a book for reading</div>
        <div class="endpoint">GET /api/reader/:session - Current page</div>
        <div class="endpoint">POST /api/reader/:session/next | prev | page/:n - Turn pages</div>
        <div class="endpoint">GET /health - Health check</div>
    </body>
    </html>
    "#,
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn catalog_page(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<CatalogPage> {
    let query = QueryState::from_params(&params);
    Json(catalog::query(&state.books, &query))
}

async fn categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(catalog::category_summaries(&state.books))
}

async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, StatusCode> {
    let id: u32 = id.trim().parse().map_err(|_| StatusCode::NOT_FOUND)?;
    state
        .books
        .get(id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
struct ReaderParams {
    id: Option<String>,
}

async fn open_reader(
    State(state): State<AppState>,
    Query(params): Query<ReaderParams>,
) -> Result<Json<ReaderView>, ReaderError> {
    state.reader.open(params.id.as_deref()).await.map(Json)
}

async fn reader_view(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<ReaderView>, ReaderError> {
    state.reader.current(session).map(Json)
}

async fn close_reader(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<StatusCode, ReaderError> {
    state.reader.close(session)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn next_page(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<ReaderView>, ReaderError> {
    state.reader.navigate(session, Navigation::Next).await.map(Json)
}

async fn prev_page(
    State(state): State<AppState>,
    Path(session): Path<Uuid>,
) -> Result<Json<ReaderView>, ReaderError> {
    state.reader.navigate(session, Navigation::Prev).await.map(Json)
}

async fn jump_to_page(
    State(state): State<AppState>,
    Path((session, page)): Path<(Uuid, String)>,
) -> Result<Json<ReaderView>, ReaderError> {
    match utils::text::parse_page(&page) {
        Some(page) => state
            .reader
            .navigate(session, Navigation::Page(page))
            .await
            .map(Json),
        None => state.reader.current(session).map(Json),
    }
}

async fn live_catalog(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| live_session(socket, state.books))
}

async fn send_page(socket: &mut WebSocket, page: &CatalogPage) -> bool {
    match serde_json::to_string(page) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode catalog page: {}", e);
            false
        }
    }
}

/// Bridges the socket to a `live_query` task: text frames in, catalog pages out.
async fn live_session(mut socket: WebSocket, books: Arc<BookStore>) {
    let (events, events_rx) = mpsc::unbounded_channel::<QueryEvent>();
    let (pages_tx, mut pages) = mpsc::unbounded_channel::<CatalogPage>();
    let query = tokio::spawn(live_query(books, events_rx, pages_tx));

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                match serde_json::from_str::<QueryEvent>(&text) {
                    Ok(event) => {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("Ignoring malformed catalog event: {}", e),
                }
            }
            page = pages.recv() => match page {
                Some(page) => {
                    if !send_page(&mut socket, &page).await {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    drop(events);
    if let Err(e) = query.await {
        tracing::warn!("Live catalog query task failed: {}", e);
    }
    tracing::debug!("Live catalog session closed");
}
