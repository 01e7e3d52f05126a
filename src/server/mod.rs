//! Page server with on-demand generation and background revalidation

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, PageCache, PageState};
use crate::generator::Generator;
use crate::helpers::is_valid_uid;
use crate::Site;

/// Minimum time between two listings of the repository
const RELIST_INTERVAL: Duration = Duration::from_secs(10);

/// Uids from the last listing of the repository
#[derive(Default)]
struct KnownPosts {
    uids: HashSet<String>,
    listed_at: Option<Instant>,
}

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: PageCache,
    known: Mutex<KnownPosts>,
}

impl ServerState {
    pub fn new(site: &Site, generator: Generator) -> Self {
        Self {
            generator,
            cache: PageCache::new(site.config.revalidate_after()),
            known: Mutex::new(KnownPosts::default()),
        }
    }

    /// Whether the repository lists `uid`
    ///
    /// An unknown uid triggers a new listing at most once per
    /// [`RELIST_INTERVAL`], so arbitrary slugs cost neither fetches nor
    /// cache entries.
    async fn is_known(&self, uid: &str) -> Result<bool> {
        let mut known = self.known.lock().await;
        if known.uids.contains(uid) {
            return Ok(true);
        }
        if let Some(listed_at) = known.listed_at {
            if listed_at.elapsed() < RELIST_INTERVAL {
                return Ok(false);
            }
        }

        let paths = self.generator.static_paths().await?;
        known.uids = paths.into_iter().map(|p| p.uid).collect();
        known.listed_at = Some(Instant::now());
        tracing::debug!("Listed {} posts", known.uids.len());
        Ok(known.uids.contains(uid))
    }
}

/// Start the page server
pub async fn start(site: &Site, generator: Generator, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(site, generator));
    let app = router(state, site.public_dir.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!(
        "Pages revalidate every {}s. Press Ctrl+C to stop.",
        site.config.revalidate
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes: post pages are generated on demand, everything else is static
pub fn router(state: Arc<ServerState>, public_dir: PathBuf) -> Router {
    Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .with_state(state)
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    let (status, html) = post_response(state, slug).await;
    (status, Html(html)).into_response()
}

/// Resolve a post request against the cache, starting generation as needed
pub async fn post_response(state: Arc<ServerState>, uid: String) -> (StatusCode, String) {
    if !is_valid_uid(&uid) {
        return not_found(&state, &uid);
    }

    let mut lookup = state.cache.lookup(&uid).await;
    if lookup == Lookup::Missing {
        lookup = load_from_disk(&state, &uid).await;
    }

    match lookup {
        Lookup::Fresh(page) => respond(&state, &uid, page),
        Lookup::Stale(page) => {
            tracing::debug!("Serving stale {} while regenerating", uid);
            spawn_refresh(state.clone(), uid.clone());
            respond(&state, &uid, page)
        }
        Lookup::Missing => match state.is_known(&uid).await {
            Ok(true) => {
                tracing::info!("{} not built yet, generating on demand", uid);
                spawn_refresh(state.clone(), uid);
                match state.generator.render_loading() {
                    Ok(html) => (StatusCode::ACCEPTED, html),
                    Err(e) => internal_error(e),
                }
            }
            Ok(false) => not_found(&state, &uid),
            Err(e) => {
                tracing::error!("Listing posts failed: {:#}", e);
                bad_gateway(&state)
            }
        },
    }
}

/// Pick up a page written by an earlier build
async fn load_from_disk(state: &ServerState, uid: &str) -> Lookup {
    let path = state.generator.output_path(uid);
    let Ok(metadata) = tokio::fs::metadata(&path).await else {
        return Lookup::Missing;
    };
    let Ok(html) = tokio::fs::read_to_string(&path).await else {
        return Lookup::Missing;
    };

    let modified = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now() - state.cache.revalidate_after());
    state
        .cache
        .store_since(uid, PageState::Rendered(html), modified)
        .await;
    tracing::debug!("Loaded built page {:?}", path);
    state.cache.lookup(uid).await
}

fn respond(state: &ServerState, uid: &str, page: PageState) -> (StatusCode, String) {
    match page {
        PageState::Rendered(html) => (StatusCode::OK, html),
        PageState::NotFound => not_found(state, uid),
        PageState::Failed(reason) => {
            tracing::warn!("Serving error page for {}: {}", uid, reason);
            bad_gateway(state)
        }
    }
}

fn bad_gateway(state: &ServerState) -> (StatusCode, String) {
    match state.generator.render_error() {
        Ok(html) => (StatusCode::BAD_GATEWAY, html),
        Err(e) => internal_error(e),
    }
}

fn not_found(state: &ServerState, uid: &str) -> (StatusCode, String) {
    match state.generator.render_not_found(uid) {
        Ok(html) => (StatusCode::NOT_FOUND, html),
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("Render failed: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error".to_string(),
    )
}

fn spawn_refresh(state: Arc<ServerState>, uid: String) {
    tokio::spawn(async move { refresh(&state, &uid).await });
}

/// Regenerate one page; concurrent calls for the same uid collapse into one
pub async fn refresh(state: &ServerState, uid: &str) {
    if !state.cache.begin_refresh(uid).await {
        return;
    }

    match state.generator.generate_post(uid).await {
        Ok(Some(html)) => {
            state.cache.store(uid, PageState::Rendered(html)).await;
            tracing::info!("Regenerated {}", uid);
        }
        Ok(None) => {
            state.cache.store(uid, PageState::NotFound).await;
            state.known.lock().await.uids.remove(uid);
        }
        Err(e) => {
            tracing::error!("Generation of {} failed: {:#}", uid, e);
            // Keep serving the previous page if there is one
            if !state.cache.has_rendered(uid).await {
                state
                    .cache
                    .store(uid, PageState::Failed(format!("{:#}", e)))
                    .await;
            }
        }
    }

    state.cache.end_refresh(uid).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::store::{ContentStore, Document, MemoryStore, PrismicClient, StoreError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts how often the repository is listed
    struct CountingStore {
        inner: MemoryStore,
        listings: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn query_by_type(&self, doc_type: &str) -> Result<Vec<Document>, StoreError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            self.inner.query_by_type(doc_type).await
        }

        async fn get_by_uid(
            &self,
            doc_type: &str,
            uid: &str,
        ) -> Result<Option<Document>, StoreError> {
            self.inner.get_by_uid(doc_type, uid).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ContentStore for FailingStore {
        async fn query_by_type(&self, _doc_type: &str) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::MissingMasterRef)
        }

        async fn get_by_uid(
            &self,
            _doc_type: &str,
            _uid: &str,
        ) -> Result<Option<Document>, StoreError> {
            Err(StoreError::MissingMasterRef)
        }
    }

    fn document(uid: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            last_publication_date: None,
            data: json!({
                "title": "Criando um app CRA do zero",
                "banner": {"url": "https://images.prismic.io/banner.png"},
                "author": "Danilo Vieira",
                "content": [{"heading": "Proin et varius", "body": [
                    {"type": "paragraph", "text": "Lorem ipsum", "spans": []}
                ]}]
            }),
        }
    }

    fn state_with(
        dir: &TempDir,
        store: Arc<dyn ContentStore>,
        config: SiteConfig,
    ) -> Arc<ServerState> {
        let site = Site::with_config(dir.path(), config);
        let generator = Generator::new(&site, store).unwrap();
        Arc::new(ServerState::new(&site, generator))
    }

    fn state(dir: &TempDir, documents: Vec<Document>) -> Arc<ServerState> {
        state_with(
            dir,
            Arc::new(MemoryStore::new(documents)),
            SiteConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_fallback_path_shows_loading_then_page() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, vec![document("cra")]);

        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(html.contains("Carregando..."));

        refresh(&state, "cra").await;

        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h1>Criando um app CRA do zero</h1>"));
        assert!(html.contains("15 mar 2021"));
        assert!(dir.path().join("public/post/cra/index.html").exists());
    }

    #[tokio::test]
    async fn test_built_page_is_served_from_disk() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, vec![document("cra")]);
        state
            .generator
            .write_post("cra", "<html>built</html>")
            .unwrap();

        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(html, "<html>built</html>");
    }

    #[tokio::test]
    async fn test_stale_page_served_while_revalidating() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.revalidate = 0;
        let state = state_with(&dir, Arc::new(MemoryStore::new(vec![document("cra")])), config);
        state
            .cache
            .store("cra", PageState::Rendered("old".to_string()))
            .await;

        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(html, "old");

        refresh(&state, "cra").await;
        let (_, html) = post_response(state.clone(), "cra".to_string()).await;
        assert!(html.contains("Criando um app CRA do zero"));
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir, Vec::new());

        refresh(&state, "nope").await;
        let (status, html) = post_response(state.clone(), "nope".to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Post não encontrado"));

        let (status, _) = post_response(state.clone(), "../secret".to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_slugs_are_not_fetched_or_cached() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(vec![document("cra")]),
            listings: AtomicUsize::new(0),
        });
        let state = state_with(&dir, store.clone(), SiteConfig::default());

        for i in 0..1000 {
            let (status, _) = post_response(state.clone(), format!("unknown-{}", i)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        assert_eq!(state.cache.len().await, 0);
        assert_eq!(store.listings.load(Ordering::SeqCst), 1);

        let (status, _) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(store.listings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_reach_the_client() {
        let dir = TempDir::new().unwrap();
        let client = PrismicClient::new(
            "http://127.0.0.1:1/api/v2",
            Some("s3cr3t-token".to_string()),
            20,
        );
        let state = state_with(&dir, Arc::new(client), SiteConfig::default());

        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!html.contains("s3cr3t-token"));

        refresh(&state, "cra").await;
        let (status, html) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(html.contains("Não foi possível carregar este post"));
        assert!(!html.contains("s3cr3t-token"));
        assert!(!html.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_page() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, Arc::new(FailingStore), SiteConfig::default());

        refresh(&state, "cra").await;
        let (status, _) = post_response(state.clone(), "cra".to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        state
            .cache
            .store("cra", PageState::Rendered("previous".to_string()))
            .await;
        refresh(&state, "cra").await;
        assert_eq!(
            state.cache.lookup("cra").await,
            Lookup::Fresh(PageState::Rendered("previous".to_string()))
        );
    }
}
