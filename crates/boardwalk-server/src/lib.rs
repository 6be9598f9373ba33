//! HTTP server for driving a board from a drag-and-drop front end.
//!
//! The server owns one reordering engine for the workspace's board. Drag
//! events arrive as HTTP requests and are applied synchronously; commits are
//! handed to a background task that writes them to the workspace. When a
//! write fails the task reloads the board from disk so the engine never
//! drifts from what is stored.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use boardwalk_core::{
    BoardEngine, BoardSnapshot, Commit, CommitSink, DragEvent, DropTarget, EngineError,
    GestureDriver, GestureStep, Phase, Projection,
};
use boardwalk_fs::{FsError, Workspace};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Forwards commits to the persistence task.
#[derive(Debug, Clone)]
pub struct ChannelSink(mpsc::UnboundedSender<Commit>);

impl CommitSink for ChannelSink {
    fn commit(&mut self, commit: Commit) {
        if let Err(e) = self.0.send(commit) {
            warn!(item = %e.0.item_id, "Persistence task stopped, commit dropped");
        }
    }
}

/// Server state shared across handlers.
pub struct AppState {
    workspace_path: PathBuf,
    driver: Mutex<GestureDriver<ChannelSink>>,
}

impl AppState {
    /// Build state over a board snapshot. Commits go to `commits`.
    ///
    /// # Errors
    /// Returns error if the snapshot is invalid.
    pub fn new(
        workspace_path: impl Into<PathBuf>,
        snapshot: BoardSnapshot,
        commits: mpsc::UnboundedSender<Commit>,
    ) -> Result<Self> {
        let engine = BoardEngine::new(snapshot, ChannelSink(commits))?;
        Ok(Self {
            workspace_path: workspace_path.into(),
            driver: Mutex::new(GestureDriver::new(engine)),
        })
    }

    /// Re-read the board from disk, abandoning any gesture in progress.
    ///
    /// # Errors
    /// Returns error if the workspace cannot be read.
    pub async fn reload(&self) -> Result<()> {
        let snapshot = Workspace::open(&self.workspace_path)?.snapshot()?;
        let mut driver = self.driver.lock().await;
        driver.reset(snapshot)?;
        info!(path = %self.workspace_path.display(), "Reloaded board");
        Ok(())
    }
}

/// Start the board server.
///
/// # Errors
/// Returns error if the workspace cannot be opened, binding fails, or the
/// server encounters an error.
pub async fn serve(workspace_path: &std::path::Path, host: &str, port: u16) -> Result<()> {
    let snapshot = Workspace::open(workspace_path)
        .and_then(|ws| ws.snapshot())
        .context("Failed to load board")?;

    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(workspace_path, snapshot, tx)?);
    tokio::spawn(persist_commits(Arc::clone(&state), rx));

    let app = router(state);

    let addr = format!("{host}:{port}");
    info!(address = %addr, "Starting board server");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/board", get(get_board))
        .route("/board/reload", post(reload_board))
        .route("/drag", post(drag))
        .route("/drag/over/{raw}", post(drag_over_raw))
        .route("/drag/drop/{raw}", post(drag_drop_raw))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Write commits to the workspace until the channel closes.
///
/// A failed write leaves the engine showing a board that was never stored,
/// so the board is reloaded from disk.
pub async fn persist_commits(state: Arc<AppState>, mut commits: mpsc::UnboundedReceiver<Commit>) {
    while let Some(commit) = commits.recv().await {
        let result = Workspace::open(&state.workspace_path).and_then(|ws| ws.apply_commit(&commit));

        match result {
            Ok(item) => debug!(item = %item.id, category = %item.category, "Persisted commit"),
            Err(e) => {
                error!(item = %commit.item_id, error = %e, "Failed to persist commit");
                if let Err(e) = state.reload().await {
                    error!(error = %e, "Failed to reload board after persistence failure");
                }
            }
        }
    }
    debug!("Commit channel closed");
}

// --- Response types ---

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct BoardView {
    phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hover: Option<DropTarget>,
    #[serde(flatten)]
    projection: Projection,
}

impl BoardView {
    fn of(driver: &GestureDriver<ChannelSink>) -> Self {
        let engine = driver.engine();
        Self {
            phase: engine.phase(),
            active: engine.active().map(String::from),
            hover: driver.hover().cloned(),
            projection: engine.projection(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DragResponse {
    step: GestureStep,
    board: BoardView,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_board(State(state): State<Arc<AppState>>) -> Json<BoardView> {
    let driver = state.driver.lock().await;
    Json(BoardView::of(&driver))
}

async fn reload_board(State(state): State<Arc<AppState>>) -> Result<Json<BoardView>, AppError> {
    state.reload().await?;
    let driver = state.driver.lock().await;
    Ok(Json(BoardView::of(&driver)))
}

async fn drag(
    State(state): State<Arc<AppState>>,
    Json(event): Json<DragEvent>,
) -> Result<Json<DragResponse>, AppError> {
    let mut driver = state.driver.lock().await;
    let step = driver.dispatch(&event)?;
    Ok(Json(DragResponse {
        step,
        board: BoardView::of(&driver),
    }))
}

async fn drag_over_raw(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<DragResponse>, AppError> {
    let mut driver = state.driver.lock().await;
    let step = driver.over_raw(&raw)?;
    Ok(Json(DragResponse {
        step,
        board: BoardView::of(&driver),
    }))
}

async fn drag_drop_raw(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<DragResponse>, AppError> {
    let mut driver = state.driver.lock().await;
    let step = driver.end_raw(Some(&raw))?;
    Ok(Json(DragResponse {
        step,
        board: BoardView::of(&driver),
    }))
}

// --- Error handling ---

struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<EngineError>() {
            return match e {
                EngineError::UnknownItem(_) | EngineError::UnknownCategory(_) => {
                    StatusCode::NOT_FOUND
                }
                EngineError::NotDragging | EngineError::AlreadyDragging { .. } => {
                    StatusCode::CONFLICT
                }
            };
        }
        match self.0.downcast_ref::<FsError>() {
            Some(FsError::ItemNotFound(_) | FsError::CategoryNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use boardwalk_fs::WorkspaceConfig;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Fixture {
        _tmp: TempDir,
        state: Arc<AppState>,
        commits: mpsc::UnboundedReceiver<Commit>,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path(), WorkspaceConfig::default()).unwrap();
        ws.create_item("A", None).unwrap();
        ws.create_item("B", None).unwrap();
        ws.create_item("C", Some("done")).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(AppState::new(tmp.path(), ws.snapshot().unwrap(), tx).unwrap());
        Fixture {
            _tmp: tmp,
            state,
            commits: rx,
        }
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn start(state: &Arc<AppState>, item: &str) -> (StatusCode, Value) {
        let body = json!({"event": "start", "item": item});
        call(state, Method::POST, "/drag", Some(body)).await
    }

    fn column_ids(board: &Value, column: usize) -> Vec<String> {
        board["columns"][column]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture();
        let (status, body) = call(&f.state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_board_view() {
        let f = fixture();
        let (status, body) = call(&f.state, Method::GET, "/board", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "idle");
        assert_eq!(column_ids(&body, 0), vec!["a", "b"]);
        assert_eq!(column_ids(&body, 2), vec!["c"]);
    }

    #[tokio::test]
    async fn test_drag_gesture_emits_commit() {
        let mut f = fixture();

        let (status, body) = start(&f.state, "a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["board"]["phase"], "dragging");
        assert_eq!(body["board"]["active"], "a");

        let (status, body) = call(&f.state, Method::POST, "/drag/over/c", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["moved"]["outcome"], "recategorized");
        assert_eq!(column_ids(&body["board"], 2), vec!["a", "c"]);

        let (status, body) = call(&f.state, Method::POST, "/drag/drop/c", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["ended"]["outcome"], "committed");
        assert_eq!(body["board"]["phase"], "idle");

        let commit = f.commits.try_recv().unwrap();
        assert_eq!(
            commit,
            Commit {
                item_id: "a".to_string(),
                category: "done".to_string(),
                position: 0,
            }
        );
        assert!(f.commits.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_emits_nothing() {
        let mut f = fixture();

        start(&f.state, "a").await;
        call(&f.state, Method::POST, "/drag/over/done", None).await;
        let cancel = json!({"event": "cancel"});
        let (status, body) = call(&f.state, Method::POST, "/drag", Some(cancel)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["ended"]["outcome"], "cancelled");
        assert_eq!(column_ids(&body["board"], 0), vec!["a", "b"]);
        assert!(f.commits.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reload_mid_gesture_clears_hover() {
        let mut f = fixture();

        start(&f.state, "a").await;
        let (_, body) = call(&f.state, Method::POST, "/drag/over/done", None).await;
        assert_eq!(body["board"]["hover"], json!({"category": "done"}));

        let (status, body) = call(&f.state, Method::POST, "/board/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "idle");
        assert!(body["hover"].is_null());
        assert!(body["active"].is_null());
        assert_eq!(column_ids(&body, 0), vec!["a", "b"]);

        let (_, body) = call(&f.state, Method::GET, "/board", None).await;
        assert!(body["hover"].is_null());
        assert!(f.commits.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let f = fixture();

        let (status, body) = call(&f.state, Method::POST, "/drag/over/a", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("no drag gesture"));

        let (status, _) = start(&f.state, "zzz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_persist_commits_writes_workspace() {
        let f = fixture();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(Commit {
            item_id: "b".to_string(),
            category: "in-progress".to_string(),
            position: 0,
        })
        .unwrap();
        drop(tx);
        persist_commits(Arc::clone(&f.state), rx).await;

        let ws = Workspace::open(&f.state.workspace_path).unwrap();
        assert_eq!(ws.get_item("b").unwrap().category, "in-progress");
    }

    #[tokio::test]
    async fn test_failed_persist_reloads_board() {
        let f = fixture();

        {
            let mut driver = f.state.driver.lock().await;
            driver
                .dispatch(&DragEvent::Start {
                    item: "a".to_string(),
                })
                .unwrap();
            driver
                .dispatch(&DragEvent::Over {
                    target: DropTarget::category("done"),
                })
                .unwrap();
            driver
                .dispatch(&DragEvent::End {
                    target: Some(DropTarget::category("done")),
                })
                .unwrap();
            assert_eq!(driver.engine().item("a").unwrap().category, "done");

            driver
                .dispatch(&DragEvent::Start {
                    item: "b".to_string(),
                })
                .unwrap();
            driver.over_raw("done").unwrap();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Commit {
            item_id: "a".to_string(),
            category: "archived".to_string(),
            position: 0,
        })
        .unwrap();
        drop(tx);
        persist_commits(Arc::clone(&f.state), rx).await;

        let driver = f.state.driver.lock().await;
        assert_eq!(driver.engine().item("a").unwrap().category, "todo");
        assert!(!driver.engine().is_dragging());
        assert_eq!(driver.hover(), None);
    }
}
