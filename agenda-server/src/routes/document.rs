//! Whole-document save and load for the web client.
//!
//! No locking beyond the atomic rename: concurrent saves are last writer wins.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use agenda_core::store::write_atomic;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save", post(save))
        .route("/load", get(load))
}

#[derive(Deserialize)]
pub struct SaveRequest {
    pub xml: Option<String>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub success: bool,
}

/// POST /save - Replace the stored document
async fn save(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, AppError> {
    let xml = payload
        .ok()
        .and_then(|Json(request)| request.xml)
        .filter(|xml| !xml.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing 'xml' in request body"))?;

    let path = state.document_path().to_path_buf();
    let bytes = xml.len();
    tokio::task::spawn_blocking(move || write_atomic(&path, &xml)).await??;

    info!(bytes, "Saved agenda document");
    Ok(Json(SaveResponse { success: true }))
}

/// GET /load - The stored document, or an empty agenda for today
async fn load(State(state): State<AppState>) -> Result<Response, AppError> {
    let xml = match tokio::fs::read_to_string(state.document_path()).await {
        Ok(xml) => xml,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No saved document yet, serving an empty agenda");
            empty_agenda(Local::now().date_naive())
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

/// The document served before anything was saved: one empty day.
pub fn empty_agenda(date: NaiveDate) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <agenda>\n  \
        <dia fecha=\"{}\">\n    \
        <tareas></tareas>\n    \
        <tareasCriticas></tareasCriticas>\n    \
        <citas></citas>\n    \
        <notas></notas>\n    \
        <animo></animo>\n  \
        </dia>\n\
        </agenda>\n",
        date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> Router {
        router().with_state(AppState::at(dir.path().join("agenda.xml")))
    }

    fn save_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/save")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn load_request() -> Request<Body> {
        Request::builder().uri("/load").body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_load_fresh_store_is_dated_today() {
        let dir = TempDir::new().unwrap();
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        let response = app(&dir).oneshot(load_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml; charset=utf-8"
        );
        let body = body_text(response).await;
        assert!(body.contains(&format!("<dia fecha=\"{today}\">")));
        assert!(body.contains("<tareasCriticas></tareasCriticas>"));
    }

    #[tokio::test]
    async fn test_saved_document_is_loaded_back() {
        let dir = TempDir::new().unwrap();
        let xml = "<agenda><dia fecha=\"2025-03-20\"><notas>hola</notas></dia></agenda>";
        let body = serde_json::json!({ "xml": xml }).to_string();

        let response = app(&dir).oneshot(save_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"success":true}"#);

        let response = app(&dir).oneshot(load_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, xml);
    }

    #[tokio::test]
    async fn test_save_without_xml_is_rejected() {
        let dir = TempDir::new().unwrap();

        for body in [r#"{}"#, r#"{"xml":""}"#, "not json"] {
            let response = app(&dir).oneshot(save_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
        assert!(!dir.path().join("agenda.xml").exists());
    }

    #[tokio::test]
    async fn test_unreadable_document_is_a_server_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the document should be cannot be read as a file
        std::fs::create_dir(dir.path().join("agenda.xml")).unwrap();

        let response = app(&dir).oneshot(load_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("error"));
    }

    #[test]
    fn test_empty_agenda_template() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let xml = empty_agenda(date);

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<dia fecha=\"2025-03-20\">"));
        assert!(xml.trim_end().ends_with("</agenda>"));
    }
}
