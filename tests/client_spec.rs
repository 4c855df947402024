//! HTTP client tests against a local axum server that speaks the document
//! service's wire format.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use draftdesk::client::{ClientError, Credentials, DocumentClient};
use draftdesk::download::DirectorySink;
use draftdesk::editor::{AlertKind, DispatchOutcome, Editor, ExportOutcome, LoadOutcome};
use draftdesk::models::*;
use serde::Deserialize;
use serde_json::{json, Value};

const TOKEN: &str = "secret-token";

#[derive(Clone, Default)]
struct ServerState {
    project: Arc<Mutex<Option<Project>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    export_queries: Arc<Mutex<Vec<String>>>,
}

type ApiError = (StatusCode, Json<Value>);

fn detail(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "detail": message })))
}

fn authorize(headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")),
    }
}

fn with_section(
    state: &ServerState,
    project_id: i64,
    section_id: i64,
    change: impl FnOnce(&mut Section),
) -> Result<(), ApiError> {
    let mut project = state.project.lock().unwrap();
    let project = project
        .as_mut()
        .filter(|p| p.id == ProjectId(project_id))
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Project not found"))?;
    let section = project
        .sections
        .iter_mut()
        .find(|s| s.id == SectionId(section_id))
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Section not found"))?;
    change(section);
    Ok(())
}

async fn get_project(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    authorize(&headers)?;
    state
        .project
        .lock()
        .unwrap()
        .clone()
        .filter(|p| p.id == ProjectId(id))
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Project not found"))
}

async fn refine_section(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path((id, section_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;
    state.bodies.lock().unwrap().push(body.clone());
    let instruction = body["instruction"].as_str().unwrap_or_default().to_string();
    if instruction == "explode" {
        return Err(detail(StatusCode::INTERNAL_SERVER_ERROR, "LLM call failed"));
    }
    let mut content = String::new();
    with_section(&state, id, section_id, |s| {
        s.content = format!("{} [{}]", s.content, instruction);
        content = s.content.clone();
    })?;
    Ok(Json(json!({ "status": "ok", "content": content })))
}

async fn feedback_section(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path((id, section_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;
    state.bodies.lock().unwrap().push(body.clone());
    let action = body["action"].as_str().unwrap_or_default().to_string();
    with_section(&state, id, section_id, |s| match action.as_str() {
        "like" => s.likes += 1,
        "dislike" => s.dislikes += 1,
        _ => {}
    })?;
    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

async fn export_project(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    authorize(&headers).map_err(|_| StatusCode::UNAUTHORIZED)?;
    let format = query.format.unwrap_or_default();
    state.export_queries.lock().unwrap().push(format.clone());
    if state.project.lock().unwrap().as_ref().map(|p| p.id) != Some(ProjectId(id)) {
        return Err(StatusCode::NOT_FOUND);
    }
    let format: ExportFormat = format.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let body = format!("{}:{}", format, id).into_bytes();
    Ok(([(header::CONTENT_TYPE, format.media_type())], body))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

fn sample_project() -> Project {
    Project {
        id: ProjectId(7),
        title: "Board Update".to_string(),
        topic: Some("Q3 results".to_string()),
        doc_type: DocType::Docx,
        sections: vec![
            Section {
                id: SectionId(1),
                title: "Intro".to_string(),
                content: "Welcome".to_string(),
                order: 0,
                likes: 0,
                dislikes: 0,
            },
            Section {
                id: SectionId(2),
                title: "Numbers".to_string(),
                content: "Revenue grew".to_string(),
                order: 1,
                likes: 0,
                dislikes: 0,
            },
        ],
    }
}

async fn spawn_server() -> (String, ServerState) {
    let state = ServerState::default();
    *state.project.lock().unwrap() = Some(sample_project());

    let api = Router::new()
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/sections/{section_id}/refine", post(refine_section))
        .route("/projects/{id}/sections/{section_id}/feedback", post(feedback_section))
        .route("/export/{id}", get(export_project))
        .route("/slow/projects/{id}", get(slow));
    let app = Router::new().nest("/api", api).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server crashed");
    });

    (format!("http://{}/api", addr), state)
}

fn client(base_url: &str) -> DocumentClient {
    DocumentClient::new(base_url, Credentials::bearer(TOKEN))
}

mod document_client {
    use super::*;

    #[tokio::test]
    async fn fetches_the_project_snapshot() {
        let (url, _) = spawn_server().await;

        let project = client(&url).get_project(ProjectId(7)).await.unwrap();

        assert_eq!(project, sample_project());
    }

    #[tokio::test]
    async fn surfaces_detail_of_missing_project() {
        let (url, _) = spawn_server().await;

        let err = client(&url).get_project(ProjectId(99)).await.unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(err.detail(), Some("Project not found"));
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (url, _) = spawn_server().await;
        let anonymous = DocumentClient::new(url.as_str(), Credentials::anonymous());

        let err = anonymous.get_project(ProjectId(7)).await.unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized(_)));
        assert_eq!(err.detail(), Some("Could not validate credentials"));
    }

    #[tokio::test]
    async fn sends_refine_instruction_as_json() {
        let (url, state) = spawn_server().await;
        let input = RefineInput {
            instruction: "make it shorter".to_string(),
        };

        client(&url)
            .refine_section(ProjectId(7), SectionId(1), &input)
            .await
            .unwrap();

        assert_eq!(
            state.bodies.lock().unwrap().as_slice(),
            &[json!({ "instruction": "make it shorter" })]
        );
    }

    #[tokio::test]
    async fn sends_null_comment_when_absent() {
        let (url, state) = spawn_server().await;
        let input = FeedbackInput {
            action: FeedbackAction::Like,
            comment: None,
        };

        client(&url)
            .submit_feedback(ProjectId(7), SectionId(2), &input)
            .await
            .unwrap();

        assert_eq!(
            state.bodies.lock().unwrap().as_slice(),
            &[json!({ "action": "like", "comment": null })]
        );
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_detail() {
        let (url, _) = spawn_server().await;
        let input = RefineInput {
            instruction: "explode".to_string(),
        };

        let err = client(&url)
            .refine_section(ProjectId(7), SectionId(1), &input)
            .await
            .unwrap_err();

        match err {
            ClientError::Server { status, ref detail } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(detail.as_deref(), Some("LLM call failed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn downloads_export_bytes_with_format_query() {
        let (url, state) = spawn_server().await;

        let bytes = client(&url)
            .export_project(ProjectId(7), ExportFormat::Pptx)
            .await
            .unwrap();

        assert_eq!(bytes, b"pptx:7".to_vec());
        assert_eq!(state.export_queries.lock().unwrap().as_slice(), &["pptx".to_string()]);
    }

    #[tokio::test]
    async fn export_failure_has_no_detail() {
        let (url, _) = spawn_server().await;

        let err = client(&url)
            .export_project(ProjectId(8), ExportFormat::Docx)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NotFound(None)));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}/api", addr))
            .get_project(ProjectId(7))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(err.detail().is_none());
    }

    #[tokio::test]
    async fn timeout_is_a_transport_error() {
        let (url, _) = spawn_server().await;
        let impatient = DocumentClient::with_timeout(
            format!("{}/slow", url),
            Credentials::bearer(TOKEN),
            Duration::from_millis(100),
        )
        .unwrap();

        let err = impatient.get_project(ProjectId(7)).await.unwrap_err();

        assert!(err.is_transport());
    }
}

mod editor_over_http {
    use super::*;

    fn editor(url: &str, download_dir: &std::path::Path) -> Editor {
        Editor::new(
            ProjectId(7),
            Arc::new(client(url)),
            Arc::new(DirectorySink::new(download_dir)),
        )
    }

    #[tokio::test]
    async fn refine_then_feedback_then_export() {
        let (url, _) = spawn_server().await;
        let downloads = tempfile::tempdir().unwrap();
        let editor = editor(&url, downloads.path());

        assert_eq!(editor.mount().await, LoadOutcome::Loaded);

        editor.set_refinement(SectionId(1), "warmer tone");
        assert!(editor.refine(SectionId(1)).await.is_completed());

        editor.set_comment(SectionId(2), "needs a chart");
        assert!(editor
            .feedback(SectionId(2), FeedbackAction::Dislike)
            .await
            .is_completed());

        let snapshot = editor.snapshot().unwrap();
        assert_eq!(snapshot.sections[0].content, "Welcome [warmer tone]");
        assert_eq!(snapshot.sections[1].dislikes, 1);
        assert_eq!(editor.refinement(SectionId(1)), "warmer tone");
        assert_eq!(editor.comment(SectionId(2)), "");

        let outcome = editor.export(ExportFormat::Docx).await;
        let expected = downloads.path().join("project_7.docx");
        assert_eq!(outcome, ExportOutcome::Saved(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"docx:7");
    }

    #[tokio::test]
    async fn refine_of_unknown_section_alerts_with_service_detail() {
        let (url, _) = spawn_server().await;
        let downloads = tempfile::tempdir().unwrap();
        let editor = editor(&url, downloads.path());
        editor.mount().await;
        editor.set_refinement(SectionId(404), "anything");

        let outcome = editor.refine(SectionId(404)).await;

        let DispatchOutcome::Failed(alert) = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(alert.detail.as_deref(), Some("Section not found"));
        assert_eq!(editor.refinement(SectionId(404)), "anything");
    }

    #[tokio::test]
    async fn transport_failures_leave_state_alone() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let downloads = tempfile::tempdir().unwrap();
        let editor = editor(&format!("http://{}/api", addr), downloads.path());
        editor.set_refinement(SectionId(1), "warmer tone");
        editor.set_comment(SectionId(1), "too long");
        let before = editor.drafts();

        let DispatchOutcome::Failed(refine) = editor.refine(SectionId(1)).await else {
            panic!("refine should fail");
        };
        let DispatchOutcome::Failed(feedback) =
            editor.feedback(SectionId(1), FeedbackAction::Like).await
        else {
            panic!("feedback should fail");
        };
        let ExportOutcome::Failed(export) = editor.export(ExportFormat::Docx).await else {
            panic!("export should fail");
        };

        assert_eq!(refine.kind, AlertKind::Refine);
        assert_eq!(feedback.kind, AlertKind::Feedback);
        assert_eq!(export.kind, AlertKind::Export);
        for alert in [&refine, &feedback, &export] {
            assert!(alert.detail.is_some());
        }
        assert_eq!(editor.drafts(), before);
        assert_eq!(editor.generation(), 0);
        assert_eq!(editor.alerts().len(), 3);
        assert!(editor.snapshot().is_none());
        assert_eq!(std::fs::read_dir(downloads.path()).unwrap().count(), 0);
    }
}
