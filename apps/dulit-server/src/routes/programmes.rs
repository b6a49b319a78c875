//! Programme API routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::MessageResponse;
use crate::db::{CreateProgramme, Programme, RecordRepository, UpdateProgramme};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the programmes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_programmes).post(create_programme))
        .route(
            "/:id",
            get(get_programme).put(update_programme).delete(delete_programme),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Programme not found".to_string())
}

/// Create a new programme
async fn create_programme(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateProgramme>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(data) = payload?;
    let programme = data.validate()?;
    let repo = RecordRepository::<Programme>::new(state.db());
    let id = repo.create(&programme).await?;

    tracing::debug!(id = %id, "Programme created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Programme created", id)),
    ))
}

/// List all programmes
async fn list_programmes(State(state): State<AppState>) -> Result<Json<Vec<Programme>>> {
    let repo = RecordRepository::<Programme>::new(state.db());
    Ok(Json(repo.list().await?))
}

/// Get a specific programme
async fn get_programme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Programme>> {
    let repo = RecordRepository::<Programme>::new(state.db());
    let programme = repo.get(&id).await?.ok_or_else(not_found)?;
    Ok(Json(programme))
}

/// Update a programme; absent fields are kept
async fn update_programme(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateProgramme>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(data) = payload?;
    let repo = RecordRepository::<Programme>::new(state.db());
    if repo.update(&id, &data).await? == 0 {
        return Err(not_found());
    }
    Ok(Json(MessageResponse::new("Programme updated")))
}

/// Delete a programme
async fn delete_programme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let repo = RecordRepository::<Programme>::new(state.db());
    if repo.delete(&id).await? == 0 {
        return Err(not_found());
    }
    Ok(Json(MessageResponse::new("Programme deleted")))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    fn keynote() -> serde_json::Value {
        json!({
            "name": "Keynote",
            "description": "Opening talk",
            "day_number": 1,
            "date": "2025-01-01",
            "start_datetime": "2025-01-01T09:00:00",
            "end_datetime": "2025-01-01T10:00:00",
            "venue": "Hall A"
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = TestApp::new().await;

        let (status, created) = app.send_json("POST", "/programmes", keynote()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Programme created");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = app.get(&format!("/programmes/{}", id)).await;
        assert_eq!(status, StatusCode::OK);

        let mut expected = keynote();
        expected["id"] = json!(id);
        assert_eq!(fetched, expected);
    }

    #[tokio::test]
    async fn test_create_missing_field_is_400() {
        let app = TestApp::new().await;
        let mut body = keynote();
        body.as_object_mut().unwrap().remove("venue");

        let (status, reply) = app.send_json("POST", "/programmes", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].as_str().unwrap().contains("venue"));
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        let app = TestApp::new().await;
        let mut wrong_type = keynote();
        wrong_type["day_number"] = json!("one");

        let (status, reply) = app.send_json("POST", "/programmes", wrong_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri("/programmes")
            .body(Body::empty())
            .unwrap();
        let (status, reply) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].is_string());

        let (_, created) = app.send_json("POST", "/programmes", keynote()).await;
        let uri = format!("/programmes/{}", created["id"].as_str().unwrap());
        let (status, reply) = app.send_json("PUT", &uri, json!({ "day_number": [1] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].is_string());
    }

    #[tokio::test]
    async fn test_list() {
        let app = TestApp::new().await;
        app.send_json("POST", "/programmes", keynote()).await;
        let mut second = keynote();
        second["name"] = json!("Closing");
        app.send_json("POST", "/programmes", second).await;

        let (status, list) = app.get("/programmes").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = list.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
        assert_eq!(names, vec![json!("Keynote"), json!("Closing")]);
    }

    #[tokio::test]
    async fn test_empty_update_changes_nothing() {
        let app = TestApp::new().await;
        let (_, created) = app.send_json("POST", "/programmes", keynote()).await;
        let uri = format!("/programmes/{}", created["id"].as_str().unwrap());
        let (_, before) = app.get(&uri).await;

        let (status, reply) = app.send_json("PUT", &uri, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["message"], "Programme updated");

        let (_, after) = app.get(&uri).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let app = TestApp::new().await;
        let (_, created) = app.send_json("POST", "/programmes", keynote()).await;
        let uri = format!("/programmes/{}", created["id"].as_str().unwrap());

        app.send_json("PUT", &uri, json!({ "venue": "Hall B" })).await;

        let (_, after) = app.get(&uri).await;
        assert_eq!(after["venue"], "Hall B");
        assert_eq!(after["name"], "Keynote");
    }

    #[tokio::test]
    async fn test_missing_ids_are_404() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/programmes/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Programme not found");

        let (status, _) = app.send_json("PUT", "/programmes/unknown", json!({ "venue": "x" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.delete("/programmes/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Programme not found");
    }

    #[tokio::test]
    async fn test_delete() {
        let app = TestApp::new().await;
        let (_, created) = app.send_json("POST", "/programmes", keynote()).await;
        let uri = format!("/programmes/{}", created["id"].as_str().unwrap());

        let (status, body) = app.delete(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Programme deleted");

        let (status, _) = app.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
