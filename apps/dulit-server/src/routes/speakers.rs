//! Speaker API routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::MessageResponse;
use crate::db::{CreateSpeaker, RecordRepository, Speaker, UpdateSpeaker};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the speakers router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_speakers).post(create_speaker))
        .route(
            "/:id",
            get(get_speaker).put(update_speaker).delete(delete_speaker),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Speaker not found".to_string())
}

async fn create_speaker(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSpeaker>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(data) = payload?;
    let speaker = data.validate()?;
    let repo = RecordRepository::<Speaker>::new(state.db());
    let id = repo.create(&speaker).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Speaker created", id)),
    ))
}

async fn list_speakers(State(state): State<AppState>) -> Result<Json<Vec<Speaker>>> {
    let repo = RecordRepository::<Speaker>::new(state.db());
    Ok(Json(repo.list().await?))
}

async fn get_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Speaker>> {
    let repo = RecordRepository::<Speaker>::new(state.db());
    let speaker = repo.get(&id).await?.ok_or_else(not_found)?;
    Ok(Json(speaker))
}

async fn update_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateSpeaker>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(data) = payload?;
    let repo = RecordRepository::<Speaker>::new(state.db());
    if repo.update(&id, &data).await? == 0 {
        return Err(not_found());
    }
    Ok(Json(MessageResponse::new("Speaker updated")))
}

async fn delete_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let repo = RecordRepository::<Speaker>::new(state.db());
    if repo.delete(&id).await? == 0 {
        return Err(not_found());
    }
    Ok(Json(MessageResponse::new("Speaker deleted")))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_speaker_lifecycle() {
        let app = TestApp::new().await;

        let (status, created) = app
            .send_json(
                "POST",
                "/speakers",
                json!({
                    "imageUrl": "https://i.ibb.co/xyz/grace.png",
                    "name": "Grace",
                    "bio": "Compiler pioneer",
                    "programmes": ["p-1"]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Speaker created");
        let uri = format!("/speakers/{}", created["id"].as_str().unwrap());

        let (status, reply) = app
            .send_json("PUT", &uri, json!({ "programmes": ["p-1", "p-2"] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["message"], "Speaker updated");

        let (_, speaker) = app.get(&uri).await;
        assert_eq!(speaker["imageUrl"], "https://i.ibb.co/xyz/grace.png");
        assert_eq!(speaker["programmes"], json!(["p-1", "p-2"]));

        let (_, list) = app.get("/speakers").await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = app.delete(&uri).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.delete(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Speaker not found");
    }

    fn grace() -> serde_json::Value {
        json!({
            "imageUrl": "https://i.ibb.co/xyz/grace.png",
            "name": "Grace",
            "bio": "Compiler pioneer",
            "programmes": ["p-1"]
        })
    }

    #[tokio::test]
    async fn test_empty_update_changes_nothing() {
        let app = TestApp::new().await;
        let (_, created) = app.send_json("POST", "/speakers", grace()).await;
        let uri = format!("/speakers/{}", created["id"].as_str().unwrap());
        let (_, before) = app.get(&uri).await;

        let (status, reply) = app.send_json("PUT", &uri, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["message"], "Speaker updated");

        let (_, after) = app.get(&uri).await;
        assert_eq!(before, after);
        assert_eq!(after["programmes"], json!(["p-1"]));
    }

    #[tokio::test]
    async fn test_missing_ids_are_404() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/speakers/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Speaker not found");

        let (status, body) = app.send_json("PUT", "/speakers/unknown", json!({ "bio": "x" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Speaker not found");

        let (status, _) = app.send_json("PUT", "/speakers/unknown", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_requires_all_fields() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send_json("POST", "/speakers", json!({ "name": "Grace" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
