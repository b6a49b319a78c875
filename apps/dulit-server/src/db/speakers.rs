//! Speaker records

use serde::{Deserialize, Serialize};

use super::records::{Record, RequiredFields};
use crate::error::Result;

/// Speaker record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub id: String,
    pub image_url: String,
    pub name: String,
    pub bio: String,
    /// Programme ids the speaker appears in
    pub programmes: Vec<String>,
}

/// Stored speaker body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpeaker {
    pub image_url: String,
    pub name: String,
    pub bio: String,
    pub programmes: Vec<String>,
}

/// Create speaker request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpeaker {
    pub image_url: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub programmes: Option<Vec<String>>,
}

impl CreateSpeaker {
    /// Check every field is present
    pub fn validate(self) -> Result<NewSpeaker> {
        let mut required = RequiredFields::default();
        let image_url = required.take(self.image_url, "imageUrl");
        let name = required.take(self.name, "name");
        let bio = required.take(self.bio, "bio");
        let programmes = required.take(self.programmes, "programmes");
        required.finish()?;

        Ok(NewSpeaker {
            image_url: image_url.unwrap_or_default(),
            name: name.unwrap_or_default(),
            bio: bio.unwrap_or_default(),
            programmes: programmes.unwrap_or_default(),
        })
    }
}

/// Update speaker request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpeaker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programmes: Option<Vec<String>>,
}

impl Record for Speaker {
    const COLLECTION: &'static str = "speakers";
    const LABEL: &'static str = "Speaker";
    type New = NewSpeaker;
    type Patch = UpdateSpeaker;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RecordRepository;

    #[test]
    fn test_create_request_uses_camel_case() {
        let request: CreateSpeaker = serde_json::from_value(serde_json::json!({
            "imageUrl": "https://i.ibb.co/x.png",
            "name": "Grace",
            "bio": "Compiler pioneer",
            "programmes": ["p1", "p2"]
        }))
        .unwrap();

        let speaker = request.validate().unwrap();
        assert_eq!(speaker.image_url, "https://i.ibb.co/x.png");
        assert_eq!(speaker.programmes.len(), 2);
    }

    #[test]
    fn test_missing_programmes_rejected() {
        let request = CreateSpeaker {
            image_url: Some("u".to_string()),
            name: Some("n".to_string()),
            bio: Some("b".to_string()),
            programmes: None,
        };
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    async fn test_speakers_and_programmes_are_separate_collections() {
        let pool = crate::db::test_pool().await;
        let speakers = RecordRepository::<Speaker>::new(&pool);
        let programmes = RecordRepository::<crate::db::Programme>::new(&pool);

        let id = speakers
            .create(&NewSpeaker {
                image_url: "u".to_string(),
                name: "Grace".to_string(),
                bio: "b".to_string(),
                programmes: vec![],
            })
            .await
            .unwrap();

        assert!(programmes.get(&id).await.unwrap().is_none());
        assert_eq!(programmes.delete(&id).await.unwrap(), 0);
        assert_eq!(speakers.list().await.unwrap().len(), 1);
    }
}
