//! Programme records

use serde::{Deserialize, Serialize};

use super::records::{Record, RequiredFields};
use crate::error::Result;

/// Programme record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Programme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub day_number: i64,
    pub date: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub venue: String,
}

/// Stored programme body
#[derive(Debug, Clone, Serialize)]
pub struct NewProgramme {
    pub name: String,
    pub description: String,
    pub day_number: i64,
    pub date: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub venue: String,
}

/// Create programme request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProgramme {
    pub name: Option<String>,
    pub description: Option<String>,
    pub day_number: Option<i64>,
    pub date: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub venue: Option<String>,
}

impl CreateProgramme {
    /// Check every field is present
    pub fn validate(self) -> Result<NewProgramme> {
        let mut required = RequiredFields::default();
        let name = required.take(self.name, "name");
        let description = required.take(self.description, "description");
        let day_number = required.take(self.day_number, "day_number");
        let date = required.take(self.date, "date");
        let start_datetime = required.take(self.start_datetime, "start_datetime");
        let end_datetime = required.take(self.end_datetime, "end_datetime");
        let venue = required.take(self.venue, "venue");
        required.finish()?;

        Ok(NewProgramme {
            name: name.unwrap_or_default(),
            description: description.unwrap_or_default(),
            day_number: day_number.unwrap_or_default(),
            date: date.unwrap_or_default(),
            start_datetime: start_datetime.unwrap_or_default(),
            end_datetime: end_datetime.unwrap_or_default(),
            venue: venue.unwrap_or_default(),
        })
    }
}

/// Update programme request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProgramme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl Record for Programme {
    const COLLECTION: &'static str = "programmes";
    const LABEL: &'static str = "Programme";
    type New = NewProgramme;
    type Patch = UpdateProgramme;
}
