use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// Whether the draft is a new record or an edit of a persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    Create,
    Update,
}

impl EditMode {
    /// The delete button only does anything for records that already exist.
    pub fn delete_enabled(self) -> bool {
        self == EditMode::Update
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditMode::Create => write!(f, "create"),
            EditMode::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub src: String,
    #[serde(default)]
    pub alt_text: String,
}

/// Date of birth as the form holds it: free text, an epoch timestamp in
/// milliseconds, or nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(f64),
    Text(String),
}

impl DateInput {
    /// Resolve to an instant, or `None` when the value is not a real date.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            DateInput::Millis(ms) => {
                if !ms.is_finite() {
                    return None;
                }
                DateTime::from_timestamp_millis(ms.trunc() as i64)
            }
            DateInput::Text(text) => parse_date_text(text),
        }
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset date-times may omit seconds
    let zoned = match text.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => text.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_str(&zoned, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    // Date-only values are midnight UTC; `2020` and `2020-01` start on the 1st
    let padded = match text.len() {
        4 if text.bytes().all(|b| b.is_ascii_digit()) => Some(format!("{}-01-01", text)),
        7 if text.as_bytes()[4] == b'-' => Some(format!("{}-01", text)),
        _ => None,
    };
    if let Ok(date) = NaiveDate::parse_from_str(padded.as_deref().unwrap_or(text), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// The draft animal record, in the JSON shape the editor form holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<DateInput>,
    #[serde(default)]
    pub iucn_status: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub conservation_mission: String,
    #[serde(rename = "img", default)]
    pub image: ImageRef,
}

impl Default for AnimalRecord {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            species: String::new(),
            scientific_name: String::new(),
            sex: None,
            date_of_birth: None,
            iucn_status: String::new(),
            story: String::new(),
            conservation_mission: String::new(),
            image: ImageRef::default(),
        }
    }
}

/// Read-only projection used by the card and button previews.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPreview {
    pub name: String,
    pub species: String,
    pub image: ImageRef,
}

impl AnimalRecord {
    /// Apply a single field edit coming from the form.
    pub fn edit_field(&mut self, property: &str, value: String) -> Result<(), ValidationError> {
        match property {
            "name" => self.name = value,
            "species" => self.species = value,
            "scientificName" => self.scientific_name = value,
            "sex" => self.sex = Some(value),
            "dateOfBirth" => self.date_of_birth = Some(DateInput::Text(value)),
            "iucnStatus" => self.iucn_status = value,
            "story" => self.story = value,
            "conservationMission" => self.conservation_mission = value,
            "altText" => self.image.alt_text = value,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Point the image at a newly chosen file or URL, keeping the alt text.
    ///
    /// Local paths become `file://` preview references.
    pub fn change_image(&mut self, location: &str) -> io::Result<()> {
        self.image.src = if Url::parse(location).is_ok() {
            location.to_string()
        } else {
            let absolute = std::path::absolute(Path::new(location))?;
            Url::from_file_path(&absolute)
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("not a usable image path: {}", absolute.display()),
                    )
                })?
                .to_string()
        };
        Ok(())
    }

    pub fn preview(&self) -> CardPreview {
        CardPreview {
            name: self.name.clone(),
            species: self.species.clone(),
            image: self.image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn deserializes_client_shape() {
        let json = r#"{
            "_id": "65a1",
            "name": "Leo",
            "species": "Lion",
            "scientificName": "Panthera leo",
            "sex": "",
            "dateOfBirth": "2020-01-15",
            "iucnStatus": "Vulnerable",
            "story": "Arrived in 2021.",
            "conservationMission": "Protect habitat.",
            "img": { "src": "https://cdn.example/leo.jpg", "altText": "A lion" }
        }"#;
        let record: AnimalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("65a1"));
        assert_eq!(record.scientific_name, "Panthera leo");
        assert_eq!(record.sex.as_deref(), Some(""));
        assert_eq!(
            record.date_of_birth,
            Some(DateInput::Text("2020-01-15".into()))
        );
        assert_eq!(record.image.alt_text, "A lion");
    }

    #[test]
    fn missing_fields_default() {
        let record: AnimalRecord =
            serde_json::from_str(r#"{ "name": "Leo", "dateOfBirth": null }"#).unwrap();
        assert!(record.id.is_none());
        assert!(record.date_of_birth.is_none());
        assert!(record.image.src.is_empty());
    }

    #[test]
    fn numeric_date_of_birth_is_millis() {
        let record: AnimalRecord =
            serde_json::from_str(r#"{ "dateOfBirth": 1579046400000 }"#).unwrap();
        let dob = record.date_of_birth.unwrap().to_utc().unwrap();
        assert_eq!(dob.to_rfc3339(), "2020-01-15T00:00:00+00:00");
    }

    #[test]
    fn parses_common_date_forms() {
        let expected = "2020-01-15T00:00:00+00:00";
        for text in [
            "2020-01-15",
            "2020-01-15T00:00:00Z",
            "2020-01-15T00:00:00",
            "Wed, 15 Jan 2020 00:00:00 GMT",
        ] {
            let parsed = DateInput::Text(text.into()).to_utc();
            assert_eq!(parsed.map(|d| d.to_rfc3339()).as_deref(), Some(expected), "{text}");
        }
    }

    #[test]
    fn parses_partial_dates_and_short_offsets() {
        let cases = [
            ("2020", "2020-01-01T00:00:00+00:00"),
            ("2020-01", "2020-01-01T00:00:00+00:00"),
            ("2020-01-15T10:00+01:00", "2020-01-15T09:00:00+00:00"),
            ("2020-01-15T10:00Z", "2020-01-15T10:00:00+00:00"),
        ];
        for (text, expected) in cases {
            let parsed = DateInput::Text(text.into()).to_utc();
            assert_eq!(parsed.map(|d| d.to_rfc3339()).as_deref(), Some(expected), "{text}");
        }
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(DateInput::Text("not-a-date".into()).to_utc().is_none());
        assert!(DateInput::Text("".into()).to_utc().is_none());
        assert!(DateInput::Text("2020-02-30".into()).to_utc().is_none());
        assert!(DateInput::Millis(f64::NAN).to_utc().is_none());
        assert!(DateInput::Text("2020-13".into()).to_utc().is_none());
        assert!(DateInput::Text("20x0".into()).to_utc().is_none());
    }

    #[test]
    fn edit_field_updates_draft() {
        let mut record = AnimalRecord::default();
        record.edit_field("name", "Leo".into()).unwrap();
        record.edit_field("scientificName", "Panthera leo".into()).unwrap();
        record.edit_field("dateOfBirth", "2020-01-15".into()).unwrap();
        record.edit_field("altText", "A lion".into()).unwrap();

        assert_eq!(record.name, "Leo");
        assert_eq!(record.scientific_name, "Panthera leo");
        assert!(record.date_of_birth.is_some());
        assert_eq!(record.image.alt_text, "A lion");
    }

    #[test]
    fn edit_field_rejects_unknown_property() {
        let mut record = AnimalRecord::default();
        assert_eq!(
            record.edit_field("colour", "gold".into()),
            Err(ValidationError::UnknownField("colour".into()))
        );
    }

    #[test]
    fn change_image_keeps_urls_and_wraps_paths() {
        let mut record = AnimalRecord::default();
        record.image.alt_text = "A lion".into();

        record.change_image("https://cdn.example/leo.png").unwrap();
        assert_eq!(record.image.src, "https://cdn.example/leo.png");

        record.change_image("leo.png").unwrap();
        assert!(record.image.src.starts_with("file://"));
        assert!(record.image.src.ends_with("leo.png"));
        assert_eq!(record.image.alt_text, "A lion");
    }

    #[test]
    fn change_image_encodes_paths_as_valid_urls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big cats").join("leo.png");

        let mut record = AnimalRecord::default();
        record.change_image(path.to_str().unwrap()).unwrap();

        let url = Url::parse(&record.image.src).unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(record.image.src.contains("big%20cats"));
        assert_eq!(url.to_file_path().unwrap(), path);
    }

    #[test]
    fn preview_projects_card_fields() {
        let mut record = AnimalRecord::default();
        record.name = "Leo".into();
        record.species = "Lion".into();
        record.image.src = "https://cdn.example/leo.png".into();

        let preview = record.preview();
        assert_eq!(preview.name, "Leo");
        assert_eq!(preview.species, "Lion");
        assert_eq!(preview.image.src, "https://cdn.example/leo.png");
    }

    #[test]
    fn delete_only_enabled_for_updates() {
        assert!(!EditMode::Create.delete_enabled());
        assert!(EditMode::Update.delete_enabled());
    }
}
