use crate::fetch::ImageFile;
use crate::record::AnimalRecord;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;

pub const UNKNOWN_SEX: &str = "Unknown";
pub const UNKNOWN_DATE: &str = "unknown";

/// Multipart field set for one record submission.
#[derive(Debug, Clone)]
pub struct AnimalPayload {
    fields: BTreeMap<&'static str, String>,
    image: ImageFile,
}

impl AnimalPayload {
    /// Build the submission from a draft snapshot and its fetched image,
    /// substituting sentinels for a blank sex and an unusable date of birth.
    pub fn build(record: &AnimalRecord, image: ImageFile) -> Self {
        let sex = match record.sex.as_deref() {
            Some(sex) if !sex.is_empty() => sex.to_string(),
            _ => UNKNOWN_SEX.to_string(),
        };
        let date_of_birth = record
            .date_of_birth
            .as_ref()
            .and_then(|dob| dob.to_utc())
            .map(|dob| utc_string(&dob))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());

        let fields = BTreeMap::from([
            ("name", record.name.clone()),
            ("species", record.species.clone()),
            ("scientificName", record.scientific_name.clone()),
            ("sex", sex),
            ("dateOfBirth", date_of_birth),
            ("iucnStatus", record.iucn_status.clone()),
            ("story", record.story.clone()),
            ("conservationMission", record.conservation_mission.clone()),
        ]);

        Self { fields, image }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn image(&self) -> &ImageFile {
        &self.image
    }

    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let img = Part::bytes(self.image.bytes)
            .file_name(self.image.file_name)
            .mime_str(&self.image.mime_type)?;

        let form = self
            .fields
            .into_iter()
            .fold(Form::new().part("img", img), |form, (key, value)| {
                form.text(key, value)
            });
        Ok(form)
    }
}

/// HTTP-date style UTC rendering, e.g. `Wed, 15 Jan 2020 00:00:00 GMT`.
pub fn utc_string(instant: &DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
