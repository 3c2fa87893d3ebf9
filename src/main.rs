mod api;
mod editor;
mod error;
mod fetch;
mod gate;
mod parse;
mod payload;
mod record;
#[cfg(test)]
mod test_support;

use crate::api::{Endpoints, HttpBackend};
use crate::editor::{AnimalEditor, LISTING_PATH, Navigator};
use crate::fetch::HttpImageSource;
use crate::gate::{AssumeYes, Overlay, PromptGate};
use crate::parse::{Args, Command};
use crate::record::{AnimalRecord, EditMode};
use clap::Parser;
use log::info;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Returns the user to the record listing.
struct ListingNavigator;

impl Navigator for ListingNavigator {
    fn navigate(&self, path: &str) {
        info!("Navigating to {}", path);
        if path == LISTING_PATH {
            println!("Done. Back to the animal listing.");
        }
    }
}

pub fn load_draft(path: &Path) -> Result<AnimalRecord, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let record = serde_json::from_str(&text)?;
    info!("Loaded draft from {}", path.display());
    Ok(record)
}

/// Apply `--set` and `--image` edits the way the form would.
pub fn apply_edits(
    record: &mut AnimalRecord,
    edits: Vec<(String, String)>,
    image: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (field, value) in edits {
        record.edit_field(&field, value)?;
    }
    if let Some(location) = image {
        record.change_image(location)?;
    }
    Ok(())
}

/// The parent decides the mode: explicit flag first, then whether the draft
/// was ever saved.
pub fn resolve_mode(requested: Option<EditMode>, record: &AnimalRecord) -> EditMode {
    requested.unwrap_or(if record.id.is_some() {
        EditMode::Update
    } else {
        EditMode::Create
    })
}

pub fn print_preview(record: &AnimalRecord, mode: EditMode) {
    let preview = record.preview();
    println!("\nPreview ({}):", mode);
    println!("  Name:    {}", preview.name);
    println!("  Species: {}", preview.species);
    println!("  Image:   {}", preview.image.src);
    if !preview.image.alt_text.is_empty() {
        println!("  Alt:     {}", preview.image.alt_text);
    }
    if mode.delete_enabled()
        && let Some(id) = &record.id
    {
        println!("  Delete:  zoo-editor delete {}", id);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    // Initialize logger
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .user_agent(concat!("zoo-editor/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let endpoints = Endpoints::new(&args.server);

    let editor = |mode: EditMode| {
        let overlay = Overlay::new();
        AnimalEditor::new(
            HttpImageSource::new(client.clone()),
            HttpBackend::new(client.clone()),
            ListingNavigator,
            endpoints.clone(),
            mode,
        )
        .with_listener(move |state| overlay.update(state))
    };

    match args.command {
        Command::Save {
            draft,
            mode,
            edits,
            image,
        } => {
            let mut record = load_draft(&draft)?;
            apply_edits(&mut record, edits, image.as_deref())?;
            let mode = resolve_mode(mode, &record);
            print_preview(&record, mode);

            let response = editor(mode).save(&record).await?;
            if let Some(id) = response.id {
                info!("Server record id: {}", id);
            }
            if let Some(message) = response.message {
                println!("{}", message);
            }
        }
        Command::Delete { id, yes } => {
            let editor = editor(EditMode::Update);
            let outcome = if yes {
                editor.delete(&id, &AssumeYes).await?
            } else {
                editor.delete(&id, &PromptGate).await?
            };
            if outcome.is_none() {
                println!("Nothing deleted.");
            }
        }
        Command::Preview { draft } => {
            let record = load_draft(&draft)?;
            print_preview(&record, resolve_mode(None, &record));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mode_follows_flag_then_id() {
        let mut record = AnimalRecord::default();
        assert_eq!(resolve_mode(None, &record), EditMode::Create);
        record.id = Some("65a1".into());
        assert_eq!(resolve_mode(None, &record), EditMode::Update);
        assert_eq!(
            resolve_mode(Some(EditMode::Create), &record),
            EditMode::Create
        );
    }

    #[test]
    fn applies_form_edits() {
        let mut record = AnimalRecord::default();
        apply_edits(
            &mut record,
            vec![
                ("name".into(), "Leo".into()),
                ("sex".into(), "Male".into()),
            ],
            Some("https://cdn.zoo.test/leo.png"),
        )
        .unwrap();

        assert_eq!(record.name, "Leo");
        assert_eq!(record.sex.as_deref(), Some("Male"));
        assert_eq!(record.image.src, "https://cdn.zoo.test/leo.png");
    }

    #[test]
    fn unknown_edit_field_is_an_error() {
        let mut record = AnimalRecord::default();
        let err = apply_edits(&mut record, vec![("colour".into(), "gold".into())], None)
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown record field: colour");
    }

    #[test]
    fn missing_draft_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_draft(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn loads_draft_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leo.json");
        std::fs::write(
            &path,
            r#"{ "name": "Leo", "species": "Lion", "img": { "src": "leo.png", "altText": "A lion" } }"#,
        )
        .unwrap();

        let record = load_draft(&path).unwrap();

        assert_eq!(record.name, "Leo");
        assert_eq!(record.preview().image.alt_text, "A lion");
    }
}
