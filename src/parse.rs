use crate::record::EditMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zoo-editor")]
#[command(about = "Create, update and delete animal records on the zoo content server")]
#[command(version = "0.1")]
pub(crate) struct Args {
    /// Base URL of the content server
    #[arg(short, long, env = "ZOO_EDITOR_SERVER", default_value = "http://localhost:5000")]
    pub server: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Save a draft record read from a JSON file
    Save {
        /// Draft record file
        draft: PathBuf,

        /// Create a new record or update an existing one (default: update if the draft has an id)
        #[arg(short, long, value_enum)]
        mode: Option<EditMode>,

        /// Edit a field before saving, e.g. --set sex=Female
        #[arg(long = "set", value_parser = parse_assignment)]
        edits: Vec<(String, String)>,

        /// Replace the image with a local file or URL
        #[arg(short, long)]
        image: Option<String>,
    },

    /// Delete a saved record
    Delete {
        /// Record id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the card preview for a draft without saving
    Preview {
        draft: PathBuf,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got {:?}", raw))?;
    if field.is_empty() {
        return Err(format!("missing field name in {:?}", raw));
    }
    Ok((field.to_string(), value.to_string()))
}
