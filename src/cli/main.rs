//! geospec-cli binary
//!
//! Thin wrapper around the SDK extractors: each subcommand runs one
//! extraction against a live source and writes the resulting JSON to stdout
//! or a file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use geospec_sdk::http::client::ReqwestClient;
use geospec_sdk::{XmiAuth, fetch_psdata, load_feature_types, load_feature_types_from_xmi};

#[derive(Parser)]
#[command(
    name = "geospec-cli",
    version,
    about = "Derive geospatial product specification data from catalogue sources"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract feature types from an OGC API Features service
    Ogc {
        /// URL of the /collections document (or a landing page linking to it)
        collections_url: String,

        /// Output file for the feature types JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract feature types from an Enterprise Architect XMI export
    Xmi {
        /// Local file path or HTTP(S) URL of the XMI document
        source: String,

        /// Basic-auth username for HTTP sources
        #[arg(long, default_value = "sosi")]
        username: String,

        /// Basic-auth password for HTTP sources
        #[arg(long, default_value = "sosi")]
        password: String,

        /// Output file for the feature types JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a Geonorge metadata record into product-specification metadata
    Metadata {
        /// Metadata UUID registered in Geonorge
        metadata_id: String,

        /// Output file for the metadata JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let getter = ReqwestClient::default();

    match cli.command {
        Command::Ogc {
            collections_url,
            output,
        } => {
            let feature_types = load_feature_types(&collections_url, &getter).with_context(
                || format!("failed to load feature types from '{collections_url}'"),
            )?;
            write_json(&serde_json::to_value(&feature_types)?, output.as_deref())
        }
        Command::Xmi {
            source,
            username,
            password,
            output,
        } => {
            let auth = XmiAuth { username, password };
            let feature_types = load_feature_types_from_xmi(&source, &auth, &getter)
                .with_context(|| format!("failed to load feature types from '{source}'"))?;
            write_json(&serde_json::to_value(&feature_types)?, output.as_deref())
        }
        Command::Metadata {
            metadata_id,
            output,
        } => {
            let psdata = fetch_psdata(&metadata_id, &getter)
                .with_context(|| format!("failed to build metadata for '{metadata_id}'"))?;
            write_json(&psdata, output.as_deref())
        }
    }
}

fn write_json(value: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    match output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
