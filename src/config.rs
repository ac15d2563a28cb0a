use crate::{content::SiteContent, weather::DEFAULT_FORECAST_URL};
use anyhow::Context;
use log::info;
use serde::Deserialize;
use std::{fs, io::ErrorKind, path::PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where rendered pages are written
    pub output_dir: PathBuf,
    /// File holding the saved theme preference
    pub storage_path: PathBuf,
    pub forecast_url: String,
    /// Turn off to skip the weather card entirely
    pub weather_enabled: bool,
    /// There's no portable way to ask the OS for this, so it's set here
    pub reduced_motion: bool,
    pub content: SiteContent,
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the standard path. If the file doesn't exist, use
    /// the defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Self::PATH)
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        info!("Loading config from `{path}`");
        match fs::read(path) {
            Ok(contents) => serde_json::from_slice(&contents)
                .context(format!("Error parsing config file {path}")),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("`{path}` not found, using default config");
                Ok(Self::default())
            }
            Err(err) => {
                Err(err).context(format!("Error reading config file {path}"))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: "./site".into(),
            storage_path: "./storage.json".into(),
            forecast_url: DEFAULT_FORECAST_URL.into(),
            weather_enabled: true,
            reduced_motion: false,
            content: SiteContent::default(),
        }
    }
}
