use serde::Serialize;
use std::path::{Path, PathBuf};

/// A page of the site. Anything that isn't a known path goes home
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Home,
    About,
    Work,
    Links,
}

impl Route {
    pub const ALL: &'static [Self] =
        &[Self::Home, Self::About, Self::Work, Self::Links];

    /// Resolve a URL path. One trailing slash is allowed, so `/about/` is
    /// the same as `/about`
    pub fn from_path(path: &str) -> Self {
        let trimmed = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        match trimmed {
            "/about" => Self::About,
            "/work" => Self::Work,
            "/links" => Self::Links,
            _ => Self::Home,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::About => "/about",
            Self::Work => "/work",
            Self::Links => "/links",
        }
    }

    /// Nav label
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About",
            Self::Work => "Work",
            Self::Links => "Links",
        }
    }

    /// ID of the page section this route shows, if it's a single section
    pub fn section(self) -> Option<&'static str> {
        match self {
            Self::Home => None,
            Self::About => Some("about"),
            Self::Work => Some("work"),
            Self::Links => Some("links"),
        }
    }

    /// Where the rendered page goes, relative to the output directory
    pub fn output_file(self) -> PathBuf {
        match self.section() {
            None => PathBuf::from("index.html"),
            Some(section) => Path::new(section).join("index.html"),
        }
    }
}
