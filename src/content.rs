//! Static content for the page. Everything here has a default, and any of it
//! can be replaced from the config file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteContent {
    /// Owner's name. Each word gets its own line in the hero
    pub name: String,
    pub tagline: String,
    pub about: String,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub links: Vec<Link>,
    pub now_playing: Option<Track>,
    /// Heading on the weather card
    pub weather_title: String,
    /// Shown in the footer, after the copyright
    pub credit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub desc: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub url: String,
}

/// One letter of the hero name. The index runs across all lines, so the
/// styling layer can stagger the animation
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct HeroChar {
    pub index: usize,
    pub letter: char,
}

impl SiteContent {
    /// Split the name into lines of indexed characters
    pub fn hero_lines(&self) -> Vec<Vec<HeroChar>> {
        let mut index = 0;
        self.name
            .split_whitespace()
            .map(|word| {
                word.chars()
                    .map(|letter| {
                        let hero_char = HeroChar { index, letter };
                        index += 1;
                        hero_char
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for SiteContent {
    fn default() -> Self {
        fn project(title: &str, desc: &str) -> Project {
            Project {
                title: title.into(),
                desc: desc.into(),
            }
        }
        fn link(label: &str) -> Link {
            Link {
                label: label.into(),
                href: "#".into(),
            }
        }

        Self {
            name: "Chris Mulia".into(),
            tagline: "I build small apps and simple systems that make life \
                easier"
                .into(),
            about: "I primarily work on Audio-Visual that involves operating \
                & designing workflows/systems for events, recording & \
                streaming ie. Q-SYS, BMD, etc. I'm also interested in \
                blockchain tech & crypto itself. When I'm not building, you \
                can find me on Spotify as Final Sushi, making chill \
                instrumentals primarily and collaborate with friends."
                .into(),
            skills: [
                "Audio-Visual",
                "Design",
                "Workflow",
                "Systems",
                "Blockchain",
                "Music",
            ]
            .map(String::from)
            .into(),
            projects: vec![
                project(
                    "Inventory Check App",
                    "Track gear check-in/out with clean history and notes.",
                ),
                project(
                    "Event Archiving Workflow",
                    "Simple steps to dump audio + footage to NAS, \
                    consistently.",
                ),
                project(
                    "AV Prep Checklist",
                    "Fast pre-show checks that prevent missing recordings.",
                ),
            ],
            links: vec![link("GitHub"), link("LinkedIn"), link("YouTube")],
            now_playing: Some(Track {
                title: "Holiday".into(),
                artist: "Final Sushi".into(),
                url: "https://open.spotify.com/track/78Z0QizUKErGo1D6xFIfw1"
                    .into(),
            }),
            weather_title: "Sydney Today".into(),
            credit: "Built with Rust".into(),
        }
    }
}
