use crate::{
    content::{HeroChar, SiteContent},
    route::Route,
    transition::TransitionState,
    weather::{round_degrees, Condition, WeatherSnapshot},
};
use anyhow::Context;
use chrono::{Datelike, Local};
use indexmap::IndexMap;
use itertools::Itertools;
use log::trace;
use minijinja::Environment;
use serde::Serialize;

/// (name, source) for every template. Names ending in .html get HTML
/// auto-escaping
const TEMPLATES: &[(&str, &str)] = &[
    ("page.html", include_str!("../templates/page.html")),
    ("hero.html", include_str!("../templates/hero.html")),
    ("about.html", include_str!("../templates/about.html")),
    ("work.html", include_str!("../templates/work.html")),
    ("links.html", include_str!("../templates/links.html")),
    ("weather.html", include_str!("../templates/weather.html")),
    ("now_playing.html", include_str!("../templates/now_playing.html")),
];

/// Turns view state into HTML
pub struct Renderer {
    env: Environment<'static>,
}

/// Everything a page render needs. Borrowed from the view for the duration of
/// one render
#[derive(Debug)]
pub struct PageState<'a> {
    pub route: Route,
    pub root_attributes: &'a IndexMap<String, String>,
    pub transition: TransitionState,
    pub content: &'a SiteContent,
    /// `None` if the weather widget is turned off
    pub weather: Option<&'a WeatherSnapshot>,
}

impl Renderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("Error loading template {name}"))?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, state: &PageState<'_>) -> anyhow::Result<String> {
        trace!("Rendering {:?}", state.route);
        let context = PageContext::new(state);
        self.env
            .get_template("page.html")?
            .render(&context)
            .with_context(|| format!("Error rendering {}", state.route.path()))
    }
}

/// Data handed to the templates
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    route: Route,
    title: &'static str,
    root_attributes: &'a IndexMap<String, String>,
    nav: Vec<NavItem>,
    show: Sections,
    main_class: String,
    hero_lines: Vec<Vec<HeroChar>>,
    content: &'a SiteContent,
    weather: Option<WeatherCard<'a>>,
    year: i32,
}

impl<'a> PageContext<'a> {
    fn new(state: &PageState<'a>) -> Self {
        let main_class = ["wrap"]
            .into_iter()
            .chain(
                (state.transition == TransitionState::Transitioning)
                    .then_some("wrapTransition"),
            )
            .join(" ");
        Self {
            route: state.route,
            title: state.route.label(),
            root_attributes: state.root_attributes,
            nav: Route::ALL
                .iter()
                .map(|&route| NavItem {
                    path: route.path(),
                    label: route.label(),
                    active: route == state.route,
                })
                .collect(),
            show: Sections::for_route(state.route),
            main_class,
            hero_lines: state.content.hero_lines(),
            content: state.content,
            weather: state.weather.map(|snapshot| {
                WeatherCard::new(&state.content.weather_title, snapshot)
            }),
            year: Local::now().year(),
        }
    }
}

#[derive(Debug, Serialize)]
struct NavItem {
    path: &'static str,
    label: &'static str,
    active: bool,
}

/// Which sections appear on a page
#[derive(Debug, Serialize)]
struct Sections {
    hero: bool,
    about: bool,
    work: bool,
    links: bool,
}

impl Sections {
    fn for_route(route: Route) -> Self {
        match route {
            // Home is the whole single-page site
            Route::Home => Self {
                hero: true,
                about: true,
                work: true,
                links: true,
            },
            Route::About => Self {
                hero: false,
                about: true,
                work: false,
                links: false,
            },
            Route::Work => Self {
                hero: false,
                about: false,
                work: true,
                links: false,
            },
            Route::Links => Self {
                hero: false,
                about: false,
                work: false,
                links: true,
            },
        }
    }
}

/// Display-ready weather. While loading or after an error, only the title is
/// meaningful and the card shows placeholders
#[derive(Debug, PartialEq, Serialize)]
struct WeatherCard<'a> {
    title: &'a str,
    ready: bool,
    icon: &'static str,
    label: &'static str,
    temp: i64,
    high: i64,
    low: i64,
}

impl<'a> WeatherCard<'a> {
    fn new(title: &'a str, snapshot: &WeatherSnapshot) -> Self {
        let current = snapshot.current.as_ref();
        let today = snapshot.today.as_ref();
        let condition =
            Condition::from_code(current.and_then(|current| current.code));
        Self {
            title,
            ready: !snapshot.loading && !snapshot.error,
            icon: condition.icon,
            label: condition.label,
            temp: round_degrees(current.and_then(|current| current.temp)),
            high: round_degrees(today.and_then(|today| today.max)),
            low: round_degrees(today.and_then(|today| today.min)),
        }
    }
}
