//! The portfolio view. Owns everything with a lifetime tied to the page being
//! shown: the document, the transition timers, and the weather fetch.

use crate::{
    content::SiteContent,
    document::Document,
    render::{PageState, Renderer},
    route::Route,
    signal::SystemSignals,
    theme::ThemeContext,
    transition::{TransitionSequencer, TransitionState},
    weather::{ForecastSource, Weather, WeatherSnapshot},
};
use log::{info, trace};
use std::{cell::RefCell, rc::Rc, time::Instant};

/// IDs of the sections that can be jumped to
pub const SECTIONS: &[&str] = &["about", "work", "links"];

pub struct PortfolioView {
    document: Rc<RefCell<Document>>,
    theme: ThemeContext,
    signals: SystemSignals,
    content: SiteContent,
    sequencer: TransitionSequencer,
    weather: Option<Weather>,
    renderer: Renderer,
}

impl PortfolioView {
    /// Mount the view. If a forecast source is given, the weather fetch
    /// starts immediately.
    pub fn mount(
        document: Rc<RefCell<Document>>,
        theme: ThemeContext,
        signals: SystemSignals,
        content: SiteContent,
        forecast_source: Option<Box<dyn ForecastSource>>,
    ) -> anyhow::Result<Self> {
        info!("Mounting view");
        Ok(Self {
            document,
            theme,
            signals,
            content,
            sequencer: TransitionSequencer::new(),
            weather: forecast_source.map(Weather::mount),
            renderer: Renderer::new()?,
        })
    }

    pub fn theme(&self) -> &ThemeContext {
        &self.theme
    }

    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.document
    }

    pub fn transition_state(&self) -> TransitionState {
        self.sequencer.state()
    }

    /// Current weather, or `None` if the widget is off
    pub fn weather(&self) -> Option<WeatherSnapshot> {
        self.weather.as_ref().map(Weather::snapshot)
    }

    /// Handle a click on an in-page link
    pub fn jump_to(&mut self, target: &str, now: Instant) {
        self.sequencer.jump(
            target,
            now,
            &self.signals.reduced_motion,
            &mut self.document.borrow_mut(),
        );
    }

    /// Advance timers up to `now`
    pub fn tick(&mut self, now: Instant) {
        trace!("Running view tick");
        self.sequencer.tick(now, &mut self.document.borrow_mut());
    }

    pub fn render(&self, route: Route) -> anyhow::Result<String> {
        let document = self.document.borrow();
        let weather = self.weather();
        self.renderer.render(&PageState {
            route,
            root_attributes: document.root_attributes(),
            transition: self.sequencer.state(),
            content: &self.content,
            weather: weather.as_ref(),
        })
    }

    /// Render a path, falling back to home for anything unknown
    pub fn render_path(&self, path: &str) -> anyhow::Result<String> {
        self.render(Route::from_path(path))
    }
}

impl Drop for PortfolioView {
    fn drop(&mut self) {
        info!("Unmounting view");
        self.sequencer.teardown();
        if let Some(weather) = &self.weather {
            weather.cancel();
        }
    }
}
