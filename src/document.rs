use indexmap::IndexMap;
use log::{trace, warn};

/// How a scroll should be performed
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScrollBehavior {
    /// Jump straight there
    Auto,
    Smooth,
}

/// A completed scroll to a section
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scroll {
    pub target: String,
    pub behavior: ScrollBehavior,
}

/// The page that gets rendered. Tracks the attributes on the root element,
/// which sections exist, and where the page is scrolled to.
#[derive(Debug, Default)]
pub struct Document {
    root_attributes: IndexMap<String, String>,
    sections: Vec<String>,
    scroll: Option<Scroll>,
    /// Total number of scrolls performed. Only used to observe behavior
    scroll_count: usize,
}

impl Document {
    pub fn new<S: Into<String>>(sections: impl IntoIterator<Item = S>) -> Self {
        Self {
            sections: sections.into_iter().map(S::into).collect(),
            ..Self::default()
        }
    }

    pub fn root_attribute(&self, name: &str) -> Option<&str> {
        self.root_attributes.get(name).map(String::as_str)
    }

    pub fn root_attributes(&self) -> &IndexMap<String, String> {
        &self.root_attributes
    }

    pub fn set_root_attribute(&mut self, name: &str, value: &str) {
        trace!("Setting root attribute `{name}={value}`");
        self.root_attributes
            .insert(name.to_owned(), value.to_owned());
    }

    pub fn has_section(&self, id: &str) -> bool {
        self.sections.iter().any(|section| section == id)
    }

    /// Scroll to the section with the given ID. Return false (and don't
    /// scroll) if there is no such section.
    pub fn scroll_into_view(
        &mut self,
        target: &str,
        behavior: ScrollBehavior,
    ) -> bool {
        if !self.has_section(target) {
            warn!("Cannot scroll to unknown section `{target}`");
            return false;
        }
        trace!("Scrolling to `{target}` ({behavior:?})");
        self.scroll = Some(Scroll {
            target: target.to_owned(),
            behavior,
        });
        self.scroll_count += 1;
        true
    }

    /// The most recent scroll, if any
    pub fn scroll(&self) -> Option<&Scroll> {
        self.scroll.as_ref()
    }

    pub fn scroll_count(&self) -> usize {
        self.scroll_count
    }
}
