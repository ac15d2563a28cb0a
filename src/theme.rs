//! Light/dark theme resolution. The theme comes from a stored user choice if
//! there is one, otherwise it follows the OS.

use crate::{document::Document, signal::MediaQuery, storage::Storage};
use anyhow::anyhow;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::{Rc, Weak},
    str::FromStr,
};

/// Key that the user's choice is stored under
pub const STORAGE_KEY: &str = "theme-preference";
/// Root attribute that the styling layer reads the theme from
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exact match only. `Dark` or ` dark` are not themes.
impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(anyhow!("Invalid theme: {s:?}")),
        }
    }
}

/// Shared handle to the session's theme. Construct once, then clone it into
/// whatever needs to read or change the theme.
#[derive(Clone)]
pub struct ThemeContext {
    inner: Rc<RefCell<ThemeState>>,
}

struct ThemeState {
    theme: Theme,
    /// Set once the user picks a theme. From then on the OS is ignored
    manual_override: bool,
    storage: Box<dyn Storage>,
    document: Rc<RefCell<Document>>,
}

impl ThemeContext {
    /// Resolve the initial theme and start following the OS signal
    pub fn new(
        storage: Box<dyn Storage>,
        prefers_dark: &MediaQuery,
        document: Rc<RefCell<Document>>,
    ) -> Self {
        let stored = match storage.get(STORAGE_KEY) {
            Ok(value) => value,
            Err(err) => {
                warn!("Theme storage unavailable: {err:#}");
                None
            }
        };

        let (theme, manual_override) =
            match stored.as_deref().map(Theme::from_str) {
                Some(Ok(theme)) => (theme, true),
                _ => (Theme::from_prefers_dark(prefers_dark.matches()), false),
            };
        info!("Initial theme: {theme} (manual override: {manual_override})");

        let state = ThemeState {
            theme,
            manual_override,
            storage,
            document,
        };
        state.reflect();
        let inner = Rc::new(RefCell::new(state));

        // The listener stays registered for the whole session, and checks the
        // override flag itself
        let weak: Weak<RefCell<ThemeState>> = Rc::downgrade(&inner);
        prefers_dark.add_listener(move |prefers_dark| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().on_system_change(prefers_dark);
            }
        });

        Self { inner }
    }

    pub fn theme(&self) -> Theme {
        self.inner.borrow().theme
    }

    pub fn is_manual_override(&self) -> bool {
        self.inner.borrow().manual_override
    }

    /// Flip the theme and remember the user's choice. The OS signal is
    /// ignored after this.
    pub fn toggle(&self) -> Theme {
        let mut state = self.inner.borrow_mut();
        let theme = state.theme.toggled();
        info!("Theme toggled to {theme}");
        state.theme = theme;
        state.manual_override = true;
        state.reflect();
        if let Err(err) = state.storage.set(STORAGE_KEY, theme.as_str()) {
            error!("Error saving theme preference: {err:#}");
        }
        theme
    }
}

impl ThemeState {
    fn on_system_change(&mut self, prefers_dark: bool) {
        if self.manual_override {
            return;
        }
        let theme = Theme::from_prefers_dark(prefers_dark);
        if theme != self.theme {
            info!("Following OS color scheme to {theme}");
            self.theme = theme;
            self.reflect();
        }
    }

    /// Push the current theme onto the document
    fn reflect(&self) {
        self.document
            .borrow_mut()
            .set_root_attribute(THEME_ATTRIBUTE, self.theme.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    /// Storage that fails every operation
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("storage disabled"))
        }

        fn set(&self, _: &str, _: &str) -> anyhow::Result<()> {
            Err(anyhow!("storage disabled"))
        }
    }

    fn storage(stored: Option<&str>) -> Box<dyn Storage> {
        let storage = MemoryStorage::default();
        if let Some(value) = stored {
            storage.set(STORAGE_KEY, value).unwrap();
        }
        Box::new(storage)
    }

    fn setup(
        stored: Option<&str>,
        prefers_dark: bool,
    ) -> (ThemeContext, MediaQuery, Rc<RefCell<Document>>) {
        let signal = MediaQuery::new(MediaQuery::PREFERS_DARK, prefers_dark);
        let document = Rc::new(RefCell::new(Document::default()));
        let context =
            ThemeContext::new(storage(stored), &signal, Rc::clone(&document));
        (context, signal, document)
    }

    fn attribute(document: &Rc<RefCell<Document>>) -> Option<String> {
        document
            .borrow()
            .root_attribute(THEME_ATTRIBUTE)
            .map(String::from)
    }

    #[test]
    fn test_parse() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("Dark".parse::<Theme>().is_err());
        assert!("".parse::<Theme>().is_err());
        assert!("system".parse::<Theme>().is_err());
    }

    #[test]
    fn test_stored_preference_wins() {
        let (context, _, document) = setup(Some("light"), true);
        assert_eq!(context.theme(), Theme::Light);
        assert!(context.is_manual_override());
        assert_eq!(attribute(&document).as_deref(), Some("light"));
    }

    #[test]
    fn test_follows_os_without_preference() {
        let (context, _, document) = setup(None, true);
        assert_eq!(context.theme(), Theme::Dark);
        assert!(!context.is_manual_override());
        assert_eq!(attribute(&document).as_deref(), Some("dark"));

        let (context, _, _) = setup(None, false);
        assert_eq!(context.theme(), Theme::Light);
        assert!(!context.is_manual_override());
    }

    #[test]
    fn test_invalid_preference_ignored() {
        let (context, _, _) = setup(Some("purple"), true);
        assert_eq!(context.theme(), Theme::Dark);
        assert!(!context.is_manual_override());
    }

    #[test]
    fn test_os_change_without_override() {
        let (context, signal, document) = setup(None, false);
        signal.set(true);
        assert_eq!(context.theme(), Theme::Dark);
        assert_eq!(attribute(&document).as_deref(), Some("dark"));
        signal.set(false);
        assert_eq!(context.theme(), Theme::Light);
        assert_eq!(attribute(&document).as_deref(), Some("light"));
    }

    #[test]
    fn test_os_change_with_override() {
        let (context, signal, document) = setup(Some("light"), false);
        signal.set(true);
        assert_eq!(context.theme(), Theme::Light);
        assert_eq!(attribute(&document).as_deref(), Some("light"));
    }

    #[test]
    fn test_toggle() {
        let signal = MediaQuery::new(MediaQuery::PREFERS_DARK, false);
        let document = Rc::new(RefCell::new(Document::default()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let context = ThemeContext::new(
            Box::new(crate::storage::FileStorage::new(&path)),
            &signal,
            Rc::clone(&document),
        );
        assert!(!context.is_manual_override());

        assert_eq!(context.toggle(), Theme::Dark);
        assert!(context.is_manual_override());
        assert_eq!(attribute(&document).as_deref(), Some("dark"));
        assert_eq!(
            crate::storage::FileStorage::new(&path)
                .get(STORAGE_KEY)
                .unwrap()
                .as_deref(),
            Some("dark")
        );

        // OS is ignored from here on
        signal.set(true);
        signal.set(false);
        assert_eq!(context.theme(), Theme::Dark);

        assert_eq!(context.toggle(), Theme::Light);
        assert_eq!(attribute(&document).as_deref(), Some("light"));
    }

    #[test]
    fn test_storage_unavailable() {
        let signal = MediaQuery::new(MediaQuery::PREFERS_DARK, true);
        let document = Rc::new(RefCell::new(Document::default()));
        let context =
            ThemeContext::new(Box::new(BrokenStorage), &signal, document);
        assert_eq!(context.theme(), Theme::Dark);
        assert!(!context.is_manual_override());

        // Failing to save doesn't stop the toggle
        assert_eq!(context.toggle(), Theme::Light);
        assert!(context.is_manual_override());
    }
}
