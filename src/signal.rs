//! Boolean signals coming from the host environment, such as "the OS prefers
//! a dark color scheme". Each signal can be read at any time, and listeners
//! can register to hear about changes.

use log::{trace, warn};
use std::{
    cell::RefCell,
    fmt::{self, Debug, Formatter},
    mem,
    rc::Rc,
};

type Listener = Box<dyn FnMut(bool)>;

/// A named boolean signal with change listeners. Cloning gives another handle
/// to the same signal.
#[derive(Clone)]
pub struct MediaQuery {
    inner: Rc<RefCell<MediaQueryInner>>,
}

struct MediaQueryInner {
    query: &'static str,
    matches: bool,
    listeners: Vec<Listener>,
}

impl MediaQuery {
    pub const PREFERS_DARK: &'static str = "(prefers-color-scheme: dark)";
    pub const PREFERS_REDUCED_MOTION: &'static str =
        "(prefers-reduced-motion: reduce)";

    pub fn new(query: &'static str, matches: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MediaQueryInner {
                query,
                matches,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn query(&self) -> &'static str {
        self.inner.borrow().query
    }

    /// Current value of the signal
    pub fn matches(&self) -> bool {
        self.inner.borrow().matches
    }

    /// Register a listener, to be called with the new value every time the
    /// signal changes. Listeners live as long as the signal does.
    pub fn add_listener(&self, listener: impl FnMut(bool) + 'static) {
        self.inner.borrow_mut().listeners.push(Box::new(listener));
    }

    /// Update the signal. Listeners are only notified if the value actually
    /// changed.
    pub fn set(&self, matches: bool) {
        let mut listeners = {
            let mut inner = self.inner.borrow_mut();
            if inner.matches == matches {
                return;
            }
            trace!("Signal `{}` changed to {matches}", inner.query);
            inner.matches = matches;
            // Move the listeners out so they can read the signal while we
            // call them
            mem::take(&mut inner.listeners)
        };

        for listener in &mut listeners {
            listener(matches);
        }

        // Anything registered during notification goes after the originals
        let mut inner = self.inner.borrow_mut();
        listeners.append(&mut inner.listeners);
        inner.listeners = listeners;
    }
}

impl Debug for MediaQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MediaQuery")
            .field("query", &inner.query)
            .field("matches", &inner.matches)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Ask the OS whether it's in dark mode. If the OS won't say, assume light.
pub fn detect_prefers_dark() -> bool {
    match dark_light::detect() {
        Ok(dark_light::Mode::Dark) => true,
        Ok(_) => false,
        Err(err) => {
            warn!("Error detecting OS color scheme: {err}");
            false
        }
    }
}

/// The full set of host signals the page reads
#[derive(Clone, Debug)]
pub struct SystemSignals {
    pub prefers_dark: MediaQuery,
    pub reduced_motion: MediaQuery,
}

impl SystemSignals {
    pub fn new(prefers_dark: bool, reduced_motion: bool) -> Self {
        Self {
            prefers_dark: MediaQuery::new(
                MediaQuery::PREFERS_DARK,
                prefers_dark,
            ),
            reduced_motion: MediaQuery::new(
                MediaQuery::PREFERS_REDUCED_MOTION,
                reduced_motion,
            ),
        }
    }
}
