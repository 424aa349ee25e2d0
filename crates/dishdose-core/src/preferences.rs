//! Session preferences that outlive a single run: the color theme and the
//! one-time welcome flag.
//!
//! Both degrade to safe defaults (light theme, not yet welcomed) when the
//! store cannot be read or holds something unrecognizable.

use std::sync::Arc;

use tracing::{debug, warn};

use dishdose_contracts::storage::{Theme, THEME_KEY, WELCOMED_KEY};

use crate::{
    persist::{read_key, write_key, Persisted},
    traits::DurableStore,
};

pub struct Preferences {
    store: Arc<dyn DurableStore>,
    theme: Theme,
    welcomed: bool,
}

impl Preferences {
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let theme = match read_key(store.as_ref(), THEME_KEY) {
            None => Theme::default(),
            Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unrecognized stored theme; using light");
                Theme::default()
            }),
        };
        // Any stored value counts; only absence means "not yet welcomed".
        let welcomed = read_key(store.as_ref(), WELCOMED_KEY).is_some();

        debug!(theme = %theme, welcomed, "preferences loaded");
        Self { store, theme, welcomed }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Change the theme. The new value applies even if it cannot be saved.
    pub fn set_theme(&mut self, theme: Theme) -> Persisted<Theme> {
        self.theme = theme;
        let warning = write_key(self.store.as_ref(), THEME_KEY, theme.as_str());
        Persisted { value: theme, warning }
    }

    pub fn toggle_theme(&mut self) -> Persisted<Theme> {
        self.set_theme(self.theme.toggled())
    }

    /// True until `mark_welcomed` has been called in this or an earlier run.
    pub fn should_welcome(&self) -> bool {
        !self.welcomed
    }

    pub fn mark_welcomed(&mut self) -> Persisted<()> {
        self.welcomed = true;
        let warning = write_key(self.store.as_ref(), WELCOMED_KEY, "true");
        Persisted { value: (), warning }
    }
}
