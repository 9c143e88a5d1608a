use crate::ports::storage::{KeyValueStore, StorageError};

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub(crate) const THEME_KEY: &str = "themeColor";
pub(crate) const NOTIFICATIONS_KEY: &str = "notifications";

// Only this exact literal opts out; everything else keeps the default on.
const DISABLED_LITERAL: &str = "false";
const ENABLED_LITERAL: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeColor {
    #[default]
    Blue,
    Purple,
    Pink,
    Green,
    Orange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub primary: Rgb,
    pub secondary: Rgb,
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

impl ThemeColor {
    pub const ALL: [ThemeColor; 5] = [
        ThemeColor::Blue,
        ThemeColor::Purple,
        ThemeColor::Pink,
        ThemeColor::Green,
        ThemeColor::Orange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeColor::Blue => "blue",
            ThemeColor::Purple => "purple",
            ThemeColor::Pink => "pink",
            ThemeColor::Green => "green",
            ThemeColor::Orange => "orange",
        }
    }

    pub fn palette(self) -> ThemePalette {
        match self {
            ThemeColor::Blue => ThemePalette {
                primary: rgb(59, 130, 246),
                secondary: rgb(147, 51, 234),
            },
            ThemeColor::Purple => ThemePalette {
                primary: rgb(147, 51, 234),
                secondary: rgb(236, 72, 153),
            },
            ThemeColor::Pink => ThemePalette {
                primary: rgb(236, 72, 153),
                secondary: rgb(249, 115, 22),
            },
            ThemeColor::Green => ThemePalette {
                primary: rgb(34, 197, 94),
                secondary: rgb(59, 130, 246),
            },
            ThemeColor::Orange => ThemePalette {
                primary: rgb(249, 115, 22),
                secondary: rgb(239, 68, 68),
            },
        }
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeColor {
    type Err = PreferenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "blue" => Ok(ThemeColor::Blue),
            "purple" => Ok(ThemeColor::Purple),
            "pink" => Ok(ThemeColor::Pink),
            "green" => Ok(ThemeColor::Green),
            "orange" => Ok(ThemeColor::Orange),
            _ => Err(PreferenceError::UnknownThemeColor(raw.to_string())),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

#[derive(Debug)]
pub enum PreferenceError {
    UnknownThemeColor(String),
}

impl fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceError::UnknownThemeColor(raw) => write!(
                f,
                "unknown theme color '{raw}', expected one of blue, purple, pink, green, orange"
            ),
        }
    }
}

impl std::error::Error for PreferenceError {}

struct PreferenceInner {
    theme_color: ThemeColor,
    notifications_enabled: bool,
}

/// Per-profile display preferences. Values load once at construction and
/// every change writes straight through to storage.
#[derive(Clone)]
pub struct PreferenceStore<S> {
    storage: S,
    inner: Arc<Mutex<PreferenceInner>>,
}

impl<S> PreferenceStore<S>
where
    S: KeyValueStore,
{
    pub fn load(storage: S) -> Self {
        let theme_color = match read_key(&storage, THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_default(),
            None => ThemeColor::default(),
        };
        let notifications_enabled =
            read_key(&storage, NOTIFICATIONS_KEY).as_deref() != Some(DISABLED_LITERAL);

        Self {
            storage,
            inner: Arc::new(Mutex::new(PreferenceInner {
                theme_color,
                notifications_enabled,
            })),
        }
    }

    pub fn theme_color(&self) -> ThemeColor {
        self.inner.lock().expect("preferences lock").theme_color
    }

    pub fn palette(&self) -> ThemePalette {
        self.theme_color().palette()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.inner
            .lock()
            .expect("preferences lock")
            .notifications_enabled
    }

    pub fn set_theme_color(&self, color: ThemeColor) -> Result<(), StorageError> {
        self.inner.lock().expect("preferences lock").theme_color = color;
        self.storage.set(THEME_KEY, color.as_str())
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.inner
            .lock()
            .expect("preferences lock")
            .notifications_enabled = enabled;
        let literal = if enabled {
            ENABLED_LITERAL
        } else {
            DISABLED_LITERAL
        };
        self.storage.set(NOTIFICATIONS_KEY, literal)
    }
}

fn read_key<S: KeyValueStore>(storage: &S, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("failed to read preference {key}: {err}");
            None
        }
    }
}
