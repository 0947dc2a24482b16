use log::warn;
use ratatui::style::{Color, Modifier, Style};

use crate::storage::{KeyValueStore, StorageError, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(THEME_KEY) {
            Ok(Some(value)) if value == "dark" => Theme::Dark,
            Ok(_) => Theme::Light,
            Err(e) => {
                warn!("failed to read theme: {e}");
                Theme::Light
            }
        }
    }

    pub fn save<S: KeyValueStore>(self, store: &S) -> Result<(), StorageError> {
        store.set(THEME_KEY, &self.to_string())
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                muted: Color::DarkGray,
                warning: Color::Rgb(0xc0, 0x60, 0x00),
                overtime: Color::Red,
                break_accent: Color::Green,
            },
            Theme::Dark => Palette {
                base: Style::default().fg(Color::Gray).bg(Color::Black),
                accent: Color::Cyan,
                muted: Color::DarkGray,
                warning: Color::Yellow,
                overtime: Color::LightRed,
                break_accent: Color::LightGreen,
            },
        }
    }
}

/// Colours the widgets draw with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub base: Style,
    pub accent: Color,
    pub muted: Color,
    pub warning: Color,
    pub overtime: Color,
    pub break_accent: Color,
}

impl Palette {
    pub fn bold(&self, color: Color) -> Style {
        self.base.fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn dim(&self) -> Style {
        self.base.fg(self.muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn theme_defaults_to_light_and_persists() {
        let store = MemoryStore::new();
        assert_eq!(Theme::load(&store), Theme::Light);

        Theme::Light.toggled().save(&store).unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(Theme::load(&store), Theme::Dark);
    }

    #[test]
    fn unknown_theme_value_is_light() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "\"sepia\"").unwrap();
        assert_eq!(Theme::load(&store), Theme::Light);
    }

    #[test]
    fn palettes_differ() {
        assert_ne!(Theme::Light.palette(), Theme::Dark.palette());
    }
}
