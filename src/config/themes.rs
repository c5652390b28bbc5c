use std::collections::HashMap;

use ratatui::style::Color;

use super::ThemeName;

/// Colours the UI draws with for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: Color,
    pub username: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub editing: Color,
    pub error: Color,
    pub muted: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    palettes: HashMap<ThemeName, ThemePalette>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.palettes.contains_key(theme)
    }

    pub fn palette(&self, theme: &ThemeName) -> ThemePalette {
        self.palettes
            .get(theme)
            .or_else(|| self.palettes.get(&ThemeName::Dark))
            .copied()
            .unwrap_or(DARK)
    }
}

const DARK: ThemePalette = ThemePalette {
    accent: Color::Cyan,
    username: Color::White,
    selection_bg: Color::Blue,
    selection_fg: Color::Black,
    editing: Color::Magenta,
    error: Color::Red,
    muted: Color::Gray,
};

const LIGHT: ThemePalette = ThemePalette {
    accent: Color::Blue,
    username: Color::Black,
    selection_bg: Color::LightBlue,
    selection_fg: Color::Black,
    editing: Color::Magenta,
    error: Color::Red,
    muted: Color::DarkGray,
};

const HIGH_CONTRAST: ThemePalette = ThemePalette {
    accent: Color::Yellow,
    username: Color::White,
    selection_bg: Color::White,
    selection_fg: Color::Black,
    editing: Color::LightMagenta,
    error: Color::LightRed,
    muted: Color::White,
};

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (ThemeName::Dark, DARK),
            (ThemeName::Light, LIGHT),
            (ThemeName::HighContrast, HIGH_CONTRAST),
        ]
        .into_iter()
        .collect();
        Self { palettes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_palette() {
        let registry = ThemeRegistry::default();
        for theme in [ThemeName::Dark, ThemeName::Light, ThemeName::HighContrast] {
            assert!(registry.contains(&theme));
        }
        assert_eq!(registry.palette(&ThemeName::Light).accent, Color::Blue);
    }
}
