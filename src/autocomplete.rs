use serde::{Deserialize, Serialize};

use crate::genres::GenreMap;

/// Ghost suggestion for `text`, e.g. `:Ad` -> `:Adventure`.
pub fn suggest(genres: &GenreMap, text: &str) -> Option<String> {
    let prefix = text.strip_prefix(':')?;
    genres
        .first_with_prefix(prefix)
        .map(|name| format!(":{}", name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Tab,
    Enter,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyAction {
    None,
    /// The key was consumed; the field keeps focus.
    PreventDefault,
    Search,
}

/// The search field plus its ghost suggestion field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBox {
    pub text: String,
    pub ghost: String,
}

impl SearchBox {
    pub fn on_input(&mut self, text: &str, genres: &GenreMap) {
        self.text = text.to_string();
        self.ghost = suggest(genres, text).unwrap_or_default();
    }

    pub fn on_key(&mut self, key: Key) -> KeyAction {
        match key {
            Key::Tab => {
                if !self.ghost.is_empty() {
                    self.text = std::mem::take(&mut self.ghost);
                }
                self.ghost.clear();
                KeyAction::PreventDefault
            }
            Key::Enter => KeyAction::Search,
            Key::Other => KeyAction::None,
        }
    }
}
