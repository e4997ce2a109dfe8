use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A search hit for one game, normalised from whichever source produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Source-native identifier, only meaningful to the owning source
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text introduction (may be empty)
    pub introduction: String,
    /// Platforms in the order the source listed them
    pub platform: Vec<String>,
    /// Name of the source that produced this game, used to route resolution
    pub source: String,
}

impl Game {
    /// Multi-line description block used by detail views
    #[must_use]
    pub fn summary(&self) -> String {
        let introduction = if self.introduction.trim().is_empty() {
            "none"
        } else {
            self.introduction.as_str()
        };

        format!(
            "Name: {}\nPlatform: {}\nIntroduction: {}\n",
            self.name,
            self.platform.join(", "),
            introduction
        )
    }
}

/// Wire value that a source may send either as a bare string or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// The semantically primary value: the string itself, or the first list element
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value.as_str()),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }

    /// All values in order
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

/// A downloadable artifact attached to a game.
///
/// Unknown wire fields are ignored so new server-side attributes never break parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<FieldValue>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<FieldValue>,
}

impl Resource {
    /// Display name, empty when the source omitted it
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// First content value, empty when absent
    #[must_use]
    pub fn primary_content(&self) -> &str {
        self.content
            .as_ref()
            .and_then(FieldValue::primary)
            .unwrap_or_default()
    }

    /// Password, treating an empty string the same as an absent one
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Every individual link across all content values.
    ///
    /// Sources frequently pack several mirrors into one string separated by
    /// commas or whitespace.
    #[must_use]
    pub fn links(&self) -> Vec<&str> {
        let Some(content) = &self.content else {
            return Vec::new();
        };

        content
            .values()
            .iter()
            .flat_map(|value| link_separator().split(value))
            .filter(|link| !link.is_empty())
            .collect()
    }

    /// URL to open for `link`, with the password pre-filled for Baidu Pan shares
    #[must_use]
    pub fn browser_url(&self, link: &str) -> String {
        match self.password() {
            Some(password) if link.contains("pan.baidu.com") => {
                let separator = if link.contains('?') { '&' } else { '?' };
                format!("{link}{separator}pwd={password}")
            }
            _ => link.to_string(),
        }
    }
}

fn link_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[,\s]+").expect("static regex is valid"))
}
