use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One catalogued game and its compatibility attributes.
///
/// Every attribute list is kept in display order; positions shown to users are 1-based.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Display name, also the case-insensitive sort key of the list.
    pub name: String,
    /// Things that are known to work.
    #[serde(default)]
    pub functional: Vec<String>,
    /// Things that are known to be broken.
    #[serde(default)]
    pub broken: Vec<String>,
    /// Known crash scenarios.
    #[serde(default)]
    pub crashes: Vec<String>,
    /// Emulator settings worth applying for this game.
    #[serde(default, rename = "recommendedsettings")]
    pub recommended_settings: Vec<String>,
    /// Free-form remarks.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Record {
    /// Create a record with the given name and no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Borrow the attribute list backing `category`.
    pub fn attributes(&self, category: Category) -> &[String] {
        match category {
            Category::Functional => &self.functional,
            Category::Broken => &self.broken,
            Category::Crashes => &self.crashes,
            Category::RecommendedSettings => &self.recommended_settings,
            Category::Notes => &self.notes,
        }
    }

    /// Mutably borrow the attribute list backing `category`.
    pub fn attributes_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Functional => &mut self.functional,
            Category::Broken => &mut self.broken,
            Category::Crashes => &mut self.crashes,
            Category::RecommendedSettings => &mut self.recommended_settings,
            Category::Notes => &mut self.notes,
        }
    }

    /// Key used to order records in the list channels.
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Stable sort by case-insensitive name.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by_cached_key(Record::sort_key);
}

/// The five attribute categories of a [`Record`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Functional,
    Broken,
    Crashes,
    RecommendedSettings,
    Notes,
}

impl Category {
    /// All categories in the order they are rendered.
    pub const ALL: [Category; 5] = [
        Category::Functional,
        Category::Broken,
        Category::Crashes,
        Category::RecommendedSettings,
        Category::Notes,
    ];

    /// Identifier accepted by the `edit` command and used in the persisted document.
    pub fn key(self) -> &'static str {
        match self {
            Category::Functional => "functional",
            Category::Broken => "broken",
            Category::Crashes => "crashes",
            Category::RecommendedSettings => "recommendedsettings",
            Category::Notes => "notes",
        }
    }

    /// Section heading shown in rendered list messages.
    pub fn heading(self) -> &'static str {
        match self {
            Category::Functional => "Functional",
            Category::Broken => "Broken",
            Category::Crashes => "Crashes",
            Category::RecommendedSettings => "Recommended Settings",
            Category::Notes => "Notes",
        }
    }

    /// Bracketed list of every valid key, for error messages.
    pub fn valid_keys() -> String {
        let keys = Self::ALL
            .iter()
            .map(|category| format!("\"{}\"", category.key()))
            .collect::<Vec<_>>();
        format!("[{}]", keys.join(","))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raised when a string does not name a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}
