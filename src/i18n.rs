use std::collections::BTreeMap;
use std::error::Error;

use include_dir::{include_dir, Dir};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError, LANGUAGE_KEY};

static LANG_DIR: Dir = include_dir!("src/lang");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "ja" => Some(Language::Ja),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Ja => Language::En,
            Language::En => Language::Ja,
        }
    }

    /// Stored preference; unknown values read as the default
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(LANGUAGE_KEY) {
            Ok(Some(code)) => Self::parse(&code).unwrap_or_default(),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("failed to read language preference: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(self, store: &S) -> Result<(), StorageError> {
        store.set(LANGUAGE_KEY, &self.to_string())
    }
}

/// Flat key to string lookup for the active language
#[derive(Debug, Clone)]
pub struct I18n {
    language: Language,
    table: BTreeMap<String, String>,
}

impl I18n {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            table: load_table(language),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        if language != self.language {
            self.language = language;
            self.table = load_table(language);
        }
    }

    /// Translation for `key`, or the key itself when missing
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

fn load_table(language: Language) -> BTreeMap<String, String> {
    read_table_from_file(&format!("{language}.json")).unwrap_or_else(|e| {
        warn!("no string table for {language}: {e}");
        BTreeMap::new()
    })
}

fn read_table_from_file(file_name: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("{file_name} not embedded"))?;
    let contents = file
        .contents_utf8()
        .ok_or_else(|| format!("{file_name} is not utf-8"))?;
    Ok(serde_json::from_str(contents)?)
}
