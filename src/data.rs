use chrono::{DateTime, Local, SecondsFormat, Utc};
use log::info;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::storage::{
    KeyValueStore, StorageError, EDITOR_DOCUMENTS_KEY, EDITOR_SETTINGS_KEY, LAYOUT_LEFT_WIDTH_KEY,
    THEME_KEY, TIMER_SETTINGS_KEY,
};

pub const EXPORT_VERSION: &str = "1.0";

/// Keys exported under `settings`, in output order
const SETTINGS_KEYS: [&str; 4] = [
    TIMER_SETTINGS_KEY,
    EDITOR_SETTINGS_KEY,
    LAYOUT_LEFT_WIDTH_KEY,
    THEME_KEY,
];

#[derive(Error, Debug)]
pub enum DataError {
    #[error("nothing to import")]
    Empty,

    #[error("import data is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data format: {0}")]
    InvalidFormat(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Pretty-printed JSON snapshot of every setting and the saved documents
pub fn export<S: KeyValueStore>(store: &S, now: DateTime<Local>) -> Result<String, DataError> {
    let mut settings = Map::new();
    for key in SETTINGS_KEYS {
        settings.insert(key.to_string(), stored_value(store, key)?);
    }

    let payload = json!({
        "version": EXPORT_VERSION,
        "exportDate": now.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true),
        "settings": Value::Object(settings),
        "documents": stored_value(store, EDITOR_DOCUMENTS_KEY)?,
    });

    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Validate `text` and write every present value back; returns the keys written
pub fn import<S: KeyValueStore>(store: &S, text: &str) -> Result<Vec<&'static str>, DataError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DataError::Empty);
    }

    let payload: Value = serde_json::from_str(text)?;
    let Value::Object(payload) = payload else {
        return Err(DataError::InvalidFormat("expected a json object"));
    };
    if !is_present(payload.get("version")) {
        return Err(DataError::InvalidFormat("missing version"));
    }
    let settings = payload.get("settings").filter(|v| is_present(Some(v)));
    let documents = payload.get("documents").filter(|v| is_present(Some(v)));
    if settings.is_none() && documents.is_none() {
        return Err(DataError::InvalidFormat("neither settings nor documents"));
    }

    let mut written = Vec::new();
    if let Some(settings) = settings {
        for key in SETTINGS_KEYS {
            if let Some(value) = settings.get(key).filter(|v| is_present(Some(v))) {
                store.set(key, &stored_text(value)?)?;
                written.push(key);
            }
        }
    }
    if let Some(documents) = documents {
        store.set(EDITOR_DOCUMENTS_KEY, &stored_text(documents)?)?;
        written.push(EDITOR_DOCUMENTS_KEY);
    }

    info!("imported {}", written.join(", "));
    Ok(written)
}

/// Remove every stored key
pub fn clear<S: KeyValueStore>(store: &S) -> Result<(), DataError> {
    store.clear()?;
    info!("cleared all stored data");
    Ok(())
}

/// Stored blob as JSON when it parses, else as a string; missing is null
fn stored_value<S: KeyValueStore>(store: &S, key: &str) -> Result<Value, DataError> {
    Ok(match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        None => Value::Null,
    })
}

/// Strings and numbers are stored verbatim, structures as JSON text
fn stored_text(value: &Value) -> Result<String, DataError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other)?,
    })
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}
