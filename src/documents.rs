use chrono::{DateTime, Local, Utc};
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::storage::{KeyValueStore, StorageError, EDITOR_DOCUMENTS_KEY, EDITOR_SETTINGS_KEY};

const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "content_as_text")]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plain text, or the text of a rich-text delta (`{"delta": {"ops": [{"insert": ..}]}}`)
fn content_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Object(ref map) => map
            .get("delta")
            .and_then(|delta| delta.get("ops"))
            .and_then(Value::as_array)
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| op.get("insert").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default(),
        _ => String::new(),
    })
}

/// On-disk shape of the `editorDocuments` blob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DocumentsBlob {
    documents: Vec<Document>,
    current_document_id: Option<String>,
}

/// Saved notes plus which one is open
#[derive(Debug)]
pub struct DocumentStore<S: KeyValueStore> {
    store: S,
    documents: Vec<Document>,
    current_id: Option<String>,
}

impl<S: KeyValueStore> DocumentStore<S> {
    /// Load from `store`; an unreadable blob starts an empty list
    pub fn load(store: S) -> Self {
        let blob = match store.get(EDITOR_DOCUMENTS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<DocumentsBlob>(&raw).unwrap_or_else(|e| {
                warn!("ignoring unreadable documents: {e}");
                DocumentsBlob::default()
            }),
            Ok(None) => DocumentsBlob::default(),
            Err(e) => {
                warn!("failed to read documents: {e}");
                DocumentsBlob::default()
            }
        };

        let current_id = blob
            .current_document_id
            .filter(|id| blob.documents.iter().any(|d| &d.id == id));

        Self {
            store,
            documents: blob.documents,
            current_id,
        }
    }

    /// Most recently updated first
    pub fn list(&self) -> Vec<&Document> {
        self.documents
            .iter()
            .sorted_by(|a, b| b.updated_at.cmp(&a.updated_at))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&Document> {
        let id = self.current_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Update the current document, or create one and make it current
    pub fn save(
        &mut self,
        title: &str,
        content: &str,
        now: DateTime<Local>,
    ) -> Result<&Document, StorageError> {
        let title = match title.trim() {
            "" => title_from_content(content, now),
            t => t.to_string(),
        };
        let stamp = now.with_timezone(&Utc);

        let existing = self
            .current_id
            .as_deref()
            .and_then(|id| self.documents.iter().position(|d| d.id == id));

        let index = match existing {
            Some(i) => {
                let doc = &mut self.documents[i];
                doc.title = title;
                doc.content = content.to_string();
                doc.updated_at = stamp;
                i
            }
            None => {
                let id = self.fresh_id(now);
                info!("created document {id}");
                self.documents.push(Document {
                    id: id.clone(),
                    title,
                    content: content.to_string(),
                    created_at: stamp,
                    updated_at: stamp,
                });
                self.current_id = Some(id);
                self.documents.len() - 1
            }
        };

        self.persist()?;
        Ok(&self.documents[index])
    }

    /// Make `id` current; None if it does not exist
    pub fn open(&mut self, id: &str) -> Option<&Document> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        self.current_id = Some(id.to_string());
        if let Err(e) = self.persist() {
            warn!("failed to remember current document: {e}");
        }
        Some(&self.documents[index])
    }

    /// Detach from any document; the next save creates a new one
    pub fn new_document(&mut self) {
        self.current_id = None;
    }

    /// Returns false when `id` is unknown
    pub fn delete(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        if self.documents.len() == before {
            return Ok(false);
        }
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        info!("deleted document {id}");
        self.persist()?;
        Ok(true)
    }

    /// Document after (or before, for negative `step`) the current one in list order
    pub fn neighbour_id(&self, step: isize) -> Option<String> {
        let list = self.list();
        if list.is_empty() {
            return None;
        }
        let len = list.len() as isize;
        let next = match self.current_id.as_deref() {
            Some(id) => match list.iter().position(|d| d.id == id) {
                Some(i) => (i as isize + step).rem_euclid(len),
                None => 0,
            },
            None if step < 0 => len - 1,
            None => 0,
        };
        Some(list[next as usize].id.clone())
    }

    fn fresh_id(&self, now: DateTime<Local>) -> String {
        let mut millis = now.timestamp_millis();
        loop {
            let id = format!("doc_{millis}");
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let blob = DocumentsBlobRef {
            documents: &self.documents,
            current_document_id: self.current_id.as_deref(),
        };
        let data = serde_json::to_string(&blob)?;
        self.store.set(EDITOR_DOCUMENTS_KEY, &data)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentsBlobRef<'a> {
    documents: &'a [Document],
    current_document_id: Option<&'a str>,
}

/// First non-empty line (at most 50 chars), else a dated placeholder
pub fn title_from_content(content: &str, now: DateTime<Local>) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(TITLE_MAX_CHARS).collect())
        .unwrap_or_else(|| format!("Untitled - {}", now.format("%Y/%m/%d %H:%M")))
}

/// Note pane preferences stored under `editorSettings`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub is_visible: bool,
}

impl EditorSettings {
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(EDITOR_SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring unreadable editor settings: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("failed to read editor settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &S) -> Result<(), StorageError> {
        store.set(EDITOR_SETTINGS_KEY, &serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{TimeDelta, TimeZone};

    fn at(min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 4, 1, 10, min, 0).unwrap()
    }

    #[test]
    fn save_creates_then_updates_current() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);

        let id = docs.save("Week 1", "intro", at(0)).unwrap().id.clone();
        assert_eq!(id, format!("doc_{}", at(0).timestamp_millis()));
        assert_eq!(docs.current_id(), Some(id.as_str()));

        docs.save("Week 1", "intro\nmore", at(5)).unwrap();
        assert_eq!(docs.len(), 1);
        let doc = docs.current().unwrap();
        assert_eq!(doc.content, "intro\nmore");
        assert!(doc.updated_at > doc.created_at);
    }

    #[test]
    fn documents_survive_reload() {
        let kv = MemoryStore::new();
        {
            let mut docs = DocumentStore::load(&kv);
            docs.save("A", "alpha", at(0)).unwrap();
        }
        let docs = DocumentStore::load(&kv);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.current().unwrap().title, "A");
    }

    #[test]
    fn list_is_most_recent_first() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);
        docs.save("old", "", at(0)).unwrap();
        docs.new_document();
        docs.save("new", "", at(10)).unwrap();

        let titles: Vec<_> = docs.list().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn ids_stay_unique_within_same_millisecond() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);
        let a = docs.save("a", "", at(0)).unwrap().id.clone();
        docs.new_document();
        let b = docs.save("b", "", at(0)).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn delete_current_detaches() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);
        let id = docs.save("gone", "x", at(0)).unwrap().id.clone();

        assert!(docs.delete(&id).unwrap());
        assert!(docs.current().is_none());
        assert!(docs.is_empty());
        assert!(!docs.delete(&id).unwrap());
    }

    #[test]
    fn open_switches_current() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);
        let first = docs.save("one", "1", at(0)).unwrap().id.clone();
        docs.new_document();
        docs.save("two", "2", at(1)).unwrap();

        assert_eq!(docs.open(&first).unwrap().content, "1");
        assert_eq!(docs.current_id(), Some(first.as_str()));
        assert!(docs.open("doc_missing").is_none());
        assert_eq!(docs.current_id(), Some(first.as_str()));
    }

    #[test]
    fn neighbour_wraps_in_list_order() {
        let kv = MemoryStore::new();
        let mut docs = DocumentStore::load(&kv);
        let a = docs.save("a", "", at(0)).unwrap().id.clone();
        docs.new_document();
        let b = docs.save("b", "", at(1)).unwrap().id.clone();

        // list order is b, a; current is b
        assert_eq!(docs.neighbour_id(1), Some(a.clone()));
        assert_eq!(docs.neighbour_id(-1), Some(a));
        docs.new_document();
        assert_eq!(docs.neighbour_id(1), Some(b));
    }

    #[test]
    fn empty_title_uses_first_line() {
        let long = "x".repeat(80);
        assert_eq!(title_from_content("\n  \n  Chapter 3  \nbody", at(0)), "Chapter 3");
        assert_eq!(title_from_content(&long, at(0)).chars().count(), 50);
        assert_eq!(title_from_content(" \n", at(7)), "Untitled - 2024/04/01 10:07");
    }

    #[test]
    fn rich_text_content_is_flattened() {
        let kv = MemoryStore::new();
        let stamp = (at(0) + TimeDelta::seconds(1)).with_timezone(&Utc).to_rfc3339();
        kv.set(
            EDITOR_DOCUMENTS_KEY,
            &format!(
                r#"{{"documents":[{{"id":"doc_1","title":"t","content":{{"delta":{{"ops":[{{"insert":"Hello "}},{{"insert":"world\n"}}]}},"html":"<p>Hello world</p>"}},"createdAt":"{stamp}","updatedAt":"{stamp}"}}],"currentDocumentId":"doc_1"}}"#
            ),
        )
        .unwrap();

        let docs = DocumentStore::load(&kv);
        assert_eq!(docs.current().unwrap().content, "Hello world\n");
    }

    #[test]
    fn dangling_current_id_is_dropped() {
        let kv = MemoryStore::new();
        kv.set(
            EDITOR_DOCUMENTS_KEY,
            r#"{"documents":[],"currentDocumentId":"doc_9"}"#,
        )
        .unwrap();
        assert!(DocumentStore::load(&kv).current_id().is_none());
    }

    #[test]
    fn editor_settings_roundtrip() {
        let kv = MemoryStore::new();
        assert!(!EditorSettings::load(&kv).is_visible);
        EditorSettings { is_visible: true }.save(&kv).unwrap();
        assert_eq!(
            kv.get(EDITOR_SETTINGS_KEY).unwrap().as_deref(),
            Some(r#"{"isVisible":true}"#)
        );
        assert!(EditorSettings::load(&kv).is_visible);
    }

    #[test]
    fn editor_settings_ignore_unknown_fields() {
        let kv = MemoryStore::new();
        kv.set(EDITOR_SETTINGS_KEY, r#"{"isVisible":true,"zoomLevel":120}"#)
            .unwrap();
        assert!(EditorSettings::load(&kv).is_visible);
    }
}
