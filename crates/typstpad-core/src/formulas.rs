//! Saved formula library and editor draft.
//!
//! The whole library lives as one JSON document in the key-value store.
//! Reads never fail: missing or corrupt data yields an empty library.
//! Write failures are logged and the operation still returns its result.

use crate::config::StorageConfig;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

const DEFAULT_NAME_CHARS: usize = 20;
const UNTITLED: &str = "Untitled";

/// A formula saved by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFormula {
    pub id: String,
    pub name: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

/// The persisted library document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormulaStorage {
    pub current_draft: String,
    /// Newest first.
    pub saved_formulas: Vec<SavedFormula>,
    pub version: u32,
}

impl Default for FormulaStorage {
    fn default() -> Self {
        Self {
            current_draft: String::new(),
            saved_formulas: Vec::new(),
            version: StorageConfig::FORMULAS_VERSION,
        }
    }
}

/// Fields to change in [`FormulaLibrary::update_formula`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Name used when a formula is saved without one.
///
/// Whitespace runs collapse to single spaces; long content is cut to 20
/// characters followed by `...`.
pub fn default_formula_name(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNTITLED.to_string();
    }
    if collapsed.chars().count() > DEFAULT_NAME_CHARS {
        let head: String = collapsed.chars().take(DEFAULT_NAME_CHARS).collect();
        format!("{}...", head)
    } else {
        collapsed
    }
}

/// Formula library backed by a key-value store.
#[derive(Clone)]
pub struct FormulaLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl FormulaLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the library, falling back to an empty one.
    pub fn load(&self) -> FormulaStorage {
        let raw = match self.store.get(StorageConfig::FORMULAS_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return FormulaStorage::default(),
            Err(e) => {
                warn!("Failed to read formula library: {}", e);
                return FormulaStorage::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding unreadable formula library: {}", e);
            FormulaStorage::default()
        })
    }

    fn save(&self, storage: &FormulaStorage) {
        let json = match serde_json::to_string(storage) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize formula library: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(StorageConfig::FORMULAS_STORAGE_KEY, &json) {
            warn!("Failed to save formula library: {}", e);
        }
    }

    pub fn draft(&self) -> String {
        self.load().current_draft
    }

    pub fn save_draft(&self, content: &str) {
        let mut storage = self.load();
        storage.current_draft = content.to_string();
        self.save(&storage);
    }

    /// Newest first.
    pub fn saved_formulas(&self) -> Vec<SavedFormula> {
        self.load().saved_formulas
    }

    /// Save a formula at the front of the library. A blank name is derived from the content.
    pub fn add_formula(&self, name: &str, content: &str) -> SavedFormula {
        let now = chrono::Utc::now().timestamp_millis();
        let name = if name.trim().is_empty() {
            default_formula_name(content)
        } else {
            name.to_string()
        };
        let formula = SavedFormula {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut storage = self.load();
        storage.saved_formulas.insert(0, formula.clone());
        self.save(&storage);
        formula
    }

    /// Apply `update` to the formula with `id`. Returns the updated formula, if found.
    pub fn update_formula(&self, id: &str, update: FormulaUpdate) -> Option<SavedFormula> {
        let mut storage = self.load();
        let formula = storage.saved_formulas.iter_mut().find(|f| f.id == id)?;

        if let Some(name) = update.name {
            formula.name = name;
        }
        if let Some(content) = update.content {
            formula.content = content;
        }
        formula.updated_at = chrono::Utc::now()
            .timestamp_millis()
            .max(formula.created_at);

        let updated = formula.clone();
        self.save(&storage);
        Some(updated)
    }

    /// Remove the formula with `id`. Returns whether it existed.
    pub fn delete_formula(&self, id: &str) -> bool {
        let mut storage = self.load();
        let before = storage.saved_formulas.len();
        storage.saved_formulas.retain(|f| f.id != id);
        if storage.saved_formulas.len() == before {
            return false;
        }
        self.save(&storage);
        true
    }

    /// Remove every saved formula, keeping the draft. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut storage = self.load();
        let removed = storage.saved_formulas.len();
        storage.saved_formulas.clear();
        self.save(&storage);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn library() -> (Arc<MemoryKeyValueStore>, FormulaLibrary) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let library = FormulaLibrary::new(store.clone());
        (store, library)
    }

    #[test]
    fn test_default_formula_name() {
        assert_eq!(default_formula_name("  x^2  "), "x^2");
        assert_eq!(default_formula_name("a \n\t b"), "a b");
        assert_eq!(
            default_formula_name("sum_(i=1)^n i = (n(n+1))/2"),
            "sum_(i=1)^n i = (n(n..."
        );
        assert_eq!(default_formula_name("   "), "Untitled");
        assert_eq!(default_formula_name("αβγδεζηθικλμνξοπρστυφ"), "αβγδεζηθικλμνξοπρστυ...");
    }

    #[test]
    fn test_load_defaults_when_missing_or_corrupt() {
        let (store, library) = library();
        assert_eq!(library.load(), FormulaStorage::default());

        store
            .set(StorageConfig::FORMULAS_STORAGE_KEY, "{not json")
            .unwrap();
        assert_eq!(library.load(), FormulaStorage::default());
    }

    #[test]
    fn test_load_merges_partial_document() {
        let (store, library) = library();
        store
            .set(
                StorageConfig::FORMULAS_STORAGE_KEY,
                r#"{"currentDraft":"x + y"}"#,
            )
            .unwrap();

        let storage = library.load();
        assert_eq!(storage.current_draft, "x + y");
        assert!(storage.saved_formulas.is_empty());
        assert_eq!(storage.version, 1);
    }

    #[test]
    fn test_add_is_newest_first() {
        let (_store, library) = library();
        let first = library.add_formula("Euler", "e^(i pi) + 1 = 0");
        let second = library.add_formula("", "a^2 + b^2 = c^2");

        assert_eq!(second.name, "a^2 + b^2 = c^2");
        let saved = library.saved_formulas();
        assert_eq!(saved, vec![second, first]);
    }

    #[test]
    fn test_update_and_delete() {
        let (_store, library) = library();
        let formula = library.add_formula("Old", "x");

        let updated = library
            .update_formula(
                &formula.id,
                FormulaUpdate {
                    name: Some("New".into()),
                    content: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.content, "x");
        assert!(updated.updated_at >= formula.created_at);

        assert!(library
            .update_formula("missing", FormulaUpdate::default())
            .is_none());

        assert!(library.delete_formula(&formula.id));
        assert!(!library.delete_formula(&formula.id));
        assert!(library.saved_formulas().is_empty());
    }

    #[test]
    fn test_clear_all_keeps_draft() {
        let (_store, library) = library();
        library.save_draft("draft text");
        library.add_formula("a", "1");
        library.add_formula("b", "2");

        assert_eq!(library.clear_all(), 2);
        assert!(library.saved_formulas().is_empty());
        assert_eq!(library.draft(), "draft text");
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let (store, library) = library();
        store.set_fail_writes(true);

        let formula = library.add_formula("a", "1");
        assert_eq!(formula.name, "a");
        assert!(library.saved_formulas().is_empty());
    }

    #[test]
    fn test_persisted_shape() {
        let (store, library) = library();
        library.save_draft("x");
        let raw = store.raw(StorageConfig::FORMULAS_STORAGE_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["currentDraft"], "x");
        assert_eq!(json["version"], 1);
        assert!(json["savedFormulas"].as_array().unwrap().is_empty());
    }
}
