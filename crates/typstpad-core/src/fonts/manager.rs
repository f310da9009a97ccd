//! Font asset manager.
//!
//! Owns the installed bundled-font selection and the uploaded font set, and
//! merges both into the [`FontSourceSet`] handed to the compiler. The
//! persistent stores are the source of truth; the in-memory state is a
//! mirror that is only updated after the corresponding store write returns.
//!
//! Storage failures never reach the caller. Reads fall back to the last
//! known (or default) state and writes are logged and skipped, so the
//! editor keeps working without persistence.

use super::catalog::{self, bundled_fonts, default_bundled_ids, normalize_bundled_ids};
use super::fingerprint::compute_fingerprint_async;
use super::metadata::FontMetadataExtractor;
use super::types::{BundledFont, FontInfo, FontSourceSet, FontUpload, UploadedFont};
use crate::config::FontConfig;
use crate::error::Result;
use crate::storage::{FontObjectStore, KeyValueStore};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Supplies the font set a compiler instance is built from.
#[async_trait]
pub trait FontSourceProvider: Send + Sync {
    async fn current_sources(&self) -> Result<FontSourceSet>;
}

#[derive(Debug, Default)]
struct FontState {
    bundled_ids: Vec<String>,
    /// Newest first, unique by fingerprint.
    uploaded: Vec<UploadedFont>,
}

/// Catalog, persistence and deduplication of font sources.
pub struct FontAssetManager {
    settings: Arc<dyn KeyValueStore>,
    store: Arc<dyn FontObjectStore>,
    extractor: Arc<dyn FontMetadataExtractor>,
    state: Mutex<Option<FontState>>,
}

impl FontAssetManager {
    pub fn new(
        settings: Arc<dyn KeyValueStore>,
        store: Arc<dyn FontObjectStore>,
        extractor: Arc<dyn FontMetadataExtractor>,
    ) -> Self {
        Self {
            settings,
            store,
            extractor,
            state: Mutex::new(None),
        }
    }

    /// The static bundled catalog. Grouping by family is left to the caller.
    pub fn list_bundled_fonts(&self) -> &'static [BundledFont] {
        bundled_fonts()
    }

    /// Currently installed bundled font ids.
    ///
    /// Re-reads the settings store every time and repairs the stored value
    /// when it is missing, malformed, or lists unknown ids.
    pub async fn installed_bundled_ids(&self) -> Vec<String> {
        let mut state = self.state().await;
        let ids = self.read_bundled_ids(Some(state.bundled_ids.as_slice()));
        state.bundled_ids = ids.clone();
        ids
    }

    /// Replace the installed selection.
    ///
    /// Unknown ids and duplicates are dropped. The compiler is not refreshed;
    /// callers trigger that separately. Returns the normalized selection.
    pub async fn set_installed_bundled_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        let normalized = normalize_bundled_ids(ids);
        self.persist_bundled_ids(&normalized);

        let mut state = self.state().await;
        state.bundled_ids = normalized.clone();
        info!("Installed {} bundled fonts", normalized.len());
        normalized
    }

    /// Uploaded fonts, newest first.
    pub async fn uploaded_fonts(&self) -> Vec<UploadedFont> {
        self.state().await.uploaded.clone()
    }

    /// Add uploaded font files.
    ///
    /// Files whose content matches an already stored font (or an earlier
    /// file in the same batch) are skipped without notice; the returned list
    /// only holds the fonts that were actually added, in upload order.
    ///
    /// A font whose metadata cannot be read is still added, with the family
    /// set to [`FontConfig::UNKNOWN_FAMILY`]. A file that cannot be
    /// fingerprinted is skipped with a warning and the batch continues.
    pub async fn add_uploaded_fonts(&self, uploads: Vec<FontUpload>) -> Result<Vec<UploadedFont>> {
        let mut state = self.state().await;
        let mut known: HashSet<String> = state
            .uploaded
            .iter()
            .filter_map(|font| font.fingerprint.clone())
            .collect();

        let mut added = Vec::new();
        for upload in uploads {
            let fingerprint = match compute_fingerprint_async(upload.data.clone()).await {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    warn!("Skipping font upload {}: {}", upload.file_name, e);
                    continue;
                }
            };
            if known.contains(&fingerprint) {
                debug!("Skipping duplicate font upload {}", upload.file_name);
                continue;
            }

            let info = self.describe(&upload).await;
            let font = UploadedFont {
                id: uuid::Uuid::new_v4().to_string(),
                file_name: upload.file_name,
                family: info
                    .family
                    .filter(|family| !family.trim().is_empty())
                    .unwrap_or_else(|| FontConfig::UNKNOWN_FAMILY.to_string()),
                data: upload.data,
                style: info.style,
                weight: info.weight,
                added_at: chrono::Utc::now().timestamp_millis(),
                fingerprint: Some(fingerprint.clone()),
            };

            if let Err(e) = self.store.put(&font).await {
                warn!(
                    "Failed to persist font {}, keeping it for this session only: {}",
                    font.file_name, e
                );
            }

            info!("Added font {} ({})", font.file_name, font.family);
            state.uploaded.insert(0, font.clone());
            known.insert(fingerprint);
            added.push(font);
        }

        Ok(added)
    }

    /// Remove an uploaded font. Unknown ids are ignored.
    pub async fn remove_uploaded_font(&self, id: &str) {
        let mut state = self.state().await;
        if let Err(e) = self.store.delete(id).await {
            warn!("Failed to delete font {} from store: {}", id, e);
        }
        let before = state.uploaded.len();
        state.uploaded.retain(|font| font.id != id);
        if state.uploaded.len() < before {
            info!("Removed uploaded font {}", id);
        }
    }

    /// Merge installed bundled fonts and uploaded fonts. Never cached.
    pub async fn font_source_set(&self) -> FontSourceSet {
        let state = self.state().await;

        let mut families = BTreeSet::new();
        let mut urls = Vec::new();
        for font in bundled_fonts()
            .iter()
            .filter(|font| state.bundled_ids.iter().any(|id| id == font.id))
        {
            urls.push(catalog::bundled_font_url(font));
            families.insert(font.family.to_string());
        }

        let mut blobs = Vec::with_capacity(state.uploaded.len());
        for font in &state.uploaded {
            blobs.push(font.data.clone());
            families.insert(font.family.clone());
        }

        FontSourceSet {
            urls,
            blobs,
            families,
        }
    }

    /// Lock the state, loading it from the stores on first use.
    async fn state(&self) -> MappedMutexGuard<'_, FontState> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            let loaded = FontState {
                bundled_ids: self.read_bundled_ids(None),
                uploaded: self.load_uploaded().await,
            };
            *guard = Some(loaded);
        }
        MutexGuard::map(guard, |state| state.get_or_insert_with(FontState::default))
    }

    fn read_bundled_ids(&self, last_known: Option<&[String]>) -> Vec<String> {
        let raw = match self.settings.get(FontConfig::INSTALLED_STORAGE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read installed fonts, using in-memory selection: {}", e);
                return last_known
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(default_bundled_ids);
            }
        };

        let Some(raw) = raw else {
            let defaults = default_bundled_ids();
            self.persist_bundled_ids(&defaults);
            return defaults;
        };

        let parsed: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Stored font selection is not valid JSON, resetting: {}", e);
                let defaults = default_bundled_ids();
                self.persist_bundled_ids(&defaults);
                return defaults;
            }
        };

        let normalized = match parsed.as_array() {
            Some(items) => normalize_bundled_ids(items.iter().filter_map(|item| item.as_str())),
            None => default_bundled_ids(),
        };

        if serde_json::Value::from(normalized.clone()) != parsed {
            debug!("Repairing stored font selection");
            self.persist_bundled_ids(&normalized);
        }
        normalized
    }

    fn persist_bundled_ids(&self, ids: &[String]) {
        let encoded = match serde_json::to_string(ids) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode font selection: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .settings
            .set(FontConfig::INSTALLED_STORAGE_KEY, &encoded)
        {
            warn!("Failed to persist font selection: {}", e);
        }
    }

    /// Load uploaded fonts newest-first, dropping fingerprint duplicates.
    async fn load_uploaded(&self) -> Vec<UploadedFont> {
        let mut fonts = match self.store.get_all().await {
            Ok(fonts) => fonts,
            Err(e) => {
                warn!("Failed to load uploaded fonts: {}", e);
                return Vec::new();
            }
        };
        fonts.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(fonts.len());
        for mut font in fonts {
            let fingerprint = match font.fingerprint.clone() {
                Some(fingerprint) => fingerprint,
                None => match compute_fingerprint_async(font.data.clone()).await {
                    Ok(fingerprint) => {
                        font.fingerprint = Some(fingerprint.clone());
                        if let Err(e) = self.store.put(&font).await {
                            debug!("Could not cache fingerprint for {}: {}", font.id, e);
                        }
                        fingerprint
                    }
                    Err(e) => {
                        warn!("Failed to fingerprint font {}: {}", font.id, e);
                        unique.push(font);
                        continue;
                    }
                },
            };

            if !seen.insert(fingerprint) {
                debug!("Dropping duplicate stored font {}", font.id);
                if let Err(e) = self.store.delete(&font.id).await {
                    debug!("Could not delete duplicate font {}: {}", font.id, e);
                }
                continue;
            }
            unique.push(font);
        }

        debug!("Loaded {} uploaded fonts", unique.len());
        unique
    }

    async fn describe(&self, upload: &FontUpload) -> FontInfo {
        match self.extractor.font_info(&upload.data).await {
            Ok(infos) => infos.into_iter().next().unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read metadata for {}: {}", upload.file_name, e);
                FontInfo::default()
            }
        }
    }
}

#[async_trait]
impl FontSourceProvider for FontAssetManager {
    async fn current_sources(&self) -> Result<FontSourceSet> {
        Ok(self.font_source_set().await)
    }
}
