//! Command handlers. Each writes its output to the given writer.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use typstpad_core::config::StorageConfig;
use typstpad_core::fonts::{find_bundled, FontAssetManager, FontUpload, OpenTypeExtractor};
use typstpad_core::formulas::FormulaLibrary;
use typstpad_core::share;
use typstpad_core::storage::{JsonFileStore, SqliteFontStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Font manager and formula library over the on-disk stores.
pub struct Context {
    pub fonts: FontAssetManager,
    pub formulas: FormulaLibrary,
}

impl Context {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let settings = Arc::new(JsonFileStore::new(
            data_dir.join(StorageConfig::SETTINGS_FILE_NAME),
        ));
        let font_db = data_dir.join(StorageConfig::FONT_DB_FILE_NAME);
        let store = SqliteFontStore::open(&font_db)
            .with_context(|| format!("Failed to open font database {}", font_db.display()))?;

        Ok(Self {
            fonts: FontAssetManager::new(
                settings.clone(),
                Arc::new(store),
                Arc::new(OpenTypeExtractor::new()),
            ),
            formulas: FormulaLibrary::new(settings),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundledFontRow<'a> {
    id: &'a str,
    family: &'a str,
    label: &'a str,
    category: &'a str,
    installed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFontRow<'a> {
    id: &'a str,
    file_name: &'a str,
    family: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u16>,
    size: usize,
    added_at: i64,
}

impl<'a> From<&'a typstpad_core::UploadedFont> for UploadedFontRow<'a> {
    fn from(font: &'a typstpad_core::UploadedFont) -> Self {
        Self {
            id: &font.id,
            file_name: &font.file_name,
            family: &font.family,
            style: font.style.as_deref(),
            weight: font.weight,
            size: font.data.len(),
            added_at: font.added_at,
        }
    }
}

pub async fn fonts_list(ctx: &Context, out: &mut impl Write, format: OutputFormat) -> Result<()> {
    let installed: BTreeSet<String> = ctx
        .fonts
        .installed_bundled_ids()
        .await
        .into_iter()
        .collect();
    let uploaded = ctx.fonts.uploaded_fonts().await;

    let bundled: Vec<BundledFontRow<'_>> = ctx
        .fonts
        .list_bundled_fonts()
        .iter()
        .map(|font| BundledFontRow {
            id: font.id,
            family: font.family,
            label: font.label,
            category: font.category.as_str(),
            installed: installed.contains(font.id),
        })
        .collect();

    if format == OutputFormat::Json {
        let uploaded: Vec<UploadedFontRow<'_>> = uploaded.iter().map(Into::into).collect();
        return write_json(
            out,
            &serde_json::json!({ "bundled": bundled, "uploaded": uploaded }),
        );
    }

    let mut family = "";
    for row in &bundled {
        if row.family != family {
            family = row.family;
            writeln!(out, "{} ({})", row.family, row.category)?;
        }
        let mark = if row.installed { "x" } else { " " };
        writeln!(out, "  [{}] {:<36} {}", mark, row.id, row.label)?;
    }

    if !uploaded.is_empty() {
        writeln!(out, "Uploaded")?;
        for font in &uploaded {
            writeln!(
                out,
                "  {}  {} ({}, {} bytes)",
                font.id,
                font.file_name,
                font.family,
                font.data.len()
            )?;
        }
    }
    Ok(())
}

pub async fn fonts_installed(
    ctx: &Context,
    out: &mut impl Write,
    format: OutputFormat,
) -> Result<()> {
    let ids = ctx.fonts.installed_bundled_ids().await;
    if format == OutputFormat::Json {
        return write_json(out, &ids);
    }
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}

fn warn_unknown(ids: &[String]) {
    for id in ids.iter().filter(|id| find_bundled(id).is_none()) {
        warn!("Ignoring unknown bundled font {}", id);
    }
}

pub async fn fonts_install(ctx: &Context, out: &mut impl Write, ids: &[String]) -> Result<()> {
    warn_unknown(ids);
    let mut selection = ctx.fonts.installed_bundled_ids().await;
    selection.extend(ids.iter().cloned());
    let installed = ctx.fonts.set_installed_bundled_ids(&selection).await;
    writeln!(out, "{} bundled fonts installed", installed.len())?;
    Ok(())
}

pub async fn fonts_uninstall(ctx: &Context, out: &mut impl Write, ids: &[String]) -> Result<()> {
    warn_unknown(ids);
    let selection: Vec<String> = ctx
        .fonts
        .installed_bundled_ids()
        .await
        .into_iter()
        .filter(|id| !ids.contains(id))
        .collect();
    let installed = ctx.fonts.set_installed_bundled_ids(&selection).await;
    writeln!(out, "{} bundled fonts installed", installed.len())?;
    Ok(())
}

pub async fn fonts_upload(
    ctx: &Context,
    out: &mut impl Write,
    paths: &[PathBuf],
    format: OutputFormat,
) -> Result<()> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(FontUpload::new(file_name, data));
    }

    let requested = uploads.len();
    let added = ctx.fonts.add_uploaded_fonts(uploads).await?;
    info!("Uploaded {} of {} fonts", added.len(), requested);

    if format == OutputFormat::Json {
        let rows: Vec<UploadedFontRow<'_>> = added.iter().map(Into::into).collect();
        return write_json(out, &rows);
    }
    for font in &added {
        writeln!(out, "Added {} as {} ({})", font.file_name, font.family, font.id)?;
    }
    let skipped = requested - added.len();
    if skipped > 0 {
        writeln!(out, "Skipped {} already uploaded", skipped)?;
    }
    Ok(())
}

pub async fn fonts_remove(ctx: &Context, out: &mut impl Write, id: &str) -> Result<()> {
    let exists = ctx
        .fonts
        .uploaded_fonts()
        .await
        .iter()
        .any(|font| font.id == id);
    if !exists {
        bail!("No uploaded font with id {}", id);
    }
    ctx.fonts.remove_uploaded_font(id).await;
    writeln!(out, "Removed {}", id)?;
    Ok(())
}

pub async fn fonts_sources(
    ctx: &Context,
    out: &mut impl Write,
    format: OutputFormat,
) -> Result<()> {
    let sources = ctx.fonts.font_source_set().await;
    if format == OutputFormat::Json {
        return write_json(
            out,
            &serde_json::json!({
                "urls": sources.urls,
                "uploaded": sources.blobs.len(),
                "families": sources.families,
                "totalCount": sources.total_count(),
            }),
        );
    }

    for url in &sources.urls {
        writeln!(out, "{}", url)?;
    }
    writeln!(out, "{} uploaded font(s)", sources.blobs.len())?;
    writeln!(
        out,
        "Families: {}",
        sources.families.iter().cloned().collect::<Vec<_>>().join(", ")
    )?;
    Ok(())
}

pub fn formulas_list(ctx: &Context, out: &mut impl Write, format: OutputFormat) -> Result<()> {
    let formulas = ctx.formulas.saved_formulas();
    if format == OutputFormat::Json {
        return write_json(out, &formulas);
    }
    if formulas.is_empty() {
        writeln!(out, "No saved formulas")?;
    }
    for formula in formulas {
        writeln!(out, "{}  {}", formula.id, formula.name)?;
        writeln!(out, "    {}", formula.content)?;
    }
    Ok(())
}

pub fn formulas_add(
    ctx: &Context,
    out: &mut impl Write,
    name: &str,
    content: &str,
    format: OutputFormat,
) -> Result<()> {
    if content.trim().is_empty() {
        bail!("Formula content is empty");
    }
    let formula = ctx.formulas.add_formula(name, content);
    if format == OutputFormat::Json {
        return write_json(out, &formula);
    }
    writeln!(out, "Saved {} ({})", formula.name, formula.id)?;
    Ok(())
}

pub fn formulas_delete(ctx: &Context, out: &mut impl Write, id: &str) -> Result<()> {
    if !ctx.formulas.delete_formula(id) {
        bail!("No saved formula with id {}", id);
    }
    writeln!(out, "Deleted {}", id)?;
    Ok(())
}

pub fn formulas_clear(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let removed = ctx.formulas.clear_all();
    writeln!(out, "Deleted {} formula(s)", removed)?;
    Ok(())
}

pub fn share_encode(out: &mut impl Write, code: &str, base: Option<&str>) -> Result<()> {
    match base {
        Some(base) => writeln!(out, "{}", share::share_url(base, code))?,
        None => writeln!(out, "{}", share::encode_formula(code))?,
    }
    Ok(())
}

pub fn share_decode(out: &mut impl Write, link: &str) -> Result<()> {
    let code = share::formula_from_query(link)
        .or_else(|| share::decode_formula(link))
        .context("No shared formula found")?;
    writeln!(out, "{}", code)?;
    Ok(())
}
