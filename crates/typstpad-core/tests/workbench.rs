mod common;

use bytes::Bytes;
use common::{workbench, workbench_in, FakeRuntime};
use tempfile::TempDir;
use typstpad_core::config::{FontConfig, StorageConfig};
use typstpad_core::fonts::default_bundled_ids;
use typstpad_core::{CompileOptions, FontUpload, PadError, Workbench};

fn font_bytes(seed: u8, len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| seed.wrapping_add(i as u8)).collect::<Vec<u8>>())
}

#[tokio::test]
async fn test_uploaded_font_reaches_next_compile() {
    let runtime = FakeRuntime::new();
    let wb = workbench(&runtime);
    wb.compiler().preload().await.unwrap();
    let generation = wb.compiler().current_generation();

    let custom = font_bytes(7, 10 * 1024);
    let added = wb
        .upload_fonts(vec![FontUpload::new("custom.ttf", custom.clone())])
        .await
        .unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].file_name, "custom.ttf");
    assert_eq!(added[0].family, "Custom Sans");
    assert!(wb.compiler().current_generation() > generation);

    let sources = wb.fonts().font_source_set().await;
    assert_eq!(sources.total_count(), 7);
    assert!(sources.families.contains("Custom Sans"));

    let result = wb
        .compiler()
        .compile("x", CompileOptions::default())
        .await
        .unwrap();
    assert_eq!(result.svg(), Some("<svg data-fonts=\"7\">x</svg>"));
    assert_eq!(runtime.instantiations(), 2);
    assert!(runtime.last_fonts().contains(&custom));
}

#[tokio::test]
async fn test_duplicate_upload_is_a_no_op() {
    let runtime = FakeRuntime::new();
    let wb = workbench(&runtime);
    let data = font_bytes(1, 2048);

    let first = wb
        .upload_fonts(vec![FontUpload::new("a.ttf", data.clone())])
        .await
        .unwrap();
    let generation = wb.compiler().current_generation();

    let second = wb
        .upload_fonts(vec![FontUpload::new("renamed.ttf", data.clone())])
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(wb.fonts().uploaded_fonts().await, first);
    assert_eq!(wb.compiler().current_generation(), generation);
}

#[tokio::test]
async fn test_unreadable_font_gets_sentinel_family() {
    let runtime = FakeRuntime::new();
    let wb = workbench(&runtime);

    let added = wb
        .upload_fonts(vec![
            FontUpload::new("broken.ttf", Bytes::from_static(b"BAD font")),
            FontUpload::new("good.ttf", font_bytes(3, 64)),
        ])
        .await
        .unwrap();

    assert_eq!(added.len(), 2);
    assert_eq!(added[0].family, FontConfig::UNKNOWN_FAMILY);
    assert_eq!(added[0].style, None);
    assert_eq!(added[1].family, "Custom Sans");
}

#[tokio::test]
async fn test_remove_uploaded_font_refreshes() {
    let runtime = FakeRuntime::new();
    let wb = workbench(&runtime);
    let added = wb
        .upload_fonts(vec![FontUpload::new("a.ttf", font_bytes(9, 128))])
        .await
        .unwrap();
    let generation = wb.compiler().current_generation();

    wb.remove_uploaded_font(&added[0].id).await;
    assert!(wb.fonts().uploaded_fonts().await.is_empty());
    assert!(wb.compiler().current_generation() > generation);

    // Unknown ids are ignored.
    wb.remove_uploaded_font("missing").await;
}

#[tokio::test]
async fn test_selection_survives_restart() {
    let dir = TempDir::new().unwrap();
    let runtime = FakeRuntime::new();

    let selected = {
        let wb = workbench_in(&runtime, dir.path());
        wb.apply_bundled_selection(&[
            "DejaVuSansMono.ttf",
            "Bogus.otf",
            "NewCMMath-Book.otf",
            "DejaVuSansMono.ttf",
        ])
        .await
    };
    assert_eq!(selected, vec!["DejaVuSansMono.ttf", "NewCMMath-Book.otf"]);

    let wb = workbench_in(&runtime, dir.path());
    assert_eq!(wb.fonts().installed_bundled_ids().await, selected);

    let sources = wb.fonts().font_source_set().await;
    // Catalog order, not selection order.
    assert_eq!(
        sources.urls,
        vec!["/fonts/NewCMMath-Book.otf", "/fonts/DejaVuSansMono.ttf"]
    );
}

#[tokio::test]
async fn test_uploads_survive_restart() {
    let dir = TempDir::new().unwrap();
    let runtime = FakeRuntime::new();
    let data = font_bytes(5, 4096);

    let added = {
        let wb = workbench_in(&runtime, dir.path());
        wb.upload_fonts(vec![FontUpload::new("custom.ttf", data.clone())])
            .await
            .unwrap()
    };

    let wb = workbench_in(&runtime, dir.path());
    let uploaded = wb.fonts().uploaded_fonts().await;
    assert_eq!(uploaded, added);
    assert_eq!(uploaded[0].data, data);

    let again = wb
        .upload_fonts(vec![FontUpload::new("copy.ttf", data)])
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_corrupt_settings_file_heals() {
    let dir = TempDir::new().unwrap();
    let runtime = FakeRuntime::new();
    let settings_path = dir.path().join(StorageConfig::SETTINGS_FILE_NAME);

    let wb = workbench_in(&runtime, dir.path());
    wb.apply_bundled_selection(&["DejaVuSansMono.ttf"]).await;

    let corrupted = serde_json::json!({
        "typst-fonts-installed-v1": r#"["Gone.otf", "DejaVuSansMono-Bold.ttf", 3]"#,
    });
    std::fs::write(&settings_path, corrupted.to_string()).unwrap();

    assert_eq!(
        wb.fonts().installed_bundled_ids().await,
        vec!["DejaVuSansMono-Bold.ttf"]
    );
    let healed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(
        healed[FontConfig::INSTALLED_STORAGE_KEY],
        r#"["DejaVuSansMono-Bold.ttf"]"#
    );

    std::fs::write(
        &settings_path,
        serde_json::json!({ "typst-fonts-installed-v1": "not json" }).to_string(),
    )
    .unwrap();
    assert_eq!(wb.fonts().installed_bundled_ids().await, default_bundled_ids());
}

#[tokio::test]
async fn test_formulas_share_the_settings_store() {
    let dir = TempDir::new().unwrap();
    let runtime = FakeRuntime::new();

    {
        let wb = workbench_in(&runtime, dir.path());
        wb.formulas().save_draft("x + y");
        wb.formulas().add_formula("", "e^(i pi) + 1 = 0");
    }

    let wb = workbench_in(&runtime, dir.path());
    assert_eq!(wb.formulas().draft(), "x + y");
    let saved = wb.formulas().saved_formulas();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "e^(i pi) + 1 = 0");
}

#[test]
fn test_builder_requires_runtime() {
    let err = Workbench::builder().build().err().unwrap();
    assert!(matches!(err, PadError::InvalidInput { ref field, .. } if field == "runtime"));
}
