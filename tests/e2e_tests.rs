use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn qrstudio() -> Command {
    let mut cmd = Command::cargo_bin("qrstudio").unwrap();
    // Keep the child isolated from any local configuration.
    cmd.env_remove("QR_EXPORT_DIR");
    cmd
}

fn exported_pngs(dir: &TempDir) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "png").unwrap_or(false))
        .collect()
}

#[test]
fn test_help_lists_options() {
    qrstudio()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--text"))
        .stdout(predicate::str::contains("--color"))
        .stdout(predicate::str::contains("--logo"));
}

#[test]
fn test_one_shot_writes_png() {
    let out = TempDir::new().unwrap();

    qrstudio()
        .current_dir(out.path())
        .args(["--text", "https://example.com", "--output-dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("qr-code-"));

    let files = exported_pngs(&out);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("qr-code-") && name.ends_with(".png"));

    let image = image::open(&files[0]).unwrap();
    assert_eq!((image.width(), image.height()), (1024, 1024));
}

#[test]
fn test_one_shot_with_logo_and_size() {
    let out = TempDir::new().unwrap();
    let logo = out.path().join("logo.png");
    RgbaImage::from_pixel(8, 8, Rgba([0, 128, 255, 255])).save(&logo).unwrap();

    qrstudio()
        .current_dir(out.path())
        .args(["--text", "hello", "--color", "red", "--size", "512", "--logo"])
        .arg(&logo)
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();

    let files: Vec<_> = exported_pngs(&out)
        .into_iter()
        .filter(|p| p != &logo)
        .collect();
    assert_eq!(files.len(), 1);

    let image = image::open(&files[0]).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (512, 512));
    assert_eq!(*image.get_pixel(256, 256), Rgba([0, 128, 255, 255]));
}

#[test]
fn test_one_shot_rejects_blank_text() {
    let out = TempDir::new().unwrap();

    qrstudio()
        .current_dir(out.path())
        .args(["--text", "   ", "--output-dir"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("text is empty"));

    assert!(exported_pngs(&out).is_empty());
}

#[test]
fn test_interactive_session_reports_unknown_commands() {
    let out = TempDir::new().unwrap();

    qrstudio()
        .current_dir(out.path())
        .args(["--no-preview", "--output-dir"])
        .arg(out.path())
        .env("QRSTUDIO__RENDER__DEBOUNCE_MS", "10")
        .write_stdin(":color blue\n:bogus\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown command ':bogus'"));
}

#[test]
fn test_generate_config() {
    let out = TempDir::new().unwrap();

    qrstudio()
        .current_dir(out.path())
        .arg("--generate-config")
        .assert()
        .success();

    let content = fs::read_to_string(out.path().join("qrstudio.example.toml")).unwrap();
    assert!(content.contains("[render]"));
    assert!(content.contains("size = 1024"));
}
