//! Integration tests for the CLI command implementations.

use embedfs::{Artifact, PackMode};
use embedfs_cli::cli::{ExitCode, OutputFormat};
use embedfs_cli::commands::embed::EmbedArgs;
use embedfs_cli::commands::{assets, cat, embed, scan};
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("site/docs")).unwrap();
    fs::write(temp.path().join("site/docs/readme.md"), b"hello").unwrap();
    fs::write(temp.path().join("site/main.cfg"), b"").unwrap();
    temp
}

/// Embed then cat returns the original bytes
#[test]
fn test_embed_then_cat() {
    let temp = fixture();
    let out = temp.path().join("out/site.json");

    let args = EmbedArgs {
        dir: Some(temp.path().join("site")),
        mode: Some(PackMode::Production),
        out: Some(out.clone()),
        ..EmbedArgs::default()
    };
    let code = embed::run(&args, OutputFormat::Json).unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(out.exists());

    let artifact = Artifact::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(artifact.mode, PackMode::Production);
    assert_eq!(artifact.file_count(), 2);

    assert_eq!(cat::read(&out, "docs/readme.md").unwrap(), b"hello");
    assert!(cat::read(&out, "docs/missing.md").is_err());
    assert_eq!(cat::run(&out, "docs/missing.md").unwrap(), ExitCode::ERROR);
}

/// Mount and config file settings reach the artifact
#[test]
fn test_embed_with_config_and_mount() {
    let temp = fixture();
    let config = temp.path().join("embedfs.toml");
    let out = temp.path().join("site.json");
    fs::write(
        &config,
        format!(
            "input_dir = {:?}\noutput = {:?}\nname = \"web\"\nextensions = [\"md\"]",
            temp.path().join("site"),
            out
        ),
    )
    .unwrap();

    let args = EmbedArgs {
        config: Some(config),
        mount: Some("static".to_string()),
        ..EmbedArgs::default()
    };
    assert_eq!(embed::run(&args, OutputFormat::Pretty).unwrap(), ExitCode::SUCCESS);

    let artifact = Artifact::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(artifact.name, "web");
    assert_eq!(artifact.file_count(), 1);
    assert_eq!(cat::read(&out, "static/docs/readme.md").unwrap(), b"hello");
}

/// A missing input directory exits with an error code, not a panic
#[test]
fn test_embed_missing_dir_exit_code() {
    let temp = TempDir::new().unwrap();
    let args = EmbedArgs {
        dir: Some(temp.path().join("nope")),
        out: Some(temp.path().join("x.json")),
        ..EmbedArgs::default()
    };
    assert_eq!(embed::run(&args, OutputFormat::Json).unwrap(), ExitCode::ERROR);
    assert!(!temp.path().join("x.json").exists());
}

/// Invalid option combinations are rejected before scanning
#[test]
fn test_embed_invalid_workers() {
    let temp = fixture();
    let args = EmbedArgs {
        dir: Some(temp.path().join("site")),
        workers: Some(0),
        out: Some(temp.path().join("x.json")),
        ..EmbedArgs::default()
    };
    assert_eq!(
        embed::run(&args, OutputFormat::Json).unwrap(),
        ExitCode::INVALID_INPUT
    );
}

/// A config file that fails validation exits with the invalid-input code
#[test]
fn test_embed_invalid_config_file() {
    let temp = fixture();
    let config = temp.path().join("embedfs.toml");
    fs::write(
        &config,
        format!("input_dir = {:?}\nmax_workers = 0", temp.path().join("site")),
    )
    .unwrap();

    let args = EmbedArgs {
        config: Some(config),
        out: Some(temp.path().join("x.json")),
        ..EmbedArgs::default()
    };
    assert_eq!(
        embed::run(&args, OutputFormat::Json).unwrap(),
        ExitCode::INVALID_INPUT
    );
    assert!(!temp.path().join("x.json").exists());
}

#[test]
fn test_scan_and_assets_exit_codes() {
    let temp = fixture();
    let site = temp.path().join("site");

    assert_eq!(
        scan::run(site.clone(), Vec::new(), Some(2), OutputFormat::Json).unwrap(),
        ExitCode::SUCCESS
    );
    assert_eq!(
        scan::run(temp.path().join("nope"), Vec::new(), None, OutputFormat::Pretty).unwrap(),
        ExitCode::ERROR
    );
    assert_eq!(
        assets::run(site, vec!["md".to_string()], Vec::new(), OutputFormat::Pretty).unwrap(),
        ExitCode::SUCCESS
    );
}
