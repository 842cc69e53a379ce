//! Integration tests for the scan → embed → load workflow.

use embedfs::{Artifact, Embedder, PackMode, PathPolicy, TreeBuilder, pack};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `docs/readme.md` + empty `main.cfg`, embedded in production mode
#[test]
fn test_production_embed_and_load() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "docs/readme.md", b"hello");
    write(temp.path(), "main.cfg", b"");

    let tree = TreeBuilder::new(PathPolicy::new()).build(temp.path()).unwrap();
    let report = Embedder::new(PackMode::Production).embed_tree(&tree);
    assert!(report.is_complete());

    let paths: Vec<_> = report
        .artifact
        .directories
        .iter()
        .map(|d| d.logical_path.as_str())
        .collect();
    assert_eq!(paths, vec![".", "docs"]);

    let readme = &report.artifact.directory("docs").unwrap().files[0];
    let payload = readme.payload.as_ref().unwrap();
    assert_eq!(readme.declared_size, payload.len() as u64);
    assert!(readme.decompress);

    let json = report.artifact.to_json().unwrap();
    let vfs = Artifact::from_json(&json).unwrap().to_vfs();

    let file = vfs.get_file("docs/readme.md").unwrap();
    assert_eq!(file.size(), readme.declared_size);
    assert_eq!(&*file.data().unwrap(), b"hello");
    assert_eq!(file.size(), 5);

    let cfg = vfs.get_file("/main.cfg").unwrap();
    assert!(cfg.data().unwrap().is_empty());
}

/// Production payloads without decompression are served as gzip
#[test]
fn test_no_decompress_serves_compressed() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.txt", b"raw text");

    let tree = TreeBuilder::new(PathPolicy::new()).build(temp.path()).unwrap();
    let report = Embedder::new(PackMode::ProductionNoDecompress).embed_tree(&tree);
    let vfs = report.artifact.to_vfs();

    let served = vfs.get_file("a.txt").unwrap().data().unwrap();
    assert_eq!(pack::decompress(&served).unwrap(), b"raw text");
}

/// Two physical directories muxed onto one logical path share one node
#[test]
fn test_merging_mux_keeps_one_node_per_path() {
    let temp = TempDir::new().unwrap();
    for side in ["left", "right"] {
        for i in 0..20 {
            write(temp.path(), &format!("{side}/sub/{side}_{i}.txt"), side.as_bytes());
        }
        write(temp.path(), &format!("{side}/{side}.txt"), b"top");
    }

    let merge = |relative: &str, _: &fs::Metadata| {
        relative
            .strip_prefix("left")
            .or_else(|| relative.strip_prefix("right"))
            .map_or_else(|| relative.to_string(), |rest| format!("merged{rest}"))
    };

    for _ in 0..10 {
        let tree = TreeBuilder::new(PathPolicy::new().with_mux(merge))
            .with_max_workers(8)
            .build(temp.path())
            .unwrap();

        let paths: Vec<_> = tree
            .directories()
            .iter()
            .map(|d| d.logical_path().to_string())
            .collect();
        assert_eq!(paths, vec![".", "merged", "merged/sub"]);
        assert_eq!(tree.root().children().len(), 1);

        let merged = tree.dir("merged").unwrap();
        assert_eq!(merged.children().len(), 1);
        assert_eq!(merged.file_count(), 2);
        assert_eq!(tree.dir("merged/sub").unwrap().file_count(), 40);
    }
}

/// Independent runs over the same input produce identical artifacts
#[test]
fn test_embed_is_deterministic() {
    let temp = TempDir::new().unwrap();
    for d in 0..12 {
        for f in 0..6 {
            write(temp.path(), &format!("d{d}/n{}/f{f}.txt", d % 3), format!("{d}:{f}").as_bytes());
        }
    }

    let run = || {
        let tree = TreeBuilder::new(PathPolicy::new())
            .with_max_workers(6)
            .build(temp.path())
            .unwrap();
        Embedder::new(PackMode::Production)
            .embed_tree(&tree)
            .artifact
            .to_json()
            .unwrap()
    };

    let first = run();
    for _ in 0..3 {
        assert_eq!(run(), first);
    }
}

/// A file that disappears between scan and embed is skipped, not fatal
#[test]
fn test_partial_pack_failure() {
    let temp = TempDir::new().unwrap();
    for i in 0..5 {
        write(temp.path(), &format!("files/f{i}.txt"), b"data");
    }

    let tree = TreeBuilder::new(PathPolicy::new()).build(temp.path()).unwrap();
    assert_eq!(tree.file_count(), 5);
    fs::remove_file(temp.path().join("files/f2.txt")).unwrap();

    let report = Embedder::new(PackMode::Production).embed_tree(&tree);
    assert_eq!(report.artifact.file_count(), 4);
    assert_eq!(report.failure_count(), 1);
    assert!(report.failures[0].is_pack_failure());

    let vfs = report.artifact.to_vfs();
    assert!(vfs.get_file("files/f2.txt").unwrap_err().is_not_found());
    assert!(vfs.get_file("files/f3.txt").is_ok());
}

/// Payload bytes that need escaping survive the artifact round trip
#[test]
fn test_escaping_survives_artifact() {
    let temp = TempDir::new().unwrap();
    let tricky: &[u8] = b"\xEF\xBB\xBFquote \" backslash \\ backtick ` nul \x00 end\r\n";
    write(temp.path(), "tricky.txt", tricky);

    let tree = TreeBuilder::new(PathPolicy::new()).build(temp.path()).unwrap();
    let json = Embedder::new(PackMode::Development)
        .embed_tree(&tree)
        .artifact
        .to_json()
        .unwrap();
    assert!(json.contains(r"\\xEF\\xBB\\xBF"));

    let vfs = Artifact::from_json(&json).unwrap().to_vfs();
    assert_eq!(&*vfs.get_file("tricky.txt").unwrap().data().unwrap(), tricky);
}

/// Mounted trees answer under the mount prefix
#[test]
fn test_mounted_tree_lookup() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "css/site.css", b"body{}");

    let tree = TreeBuilder::new(PathPolicy::new().with_mount("static"))
        .build(temp.path())
        .unwrap();
    let vfs = Embedder::new(PackMode::Development).embed_tree(&tree).artifact.to_vfs();

    let file = vfs.get_file("static/css/site.css").unwrap();
    assert_eq!(&*file.data().unwrap(), b"body{}");
    assert!(file.real_path().ends_with("css/site.css"));
    assert!(file.real_path().is_file());
}

/// A directory that cannot be listed fails the whole build
#[cfg(unix)]
#[test]
fn test_unreadable_directory_fails_build() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    write(temp.path(), "open/a.txt", b"a");
    write(temp.path(), "locked/b.txt", b"b");
    let locked = temp.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // root ignores permission bits
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = TreeBuilder::new(PathPolicy::new()).build(temp.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(result.unwrap_err().is_scan_failure());
}
