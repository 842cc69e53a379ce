//! Integration tests for lookups on a live (disk-backed) virtual filesystem.

use embedfs::{AssetFilter, AssetMap, EmbedConfig, PathPolicy, TreeBuilder, VirtualFs};
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn live_vfs(temp: &TempDir) -> VirtualFs {
    TreeBuilder::new(PathPolicy::new().skip_vcs())
        .build(temp.path())
        .unwrap()
        .to_vfs()
}

#[test]
fn test_nested_lookup_and_not_found() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/b/c.txt", b"c");
    let vfs = live_vfs(&temp);
    let root = vfs.root().unwrap();

    assert_eq!(&*root.get_file("a/b/c.txt").unwrap().data().unwrap(), b"c");
    assert_eq!(root.get_dir("/a/b/").unwrap().path(), "a/b");

    let err = root.get_dir("a/x").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("a/x"));
}

#[test]
fn test_root_forms_resolve_to_root() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "x.txt", b"x");
    let vfs = live_vfs(&temp);

    for requested in ["", ".", "/"] {
        let dir = vfs.get_dir(requested).unwrap();
        assert!(dir.is_root());
        assert!(dir.file("x.txt").is_some());
    }
}

#[test]
fn test_live_reads_follow_disk() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "live.txt", b"one");
    let vfs = live_vfs(&temp);
    let file = vfs.get_file("live.txt").unwrap();

    assert_eq!(&*file.data().unwrap(), b"one");
    fs::write(temp.path().join("live.txt"), b"two!").unwrap();
    assert_eq!(&*file.data().unwrap(), b"two!");
    assert_eq!(file.size(), 4);

    fs::remove_file(temp.path().join("live.txt")).unwrap();
    assert!(file.data().unwrap_err().is_read_failure());
}

#[test]
fn test_every_file_walks_whole_tree() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.txt", b"");
    write(temp.path(), "d1/b.txt", b"");
    write(temp.path(), "d1/d2/c.txt", b"");
    write(temp.path(), ".git/HEAD", b"");
    let vfs = live_vfs(&temp);

    let mut seen = Vec::new();
    vfs.root()
        .unwrap()
        .every_file(|file| {
            seen.push(file.path());
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(seen, vec!["a.txt", "d1/b.txt", "d1/d2/c.txt"]);
}

#[test]
fn test_config_policy_drives_scan() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "web/index.html", b"<html/>");
    write(temp.path(), "web/app.js", b"js");
    write(temp.path(), "node_modules/dep/index.html", b"dep");

    let config = EmbedConfig::from_toml_str(
        "extensions = [\"html\"]\nskip = [\"node_modules\"]\nmount = \"site\"",
    )
    .unwrap();
    let vfs = TreeBuilder::new(config.policy())
        .build(temp.path())
        .unwrap()
        .to_vfs();

    assert!(vfs.get_file("site/web/index.html").is_ok());
    assert!(vfs.get_file("site/web/app.js").unwrap_err().is_not_found());
    assert!(vfs.get_dir("site/node_modules").unwrap_err().is_not_found());
}

#[test]
fn test_asset_map_alongside_tree() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "tpl/page.html", b"page");
    write(temp.path(), "tpl/part.txt", b"part");

    let mut assets =
        AssetMap::scan(temp.path(), AssetFilter::new().with_extensions(["html"])).unwrap();
    assert_eq!(assets.load("tpl/page.html").unwrap(), b"page");
    assert!(!assets.has("tpl/part.txt"));

    write(temp.path(), "tpl/new.html", b"new");
    assert_eq!(assets.reload().unwrap(), 1);
    assert_eq!(assets.len(), 2);
}
