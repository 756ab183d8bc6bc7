//! End-to-end tests running the real binaries against temporary
//! directories.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn copies_a_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let dst = dir.path().join("dst.bin");
    let data: Vec<u8> = (0..12 * 1024).map(|i| (i % 253) as u8).collect();
    std::fs::write(&src, &data).unwrap();

    Command::cargo_bin("bcp")
        .unwrap()
        .args([
            src.to_str().unwrap(),
            dst.to_str().unwrap(),
            "--block-size",
            "5KiB",
        ])
        .assert()
        .success();
    assert_eq!(std::fs::read(&dst).unwrap(), data);
}

#[test]
fn copies_multiple_files_into_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    std::fs::write(dir.path().join("a.bin"), b"aaaa").unwrap();
    std::fs::write(dir.path().join("b.bin"), b"bbbbbb").unwrap();

    Command::cargo_bin("bcp")
        .unwrap()
        .args([
            dir.path().join("a.bin").to_str().unwrap(),
            dir.path().join("b.bin").to_str().unwrap(),
            &format!("{}/", out.to_str().unwrap()),
            "--summary",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("objects transferred: 2"));
    assert_eq!(std::fs::read(out.join("a.bin")).unwrap(), b"aaaa");
    assert_eq!(std::fs::read(out.join("b.bin")).unwrap(), b"bbbbbb");
}

#[test]
fn directories_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    std::fs::create_dir(dir.path().join("subdir")).unwrap();
    std::fs::write(dir.path().join("a.bin"), b"aaaa").unwrap();

    Command::cargo_bin("bcp")
        .unwrap()
        .args([
            dir.path().join("subdir").to_str().unwrap(),
            dir.path().join("a.bin").to_str().unwrap(),
            &format!("{}/", out.to_str().unwrap()),
            "--summary",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("objects transferred: 1"));
    assert!(out.join("a.bin").exists());
    assert!(!out.join("subdir").exists());
}

#[test]
fn missing_source_fails_with_a_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("bcp")
        .unwrap()
        .args([
            dir.path().join("missing.bin").to_str().unwrap(),
            dir.path().join("out.bin").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("missing.bin"));
}

#[test]
fn init_writes_a_skeleton_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join(".bcp.toml");
    Command::cargo_bin("bcp")
        .unwrap()
        .args(["--init", "--config", config.to_str().unwrap()])
        .assert()
        .success();
    assert!(config.exists());
    // a second run must not clobber the file
    Command::cargo_bin("bcp")
        .unwrap()
        .args(["--init", "--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("already exists"));
}

#[test]
fn file_alias_resolves_through_the_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    std::fs::create_dir(&root).unwrap();
    let config = dir.path().join(".bcp.toml");
    std::fs::write(
        &config,
        format!(
            "[aliases.scratch]\nprovider = \"file\"\nroot = \"{}\"\n",
            root.to_str().unwrap()
        ),
    )
    .unwrap();
    let src = dir.path().join("src.bin");
    std::fs::write(&src, b"through the alias").unwrap();

    Command::cargo_bin("bcp")
        .unwrap()
        .args([
            src.to_str().unwrap(),
            "//scratch/copied.bin",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(
        std::fs::read(root.join("copied.bin")).unwrap(),
        b"through the alias"
    );
}

#[test]
fn bls_lists_matching_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("x.log"), b"x").unwrap();
    std::fs::write(dir.path().join("y.log"), b"yy").unwrap();
    std::fs::write(dir.path().join("z.txt"), b"zzz").unwrap();

    let pattern = dir.path().join("*.log");
    Command::cargo_bin("bls")
        .unwrap()
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicates::str::contains("x.log"))
        .stdout(predicates::str::contains("y.log"))
        .stdout(predicates::str::contains("z.txt").not());
}

#[test]
fn bls_long_listing_has_a_header_unless_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.bin"), b"abc").unwrap();
    let pattern = dir.path().join("*.bin");

    Command::cargo_bin("bls")
        .unwrap()
        .args(["-l", pattern.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("type"))
        .stdout(predicates::str::contains("FileSystem"));

    Command::cargo_bin("bls")
        .unwrap()
        .args(["-l", "-n", pattern.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicates::str::contains("modified").not());
}
