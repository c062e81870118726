mod common;

use common::{connected_engine, keys, MemoryService};
use eyre::Result;
use ftree_core::{InvalidReason, TreeError};
use tempfile::tempdir;

#[test]
fn nested_roots_are_removed_once_children_first() -> Result<()> {
    let tmp = tempdir()?;
    let service = MemoryService::new().with_dir("/a/b").with_dir("/keep");
    let mut engine = connected_engine(&service, tmp.path());

    let report = engine.delete(&["/a", "/a/b"])?;

    assert_eq!(keys(report.succeeded_keys()), vec!["/a/b", "/a"]);
    assert!(report.is_complete_success());
    assert!(!service.exists("/a"));
    assert!(service.exists("/keep"));
    Ok(())
}

#[test]
fn leaves_are_recorded_before_their_parent() -> Result<()> {
    let tmp = tempdir()?;
    let service = MemoryService::new()
        .with_file("/site/index.html", b"x")
        .with_file("/site/css/main.css", b"y")
        .with_file("/site/css/print.css", b"z")
        .with_dir("/site/empty");
    let mut engine = connected_engine(&service, tmp.path());

    let report = engine.delete(&["site"])?;
    let order = keys(report.succeeded_keys());

    let position = |key: &str| order.iter().position(|k| k == key).expect("recorded");
    assert!(position("/site/css/main.css") < position("/site/css"));
    assert!(position("/site/css/print.css") < position("/site/css"));
    assert!(position("/site/css") < position("/site"));
    assert!(position("/site/empty") < position("/site"));
    assert_eq!(order.len(), 6);
    assert!(service.paths_under("/").is_empty());
    Ok(())
}

#[test]
fn refused_child_fails_its_ancestors_only() -> Result<()> {
    let tmp = tempdir()?;
    let service = MemoryService::new()
        .with_file("/data/locked/secret.bin", b"s")
        .with_file("/data/locked/other.bin", b"o")
        .with_file("/data/free.txt", b"f");
    service.refuse("/data/locked/secret.bin");
    let mut engine = connected_engine(&service, tmp.path());

    let report = engine.delete(&["/data"])?;

    assert_eq!(
        keys(report.failed_keys()),
        vec!["/data/locked/secret.bin", "/data/locked", "/data"]
    );
    assert_eq!(
        keys(report.succeeded_keys()),
        vec!["/data/free.txt", "/data/locked/other.bin"]
    );
    assert!(matches!(
        report.failed()[0].1.error,
        TreeError::Delete { .. }
    ));
    Ok(())
}

#[test]
fn succeeded_directory_implies_succeeded_descendants() -> Result<()> {
    let tmp = tempdir()?;
    let service = MemoryService::new()
        .with_file("/t/x/1", b"1")
        .with_file("/t/x/2", b"2")
        .with_file("/t/y/3", b"3")
        .with_file("/t/y/z/4", b"4");
    service.refuse("/t/y/z/4");
    let mut engine = connected_engine(&service, tmp.path());

    let report = engine.delete(&["/t"])?;
    let succeeded = keys(report.succeeded_keys());
    let failed = keys(report.failed_keys());

    for dir in succeeded.iter() {
        let prefix = format!("{}/", dir);
        assert!(
            !failed.iter().any(|f| f.starts_with(&prefix)),
            "{} succeeded with a failed descendant",
            dir
        );
    }
    assert!(succeeded.contains(&"/t/x".to_string()));
    assert!(failed.contains(&"/t/y".to_string()));
    assert_eq!(report.len(), 8);
    Ok(())
}

#[test]
fn root_and_missing_targets_abort_before_mutation() -> Result<()> {
    let tmp = tempdir()?;
    let service = MemoryService::new().with_file("/a.txt", b"a");
    let mut engine = connected_engine(&service, tmp.path());
    engine.change_working_directory("/")?;

    let err = engine.delete(&["/a.txt", ".."]).unwrap_err();
    assert!(matches!(
        err,
        TreeError::InvalidOperation(InvalidReason::RootDeletion)
    ));

    let err = engine.delete(&["/a.txt", "/missing"]).unwrap_err();
    assert!(matches!(err, TreeError::NotFound { ref path } if path == "/missing"));
    assert!(err.is_preflight());

    assert_eq!(service.mutations(), 0);
    assert!(service.exists("/a.txt"));
    Ok(())
}
