#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: create an order
    let mut run1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(run1, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":1,"product":"A","quantity":100,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd1 = Command::new(cargo_bin!("orderflow"));
    cmd1.arg(run1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,A,100,X,Y"));

    // 2. Second run: the existence check sees the persisted order
    let mut run2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(run2, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":1,"product":"B","quantity":1,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    writeln!(run2, r#"{{"httpMethod":"PUT","body":{{"message":{{"orderid":1,"product":"A","quantity":150,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd2 = Command::new(cargo_bin!("orderflow"));
    cmd2.arg(run2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    let stderr2 = String::from_utf8_lossy(&output2.stderr);

    assert!(stderr2.contains("found in the database"));
    assert!(stdout2.contains("1,A,150,X,Y"));
}
