use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn test_malformed_lines_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":1,"product":"A","quantity":1,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    writeln!(file, "this is not json").unwrap();
    writeln!(file, r#"{{"body":{{}}}}"#).unwrap(); // no httpMethod
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":2,"product":"B","quantity":3,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading request"))
        .stdout(predicate::str::contains("1,A,1,X,Y"))
        .stdout(predicate::str::contains("2,B,3,X,Y"));
}

#[test]
fn test_invalid_data_types() {
    let mut file = NamedTempFile::new().unwrap();
    // Text in quantity
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":1,"product":"A","quantity":"lots","customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    // Non-integer order id
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":"abc","product":"A","quantity":1,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    // Unsupported method
    writeln!(file, r#"{{"httpMethod":"PATCH"}}"#).unwrap();
    // Valid
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":3,"product":"C","quantity":5,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Invalid data type for 'quantity'. Expected number.",
        ))
        .stderr(predicate::str::contains(
            "Invalid data type for 'orderid'. Expected Number.",
        ))
        .stderr(predicate::str::contains("Unsupported HTTP method"))
        .stdout(predicate::str::contains("3,C,5,X,Y"))
        .stdout(predicate::str::contains("1,A").not());
}

#[test]
fn test_missing_input_file_fails() {
    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("does/not/exist.jsonl");
    cmd.assert().failure();
}
