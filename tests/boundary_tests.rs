use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn test_boundary_numerical_values() {
    let mut file = NamedTempFile::new().unwrap();
    // i64::MAX = 9223372036854775807
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":9223372036854775807,"product":"A","quantity":1000000,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":-1,"product":"B","quantity":0,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    // One past i64::MAX is not a valid identifier
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":9223372036854775808,"product":"C","quantity":1,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("9223372036854775807,A,1000000,X,Y"))
        .stdout(predicate::str::contains("-1,B,0,X,Y"))
        .stdout(predicate::str::contains(",C,").not())
        .stderr(predicate::str::contains("'orderid'"));
}

#[test]
fn test_fractional_quantity_precision() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":1,"product":"A","quantity":0.0001,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();
    writeln!(file, r#"{{"httpMethod":"POST","body":{{"message":{{"orderid":2,"product":"B","quantity":2.50,"customerName":"X","shippingAddress":"Y"}}}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,A,0.0001,X,Y"))
        .stdout(predicate::str::contains("2,B,2.5,X,Y"));
}
