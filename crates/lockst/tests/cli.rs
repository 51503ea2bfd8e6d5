//! Whole-program scenarios driven through the built `lockst` binary on
//! both back-ends.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn source_file(src: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".lk").unwrap();
    write!(file, "{src}").unwrap();
    file
}

fn assert_runs_to(src: &str, expected_stdout: &str) {
    for vm in [false, true] {
        let file = source_file(src);
        let mut cmd = Command::cargo_bin("lockst").unwrap();
        cmd.arg("run").arg(file.path());
        if vm {
            cmd.arg("--vm");
        }
        cmd.assert().success().stdout(predicate::str::diff(expected_stdout.to_string()));
    }
}

#[test]
fn arithmetic_precedence() {
    assert_runs_to("println(1+2*3);", "7\n");
}

#[test]
fn string_concatenation() {
    assert_runs_to("var s = \"ab\" + \"c\"; println(s);", "abc\n");
}

#[test]
fn recursive_factorial() {
    assert_runs_to(
        "fun fact(n){ if (n<=1) { return 1; } return n*fact(n-1); } println(fact(5));",
        "120\n",
    );
}

#[test]
fn array_index_assignment() {
    assert_runs_to("var a = [10,20,30]; a[1] = 99; println(a[0]+a[1]+a[2]);", "129\n");
}

#[test]
fn continue_skips_to_next_iteration() {
    assert_runs_to(
        "var i = 0; while (i<3) { if (i==1) { i = i+1; continue; } println(i); i = i+1; }",
        "0\n2\n",
    );
}

#[test]
fn division_by_zero_exits_nonzero_with_diagnostic() {
    for vm in [false, true] {
        let file = source_file("println(1/0);");
        let mut cmd = Command::cargo_bin("lockst").unwrap();
        cmd.arg("run").arg(file.path());
        if vm {
            cmd.arg("--vm");
        }
        cmd.assert().failure().code(255).stderr(predicate::str::contains("ZeroDivErr"));
    }
}

#[test]
fn missing_source_file_exits_one() {
    let mut cmd = Command::cargo_bin("lockst").unwrap();
    cmd.arg("run").arg("/no/such/file.lk");
    cmd.assert().failure().code(1);
}

#[test]
fn build_then_disasm_round_trips_through_the_binary() {
    let file = source_file("println(1+2*3);");
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("out.lockb");

    Command::cargo_bin("lockst")
        .unwrap()
        .arg("build")
        .arg(file.path())
        .arg("-o")
        .arg(&image)
        .assert()
        .success();

    Command::cargo_bin("lockst")
        .unwrap()
        .arg("disasm")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("LOAD_CONST").or(predicate::str::contains("BIPUSH")));
}
