use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const TOKEN: &str = r#"
pragma solidity ^0.8.0;

import "./Base.sol";

contract Token is Base {
    function approve(address spender, uint256 amount) public returns (bool) {
        _approve(msg.sender, spender, amount);
        return true;
    }

    function _approve(address owner, address spender, uint256 amount) internal {
        _check(owner);
    }
}
"#;

const BASE: &str = r#"
pragma solidity ^0.8.0;

contract Base {
    function _check(address who) internal view {}
}
"#;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sol2fg"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run sol2fg")
}

fn write_sources(dir: &Path) {
    fs::write(dir.join("Token.sol"), TOKEN).unwrap();
    fs::write(dir.join("Base.sol"), BASE).unwrap();
}

#[test]
fn test_dot_to_stdout_follows_imports() {
    let dir = tempdir().unwrap();
    write_sources(dir.path());

    let output = run(dir.path(), &["Token.sol", "Token", "approve", "2"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let dot = String::from_utf8(output.stdout).unwrap();
    assert!(dot.starts_with("digraph \"function_graph\" {"));
    assert!(dot.contains("\"Token:approve:2\" -> \"Token:_approve:3\";"));
    assert!(dot.contains("\"Token:_approve:3\" -> \"Base:_check:1\" [color=\"black\"];"));
}

#[test]
fn test_json_to_file_with_ignore() {
    let dir = tempdir().unwrap();
    write_sources(dir.path());

    let output = run(
        dir.path(),
        &[
            "Token.sol",
            "Token",
            "approve",
            "--ignore",
            "Token:_approve:3",
            "--format",
            "json",
            "-o",
            "graph.json",
            "--config",
            "pretty=false",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let json = fs::read_to_string(dir.path().join("graph.json")).unwrap();
    assert!(json.contains("\"id\":\"Token:_approve:3\""));
    assert!(json.contains("\"ignored\":true"));
    assert!(!json.contains("Base:_check:1"));
}

#[test]
fn test_fatal_errors_exit_non_zero() {
    let dir = tempdir().unwrap();
    write_sources(dir.path());

    let missing = run(dir.path(), &["Nope.sol"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("Couldn't find file"));

    let unknown = run(dir.path(), &["Token.sol", "Vault", "approve"]);
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("Couldn't find contract Vault"));

    let arity = run(dir.path(), &["Token.sol", "Token", "approve", "5"]);
    assert!(!arity.status.success());

    let bad_ignore = run(dir.path(), &["Token.sol", "Token", "approve", "--ignore", "Token:x"]);
    assert!(!bad_ignore.status.success());
}
