#![allow(dead_code)]

use bish::codegen::{self, CodegenOptions};
use bish::error::CompileError;
use bish::lexer;
use bish::lower::{self, LowerOptions};
use bish::parser;
use bish::span::{Diagnostic, SourceMap};
use std::fs;
use std::path::Path;
use std::process::Command;

const INLINE_FILE: &str = "inline_test";

#[derive(Debug)]
pub enum TestError {
    Source(Diagnostic),
    Codegen(CompileError),
}

pub fn try_compile_with(src: &str, compile_as_library: bool) -> Result<String, TestError> {
    let sm = SourceMap::new(src.to_string());
    let tokens = lexer::lex(&sm, INLINE_FILE).map_err(TestError::Source)?;
    let mut program = parser::parse(&tokens, &sm, INLINE_FILE).map_err(TestError::Source)?;
    program.source_maps.insert(INLINE_FILE.to_string(), sm);
    program.entry_file = INLINE_FILE.to_string();

    let ir = lower::lower_with_options(&program, &LowerOptions { compile_as_library }).map_err(TestError::Source)?;
    codegen::emit_with_options(
        &ir,
        CodegenOptions {
            compile_as_library,
            ..CodegenOptions::default()
        },
    )
    .map_err(TestError::Codegen)
}

pub fn try_compile(src: &str) -> Result<String, TestError> {
    try_compile_with(src, false)
}

pub fn compile_to_bash(src: &str) -> String {
    try_compile(src).expect("compilation failed")
}

pub fn compile_error(src: &str) -> Diagnostic {
    match try_compile(src) {
        Err(TestError::Source(d)) => d,
        other => panic!("expected a source diagnostic, got {:?}", other),
    }
}

pub fn assert_codegen_matches_snapshot(fixture_name: &str) {
    let src_path = format!("tests/fixtures/{}.bish", fixture_name);
    let expected_path = format!("tests/fixtures/{}.sh.expected", fixture_name);

    let src = fs::read_to_string(&src_path).expect("Failed to read source fixture");
    let expected = fs::read_to_string(&expected_path).expect("Failed to read expected codegen fixture");

    let output = compile_to_bash(&src);
    assert_eq!(output.trim(), expected.trim(), "Codegen mismatch for {}", fixture_name);
}

/// Runs `bash script.sh` in a fresh directory. Returns (stdout, stderr, status).
pub fn run_bash_script(bash: &str, env: &[(&str, &str)], args: &[&str]) -> (String, String, i32) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script_path = temp_dir.path().join("script.sh");
    fs::write(&script_path, bash).expect("Failed to write temp script");

    let mut cmd = Command::new("bash");
    cmd.current_dir(temp_dir.path());
    for (k, v) in env {
        cmd.env(k, v);
    }
    cmd.arg(&script_path);
    for arg in args {
        cmd.arg(arg);
    }

    let output = cmd.output().expect("Failed to execute bash");
    let stdout = String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n");
    let stderr = String::from_utf8_lossy(&output.stderr).replace("\r\n", "\n");

    (stdout, stderr, output.status.code().unwrap_or(0))
}

pub fn compile_and_run(src: &str) -> (String, String, i32) {
    let bash = compile_to_bash(src);
    run_bash_script(&bash, &[], &[])
}

/// Compiles and runs, asserting a clean exit; returns stdout.
pub fn run_ok(src: &str) -> String {
    let bash = compile_to_bash(src);
    let (stdout, stderr, code) = run_bash_script(&bash, &[], &[]);
    assert_eq!(code, 0, "script failed\n--- script ---\n{}\n--- stderr ---\n{}", bash, stderr);
    stdout
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}
