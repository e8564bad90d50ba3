//! Tests for the threemf-merge command line tool

mod common;

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use threemf_merge::{Model, ObjectKind};

fn run(args: &[&PathBuf], stdin: &str) -> Output {
    run_bytes(args, stdin.as_bytes())
}

fn run_bytes(args: &[&PathBuf], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_threemf-merge"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin)
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_output_argument_prints_usage() {
    let output = run(&[], "");
    assert_eq!(output.status.code(), Some(1));
    let text = stderr(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("OUTPUT_FILE must not yet exist."));
}

#[test]
fn test_help_exits_cleanly() {
    let output = Command::new(env!("CARGO_BIN_EXE_threemf-merge"))
        .arg("--help")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_merges_files_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let red = common::write_triangle_file(dir.path(), "red[1, 0, 0, 1].3mf");
    let blue = common::write_triangle_file(dir.path(), "blue[0, 0, 1, 1].3mf");
    let out = dir.path().join("merged.3mf");

    let input = format!("{}\r\n{}\n", common::line(&red), common::line(&blue));
    let output = run(&[&out], &input);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stderr(&output).is_empty());

    let model = Model::read_from_file(&out).unwrap();
    let meshes = model
        .objects()
        .filter(|o| o.kind() == ObjectKind::Mesh)
        .count();
    assert_eq!(meshes, 2);
    assert_eq!(model.resources.color_groups.len(), 2);
}

#[test]
fn test_skipped_file_sets_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let good = common::write_triangle_file(dir.path(), "good.3mf");
    let missing = dir.path().join("missing.3mf");
    let out = dir.path().join("merged.3mf");

    let input = format!("{}\n{}\n", common::line(&good), common::line(&missing));
    let output = run(&[&out], &input);
    assert_eq!(output.status.code(), Some(1));

    let text = stderr(&output);
    assert!(text.contains(&format!("Not coloring '{}'", common::line(&good))));
    assert!(text.contains(&format!("Trouble while processing '{}'", common::line(&missing))));
    assert!(text.contains("Will skip this file/color, and proceed anyway."));
    assert!(text.contains("Warning: 1 input files were skipped!"));
    assert!(out.exists(), "the merge is still written");
}

#[test]
fn test_existing_output_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("merged.3mf");
    std::fs::write(&out, b"precious").unwrap();

    let output = run(&[&out], "");
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("[E3003]"));
    assert_eq!(std::fs::read(&out).unwrap(), b"precious");
}

#[test]
fn test_component_objects_are_reported_on_stdout() {
    let dir = tempfile::tempdir().unwrap();

    let mut source = Model::new();
    let mesh = source.add_mesh_object(common::triangle_mesh());
    let assembly = source.add_components_object();
    source
        .add_component(assembly, mesh, threemf_merge::IDENTITY_TRANSFORM)
        .unwrap();
    source
        .add_build_item(assembly, threemf_merge::IDENTITY_TRANSFORM)
        .unwrap();
    let path = dir.path().join("[0, 1, 0, 1]assembly.3mf");
    source.write_to_file(&path).unwrap();

    let out = dir.path().join("merged.3mf");
    let output = run(&[&out], &format!("{}\n", common::line(&path)));
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!(
        "{}: skipping component object #{}",
        common::line(&path),
        assembly
    )));
}

#[test]
fn test_non_utf8_line_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let good = common::write_triangle_file(dir.path(), "good.3mf");
    let out = dir.path().join("merged.3mf");

    let mut input = Vec::new();
    input.extend_from_slice(format!("{}\n", common::line(&good)).as_bytes());
    input.extend_from_slice(b"bad\xff\xfename.3mf\n");
    input.extend_from_slice(format!("{}\n", common::line(&good)).as_bytes());

    let output = run_bytes(&[&out], &input);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let text = stderr(&output);
    assert!(text.contains("Trouble while processing 'bad\u{FFFD}\u{FFFD}name.3mf'"));
    assert!(text.contains("Warning: 1 input files were skipped!"));

    let model = Model::read_from_file(&out).unwrap();
    let meshes = model
        .objects()
        .filter(|o| o.kind() == ObjectKind::Mesh)
        .count();
    assert_eq!(meshes, 2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name_is_opened_by_its_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let written = common::write_triangle_file(dir.path(), "part[0, 0, 1, 1].3mf");
    let mut raw_name = b"part\xff[0, 0, 1, 1].3mf".to_vec();
    let renamed = dir.path().join(OsStr::from_bytes(&raw_name));
    std::fs::rename(&written, &renamed).unwrap();
    let out = dir.path().join("merged.3mf");

    let mut input = dir.path().as_os_str().as_bytes().to_vec();
    input.push(b'/');
    input.append(&mut raw_name);
    input.push(b'\n');

    let output = run_bytes(&[&out], &input);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let model = Model::read_from_file(&out).unwrap();
    assert_eq!(model.resources.color_groups.len(), 1);
}

#[test]
fn test_closed_stdout_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();

    let mut source = Model::new();
    let mesh = source.add_mesh_object(common::triangle_mesh());
    let assembly = source.add_components_object();
    source
        .add_component(assembly, mesh, threemf_merge::IDENTITY_TRANSFORM)
        .unwrap();
    let path = dir.path().join("assembly.3mf");
    source.write_to_file(&path).unwrap();
    let out = dir.path().join("merged.3mf");

    let mut child = Command::new(env!("CARGO_BIN_EXE_threemf-merge"))
        .arg(&out)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // nobody reads what the tool prints about the skipped assembly
    drop(child.stdout.take());
    child
        .stdin
        .take()
        .unwrap()
        .write_all(format!("{}\n", common::line(&path)).as_bytes())
        .unwrap();

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));
    assert!(out.exists());
}
