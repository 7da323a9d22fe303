mod common;
use bish::driver::{compile_file, CompileOptions, DriverError, Mode};
use bish::loader;
use common::*;

fn compile(path: &std::path::Path) -> Result<String, DriverError> {
    compile_file(path, CompileOptions::default())
}

#[test]
fn import_resolves_relative_to_importer() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "util.bish", "base = 20;\ndef double(x) {\n    return x * 2;\n}\n");
    let entry = write_file(dir.path(), "main.bish", "import util;\nr = double(base);\n@(echo $r);\n");

    let bash = compile(&entry).unwrap();
    let (stdout, stderr, code) = run_bash_script(&bash, &[], &[]);
    assert_eq!(code, 0, "{}", stderr);
    assert_eq!(stdout, "40\n");
}

#[test]
fn nested_imports_resolve_from_their_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lib/strings.bish", "def wrap(s) {\n    return \"<$s>\";\n}\n");
    write_file(dir.path(), "lib/fmt.bish", "import strings;\ndef show(s) {\n    return wrap(s);\n}\n");
    let entry = write_file(dir.path(), "app.bish", "import \"lib/fmt\";\nv = show(\"x\");\n@(echo $v);\n");

    let bash = compile(&entry).unwrap();
    let (stdout, _, code) = run_bash_script(&bash, &[], &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "<x>\n");
}

#[test]
fn shared_import_is_loaded_once() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "common.bish", "def id(x) {\n    return x;\n}\n");
    write_file(dir.path(), "a.bish", "import common;\ndef fa() {\n    return id(1);\n}\n");
    write_file(dir.path(), "b.bish", "import common;\ndef fb() {\n    return id(2);\n}\n");
    let entry = write_file(dir.path(), "main.bish", "import a;\nimport b;\nimport common;\n@(echo hi);\n");

    let bash = compile(&entry).unwrap();
    assert_eq!(bash.matches("function id ()").count(), 1, "{}", bash);

    let program = loader::load(&entry).unwrap();
    let names: Vec<&str> = program.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["id", "fa", "fb"]);
}

#[test]
fn import_cycle_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.bish", "import b;\ndef fa() {\n    return 1;\n}\n");
    write_file(dir.path(), "b.bish", "import a;\ndef fb() {\n    return 2;\n}\n");
    let entry = dir.path().join("a.bish");

    let err = compile(&entry).unwrap_err();
    assert_eq!(err.code, 2);
    assert!(err.msg.contains("Import cycle detected"), "{}", err.msg);
    assert!(err.msg.contains("a.bish -> "), "{}", err.msg);
}

#[test]
fn missing_module_points_at_import() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_file(dir.path(), "main.bish", "x = 1;\nimport nowhere;\n");

    let err = compile(&entry).unwrap_err();
    assert_eq!(err.code, 2);
    assert!(err.msg.contains("main.bish:2:1"), "{}", err.msg);
    assert!(err.msg.contains("cannot find module 'nowhere'"), "{}", err.msg);
    assert!(err.msg.contains("help: looked for"), "{}", err.msg);
}

#[test]
fn imported_file_may_not_run_statements() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "noisy.bish", "@(echo side effect);\n");
    let entry = write_file(dir.path(), "main.bish", "import noisy;\n@(echo hi);\n");

    let err = compile(&entry).unwrap_err();
    assert!(err.msg.contains("noisy.bish:1:1"), "{}", err.msg);
    assert!(
        err.msg.contains("only assignments and imports are allowed"),
        "{}",
        err.msg
    );
}

#[test]
fn function_defined_in_two_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "util.bish", "def helper() {\n    return 1;\n}\n");
    let entry = write_file(dir.path(), "main.bish", "import util;\ndef helper() {\n    return 2;\n}\n");

    let err = compile(&entry).unwrap_err();
    assert_eq!(err.code, 2);
    assert!(err.msg.contains("Function 'helper' is already defined in"), "{}", err.msg);
    assert!(err.msg.contains("util.bish"), "{}", err.msg);
}

#[test]
fn import_inside_function_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "util.bish", "x = 1;\n");
    let entry = write_file(dir.path(), "main.bish", "def f() {\n    import util;\n}\n");

    let err = compile(&entry).unwrap_err();
    assert!(err.msg.contains("import is only allowed at the top level"), "{}", err.msg);
}

#[test]
fn imported_globals_precede_entry_statements() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "conf.bish", "level = 3;\n");
    let entry = write_file(dir.path(), "main.bish", "import conf;\n@(echo level=$level);\n");

    let opts = CompileOptions {
        mode: Mode::EmitIr,
        ..CompileOptions::default()
    };
    let ir = compile_file(&entry, opts).unwrap();
    assert!(ir.contains("globals: ["), "{}", ir);
    assert!(ir.contains("\"level\""), "{}", ir);

    let bash = compile(&entry).unwrap();
    let (stdout, _, _) = run_bash_script(&bash, &[], &[]);
    assert_eq!(stdout, "level=3\n");
}

#[test]
fn resolve_import_adds_extension() {
    let p = loader::resolve_import(std::path::Path::new("/src/app/main.bish"), "lib/util");
    assert_eq!(p, std::path::Path::new("/src/app/lib/util.bish"));
}
