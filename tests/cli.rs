use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn create_site(root: &Path) {
    write_file(
        &root.join("css/site.css"),
        ".nav{display:flex}\n.nav .item{margin:0}\n#main{padding:1em}\n.js-hook{}\n",
    );
    write_file(
        &root.join("css/vendor/lib.css"),
        ".vendor-only{color:red}\n",
    );
    write_file(
        &root.join("views/index.html"),
        "<ul class=\"nav js-hook\"><li class=\"item extra\"></li></ul>\n<main id=\"main\"></main>\n",
    );
    write_file(
        &root.join("js/app.js"),
        "document.querySelector('.nav .item');\ndocument.getElementById('main');\n",
    );
    write_file(&root.join("js/.hidden.js"), "x('nav');\n");
}

fn ruminate(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ruminate"))
        .args(args)
        .output()
        .unwrap()
}

fn source_args(root: &Path) -> Vec<String> {
    vec![
        "--css".to_string(),
        root.join("css").display().to_string(),
        "--html".to_string(),
        root.join("views").display().to_string(),
        "--js".to_string(),
        root.join("js").display().to_string(),
    ]
}

#[test]
fn cli_run_rewrites_in_place_and_reports_json() {
    let dir = tempdir().unwrap();
    create_site(dir.path());

    let mut args = vec!["run".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--ignore", ".js-hook", "--exclude", "vendor/*", "--json"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(v["maps"]["classes"]["nav"], "a");
    assert_eq!(v["maps"]["classes"]["item"], "b");
    assert_eq!(v["maps"]["ids"]["main"], "c");
    assert!(v["maps"]["classes"].get("js-hook").is_none());
    assert!(v["maps"]["classes"].get("vendor-only").is_none());

    let unlinked: Vec<&str> = v["unlinked"]["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(unlinked, ["extra"]);

    assert_eq!(
        fs::read_to_string(dir.path().join("css/site.css")).unwrap(),
        ".a{display:flex}\n.a .b{margin:0}\n#c{padding:1em}\n.js-hook{}\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("views/index.html")).unwrap(),
        "<ul class=\"a js-hook\"><li class=\"b extra\"></li></ul>\n<main id=\"c\"></main>\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("js/app.js")).unwrap(),
        "document.querySelector('.a .b');\ndocument.getElementById('c');\n"
    );
    // hidden files and excluded files are not touched
    assert_eq!(
        fs::read_to_string(dir.path().join("js/.hidden.js")).unwrap(),
        "x('nav');\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("css/vendor/lib.css")).unwrap(),
        ".vendor-only{color:red}\n"
    );
}

#[test]
fn cli_run_mirror_output_leaves_sources_alone() {
    let dir = tempdir().unwrap();
    create_site(dir.path());
    let out = dir.path().join("dist");

    let mut args = vec!["run".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--output".to_string(), out.display().to_string()]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("  .nav -> .a\n"));
    assert!(stdout.contains("Files: 4 of 4 changed"));

    assert!(fs::read_to_string(dir.path().join("css/site.css"))
        .unwrap()
        .starts_with(".nav{"));
    assert!(fs::read_to_string(out.join("site.css"))
        .unwrap()
        .starts_with(".a{"));
    assert!(out.join("vendor/lib.css").exists());
    assert!(out.join("index.html").exists());
    assert!(out.join("app.js").exists());
}

#[test]
fn cli_map_does_not_write() {
    let dir = tempdir().unwrap();
    create_site(dir.path());

    let mut args = vec!["map".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--prefix", "x-", "--json"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["maps"]["classes"]["nav"], "x-a");
    assert_eq!(v["files"], 4);
    assert!(fs::read_to_string(dir.path().join("css/site.css"))
        .unwrap()
        .starts_with(".nav{"));
}

#[test]
fn cli_syntax_error_is_reported_as_json_and_nothing_is_written() {
    let dir = tempdir().unwrap();
    create_site(dir.path());
    write_file(&dir.path().join("css/broken.css"), ".oops { color: red; }\n}\n");

    let mut args = vec!["run".to_string()];
    args.extend(source_args(dir.path()));
    args.push("--json".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(65));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let line = stderr.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert!(v["error"].as_str().unwrap().contains("broken.css"));

    assert!(fs::read_to_string(dir.path().join("css/site.css"))
        .unwrap()
        .starts_with(".nav{"));
}

#[test]
fn cli_legacy_css_hacks_do_not_abort() {
    let dir = tempdir().unwrap();
    create_site(dir.path());
    write_file(
        &dir.path().join("css/legacy.css"),
        ".clearfix{*zoom:1}\n",
    );

    let mut args = vec!["run".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--alphabet", "xyzw"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("css/legacy.css")).unwrap(),
        ".x{*zoom:1}\n"
    );
}

#[test]
fn cli_no_files_found() {
    let dir = tempdir().unwrap();
    let css = dir.path().join("missing");
    let output = ruminate(&["run", "--css", css.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error: no css, view, or script files found"));
}

#[test]
fn cli_invalid_prefix_is_a_config_error() {
    let dir = tempdir().unwrap();
    create_site(dir.path());

    let mut args = vec!["map".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--prefix", "1x"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn cli_log_file_records_mappings() {
    let dir = tempdir().unwrap();
    create_site(dir.path());
    let log = dir.path().join("main.log");

    let mut args = vec!["map".to_string()];
    args.extend(source_args(dir.path()));
    args.extend(["--log-file".to_string(), log.display().to_string()]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = ruminate(&args);
    assert!(output.status.success());

    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("mapped class"));
    assert!(contents.contains("nav"));
}
