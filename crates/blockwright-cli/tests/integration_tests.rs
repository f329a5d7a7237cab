//! Integration tests for the `blockwright` binary.

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HERO: &str = r#"<section class="hero">
  <h1>{{ heading }}</h1>
  <p>{{ subheading }}</p>
</section>
{% schema %}
{
  "name": "Hero Banner",
  "description": "Full-width hero with a heading",
  "settings": [
    { "id": "heading", "type": "text", "default": "Welcome" },
    { "id": "subheading", "type": "text", "default": "Shop the collection" }
  ]
}
{% endschema %}
"#;

const FOOTER: &str = r#"<footer class="site-footer">
  <p>&copy; Example Store. All rights reserved.</p>
</footer>
"#;

/// Temp workspace with a two-entry catalog and an isolated home directory.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let templates = temp.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("hero-banner-1.liquid"), HERO).unwrap();
    fs::write(templates.join("footer.html"), FOOTER).unwrap();
    temp
}

fn blockwright(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blockwright").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("BLOCKWRIGHT_PROVIDERS__API_KEYS", "")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

// ── help / version ───────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("compose"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_query_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path()).arg("search").assert().code(2);
}

// ── catalog commands ─────────────────────────────────────────────────────────

#[test]
fn list_shows_catalog_and_flags_schema_less_entries() {
    let temp = workspace();
    blockwright(temp.path())
        .args(["--output-format", "plain", "list", "--templates-dir", "templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hero-banner-1"))
        .stdout(predicate::str::contains("footer"))
        .stdout(predicate::str::contains("schema-less"));
}

#[test]
fn list_without_catalog_serves_builtin_sections() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .args(["--output-format", "plain", "list", "-t", "missing-dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hero-banner-default"));
}

#[test]
fn search_json_ranks_hero_first() {
    let temp = workspace();
    let assert = blockwright(temp.path())
        .args([
            "--output-format",
            "json",
            "-t",
            "templates",
            "search",
            "I need a hero banner with gradient background",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(hits[0]["id"], "hero-banner-1");
    assert!(hits[0]["score"].as_u64().unwrap() > 0);
}

#[test]
fn resolve_reports_explicit_path() {
    let temp = workspace();
    let assert = blockwright(temp.path())
        .args(["--output-format", "json", "-t", "templates", "resolve", "footer, hero-banner-1"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let view: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(view["path"], "explicit");
    assert_eq!(view["templates"][0]["id"], "footer");
    assert_eq!(view["templates"][1]["id"], "hero-banner-1");
}

#[test]
fn compose_from_catalog_applies_overrides() {
    let temp = workspace();
    let assert = blockwright(temp.path())
        .args([
            "--output-format",
            "plain",
            "-t",
            "templates",
            "compose",
            "hero-banner-1",
            "--source",
            "catalog",
            "--set",
            "heading=Spring Sale",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Spring Sale</h1>"))
        .stdout(predicate::str::contains("<p>Shop the collection</p>"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.matches("{% schema %}").count(), 1);
}

#[test]
fn compose_writes_schema_less_entries_with_a_block() {
    let temp = workspace();
    blockwright(temp.path())
        .args([
            "-q",
            "-t",
            "templates",
            "compose",
            "footer",
            "--source",
            "catalog",
            "--out-dir",
            "out",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join("out/footer.liquid")).unwrap();
    assert!(written.contains("site-footer"));
    assert!(written.contains("{% schema %}"));
}

#[test]
fn catalog_miss_exits_not_found() {
    let temp = workspace();
    blockwright(temp.path())
        .args(["-t", "templates", "compose", "zzqx", "--source", "catalog"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No template matches"));
}

// ── generation ───────────────────────────────────────────────────────────────

#[test]
fn generate_without_credentials_is_a_configuration_error() {
    let temp = workspace();
    blockwright(temp.path())
        .args(["-t", "templates", "generate", "pricing table with three tiers"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("BLOCKWRIGHT_PROVIDERS__API_KEYS"));
}

#[test]
fn auto_compose_falls_back_to_generation_after_a_miss() {
    let temp = workspace();
    blockwright(temp.path())
        .args(["-t", "templates", "compose", "zzqx"])
        .assert()
        .code(4);
}

#[test]
fn providers_shows_prefix_routing_without_leaking_keys() {
    let temp = TempDir::new().unwrap();
    let assert = blockwright(temp.path())
        .env("BLOCKWRIGHT_PROVIDERS__API_KEYS", "gsk_abcdefghijklmnop")
        .args(["--output-format", "json", "providers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abcdefghijklmnop").not());

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let routes: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(routes[0]["provider"], "groq");
    assert_eq!(routes[0]["source"], "prefix");
}

// ── config / init / completions ──────────────────────────────────────────────

#[test]
fn config_get_reads_env_overrides() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .env("BLOCKWRIGHT_RETRY__MAX_ATTEMPTS", "2")
        .args(["config", "get", "retry.max_attempts"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn config_get_unknown_key_is_not_found() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .args(["config", "get", "retry.nope"])
        .assert()
        .code(3);
}

#[test]
fn config_path_prefers_explicit_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("custom.toml");
    fs::write(&file, "[catalog]\nmax_results = 5\n").unwrap();

    blockwright(temp.path())
        .args(["config", "path", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn missing_explicit_config_exits_with_config_code() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .args(["--config", "nope.toml", "list"])
        .assert()
        .code(4);
}

#[test]
fn init_local_creates_file_and_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .args(["init", "--local"])
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join(".blockwright.toml")).unwrap();
    assert!(written.contains("[retry]"));
    assert!(written.contains("max_attempts = 5"));

    blockwright(temp.path())
        .args(["init", "--local"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    blockwright(temp.path())
        .args(["init", "--local", "--force"])
        .assert()
        .success();
}

#[test]
fn completions_name_the_binary() {
    let temp = TempDir::new().unwrap();
    blockwright(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blockwright"));
}
