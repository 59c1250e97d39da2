//! Integration tests for the railstart binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from the user's config and environment.
fn railstart(config_dir: &TempDir) -> Command {
    let config = config_dir.path().join("railstart.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("railstart").unwrap();
    cmd.env_remove("SKIP_GIT")
        .env_remove("RAILSTART_TEMPLATES_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates/jumpstart")
}

fn seed_rails_app(root: &Path) {
    let files = [
        ("Gemfile", "source \"https://rubygems.org\"\n\ngem \"rails\", \"~> 7.1.3\"\n"),
        (
            "config/application.rb",
            "module Blog\n  class Application < Rails::Application\n  end\nend\n",
        ),
        (
            "config/environments/development.rb",
            "Rails.application.configure do\nend\n",
        ),
        ("config/routes.rb", "Rails.application.routes.draw do\nend\n"),
        ("app/helpers/application_helper.rb", "module ApplicationHelper\nend\n"),
        (
            "app/assets/stylesheets/application.bootstrap.scss",
            "@import 'bootstrap/scss/bootstrap';\n",
        ),
        ("package.json", "{\n  \"name\": \"blog\"\n}\n"),
    ];
    for (path, contents) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }
}

// ── basics ────────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("railstart"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn test_version_flag() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_arguments_prints_usage() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg).assert().failure().code(2);
}

#[test]
fn test_shell_completions() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("railstart"));
}

// ── flash ─────────────────────────────────────────────────────────────────────

#[test]
fn test_flash_alert_is_an_error_toast() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["flash", "alert", "Bad login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("error: Bad login"))
        .stdout(predicate::str::contains("toastr.error(\"Bad login\")"));
}

#[test]
fn test_flash_unknown_key_is_success() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["flash", "debug", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success: x"));
}

#[test]
fn test_flash_json() {
    let cfg = TempDir::new().unwrap();
    let out = railstart(&cfg)
        .args(["flash", "warning", "Low disk", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["severity"], "warning");
    assert_eq!(json["message"], "Low disk");
    assert_eq!(json["javascript"], "toastr.warning(\"Low disk\")");
    assert_eq!(json["options"]["timeOut"], 5000);
}

#[test]
fn test_flash_empty_message_is_rejected() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["flash", "notice", ""])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("non-empty"));
}

// ── plan ──────────────────────────────────────────────────────────────────────

#[test]
fn test_plan_lists_builtin_steps() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("add gems"))
        .stdout(predicate::str::contains("git commit (git, may fail)"));
}

#[test]
fn test_plan_json() {
    let cfg = TempDir::new().unwrap();
    let out = railstart(&cfg)
        .args(["plan", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["name"], "jumpstart");
    assert_eq!(json["steps"][0]["name"], "add gems");
    assert_eq!(json["steps"][1]["mutations"][0]["kind"], "run-shell");
}

#[test]
fn test_plan_rejects_bad_pattern() {
    let cfg = TempDir::new().unwrap();
    let recipe = cfg.path().join("recipe.toml");
    fs::write(
        &recipe,
        r#"
[recipe]
name = "broken"

[[steps]]
name = "bad"

[[steps.mutations]]
kind = "insert_text"
file = "Gemfile"
anchor = { pattern = "(unclosed" }
text = "x"
"#,
    )
    .unwrap();

    railstart(&cfg)
        .args(["plan", "--recipe"])
        .arg(&recipe)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("(unclosed"));
}

// ── apply ─────────────────────────────────────────────────────────────────────

#[test]
fn test_apply_missing_directory() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["apply", "/definitely/not/here"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("No application found"));
}

#[test]
fn test_apply_dry_run_changes_nothing() {
    let cfg = TempDir::new().unwrap();
    let app = TempDir::new().unwrap();
    seed_rails_app(app.path());
    let before = fs::read_to_string(app.path().join("Gemfile")).unwrap();

    railstart(&cfg)
        .arg("apply")
        .arg(app.path())
        .arg("--dry-run")
        .arg("--templates")
        .arg(templates())
        .assert()
        .success()
        .stdout(predicate::str::contains("Planned changes"))
        .stdout(predicate::str::contains("run bundle install"));

    assert_eq!(fs::read_to_string(app.path().join("Gemfile")).unwrap(), before);
    assert!(!app.path().join("Procfile.dev").exists());
}

#[test]
fn test_apply_custom_recipe_is_idempotent() {
    let cfg = TempDir::new().unwrap();
    let app = TempDir::new().unwrap();
    seed_rails_app(app.path());

    let recipe = cfg.path().join("recipe.toml");
    fs::write(
        &recipe,
        r#"
[recipe]
name = "posts"

[[steps]]
name = "gems"

[[steps.mutations]]
kind = "add_dependency"
name = "pundit"
version = "~> 2.1"

[[steps]]
name = "routes"

[[steps.mutations]]
kind = "insert_text"
file = "config/routes.rb"
anchor = { line = "Rails.application.routes.draw do" }
text = "  resources :posts"

[[steps]]
name = "commit"
vcs = true

[[steps.mutations]]
kind = "shell"
command = "git commit -m posts"
"#,
    )
    .unwrap();

    for _ in 0..2 {
        railstart(&cfg)
            .arg("apply")
            .arg(app.path())
            .arg("--recipe")
            .arg(&recipe)
            .env("SKIP_GIT", "true")
            .assert()
            .success();
    }

    let gemfile = fs::read_to_string(app.path().join("Gemfile")).unwrap();
    assert_eq!(gemfile.matches("gem \"pundit\", \"~> 2.1\"").count(), 1);
    assert_eq!(
        fs::read_to_string(app.path().join("config/routes.rb")).unwrap(),
        "Rails.application.routes.draw do\n  resources :posts\nend\n"
    );
}

#[test]
fn test_apply_report_as_json() {
    let cfg = TempDir::new().unwrap();
    let app = TempDir::new().unwrap();
    seed_rails_app(app.path());
    let recipe = cfg.path().join("recipe.toml");
    fs::write(
        &recipe,
        r#"
[recipe]
name = "one"

[[steps]]
name = "gems"

[[steps.mutations]]
kind = "add_dependency"
name = "rails"
"#,
    )
    .unwrap();

    let out = railstart(&cfg)
        .args(["--output-format", "json", "apply"])
        .arg(app.path())
        .arg("--recipe")
        .arg(&recipe)
        .output()
        .unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["recipe"], "one");
    assert_eq!(report["steps"][0]["status"], "completed");
    assert_eq!(report["steps"][0]["mutations"][0]["outcome"], "unchanged");
}

#[test]
fn test_apply_missing_anchor_fails() {
    let cfg = TempDir::new().unwrap();
    let app = TempDir::new().unwrap();
    seed_rails_app(app.path());
    let recipe = cfg.path().join("recipe.toml");
    fs::write(
        &recipe,
        r#"
[recipe]
name = "missing"

[[steps]]
name = "routes"

[[steps.mutations]]
kind = "insert_text"
file = "config/routes.rb"
anchor = { line = "Rails.application.routes.draw do |map|" }
text = "  resources :posts"
"#,
    )
    .unwrap();

    railstart(&cfg)
        .arg("apply")
        .arg(app.path())
        .arg("--recipe")
        .arg(&recipe)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Step 'routes' failed"));

    assert_eq!(
        fs::read_to_string(app.path().join("config/routes.rb")).unwrap(),
        "Rails.application.routes.draw do\nend\n"
    );
}

// ── new ───────────────────────────────────────────────────────────────────────

#[test]
fn test_new_rejects_invalid_name() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["new", ".hidden", "--yes"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid application name"));
}

#[test]
fn test_new_refuses_existing_directory() {
    let cfg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::create_dir(work.path().join("blog")).unwrap();

    railstart(&cfg)
        .current_dir(work.path())
        .args(["new", "blog", "--yes"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_new_dry_run_runs_nothing() {
    let cfg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    railstart(&cfg)
        .current_dir(work.path())
        .args(["new", "blog", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rails new blog --javascript esbuild"));

    assert!(!work.path().join("blog").exists());
}

// ── config / init ─────────────────────────────────────────────────────────────

#[test]
fn test_config_get() {
    let cfg = TempDir::new().unwrap();
    fs::write(
        cfg.path().join("railstart.toml"),
        "[patcher]\ncommand_timeout_secs = 45\n",
    )
    .unwrap();

    railstart(&cfg)
        .args(["config", "get", "patcher.command_timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("45\n"));
}

#[test]
fn test_config_env_override() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .env("RAILSTART_PATCHER__RAILS_BIN", "bin/custom-rails")
        .args(["config", "get", "patcher.rails_bin"])
        .assert()
        .success()
        .stdout(predicate::str::diff("bin/custom-rails\n"));
}

#[test]
fn test_config_unknown_key() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["config", "get", "nope.nothing"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_missing_config_file_is_configuration_error() {
    let cfg = TempDir::new().unwrap();
    Command::cargo_bin("railstart")
        .unwrap()
        .arg("--config")
        .arg(cfg.path().join("absent.toml"))
        .arg("plan")
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_init_local_writes_config() {
    let cfg = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    railstart(&cfg)
        .current_dir(work.path())
        .args(["init", "--local"])
        .assert()
        .success();

    let written = fs::read_to_string(work.path().join(".railstart.toml")).unwrap();
    assert!(written.contains("[patcher]"));
    assert!(written.contains("rails_bin = \"bin/rails\""));
}

#[test]
fn test_quiet_flag_silences_stdout() {
    let cfg = TempDir::new().unwrap();
    railstart(&cfg)
        .args(["-q", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
