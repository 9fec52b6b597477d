//! Command-line tests for the `bb` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `bb` with logs and config lookups confined to `home`
fn bb(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bb").expect("bb binary should build");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_DATA_HOME", home.join("data"))
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_backoff_schedule_caps() {
    let temp = TempDir::new().unwrap();
    bb(temp.path())
        .args(["backoff", "--attempts", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wait 60s"))
        .stdout(predicate::str::contains("wait 240s"))
        .stdout(predicate::str::contains("wait 300s"))
        .stdout(predicate::str::contains("wait 360s").not());
}

#[test]
fn test_backoff_uses_config_file() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("custom.yml");
    fs::write(&config, "reconnect:\n  base-wait-secs: 5\n  max-wait-secs: 12\n").unwrap();

    bb(temp.path())
        .args(["--config", config.to_str().unwrap(), "backoff", "-a", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wait 5s"))
        .stdout(predicate::str::contains("wait 10s"))
        .stdout(predicate::str::contains("wait 12s"));
}

#[test]
fn test_roll_valid_player() {
    let temp = TempDir::new().unwrap();
    bb(temp.path())
        .args(["roll", "dice1", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dice1 rolled by p1"));
}

#[test]
fn test_roll_rejects_unknown_player() {
    let temp = TempDir::new().unwrap();
    bb(temp.path())
        .args(["roll", "dice1", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid player number. Must be 1-4."));
}

#[test]
fn test_config_json() {
    let temp = TempDir::new().unwrap();
    bb(temp.path())
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nickname\": \"diceman\""))
        .stdout(predicate::str::contains("\"base-wait-secs\": 60"));
}

#[test]
fn test_config_picks_up_local_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("boardbot.yml"), "irc:\n  nickname: dicewoman\n").unwrap();

    bb(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("nickname: dicewoman"));
}

#[test]
fn test_draw_rejects_bad_locator() {
    let temp = TempDir::new().unwrap();
    bb(temp.path())
        .args(["draw", "745,1136", "mortgaged", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("745,1136"));
}

#[cfg(unix)]
#[test]
fn test_draw_runs_render_command() {
    let temp = TempDir::new().unwrap();
    let artifact = temp.path().join("map.webp");
    fs::write(&artifact, "").unwrap();
    let config = temp.path().join("draw.yml");
    fs::write(
        &config,
        format!(
            r#"artifact:
  path: {}
render:
  program: sh
  args:
    - "-c"
    - 'printf "%s;" "$0" >> "$1"'
    - "{{attribute}}"
    - "{{artifact}}"
"#,
            artifact.display()
        ),
    )
    .unwrap();

    bb(temp.path())
        .args(["--config", config.to_str().unwrap(), "draw", "745,1136 755,1146", "mortgaged", "p2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 1 update(s)"));

    assert_eq!(fs::read_to_string(&artifact).unwrap(), "grey;");
}

#[cfg(unix)]
#[test]
fn test_draw_reports_render_failure() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("fail.yml");
    fs::write(&config, "render:\n  program: \"false\"\n  args: []\n").unwrap();

    bb(temp.path())
        .args(["--config", config.to_str().unwrap(), "draw", "1,1 2,2", "unmortgaged", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 update(s) failed"));
}

#[test]
fn test_refresh_replaces_artifact() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("map.webp"), "drawn").unwrap();
    fs::write(temp.path().join("cb2.webp"), "blank").unwrap();

    bb(temp.path())
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fresh map queued from cb2.webp."));

    assert_eq!(fs::read_to_string(temp.path().join("map.webp")).unwrap(), "blank");
    assert!(!temp.path().join("map_temp.webp").exists());
}
