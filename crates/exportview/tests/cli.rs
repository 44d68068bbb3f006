use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use predicates::prelude::*;
use zip::write::SimpleFileOptions;

const HISTORY: &str = "Profile Name,Start Time,Duration,Title,Device Type\n\
                       Alice,2021-05-12 15:00:00,00:45:00,\
                       Stranger Things: Season 1: Chapter One,Apple iPhone\n\
                       Alice,2021-05-13 15:00:00,00:50:00,\
                       Stranger Things: Season 1: Chapter Two,Apple iPhone\n\
                       Bob,2021-05-14 15:00:00,02:28:00,Inception,Sony PS4\n\
                       Mom & Dad,Not a date,01:00:00,<img src=x onerror=alert(1)>,Smart TV\n";

fn write_zip(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("netflix.zip");
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();
    path
}

fn exportview() -> Command {
    let mut cmd = Command::cargo_bin("exportview").unwrap();
    cmd.env_remove("EXPORTVIEW_LOG_LEVEL")
        .env_remove("EXPORTVIEW_PAGE_SIZE")
        .env_remove("EXPORTVIEW_TARGET_FILE");
    cmd
}

#[test]
fn test_prints_summary_table_and_page() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("CONTENT_INTERACTION/ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .assert()
        .success()
        .stderr(predicate::str::contains("Successfully loaded 4 rows."))
        .stdout(predicate::str::contains("Records: 4"))
        .stdout(predicate::str::contains("Dates:   2021-05-12 - 2021-05-14"))
        .stdout(predicate::str::contains("Profile: All Profiles"))
        .stdout(predicate::str::contains("Inception"))
        .stdout(predicate::str::contains("Page 1 of 1"));
}

#[test]
fn test_profile_and_search_filters() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .args(["--profile", "Alice", "--search", "chapter two"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 1"))
        .stdout(predicate::str::contains("Chapter Two"))
        .stdout(predicate::str::contains("Chapter One").not())
        .stdout(predicate::str::contains("Inception").not());
}

#[test]
fn test_profiles_listing() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .arg("--profiles")
        .assert()
        .success()
        .stdout("All Profiles\nAlice\nBob\nMom & Dad\n");
}

#[test]
fn test_download_profile_history() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .args(["--profile", "Mom & Dad", "--search", "nothing matches this"])
        .arg("--download")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Download Mom & Dad's History"));

    let saved = fs::read_to_string(out.join("ViewingActivity_Mom___Dad.csv")).unwrap();
    assert_eq!(
        saved,
        "Profile Name,Start Time,Duration,Title,Device Type\n\
         Mom & Dad,Not a date,01:00:00,<img src=x onerror=alert(1)>,Smart TV\n"
    );
}

#[test]
fn test_html_output_is_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);
    let html = dir.path().join("page.html");

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .arg("--html")
        .arg(&html)
        .assert()
        .success();

    let page = fs::read_to_string(&html).unwrap();
    assert!(page.contains("<table id=\"viewing-activity-table\">"));
    assert!(page.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!page.contains("<img"));
}

#[test]
fn test_insights_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .arg("--insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total watch time: 5:03:00"))
        .stdout(predicate::str::contains("Most watched:     Stranger Things (2 views)"));

    let output = exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .args(["--json", "--page-size", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"]["summary"]["count"], 4);
    assert_eq!(value["state"]["page_label"], "Page 1 of 2");
    assert_eq!(value["state"]["status"]["kind"], "success");
    assert_eq!(value["state"]["grid"]["rows"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_page_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .args(["--page-size", "3", "--page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 2 of 2"))
        .stdout(predicate::str::contains("Not a date"));

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .args(["--page-size", "3", "--page", "9"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Page 9 is out of range"))
        .stdout(predicate::str::contains("Page 1 of 2"));
}

#[test]
fn test_terminal_escapes_in_data_are_neutralised() {
    let dir = tempfile::tempdir().unwrap();
    let history = "Profile Name,Title\n\u{1b}[31mEve,\u{1b}]0;pwned\u{7}\u{1b}[2JDark\n";
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", history)]);

    let output = exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.contains(&0x1b));
    assert!(String::from_utf8_lossy(&output.stdout).contains("^[]0;pwned^G^[[2JDark"));

    let output = exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .arg("--profiles")
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "All Profiles\n^[[31mEve\n");
}

#[test]
fn test_download_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("ViewingActivity.csv", HISTORY)]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .arg("--download")
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to save download"));
}

#[test]
fn test_missing_target_fails() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_zip(dir.path(), &[("random_file.txt", "nothing")]);

    exportview()
        .current_dir(dir.path())
        .arg(&zip)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Could not find 'ViewingActivity.csv' inside the ZIP file.",
        ));
}

#[test]
fn test_corrupt_archive_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netflix.zip");
    fs::write(&path, "not a zip").unwrap();

    exportview()
        .current_dir(dir.path())
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to process ZIP file"));
}

#[test]
fn test_unpacked_directory_and_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("export");
    fs::create_dir(&export).unwrap();
    fs::write(export.join("ViewingActivity.csv"), HISTORY).unwrap();

    exportview()
        .current_dir(dir.path())
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 4"));

    exportview()
        .current_dir(dir.path())
        .env("EXPORTVIEW_MAX_FILE_SIZE", "100")
        .arg(&export)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File is too large."));
}
