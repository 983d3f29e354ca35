use super::{App, AppError, SourceOverride};
use crate::config::SheetConfig;
use crate::db;
use crate::store::TreeError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FEED: &str = r#"{"success":true,"data":{"questions":[
    {"_id":"q-1","title":"Two Sum","topic":"Arrays","subTopic":"Basics","difficulty":"Easy"},
    {"_id":"q-2","title":"3Sum","topic":"Arrays","subTopic":"Basics","difficulty":"medium"},
    {"_id":"q-3","title":"Word Ladder","topic":"Graphs","subTopic":"BFS","difficulty":"HARD"}
]}}"#;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("qsheet-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn write_feed(root: &Path) -> PathBuf {
    let path = root.join("feed.json");
    std::fs::write(&path, FEED).expect("feed should be writable");
    path
}

fn config_for(root: &Path) -> SheetConfig {
    SheetConfig {
        db_path: root
            .join(".qsheet/state.sqlite")
            .to_str()
            .expect("utf8 path")
            .to_string(),
        ..SheetConfig::default()
    }
}

#[test]
fn hydrate_installs_feed_and_survives_reopen() {
    let root = unique_workspace();
    let feed = write_feed(&root);
    let config = config_for(&root);

    let app = App::open(config.clone()).expect("app should open");
    let report = app
        .hydrate(Some(SourceOverride::File(feed)))
        .expect("hydrate should run");
    assert_eq!(report.outcome, "installed");
    assert_eq!(report.topics, 2);
    assert_eq!(report.questions, 3);
    assert!(report.fingerprint.is_some());

    let sheet = app.sheet();
    let topic = &sheet.topics[0];
    let sub = &topic.sub_topics[0];
    let (topic_id, sub_id) = (topic.id.clone(), sub.id.clone());
    assert!(app.mutate(|store| store.toggle_solved(&topic_id, &sub_id, "q-1")));
    drop(app);

    let reopened = App::open(config).expect("app should reopen");
    let sheet = reopened.sheet();
    assert_eq!(sheet.question_count(), 3);
    let question = sheet
        .question(&topic_id, &sub_id, "q-1")
        .expect("question should survive reopen");
    assert!(question.solved);

    let run = reopened
        .last_hydration()
        .expect("hydration history readable")
        .expect("run should be recorded");
    assert_eq!(run.status, "installed");
    assert_eq!(run.question_count, 3);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn second_hydrate_skips_non_empty_sheet() {
    let root = unique_workspace();
    let feed = write_feed(&root);
    let app = App::open(config_for(&root)).expect("app should open");

    app.hydrate(Some(SourceOverride::File(feed.clone())))
        .expect("first hydrate");
    let before = app.sheet();
    let report = app
        .hydrate(Some(SourceOverride::File(feed)))
        .expect("second hydrate");
    assert_eq!(report.outcome, "skipped_non_empty");
    assert_eq!(app.sheet(), before);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failed_hydrate_is_recorded_without_touching_sheet() {
    let root = unique_workspace();
    let app = App::open(config_for(&root)).expect("app should open");

    let report = app
        .hydrate(Some(SourceOverride::File(root.join("missing.json"))))
        .expect("hydrate reports failure as data");
    assert!(report.is_failure());
    assert_eq!(report.outcome, "failed");
    assert!(app.sheet().is_empty());

    let status = app.status().expect("status");
    assert_eq!(status.topics, 0);
    let run = status.last_hydration.expect("failure should be recorded");
    assert_eq!(run.status, "failed");
    assert!(run.last_error.is_some());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn hydrate_without_source_is_invalid_argument() {
    let root = unique_workspace();
    let app = App::open(config_for(&root)).expect("app should open");
    assert!(matches!(app.hydrate(None), Err(AppError::InvalidArgument(_))));
    assert!(app.ensure_hydrated().expect("no-op").is_none());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn ensure_hydrated_uses_configured_source_once() {
    let root = unique_workspace();
    let feed = write_feed(&root);
    let config = SheetConfig {
        source_file: Some(feed),
        ..config_for(&root)
    };
    let app = App::open(config).expect("app should open");

    let first = app.ensure_hydrated().expect("auto hydrate");
    assert_eq!(first.map(|report| report.outcome), Some("installed".to_string()));
    assert!(app.ensure_hydrated().expect("second call").is_none());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn reorder_errors_surface_as_tree_errors() {
    let root = unique_workspace();
    let app = App::open(config_for(&root)).expect("app should open");
    app.mutate(|store| store.add_topic("Only"));

    let err = app
        .try_mutate(|store| store.reorder_topics(1, 0))
        .expect_err("from == len must fail");
    assert!(matches!(
        err,
        AppError::Tree(TreeError::IndexOutOfRange { index: 1, len: 1 })
    ));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn reset_clears_sheet_and_export_is_versioned() {
    let root = unique_workspace();
    let feed = write_feed(&root);
    let config = config_for(&root);
    let app = App::open(config.clone()).expect("app should open");
    app.hydrate(Some(SourceOverride::File(feed)))
        .expect("hydrate");

    let exported = app.export_snapshot().expect("export");
    let value: serde_json::Value = serde_json::from_str(&exported).expect("export is json");
    assert_eq!(value["version"], 1);
    assert_eq!(value["topics"].as_array().map(Vec::len), Some(2));

    assert!(app.reset());
    assert!(!app.reset());
    assert!(app.sheet().is_empty());
    drop(app);

    let conn = db::open_connection(&config.db_path).expect("reopen db");
    let stored = db::load_sheet(&conn, &config.storage_key)
        .expect("load")
        .expect("empty snapshot is stored");
    assert!(stored.is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn status_reports_progress_and_save_time() {
    let root = unique_workspace();
    let feed = write_feed(&root);
    let config = config_for(&root);
    {
        let app = App::open(config.clone()).expect("app should open");
        app.hydrate(Some(SourceOverride::File(feed)))
            .expect("hydrate");
    }

    let app = App::open(config).expect("app should reopen");
    let status = app.status().expect("status");
    assert_eq!(status.questions, 3);
    assert_eq!(status.progress.solved, 0);
    assert_eq!(status.progress.total, 3);
    assert!(status.saved_at.is_some());
    assert_eq!(
        status.schema_version.as_deref(),
        Some(crate::db::CURRENT_SCHEMA_VERSION.to_string().as_str())
    );

    let _ = std::fs::remove_dir_all(root);
}
