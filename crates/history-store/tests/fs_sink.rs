use std::fs;
use std::sync::Arc;

use history_store::{
    generate_storage_key, ExecutionOutcome, ExecutionRecord, ExportBundle, FsArtifactSink,
    HistoryStore, STORE_SCHEMA_VERSION,
};
use itest_core_types::WorkflowId;
use serde_json::{json, Value};
use step_patterns::PatternRegistry;
use step_translator::{Translator, VariableTable};
use tempfile::tempdir;

fn extract_record() -> ExecutionRecord {
    let translator = Translator::new(Arc::new(PatternRegistry::builtin_only()));
    let descriptor = translator.translate("提取 商品列表", &VariableTable::new());
    ExecutionRecord::new(
        descriptor,
        ExecutionOutcome::Success {
            result: json!({ "count": 2 }),
        },
        42,
        WorkflowId::new("shop-flow"),
    )
}

#[test]
fn artifacts_are_written_as_json_files() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::with_sink(Arc::new(FsArtifactSink::new(dir.path())));
    let key = generate_storage_key("商品列表");
    store.put_artifact(key.clone(), json!([{ "name": "a" }, { "name": "b" }]));

    let body = fs::read_to_string(dir.path().join(format!("{key}.json"))).unwrap();
    let file: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(file["key"], key.as_str());
    assert_eq!(file["metadata"]["dataType"], "object");
    assert_eq!(file["metadata"]["isArray"], true);
    assert!(file["timestamp"].is_string());
}

#[test]
fn export_bundle_contains_history_stats_and_version() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::with_sink(Arc::new(FsArtifactSink::new(dir.path().join("results"))));
    store.append(extract_record());
    store.put_artifact("price", json!("9.99"));

    let path = store.export().unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("export_") && name.ends_with(".json"));

    let bundle: ExportBundle = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(bundle.version, STORE_SCHEMA_VERSION);
    assert_eq!(bundle.execution_history.len(), 1);
    assert_eq!(bundle.stats.total_executions, 1);
    assert_eq!(bundle.stats.success_rate, 100);
    assert_eq!(bundle.extracted_data["price"], json!("9.99"));
}

#[test]
fn unwritable_sink_keeps_in_memory_copy() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();
    let store = HistoryStore::with_sink(Arc::new(FsArtifactSink::new(&blocker)));

    store.put_artifact("k", json!(1));
    assert_eq!(store.artifact("k"), Some(json!(1)));
    assert!(store.export().is_err());
}
