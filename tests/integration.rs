use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cov_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cov");
    path
}

const SPEC: &str = r##"{
  "openapi": "3.0.0",
  "paths": {
    "/tasks/": {
      "get": {"summary": "List tasks", "responses": {"200": {"description": "OK"}}},
      "post": {
        "summary": "Create task",
        "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Task"}}}},
        "responses": {"201": {"description": "Created"}}
      }
    },
    "/tasks/{task_id}": {
      "parameters": [{"name": "task_id", "in": "path"}],
      "get": {"summary": "Read task"},
      "delete": {"summary": "Delete task"}
    }
  }
}"##;

const CREATE_RESULT: &str = r#"{
  "uuid": "a1",
  "name": "test_create_task",
  "fullName": "tests.test_tasks#test_create_task",
  "status": "passed",
  "start": 1000,
  "stop": 1250,
  "labels": [{"name": "feature", "value": "Tasks"}, {"name": "story", "value": "Create task"}],
  "steps": [
    {
      "name": "POST /tasks/",
      "status": "passed",
      "start": 1000,
      "stop": 1100,
      "attachments": [{"name": "response", "source": "a1-attachment.txt", "type": "text/plain"}]
    }
  ]
}"#;

const LIST_RESULT: &str = r#"{
  "uuid": "b2",
  "name": "test_list_tasks",
  "status": "failed",
  "labels": [{"name": "feature", "value": "Tasks"}],
  "steps": []
}"#;

fn setup_test_env(generation: Option<&str>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(root.join("openapi.json"), SPEC).unwrap();

    let results = root.join("allure-results");
    fs::create_dir_all(results.join("nested")).unwrap();
    fs::write(results.join("a1-result.json"), CREATE_RESULT).unwrap();
    fs::write(results.join("nested/b2-result.json"), LIST_RESULT).unwrap();
    fs::write(results.join("a1-attachment.txt"), "status_code=201 id=7").unwrap();
    fs::write(results.join("a1-container.json"), "{}").unwrap();

    let mut config_content = format!(
        r#"[spec]
source = "{root}/openapi.json"

[results]
dir = "{root}/allure-results"

[index]
path = "{root}/index"

[retrieval]
k = 10

[embedding]
provider = "hash"
dims = 128
"#,
        root = root.display()
    );
    if let Some(url) = generation {
        config_content.push_str(&format!(
            "\n[generation]\nprovider = \"ollama\"\nmodel = \"llama3\"\nurl = \"{}\"\n",
            url
        ));
    }

    let config_path = config_dir.join("cov.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cov(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cov_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cov binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_ingest_dry_run_counts_documents() {
    let (tmp, config_path) = setup_test_env(None);

    let (stdout, stderr, success) = run_cov(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("spec documents: 4"), "stdout={}", stdout);
    assert!(stdout.contains("execution documents: 2"), "stdout={}", stdout);
    assert!(!tmp.path().join("index/index.sqlite").exists());
}

#[test]
fn test_ingest_writes_index() {
    let (tmp, config_path) = setup_test_env(None);

    let (stdout, stderr, success) = run_cov(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("model: hash (128 dims)"));
    assert!(stdout.contains("ok"));
    assert!(tmp.path().join("index/index.sqlite").exists());
}

#[test]
fn test_search_lists_spec_before_execution() {
    let (_tmp, config_path) = setup_test_env(None);
    run_cov(&config_path, &["ingest"]);

    let (stdout, stderr, success) = run_cov(&config_path, &["search", "create task"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let last_spec = stdout.rfind(" spec / ").expect("no spec hits");
    let first_exec = stdout.find(" execution / ").expect("no execution hits");
    assert!(last_spec < first_exec, "stdout={}", stdout);
    assert!(stdout.contains("POST /tasks/"));
    assert!(stdout.contains("test_create_task (Tasks / Create task)"));
}

#[test]
fn test_search_respects_k() {
    let (_tmp, config_path) = setup_test_env(None);
    run_cov(&config_path, &["ingest"]);

    let (stdout, _, success) = run_cov(&config_path, &["search", "tasks", "--k", "2"]);
    assert!(success);
    assert!(stdout.contains("1. "));
    assert!(stdout.contains("2. "));
    assert!(!stdout.contains("3. "));
}

#[test]
fn test_search_without_index_fails() {
    let (_tmp, config_path) = setup_test_env(None);

    let (_, stderr, success) = run_cov(&config_path, &["search", "anything"]);
    assert!(!success);
    assert!(stderr.contains("No index found"), "stderr={}", stderr);
}

#[test]
fn test_corrupt_result_aborts_ingest() {
    let (tmp, config_path) = setup_test_env(None);
    fs::write(
        tmp.path().join("allure-results/broken-result.json"),
        "{ \"name\": ",
    )
    .unwrap();

    let (_, stderr, success) = run_cov(&config_path, &["ingest"]);
    assert!(!success);
    assert!(stderr.contains("broken-result.json"), "stderr={}", stderr);
    assert!(!tmp.path().join("index/index.sqlite").exists());
}

#[test]
fn test_malformed_spec_aborts_ingest() {
    let (tmp, config_path) = setup_test_env(None);
    fs::write(tmp.path().join("openapi.json"), r#"{"openapi": "3.0.0"}"#).unwrap();

    let (_, stderr, success) = run_cov(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(
        stderr.contains("Malformed interface specification"),
        "stderr={}",
        stderr
    );
}

#[test]
fn test_sources_reports_inputs() {
    let (_tmp, config_path) = setup_test_env(None);

    let (stdout, _, success) = run_cov(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("OK (2 files)"), "stdout={}", stdout);
    assert!(stdout.contains("NOT BUILT"));

    run_cov(&config_path, &["ingest"]);
    let (stdout, _, _) = run_cov(&config_path, &["sources"]);
    assert!(!stdout.contains("NOT BUILT"));
}

#[test]
fn test_analyze_requires_generation_backend() {
    let (_tmp, config_path) = setup_test_env(None);
    run_cov(&config_path, &["ingest"]);

    let (_, stderr, success) = run_cov(&config_path, &["analyze", "What is untested?"]);
    assert!(!success);
    assert!(stderr.contains("generation backend"), "stderr={}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_and_generate_tests_against_mock_backend() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {"role": "assistant", "content": "DELETE /tasks/{task_id} has no test."},
            "done": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (tmp, config_path) = setup_test_env(Some(&server.uri()));
    let prompt_file = tmp.path().join("directive.txt");
    fs::write(&prompt_file, "You are terse.").unwrap();

    let config = config_path.clone();
    let prompt = prompt_file.clone();
    let outputs = tokio::task::spawn_blocking(move || {
        run_cov(&config, &["ingest"]);
        let analyze = run_cov(&config, &["analyze", "What is untested?"]);
        let generate = run_cov(
            &config,
            &[
                "generate-tests",
                "Suggest tests",
                "--system",
                prompt.to_str().unwrap(),
            ],
        );
        (analyze, generate)
    })
    .await
    .unwrap();

    let ((a_out, a_err, a_ok), (g_out, g_err, g_ok)) = outputs;
    assert!(a_ok, "analyze failed: {}", a_err);
    assert!(g_ok, "generate-tests failed: {}", g_err);
    assert!(a_out.contains("DELETE /tasks/{task_id} has no test."));
    assert!(g_out.contains("DELETE /tasks/{task_id} has no test."));

    let requests = server.received_requests().await.unwrap();
    let prompts: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["messages"][0]["content"].as_str().unwrap().to_string()
        })
        .collect();

    assert!(prompts[0].starts_with("You are a Senior Test Analyst"));
    assert!(prompts[0].contains("\n\nContext:\nAPI Path: "));
    assert!(prompts[0].ends_with("\n\nWhat is untested?"));
    assert!(prompts[1].starts_with("You are terse.\n\nContext:\n"));
    assert!(prompts[1].ends_with("\n\nSuggest tests"));
}
