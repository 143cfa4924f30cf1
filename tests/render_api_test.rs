//! Integration tests for the render public API.

use kable::concept::ConceptResolver;
use kable::render::{identity, RenderEngine, RenderOptions};
use kable::repositories::{
    AuthPair, FetchError, FetchedTree, Registry, SourceDescriptor, SourceFetcher,
};
use kable::{Kable, KableError, RenderRequest};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const GRAFANA_RENDERED: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: test
spec:
  minReadySeconds: 10
  replicas: 2
  revisionHistoryLimit: 10
  selector:
    matchLabels:
      name: test
  template:
    metadata:
      labels:
        name: test
    spec:
      containers:
      - image: grafana/grafana
        imagePullPolicy: IfNotPresent
        name: grafana
        ports:
        - containerPort: 10330
          name: ui
---
apiVersion: v1
kind: Service
metadata:
  labels:
    name: test
  name: test
spec:
  ports:
  - name: grafana-ui
    port: 10330
    targetPort: 10330
  selector:
    name: test
"#;

const LOCAL_RENDERED: &str = "apiVersion: v1
kind: Test
metadata:
  name: test
  namespace: Option 1
";

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/concepts")
}

/// Serves the fixture tree as the checkout of every source.
struct FixtureFetcher {
    calls: Mutex<Vec<(String, Option<String>, bool)>>,
}

impl FixtureFetcher {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl SourceFetcher for FixtureFetcher {
    fn fetch(
        &self,
        url: &str,
        git_ref: Option<&str>,
        auth: Option<&AuthPair>,
    ) -> Result<FetchedTree, FetchError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            git_ref.map(str::to_string),
            auth.is_some(),
        ));
        Ok(FetchedTree {
            local_path: fixtures(),
            commit_sha: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".into(),
        })
    }
}

fn fixture_kable() -> (Kable, Arc<FixtureFetcher>) {
    let fetcher = Arc::new(FixtureFetcher::new());
    let kable = Kable::new(
        Registry::in_memory(),
        ConceptResolver::new(fetcher.clone()),
        RenderEngine::default(),
    );
    (kable, fetcher)
}

fn grafana_request() -> RenderRequest {
    RenderRequest::new("apps/grafana@demo")
        .repository(SourceDescriptor::new("demo", "https://example/demo-concepts").with_ref(""))
        .input("instanceName", "test")
        .input("nameSelection", "Option 1")
        .target("yaml")
        .options(RenderOptions {
            single: true,
            ..Default::default()
        })
}

#[test]
fn renders_grafana_concept_from_source() {
    let (kable, fetcher) = fixture_kable();
    let output = kable.render_concept(&grafana_request()).unwrap();

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.print(), GRAFANA_RENDERED);
    assert_eq!(output.identity, identity(GRAFANA_RENDERED.as_bytes()));

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(
        calls.as_slice(),
        &[("https://example/demo-concepts".to_string(), None, false)]
    );
}

#[test]
fn split_render_keeps_two_documents() {
    let (kable, _) = fixture_kable();
    let request = grafana_request().options(RenderOptions::default());
    let output = kable.render_concept(&request).unwrap();

    assert_eq!(output.documents.len(), 2);
    assert!(output.documents[0].content.contains("kind: Deployment"));
    assert!(output.documents[1].content.contains("kind: Service"));
    assert_eq!(output.identity, identity(GRAFANA_RENDERED.as_bytes()));
}

#[test]
fn rendering_is_deterministic() {
    let (kable, _) = fixture_kable();
    let first = kable.render_concept(&grafana_request()).unwrap();
    let second = kable.render_concept(&grafana_request()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn credentials_reach_the_fetcher() {
    let (kable, fetcher) = fixture_kable();
    let request = RenderRequest::new("apps/grafana@private")
        .repository(
            SourceDescriptor::new("private", "https://example/private-concepts")
                .with_ref("main")
                .with_auth("bot", "token"),
        )
        .input("instanceName", "test");

    kable.render_concept(&request).unwrap();

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(calls[0].1.as_deref(), Some("main"));
    assert!(calls[0].2);
}

#[test]
fn missing_required_input_fails_render() {
    let (kable, _) = fixture_kable();
    let request = RenderRequest::new("apps/grafana@demo")
        .repository(SourceDescriptor::new("demo", "https://example/demo-concepts"));

    let err = kable.render_concept(&request).unwrap_err();
    assert!(matches!(err, KableError::RenderFailed { .. }));
}

#[test]
fn select_outside_options_fails_render() {
    let (kable, _) = fixture_kable();
    let request = grafana_request().input("nameSelection", "Option 3");
    let err = kable.render_concept(&request).unwrap_err();
    assert!(matches!(err, KableError::RenderFailed { .. }));
}

#[test]
fn unknown_concept_path_is_not_found() {
    let (kable, _) = fixture_kable();
    let request = RenderRequest::new("apps/missing@demo")
        .repository(SourceDescriptor::new("demo", "https://example/demo-concepts"));
    let err = kable.render_concept(&request).unwrap_err();
    assert!(matches!(err, KableError::ConceptNotFound { .. }));
}

#[test]
fn renders_local_concept() {
    let (kable, fetcher) = fixture_kable();
    let inputs = vec![
        ("instanceName".to_string(), "test".to_string()),
        ("nameSelection".to_string(), "Option 1".to_string()),
    ];
    let output = kable
        .render_local_concept(fixtures().join("local"), &inputs, &[], "")
        .unwrap();

    assert_eq!(output.print(), LOCAL_RENDERED);
    assert!(fetcher.calls.lock().unwrap().is_empty());
}

#[test]
fn local_concept_as_json_line() {
    let (kable, _) = fixture_kable();
    let inputs = vec![("instanceName".to_string(), "test".to_string())];
    let output = kable
        .render_local_concept(fixtures().join("local"), &inputs, &[], "json")
        .unwrap();

    insta::assert_snapshot!(
        output.print().trim_end(),
        @r#"{"apiVersion":"v1","kind":"Test","metadata":{"name":"test","namespace":"Option 2"}}"#
    );
}

#[test]
fn json_input_is_coerced_before_expansion() {
    let temp = TempDir::new().unwrap();
    let concept = temp.path().join("flags");
    fs::create_dir_all(concept.join("templates")).unwrap();
    fs::write(
        concept.join("concept.yaml"),
        "name: flags\ninputs:\n  flag:\n    type: bool\n  settings:\n    type: map\n",
    )
    .unwrap();
    fs::write(
        concept.join("templates/cm.yaml"),
        "kind: ConfigMap\nenabled: ${flag}\nhost: ${settings.host}\nport: ${settings.port}\n",
    )
    .unwrap();

    let (kable, _) = fixture_kable();
    let inputs = vec![
        ("flag".to_string(), "true".to_string()),
        (
            "settings".to_string(),
            r#"{"host":"db","port":5432}"#.to_string(),
        ),
    ];
    let output = kable.render_local_concept(&concept, &inputs, &[], "yaml").unwrap();
    assert_eq!(
        output.print(),
        "kind: ConfigMap\nenabled: true\nhost: db\nport: 5432\n"
    );
}

#[test]
fn array_input_is_rejected() {
    let (kable, _) = fixture_kable();
    let inputs = vec![("instanceName".to_string(), "[1,2]".to_string())];
    let err = kable
        .render_local_concept(fixtures().join("local"), &inputs, &[], "")
        .unwrap_err();
    assert!(matches!(err, KableError::UnsupportedValueType { .. }));
}

#[test]
fn directory_without_templates_is_not_found() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("concept.yaml"), "name: empty\n").unwrap();

    let (kable, _) = fixture_kable();
    let err = kable
        .render_local_concept(temp.path(), &[], &[], "")
        .unwrap_err();
    assert!(matches!(err, KableError::ConceptNotFound { .. }));
}

// Serialize git-process tests to avoid flaky failures under parallel execution
static GIT_LOCK: Mutex<()> = Mutex::new(());

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let path = entry.unwrap().path();
        let target = to.join(path.file_name().unwrap());
        if path.is_dir() {
            copy_dir(&path, &target);
        } else {
            fs::copy(&path, &target).unwrap();
        }
    }
}

/// Bare repository whose `main` holds the fixture concepts, tagged `v1`.
fn fixture_repo(parent: &Path) -> PathBuf {
    let bare = parent.join("demo-concepts.git");
    let work = parent.join("work");
    git(
        parent,
        &["init", "--bare", "--initial-branch=main", &bare.to_string_lossy()],
    );
    git(
        parent,
        &["clone", &bare.to_string_lossy(), &work.to_string_lossy()],
    );
    for (key, val) in [("user.name", "Test"), ("user.email", "test@test.com")] {
        git(&work, &["config", key, val]);
    }
    copy_dir(&fixtures(), &work);
    git(&work, &["add", "."]);
    git(&work, &["commit", "-m", "Add concepts"]);
    git(&work, &["tag", "v1"]);
    git(&work, &["push", "origin", "HEAD:main", "--tags"]);
    bare
}

#[test]
fn renders_from_git_repository_at_branch_and_tag() {
    let _lock = GIT_LOCK.lock().unwrap();
    let temp = TempDir::new().unwrap();
    let bare = fixture_repo(temp.path());
    let url = bare.to_string_lossy().to_string();
    let kable = Kable::in_memory(temp.path().join("clones"));

    for git_ref in ["", "main", "v1"] {
        let request = grafana_request()
            .repository(SourceDescriptor::new("demo", &url).with_ref(git_ref));
        let output = kable.render_concept(&request).unwrap();
        assert_eq!(output.print(), GRAFANA_RENDERED, "ref '{}'", git_ref);
    }
}

#[test]
fn git_source_with_unknown_ref_fails_fetch() {
    let _lock = GIT_LOCK.lock().unwrap();
    let temp = TempDir::new().unwrap();
    let bare = fixture_repo(temp.path());
    let kable = Kable::in_memory(temp.path().join("clones"));

    let request = RenderRequest::new("apps/grafana@demo")
        .repository(
            SourceDescriptor::new("demo", bare.to_string_lossy()).with_ref("does-not-exist"),
        )
        .input("instanceName", "test");
    let err = kable.render_concept(&request).unwrap_err();
    assert!(matches!(err, KableError::SourceFetchFailed { .. }));
}
