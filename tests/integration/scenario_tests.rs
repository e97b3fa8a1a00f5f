//! Scenario Tests
//!
//! Runs scenarios against a mock API:
//! - Step recording for a passing lifecycle
//! - Fixture cleanup after a failing step
//! - Error precedence when cleanup fails too
//! - Full walkthroughs against stateful mock resources

use dockhealth_client::scenarios::{self, ScenarioContext};
use dockhealth_client::{middleware, DockError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::support::{mount_token, test_config, ORGANIZATION_ID, USER_ID};

/// Answers with the request body plus an `id`, like the API's create/update
struct Echo(&'static str);

impl Respond for Echo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body: Value = serde_json::from_slice(&request.body).unwrap();
        body["id"] = json!(self.0);
        ResponseTemplate::new(200).set_body_json(body)
    }
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn merge(target: &mut Value, fields: &Value) {
    if let Some(fields) = fields.as_object() {
        for (key, value) in fields {
            target[key.as_str()] = value.clone();
        }
    }
}

type WriteHook = Arc<dyn Fn(&mut Value) + Send + Sync>;

/// In-memory resource collection
///
/// Create echoes the body with a fresh `new-<kind>-<n>` id, PATCH and PUT
/// merge into the stored item, DELETE removes it and answers with the item
/// plus `deleted` fields.
#[derive(Clone)]
struct Collection {
    kind: &'static str,
    items: Arc<Mutex<BTreeMap<String, Value>>>,
    next_id: Arc<AtomicUsize>,
    deleted: Value,
    on_write: Option<WriteHook>,
}

impl Collection {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicUsize::new(0)),
            deleted: json!({}),
            on_write: None,
        }
    }

    fn deleted_with(mut self, fields: Value) -> Self {
        self.deleted = fields;
        self
    }

    fn on_write(mut self, hook: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        self.on_write = Some(Arc::new(hook));
        self
    }

    async fn mount(&self, server: &MockServer, collection_path: &str) {
        Mock::given(path_regex(format!(
            r"^/api/v1{}(/new-{}-\d+)?$",
            collection_path, self.kind
        )))
        .respond_with(self.clone())
        .mount(server)
        .await;
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }

    fn written(&self, item: &mut Value) {
        if let Some(hook) = &self.on_write {
            hook(item);
        }
    }
}

impl Respond for Collection {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let prefix = format!("new-{}-", self.kind);
        let id = request
            .url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|segment| segment.starts_with(&prefix))
            .map(str::to_string);
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let mut items = self.items.lock();

        match (request.method.as_str(), id) {
            ("POST", None) => {
                let id = format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                let mut item = body;
                item["id"] = json!(id);
                self.written(&mut item);
                items.insert(id, item.clone());
                ok(item)
            }
            ("GET", None) => ok(json!(items.values().cloned().collect::<Vec<_>>())),
            ("DELETE", Some(id)) => match items.remove(&id) {
                Some(mut item) => {
                    merge(&mut item, &self.deleted);
                    ok(item)
                }
                None => ResponseTemplate::new(404),
            },
            ("GET", Some(id)) => match items.get(&id) {
                Some(item) => ok(item.clone()),
                None => ResponseTemplate::new(404),
            },
            ("PATCH" | "PUT", Some(id)) => match items.get_mut(&id) {
                Some(item) => {
                    merge(item, &body);
                    self.written(item);
                    ok(item.clone())
                }
                None => ResponseTemplate::new(404),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}

/// A select custom field applying option patches: replace, then delete, then add
#[derive(Clone, Default)]
struct SelectField {
    field: Arc<Mutex<Option<Value>>>,
    next_option: Arc<AtomicUsize>,
    patches: Arc<AtomicUsize>,
}

impl SelectField {
    fn option(&self, option: &Value) -> Value {
        let n = self.next_option.fetch_add(1, Ordering::SeqCst) + 1;
        json!({
            "id": format!("option-{}", n),
            "name": option["name"],
            "description": option["description"],
        })
    }

    fn options(&self, options: &Value) -> Vec<Value> {
        options
            .as_array()
            .map(|options| options.iter().map(|o| self.option(o)).collect())
            .unwrap_or_default()
    }
}

impl Respond for SelectField {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let mut field = self.field.lock();

        match request.method.as_str() {
            "POST" => {
                let mut created = body.clone();
                created["id"] = json!("cf-1");
                created["options"] = json!(self.options(&body["options"]));
                *field = Some(created.clone());
                ok(created)
            }
            "PATCH" => {
                let Some(current) = field.as_mut() else {
                    return ResponseTemplate::new(404);
                };
                let mut options = current["options"].as_array().cloned().unwrap_or_default();
                if body["options"].is_array() {
                    options = self.options(&body["options"]);
                }
                if let Some(deleted) = body["optionsToDelete"].as_array() {
                    options.retain(|o| !deleted.iter().any(|d| d["id"] == o["id"]));
                }
                options.extend(self.options(&body["optionsToAdd"]));
                current["options"] = json!(options);
                self.patches.fetch_add(1, Ordering::SeqCst);
                ok(current.clone())
            }
            "GET" => match field.as_ref() {
                Some(current) => ok(current.clone()),
                None => ResponseTemplate::new(404),
            },
            "DELETE" => match field.take() {
                Some(current) => ok(current),
                None => ResponseTemplate::new(404),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}

async fn mount_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/user/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": USER_ID })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/organization/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": ORGANIZATION_ID })))
        .mount(server)
        .await;
}

async fn mount_patient(server: &MockServer, update: impl Respond + 'static, deletes: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/patient"))
        .respond_with(Echo("p-1"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/patient/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "p-1" })))
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/patient/p-1"))
        .respond_with(update)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/patient/p-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "p-1", "active": false })),
        )
        .expect(deletes)
        .mount(server)
        .await;
}

async fn context(server: &MockServer) -> ScenarioContext {
    mount_token(server).await;
    ScenarioContext::new(test_config(&server.uri())).unwrap()
}

#[tokio::test]
async fn test_lifecycle_passes() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;
    mount_identity(&server).await;
    mount_patient(&server, Echo("p-1"), 1).await;

    let report = scenarios::lifecycle(&ctx).await.unwrap();

    assert_eq!(report.name, "lifecycle");
    assert_eq!(
        report.steps,
        vec![
            "get user",
            "get current organization",
            "create patient",
            "get patient",
            "update patient",
            "delete patient",
        ]
    );
    assert_eq!(report.created, vec!["patient:p-1"]);
}

#[tokio::test]
async fn test_failed_step_cleans_up_fixtures() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;
    mount_identity(&server).await;
    mount_patient(
        &server,
        ResponseTemplate::new(500).set_body_string("boom"),
        1,
    )
    .await;

    let err = scenarios::lifecycle(&ctx).await.unwrap_err();

    match err {
        DockError::UnexpectedStatus {
            method, actual, ..
        } => {
            assert_eq!(method, "PATCH");
            assert_eq!(actual, 500);
        }
        other => panic!("unexpected error {:?}", other),
    }
    // The DELETE expectation is verified when the mock server drops
}

#[tokio::test]
async fn test_step_error_wins_over_cleanup_error() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;
    mount_identity(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/profile/type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "pt-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/profile/type/pt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "pt-1" })))
        .mount(&server)
        .await;
    // Fails in the scenario and again during cleanup
    Mock::given(method("DELETE"))
        .and(path("/api/v1/profile/type/pt-1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("in use"))
        .expect(2)
        .mount(&server)
        .await;

    let err = scenarios::profile_type(&ctx).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_missing_identifier_fails_before_any_call() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let mut config = test_config(&server.uri());
    config.account.user_identifier = None;
    let ctx = ScenarioContext::new(config).unwrap();

    let err = scenarios::task(&ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "USER_IDENTIFIER is undefined!");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_scenario() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;

    let err = scenarios::run("does_not_exist", &ctx).await.unwrap_err();
    assert!(matches!(err, DockError::Validation(_)));
}

#[tokio::test]
async fn test_workflow_deploy_requires_task_list() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;

    let err = scenarios::run("workflow_deploy", &ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "TASK_LIST_IDENTIFIER is undefined!");
}

#[tokio::test]
async fn test_single_select_field_option_patches() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;
    mount_identity(&server).await;
    let field = SelectField::default();
    Mock::given(path_regex(r"^/api/v1/configuration/field(/cf-1)?$"))
        .respond_with(field.clone())
        .mount(&server)
        .await;

    let report = scenarios::single_select_field(&ctx).await.unwrap();

    assert_eq!(
        report.steps,
        vec![
            "get user",
            "get current organization",
            "create select custom field",
            "add option",
            "empty patch",
            "replace options",
            "clear options",
            "add option to empty field",
            "delete option",
            "add another option",
            "add and delete in one patch",
            "get custom field",
            "delete last option",
            "delete custom field",
        ]
    );
    assert_eq!(field.patches.load(Ordering::SeqCst), 9);
    assert!(field.field.lock().is_none());
}

#[tokio::test]
async fn test_workflow_decision_selects_outcome_by_name() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let mut config = test_config(&server.uri());
    config.account.task_list_identifier = Some("list-1".to_string());
    config.account.task_group_identifier = Some("group-1".to_string());
    let ctx = ScenarioContext::new(config).unwrap();

    let templates = Collection::new("template");
    templates.mount(&server, "/taskWorkflowTemplate").await;
    let tasks = Collection::new("task");
    tasks.mount(&server, "/task").await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/outcome/new-task-1$"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let name = body["name"].as_str().unwrap().to_string();
            ok(json!({
                "taskOutcomeIdentifier": format!("template-{}", name.replace(' ', "-")),
                "name": name,
            }))
        })
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/link/"))
        .respond_with(ok(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    // Deployment assigns new outcome ids, listed in a different order
    Mock::given(method("POST"))
        .and(path("/api/v1/taskWorkflow"))
        .respond_with(ok(json!({
            "id": "wf-1",
            "taskList": { "id": "list-1" },
            "taskGroup": { "id": "group-1" },
            "tasks": [{
                "id": "deployed-parent",
                "taskOutcomes": [
                    { "name": "Task Outcome 2", "taskOutcomeIdentifier": "deployed-2" },
                    { "name": "Task Outcome 1", "taskOutcomeIdentifier": "deployed-1" }
                ]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/select/deployed-1"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/taskWorkflow/wf-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let report = scenarios::workflow_decision(&ctx).await.unwrap();

    assert_eq!(
        report.steps,
        vec![
            "create workflow template",
            "add parent task to template",
            "add child task 1 to template",
            "add child task 2 to template",
            "create outcome Task Outcome 1",
            "create outcome Task Outcome 2",
            "link child task to outcome",
            "link child task to outcome",
            "deploy workflow",
            "select task outcome",
            "delete deployed workflow",
            "delete workflow template",
        ]
    );
    assert_eq!(templates.len(), 0);
    assert_eq!(tasks.len(), 3);
}

#[tokio::test]
async fn test_organization_walkthrough_passes() {
    let server = MockServer::start().await;
    let ctx = context(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/developer"))
        .respond_with(ok(json!({ "id": "dev-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/organization"))
        .respond_with(ok(json!([
            { "id": "org-other", "domain": "other.test" },
            { "id": ORGANIZATION_ID, "domain": "example.test" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/user"))
        .respond_with(ok(json!([{ "id": USER_ID, "email": "owner@example.test" }])))
        .mount(&server)
        .await;

    let organizations = Collection::new("organization");
    organizations.mount(&server, "/organization").await;
    let users = Collection::new("user").deleted_with(json!({ "active": false, "organizations": [] }));
    users.mount(&server, "/user").await;
    let patients = Collection::new("patient").deleted_with(json!({ "active": false }));
    patients.mount(&server, "/patient").await;
    let notes = Collection::new("note").deleted_with(json!({ "active": false }));
    notes.mount(&server, "/patient/note").await;

    let membership = r"^/api/v1/organization/[^/]+/user/new-user-1$";
    Mock::given(method("PATCH"))
        .and(path_regex(membership))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(membership))
        .respond_with(ok(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let report = scenarios::organization(&ctx).await.unwrap();

    assert_eq!(
        report.steps,
        vec![
            "get developer account",
            "find organization",
            "find user",
            "create organization",
            "update organization",
            "create user",
            "add user to organization",
            "confirm membership",
            "create patient",
            "create patient note",
            "list patient notes",
            "delete patient note",
            "delete patient",
            "remove user from organizations",
            "delete user",
            "delete organization",
        ]
    );
    assert_eq!(report.created.len(), 6);
    assert_eq!(organizations.len(), 0);
    assert_eq!(users.len(), 0);
    assert_eq!(patients.len(), 0);
    assert_eq!(notes.len(), 0);
}

/// Challenge the callback URL after every webhook write and mark the
/// webhook verified when the digest matches
fn spawn_verifier(
    webhooks: Collection,
    mut writes: mpsc::UnboundedReceiver<Value>,
    verified: Arc<AtomicUsize>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let http = reqwest::Client::new();
        while let Some(webhook) = writes.recv().await {
            let id = webhook["id"].as_str().unwrap_or_default().to_string();
            let url = webhook["url"].as_str().unwrap_or_default().to_string();
            let secret = webhook["secret"].as_str().unwrap_or_default().to_string();
            let message = format!("challenge-{}", verified.load(Ordering::SeqCst));

            let Ok(response) = http.get(&url).query(&[("message", &message)]).send().await else {
                continue;
            };
            let Ok(answer) = response.json::<Value>().await else {
                continue;
            };
            let expected = middleware::sign(secret.as_bytes(), message.as_bytes()).unwrap();
            if answer["digest"] == json!(expected) {
                if let Some(stored) = webhooks.items.lock().get_mut(&id) {
                    stored["verified"] = json!(true);
                }
                verified.fetch_add(1, Ordering::SeqCst);
            }
        }
    })
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn test_webhook_verified_through_callback_server() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let port = free_port();
    let mut config = test_config(&server.uri());
    config.callback.local_port = port;
    config.callback.url = Some(format!("http://127.0.0.1:{}/", port));
    config.scenario.settle_delay_ms = 500;
    let ctx = ScenarioContext::new(config).unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let webhooks = Collection::new("webhook").on_write(move |webhook| {
        webhook["verified"] = json!(false);
        let _ = tx.send(webhook.clone());
    });
    webhooks.mount(&server, "/webhook").await;
    let verified = Arc::new(AtomicUsize::new(0));
    let verifier = spawn_verifier(webhooks.clone(), rx, verified.clone());

    let report = scenarios::webhook(&ctx).await.unwrap();

    assert_eq!(
        report.steps,
        vec![
            "start callback server",
            "list webhooks",
            "create webhook",
            "webhook verified",
            "update webhook",
            "webhook verified",
            "delete webhook",
            "stop callback server",
        ]
    );
    assert_eq!(verified.load(Ordering::SeqCst), 2);
    assert_eq!(webhooks.len(), 0);
    verifier.abort();
}

/// A list that grows by one entry on every call
fn growing_list(calls: Arc<AtomicUsize>) -> impl Fn(&Request) -> ResponseTemplate {
    move |_: &Request| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        ok(json!(vec![json!({ "type": "UPDATE_ORGANIZATION" }); n]))
    }
}

#[tokio::test]
async fn test_webhook_events_notes_skipped_lookup() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let port = free_port();
    let mut config = test_config(&server.uri());
    config.callback.local_port = port;
    config.callback.url = Some(format!("http://127.0.0.1:{}/", port));
    let ctx = ScenarioContext::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/developer/organization"))
        .respond_with(ok(json!([{ "id": ORGANIZATION_ID, "domain": "example.test" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/user"))
        .respond_with(ok(json!([{ "id": USER_ID, "email": "owner@example.test" }])))
        .mount(&server)
        .await;

    let developer_webhooks = Collection::new("devhook");
    developer_webhooks
        .items
        .lock()
        .insert("new-devhook-0".to_string(), json!({ "id": "new-devhook-0" }));
    developer_webhooks.mount(&server, "/developer/webhook").await;

    // Events carry no identifiers, so the latest event cannot be fetched
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/event"))
        .respond_with(growing_list(Arc::new(AtomicUsize::new(0))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/developer/event/delivery"))
        .respond_with(growing_list(Arc::new(AtomicUsize::new(0))))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/api/v1/organization/{}", ORGANIZATION_ID)))
        .respond_with(Echo(ORGANIZATION_ID))
        .expect(1)
        .mount(&server)
        .await;
    let users = Collection::new("user").deleted_with(json!({ "organizations": [] }));
    users.mount(&server, "/user").await;
    // The new user is left to fixture cleanup
    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/organization/{}/user/new-user-1", ORGANIZATION_ID)))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let report = scenarios::webhook_events(&ctx).await.unwrap();

    assert_eq!(
        report.steps,
        vec![
            "start callback server",
            "find default organization",
            "find default user",
            "delete existing developer webhooks",
            "count today's events",
            "create developer webhook",
            "update organization",
            "organization update delivered",
            "create user",
            "user creation delivered",
            "stop callback server",
        ]
    );
    assert_eq!(report.notes.len(), 1);
    assert!(report.notes[0].starts_with("latest event lookup skipped"));
    assert_eq!(developer_webhooks.len(), 0);
    assert_eq!(users.len(), 0);
}
