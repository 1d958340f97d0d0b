//! Scripted mock CDP server emulating the editor page.
//!
//! Speaks just enough of the protocol for the command flows under test: it
//! registers a node id for every selector query, encodes that node id into
//! the box-model quad it hands back, and decodes clicks from the mouse-event
//! coordinates. Clicks on editor controls mutate a small page model
//! (components, dialog, component-type list) and may queue the
//! request/response event pair of one server round trip.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

pub const SESSION_ID: &str = "mock-session";

/// Route the crate's tracing output through the test harness, filtered by
/// `RUST_LOG`. Safe to call from every test; only the first call installs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
pub struct MockComponent {
    pub uuid: String,
    pub text: String,
}

pub fn comp(uuid: &str, text: &str) -> MockComponent {
    MockComponent {
        uuid: uuid.to_string(),
        text: text.to_string(),
    }
}

/// Mutable page model behind the mock.
#[derive(Debug, Default)]
pub struct EditorState {
    pub components: Vec<MockComponent>,
    pub dialog_open: bool,
    pub dialog_form_action: Option<String>,
    pub component_list_open: bool,
    /// Component the "server" inserts when a create form is saved.
    pub pending_component: Option<MockComponent>,
    pub rich_text_present: bool,
    pub delete_confirm_visible: bool,
    pub delete_target: Option<String>,
    pub page_saved: bool,
    pub page_deleted: bool,
    pub exited: bool,
    /// Selectors clicked via coordinate-decoded mouse events, in order.
    pub clicked: Vec<String>,
    /// Selectors queried via DOM.querySelector, in order.
    pub queried: Vec<String>,
    /// Raw expressions passed to Runtime.evaluate, in order.
    pub evaluated: Vec<String>,
    /// Values handed to the rich-text widget via Runtime.callFunctionOn.
    pub rich_text_set: Vec<String>,
    /// Text inserted via Input.insertText, in order.
    pub typed: Vec<String>,
    nodes: HashMap<i64, String>,
    next_node: i64,
    request_seq: u64,
}

impl EditorState {
    fn new(components: Vec<MockComponent>) -> Self {
        Self {
            components,
            rich_text_present: true,
            next_node: 100,
            ..Self::default()
        }
    }

    fn register_node(&mut self, selector: &str) -> i64 {
        self.next_node += 1;
        self.nodes.insert(self.next_node, selector.to_string());
        self.next_node
    }

    fn selector_exists(&self, selector: &str) -> bool {
        if selector == ".lpb-component-list" {
            self.component_list_open
        } else if selector == "mercury-dialog.lpb-dialog" {
            self.dialog_open
        } else if selector.starts_with(".field--name-field-") {
            self.rich_text_present
        } else if let Some(uuid) = leading_uuid(selector) {
            self.components.iter().any(|c| c.uuid == uuid)
        } else {
            true
        }
    }

    fn round_trip_events(&mut self) -> Vec<Value> {
        self.request_seq += 1;
        let request_id = format!("req-{}", self.request_seq);
        let url = "http://127.0.0.1/mercury-editor/ajax";
        vec![
            json!({
                "method": "Network.requestWillBeSent",
                "sessionId": SESSION_ID,
                "params": {
                    "requestId": request_id,
                    "request": {"method": "POST", "url": url},
                },
            }),
            json!({
                "method": "Network.responseReceived",
                "sessionId": SESSION_ID,
                "params": {
                    "requestId": request_id,
                    "response": {"url": url, "status": 200},
                },
            }),
        ]
    }

    fn on_click(&mut self, selector: &str) -> Vec<Value> {
        if selector.contains(".lpb-btn--add") {
            self.component_list_open = true;
            vec![]
        } else if selector.starts_with(".type-") {
            self.component_list_open = false;
            self.dialog_open = true;
            self.dialog_form_action =
                Some("/mercury-editor/layout-paragraphs/add/text".to_string());
            vec![]
        } else if selector.starts_with("input[value=") {
            self.round_trip_events()
        } else if selector.contains(".lpb-btn--save") {
            let is_edit = self
                .dialog_form_action
                .as_deref()
                .map(|a| a.contains("/edit/"))
                .unwrap_or(false);
            if !is_edit {
                if let Some(created) = self.pending_component.take() {
                    self.components.push(created);
                }
            }
            self.dialog_open = false;
            self.round_trip_events()
        } else if selector.contains(".lpb-btn--delete") {
            if let Some(uuid) = self.delete_target.take() {
                self.components.retain(|c| c.uuid != uuid);
            }
            self.dialog_open = false;
            vec![]
        } else if selector.contains(".lpb-edit") {
            self.dialog_open = true;
            self.dialog_form_action = leading_uuid(selector)
                .map(|uuid| format!("/mercury-editor/layout-paragraphs/edit/{uuid}"));
            self.round_trip_events()
        } else if selector.contains(".lpb-delete") {
            self.delete_target = leading_uuid(selector);
            self.dialog_open = true;
            self.dialog_form_action = None;
            vec![]
        } else if selector == "#me-save-btn" {
            self.page_saved = true;
            self.round_trip_events()
        } else if selector == "#me-done-btn" {
            self.exited = true;
            vec![]
        } else {
            vec![]
        }
    }
}

/// Extract the uuid from a selector starting with `[data-uuid="..."]`.
fn leading_uuid(selector: &str) -> Option<String> {
    let rest = selector.strip_prefix("[data-uuid=\"")?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn document_tree() -> Value {
    json!({
        "root": {
            "nodeId": 1,
            "backendNodeId": 1,
            "nodeType": 9,
            "nodeName": "#document",
            "children": [{
                "nodeId": 2,
                "backendNodeId": 2,
                "nodeType": 1,
                "nodeName": "IFRAME",
                "attributes": ["id", "me-preview"],
                "contentDocument": {
                    "nodeId": 3,
                    "backendNodeId": 3,
                    "nodeType": 9,
                    "nodeName": "#document",
                },
            }],
        }
    })
}

fn evaluate(state: &mut EditorState, params: &Value) -> Value {
    let expression = params["expression"].as_str().unwrap_or_default().to_string();
    state.evaluated.push(expression.clone());

    let value = if expression.contains("readyState") {
        json!("complete")
    } else if expression.contains("getAttribute(\"action\")") {
        if state.dialog_open {
            json!(state.dialog_form_action.clone().unwrap_or_default())
        } else {
            Value::Null
        }
    } else if expression.contains("querySelectorAll(\"a\")") {
        state.delete_confirm_visible = true;
        json!(true)
    } else if expression.contains(".button--primary") {
        if state.delete_confirm_visible {
            state.page_deleted = true;
            json!(true)
        } else {
            json!(false)
        }
    } else if expression.contains("contentDocument") {
        Value::Array(
            state
                .components
                .iter()
                .map(|c| json!({"uuid": c.uuid, "text": c.text}))
                .collect(),
        )
    } else if expression.contains("location.href") {
        json!("http://127.0.0.1/node/1")
    } else {
        Value::Null
    };

    json!({"result": {"type": "object", "value": value}})
}

fn handle(state: &mut EditorState, method: &str, params: &Value) -> (Value, Vec<Value>) {
    match method {
        "Target.attachToTarget" => (json!({"sessionId": SESSION_ID}), vec![]),
        "Page.enable" | "DOM.enable" | "Runtime.enable" | "Network.enable" => (json!({}), vec![]),
        "DOM.getDocument" => (document_tree(), vec![]),
        "DOM.querySelector" => {
            let selector = params["selector"].as_str().unwrap_or_default();
            state.queried.push(selector.to_string());
            if state.selector_exists(selector) {
                let node_id = state.register_node(selector);
                (json!({"nodeId": node_id}), vec![])
            } else {
                (json!({"nodeId": 0}), vec![])
            }
        }
        "DOM.querySelectorAll" => {
            let selector = params["selector"].as_str().unwrap_or_default().to_string();
            state.queried.push(selector.clone());
            let node_ids: Vec<i64> = if selector == "[data-uuid]" {
                let count = state.components.len();
                (0..count).map(|_| state.register_node(&selector)).collect()
            } else if state.selector_exists(&selector) {
                vec![state.register_node(&selector)]
            } else {
                vec![]
            };
            (json!({"nodeIds": node_ids}), vec![])
        }
        "DOM.resolveNode" => {
            let node_id = params["nodeId"].as_i64().unwrap_or(0);
            (
                json!({"object": {"type": "object", "objectId": format!("obj-{}", node_id)}}),
                vec![],
            )
        }
        "DOM.getBoxModel" => {
            let node_id = params["nodeId"].as_i64().unwrap_or(0);
            let x = (node_id * 10) as f64;
            let quad = json!([x - 4.0, 0.0, x + 4.0, 0.0, x + 4.0, 10.0, x - 4.0, 10.0]);
            (
                json!({"model": {
                    "content": quad,
                    "padding": quad,
                    "border": quad,
                    "margin": quad,
                    "width": 8,
                    "height": 10,
                }}),
                vec![],
            )
        }
        "DOM.focus" | "Input.dispatchKeyEvent" => (json!({}), vec![]),
        "Input.insertText" => {
            let text = params["text"].as_str().unwrap_or_default().to_string();
            state.typed.push(text);
            (json!({}), vec![])
        }
        "Input.dispatchMouseEvent" => {
            if params["type"] == "mousePressed" {
                let node_id = (params["x"].as_f64().unwrap_or(0.0) / 10.0).round() as i64;
                if let Some(selector) = state.nodes.get(&node_id).cloned() {
                    state.clicked.push(selector.clone());
                    let events = state.on_click(&selector);
                    return (json!({}), events);
                }
            }
            (json!({}), vec![])
        }
        "Runtime.evaluate" => (evaluate(state, params), vec![]),
        "Runtime.callFunctionOn" => {
            let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
            let value = if declaration.contains("ckeditorInstance") {
                if state.rich_text_present {
                    if let Some(arg) = params["arguments"][0]["value"].as_str() {
                        state.rich_text_set.push(arg.to_string());
                    }
                    json!(true)
                } else {
                    json!(false)
                }
            } else {
                Value::Null
            };
            (json!({"result": {"type": "object", "value": value}}), vec![])
        }
        _ => (json!({}), vec![]),
    }
}

/// Running mock server plus a handle on its page model.
pub struct MockEditor {
    state: Arc<Mutex<EditorState>>,
    pub ws_url: String,
}

impl MockEditor {
    pub async fn start(components: Vec<MockComponent>) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(EditorState::new(components)));

        let shared = state.clone();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("ws handshake");
            let (mut tx, mut rx) = ws.split();

            while let Some(Ok(message)) = rx.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let request: Value = serde_json::from_str(text.as_str()).expect("request json");
                let id = request["id"].as_u64().expect("request id");
                let method = request["method"].as_str().unwrap_or_default().to_string();
                let params = request["params"].clone();

                let (result, events) = {
                    let mut state = shared.lock().expect("state lock");
                    handle(&mut state, &method, &params)
                };

                let reply = json!({"id": id, "result": result});
                if tx.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
                for event in events {
                    if tx.send(Message::Text(event.to_string().into())).await.is_err() {
                        return;
                    }
                }
            }
        });

        Self {
            state,
            ws_url: format!("ws://{}", addr),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().expect("state lock")
    }
}
