use super::*;

fn event(method: &str, params: serde_json::Value) -> CdpResponse {
    serde_json::from_value(serde_json::json!({
        "method": method,
        "params": params,
    }))
    .unwrap()
}

#[test]
fn test_pattern_matches_post_under_prefix() {
    let pattern = RequestPattern::post("/mercury-editor/");
    assert!(pattern.matches("POST", "http://localhost/mercury-editor/ajax"));
    assert!(pattern.matches("post", "https://site.test/mercury-editor/layout/update?x=1"));
    assert!(!pattern.matches("GET", "http://localhost/mercury-editor/ajax"));
    assert!(!pattern.matches("POST", "http://localhost/other/ajax"));
}

#[test]
fn test_pattern_matches_relative_url() {
    let pattern = RequestPattern::post("/mercury-editor/");
    assert!(pattern.matches("POST", "/mercury-editor/ajax"));
    assert!(!pattern.matches("POST", "/admin/ajax"));
}

#[test]
fn test_observe_event_pairs_request_with_response() {
    let pattern = RequestPattern::post("/mercury-editor/");
    let mut in_flight = HashMap::new();

    let sent = event(
        "Network.requestWillBeSent",
        serde_json::json!({
            "requestId": "req-1",
            "request": {"method": "POST", "url": "http://localhost/mercury-editor/ajax"},
        }),
    );
    assert!(observe_event(&pattern, &mut in_flight, &sent).is_none());
    assert_eq!(in_flight.len(), 1);

    let received = event(
        "Network.responseReceived",
        serde_json::json!({
            "requestId": "req-1",
            "response": {"url": "http://localhost/mercury-editor/ajax", "status": 200},
        }),
    );
    let response = observe_event(&pattern, &mut in_flight, &received).unwrap();
    assert_eq!(response.request_id, "req-1");
    assert_eq!(response.status, 200);
    assert!(in_flight.is_empty());
}

#[test]
fn test_observe_event_ignores_unmatched_requests() {
    let pattern = RequestPattern::post("/mercury-editor/");
    let mut in_flight = HashMap::new();

    // GET under the prefix never enters the in-flight set.
    let sent = event(
        "Network.requestWillBeSent",
        serde_json::json!({
            "requestId": "req-2",
            "request": {"method": "GET", "url": "http://localhost/mercury-editor/preview"},
        }),
    );
    assert!(observe_event(&pattern, &mut in_flight, &sent).is_none());

    // A response for an unknown request id resolves nothing.
    let received = event(
        "Network.responseReceived",
        serde_json::json!({
            "requestId": "req-2",
            "response": {"url": "http://localhost/mercury-editor/preview", "status": 200},
        }),
    );
    assert!(observe_event(&pattern, &mut in_flight, &received).is_none());
}
