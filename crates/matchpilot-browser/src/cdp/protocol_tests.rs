use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Page.navigate".to_string(),
        params: Some(serde_json::json!({"url": "http://gamemaster.stanford.edu/homepage/signin.php"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Page.navigate"));
    assert!(json.contains("\"sessionId\":\"S1\""));
}

#[test]
fn test_cdp_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 7,
        method: "Target.getTargets".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert_eq!(json, r#"{"id":7,"method":"Target.getTargets"}"#);
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"frameId": "abc", "loaderId": "L1"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert_eq!(resp.result.unwrap()["loaderId"], "L1");
}

#[test]
fn test_cdp_error_response_deserialize() {
    let json = r#"{"id": 3, "error": {"code": -32000, "message": "No node with given id found"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    let error = resp.error.unwrap();
    assert_eq!(error.code, -32000);
    assert!(error.data.is_none());
}

#[test]
fn test_dialog_event_deserialize() {
    let json = r#"{
        "method": "Page.javascriptDialogOpening",
        "sessionId": "S1",
        "params": {"url": "http://x/manager.php", "message": "All players ready", "type": "alert", "hasBrowserHandler": false, "defaultPrompt": ""}
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert!(resp.id.is_none());
    let dialog: DialogOpening = serde_json::from_value(resp.params.unwrap()).unwrap();
    assert_eq!(dialog.dialog_type, "alert");
    assert_eq!(dialog.message, "All players ready");
}

#[test]
fn test_target_info_deserialize() {
    let json = r#"{
        "targetId": "T2",
        "type": "page",
        "title": "Manager",
        "url": "http://gamemaster.stanford.edu/homepage/manager.php?game=tictactoe3",
        "attached": false,
        "openerId": "T1",
        "canAccessOpener": false,
        "browserContextId": "C1"
    }"#;
    let info: TargetInfo = serde_json::from_str(json).unwrap();
    assert!(info.is_page());
    assert_eq!(info.opener_id.as_deref(), Some("T1"));
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "Test",
        "url": "about:blank",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert_eq!(info.page_type, "page");
}

#[test]
fn test_mouse_button_serialize() {
    let json = serde_json::to_string(&MouseButton::Left).unwrap();
    assert_eq!(json, "\"left\"");
}
