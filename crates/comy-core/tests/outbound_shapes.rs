//! Outbound envelope shape tests (what clients actually receive).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use comy_core::protocol::{
    AuthenticationResponse, CommandResponse, ServerInfo, ServerMessage,
};

fn to_value(msg: &ServerMessage) -> serde_json::Value {
    serde_json::from_str(&msg.to_json().unwrap()).unwrap()
}

#[test]
fn unknown_command_response() {
    let msg = ServerMessage::CommandResponse(CommandResponse::not_found("Foo"));
    assert_eq!(
        to_value(&msg),
        json!({
            "type": "CommandResponse",
            "commandName": "Foo",
            "result": {
                "message": "",
                "status": { "success": false, "message": "Command named \"Foo\" not found" }
            }
        })
    );
}

#[test]
fn server_info_response() {
    let msg = ServerMessage::ServerInfo(ServerInfo {
        server_name: "Test server".into(),
        is_secured: true,
    });
    assert_eq!(
        to_value(&msg),
        json!({ "type": "ServerInfo", "serverName": "Test server", "isSecured": true })
    );
}

#[test]
fn authentication_fields_are_always_present() {
    let msg = ServerMessage::Authentication(AuthenticationResponse::wrong_credentials());
    let v = to_value(&msg);
    assert_eq!(v["type"], "Authentication");
    assert_eq!(v["code"], 401);
    assert!(v["token"].is_null());
    assert!(v["refreshToken"].is_null());
    assert!(v["username"].is_null());
    assert_eq!(v["wrongCredentialsError"], true);
    assert_eq!(v["tokenExpiredError"], false);
}

#[test]
fn embedded_auth_error_round_trips() {
    let mut resp = CommandResponse::new("Secret", comy_core::protocol::CommandResult::failure("Permissions missing"));
    resp.auth_error = Some(AuthenticationResponse::unauthorized(None, true));
    let msg = ServerMessage::CommandResponse(resp);

    let back: ServerMessage = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    let ServerMessage::CommandResponse(back) = back else {
        panic!("expected CommandResponse");
    };
    let auth = back.auth_error.expect("auth error kept");
    assert_eq!(auth.code, 401);
    assert!(auth.token_expired_error);
}
