//! Integration tests for the authenticated Slack transport.

use mockito::Matcher;
use serde_json::Value;
use slack_activity::slack::api::UsersPage;
use slack_activity::slack::ApiScope;
use slack_activity::AppError;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{mock_auth_test, mock_json, test_gateway, TOKEN};

#[tokio::test]
async fn verify_records_workspace_url_and_team() {
    let mut server = mockito::Server::new_async().await;
    let auth = mock_auth_test(&mut server, "T777").await;

    let mut gateway = test_gateway(&server, CancellationToken::new());
    assert!(gateway.workspace_url().is_none());

    let identity = gateway.verify().await.expect("verify succeeds");
    auth.assert_async().await;

    assert_eq!(identity.team_id, "T777");
    assert_eq!(identity.user_id, "U0SELF");
    assert_eq!(gateway.credentials().team_id, "T777");
    assert_eq!(
        gateway.workspace_url(),
        Some(format!("{}/api/", server.url()).as_str())
    );
}

#[tokio::test]
async fn requests_carry_form_token_and_cookies() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/users.info")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_header("cookie", "d=xoxd-secret; d-s=1700000000")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("token".into(), TOKEN.into()),
            Matcher::UrlEncoded("user".into(), "W1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"ok":true,"user":{"id":"W1","name":"ext"}}"#)
        .create_async()
        .await;

    let gateway = test_gateway(&server, CancellationToken::new());
    let value: Value = gateway
        .call_platform("users.info", &[("user", "W1")])
        .await
        .expect("call succeeds");
    mock.assert_async().await;
    assert_eq!(value["user"]["name"], "ext");
}

#[tokio::test]
async fn workspace_call_before_verify_is_config_error() {
    let server = mockito::Server::new_async().await;
    let gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway
        .call_workspace::<Value>("client.counts", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "{err}");
}

#[tokio::test]
async fn workspace_call_uses_configured_workspace_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_json(&mut server, "client.userBoot", r#"{"ok":true,"channels":[]}"#).await;
    let gateway =
        test_gateway(&server, CancellationToken::new()).with_workspace_url(server.url());
    let _: Value = gateway.call_workspace("client.userBoot", &[]).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn ok_false_on_http_200_is_api_error() {
    let mut server = mockito::Server::new_async().await;
    mock_json(&mut server, "auth.test", r#"{"ok":false,"error":"invalid_auth"}"#).await;

    let mut gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway.verify().await.unwrap_err();
    assert!(
        matches!(err, AppError::Api { ref endpoint, ref code } if endpoint == "auth.test" && code == "invalid_auth"),
        "{err}"
    );
}

#[tokio::test]
async fn non_2xx_is_http_error_with_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/users.list")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway
        .paginate::<UsersPage>(ApiScope::Platform, "users.list", &[("limit", "200")])
        .await
        .unwrap_err();
    match err {
        AppError::Http {
            endpoint,
            status,
            body,
        } => {
            assert_eq!(endpoint, "users.list");
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    mock_json(&mut server, "users.info", "<html>login</html>").await;
    let gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway
        .call_platform::<Value>("users.info", &[("user", "U1")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transport(_)), "{err}");
}

#[tokio::test]
async fn pagination_follows_cursor_until_empty() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::Regex("limit=200$".into()))
        .with_status(200)
        .with_body(
            r#"{"ok":true,"members":[{"id":"U1","name":"a"},{"id":"U2","name":"b"}],
                "response_metadata":{"next_cursor":"dXNlcjpVMg=="}}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::UrlEncoded("cursor".into(), "dXNlcjpVMg==".into()))
        .with_status(200)
        .with_body(
            r#"{"ok":true,"members":[{"id":"U3","name":"c"}],
                "response_metadata":{"next_cursor":""}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let gateway = test_gateway(&server, CancellationToken::new());
    let members = gateway
        .paginate::<UsersPage>(ApiScope::Platform, "users.list", &[("limit", "200")])
        .await
        .expect("all pages");

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<_> = members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["U1", "U2", "U3"]);
}

#[tokio::test]
async fn failing_second_page_discards_first() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::Regex("limit=200$".into()))
        .with_status(200)
        .with_body(r#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"next"}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::UrlEncoded("cursor".into(), "next".into()))
        .with_status(200)
        .with_body(r#"{"ok":false,"error":"ratelimited"}"#)
        .create_async()
        .await;

    let gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway
        .paginate::<UsersPage>(ApiScope::Platform, "users.list", &[("limit", "200")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Api { ref code, .. } if code == "ratelimited"));
}

#[tokio::test]
async fn repeated_cursor_stops_pagination() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::Regex("limit=200$".into()))
        .with_status(200)
        .with_body(r#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"same"}}"#)
        .create_async()
        .await;
    let repeat = server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::UrlEncoded("cursor".into(), "same".into()))
        .with_status(200)
        .with_body(r#"{"ok":true,"members":[{"id":"U2"}],"response_metadata":{"next_cursor":"same"}}"#)
        .expect(1)
        .create_async()
        .await;

    let gateway = test_gateway(&server, CancellationToken::new());
    let err = gateway
        .paginate::<UsersPage>(ApiScope::Platform, "users.list", &[("limit", "200")])
        .await
        .unwrap_err();
    repeat.assert_async().await;
    assert!(
        matches!(err, AppError::Transport(ref msg) if msg.contains("repeated cursor")),
        "{err}"
    );
}

#[tokio::test]
async fn cancelled_token_aborts_before_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth.test")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(0)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut gateway = test_gateway(&server, cancel);
    let err = gateway.verify().await.unwrap_err();
    assert!(matches!(err, AppError::Cancelled(ref m) if m == "auth.test"), "{err}");
    mock.assert_async().await;
}

#[tokio::test]
async fn cancellation_mid_pagination_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::Regex("limit=200$".into()))
        .with_status(200)
        .with_body_from_request(move |_| {
            trigger.cancel();
            br#"{"ok":true,"members":[{"id":"U1"}],"response_metadata":{"next_cursor":"more"}}"#
                .to_vec()
        })
        .create_async()
        .await;
    let second = server
        .mock("POST", "/api/users.list")
        .match_body(Matcher::UrlEncoded("cursor".into(), "more".into()))
        .with_status(200)
        .with_body(r#"{"ok":true,"members":[{"id":"U2"}]}"#)
        .expect(0)
        .create_async()
        .await;

    let gateway = test_gateway(&server, cancel);
    let err = gateway
        .paginate::<UsersPage>(ApiScope::Platform, "users.list", &[("limit", "200")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled(_)), "{err}");
    second.assert_async().await;
}
