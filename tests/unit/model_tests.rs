//! Unit tests for domain model helpers.

use chrono::{TimeZone, Utc};
use slack_activity::credentials::machine::{parse_ioreg_uuid, parse_registry_guid};
use slack_activity::models::credentials::{Credentials, SessionCookie};
use slack_activity::models::export::ExportRequest;
use slack_activity::models::window::DateWindow;
use slack_activity::models::user::DirectoryUser;
use slack_activity::slack::api::UsersPage;

fn window() -> DateWindow {
    DateWindow {
        start_utc: Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap(),
        end_utc: Utc.with_ymd_and_hms(2026, 1, 16, 5, 0, 0).unwrap(),
    }
}

fn creds() -> Credentials {
    Credentials {
        token: "xoxc-T1-U1-0-hash".into(),
        team_id: "T1".into(),
        workspace: "acme".into(),
        cookies: vec![SessionCookie {
            name: "d".into(),
            value: "xoxd-1".into(),
            domain: ".slack.com".into(),
        }],
    }
}

#[test]
fn debug_output_redacts_token() {
    let rendered = format!("{:?}", creds());
    assert!(!rendered.contains("xoxc-T1-U1-0-hash"));
    assert!(rendered.contains("T1"));
}

#[test]
fn server_team_id_overrides_derived_one() {
    assert_eq!(creds().with_team_id("T999").team_id, "T999");
    assert_eq!(creds().with_team_id("").team_id, "T1");
}

#[test]
fn export_request_requires_conversations() {
    assert!(ExportRequest::new(Vec::new(), window()).is_err());
    let request = ExportRequest::new(vec!["C1".into(), "D2".into()], window()).unwrap();
    assert_eq!(request.conversation_ids.len(), 2);
    assert_eq!(request.start_utc, window().start_utc);
    assert_eq!(request.end_utc, window().end_utc);
}

#[test]
fn api_user_prefers_top_level_real_name() {
    let page: UsersPage = serde_json::from_str(
        r#"{"members":[
            {"id":"U1","name":"alice","real_name":"Alice L","profile":{"display_name":"ali","real_name":"Alice Profile"}},
            {"id":"U2","name":"bob","profile":{"real_name":"Bob Profile"}},
            {"id":"U3"}
        ]}"#,
    )
    .unwrap();
    let users: Vec<DirectoryUser> = page.members.into_iter().map(DirectoryUser::from).collect();
    assert_eq!(users[0].real_name, "Alice L");
    assert_eq!(users[0].display_name, "ali");
    assert_eq!(users[1].real_name, "Bob Profile");
    assert_eq!(users[2].preferred_name(), "unknown:U3");
}

#[test]
fn ioreg_output_yields_platform_uuid() {
    let output = r#"+-o Root  <class IORegistryEntry>
    {
      "IOPlatformSerialNumber" = "C02XXXXX"
      "IOPlatformUUID" = "A1B2C3D4-0000-1111-2222-333344445555"
    }"#;
    assert_eq!(
        parse_ioreg_uuid(output).as_deref(),
        Some("A1B2C3D4-0000-1111-2222-333344445555")
    );
    assert!(parse_ioreg_uuid("nothing here").is_none());
}

#[test]
fn registry_output_yields_machine_guid() {
    let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Cryptography\r\n    MachineGuid    REG_SZ    6f1c2f4e-1111-2222-3333-444455556666\r\n";
    assert_eq!(
        parse_registry_guid(output).as_deref(),
        Some("6f1c2f4e-1111-2222-3333-444455556666")
    );
    assert!(parse_registry_guid("").is_none());
}
