use httpmock::prelude::*;
use offboard::domain::model::AutoReplyConfig;
use offboard::{MailboxPort, OffboardError, RestMailbox};
use serde_json::json;

fn auto_reply() -> AutoReplyConfig {
    AutoReplyConfig {
        enabled: true,
        internal_message: "Alice has left the company.".to_string(),
        external_message: "This mailbox is no longer monitored.".to_string(),
    }
}

#[tokio::test]
async fn test_probe_reports_available_service() {
    let server = MockServer::start();
    let health_mock = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200).json_body(json!({"status": "ok"}));
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    assert!(mailbox.probe_availability().await);
    health_mock.assert();
}

#[tokio::test]
async fn test_probe_treats_server_error_as_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(500);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    assert!(!mailbox.probe_availability().await);
}

#[tokio::test]
async fn test_probe_treats_unreachable_service_as_unavailable() {
    // 沒有任何東西在這個位址上監聽
    let mailbox = RestMailbox::new("http://127.0.0.1:1", "token");
    assert!(!mailbox.probe_availability().await);
}

#[tokio::test]
async fn test_mailbox_exists_for_individual_mailbox() {
    let server = MockServer::start();
    let lookup_mock = server.mock(|when, then| {
        when.method(GET).path("/mailboxes/alice@contoso.com");
        then.status(200).json_body(json!({
            "mailboxType": "individual",
            "forwardingTo": null,
            "autoReply": {"enabled": false}
        }));
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    assert!(mailbox.mailbox_exists("alice@contoso.com").await.unwrap());
    lookup_mock.assert();
}

#[tokio::test]
async fn test_missing_mailbox_is_not_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mailboxes/alice@contoso.com");
        then.status(404);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    assert!(!mailbox.mailbox_exists("alice@contoso.com").await.unwrap());
}

#[tokio::test]
async fn test_mailbox_lookup_failure_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mailboxes/alice@contoso.com");
        then.status(503);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    let result = mailbox.mailbox_exists("alice@contoso.com").await;
    assert!(matches!(result, Err(OffboardError::MailboxApiError { status: 503, .. })));
}

#[tokio::test]
async fn test_convert_to_shared_posts_conversion() {
    let server = MockServer::start();
    let convert_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/mailboxes/alice@contoso.com/convert")
            .json_body(json!({"mailboxType": "shared"}));
        then.status(200);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    mailbox.convert_to_shared("alice@contoso.com").await.unwrap();
    convert_mock.assert();
}

#[tokio::test]
async fn test_set_forwarding_does_not_keep_local_copy() {
    let server = MockServer::start();
    let forward_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/mailboxes/alice@contoso.com/forwarding")
            .json_body(json!({
                "forwardTo": "team@contoso.com",
                "deliverToMailboxAndForward": false
            }));
        then.status(200);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    mailbox
        .set_forwarding("alice@contoso.com", "team@contoso.com")
        .await
        .unwrap();
    forward_mock.assert();
}

#[tokio::test]
async fn test_set_auto_reply_sends_both_messages() {
    let server = MockServer::start();
    let reply_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/mailboxes/alice@contoso.com/autoreply")
            .json_body(json!({
                "enabled": true,
                "internalMessage": "Alice has left the company.",
                "externalMessage": "This mailbox is no longer monitored."
            }));
        then.status(200);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    mailbox
        .set_auto_reply("alice@contoso.com", &auto_reply())
        .await
        .unwrap();
    reply_mock.assert();
}

#[tokio::test]
async fn test_close_signs_out() {
    let server = MockServer::start();
    let logout_mock = server.mock(|when, then| {
        when.method(POST).path("/logout");
        then.status(204);
    });

    let mailbox = RestMailbox::new(server.base_url(), "token");
    mailbox.close().await.unwrap();
    logout_mock.assert();
}
