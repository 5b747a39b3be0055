//! Client tests against a scripted daemon on a loopback socket.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mailbell_gntp::{Client, Config, Error, Notification, NotificationType, Registration};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Accepts one connection, collects `blocks` header blocks of the request
/// and answers with `reply`.
async fn one_shot_daemon(
    blocks: usize,
    reply: &'static str,
) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(socket);
        let mut lines = Vec::new();
        let mut remaining = blocks;
        while remaining > 0 {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                remaining -= 1;
            } else {
                lines.push(line);
            }
        }
        reader.get_mut().write_all(reply.as_bytes()).await.unwrap();
        reader.get_mut().shutdown().await.unwrap();
        lines
    });

    (port, handle)
}

#[tokio::test]
async fn notify_reaches_daemon() {
    let (port, daemon) =
        one_shot_daemon(1, "GNTP/1.0 -OK NONE\r\nResponse-Action: NOTIFY\r\n\r\n").await;
    let client = Client::new(Config::new("127.0.0.1", port));

    let response = client
        .notify(Notification::new("work", "New email", "alice@example.com").text("Lunch?"))
        .await
        .unwrap();
    assert_eq!(response.action.as_deref(), Some("NOTIFY"));

    let seen = daemon.await.unwrap();
    assert_eq!(seen[0], "GNTP/1.0 NOTIFY NONE");
    assert!(seen.contains(&"Notification-Title: alice@example.com".to_string()));
    assert!(seen.contains(&"Notification-Text: Lunch?".to_string()));
}

#[tokio::test]
async fn password_adds_key_hash() {
    let (port, daemon) =
        one_shot_daemon(2, "GNTP/1.0 -OK NONE\r\nResponse-Action: REGISTER\r\n\r\n").await;
    let client = Client::new(Config::new("127.0.0.1", port).password("secret"));

    client
        .register(Registration::new("work").notification(NotificationType::new("New email")))
        .await
        .unwrap();

    let seen = daemon.await.unwrap();
    assert!(seen[0].starts_with("GNTP/1.0 REGISTER NONE SHA256:"));
}

#[tokio::test]
async fn daemon_error_is_reported() {
    let (port, _daemon) = one_shot_daemon(
        1,
        "GNTP/1.0 -ERROR NONE\r\nError-Code: 401\r\nError-Description: Unknown application\r\n\r\n",
    )
    .await;
    let client = Client::new(Config::new("127.0.0.1", port));

    let err = client
        .notify(Notification::new("work", "New email", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { code, .. } if code.as_u16() == 401));
}

#[tokio::test]
async fn unreachable_daemon_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = Client::new(Config::new("127.0.0.1", port).timeout(Duration::from_secs(5)));
    let err = client
        .notify(Notification::new("work", "New email", "x"))
        .await
        .unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err:?}");
}
