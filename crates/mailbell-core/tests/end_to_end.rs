//! A full check against loopback IMAP and GNTP fakes.

#![allow(clippy::unwrap_used)]

use mailbell_core::{Checker, Error, GrowlNotifier, ImapPoller, Overrides, Settings};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const FIRST: &[u8] = b"From: Alice <alice@example.com>\r\nSubject: Lunch?\r\n\r\n";
const SECOND: &[u8] = b"From: Bob <bob@example.com>\r\nSubject: =?utf-8?Q?Caf=C3=A9?=\r\n\r\n";

fn fetch_line(uid: u32, header: &[u8]) -> Vec<u8> {
    let mut line = format!(
        "* {uid} FETCH (UID {uid} BODY[HEADER.FIELDS (FROM SUBJECT)] {{{}}}\r\n",
        header.len()
    )
    .into_bytes();
    line.extend_from_slice(header);
    line.extend_from_slice(b")\r\n");
    line
}

/// Serves one IMAP session with two unseen messages in INBOX.
async fn imap_server(accept_login: bool) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(socket);
        let mut commands = Vec::new();
        stream
            .get_mut()
            .write_all(b"* OK [CAPABILITY IMAP4rev1] ready\r\n")
            .await
            .unwrap();

        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            let mut parts = line.splitn(3, ' ');
            let tag = parts.next().unwrap_or_default().to_string();
            let verb = parts.next().unwrap_or_default().to_ascii_uppercase();
            let rest = parts.next().unwrap_or_default().to_string();
            commands.push(format!("{verb} {rest}"));

            let reply = match verb.as_str() {
                "LOGIN" if accept_login => format!("{tag} OK logged in\r\n").into_bytes(),
                "LOGIN" => format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
                    .into_bytes(),
                "EXAMINE" => format!("* 2 EXISTS\r\n{tag} OK [READ-ONLY] done\r\n").into_bytes(),
                "UID" if rest.starts_with("SEARCH") => {
                    format!("* SEARCH 1 2\r\n{tag} OK done\r\n").into_bytes()
                }
                "UID" => {
                    let mut reply = fetch_line(1, FIRST);
                    reply.extend_from_slice(&fetch_line(2, SECOND));
                    reply.extend_from_slice(format!("{tag} OK done\r\n").as_bytes());
                    reply
                }
                "CLOSE" => format!("{tag} OK done\r\n").into_bytes(),
                "LOGOUT" => format!("* BYE see you\r\n{tag} OK done\r\n").into_bytes(),
                _ => format!("{tag} BAD unexpected\r\n").into_bytes(),
            };
            stream.get_mut().write_all(&reply).await.unwrap();
            if verb == "LOGOUT" || (verb == "LOGIN" && !accept_login) {
                break;
            }
        }
        commands
    });

    (port, handle)
}

/// Accepts `connections` GNTP requests and answers each with `-OK`.
async fn gntp_daemon(connections: usize) -> (u16, JoinHandle<Vec<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for _ in 0..connections {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(socket);
            let mut lines: Vec<String> = Vec::new();
            let mut blocks = 1;
            while blocks > 0 {
                let mut line = String::new();
                stream.read_line(&mut line).await.unwrap();
                let line = line.trim_end().to_string();
                if lines.is_empty() && line.contains("REGISTER") {
                    blocks = 2;
                }
                if line.is_empty() {
                    blocks -= 1;
                } else {
                    lines.push(line);
                }
            }
            stream
                .get_mut()
                .write_all(b"GNTP/1.0 -OK NONE\r\n\r\n")
                .await
                .unwrap();
            stream.get_mut().shutdown().await.unwrap();
            requests.push(lines);
        }
        requests
    });

    (port, handle)
}

fn settings(imap_port: u16, gntp_port: u16) -> Settings {
    let text = format!(
        "[general]\n\
         profile = loopback\n\
         [loopback]\n\
         host = 127.0.0.1\n\
         port = {imap_port}\n\
         security = none\n\
         user = alice\n\
         password = secret\n\
         mailbox = INBOX\n\
         period = no\n\
         timeout = 5\n\
         gntp_host = 127.0.0.1\n\
         gntp_port = {gntp_port}\n"
    );
    Settings::parse(&text, &Overrides::default()).unwrap()
}

#[tokio::test]
async fn unseen_messages_become_notifications() {
    let (imap_port, imap) = imap_server(true).await;
    let (gntp_port, daemon) = gntp_daemon(3).await;
    let settings = settings(imap_port, gntp_port);

    let mut checker = Checker::new(
        ImapPoller::new(&settings),
        GrowlNotifier::new(&settings),
        settings.period,
    );
    checker.run().await.unwrap();

    let commands = imap.await.unwrap();
    assert_eq!(commands[0], "LOGIN alice secret");
    assert_eq!(commands[1], "EXAMINE INBOX");
    assert!(commands.iter().all(|c| !c.starts_with("SELECT")));

    let requests = daemon.await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0][0], "GNTP/1.0 REGISTER NONE");
    assert!(requests[0].contains(&"Application-Name: loopback".to_string()));
    assert!(requests[0].contains(&"Notification-Name: New email".to_string()));

    assert_eq!(requests[1][0], "GNTP/1.0 NOTIFY NONE");
    assert!(requests[1].contains(&"Notification-Title: Alice <alice@example.com>".to_string()));
    assert!(requests[1].contains(&"Notification-Text: Lunch?".to_string()));
    assert!(requests[1].contains(&"Notification-Priority: 1".to_string()));

    assert!(requests[2].contains(&"Notification-Title: Bob <bob@example.com>".to_string()));
    assert!(requests[2].contains(&"Notification-Text: Café".to_string()));
}

#[tokio::test]
async fn refused_login_stops_the_first_run() {
    let (imap_port, imap) = imap_server(false).await;
    let (gntp_port, _daemon) = gntp_daemon(0).await;
    let settings = settings(imap_port, gntp_port);

    let mut checker = Checker::new(
        ImapPoller::new(&settings),
        GrowlNotifier::new(&settings),
        settings.period,
    );
    let err = checker.run().await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed(_)), "{err:?}");

    let commands = imap.await.unwrap();
    assert_eq!(commands, vec!["LOGIN alice secret".to_string()]);
}

#[tokio::test]
async fn missing_settings_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load(&dir.path().join("settings.ini"), &Overrides::default()).unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(_)));
    assert!(err.is_fatal());
}
