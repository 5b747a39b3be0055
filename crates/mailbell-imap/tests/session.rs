//! End-to-end client sessions against scripted servers.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio_test::io::Builder;

use mailbell_imap::{
    Client, Error, Mailbox, MailboxAttribute, SearchCriteria, Selection, Uid, UidSet,
};

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n";

#[tokio::test]
async fn unseen_headers_round_trip() {
    let header = b"From: Alice <alice@example.com>\r\nSubject: Lunch?\r\n\r\n";
    let mut fetch = format!(
        "* 2 FETCH (UID 11 BODY[HEADER.FIELDS (FROM SUBJECT)] {{{}}}\r\n",
        header.len()
    )
    .into_bytes();
    fetch.extend_from_slice(header);
    fetch.extend_from_slice(b")\r\n");

    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK [CAPABILITY IMAP4rev1 IDLE] Logged in\r\n")
        .write(b"A0001 LIST \"\" *\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
        .read(b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n")
        .read(b"* LIST (\\HasNoChildren \\Junk) \"/\" \"[Gmail]/Spam\"\r\n")
        .read(b"A0001 OK LIST completed\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
        .read(b"* 2 EXISTS\r\n")
        .read(b"* 0 RECENT\r\n")
        .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
        .read(b"* OK [UIDNEXT 12] Predicted next UID\r\n")
        .read(b"A0002 OK [READ-ONLY] EXAMINE completed\r\n")
        .write(b"A0003 UID SEARCH UNSEEN\r\n")
        .read(b"* SEARCH 11\r\n")
        .read(b"A0003 OK SEARCH completed\r\n")
        .write(b"A0004 UID FETCH 11 (UID BODY.PEEK[HEADER.FIELDS (FROM SUBJECT)])\r\n")
        .read(&fetch)
        .read(b"A0004 OK FETCH completed\r\n")
        .write(b"A0005 CLOSE\r\n")
        .read(b"A0005 OK CLOSE completed\r\n")
        .write(b"A0006 LOGOUT\r\n")
        .read(b"* BYE logging out\r\n")
        .read(b"A0006 OK LOGOUT completed\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    assert_eq!(client.capabilities().len(), 2);

    let mut client = client
        .with_timeout(Duration::from_secs(5))
        .login("alice", "secret")
        .await
        .unwrap();
    assert_eq!(client.capabilities().len(), 2);

    let mailboxes = client.list("", "*").await.unwrap();
    assert_eq!(mailboxes.len(), 3);
    assert!(mailboxes[0].is_selectable());
    assert!(!mailboxes[1].is_selectable());
    assert!(mailboxes[2].attributes.contains(&MailboxAttribute::Junk));

    let Selection::Selected(mut inbox) = client.examine(&mailboxes[0].mailbox).await.unwrap()
    else {
        panic!("INBOX should be selectable");
    };
    assert_eq!(inbox.status().exists, 2);
    assert_eq!(inbox.status().flags.len(), 5);
    assert!(inbox.status().read_only);

    let unseen = inbox.uid_search(&SearchCriteria::Unseen).await.unwrap();
    assert_eq!(unseen, vec![Uid::new(11).unwrap()]);

    let headers = inbox
        .uid_fetch_headers(&UidSet::from_uids(unseen), &["FROM", "SUBJECT"])
        .await
        .unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].uid.get(), 11);
    assert_eq!(headers[0].header, header);

    let client = inbox.close().await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn rejected_login_is_no() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice wrong\r\n")
        .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let err = client.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::No(text) if text == "Invalid credentials"));
}

#[tokio::test]
async fn refused_examine_keeps_session() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE Gone\r\n")
        .read(b"A0001 NO Mailbox doesn't exist\r\n")
        .write(b"A0002 LOGOUT\r\n")
        .read(b"A0002 OK bye\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "secret").await.unwrap();

    match client.examine(&Mailbox::from_name("Gone")).await.unwrap() {
        Selection::Refused { client, reason } => {
            assert_eq!(reason, "Mailbox doesn't exist");
            client.logout().await.unwrap();
        }
        Selection::Selected(_) => panic!("examine should have been refused"),
    }
}

#[tokio::test]
async fn greeting_bye_is_error() {
    let mock = Builder::new()
        .read(b"* BYE Too many connections\r\n")
        .build();
    let err = Client::from_stream(mock).await.unwrap_err();
    assert!(matches!(err, Error::Bye(_)));
}

#[tokio::test]
async fn malformed_completion_is_parse_error() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 MAYBE later\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let err = client.login("alice", "secret").await.unwrap_err();
    assert!(err.is_protocol());
}

#[tokio::test]
async fn credentials_with_line_breaks_are_refused_locally() {
    let mock = Builder::new().read(GREETING).build();
    let client = Client::from_stream(mock).await.unwrap();
    let err = client
        .login("alice", "x\r\nA0001 DELETE INBOX")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test(start_paused = true)]
async fn silent_server_times_out() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .wait(Duration::from_secs(120))
        .build();

    let client = Client::from_stream(mock)
        .await
        .unwrap()
        .with_timeout(Duration::from_secs(30));
    let err = client.login("alice", "secret").await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(30)));
}
