//! Integration tests for connection lifecycle.
//!
//! Tests registration, the various ways a session ends, and the cleanup of
//! shared state that follows.

mod common;

use common::{TestClient, TestServer, test_config};
use relay_proto::{Command, Message};
use std::time::Duration;

#[tokio::test]
async fn test_registration_welcome_and_motd() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut client = TestClient::connect(&server.address(), "alice")
        .await
        .expect("Failed to connect");

    client.send_raw("NICK alice").await.unwrap();
    client.send_raw("USER alice 0 * :Alice Liddell").await.unwrap();

    let lines = client
        .recv_until(|line| line.contains(" 376 "))
        .await
        .expect("Failed to receive welcome burst");
    assert_eq!(
        lines,
        vec![
            ":test.server 001 alice :Welcome to the TestNet Network alice",
            ":test.server 375 alice :- test.server Message of the Day -",
            ":test.server 372 alice :- Test Server",
            ":test.server 372 alice :- Be nice",
            ":test.server 372 alice :- Have fun",
            ":test.server 376 alice :End of /MOTD command.",
        ]
    );

    // Registered: PING is answered with PONG carrying the token
    client
        .send(Command::PING("test".to_string(), None))
        .await
        .expect("Failed to send PING");
    let pong = client.recv().await.expect("Failed to receive PONG");
    match &pong.command {
        Command::PONG(Some(server_name), Some(token)) => {
            assert_eq!(server_name, "test.server");
            assert_eq!(token, "test", "PONG token mismatch");
        }
        other => panic!("Expected PONG with token, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_commands_before_registration() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = TestClient::connect(&server.address(), "early").await.unwrap();

    client.send_raw("JOIN #test").await.unwrap();
    assert_eq!(
        client.recv_line().await.unwrap(),
        ":test.server 451 * :You have not registered"
    );

    client.send_raw("FROBNICATE now").await.unwrap();
    assert_eq!(
        client.recv_line().await.unwrap(),
        ":test.server 421 * FROBNICATE :Unknown command"
    );

    client.send_raw("NICK 1nvalid").await.unwrap();
    assert_eq!(
        client.recv_line().await.unwrap(),
        ":test.server 432 * 1nvalid :Erroneous nickname"
    );

    // Empty lines are ignored
    client.send_bytes(b"\r\n\r\n").await.unwrap();
    client.expect_silence(Duration::from_millis(200)).await.unwrap();
    assert_eq!(server.matrix().channel_count(), 0);
}

#[tokio::test]
async fn test_nick_collision_is_case_insensitive() {
    let server = TestServer::spawn().await.unwrap();
    let _alice = TestClient::registered(&server.address(), "alice").await.unwrap();

    let mut other = TestClient::connect(&server.address(), "ALICE").await.unwrap();
    other.send_raw("NICK ALICE").await.unwrap();
    assert_eq!(
        other.recv_line().await.unwrap(),
        ":test.server 433 * ALICE :Nickname is already in use"
    );

    // A free nick still completes registration for the same connection
    other.send_raw("NICK alice2").await.unwrap();
    other.send_raw("USER a 0 * :Another Alice").await.unwrap();
    let lines = other.recv_until(|line| line.contains(" 376 ")).await.unwrap();
    assert!(lines[0].starts_with(":test.server 001 alice2 "));
}

#[tokio::test]
async fn test_quit_closes_link_and_parts_channels() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(&server.address(), "alice").await.unwrap();
    let mut bob = TestClient::registered(&server.address(), "bob").await.unwrap();
    alice.join("#test").await.unwrap();
    bob.join("#test").await.unwrap();
    bob.join("#solo").await.unwrap();
    alice.recv_line().await.unwrap(); // bob's JOIN

    bob.quit(Some("gone fishing".to_string())).await.unwrap();

    let lines = bob.recv_until_closed().await.unwrap();
    assert_eq!(
        lines,
        vec!["ERROR :Closing Link: 127.0.0.1 (Quit: gone fishing)"]
    );
    assert_eq!(alice.recv_line().await.unwrap(), ":bob PART #test :gone fishing");

    assert!(server.wait_for(|m| m.session_count() == 1).await);
    assert!(server.matrix().uid_for_nick("bob").is_none());
    assert!(!server.matrix().has_channel("#solo"));
    assert_eq!(server.matrix().channel_names("#test").unwrap(), vec!["alice"]);
    server.matrix().check_invariants().unwrap();

    // The nick is free again
    let _bob2 = TestClient::registered(&server.address(), "bob").await.unwrap();
}

#[tokio::test]
async fn test_quit_default_reason() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = TestClient::registered(&server.address(), "carol").await.unwrap();

    client.quit(None).await.unwrap();
    let lines = client.recv_until_closed().await.unwrap();
    assert_eq!(lines, vec!["ERROR :Closing Link: 127.0.0.1 (Quit: Client Quit)"]);
}

#[tokio::test]
async fn test_abrupt_disconnect_cleans_up() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(&server.address(), "alice").await.unwrap();
    let mut bob = TestClient::registered(&server.address(), "bob").await.unwrap();
    alice.join("#test").await.unwrap();
    bob.join("#test").await.unwrap();
    alice.recv_line().await.unwrap();

    drop(bob);

    assert_eq!(
        alice.recv_line().await.unwrap(),
        ":bob PART #test :Connection closed"
    );
    assert!(server.wait_for(|m| m.session_count() == 1).await);
    assert!(server.matrix().uid_for_nick("bob").is_none());
}

#[tokio::test]
async fn test_oversized_line_terminates_session() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = TestClient::registered(&server.address(), "dave").await.unwrap();

    let mut payload = b"PRIVMSG #test :".to_vec();
    payload.extend(std::iter::repeat_n(b'a', 600));
    client.send_bytes(&payload).await.unwrap();

    let lines = client.recv_until_closed().await.unwrap();
    let last = lines.last().expect("ERROR line before close");
    assert!(
        last.starts_with("ERROR :Closing Link: 127.0.0.1 (message too long"),
        "{last}"
    );
    assert!(server.wait_for(|m| m.session_count() == 0).await);
}

#[tokio::test]
async fn test_invalid_utf8_terminates_session() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = TestClient::registered(&server.address(), "erin").await.unwrap();

    client.send_bytes(b"PRIVMSG #test :\xff\xfe\r\n").await.unwrap();

    let lines = client.recv_until_closed().await.unwrap();
    assert_eq!(
        lines,
        vec!["ERROR :Closing Link: 127.0.0.1 (invalid UTF-8 at byte 15)"]
    );
    assert!(server.wait_for(|m| m.uid_for_nick("erin").is_none()).await);
}

#[tokio::test]
async fn test_silent_client_times_out() {
    let mut config = test_config();
    config.idle_timeouts.ping = 1;
    config.idle_timeouts.timeout = 1;
    let server = TestServer::spawn_with(config).await.unwrap();
    let mut client = TestClient::registered(&server.address(), "sleepy").await.unwrap();

    let lines = client.recv_until_closed().await.unwrap();
    assert!(lines.iter().any(|l| l == ":test.server PING :test.server"), "{lines:?}");
    let last = lines.last().expect("ERROR line before close");
    assert!(
        last.starts_with("ERROR :Closing Link: 127.0.0.1 (Ping timeout: "),
        "{last}"
    );
    assert!(server.wait_for(|m| m.session_count() == 0).await);
}

#[tokio::test]
async fn test_answering_probes_keeps_session_alive() {
    let mut config = test_config();
    config.idle_timeouts.ping = 1;
    config.idle_timeouts.timeout = 1;
    let server = TestServer::spawn_with(config).await.unwrap();
    let mut client = TestClient::registered(&server.address(), "awake").await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(4);
    let mut probes = 0;
    while tokio::time::Instant::now() < deadline {
        let Ok(msg) = client.recv_timeout(Duration::from_millis(500)).await else {
            continue;
        };
        if let Command::PING(token, _) = &msg.command {
            probes += 1;
            client
                .send(Command::PONG(Some(token.clone()), None))
                .await
                .unwrap();
        }
    }
    assert!(probes >= 2, "expected repeated probes, got {probes}");

    client.send_raw("PING still-here").await.unwrap();
    let lines = client
        .recv_until(|line| line.ends_with(":still-here"))
        .await
        .unwrap();
    let reply: Message = lines.last().unwrap().parse().unwrap();
    assert!(matches!(reply.command, Command::PONG(_, Some(ref t)) if t == "still-here"));
    assert_eq!(server.matrix().session_count(), 1);
}
