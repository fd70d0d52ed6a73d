//! Integration test: run a session against a local WebSocket assistant served by axum.
//! The fake assistant answers the first text frame with canned replies and then closes,
//! which ends the driver loop deterministically.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use opsbot::config::ChatConfig;
use opsbot::driver::{Command, Driver, Presenter};
use opsbot::session::{ConnectionState, Session};
use opsbot::timeline::{Sender, TimelineEntry};
use opsbot::transport::{self, TransportEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone)]
struct Assistant {
    /// Frames sent as soon as the socket opens.
    greeting: Arc<Vec<String>>,
    /// Frames sent in answer to the first text frame.
    replies: Arc<Vec<String>>,
    received: mpsc::UnboundedSender<String>,
}

async fn ws_handler(ws: WebSocketUpgrade, State(assistant): State<Assistant>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, assistant))
}

async fn serve(mut socket: WebSocket, assistant: Assistant) {
    for frame in assistant.greeting.iter() {
        if socket.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    if assistant.replies.is_empty() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else { continue };
        let _ = assistant.received.send(text);
        for frame in assistant.replies.iter() {
            if socket.send(Message::Text(frame.clone())).await.is_err() {
                return;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
}

async fn spawn_assistant(
    greeting: &[&str],
    replies: &[&str],
) -> (String, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let assistant = Assistant {
        greeting: Arc::new(greeting.iter().map(|s| s.to_string()).collect()),
        replies: Arc::new(replies.iter().map(|s| s.to_string()).collect()),
        received: tx,
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(assistant);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("ws://127.0.0.1:{}/ws", port), rx)
}

#[derive(Default)]
struct Recorder {
    states: Vec<ConnectionState>,
    shown: Vec<TimelineEntry>,
}

impl Presenter for Recorder {
    fn entry_appended(&mut self, entry: &TimelineEntry) {
        self.shown.push(entry.clone());
    }

    fn state_changed(&mut self, state: ConnectionState) {
        self.states.push(state);
    }
}

#[tokio::test]
async fn echo_precedes_classified_replies() {
    let (url, mut received) = spawn_assistant(
        &[],
        &[
            r#"{"messeage":"Results retrieved","similar_issues":[{"key":"OPS-1","summary":"VPN down"}]}"#,
            r#"{"similar_issues":[{"key":"OPS-1","summary":"VPN down"}]}"#,
            r#"{"status":"Open","ticket_details":{"ticket_id":"1","ticket_Key":"ABC-1"}}"#,
        ],
    )
    .await;

    let (sink, mut events) = transport::connect(url);
    let mut driver = Driver::new(Session::new(sink, &ChatConfig::default()), Recorder::default());
    assert_eq!(events.recv().await, Some(TransportEvent::Open));
    driver.handle_event(TransportEvent::Open);

    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    cmd_tx.send(Command::Input("   ".into())).await.expect("queue");
    cmd_tx.send(Command::Input("2".into())).await.expect("queue");

    let (session, presenter) = tokio::time::timeout(Duration::from_secs(5), driver.run(events, cmd_rx))
        .await
        .expect("session should end when the assistant closes");

    assert_eq!(received.recv().await.as_deref(), Some("Update ticket"));
    assert_eq!(session.state(), ConnectionState::Closed);

    let all = session.timeline().all();
    assert_eq!(all.len(), 5, "{:#?}", all);
    assert!(all[0].is_welcome);
    assert_eq!((all[1].sender, all[1].text.as_str()), (Sender::User, "Update ticket"));
    assert_eq!(all[2].text, "Results retrieved successfully.");
    assert!(all[3].text.contains("🔹 Issue Key: OPS-1\n🔹 Summary: VPN down"));
    assert_eq!(all[4].text, "🎫 Open\n🔹 Ticket Key: ABC-1\n🔹 Ticket ID: 1");

    assert_eq!(presenter.shown.as_slice(), all);
    assert_eq!(presenter.states, [ConnectionState::Open, ConnectionState::Closed]);
    drop(cmd_tx);
}

#[tokio::test]
async fn welcome_precedes_frames_sent_on_connect() {
    let (url, _received) =
        spawn_assistant(&[r#"{"messeage":"Agent is online","unknown":1}"#, "not json"], &[]).await;

    let (sink, events) = transport::connect(url);
    let driver = Driver::new(Session::new(sink, &ChatConfig::default()), Recorder::default());
    let (_cmd_tx, cmd_rx) = mpsc::channel(1);

    let (session, _) = tokio::time::timeout(Duration::from_secs(5), driver.run(events, cmd_rx))
        .await
        .expect("session should end when the assistant closes");

    let texts: Vec<&str> = session.timeline().all().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, ["How can I help you today?", "Agent is online"]);
    assert_eq!(session.timeline().all().iter().filter(|e| e.is_welcome).count(), 1);
}
