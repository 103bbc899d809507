//! End-to-end tests: a real server on an ephemeral port, real WebSocket and
//! HTTP clients.

use std::{fmt::Display, time::Duration};

use chatroom_server::{
    config::{EditPolicy, RoomConfig, ServerConfig, SessionLimits, StoreRoot},
    ui::Server,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage an in-process server
struct TestServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(EditPolicy::AuthorOnly, SessionLimits::default()).await
    }

    async fn start_with(edit_policy: EditPolicy, session: SessionLimits) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            store_root: StoreRoot::InMemory,
            room: RoomConfig {
                edit_policy,
                ..RoomConfig::default()
            },
            session,
        };

        let (shutdown, stopped) = oneshot::channel::<()>();
        let server = Server::new(config);
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async move {
                    let _ = stopped.await;
                })
                .await;
        });

        TestServer {
            port,
            shutdown: Some(shutdown),
        }
    }

    fn chat_url(&self, project_id: impl Display) -> String {
        format!("ws://127.0.0.1:{}/projects/{}/chat", self.port, project_id)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn connect(&self, project_id: impl Display) -> Socket {
        let (socket, _) = connect_async(self.chat_url(project_id)).await.unwrap();
        socket
    }

    async fn connect_as(
        &self,
        project_id: impl Display,
        user_id: &'static str,
        name: &'static str,
    ) -> Socket {
        let mut request = self.chat_url(project_id).into_client_request().unwrap();
        request
            .headers_mut()
            .insert("x-user-id", HeaderValue::from_static(user_id));
        request
            .headers_mut()
            .insert("x-user-name", HeaderValue::from_static(name));
        let (socket, _) = connect_async(request).await.unwrap();
        socket
    }

    async fn get_json(&self, path: &str) -> Value {
        reqwest::get(self.http_url(path))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame as JSON, failing the test after a timeout
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = next {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn message_frame(
    project_id: impl Into<Value>,
    user_id: impl Into<Value>,
    sender_name: &str,
    content: &str,
) -> Value {
    let (project_id, user_id) = (project_id.into(), user_id.into());
    json!({
        "type": "message",
        "projectId": project_id,
        "userId": user_id,
        "senderName": sender_name,
        "content": content
    })
}

#[tokio::test]
async fn test_project_42_example_scenario() {
    // テスト項目: project 42 で送ったメッセージが全員に届き、履歴から取得できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;
    let mut bob = server.connect(42).await;

    // when (操作):
    send(&mut alice, message_frame(42, 7, "alice", "hi")).await;

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        let frame = recv(socket).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["message"]["id"], 1);
        assert_eq!(frame["message"]["projectId"], 42);
        assert_eq!(frame["message"]["userId"], 7);
        assert_eq!(frame["message"]["senderName"], "alice");
        assert_eq!(frame["message"]["content"], "hi");
        assert!(frame["message"]["createdAt"].as_i64().unwrap() > 0);
    }

    let history = server.get_json("/projects/42/chat/messages").await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], 1);
    assert_eq!(history[0]["content"], "hi");
    assert_eq!(history[0]["readBy"], json!([]));
}

#[tokio::test]
async fn test_reply_fields_round_trip() {
    // テスト項目: 返信先のスナップショットがブロードキャストと履歴に含まれる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(5).await;

    // when (操作):
    let mut frame = message_frame(5, 7, "alice", "agreed");
    frame["replyToId"] = json!(99);
    frame["replyToContent"] = json!("ship it?");
    frame["replyToSender"] = json!("bob");
    send(&mut alice, frame).await;

    // then (期待する結果):
    let broadcast = recv(&mut alice).await;
    assert_eq!(broadcast["message"]["replyToId"], 99);
    assert_eq!(broadcast["message"]["replyToContent"], "ship it?");
    assert_eq!(broadcast["message"]["replyToSender"], "bob");
    let history = server.get_json("/projects/5/chat/messages").await;
    assert_eq!(history[0]["replyToSender"], "bob");
}

#[tokio::test]
async fn test_typing_reaches_others_but_not_sender() {
    // テスト項目: typing は送信者以外に届き、送信者には返らない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;
    let mut bob = server.connect(42).await;

    // when (操作):
    send(
        &mut alice,
        json!({"type": "typing", "userId": 7, "senderName": "alice", "isTyping": true}),
    )
    .await;
    send(&mut alice, message_frame(42, 7, "alice", "after typing")).await;

    // then (期待する結果):
    let typing = recv(&mut bob).await;
    assert_eq!(typing["type"], "typing");
    assert_eq!(typing["userId"], 7);
    assert_eq!(typing["isTyping"], true);
    // alice の最初のフレームは typing ではなく message
    let first_for_alice = recv(&mut alice).await;
    assert_eq!(first_for_alice["type"], "message");
}

#[tokio::test]
async fn test_edit_is_broadcast_and_visible_in_history() {
    // テスト項目: 作成者による編集が全員に通知され、履歴に反映される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect_as(42, "7", "alice").await;
    let mut bob = server.connect_as(42, "8", "bob").await;
    send(&mut alice, message_frame(42, 7, "alice", "helo")).await;
    recv(&mut alice).await;
    recv(&mut bob).await;

    // when (操作):
    send(&mut alice, json!({"type": "edit", "messageId": 1, "content": "hello"})).await;

    // then (期待する結果):
    for socket in [&mut alice, &mut bob] {
        let frame = recv(socket).await;
        assert_eq!(frame, json!({"type": "message_updated", "messageId": 1, "content": "hello"}));
    }
    let history = server.get_json("/projects/42/chat/messages").await;
    assert_eq!(history[0]["content"], "hello");
}

#[tokio::test]
async fn test_edit_by_other_user_is_ignored() {
    // テスト項目: 作成者以外の編集は破棄され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect_as(42, "7", "alice").await;
    let mut bob = server.connect_as(42, "8", "bob").await;
    send(&mut alice, message_frame(42, 7, "alice", "mine")).await;
    recv(&mut alice).await;
    recv(&mut bob).await;

    // when (操作):
    send(&mut bob, json!({"type": "edit", "messageId": 1, "content": "hijacked"})).await;
    send(&mut bob, message_frame(42, 8, "bob", "still here")).await;

    // then (期待する結果):
    let next = recv(&mut bob).await;
    assert_eq!(next["type"], "message");
    assert_eq!(next["message"]["content"], "still here");
    let history = server.get_json("/projects/42/chat/messages").await;
    assert_eq!(history[0]["content"], "mine");
}

#[tokio::test]
async fn test_permissive_edit_policy() {
    // テスト項目: Permissive 設定では誰でも編集できる
    // given (前提条件):
    let server = TestServer::start_with(EditPolicy::Permissive, SessionLimits::default()).await;
    let mut alice = server.connect(42).await;
    send(&mut alice, message_frame(42, 7, "alice", "v1")).await;
    recv(&mut alice).await;
    let mut mallory = server.connect_as(42, "9", "mallory").await;

    // when (操作):
    send(&mut mallory, json!({"type": "edit", "messageId": 1, "content": "v2"})).await;

    // then (期待する結果):
    let frame = recv(&mut alice).await;
    assert_eq!(frame["type"], "message_updated");
    assert_eq!(frame["content"], "v2");
}

#[tokio::test]
async fn test_mark_read_twice_keeps_one_receipt() {
    // テスト項目: 同じメッセージを 2 回既読にしても readBy は 1 件
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;
    send(&mut alice, message_frame(42, 7, "alice", "read me")).await;
    recv(&mut alice).await;

    // when (操作):
    let mark = json!({"type": "mark_read", "userId": 8, "userName": "bob", "messageIds": [1]});
    send(&mut alice, mark.clone()).await;
    let first = recv(&mut alice).await;
    send(&mut alice, mark).await;
    let second = recv(&mut alice).await;

    // then (期待する結果):
    assert_eq!(first["type"], "read_receipt_update");
    assert_eq!(first["messageIds"], json!([1]));
    assert_eq!(first["userName"], "bob");
    assert!(second["readAt"].as_i64().unwrap() >= first["readAt"].as_i64().unwrap());
    let history = server.get_json("/projects/42/chat/messages").await;
    let read_by = history[0]["readBy"].as_array().unwrap();
    assert_eq!(read_by.len(), 1);
    assert_eq!(read_by[0]["userId"], 8);
    assert_eq!(read_by[0]["readAt"], second["readAt"]);
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    // テスト項目: 不正なフレームの後も同じ接続でメッセージを送れる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;

    // when (操作):
    alice
        .send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    send(&mut alice, json!({"type": "shout", "content": "?"})).await;
    send(&mut alice, json!({"type": "message", "projectId": 42})).await;
    send(&mut alice, message_frame(42, 7, "alice", "ok")).await;

    // then (期待する結果):
    let frame = recv(&mut alice).await;
    assert_eq!(frame["message"]["content"], "ok");
    assert_eq!(frame["message"]["id"], 1);
}

#[tokio::test]
async fn test_text_project_rooms_are_isolated() {
    // テスト項目: 文字列のプロジェクト ID "A" と "B" のルームは互いに独立している
    // given (前提条件):
    let server = TestServer::start().await;
    let mut in_a = server.connect("A").await;
    let mut in_b = server.connect("B").await;

    // when (操作):
    send(&mut in_a, message_frame("A", "u-7", "alice", "for A")).await;
    send(&mut in_b, message_frame("B", "u-8", "bob", "for B")).await;

    // then (期待する結果):
    let frame = recv(&mut in_a).await;
    assert_eq!(frame["message"]["projectId"], "A");
    assert_eq!(frame["message"]["userId"], "u-7");
    assert_eq!(recv(&mut in_b).await["message"]["content"], "for B");
    let history_a = server.get_json("/projects/A/chat/messages").await;
    let history_b = server.get_json("/projects/B/chat/messages").await;
    assert_eq!(history_a.as_array().unwrap().len(), 1);
    assert_eq!(history_a[0]["content"], "for A");
    assert_eq!(history_b.as_array().unwrap().len(), 1);
    assert_eq!(history_b[0]["content"], "for B");
    assert_eq!(
        server.get_json("/projects/A/chat/unread/u-9").await,
        json!({"count": 0})
    );
}

#[tokio::test]
async fn test_numeric_and_string_project_ids_share_a_room() {
    // テスト項目: projectId の数値 42 と文字列 "42" は同じルームを指す
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;

    // when (操作):
    send(&mut alice, message_frame("42", "7", "alice", "as text")).await;

    // then (期待する結果):
    let frame = recv(&mut alice).await;
    assert_eq!(frame["message"]["projectId"], 42);
    assert_eq!(frame["message"]["userId"], 7);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: 別プロジェクトのルームにはメッセージも履歴も漏れない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut in_42 = server.connect(42).await;
    let mut in_43 = server.connect(43).await;

    // when (操作):
    send(&mut in_42, message_frame(42, 7, "alice", "for 42")).await;
    send(&mut in_43, message_frame(43, 8, "bob", "for 43")).await;

    // then (期待する結果):
    assert_eq!(recv(&mut in_42).await["message"]["content"], "for 42");
    assert_eq!(recv(&mut in_43).await["message"]["content"], "for 43");
    let history_42 = server.get_json("/projects/42/chat/messages").await;
    let history_43 = server.get_json("/projects/43/chat/messages").await;
    assert_eq!(history_42.as_array().unwrap().len(), 1);
    assert_eq!(history_43.as_array().unwrap().len(), 1);
    assert_eq!(history_42[0]["content"], "for 42");
    // ID はルームごとに 1 から払い出される
    assert_eq!(history_43[0]["id"], 1);
}

#[tokio::test]
async fn test_unread_counter_endpoint() {
    // テスト項目: 既読後に届いたメッセージ数が未読数として返る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut bob = server.connect_as(42, "8", "bob").await;
    send(
        &mut bob,
        json!({"type": "mark_read", "userId": 8, "userName": "bob", "messageIds": []}),
    )
    .await;
    recv(&mut bob).await;
    let mut alice = server.connect_as(42, "7", "alice").await;

    // when (操作):
    send(&mut alice, message_frame(42, 7, "alice", "one")).await;
    send(&mut alice, message_frame(42, 7, "alice", "two")).await;
    recv(&mut bob).await;
    recv(&mut bob).await;

    // then (期待する結果):
    assert_eq!(
        server.get_json("/projects/42/chat/unread/8").await,
        json!({"count": 2})
    );
    assert_eq!(
        server.get_json("/projects/42/chat/unread/7").await,
        json!({"count": 0})
    );
}

#[tokio::test]
async fn test_host_routes_and_fallthrough() {
    // テスト項目: チャット以外のパスはホストアプリケーションに渡される
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let health = reqwest::get(server.http_url("/api/health")).await.unwrap();
    let unknown = reqwest::get(server.http_url("/projects/42/tasks")).await.unwrap();
    let plain_chat = reqwest::get(server.http_url("/projects/42/chat")).await.unwrap();

    // then (期待する結果):
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(health.json::<Value>().await.unwrap(), json!({"status": "ok"}));
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
    // Upgrade ヘッダーのないチャットパスもホスト側で処理される
    assert_eq!(plain_chat.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_session_is_closed() {
    // テスト項目: ping に応答せず何も送らないセッションはサーバー側から閉じられる
    // given (前提条件):
    let limits = SessionLimits::default().with_idle_timeout_secs(1);
    let server = TestServer::start_with(EditPolicy::AuthorOnly, limits).await;
    let mut alice = server.connect(42).await;

    // when (操作):
    // 読み出さない間は pong も返らない
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let closed = tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match alice.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;

    // then (期待する結果):
    assert!(closed.is_ok());
}

#[tokio::test]
async fn test_receive_only_session_survives_idle_timeout() {
    // テスト項目: 自分からは送信せず受信だけしているセッションも、ping に応答していれば閉じられない
    // given (前提条件):
    let limits = SessionLimits::default().with_idle_timeout_secs(1);
    let server = TestServer::start_with(EditPolicy::AuthorOnly, limits).await;
    let mut listener = server.connect(42).await;
    let mut poster = server.connect(42).await;

    // when (操作):
    for i in 0..12 {
        send(&mut poster, message_frame(42, 7, "alice", &format!("m{}", i))).await;
        let frame = recv(&mut listener).await;
        assert_eq!(frame["message"]["content"], format!("m{}", i));
        recv(&mut poster).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // then (期待する結果):
    // 2.4 秒経過後も listener は配信を受け取れる
    send(&mut poster, message_frame(42, 7, "alice", "still listening?")).await;
    assert_eq!(recv(&mut listener).await["message"]["content"], "still listening?");
}

#[tokio::test]
async fn test_oversized_frame_is_dropped_without_closing() {
    // テスト項目: 上限を超えるフレームは破棄され、同じ接続で送信を続けられる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(42).await;
    let limit = SessionLimits::default().max_frame_bytes;

    // when (操作):
    send(&mut alice, message_frame(42, 7, "alice", &"x".repeat(limit + 1))).await;
    send(&mut alice, message_frame(42, 7, "alice", "small")).await;

    // then (期待する結果):
    let frame = recv(&mut alice).await;
    assert_eq!(frame["message"]["content"], "small");
    assert_eq!(frame["message"]["id"], 1);
}
