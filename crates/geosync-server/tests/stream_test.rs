//! End-to-end stream tests.
//!
//! Each test starts a server on an ephemeral port with a short broadcast
//! interval and drives it through the SDK client.

use std::net::SocketAddr;
use std::time::Duration;

use geosync_core::{issue_token, ErrorPayload, LocationBroadcast, ServerEvent};
use geosync_sdk::{GeoSyncClient, LocationStream};
use geosync_server::config::Config;
use geosync_server::server;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const SECRET: &str = "stream-test-secret";
const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    base_url: String,
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr: SocketAddr = listener.local_addr().unwrap();
        let state = server::build_state(config).await;
        let (shutdown, _) = broadcast::channel(1);
        let handle = tokio::spawn(server::serve(listener, state, shutdown.clone()));
        Self {
            base_url: format!("http://{}", addr),
            shutdown,
            handle,
        }
    }

    fn client(&self) -> GeoSyncClient {
        GeoSyncClient::new(self.base_url.clone())
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = timeout(WAIT, self.handle).await;
    }
}

fn test_config() -> Config {
    Config {
        jwt_secret: SECRET.to_string(),
        broadcast_interval: Duration::from_millis(100),
        persistence_enabled: false,
        ..Config::default()
    }
}

fn token_for(user_id: &str) -> String {
    issue_token(SECRET.as_bytes(), user_id, 3600).unwrap()
}

/// Read events until an error arrives, failing on timeout.
async fn next_error(stream: &mut LocationStream) -> ErrorPayload {
    timeout(WAIT, async {
        loop {
            match stream.next_event().await.expect("read event") {
                Some(ServerEvent::Error(payload)) => return payload,
                Some(ServerEvent::UserLocationUpdate(_)) => continue,
                None => panic!("stream closed before error"),
            }
        }
    })
    .await
    .expect("timed out waiting for error event")
}

/// Read broadcasts until one satisfies `accept`, failing on timeout.
async fn broadcast_where<F>(stream: &mut LocationStream, accept: F) -> Vec<LocationBroadcast>
where
    F: Fn(&[LocationBroadcast]) -> bool,
{
    timeout(WAIT, async {
        loop {
            let entries = stream
                .next_broadcast()
                .await
                .expect("read broadcast")
                .expect("stream closed before broadcast");
            if accept(&entries) {
                return entries;
            }
        }
    })
    .await
    .expect("timed out waiting for broadcast")
}

#[tokio::test]
async fn accepted_update_appears_in_next_broadcast() {
    let server = TestServer::start(test_config()).await;
    let mut stream = server.client().connect().await.expect("connect");

    stream
        .send_update(&token_for("alice"), 37.7, -122.4)
        .await
        .unwrap();

    let entries = broadcast_where(&mut stream, |entries| {
        entries.iter().any(|e| e.user_id == "alice")
    })
    .await;
    let alice = entries.iter().find(|e| e.user_id == "alice").unwrap();
    assert_eq!(alice.position, [37.7, -122.4]);
    assert!(chrono::DateTime::parse_from_rfc3339(&alice.timestamp).is_ok());

    stream.close().await.ok();
    server.stop().await;
}

#[tokio::test]
async fn out_of_range_update_reports_error_and_is_not_broadcast() {
    let server = TestServer::start(test_config()).await;
    let mut stream = server.client().connect().await.expect("connect");

    stream.send_update(&token_for("bob"), 999.0, 0.0).await.unwrap();
    let error = next_error(&mut stream).await;
    assert_eq!(error.message, "Invalid latitude or longitude");

    let entries = broadcast_where(&mut stream, |_| true).await;
    assert!(entries.iter().all(|e| e.user_id != "bob"));

    server.stop().await;
}

#[tokio::test]
async fn expired_token_reports_error() {
    let server = TestServer::start(test_config()).await;
    let mut stream = server.client().connect().await.expect("connect");

    let expired = issue_token(SECRET.as_bytes(), "carol", -3600).unwrap();
    stream.send_update(&expired, 1.0, 1.0).await.unwrap();

    let error = next_error(&mut stream).await;
    assert_eq!(error.message, "Invalid or expired token");

    let entries = broadcast_where(&mut stream, |_| true).await;
    assert!(entries.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn every_subscriber_sees_updates_from_others() {
    let server = TestServer::start(test_config()).await;
    let mut publisher = server.client().connect().await.expect("connect publisher");
    let mut watcher = server.client().connect().await.expect("connect watcher");

    publisher
        .send_update(&token_for("alice"), 10.0, 20.0)
        .await
        .unwrap();
    publisher
        .send_update(&token_for("bob"), -10.0, -20.0)
        .await
        .unwrap();

    let entries = broadcast_where(&mut watcher, |entries| entries.len() == 2).await;
    let users: Vec<&str> = entries.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(users, ["alice", "bob"]);

    server.stop().await;
}

#[tokio::test]
async fn stream_token_is_enforced_when_required() {
    let config = Config {
        require_stream_token: true,
        ..test_config()
    };
    let server = TestServer::start(config).await;

    assert!(server.client().connect().await.is_err());

    let mut client = server.client();
    client.set_stream_token(Some(token_for("watcher")));
    let mut stream = client.connect().await.expect("connect with token");
    let entries = broadcast_where(&mut stream, |_| true).await;
    assert!(entries.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn positions_survive_restart_with_persistence() {
    let db_path = std::env::temp_dir()
        .join(format!("geosync-test-{}.db", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    let config = Config {
        persistence_enabled: true,
        database_path: db_path.clone(),
        database_max_connections: 1,
        ..test_config()
    };

    let server = TestServer::start(config.clone()).await;
    let mut stream = server.client().connect().await.expect("connect");
    stream
        .send_update(&token_for("alice"), 37.7, -122.4)
        .await
        .unwrap();
    broadcast_where(&mut stream, |entries| !entries.is_empty()).await;
    stream.close().await.ok();
    server.stop().await;

    let state = server::build_state(config).await;
    let restored = state.store().get("alice").expect("alice restored");
    assert_eq!((restored.latitude, restored.longitude), (37.7, -122.4));

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn unusable_database_falls_back_to_memory() {
    let blocker = std::env::temp_dir().join(format!("geosync-blocker-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();
    let config = Config {
        persistence_enabled: true,
        database_path: blocker.join("geosync.db").to_string_lossy().to_string(),
        ..test_config()
    };

    let server = TestServer::start(config).await;
    assert!(server.client().health().await.unwrap());

    let mut stream = server.client().connect().await.expect("connect");
    stream.send_update(&token_for("dave"), 5.0, 5.0).await.unwrap();
    broadcast_where(&mut stream, |entries| {
        entries.iter().any(|e| e.user_id == "dave")
    })
    .await;

    server.stop().await;
    let _ = std::fs::remove_file(&blocker);
}
