//! Connection-level behavior of the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use service_lifecycle::http::{ConnectionTimeouts, HttpServer, ServerConfig, ShutdownError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

mod common;

fn start(
    addr: SocketAddr,
    timeouts: ConnectionTimeouts,
    router: Router,
) -> (Arc<HttpServer>, JoinHandle<()>) {
    let server = Arc::new(HttpServer::new(
        ServerConfig {
            address: addr.to_string(),
            timeouts,
            max_connections: 16,
        },
        router,
    ));

    let serving = {
        let server = server.clone();
        tokio::spawn(async move {
            server.serve().await.expect("serve should end cleanly");
        })
    };

    (server, serving)
}

fn timeouts(write: Duration, idle: Duration) -> ConnectionTimeouts {
    ConnectionTimeouts {
        read: Duration::from_secs(1),
        write,
        idle,
    }
}

#[tokio::test]
async fn test_slow_handler_hits_write_timeout() {
    let addr: SocketAddr = "127.0.0.1:28486".parse().unwrap();
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "too late"
        }),
    );
    let (server, serving) = start(
        addr,
        timeouts(Duration::from_millis(200), Duration::from_secs(5)),
        router,
    );
    common::wait_for_listener(addr).await;

    let res = common::client()
        .get(format!("http://{}/slow", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 408);

    server.shutdown(Duration::from_secs(1)).await.unwrap();
    serving.await.unwrap();
}

#[tokio::test]
async fn test_idle_keep_alive_connection_is_closed() {
    let addr: SocketAddr = "127.0.0.1:28487".parse().unwrap();
    let (server, serving) = start(
        addr,
        timeouts(Duration::from_secs(5), Duration::from_millis(200)),
        common::ok_router(),
    );
    common::wait_for_listener(addr).await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let started = Instant::now();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut response))
        .await
        .expect("idle connection should be closed by the server")
        .unwrap();

    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("ok"));
    assert!(started.elapsed() >= Duration::from_millis(150));

    server.shutdown(Duration::from_secs(1)).await.unwrap();
    serving.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_listener_and_idle_connections() {
    let addr: SocketAddr = "127.0.0.1:28488".parse().unwrap();
    let (server, serving) = start(
        addr,
        timeouts(Duration::from_secs(5), Duration::from_secs(30)),
        common::ok_router(),
    );
    common::wait_for_listener(addr).await;

    let client = common::client();
    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");

    let started = Instant::now();
    server.shutdown(Duration::from_secs(5)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(server.is_closed());
    assert_eq!(server.active_count(), 0);

    serving.await.unwrap();
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_reports_connections_left_open() {
    let addr: SocketAddr = "127.0.0.1:28489".parse().unwrap();
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "done"
        }),
    );
    let (server, serving) = start(
        addr,
        timeouts(Duration::from_secs(10), Duration::from_secs(10)),
        router,
    );
    common::wait_for_listener(addr).await;

    let client = common::client();
    let in_flight =
        tokio::spawn(async move { client.get(format!("http://{}/slow", addr)).send().await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = server.shutdown(Duration::from_millis(200)).await.unwrap_err();
    let ShutdownError::DeadlineExceeded { grace, active } = err;
    assert_eq!(grace, Duration::from_millis(200));
    assert_eq!(active, 1);

    serving.await.unwrap();
    in_flight.abort();
}
