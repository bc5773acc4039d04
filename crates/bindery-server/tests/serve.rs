//! Serves a small notes API over a real socket.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bindery_bind::Binder;
use bindery_config::ServerConfig;
use bindery_core::{ApiError, Identity, RequestContext};
use bindery_server::{RouteTable, Server, ShutdownSignal};
use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderMap, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Deserialize)]
struct NewNote {
    title: String,
}

#[derive(Debug, Clone, Serialize)]
struct Note {
    id: usize,
    title: String,
}

type Notes = Arc<Mutex<Vec<Note>>>;

fn routes(notes: &Notes) -> RouteTable {
    let create = {
        let notes = Arc::clone(notes);
        move |_ctx: RequestContext, input: NewNote| {
            let notes = Arc::clone(&notes);
            async move {
                if input.title.is_empty() {
                    return Err(ApiError::bad_request("title is required"));
                }
                let mut notes = notes.lock().unwrap();
                let note = Note {
                    id: notes.len() + 1,
                    title: input.title,
                };
                notes.push(note.clone());
                Ok(note)
            }
        }
    };
    let list = {
        let notes = Arc::clone(notes);
        move |_ctx: RequestContext| {
            let notes = Arc::clone(&notes);
            async move { Ok::<_, ApiError>(notes.lock().unwrap().clone()) }
        }
    };

    RouteTable::builder(Binder::new())
        .post("/notes", create)
        .get("/notes", list)
        .get("/me", |_ctx: RequestContext, id: Identity| async move {
            Ok::<_, ApiError>(id)
        })
        .post("/slow", |_ctx: RequestContext| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
        })
        .build()
        .unwrap()
}

struct Running {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    task: JoinHandle<()>,
}

async fn start(routes: RouteTable) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        http_addr: addr.to_string(),
        shutdown_timeout_secs: 2,
        ..ServerConfig::default()
    };
    let shutdown = ShutdownSignal::new();
    let task = tokio::spawn(Server::new(config, routes).serve(listener, shutdown.clone()));
    Running {
        addr,
        shutdown,
        task,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

async fn send(addr: SocketAddr, request: Request<Full<Bytes>>) -> Reply {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

fn post(path: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::post(path)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

fn get(path: &str) -> Request<Full<Bytes>> {
    Request::get(path).body(Full::new(Bytes::new())).unwrap()
}

/// Test create and list through the server.
#[tokio::test]
async fn test_create_and_list() {
    let notes = Notes::default();
    let server = start(routes(&notes)).await;

    let created = send(server.addr, post("/notes", r#"{"title":"groceries"}"#)).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.headers[CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(created.body, "{\"id\":1,\"title\":\"groceries\"}\n");

    let listed = send(server.addr, get("/notes")).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, "[{\"id\":1,\"title\":\"groceries\"}]\n");

    server.shutdown.trigger();
    server.task.await.unwrap();
}

/// Test that caller errors and decode errors reach the client.
#[tokio::test]
async fn test_error_responses() {
    let server = start(routes(&Notes::default())).await;

    let invalid = send(server.addr, post("/notes", r#"{"title":""}"#)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body, "{\"error\":\"title is required\"}\n");

    let unknown = send(server.addr, post("/notes", r#"{"title":"a","pinned":true}"#)).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert!(unknown.body.contains("unknown field"));

    let anonymous = send(server.addr, get("/me")).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    server.shutdown.trigger();
    server.task.await.unwrap();
}

/// Test routing misses.
#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let server = start(routes(&Notes::default())).await;

    let missing = send(server.addr, get("/nothing")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, "{\"error\":\"Not Found\"}\n");

    let wrong = send(server.addr, post("/me", "")).await;
    assert_eq!(wrong.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong.headers[ALLOW], "GET");

    server.shutdown.trigger();
    server.task.await.unwrap();
}

/// Test that an in-flight request completes after shutdown is triggered.
#[tokio::test]
async fn test_graceful_shutdown_drains() {
    let server = start(routes(&Notes::default())).await;

    let addr = server.addr;
    let in_flight = tokio::spawn(async move { send(addr, post("/slow", "")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.shutdown.trigger();

    let reply = in_flight.await.unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "{}\n");

    tokio::time::timeout(Duration::from_secs(3), server.task)
        .await
        .expect("server should stop after draining")
        .unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}
