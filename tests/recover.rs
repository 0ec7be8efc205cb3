//! End-to-end recovery behaviour over a real socket.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use parapet::middleware::recover::{
    content_type, error_handler, logger, recover, response_status, stack_size, Logger, Recover,
    MIN_STACK_SIZE,
};
use parapet::{Method, Request, Response, Router, Server, Status};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Log sink that keeps every record, newline-terminated.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<String>>);

impl Buffer {
    fn contents(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}

impl Logger for Buffer {
    fn log(&self, record: &str) {
        let mut buf = self.0.lock().unwrap();
        buf.push_str(record);
        buf.push('\n');
    }
}

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), parapet::Error>>,
}

impl TestServer {
    async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(
            Server::from_listener(listener).serve_with_shutdown(router, async {
                let _ = stopped.await;
            }),
        );
        Self { addr, stop, task }
    }

    async fn shutdown(self) {
        self.stop.send(()).unwrap();
        self.task.await.unwrap().unwrap();
    }

    async fn request(&self, method: &str, path: &str) -> Option<Reply> {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let head = format!("{method} {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        stream.write_all(head.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        // A connection torn down mid-request may surface as a reset.
        let _ = stream.read_to_end(&mut raw).await;
        Reply::parse(&raw)
    }

    async fn get(&self, path: &str) -> Reply {
        self.request("GET", path).await.expect("no response")
    }
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn parse(raw: &[u8]) -> Option<Self> {
        let split = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = std::str::from_utf8(&raw[..split]).ok()?;
        let mut lines = head.split("\r\n");
        let status = lines.next()?.split(' ').nth(1)?.parse().ok()?;
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_owned()))
            .collect();
        Some(Self { status, headers, body: raw[split + 4..].to_vec() })
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

async fn bang(_req: Request) -> Response {
    panic!("!!!")
}

async fn aloha(_req: Request) -> Response {
    panic!("aloha")
}

async fn ok(_req: Request) -> Response {
    Response::text("ok")
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_policy_sends_empty_500() {
    let recover = Recover::new();
    let server = TestServer::start(Router::new().on(Method::Get, "/hello", recover.wrap(bang))).await;

    let reply = server.get("/hello").await;

    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert!(reply.body.is_empty(), "unexpected body {:?}", reply.body);

    server.shutdown().await;
}

#[tokio::test]
async fn options_shape_response_and_log() {
    let buf = Buffer::default();
    let recover = recover([
        content_type("application/xml"),
        response_status(Status::Ok),
        logger(buf.clone()),
        stack_size(1),
    ]);
    assert_eq!(recover.config().stack_size(), MIN_STACK_SIZE);
    let server = TestServer::start(Router::new().on(Method::Get, "/hello", recover.wrap(aloha))).await;

    let reply = server.get("/hello").await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("application/xml"));
    assert!(reply.body.is_empty());
    let log = buf.contents();
    assert!(log.starts_with("panic: aloha"), "log was {log:?}");
    assert_eq!(log.matches("panic: aloha").count(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn custom_error_handler_exposes_trace_and_skips_logger() {
    let buf = Buffer::default();
    let recover = recover([
        logger(buf.clone()),
        error_handler(|config, res, panic| {
            let error = format!("{}\n{}", panic.message(), panic.trace().join("\n"));
            let body = serde_json::to_vec(&serde_json::json!({ "error": error }))
                .expect("string map serializes");
            res.status(config.response_status())
                .header("content-type", config.content_type())
                .body(body)
        }),
    ]);
    let server = TestServer::start(Router::new().on(Method::Get, "/hello", recover.wrap(aloha))).await;

    let reply = server.get("/hello").await;

    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert!(reply.body.starts_with(br#"{"error":"panic: aloha"#));
    let parsed: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert!(parsed["error"].as_str().unwrap().starts_with("panic: aloha\n"));
    assert!(buf.contents().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn healthy_handler_is_untouched() {
    let buf = Buffer::default();
    let recover = recover([logger(buf.clone())]);
    let server = TestServer::start(Router::new().on(Method::Get, "/ok", recover.wrap(ok))).await;

    let reply = server.get("/ok").await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("text/plain; charset=utf-8"));
    assert_eq!(reply.body, b"ok");
    assert!(buf.contents().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn each_request_recovers_independently() {
    let buf = Buffer::default();
    let recover = recover([logger(buf.clone())]);
    let server = TestServer::start(
        Router::new()
            .on(Method::Get, "/hello", recover.wrap(bang))
            .on(Method::Get, "/ok", recover.wrap(ok)),
    )
    .await;

    let (a, b, c) = tokio::join!(server.get("/hello"), server.get("/ok"), server.get("/hello"));

    assert_eq!((a.status, b.status, c.status), (500, 200, 500));
    assert_eq!(buf.contents().matches("panic: !!!").count(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn unguarded_panic_drops_only_its_connection() {
    let server = TestServer::start(
        Router::new()
            .on(Method::Get, "/raw", bang)
            .on(Method::Get, "/ok", ok),
    )
    .await;

    assert!(server.request("GET", "/raw").await.is_none());
    assert_eq!(server.get("/ok").await.status, 200);

    server.shutdown().await;
}

#[tokio::test]
async fn unrouted_requests_get_404_and_405() {
    let server = TestServer::start(Router::new().on(Method::Get, "/ok", ok)).await;

    assert_eq!(server.get("/missing").await.status, 404);
    assert_eq!(server.request("BREW", "/ok").await.unwrap().status, 405);

    server.shutdown().await;
}

#[tokio::test]
async fn bind_failure_reports_the_address() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let err = Server::bind(&addr.to_string())
        .serve_with_shutdown(Router::new(), std::future::pending())
        .await
        .unwrap_err();

    match &err {
        parapet::Error::Bind { addr: failed, source } => {
            assert_eq!(*failed, addr);
            assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains(&addr.to_string()));
}

#[tokio::test]
async fn json_error_body_survives_control_characters() {
    let recover = recover([error_handler(|_, res, panic| {
        let body = serde_json::json!({ "error": panic.message(), "trace": panic.trace() });
        res.status(Status::InternalServerError)
            .json(serde_json::to_vec(&body).unwrap_or_default())
    })]);
    let server = TestServer::start(Router::new().on(
        Method::Get,
        "/bell",
        recover.wrap(|_req: Request| async {
            if true {
                panic!("bell \u{7} and \"quotes\"");
            }
            Response::text("unreachable")
        }),
    ))
    .await;

    let reply = server.get("/bell").await;

    assert_eq!(reply.status, 500);
    let parsed: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(parsed["error"], "panic: bell \u{7} and \"quotes\"");
    assert!(parsed["trace"].is_array());

    server.shutdown().await;
}
