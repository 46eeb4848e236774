//! In-process HTTP server standing in for both Telegram and the
//! inference endpoint. Replies are scripted per path; every request
//! is recorded as soon as its body has arrived.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";

#[derive(Debug, Clone)]
pub struct Recorded
{   pub method: String
  , pub path: String
  , pub headers: HashMap<String, String>
  , pub body: String
}

impl Recorded
{   pub fn json(&self) -> serde_json::Value
    {   serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct Reply
{   pub status: u16
  , pub body: String
  , pub delay: Duration
}

impl Reply
{   pub fn new(status: u16, body: &str) -> Self
    {   Reply
        {   status
          , body: body.to_string()
          , delay: Duration::ZERO
        }
    }

    pub fn ok(body: &str) -> Self
    {   Reply::new(200, body)
    }

    pub fn delayed(mut self, delay: Duration) -> Self
    {   self.delay = delay;
        self
    }
}

type Routes = Arc<Mutex<HashMap<String, VecDeque<Reply>>>>;
type Log = Arc<Mutex<Vec<Recorded>>>;

pub struct MockServer
{   addr: SocketAddr
  , routes: Routes
  , log: Log
  , task: tokio::task::JoinHandle<()>
}

impl Drop for MockServer
{   fn drop(&mut self)
    {   self.task.abort();
    }
}

impl MockServer
{   pub async fn start() -> Self
    {   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::default();
        let log: Log = Arc::default();

        let task = {
          let routes = routes.clone();
          let log = log.clone();
          tokio::spawn(async move {
            loop
            {   let (stream, _) = match listener.accept().await
                {   Ok(conn) => conn
                  , Err(_) => break
                };
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                  let _ = serve(stream, routes, log).await;
                });
            }
          })
        };

        MockServer { addr, routes, log, task }
    }

    pub fn base_url(&self) -> String
    {   format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String
    {   format!("{}{}", self.base_url(), path)
    }

    /// Queue a reply for a path. The last queued reply repeats.
    pub fn route(&self, path: &str, reply: Reply)
    {   self.routes.lock().unwrap()
          .entry(path.to_string())
          .or_default()
          .push_back(reply);
    }

    pub fn requests(&self) -> Vec<Recorded>
    {   self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded>
    {   self.requests()
          .into_iter()
          .filter(|r| r.path == path)
          .collect()
    }

    /// Poll until at least `count` requests hit `path`
    pub async fn wait_for(
      &self
    , path: &str
    , count: usize
    ) -> Vec<Recorded>
    {   let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop
        {   let seen = self.requests_to(path);
            if seen.len() >= count
            {   return seen;
            }
            if tokio::time::Instant::now() > deadline
            {   panic!(
                  "expected {} requests to {}, saw {}",
                  count, path, seen.len()
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Path of a Bot API method for the test token
pub fn tg(method: &str) -> String
{   format!("/bot{}/{}", BOT_TOKEN, method)
}

pub fn tg_ok(result: serde_json::Value) -> Reply
{   Reply::ok(&serde_json::json!({"ok": true, "result": result}).to_string())
}

/// Routes that make every Telegram call succeed
pub fn route_telegram_defaults(server: &MockServer)
{   server.route(&tg("getMe"), tg_ok(serde_json::json!({
      "id": 1, "is_bot": true, "first_name": "Relay", "username": "relay_bot"
    })));
    server.route(&tg("sendChatAction"), tg_ok(serde_json::json!(true)));
    server.route(&tg("sendMessage"), tg_ok(serde_json::json!({
      "message_id": 99, "date": 0, "chat": {"id": 42, "type": "private"}
    })));
}

async fn serve(
  mut stream: TcpStream
, routes: Routes
, log: Log
) -> std::io::Result<()>
{   let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop
    {   let n = stream.read(&mut chunk).await?;
        if n == 0
        {   return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n")
        {   break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
      .filter_map(|l| l.split_once(':'))
      .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
      .collect();

    let content_length: usize = headers
      .get("content-length")
      .and_then(|v| v.parse().ok())
      .unwrap_or(0);

    while buf.len() < header_end + content_length
    {   let n = stream.read(&mut chunk).await?;
        if n == 0
        {   break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    log.lock().unwrap().push(Recorded
    {   method
      , path: path.clone()
      , headers
      , body
    });

    let reply = {
      let mut routes = routes.lock().unwrap();
      match routes.get_mut(&path)
      {   Some(queue) if queue.len() > 1 => queue.pop_front()
        , Some(queue) => queue.front().cloned()
        , None => None
      }
    }.unwrap_or_else(|| {
      Reply::new(404, r#"{"ok":false,"error_code":404,"description":"Not Found"}"#)
    });

    if !reply.delay.is_zero()
    {   tokio::time::sleep(reply.delay).await;
    }

    let response = format!(
      "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\n\
       Content-Length: {}\r\nConnection: close\r\n\r\n{}",
      reply.status,
      reply.body.len(),
      reply.body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// A server that accepts connections and never answers them.
/// Returns its base URL and a count of accepted connections.
pub async fn start_silent_server()
  -> (String, Arc<std::sync::atomic::AtomicUsize>, tokio::task::JoinHandle<()>)
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let task = {
      let accepted = accepted.clone();
      tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await
        {   accepted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            held.push(stream);
        }
      })
    };

    (format!("http://{}", addr), accepted, task)
}
