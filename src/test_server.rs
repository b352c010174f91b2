//! Minimal HTTP/1.1 server answering from a routing closure.
//!
//! Every connection serves one request and is closed. The text `{base}` in a
//! reply body is replaced with the server's own URL.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    body: Vec<u8>,
    declared_length: Option<usize>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            declared_length: None,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            declared_length: None,
        }
    }

    /// Announces `declared_length` bytes but sends only `body` before closing.
    pub fn truncated(body: &[u8], declared_length: usize) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            declared_length: Some(declared_length),
        }
    }

    pub fn not_found() -> Self {
        Self::json(404, serde_json::json!({ "title": "not found" }))
    }
}

pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let route = Arc::new(route);
        let recorded = Arc::clone(&requests);
        let base = url.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let route = Arc::clone(&route);
                let recorded = Arc::clone(&recorded);
                let base = base.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, route.as_ref(), &recorded, &base).await;
                });
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve<F>(
    stream: TcpStream,
    route: &F,
    recorded: &Mutex<Vec<Recorded>>,
    base: &str,
) -> std::io::Result<()>
where
    F: Fn(&Recorded) -> Reply,
{
    let mut stream = BufReader::new(stream);

    let mut line = String::new();
    stream.read_line(&mut line).await?;
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Ok(());
    };
    let (method, path) = (method.to_string(), path.to_string());

    let mut headers = Vec::new();
    loop {
        line.clear();
        stream.read_line(&mut line).await?;
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((key, value)) = header.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    stream.read_exact(&mut body).await?;

    let request = Recorded {
        method,
        path,
        headers,
        body,
    };
    let reply = route(&request);
    recorded.lock().unwrap().push(request);

    let body = match String::from_utf8(reply.body) {
        Ok(text) => text.replace("{base}", base).into_bytes(),
        Err(err) => err.into_bytes(),
    };
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.declared_length.unwrap_or(body.len())
    );

    let stream = stream.get_mut();
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&body).await?;
    stream.shutdown().await
}
