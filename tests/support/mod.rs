//! テスト用の簡易バックエンド
//!
//! 固定のステータスと本文を返すHTTPサーバーをtokioで立てる。受け取ったリクエストは記録する。

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct FakeBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    /// 受け取ったリクエスト（ヘッダー＋本文）
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("ロック失敗").clone()
    }
}

/// 全リクエストに同じ応答を返すサーバーを起動
pub async fn serve(status: u16, body: &str) -> FakeBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind失敗");
    let addr = listener.local_addr().expect("アドレス取得失敗");
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&requests);
    let body = body.to_string();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let recorded = Arc::clone(&recorded);
            let body = body.clone();
            tokio::spawn(async move {
                handle(stream, status, &body, &recorded).await;
            });
        }
    });

    FakeBackend {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// 接続できないURL（空きポートを確保してすぐ閉じる）
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind失敗");
    let addr = listener.local_addr().expect("アドレス取得失敗");
    drop(listener);
    format!("http://{}", addr)
}

async fn handle(mut stream: TcpStream, status: u16, body: &str, recorded: &Mutex<Vec<String>>) -> Option<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    // ヘッダー終端まで
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buffer, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let received = buffer.len() - header_end;
        let done = match content_length {
            Some(len) => received >= len,
            None if chunked => buffer.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if done {
            break;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    // 応答より先に記録する
    recorded
        .lock()
        .expect("ロック失敗")
        .push(String::from_utf8_lossy(&buffer).to_string());

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
