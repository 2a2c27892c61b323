use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use triage_artifacts::{CiProvider, GithubProvider};

/// Artifact listing for run 7: ids 1..=105 in pages of 100, id 103 expired.
fn artifact_page(page: u32) -> String {
    let ids = match page {
        1 => 1..=100u64,
        2 => 101..=105,
        _ => 1..=0,
    };
    let artifacts: Vec<serde_json::Value> = ids
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": format!("cy-logs-{id}"),
                "size_in_bytes": 10,
                "expired": id == 103,
            })
        })
        .collect();
    serde_json::json!({ "total_count": 105, "artifacts": artifacts }).to_string()
}

async fn read_request_line(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Serve GitHub-style artifact pages on a local port, recording each request target.
async fn serve_pages() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let request = read_request_line(&mut stream).await;
            let target = request.split_whitespace().nth(1).unwrap_or_default().to_string();
            let page = target
                .split("page=")
                .last()
                .and_then(|p| p.parse::<u32>().ok())
                .unwrap_or(0);
            log.lock().unwrap().push(target);

            let body = artifact_page(page);
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn artifact_listing_follows_pages_until_the_total() {
    let (api_url, seen) = serve_pages().await;
    let provider = GithubProvider::new("acme/shop", Some("t0ken"), Some(&api_url)).unwrap();

    let artifacts = provider.list_artifacts(7).await.unwrap();

    assert_eq!(artifacts.len(), 104);
    assert_eq!(artifacts.first().map(|a| a.id), Some(1));
    assert_eq!(artifacts.last().map(|a| a.id), Some(105));
    assert!(artifacts.iter().all(|a| a.id != 103));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "/repos/acme/shop/actions/runs/7/artifacts?per_page=100&page=1".to_string(),
            "/repos/acme/shop/actions/runs/7/artifacts?per_page=100&page=2".to_string(),
        ]
    );
}
