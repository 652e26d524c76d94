use std::io::{Cursor, Result as IoResult};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use qrgen::events::{self, EventReceiver};
use qrgen::{NoticeKind, QrController, QrFormat, QrgenConfig, UiEvent};

const SVG_BODY: &str = r##"<?xml version="1.0" encoding="UTF-8"?><svg xmlns="http://www.w3.org/2000/svg" width="300" height="300"><rect width="300" height="300" fill="#fff"/></svg>"##;

fn next_free_port() -> IoResult<SocketAddr> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qrgen-it-{name}-{}", uuid::Uuid::new_v4()))
}

fn png_of_size(pixels: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(pixels, pixels, |x, _| {
        if (x / 10) % 2 == 0 { Luma([0]) } else { Luma([255]) }
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture png");
    out.into_inner()
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Minimal stand-in for the QR API: answers `format=png` with a PNG of the
/// requested size and `format=svg` with SVG markup. Paths under `/missing`
/// answer 404.
struct StubApi {
    addr: SocketAddr,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StubApi {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let queries = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&queries);

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve(stream, recorded).await;
                });
            }
        });

        Self { addr, queries }
    }

    fn base(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

async fn serve(mut stream: TcpStream, recorded: Arc<Mutex<Vec<String>>>) -> IoResult<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request = String::from_utf8_lossy(&buf);
    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    recorded.lock().unwrap().push(query.to_string());

    let (status, content_type, body) = if path.starts_with("/missing") {
        ("404 Not Found", "text/html", b"<h1>Not Found</h1>".to_vec())
    } else if query_param(query, "format") == Some("svg") {
        ("200 OK", "image/svg+xml", SVG_BODY.as_bytes().to_vec())
    } else {
        let pixels = query_param(query, "size")
            .and_then(|s| s.split('x').next())
            .and_then(|w| w.parse().ok())
            .unwrap_or(150);
        ("200 OK", "image/png", png_of_size(pixels))
    };

    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&body).await?;
    stream.shutdown().await?;
    Ok(())
}

fn controller(base_url: String, download_dir: &Path) -> (QrController, EventReceiver) {
    let mut config = QrgenConfig::default();
    config.api.base_url = base_url;
    config.ui.display_delay_ms = 0;
    config.storage.download_dir = download_dir.to_path_buf();
    config.storage.preferences_file = Some(scratch_dir("prefs").join("preferences.json"));

    let (tx, rx) = events::channel();
    let controller = QrController::from_config(&config, tx).expect("build controller");
    (controller, rx)
}

fn notices(rx: &mut EventReceiver) -> Vec<(NoticeKind, String)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let UiEvent::Notice(notice) = event {
            out.push((notice.kind, notice.message));
        }
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn png_generated_and_downloaded() -> anyhow::Result<()> {
    let api = StubApi::start().await;
    let dir = scratch_dir("png");
    let (mut controller, mut rx) = controller(api.base("/v1/create-qr-code/"), &dir);

    let displayed = controller
        .generate("  hello world  ")
        .await?
        .expect("input is not blank");
    assert_eq!(displayed.format(), QrFormat::Png);

    let outcome = controller.download().await?;
    let saved = outcome.saved.expect("png saved");
    assert_eq!(saved, dir.join("qrcode.png"));

    let saved_image = image::open(&saved)?;
    assert_eq!((saved_image.width(), saved_image.height()), (300, 300));

    assert_eq!(
        api.queries(),
        vec!["size=300x300&data=hello%20world&format=png".to_string()]
    );
    assert_eq!(
        notices(&mut rx),
        vec![(NoticeKind::Success, "PNG Downloaded!".to_string())]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn svg_generated_and_downloaded() -> anyhow::Result<()> {
    let api = StubApi::start().await;
    let dir = scratch_dir("svg");
    let (mut controller, mut rx) = controller(api.base("/v1/create-qr-code/"), &dir);

    controller.select_format(QrFormat::Svg);
    controller.generate("https://www.rust-lang.org/").await?;
    let outcome = controller.download().await?;

    let saved = outcome.saved.expect("svg saved");
    assert_eq!(saved, dir.join("qrcode.svg"));
    assert_eq!(std::fs::read_to_string(&saved)?, SVG_BODY);
    assert!(
        api.queries()
            .iter()
            .all(|q| q == "size=300x300&data=https%3A%2F%2Fwww.rust-lang.org%2F&format=svg")
    );
    assert_eq!(
        notices(&mut rx),
        vec![(NoticeKind::Success, "SVG Downloaded!".to_string())]
    );

    let second = controller.download().await?;
    assert_eq!(second.saved, Some(dir.join("qrcode (1).svg")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn svg_download_with_api_unreachable() -> anyhow::Result<()> {
    let addr = next_free_port()?;
    let dir = scratch_dir("offline");
    let (mut controller, mut rx) =
        controller(format!("http://{addr}/v1/create-qr-code/"), &dir);

    controller.select_format(QrFormat::Svg);
    let displayed = controller.generate("offline").await?.expect("displayed");

    let outcome = controller.download().await?;

    assert!(outcome.saved.is_none());
    assert!(!dir.join("qrcode.svg").exists());
    assert_eq!(
        notices(&mut rx),
        vec![(NoticeKind::Failure, "Download failed. Try again.".to_string())]
    );
    let still = controller.displayed().expect("result still displayed");
    assert_eq!(still.source_url(), displayed.source_url());
    assert_eq!(still.format(), QrFormat::Svg);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn png_download_from_broken_image_is_soft_failure() -> anyhow::Result<()> {
    let api = StubApi::start().await;
    let dir = scratch_dir("broken");
    let (mut controller, mut rx) = controller(api.base("/missing/"), &dir);

    controller.generate("nothing here").await?;
    let outcome = controller.download().await?;

    assert!(outcome.saved.is_none());
    assert!(!dir.join("qrcode.png").exists());
    assert_eq!(
        notices(&mut rx),
        vec![(NoticeKind::Info, "Download started...".to_string())]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blank_input_never_reaches_api() -> anyhow::Result<()> {
    let api = StubApi::start().await;
    let dir = scratch_dir("blank");
    let (mut controller, mut rx) = controller(api.base("/v1/create-qr-code/"), &dir);

    assert!(controller.generate(" \n\t").await?.is_none());
    assert!(controller.view().is_idle());
    assert!(matches!(
        rx.try_recv(),
        Ok(UiEvent::InputRejected { .. })
    ));
    assert!(api.queries().is_empty());
    Ok(())
}
