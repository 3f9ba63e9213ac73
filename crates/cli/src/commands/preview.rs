use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use sitepack_core::STATE_FILE;
use sitepack_generator::{GeneratedSite, generate_site, plan, preview_urls};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;

use super::project::Project;

const RELOAD_SCRIPT: &str = r#"<script>
new EventSource('/_reload').onmessage = () => location.reload();
</script>"#;

#[derive(Clone)]
struct AppState {
    site_path: PathBuf,
    reload_tx: broadcast::Sender<()>,
}

/// Serve the finished site locally with live reload.
///
/// Every request renders the site again from disk, so edits to pages and
/// to `.sitepack.toml` show up on the next load without a restart.
///
/// # Arguments
///
/// * `path` - Site folder to serve
/// * `port` - Port to listen on, bound to 127.0.0.1
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("🌐 Starting preview server...");
    println!("   Site: {}", path.display());

    // Load the site once up front so a broken folder fails fast
    let project = Project::open(&path)?;
    let base_url = format!("http://localhost:{}", port);
    match plan(&project.site) {
        Ok(plan) => {
            for (page, url) in preview_urls(&project.site, &plan, &base_url) {
                println!("   {} -> {}", page, url);
            }
        }
        Err(e) => println!("   ⚠ {}", e),
    }

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        site_path: path.clone(),
        reload_tx: reload_tx.clone(),
    };

    // Build router
    let app = Router::new()
        .route("/_reload", get(sse_handler))
        .fallback(site_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start file watcher
    let watcher_path = path.clone();
    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(watcher_path, watcher_tx).await {
            tracing::error!(error = %e, "file watcher stopped");
        }
    });

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: {}", base_url);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                if event.paths.iter().any(|p| triggers_reload(p)) {
                    println!("   📝 File changed, reloading...");
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Editor temp files and hidden files are ignored, except the state file
fn triggers_reload(path: &Path) -> bool {
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    if filename == STATE_FILE {
        return true;
    }
    !filename.starts_with('.') && !filename.ends_with('~')
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    yield Ok(Event::default().data("reload"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn site_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let generated = match Project::open(&state.site_path).and_then(|p| generate_site(&p.site)) {
        Ok(generated) => generated,
        Err(e) => {
            tracing::warn!(error = %e, "preview render failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(error_page(&format!("{:#}", e))))
                .into_response();
        }
    };

    // Request paths arrive percent-encoded
    let path = urlencoding::decode(uri.path())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| uri.path().to_string());

    match lookup(&generated, &path) {
        Some((resolved, data)) => {
            let mime = mime_guess::from_path(&resolved).first_or_octet_stream();
            let body = if mime.essence_str() == "text/html" {
                inject_reload(&String::from_utf8_lossy(&data)).into_bytes()
            } else {
                data
            };
            ([(header::CONTENT_TYPE, mime.to_string())], body).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Html(error_page(&format!("Not found: {}", path))),
        )
            .into_response(),
    }
}

/// Find the file a static host would serve for `path`: the exact file,
/// else the directory's `index.html`. Returns the resolved path.
fn lookup(site: &GeneratedSite, path: &str) -> Option<(String, Vec<u8>)> {
    let path = path.trim_start_matches('/');
    let candidates = if path.is_empty() || path.ends_with('/') {
        vec![format!("{}index.html", path)]
    } else {
        vec![path.to_string(), format!("{}/index.html", path)]
    };

    candidates
        .into_iter()
        .find_map(|candidate| site.get(&candidate).map(|data| (candidate, data.into_owned())))
}

/// Add the live reload script before `</body>`, or at the end
fn inject_reload(html: &str) -> String {
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(i) => format!("{}{}{}", &html[..i], RELOAD_SCRIPT, &html[i..]),
        None => format!("{}{}", html, RELOAD_SCRIPT),
    }
}

fn error_page(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Preview error</title></head><body>
<h1>Preview error</h1>
<pre>{}</pre>
{}
</body></html>"#,
        escaped, RELOAD_SCRIPT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> GeneratedSite {
        GeneratedSite {
            pages: vec![
                ("index.html".to_string(), "<body>home</body>".to_string()),
                ("docs/index.html".to_string(), "docs".to_string()),
                ("my page.html".to_string(), "spaced".to_string()),
            ],
            assets: vec![("css/a.css".to_string(), b"a{}".to_vec())],
        }
    }

    #[test]
    fn test_lookup() {
        let site = site();
        assert_eq!(lookup(&site, "/").unwrap().0, "index.html");
        assert_eq!(lookup(&site, "/docs").unwrap().0, "docs/index.html");
        assert_eq!(lookup(&site, "/docs/").unwrap().0, "docs/index.html");
        assert_eq!(lookup(&site, "/css/a.css").unwrap().1, b"a{}");
        assert_eq!(lookup(&site, "/my page.html").unwrap().1, b"spaced");
        assert!(lookup(&site, "/missing.html").is_none());
    }

    #[test]
    fn test_inject_reload() {
        let html = inject_reload("<html><BODY>x</BODY></html>");
        assert!(html.starts_with("<html><BODY>x<script>"));
        assert!(html.ends_with("</script></BODY></html>"));

        let fragment = inject_reload("<p>x</p>");
        assert!(fragment.starts_with("<p>x</p><script>"));
    }

    #[test]
    fn test_triggers_reload() {
        assert!(triggers_reload(Path::new("/site/index.html")));
        assert!(triggers_reload(&Path::new("/site").join(STATE_FILE)));
        assert!(!triggers_reload(Path::new("/site/.git")));
        assert!(!triggers_reload(Path::new("/site/index.html~")));
    }

    #[test]
    fn test_error_page_escapes() {
        let page = error_page("<bad>");
        assert!(page.contains("&lt;bad&gt;"));
    }
}
