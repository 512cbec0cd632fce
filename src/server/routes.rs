//! Request routing under the mount path

use crate::config::Settings;
use crate::server::http::{Request, Response, Status};
use crate::server::views::{render, View};
use chrono::Utc;
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Route a request to a response
pub async fn route(request: &Request, settings: &Settings) -> Response {
    if request.method != "GET" && request.method != "HEAD" {
        return Response::error(Status::MethodNotAllowed).with_header("Allow", "GET, HEAD");
    }

    let Some(local) = strip_mount(&request.path, &settings.mount_path) else {
        return Response::error(Status::NotFound);
    };

    match local {
        "" | "/" => Response::html(render(View::Index, settings)),
        "/help" => Response::html(render(View::Help, settings)),
        "/__status" => status(settings),
        other => static_file(other, settings).await,
    }
}

/// Path below the mount point, or `None` when the request is outside it
pub fn strip_mount<'a>(path: &'a str, mount_path: &str) -> Option<&'a str> {
    let mount = mount_path.trim_end_matches('/');
    if mount.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Health report for monitoring
pub fn status(settings: &Settings) -> Response {
    Response::json(&json!({
        "app": settings.app_name,
        "version": settings.app_version,
        "timestamp": Utc::now().timestamp_millis(),
    }))
}

/// Resolve a request path inside the static folder, rejecting traversal
pub fn static_path(static_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = static_dir.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}

async fn static_file(request_path: &str, settings: &Settings) -> Response {
    let Some(path) = static_path(&settings.static_dir, request_path) else {
        return Response::error(Status::NotFound);
    };

    match tokio::fs::read(&path).await {
        Ok(body) => {
            let max_age = settings.static_file_cache_duration / 1000;
            Response::new(Status::Ok, content_type(&path), body)
                .with_header("Cache-Control", format!("public, max-age={}", max_age))
        }
        Err(e) => {
            debug!(target: "app", "no static file {}: {}", path.display(), e);
            Response::error(Status::NotFound)
        }
    }
}
