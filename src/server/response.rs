//! HTTP response handlers.
//!
//! Every response carries CORS headers: preview pages live on the store's
//! domain and load bundles from this server.

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{self, types};

/// Respond with a file from the output root.
///
/// A recompile may remove the file after it was resolved; that is a 404.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        if !path.is_file() {
            return respond_not_found(request);
        }
        return send_head(request, 200, content_type);
    }

    match read_body(path)? {
        Some(body) => send_body(request, 200, content_type, body),
        None => respond_not_found(request),
    }
}

/// File contents, or `None` when the file no longer exists.
fn read_body(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Respond with a serialized JSON document.
pub fn respond_json<T: Serialize>(request: Request, value: &T) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, types::JSON);
    }
    let body = serde_json::to_vec(value)?;
    send_body(request, 200, types::JSON, body)
}

/// Respond with generated JavaScript.
pub fn respond_script(request: Request, body: String) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, types::APPLICATION_JAVASCRIPT);
    }
    send_body(request, 200, types::APPLICATION_JAVASCRIPT, body.into_bytes())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let mut response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405));
    add_headers(&mut response, &request, types::PLAIN);
    add_header(&mut response, "Allow", "GET, HEAD, OPTIONS");
    request.respond(response)?;
    Ok(())
}

/// Answer a CORS preflight.
pub fn respond_preflight(request: Request) -> Result<()> {
    let mut response = Response::empty(StatusCode(204));
    add_headers(&mut response, &request, types::PLAIN);
    add_header(&mut response, "Access-Control-Allow-Methods", "GET, HEAD, OPTIONS");
    if let Some(requested) = header_value(&request, "Access-Control-Request-Headers") {
        add_header(&mut response, "Access-Control-Allow-Headers", &requested);
    }
    request.respond(response)?;
    Ok(())
}

/// Value of a request header, matched case-insensitively.
pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    add_headers(&mut response, &request, content_type);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    add_headers(&mut response, &request, content_type);
    request.respond(response)?;
    Ok(())
}

/// Content type plus CORS headers; the request's `Origin` is echoed back.
fn add_headers<R: std::io::Read>(response: &mut Response<R>, request: &Request, content_type: &str) {
    add_header(response, "Content-Type", content_type);
    match header_value(request, "Origin") {
        Some(origin) => {
            add_header(response, "Access-Control-Allow-Origin", &origin);
            add_header(response, "Vary", "Origin");
        }
        None => add_header(response, "Access-Control-Allow-Origin", "*"),
    }
}

fn add_header<R: std::io::Read>(response: &mut Response<R>, key: &str, value: &str) {
    match Header::from_bytes(key, value) {
        Ok(header) => response.add_header(header),
        Err(()) => crate::debug!("serve"; "dropped invalid header {}", key),
    }
}
