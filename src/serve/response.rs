//! HTTP response handlers.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::ServeState;
use super::content::inject_hotreload;
use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};
use crate::utils::mime::{self, types};

/// Respond with a file from the output tree, injecting the reload script into HTML.
pub fn respond_file(request: Request, path: &Path, state: &ServeState) -> Result<()> {
    let content_type = mime::from_path(path);
    send(request, 200, content_type, state, || {
        let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(maybe_inject(body, content_type))
    })
}

/// Respond with 404 page (custom `404.html` or plain text).
pub fn respond_not_found(request: Request, state: &ServeState) -> Result<()> {
    let custom = state.root.join("404.html");
    if custom.is_file() {
        return send(request, 404, types::HTML, state, || {
            let body = fs::read(&custom)?;
            Ok(inject_hotreload(&body))
        });
    }
    send(request, 404, types::PLAIN, state, || Ok(b"404 Not Found".to_vec()))
}

/// Respond with hotreload.js from memory.
pub fn respond_hotreload_js(request: Request, state: &ServeState) -> Result<()> {
    let body = HOTRELOAD_JS.render(&HotreloadVars {
        ws_port: state.ws_port,
    });
    send(request, 200, types::JAVASCRIPT, state, || Ok(body.into_bytes()))
}

fn maybe_inject(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if mime::is_html(content_type) {
        inject_hotreload(&body)
    } else {
        body
    }
}

/// Send a response; the body is only produced for non-HEAD requests.
fn send(
    request: Request,
    status: u16,
    content_type: &'static str,
    state: &ServeState,
    body: impl FnOnce() -> Result<Vec<u8>>,
) -> Result<()> {
    if request.method() == &Method::Head {
        let response = with_headers(Response::empty(StatusCode(status)), content_type, state);
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(body()?).with_status_code(StatusCode(status));
    request.respond(with_headers(response, content_type, state))?;
    Ok(())
}

fn with_headers<R: Read>(mut response: Response<R>, content_type: &str, state: &ServeState) -> Response<R> {
    set_header(&mut response, "Content-Type", content_type);
    set_header(&mut response, "Cache-Control", "no-cache");
    if state.cors {
        set_header(&mut response, "Access-Control-Allow-Origin", "*");
    }
    response
}

fn set_header<R: Read>(response: &mut Response<R>, key: &str, value: &str) {
    if let Ok(header) = Header::from_bytes(key.as_bytes(), value.as_bytes()) {
        response.add_header(header);
    }
}
