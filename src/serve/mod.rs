//! Development server with live reload support.
//!
//! A [`ServerSession`] owns both listeners: the HTTP server for the output
//! tree and the live-reload WebSocket hub. It is created explicitly by the
//! dev pipeline and passed to whoever needs to signal browsers.

mod content;
mod lifecycle;
mod path;
mod response;


use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tiny_http::{Request, Server};

use crate::config::SiteConfig;
use crate::embed::serve::HOTRELOAD_PATH;
use crate::log;
use crate::reload::ReloadHub;

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Read-only state shared by request handlers.
pub(crate) struct ServeState {
    root: PathBuf,
    ws_port: u16,
    cors: bool,
}

/// A running dev server: HTTP listener, request loop, and reload hub.
pub struct ServerSession {
    addr: SocketAddr,
    server: Arc<Server>,
    hub: ReloadHub,
    request_loop: Mutex<Option<JoinHandle<()>>>,
}

impl ServerSession {
    /// Bind both listeners and start serving the build directory.
    pub fn start(config: &SiteConfig) -> Result<Self> {
        let serve = &config.serve;
        let hub = ReloadHub::bind(serve.interface, serve.reload_port)?;
        let (server, addr) = lifecycle::bind_with_retry(serve.interface, serve.port)?;
        let server = Arc::new(server);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("serve-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        let state = Arc::new(ServeState {
            root: config.build_dir(),
            ws_port: hub.port(),
            cors: serve.cors,
        });

        let request_loop = {
            let server = Arc::clone(&server);
            thread::Builder::new()
                .name("serve".into())
                .spawn(move || run_request_loop(&server, &pool, &state))?
        };

        crate::debug!("serve"; "serving {}", config.root_relative(config.build_dir()).display());
        Ok(Self {
            addr,
            server,
            hub,
            request_loop: Mutex::new(Some(request_loop)),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn reload_port(&self) -> u16 {
        self.hub.port()
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.hub.client_count()
    }

    /// Full reload of every connected page.
    pub fn reload(&self) {
        self.hub.reload();
    }

    /// In-place refresh of one stylesheet, by URL path.
    pub fn notify_css(&self, path: &str) {
        self.hub.notify_css(path);
    }

    /// Unblock the request loop, wait for it, and disconnect reload clients.
    ///
    /// Later calls (and the one from `Drop`) do nothing.
    pub fn stop(&self) {
        let Some(handle) = self.request_loop.lock().take() else {
            return;
        };
        self.server.unblock();
        let _ = handle.join();
        self.hub.close();
        crate::debug!("serve"; "stopped");
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, state: &Arc<ServeState>) {
    for request in server.incoming_requests() {
        let state = Arc::clone(state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    crate::debug!("serve"; "{} {}", request.method(), request.url());

    if format!("/{}", path::url_path(request.url())) == HOTRELOAD_PATH {
        return response::respond_hotreload_js(request, state);
    }

    if let Some(path) = path::resolve_path(request.url(), &state.root) {
        return response::respond_file(request, &path, state);
    }

    response::respond_not_found(request, state)
}
