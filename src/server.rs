//! HTTP front end: the form page, the `/barcode` endpoint and `/static/` files.

use std::fs::File;
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, ResponseBox, Server};
use url::Url;

use crate::builder::{canvas_size, compose_sheet};
use crate::config::Config;
use crate::consts::MAX_FORM_BYTES;
use crate::error::{Error, Result};
use crate::form::{collect_specs, Form};
use crate::graphics::FontBook;
use crate::output::OutputStore;
use crate::page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Barcode,
    Static(Vec<String>),
    Index,
}

/// Paths other than `/barcode` and `/static/...` fall through to the form page.
/// Static segments are percent-decoded; one that isn't UTF-8 leaves no segments (404).
pub fn route(path: &str) -> Route {
    if path == "/barcode" {
        return Route::Barcode;
    }
    match path.strip_prefix("/static/") {
        Some(rest) => Route::Static(
            rest.split('/')
                .map(|seg| percent_decode_str(seg).decode_utf8().map(|s| s.into_owned()))
                .collect::<std::result::Result<Vec<_>, _>>()
                .unwrap_or_default(),
        ),
        None => Route::Index,
    }
}

/// Resolve `/static/` segments under `root`, refusing anything that could leave it.
pub fn static_file_path(root: &Path, segments: &[String]) -> Option<PathBuf> {
    if segments.is_empty() {
        return None;
    }
    let mut path = root.to_path_buf();
    for seg in segments {
        if seg.is_empty() || seg == "." || seg == ".." || seg.contains(&['/', '\\', '\0'][..]) {
            return None;
        }
        path.push(seg);
    }
    Some(path)
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("ttf") => "font/ttf",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn with_content_type<R: Read>(resp: Response<R>, value: &str) -> Response<R> {
    match Header::from_bytes("Content-Type", value) {
        Ok(h) => resp.with_header(h),
        Err(()) => resp,
    }
}

fn text_response(status: u16, body: String, content_type: &str) -> Response<Cursor<Vec<u8>>> {
    with_content_type(Response::from_string(body).with_status_code(status), content_type)
}

fn not_found() -> ResponseBox {
    text_response(404, "404 page not found".into(), "text/plain; charset=utf-8").boxed()
}

fn file_response(path: &Path) -> ResponseBox {
    if !path.is_file() {
        return not_found();
    }
    match File::open(path) {
        Ok(f) => with_content_type(Response::from_file(f), content_type_for(path)).boxed(),
        Err(e) => {
            warn!("cannot open {}: {}", path.display(), e);
            not_found()
        }
    }
}

/// Read at most `limit` bytes; anything longer is rejected rather than truncated.
pub fn read_limited<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    if let Err(e) = reader.take(limit + 1).read_to_end(&mut body) {
        warn!("could not read form body: {}", e);
        body.clear();
    }
    if body.len() as u64 > limit {
        return Err(Error::FormTooLarge(limit));
    }
    Ok(body)
}

fn has_body(method: &Method) -> bool {
    matches!(method, Method::Post | Method::Put | Method::Patch)
}

fn is_form_body(request: &Request) -> bool {
    request.headers().iter().any(|h| {
        h.field.equiv("Content-Type")
            && h.value.as_str().trim_start().starts_with("application/x-www-form-urlencoded")
    })
}

/// Everything a request needs: configuration, loaded fonts and the output store.
pub struct App {
    config: Config,
    fonts: FontBook,
    store: OutputStore,
}

impl App {
    pub fn new(config: Config, fonts: FontBook) -> Self {
        let store = config.output_store();
        Self { config, fonts, store }
    }

    /// Load fonts named by the configuration; missing ones are logged, not fatal.
    pub fn from_config(config: Config) -> Self {
        let fonts = FontBook::load(&config.font_sources());
        Self::new(config, fonts)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// parse → size → render → save → page. Returns the result page HTML.
    pub fn generate(&self, form: &Form) -> Result<String> {
        let specs = collect_specs(form)?;
        let size = canvas_size(&specs);
        let canvas = compose_sheet(&specs, &self.fonts)?;
        let saved = self.store.save(&canvas)?;
        info!(
            "rendered {} barcode(s) on a {}x{} canvas -> {}",
            specs.len(),
            size.width,
            size.height,
            saved.path.display()
        );
        page::render_file(&self.config.result_template(), &saved.public_path)
    }

    fn barcode_response(&self, request: &mut Request, query: Option<&str>) -> ResponseBox {
        let body = if has_body(request.method()) && is_form_body(request) {
            read_limited(request.as_reader(), MAX_FORM_BYTES)
        } else {
            Ok(Vec::new())
        };
        let result = body.and_then(|body| {
            let form = Form::from_parts(query, if body.is_empty() { None } else { Some(body.as_slice()) });
            self.generate(&form)
        });

        match result {
            Ok(html) => text_response(200, html, "text/html; charset=utf-8").boxed(),
            Err(e) => {
                warn!("barcode request failed: {}", e);
                text_response(e.status_code(), e.to_string(), "text/plain; charset=utf-8").boxed()
            }
        }
    }

    pub fn handle(&self, request: &mut Request) -> ResponseBox {
        debug!("{} {}", request.method(), request.url());
        let url = match Url::parse("http://localhost").and_then(|base| base.join(request.url())) {
            Ok(u) => u,
            Err(e) => {
                warn!("bad request target {:?}: {}", request.url(), e);
                return text_response(400, "400 bad request".into(), "text/plain; charset=utf-8").boxed();
            }
        };

        match route(url.path()) {
            Route::Barcode => self.barcode_response(request, url.query()),
            Route::Static(segments) => match static_file_path(&self.config.static_dir, &segments) {
                Some(path) => file_response(&path),
                None => not_found(),
            },
            Route::Index => file_response(&self.config.index),
        }
    }
}

/// A bound listener; requests are served one at a time on the calling thread.
pub struct BarcodeServer {
    server: Server,
    app: App,
}

impl BarcodeServer {
    pub fn bind(app: App) -> Result<Self> {
        let server = Server::http(app.config().addr.as_str())
            .map_err(|e| Error::Server(format!("{}: {}", app.config().addr, e)))?;
        Ok(Self { server, app })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn run(self) {
        if let Some(addr) = self.local_addr() {
            info!("barcode sheet server listening on http://{}", addr);
        }
        for mut request in self.server.incoming_requests() {
            let response = self.app.handle(&mut request);
            if let Err(e) = request.respond(response) {
                warn!("failed to send response: {}", e);
            }
        }
    }
}
