//! HTTP server for the dashboard viewer
//!
//! `engagement-dashboard` → loads the dataset, starts server, serves the
//! viewer page and the JSON API it calls on every filter change.

use crate::dashboard::{Dashboard, FilterChanged, PanelUpdate};
use crate::filter::{FilterOptions, FilterSelection};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct OptionsPayload<'a> {
    rows: usize,
    options: &'a FilterOptions,
}

#[derive(Serialize)]
struct HealthPayload {
    rows: usize,
    skipped_rows: usize,
}

// Embedded plotly viewer page
const DASHBOARD_HTML: &str = include_str!("viewer.html");

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// Request handling settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOptions {
    /// Pretty-print JSON and log per-request timing
    pub debug: bool,
}

/// Start the dashboard server and handle requests until the process exits.
///
/// Requests are handled one at a time, each to completion.
pub fn start_dashboard_server(
    dashboard: &Dashboard,
    addr: &str,
    options: ServeOptions,
) -> Result<(), ServeError> {
    let server = Server::http(addr).map_err(|e| ServeError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })?;

    info!(%addr, rows = dashboard.dataset().len(), "dashboard server listening");

    for request in server.incoming_requests() {
        let started = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();
        if let Err(e) = handle_request(dashboard, options, request) {
            warn!(%method, %url, error = %e, "failed to respond");
        }
        if options.debug {
            debug!(
                %method,
                %url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request handled"
            );
        }
    }

    Ok(())
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid")
}

fn html_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        .expect("static header is valid")
}

fn to_json<T: Serialize>(value: &T, options: ServeOptions) -> serde_json::Result<String> {
    if options.debug {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn respond_json<T: Serialize>(
    request: Request,
    body: &T,
    status: u16,
    options: ServeOptions,
) -> std::io::Result<()> {
    let json = to_json(body, options)?;
    let response = Response::from_string(json)
        .with_status_code(status)
        .with_header(json_header());
    request.respond(response)
}

fn handle_request(
    dashboard: &Dashboard,
    options: ServeOptions,
    request: Request,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let method = request.method().clone();

    match (&method, path) {
        // Serve dashboard UI
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            let response = Response::from_string(DASHBOARD_HTML).with_header(html_header());
            request.respond(response)
        }

        // API: filter options for the three dropdowns
        (&Method::Get, "/api/options") => {
            let payload = OptionsPayload {
                rows: dashboard.dataset().len(),
                options: dashboard.options(),
            };
            respond_json(request, &ApiResponse::success(payload), 200, options)
        }

        // API: recompute from query-string selection
        (&Method::Get, "/api/recompute") => match FilterSelection::from_query(query) {
            Ok(selection) => respond_update(dashboard, selection, request, options),
            Err(e) => {
                warn!(%query, error = %e, "bad filter query");
                respond_json(
                    request,
                    &ApiResponse::failure(format!("Invalid query: {}", e)),
                    400,
                    options,
                )
            }
        },

        // API: recompute from JSON body (POST /api/recompute)
        (&Method::Post, "/api/recompute") => handle_recompute_post(dashboard, request, options),

        (&Method::Get, "/api/health") => {
            let payload = HealthPayload {
                rows: dashboard.dataset().len(),
                skipped_rows: dashboard.dataset().skipped_rows(),
            };
            respond_json(request, &ApiResponse::success(payload), 200, options)
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn handle_recompute_post(
    dashboard: &Dashboard,
    mut request: Request,
    options: ServeOptions,
) -> std::io::Result<()> {
    // Read request body
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        return respond_json(
            request,
            &ApiResponse::failure(format!("Failed to read body: {}", e)),
            400,
            options,
        );
    }

    // Empty body means "no filters"
    let parsed = if body.trim().is_empty() {
        Ok(FilterSelection::default())
    } else {
        serde_json::from_str::<FilterSelection>(&body)
    };

    match parsed {
        Ok(selection) => respond_update(dashboard, selection, request, options),
        Err(e) => {
            warn!(error = %e, "bad filter body");
            respond_json(
                request,
                &ApiResponse::failure(format!("Invalid JSON: {}", e)),
                400,
                options,
            )
        }
    }
}

fn respond_update(
    dashboard: &Dashboard,
    selection: FilterSelection,
    request: Request,
    options: ServeOptions,
) -> std::io::Result<()> {
    let update = dashboard.on_filter_changed(FilterChanged::from(selection));
    let (body, status) = update_response(update);
    respond_json(request, &body, status, options)
}

/// Wrap an update for the wire; failures carry the error indicator with a 500
fn update_response(update: PanelUpdate) -> (ApiResponse<PanelUpdate>, u16) {
    match update {
        PanelUpdate::Error { ref message } => (
            ApiResponse {
                ok: false,
                error: Some(message.clone()),
                data: Some(update.clone()),
            },
            500,
        ),
        charts => (ApiResponse::success(charts), 200),
    }
}
