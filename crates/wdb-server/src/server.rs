// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The HTTP front end.
//!
//! One fallback handler serves the whole command surface: the routing table
//! owns URL matching, so axum's router contributes nothing but the listener
//! plumbing and middleware. Matched commands go to the executor; the
//! response is shaped back into HTTP status codes here (200 for success,
//! 303 for session creation, 404/400 as plain text, 500 for command
//! failures).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response as HttpResponse;
use axum::Router;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use wdb_core::{CommandExecutor, Method, RoutingTable};
use wdb_proto::{status, Command, Response};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Any URL whose path contains this fragment (case-insensitively) requests a
/// server shutdown after the response is written.
const SHUTDOWN_URL_FRAGMENT: &str = "SHUTDOWN";

const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";
const TEXT_CONTENT_TYPE: &str = "text/plain";

/// The bridge server.
pub struct Server {
    config: ServerConfig,
    app: Router,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

impl Server {
    pub fn new(config: ServerConfig, executor: Arc<CommandExecutor>) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let state = AppState {
            table: Arc::new(RoutingTable::new()),
            executor,
            config: config.clone(),
            shutdown: shutdown_tx,
        };
        let app = Self::build_app(state);
        Self {
            config,
            app,
            shutdown_rx,
        }
    }

    fn build_app(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state)
    }

    /// Binds the configured address and serves until a shutdown is requested
    /// (via a SHUTDOWN URL or Ctrl-C). In-flight responses complete first.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.bind_socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::from_bind_error(err, addr))?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener. Used by tests with ephemeral
    /// ports.
    pub async fn serve(self, listener: TcpListener) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            "listening on http://{}{}",
            addr,
            self.config.url_path.trim_end_matches('/')
        );

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("shutdown requested via URL");
                    }
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            tracing::warn!("Ctrl-C handler failed: {}", err);
                        } else {
                            tracing::info!("interrupt received");
                        }
                    }
                }
            })
            .await?;
        Ok(())
    }
}

async fn dispatch(State(state): State<AppState>, request: Request) -> HttpResponse {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let absolute_url = absolute_request_url(&request);

    let shutdown_requested = path.to_uppercase().contains(SHUTDOWN_URL_FRAGMENT);
    if shutdown_requested {
        tracing::info!("Executing: [Shutdown] at URL: {}", path);
    }

    let body = match read_body(request).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let matched = table_method(&method).and_then(|method| {
        relative_path(&state.config.url_path, &path)
            .and_then(|relative| state.table.lookup(method, relative))
    });

    let response = match matched {
        Some(matched) => {
            let mut parameters = matched.variables;
            if let Err(response) = overlay_body_parameters(&mut parameters, &body, &path) {
                return response;
            }

            let command = Command {
                name: matched.name.to_string(),
                parameters,
            };
            tracing::info!("Executing: [{}] at URL: {}", command.name, path);
            let response = state.executor.execute(&command).await;
            if command.name != "status" {
                tracing::info!("Done: {}", path);
            }
            render(response, &absolute_url)
        }
        None if shutdown_requested => {
            // A bare shutdown URL carries no command; acknowledge it.
            render(Response::success(Value::Null), &absolute_url)
        }
        None => {
            tracing::warn!("No command associated with {}", path);
            let response = Response::failure(
                status::UNKNOWN_COMMAND,
                format!("No command associated with {}", path),
            );
            plain_text(StatusCode::NOT_FOUND, &response)
        }
    };

    if shutdown_requested {
        if state.config.ignore_remote_shutdown {
            tracing::info!("ignoring remote shutdown request");
        } else {
            // Receiver gone means shutdown is already underway.
            let _ = state.shutdown.send(());
        }
    }

    response
}

fn table_method(method: &axum::http::Method) -> Option<Method> {
    if method == axum::http::Method::GET {
        Some(Method::Get)
    } else if method == axum::http::Method::POST {
        Some(Method::Post)
    } else if method == axum::http::Method::DELETE {
        Some(Method::Delete)
    } else {
        None
    }
}

/// Reconstructs the absolute URL of the request for the 303 Location header.
fn absolute_request_url(request: &Request) -> String {
    let authority = request
        .headers()
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());
    format!("http://{}{}", authority, request.uri().path())
}

/// The request path relative to the configured base path, without a leading
/// slash. `None` when the path is outside the base path.
fn relative_path<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(base.trim_end_matches('/'))?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Reads the whole request body. The collected-body API loops internally
/// until Content-Length bytes have arrived.
async fn read_body(request: Request) -> Result<String, HttpResponse> {
    let bytes = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let response = Response::failure(
                status::UNHANDLED_ERROR,
                format!("Unable to read request body: {err}"),
            );
            return Err(plain_text(StatusCode::BAD_REQUEST, &response));
        }
    };
    String::from_utf8(bytes.to_vec()).map_err(|err| {
        let response = Response::failure(
            status::UNHANDLED_ERROR,
            format!("Request body is not UTF-8: {err}"),
        );
        plain_text(StatusCode::BAD_REQUEST, &response)
    })
}

/// Merges request-body members into the path-variable bindings. Members are
/// inserted after the path variables, so a client-supplied member overrides a
/// binding of the same name.
fn overlay_body_parameters(
    parameters: &mut Map<String, Value>,
    body: &str,
    path: &str,
) -> Result<(), HttpResponse> {
    if body.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(members)) => {
            for (key, value) in members {
                parameters.insert(key, value);
            }
            Ok(())
        }
        Ok(_) | Err(_) => {
            tracing::warn!("malformed request body for {}", path);
            let response = Response::failure(
                status::UNHANDLED_ERROR,
                format!("Request body for {} is not a JSON object", path),
            );
            Err(plain_text(StatusCode::BAD_REQUEST, &response))
        }
    }
}

/// Converts an executor response into the HTTP reply.
fn render(mut response: Response, absolute_url: &str) -> HttpResponse {
    if response.status == status::SESSION_CREATED {
        let session_id = match &response.value {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        };
        let location = format!("{}/{}", absolute_url.trim_end_matches('/'), session_id);
        response.value = Value::String(String::new());
        return json_reply(StatusCode::SEE_OTHER, &response, Some(&location));
    }

    let code = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json_reply(code, &response, None)
}

fn json_reply(code: StatusCode, response: &Response, location: Option<&str>) -> HttpResponse {
    let body = serialize(response);
    let mut builder = HttpResponse::builder()
        .status(code)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE);
    if let Some(location) = location {
        builder = builder.header(
            header::LOCATION,
            HeaderValue::from_str(location)
                .unwrap_or_else(|_| HeaderValue::from_static("/")),
        );
    }
    builder.body(Body::from(body)).expect("static response parts")
}

fn plain_text(code: StatusCode, response: &Response) -> HttpResponse {
    HttpResponse::builder()
        .status(code)
        .header(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .body(Body::from(serialize(response)))
        .expect("static response parts")
}

fn serialize(response: &Response) -> String {
    response
        .to_wire()
        .unwrap_or_else(|_| r#"{"status":13,"value":"unserializable response"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relative_path_honors_the_base_path() {
        assert_eq!(relative_path("/", "/session"), Some("session"));
        assert_eq!(relative_path("/", "/"), Some(""));
        assert_eq!(relative_path("/wd/hub/", "/wd/hub/session"), Some("session"));
        assert_eq!(relative_path("/wd/hub/", "/wd/hub"), Some(""));
        assert_eq!(relative_path("/wd/hub/", "/other/session"), None);
    }

    #[test]
    fn redirect_shaping_builds_location_and_blanks_value() {
        let reply = render(
            Response {
                status: status::SESSION_CREATED,
                value: json!("abc123"),
            },
            "http://h/base/session",
        );
        assert_eq!(reply.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            reply.headers()[header::LOCATION],
            "http://h/base/session/abc123"
        );
    }

    #[test]
    fn failure_statuses_map_to_internal_server_error() {
        let reply = render(
            Response::failure(status::NO_SUCH_DRIVER, "no session"),
            "http://h/session",
        );
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn body_members_override_path_bindings() {
        let mut parameters = Map::new();
        parameters.insert("SESSIONID".to_string(), json!("from-path"));

        overlay_body_parameters(
            &mut parameters,
            r#"{"SESSIONID":"from-body","url":"http://example.com"}"#,
            "/session/from-path/url",
        )
        .expect("valid body");

        assert_eq!(parameters["SESSIONID"], json!("from-body"));
        assert_eq!(parameters["url"], json!("http://example.com"));
        let keys: Vec<&str> = parameters.keys().map(String::as_str).collect();
        assert_eq!(keys, ["SESSIONID", "url"]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let mut parameters = Map::new();
        let reply = overlay_body_parameters(&mut parameters, "[1,2,3]", "/session")
            .expect_err("array body");
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);
    }

    #[test]
    fn empty_body_adds_no_parameters() {
        let mut parameters = Map::new();
        overlay_body_parameters(&mut parameters, "", "/session").expect("empty body");
        assert!(parameters.is_empty());
    }
}
