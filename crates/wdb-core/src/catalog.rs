// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The static command catalog.
//!
//! Every command the bridge understands, with the HTTP method and relative
//! URL pattern clients use to invoke it. URL patterns are relative to the
//! configured base path; `{variable}` segments bind path values. The catalog
//! covers the WebDriver JSON wire protocol subset the automation agent
//! implements.

/// HTTP methods the protocol uses. The routing table keeps one pattern set
/// per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// One catalog entry: a command name and the route that invokes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub method: Method,
    pub url_pattern: &'static str,
}

const fn spec(name: &'static str, method: Method, url_pattern: &'static str) -> CommandSpec {
    CommandSpec {
        name,
        method,
        url_pattern,
    }
}

/// Well-known command names the executor special-cases.
pub mod commands {
    pub const NEW_SESSION: &str = "newSession";
    pub const STATUS: &str = "status";
    pub const QUIT: &str = "quit";
    pub const CLOSE: &str = "close";
}

/// The full command catalog, probed in order by the routing table.
pub const CATALOG: &[CommandSpec] = &[
    spec(commands::STATUS, Method::Get, "status"),
    spec(commands::NEW_SESSION, Method::Post, "session"),
    spec(commands::QUIT, Method::Delete, "session/{sessionId}"),
    spec(commands::CLOSE, Method::Delete, "session/{sessionId}/window"),
    spec("get", Method::Post, "session/{sessionId}/url"),
    spec("getCurrentUrl", Method::Get, "session/{sessionId}/url"),
    spec("goBack", Method::Post, "session/{sessionId}/back"),
    spec("goForward", Method::Post, "session/{sessionId}/forward"),
    spec("refresh", Method::Post, "session/{sessionId}/refresh"),
    spec("getTitle", Method::Get, "session/{sessionId}/title"),
    spec("getPageSource", Method::Get, "session/{sessionId}/source"),
    spec("getWindowHandle", Method::Get, "session/{sessionId}/window_handle"),
    spec("getWindowHandles", Method::Get, "session/{sessionId}/window_handles"),
    spec("switchToFrame", Method::Post, "session/{sessionId}/frame"),
    spec("switchToWindow", Method::Post, "session/{sessionId}/window"),
    spec("setTimeouts", Method::Post, "session/{sessionId}/timeouts"),
    spec(
        "setScriptTimeout",
        Method::Post,
        "session/{sessionId}/timeouts/async_script",
    ),
    spec(
        "implicitlyWait",
        Method::Post,
        "session/{sessionId}/timeouts/implicit_wait",
    ),
    spec("executeScript", Method::Post, "session/{sessionId}/execute"),
    spec("executeAsyncScript", Method::Post, "session/{sessionId}/execute_async"),
    spec("screenshot", Method::Get, "session/{sessionId}/screenshot"),
    spec("findElement", Method::Post, "session/{sessionId}/element"),
    spec("findElements", Method::Post, "session/{sessionId}/elements"),
    spec("getActiveElement", Method::Post, "session/{sessionId}/element/active"),
    spec(
        "findChildElement",
        Method::Post,
        "session/{sessionId}/element/{id}/element",
    ),
    spec(
        "findChildElements",
        Method::Post,
        "session/{sessionId}/element/{id}/elements",
    ),
    spec("clickElement", Method::Post, "session/{sessionId}/element/{id}/click"),
    spec("clearElement", Method::Post, "session/{sessionId}/element/{id}/clear"),
    spec("submitElement", Method::Post, "session/{sessionId}/element/{id}/submit"),
    spec(
        "sendKeysToElement",
        Method::Post,
        "session/{sessionId}/element/{id}/value",
    ),
    spec("getElementText", Method::Get, "session/{sessionId}/element/{id}/text"),
    spec("getElementTagName", Method::Get, "session/{sessionId}/element/{id}/name"),
    spec(
        "getElementAttribute",
        Method::Get,
        "session/{sessionId}/element/{id}/attribute/{name}",
    ),
    spec(
        "getElementValueOfCssProperty",
        Method::Get,
        "session/{sessionId}/element/{id}/css/{propertyName}",
    ),
    spec(
        "isElementSelected",
        Method::Get,
        "session/{sessionId}/element/{id}/selected",
    ),
    spec(
        "isElementEnabled",
        Method::Get,
        "session/{sessionId}/element/{id}/enabled",
    ),
    spec(
        "isElementDisplayed",
        Method::Get,
        "session/{sessionId}/element/{id}/displayed",
    ),
    spec(
        "getElementLocation",
        Method::Get,
        "session/{sessionId}/element/{id}/location",
    ),
    spec("getElementSize", Method::Get, "session/{sessionId}/element/{id}/size"),
    spec("getCookies", Method::Get, "session/{sessionId}/cookie"),
    spec("addCookie", Method::Post, "session/{sessionId}/cookie"),
    spec("deleteAllCookies", Method::Delete, "session/{sessionId}/cookie"),
    spec("deleteCookie", Method::Delete, "session/{sessionId}/cookie/{name}"),
    spec("alertText", Method::Get, "session/{sessionId}/alert_text"),
    spec("setAlertValue", Method::Post, "session/{sessionId}/alert_text"),
    spec("acceptAlert", Method::Post, "session/{sessionId}/accept_alert"),
    spec("dismissAlert", Method::Post, "session/{sessionId}/dismiss_alert"),
];
