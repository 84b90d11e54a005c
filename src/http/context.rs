//! Per-request connection context.
//!
//! Client address resolution order: first `X-Forwarded-For` entry, then
//! `X-Real-IP`, then the socket peer.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};

use crate::history::RequestContext;
use crate::http::server::AppState;
use crate::http::TRACE_ID_HEADER;

const UNKNOWN_IP: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Best-effort client address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header_str(headers, "x-real-ip") {
        return real.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Trace id set by the request-id layer, or a fresh one when the layer is absent.
pub fn trace_id(headers: &HeaderMap) -> String {
    header_str(headers, TRACE_ID_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let headers = &parts.headers;
        let user_agent = header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default();
        let referer = header_str(headers, header::REFERER.as_str()).unwrap_or_default();

        Ok(RequestContext::now(
            trace_id(headers),
            client_ip(headers, peer),
            user_agent,
            referer,
            parts.uri.path(),
            state.classifier.classify(user_agent),
        ))
    }
}
