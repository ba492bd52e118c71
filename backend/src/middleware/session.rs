//! Anonymous client sessions
//!
//! There are no accounts: every caller is identified by IP address, and the
//! session row for that address is created on first contact.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::services::session::{SessionService, UserSession};
use crate::AppState;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Caller's IP address.
///
/// `X-Forwarded-For` is only honoured behind a trusted proxy; otherwise any
/// client could pick its own session by setting the header.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Session of the calling client
#[derive(Clone, Debug)]
pub struct ClientSession(pub UserSession);

#[axum::async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = resolve_client_ip(&parts.headers, peer, state.config.session.trust_forwarded_for);
        let user_agent = parts.headers.get(USER_AGENT).and_then(|v| v.to_str().ok());

        let session = SessionService::new(state.db.clone())
            .create_or_get(&ip, user_agent)
            .await?;

        Ok(ClientSession(session))
    }
}
