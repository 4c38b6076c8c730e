//! Extractor for the caller's IP address.
//!
//! Proxy headers are consulted in this order, then the socket peer address:
//!
//! 1. `CF-Connecting-IP`
//! 2. `X-Forwarded-For` (first entry)
//! 3. `X-Real-IP`

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::errors::Error;

const UNKNOWN_IP: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

fn header_ip(headers: &HeaderMap) -> Option<String> {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    value("cf-connecting-ip")
        .or_else(|| {
            value("x-forwarded-for")
                .and_then(|list| list.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| value("x-real-ip"))
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ip) = header_ip(&parts.headers) {
            return Ok(ClientIp(ip));
        }
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_IP.to_string());
        Ok(ClientIp(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)], peer: Option<SocketAddr>) -> String {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(()).unwrap();
        if let Some(addr) = peer {
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        let (mut parts, _) = request.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn test_header_precedence() {
        let all = [
            ("x-real-ip", "3.3.3.3"),
            ("x-forwarded-for", "2.2.2.2, 10.0.0.1"),
            ("cf-connecting-ip", "1.1.1.1"),
        ];
        assert_eq!(extract(&all, None).await, "1.1.1.1");
        assert_eq!(extract(&all[..2], None).await, "2.2.2.2");
        assert_eq!(extract(&all[..1], None).await, "3.3.3.3");
    }

    #[tokio::test]
    async fn test_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.7:4321".parse().unwrap();
        assert_eq!(extract(&[], Some(peer)).await, "192.0.2.7");
        assert_eq!(extract(&[("x-forwarded-for", " ")], None).await, UNKNOWN_IP);
    }
}
