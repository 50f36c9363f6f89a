use super::types::UNKNOWN_CLIENT;
use axum::http::HeaderMap;
use std::net::IpAddr;

/// Derive the client identity a request is rate limited by.
///
/// When `trust_forwarded_header` is set, the first entry of the forwarded
/// header chain wins. Otherwise, or if that entry is blank, the connection's
/// remote IP is used. Requests with neither collapse into the shared
/// `"unknown"` identity.
pub fn resolve_client_identity(
    headers: &HeaderMap,
    remote_ip: Option<IpAddr>,
    trust_forwarded_header: bool,
    forwarded_header_name: &str,
) -> String {
    if trust_forwarded_header {
        if let Some(forwarded) = first_forwarded(headers, forwarded_header_name) {
            return forwarded;
        }
    }

    remote_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// First non-blank entry of a comma separated forwarded chain
fn first_forwarded(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    if value.trim().is_empty() {
        return None;
    }

    let first = value.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::str::FromStr;

    const XFF: &str = "X-Forwarded-For";

    fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    fn remote() -> Option<IpAddr> {
        Some(IpAddr::from_str("10.0.0.7").unwrap())
    }

    #[test]
    fn test_forwarded_header_first_entry() {
        let headers = headers_with("x-forwarded-for", "1.2.3.4, 5.6.6.7");
        assert_eq!(resolve_client_identity(&headers, remote(), true, XFF), "1.2.3.4");
    }

    #[test]
    fn test_forwarded_header_ignored_without_trust() {
        let headers = headers_with("x-forwarded-for", "1.2.3.4, 5.6.6.7");
        assert_eq!(resolve_client_identity(&headers, remote(), false, XFF), "10.0.0.7");
    }

    #[test]
    fn test_blank_forwarded_header_falls_back() {
        let headers = headers_with("x-forwarded-for", "   ");
        assert_eq!(resolve_client_identity(&headers, remote(), true, XFF), "10.0.0.7");

        let headers = headers_with("x-forwarded-for", " , 5.6.6.7");
        assert_eq!(resolve_client_identity(&headers, remote(), true, XFF), "10.0.0.7");
    }

    #[test]
    fn test_missing_header_falls_back() {
        assert_eq!(
            resolve_client_identity(&HeaderMap::new(), remote(), true, XFF),
            "10.0.0.7"
        );
    }

    #[test]
    fn test_custom_header_name() {
        let headers = headers_with("x-real-ip", "203.0.113.9");
        assert_eq!(
            resolve_client_identity(&headers, remote(), true, "X-Real-IP"),
            "203.0.113.9"
        );
        // The default header name does not see it
        assert_eq!(resolve_client_identity(&headers, remote(), true, XFF), "10.0.0.7");
    }

    #[test]
    fn test_unknown_client_sentinel() {
        assert_eq!(
            resolve_client_identity(&HeaderMap::new(), None, false, XFF),
            UNKNOWN_CLIENT
        );
        assert_eq!(
            resolve_client_identity(&headers_with("x-forwarded-for", ""), None, true, XFF),
            UNKNOWN_CLIENT
        );
    }

    #[test]
    fn test_ipv6_remote() {
        let ip = IpAddr::from_str("2001:db8::1").unwrap();
        assert_eq!(
            resolve_client_identity(&HeaderMap::new(), Some(ip), false, XFF),
            "2001:db8::1"
        );
    }
}
