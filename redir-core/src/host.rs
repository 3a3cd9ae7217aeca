//! Host resolution from request headers and query overrides (§4.4).

use std::collections::HashMap;

use crate::headers::HeaderBag;

const LOOPBACK_HOSTS: &[&str] = &["", "localhost", "127.0.0.1", "127.0.1.1"];

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host).trim()
}

/// Parse the first `Forwarded` header entry's `host=`/`proto=` components.
/// The two call sites in the original source unpack the tuple in opposite
/// orders (§9 anomaly #7); the correct order, used here, is `(proto, host)`.
pub fn parse_forwarded(headers: &HeaderBag) -> (Option<String>, Option<String>) {
    let mut proto = None;
    let mut host = None;

    if let Some(first) = headers.get_all("forwarded").first() {
        let first_entry = first.split(',').next().unwrap_or(first);
        for component in first_entry.split(';').map(|c| c.trim()) {
            if host.is_none() {
                if let Some(rest) = component.strip_prefix("host=") {
                    host = Some(rest.to_string());
                    continue;
                }
            }
            if proto.is_none() {
                if let Some(rest) = component.strip_prefix("proto=") {
                    proto = Some(rest.to_string());
                }
            }
        }
        return (proto, host);
    }

    if let Some(first) = headers.get_all("x-forwarded-host").first() {
        let candidate = first.split(',').next().unwrap_or(first).trim();
        if !candidate.is_empty() {
            host = Some(strip_port(candidate).trim().to_ascii_lowercase());
        }
    }

    if let Some(first) = headers.get_all("x-forwarded-proto").first() {
        let candidate = first.split(',').next().unwrap_or(first).trim();
        if !candidate.is_empty() {
            proto = Some(candidate.to_ascii_lowercase());
        }
    }

    if proto.is_none() {
        if let Some(first) = headers.get_all("x-forwarded-ssl").first() {
            let ssl = first.split(',').next().unwrap_or(first).trim().to_ascii_lowercase();
            if matches!(ssl.as_str(), "on" | "true" | "yes") {
                proto = Some("https".to_string());
            } else if matches!(ssl.as_str(), "off" | "false" | "no") {
                proto = Some("http".to_string());
            }
        }
    }

    (proto, host)
}

/// Produce the ordered list of candidate hostnames plus the resolved
/// protocol scheme. `iri_host` is the host embedded in a `/redir` request's
/// `_pid`/`iri` parameter, already extracted by the caller; it is `None` for
/// ordinary path requests.
pub fn resolve_hosts(
    headers: &HeaderBag,
    query: &HashMap<String, String>,
    iri_host: Option<&str>,
    default_proto: &str,
    server_name: Option<&str>,
) -> (String, Vec<String>) {
    let mut candidates = Vec::new();

    if let Some(h) = query.get("_host") {
        candidates.push(h.trim().to_ascii_lowercase());
    }

    if let Some(h) = iri_host {
        candidates.push(strip_port(h).trim().to_ascii_lowercase());
    }

    let (forwarded_proto, forwarded_host) = parse_forwarded(headers);
    if let Some(h) = &forwarded_host {
        candidates.push(strip_port(h).trim().to_ascii_lowercase());
    }

    if let Some(first) = headers.get_all("host").first() {
        let head_host = strip_port(first.split(',').next().unwrap_or(first))
            .trim()
            .to_ascii_lowercase();
        if LOOPBACK_HOSTS.contains(&head_host.as_str()) {
            if let Some(server_name) = server_name.filter(|s| !s.is_empty()) {
                candidates.push(server_name.to_string());
            } else {
                candidates.push(head_host);
            }
        } else {
            candidates.push(head_host);
        }
    }

    let proto = forwarded_proto.unwrap_or_else(|| default_proto.to_string());
    (proto, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_query_param_has_highest_priority() {
        let mut headers = HeaderBag::new();
        headers.insert("host", "example.com");
        let mut query = HashMap::new();
        query.insert("_host".to_string(), "Override.Example.Com".to_string());
        let (_, hosts) = resolve_hosts(&headers, &query, None, "http", None);
        assert_eq!(hosts[0], "override.example.com");
    }

    #[test]
    fn forwarded_header_parsed_in_proto_host_order() {
        let mut headers = HeaderBag::new();
        headers.insert("forwarded", "host=example.org;proto=https");
        let (proto, host) = parse_forwarded(&headers);
        assert_eq!(proto.as_deref(), Some("https"));
        assert_eq!(host.as_deref(), Some("example.org"));
    }

    #[test]
    fn x_forwarded_ssl_membership_test() {
        let mut headers = HeaderBag::new();
        headers.insert("x-forwarded-ssl", "off");
        let (proto, _) = parse_forwarded(&headers);
        assert_eq!(proto.as_deref(), Some("http"));
    }

    #[test]
    fn loopback_host_substitutes_server_name() {
        let mut headers = HeaderBag::new();
        headers.insert("host", "localhost:8080");
        let (_, hosts) = resolve_hosts(&headers, &HashMap::new(), None, "http", Some("example.org"));
        assert_eq!(hosts, vec!["example.org".to_string()]);
    }

    #[test]
    fn loopback_host_without_server_name_keeps_loopback_string() {
        let mut headers = HeaderBag::new();
        headers.insert("host", "127.0.0.1");
        let (_, hosts) = resolve_hosts(&headers, &HashMap::new(), None, "http", None);
        assert_eq!(hosts, vec!["127.0.0.1".to_string()]);
    }
}
