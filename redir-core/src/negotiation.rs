//! Content negotiation: `Accept`, `Accept-Profile`, `Link`, `Prefer` and their
//! query-string overrides, turned into ranked `(q, value)` lists.
//!
//! Ported from `connegp.py`'s `profile_extract`/`mediatype_extract`, with the
//! `jsonld` mediatype-extension fix and the inclusive `Link` header reading
//! from the specification's anomaly notes applied.

use std::collections::HashMap;

use crate::headers::HeaderBag;

/// A ranked negotiation value: quality factor then the value itself.
pub type Ranked = Vec<(f64, String)>;

fn strip_angle_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '<' || c == '>' || c == '"' || c == '\'')
}

fn split_csv_headers<'a>(values: &'a [String]) -> Vec<&'a str> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a `name; q=0.x; other=...` style item into `(q, name)`, defaulting
/// `q` to `1.0` and falling back to `0.0` on a malformed `q=` value.
fn parse_qualified(item: &str) -> (f64, String) {
    let mut parts = item.split(';').map(|s| s.trim());
    let value = parts.next().unwrap_or("").to_string();
    let mut q = 1.0;
    for part in parts {
        if let Some(rest) = part.strip_prefix("q=") {
            q = rest.trim().parse::<f64>().unwrap_or(0.0);
            break;
        }
    }
    (q, value)
}

fn sort_ranked(mut list: Ranked) -> Ranked {
    list.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    list
}

/// §4.1 `profile_extract`.
pub fn profile_extract(headers: &HeaderBag, query: &HashMap<String, String>) -> Ranked {
    if let Some(v) = query.get("_profile") {
        return vec![(1.0, v.clone())];
    }

    let mut ret: Ranked = Vec::new();

    let accept_profile = headers.get_all("accept-profile");
    if !accept_profile.is_empty() {
        for item in split_csv_headers(accept_profile) {
            ret.push(parse_qualified(item));
        }
    }

    if ret.is_empty() {
        // Inclusive reading of the anomaly: one or more Link headers qualify,
        // not "more than one" as the original source required.
        let link = headers.get_all("link");
        if !link.is_empty() {
            for item in split_csv_headers(link) {
                let mut parts = item.split(';').map(|s| s.trim());
                let href = parts.next().unwrap_or("");
                let is_profile_rel = parts.any(|p| {
                    matches!(
                        p.to_ascii_lowercase().as_str(),
                        "rel=\"profile\"" | "rel='profile'" | "rel=profile"
                    )
                });
                if is_profile_rel {
                    ret.push((1.0, strip_angle_quotes(href).to_string()));
                }
            }
        }
    }

    if ret.is_empty() {
        let prefer = headers.get_all("prefer");
        if !prefer.is_empty() {
            'outer: for item in split_csv_headers(prefer) {
                for part in item.split(';').map(|s| s.trim()) {
                    if let Some(rest) = part.to_ascii_lowercase().strip_prefix("profile=") {
                        let raw = &part[part.len() - rest.len()..];
                        ret.push((1.0, strip_angle_quotes(raw).to_string()));
                        continue 'outer;
                    }
                }
            }
        }
    }

    if ret.is_empty() {
        if let Some(v) = query.get("_view") {
            return vec![(1.0, v.clone())];
        }
    }

    sort_ranked(ret)
}

/// `ttl`/`jsonld`/`json`/`xml`/`n3` extension table used only as a last
/// resort in `mediatype_extract`. `jsonld` maps to the standards-compliant
/// `application/ld+json`, not the source's buggy `application/json-ld`
/// (§9 anomaly #3).
pub fn ext_to_mediatype(ext: &str) -> Option<&'static str> {
    match ext {
        "ttl" => Some("text/turtle"),
        "jsonld" => Some("application/ld+json"),
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        "n3" => Some("text/n3"),
        _ => None,
    }
}

/// §4.1 `mediatype_extract`.
pub fn mediatype_extract(
    headers: &HeaderBag,
    query: &HashMap<String, String>,
    extension: Option<&str>,
) -> Ranked {
    if let Some(v) = query.get("_mediatype") {
        return vec![(1.0, v.clone())];
    }

    let mut ret: Ranked = Vec::new();
    let mut wildcard: Option<String> = None;

    let accept = headers.get_all("accept");
    if !accept.is_empty() {
        for item in split_csv_headers(accept) {
            let (q, value) = parse_qualified(item);
            if value == "*/*" || (value == "*" && q == 1.0) {
                wildcard = Some(value);
            } else {
                ret.push((q, value));
            }
        }
    }

    if ret.is_empty() {
        let prefer = headers.get_all("prefer");
        if !prefer.is_empty() {
            'outer: for item in split_csv_headers(prefer) {
                for part in item.split(';').map(|s| s.trim()) {
                    if let Some(rest) = part.to_ascii_lowercase().strip_prefix("mediatype=") {
                        let raw = &part[part.len() - rest.len()..];
                        ret.push((1.0, strip_angle_quotes(raw).to_string()));
                        continue 'outer;
                    }
                }
            }
        }
    }

    if ret.is_empty() {
        if let Some(v) = query.get("_format") {
            return vec![(1.0, v.clone())];
        } else if let Some(ext) = extension {
            if let Some(mt) = ext_to_mediatype(ext) {
                return vec![(1.0, mt.to_string())];
            }
        } else if let Some(w) = wildcard {
            return vec![(1.0, w)];
        }
    }

    sort_ranked(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &str, values: &[&str]) -> HeaderBag {
        let mut h = HeaderBag::new();
        for v in values {
            h.insert(name, *v);
        }
        h
    }

    #[test]
    fn profile_query_overrides_everything() {
        let headers = headers_with("accept-profile", &["foo;q=0.5"]);
        let mut query = HashMap::new();
        query.insert("_profile".to_string(), "bar".to_string());
        assert_eq!(profile_extract(&headers, &query), vec![(1.0, "bar".to_string())]);
    }

    #[test]
    fn profile_accept_profile_header_parses_q() {
        let headers = headers_with("accept-profile", &["a;q=0.2, b;q=0.9"]);
        let result = profile_extract(&headers, &HashMap::new());
        assert_eq!(
            result,
            vec![(0.9, "b".to_string()), (0.2, "a".to_string())]
        );
    }

    #[test]
    fn profile_link_header_single_is_accepted() {
        let headers = headers_with("link", &["<https://example.org/p>; rel=\"profile\""]);
        let result = profile_extract(&headers, &HashMap::new());
        assert_eq!(result, vec![(1.0, "https://example.org/p".to_string())]);
    }

    #[test]
    fn profile_link_header_ignores_non_profile_rel() {
        let headers = headers_with("link", &["<https://example.org/p>; rel=\"alternate\""]);
        let result = profile_extract(&headers, &HashMap::new());
        assert!(result.is_empty());
    }

    #[test]
    fn profile_prefer_header_fallback() {
        let headers = headers_with("prefer", &["profile=https://example.org/p"]);
        let result = profile_extract(&headers, &HashMap::new());
        assert_eq!(result, vec![(1.0, "https://example.org/p".to_string())]);
    }

    #[test]
    fn profile_view_query_is_legacy_profile() {
        let mut query = HashMap::new();
        query.insert("_view".to_string(), "legacy".to_string());
        let result = profile_extract(&HeaderBag::new(), &query);
        assert_eq!(result, vec![(1.0, "legacy".to_string())]);
    }

    #[test]
    fn mediatype_accept_header_sorted_descending() {
        let headers = headers_with("accept", &["text/html;q=0.3, application/json;q=0.8"]);
        let result = mediatype_extract(&headers, &HashMap::new(), None);
        assert_eq!(
            result,
            vec![
                (0.8, "application/json".to_string()),
                (0.3, "text/html".to_string())
            ]
        );
    }

    #[test]
    fn mediatype_wildcard_is_held_aside_then_returned() {
        let headers = headers_with("accept", &["*/*"]);
        let result = mediatype_extract(&headers, &HashMap::new(), None);
        assert_eq!(result, vec![(1.0, "*/*".to_string())]);
    }

    #[test]
    fn mediatype_extension_fallback_uses_standard_jsonld() {
        let result = mediatype_extract(&HeaderBag::new(), &HashMap::new(), Some("jsonld"));
        assert_eq!(result, vec![(1.0, "application/ld+json".to_string())]);
    }

    #[test]
    fn mediatype_format_query_beats_extension() {
        let mut query = HashMap::new();
        query.insert("_format".to_string(), "text/n3".to_string());
        let result = mediatype_extract(&HeaderBag::new(), &query, Some("jsonld"));
        assert_eq!(result, vec![(1.0, "text/n3".to_string())]);
    }
}
