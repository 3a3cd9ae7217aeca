//! Pluggable destination resolvers (§4.3).
//!
//! A registry maps a `[dests]` entry's `kind` to a constructor that closes
//! over the entry's declared parameters (`web_endpoint`, `prefixes`, ...) and
//! returns a value implementing [`DestinationResolver`]. Two kinds ship with
//! the engine: `prez_v3` (the two-tier Prez catalog/vocab/concept/resource
//! tree) and `prez_v4` (identity).

use std::collections::HashMap;

use crate::negotiation::Ranked;

const HTML_MEDIATYPES: &[&str] = &["text/html", "application/xhtml+xml"];
const RDF_MEDIATYPES: &[&str] = &[
    "text/turtle",
    "application/rdf+xml",
    "application/ld+json",
    "application/json",
];

/// Per-request context handed to a resolver, assembled by the redirect
/// engine from the matched rule, the request, and lazily-computed
/// negotiation lists.
pub struct ResolveContext<'a> {
    pub proto: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub fragment: Option<&'a str>,
    pub query_params: &'a HashMap<String, String>,
    pub mediatype: Option<&'a Ranked>,
    pub profile: Option<&'a Ranked>,
    pub extension: Option<&'a str>,
}

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("destination misconfigured: {0}")]
    Misconfigured(String),
}

pub trait DestinationResolver: Send + Sync {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<String, DestinationError>;
}

/// Reduce a `(namespace, localname)` pair to a CURIE using a prefix map,
/// or `None` if no prefix's namespace matches.
pub fn apply_prez_curie(ns: &str, localname: &str, prefixes: &HashMap<String, String>) -> Option<String> {
    prefixes
        .iter()
        .find(|(_, namespace)| namespace.as_str() == ns)
        .map(|(prefix, _)| format!("{}:{}", prefix, localname))
}

/// Split a full URI into `(ns, localname)` the way `iri_dests.py` does:
/// split on the last `#` if present, else the last `/`.
pub fn split_uri(uri: &str) -> Option<(String, String)> {
    if let Some(idx) = uri.rfind('#') {
        let (ns, local) = uri.split_at(idx);
        return Some((format!("{}#", ns), local[1..].to_string()));
    }
    if let Some(idx) = uri.rfind('/') {
        let (ns, local) = uri.split_at(idx);
        return Some((format!("{}/", ns), local[1..].to_string()));
    }
    None
}

pub fn uri_to_curie(uri: &str, prefixes: &HashMap<String, String>) -> Option<String> {
    let (ns, local) = split_uri(uri)?;
    apply_prez_curie(&ns, &local, prefixes)
}

/// Parameters declared for a `prez_v3` entry's `[dests.*]` block.
#[derive(Debug, Clone, Default)]
pub struct PrezV3Params {
    pub web_endpoint: Option<String>,
    pub api_endpoint: Option<String>,
    pub prez_kind: Option<String>,
    pub prez_parent: Option<String>,
    pub prefixes: HashMap<String, String>,
}

pub struct PrezV3 {
    params: PrezV3Params,
}

impl PrezV3 {
    pub fn new(params: PrezV3Params) -> Self {
        PrezV3 { params }
    }

    fn pick_end(mediatype: Option<&Ranked>) -> &'static str {
        match mediatype {
            None => "backend",
            Some(list) if list.is_empty() => "backend",
            Some(list) => {
                for (_, m) in list {
                    if HTML_MEDIATYPES.contains(&m.as_str()) {
                        return "frontend";
                    }
                    if RDF_MEDIATYPES.contains(&m.as_str()) {
                        return "backend";
                    }
                }
                "backend"
            }
        }
    }
}

impl DestinationResolver for PrezV3 {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<String, DestinationError> {
        let path = ctx.path.trim_end_matches('/');

        let (ns, localname, uri) = if let Some(fragment) = ctx.fragment {
            let ns = format!("{}://{}/{}#", ctx.proto, ctx.host, path);
            let uri = format!("{}{}", ns, fragment);
            (ns, fragment.to_string(), uri)
        } else {
            let uri = format!("{}://{}/{}", ctx.proto, ctx.host, path);
            let (ns, local) =
                split_uri(&uri).ok_or_else(|| DestinationError::Misconfigured("path has no segments".into()))?;
            (ns, local, uri)
        };

        let curie = apply_prez_curie(&ns, &localname, &self.params.prefixes);

        let parent_curie = self.params.prez_parent.as_deref().and_then(|parent| {
            if parent.starts_with("http://") || parent.starts_with("https://") || parent.starts_with("urn:") {
                uri_to_curie(parent, &self.params.prefixes)
            } else if parent.contains(':') {
                Some(parent.to_string())
            } else {
                None
            }
        });

        let end = Self::pick_end(ctx.mediatype);

        let web = self
            .params
            .web_endpoint
            .as_deref()
            .ok_or_else(|| DestinationError::Misconfigured("web_endpoint must be specified".into()))?;
        let api = self
            .params
            .api_endpoint
            .as_deref()
            .ok_or_else(|| DestinationError::Misconfigured("api_endpoint must be specified".into()))?;
        let base = if end == "frontend" { web } else { api };

        let made = curie.as_deref().and_then(|curie| {
            match self.params.prez_kind.as_deref() {
                Some("catalog") => Some(format!("{}c/catalogs/{}", base, curie)),
                Some("resource") => parent_curie
                    .as_deref()
                    .map(|parent| format!("{}c/catalogs/{}/resources/{}", base, parent, curie)),
                Some("vocab") => Some(format!("{}v/vocab/{}", base, curie)),
                Some("concept") => parent_curie
                    .as_deref()
                    .map(|parent| format!("{}v/vocab/{}/{}", base, parent, curie)),
                _ => None,
            }
        });

        Ok(made.unwrap_or_else(|| format!("{}object?uri={}", base, uri)))
    }
}

/// Identity resolver: returns the reconstructed IRI unchanged.
pub struct PrezV4;

impl DestinationResolver for PrezV4 {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<String, DestinationError> {
        if let Some(fragment) = ctx.fragment {
            Ok(format!("{}://{}/{}#{}", ctx.proto, ctx.host, ctx.path, fragment))
        } else {
            Ok(format!("{}://{}/{}", ctx.proto, ctx.host, ctx.path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> HashMap<String, String> {
        let mut p = HashMap::new();
        p.insert("ex".to_string(), "https://example.org/".to_string());
        p
    }

    #[test]
    fn curie_round_trip() {
        let prefixes = prefixes();
        let curie = apply_prez_curie("https://example.org/", "thing", &prefixes).unwrap();
        assert_eq!(curie, "ex:thing");
    }

    #[test]
    fn uri_to_curie_splits_on_fragment_first() {
        let prefixes = prefixes();
        let curie = uri_to_curie("https://example.org/#thing", &prefixes).unwrap();
        assert_eq!(curie, "ex:thing");
    }

    #[test]
    fn prez_v3_catalog_uses_curie() {
        let resolver = PrezV3::new(PrezV3Params {
            web_endpoint: Some("https://web/".to_string()),
            api_endpoint: Some("https://api/".to_string()),
            prez_kind: Some("catalog".to_string()),
            prez_parent: None,
            prefixes: prefixes(),
        });
        let query = HashMap::new();
        let ctx = ResolveContext {
            proto: "https",
            host: "example.org",
            path: "thing",
            fragment: None,
            query_params: &query,
            mediatype: None,
            profile: None,
            extension: None,
        };
        let url = resolver.resolve(&ctx).unwrap();
        assert_eq!(url, "https://api/c/catalogs/ex:thing");
    }

    #[test]
    fn prez_v3_html_mediatype_picks_frontend() {
        let resolver = PrezV3::new(PrezV3Params {
            web_endpoint: Some("https://web/".to_string()),
            api_endpoint: Some("https://api/".to_string()),
            prez_kind: Some("catalog".to_string()),
            prez_parent: None,
            prefixes: prefixes(),
        });
        let query = HashMap::new();
        let mediatype: Ranked = vec![(1.0, "text/html".to_string())];
        let ctx = ResolveContext {
            proto: "https",
            host: "example.org",
            path: "thing",
            fragment: None,
            query_params: &query,
            mediatype: Some(&mediatype),
            profile: None,
            extension: None,
        };
        let url = resolver.resolve(&ctx).unwrap();
        assert_eq!(url, "https://web/c/catalogs/ex:thing");
    }

    #[test]
    fn prez_v3_unresolvable_curie_falls_back_to_object_uri() {
        let resolver = PrezV3::new(PrezV3Params {
            web_endpoint: Some("https://web/".to_string()),
            api_endpoint: Some("https://api/".to_string()),
            prez_kind: Some("catalog".to_string()),
            prez_parent: None,
            prefixes: HashMap::new(),
        });
        let query = HashMap::new();
        let ctx = ResolveContext {
            proto: "https",
            host: "example.org",
            path: "thing",
            fragment: None,
            query_params: &query,
            mediatype: None,
            profile: None,
            extension: None,
        };
        let url = resolver.resolve(&ctx).unwrap();
        assert_eq!(url, "https://api/object?uri=https://example.org/thing");
    }

    #[test]
    fn prez_v3_missing_endpoints_is_a_config_error() {
        let resolver = PrezV3::new(PrezV3Params::default());
        let query = HashMap::new();
        let ctx = ResolveContext {
            proto: "https",
            host: "example.org",
            path: "thing",
            fragment: None,
            query_params: &query,
            mediatype: None,
            profile: None,
            extension: None,
        };
        assert!(resolver.resolve(&ctx).is_err());
    }

    #[test]
    fn prez_v4_is_identity() {
        let resolver = PrezV4;
        let query = HashMap::new();
        let ctx = ResolveContext {
            proto: "https",
            host: "example.org",
            path: "a/b",
            fragment: None,
            query_params: &query,
            mediatype: None,
            profile: None,
            extension: None,
        };
        assert_eq!(resolver.resolve(&ctx).unwrap(), "https://example.org/a/b");
    }
}
