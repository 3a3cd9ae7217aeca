//! The redirect/rewrite engine (§4.5): the four-stage rule matcher that
//! turns an incoming path plus its negotiated context into an outcome.

use std::collections::HashMap;
use std::sync::Arc;

use url::form_urlencoded;

use crate::destinations::{DestinationResolver, ResolveContext};
use crate::error::EngineError;
use crate::headers::HeaderBag;
use crate::host::resolve_hosts;
use crate::model::{DefinitionsContext, HostTable, RuleEntry, Target};
use crate::negotiation::{mediatype_extract, profile_extract, Ranked};

/// What the engine decided to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Redirect { location: String, code: u16 },
    NotFound,
}

pub struct RequestContext<'a> {
    pub headers: &'a HeaderBag,
    pub path: &'a str,
    pub query: &'a HashMap<String, String>,
    pub raw_query: &'a str,
    pub default_proto: &'a str,
    /// Host embedded in a `/redir?iri=...` request, already split out by
    /// the caller. `None` for an ordinary path request.
    pub iri_host: Option<&'a str>,
}

pub struct Engine {
    defs: DefinitionsContext,
    destinations: HashMap<String, Arc<dyn DestinationResolver>>,
    server_name: Option<String>,
}

impl Engine {
    pub fn new(
        defs: DefinitionsContext,
        destinations: HashMap<String, Arc<dyn DestinationResolver>>,
        server_name: Option<String>,
    ) -> Self {
        Engine {
            defs,
            destinations,
            server_name,
        }
    }

    fn host_table(&self, host: &str) -> Option<&Arc<HostTable>> {
        self.defs.get(host).or_else(|| self.defs.get(""))
    }

    /// Find the first matching rule for `path`, trying static keys, then
    /// regex keys (longest literal `to` first), then conditional variants
    /// of both, mirroring the four-stage order from the specification.
    fn find_rule<'t>(
        table: &'t HostTable,
        path: &str,
        conditional: bool,
        is_rewrite: bool,
        mediatypes: &Ranked,
        profiles: &Ranked,
    ) -> Option<(&'t RuleEntry, Vec<String>)> {
        // `path` arrives already normalized (lowercase, no leading slash) by
        // the caller, matching the keys config.rs stores simple rules under.

        if !conditional {
            let map = if is_rewrite { &table.rewrites } else { &table.redirects };
            if let Some(entry) = map.get(path) {
                return Some((entry, Vec::new()));
            }

            let regex_keys = if is_rewrite {
                &table.has_regex_rewrites
            } else {
                &table.has_regex_redirects
            };
            let mut candidates: Vec<&String> = regex_keys.iter().collect();
            candidates.sort_by(|a, b| b.len().cmp(&a.len()));
            for key in candidates {
                if let Some(entry) = map.get(key) {
                    if !entry.startsmatch.is_empty() && !path.starts_with(entry.startsmatch.as_str()) {
                        continue;
                    }
                    if let Some(regex) = &entry.regex {
                        if let Some(captures) = regex.captures(path) {
                            let groups = captures
                                .iter()
                                .skip(1)
                                .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                                .collect();
                            return Some((entry, groups));
                        }
                    }
                }
            }
            return None;
        }

        let map = if is_rewrite {
            &table.conditional_rewrites
        } else {
            &table.conditional_redirects
        };
        let regex_keys = if is_rewrite {
            &table.has_conditional_regex_rewrites
        } else {
            &table.has_conditional_regex_redirects
        };

        if let Some(entries) = map.get(path) {
            for entry in entries {
                if entry.kind == crate::model::RuleKind::Regex {
                    continue;
                }
                if entry
                    .condition
                    .as_ref()
                    .map(|c| c.evaluate(mediatypes, profiles))
                    .unwrap_or(true)
                {
                    return Some((entry, Vec::new()));
                }
            }
        }

        let mut candidates: Vec<&String> = regex_keys.iter().collect();
        candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        for key in candidates {
            if let Some(entries) = map.get(key) {
                for entry in entries {
                    if !entry.startsmatch.is_empty() && !path.starts_with(entry.startsmatch.as_str()) {
                        continue;
                    }
                    let Some(regex) = &entry.regex else { continue };
                    let Some(captures) = regex.captures(path) else { continue };
                    if entry
                        .condition
                        .as_ref()
                        .map(|c| c.evaluate(mediatypes, profiles))
                        .unwrap_or(true)
                    {
                        let groups = captures
                            .iter()
                            .skip(1)
                            .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                            .collect();
                        return Some((entry, groups));
                    }
                }
            }
        }

        None
    }

    fn substitute(template: &str, groups: &[String]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next();
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(*d);
                    chars.next();
                } else {
                    break;
                }
            }
            if braced && chars.peek() == Some(&'}') {
                chars.next();
            }
            if digits.is_empty() {
                out.push('$');
                out.push_str(&digits);
                continue;
            }
            let idx: usize = digits.parse().unwrap_or(0);
            if idx >= 1 {
                if let Some(value) = groups.get(idx - 1) {
                    out.push_str(value);
                }
            }
        }
        out
    }

    /// Merge an incoming query string into a target URL's own query string.
    /// On a key conflict, the incoming request's value wins (the
    /// specification's stated invariant, §8).
    fn apply_qsa(target: &str, incoming_raw_query: &str) -> String {
        if incoming_raw_query.is_empty() {
            return target.to_string();
        }

        let (base, existing_query) = match target.split_once('?') {
            Some((b, q)) => (b.to_string(), q.to_string()),
            None => (target.to_string(), String::new()),
        };

        let mut merged: Vec<(String, String)> = form_urlencoded::parse(existing_query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        for (k, v) in form_urlencoded::parse(incoming_raw_query.as_bytes()) {
            let (k, v) = (k.into_owned(), v.into_owned());
            if let Some(slot) = merged.iter_mut().find(|(mk, _)| *mk == k) {
                slot.1 = v;
            } else {
                merged.push((k, v));
            }
        }

        if merged.is_empty() {
            return base;
        }

        let qs: String = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(merged.iter())
            .finish();
        format!("{}?{}", base, qs)
    }

    fn resolve_target(
        &self,
        entry: &RuleEntry,
        groups: &[String],
        ctx: &ResolveContext<'_>,
    ) -> Result<String, EngineError> {
        let substituted = Self::substitute(&entry.to, groups);
        match Target::parse(&substituted) {
            Target::Literal(url) => Ok(url),
            Target::DestRef(name) => {
                let resolver = self
                    .destinations
                    .get(&name)
                    .ok_or_else(|| EngineError::UnknownDestination(name.clone()))?;
                Ok(resolver.resolve(ctx)?)
            }
        }
    }

    /// Run the full two-phase (rewrite then redirect) matcher described in
    /// the specification's redirect engine section.
    pub fn make_redir(&self, req: &RequestContext<'_>) -> Outcome {
        let extension = req.path.rsplit_once('.').map(|(_, ext)| ext);
        let mediatypes = mediatype_extract(req.headers, req.query, extension);
        let profiles = profile_extract(req.headers, req.query);

        let (proto, hosts) = resolve_hosts(
            req.headers,
            req.query,
            req.iri_host,
            req.default_proto,
            self.server_name.as_deref(),
        );

        // §4.5 path normalization: the match path is lowercased with its
        // leading slash stripped; trailing slash is retained.
        let mut path = req.path.trim_start_matches('/').to_ascii_lowercase();
        let mut host_used = hosts.first().cloned().unwrap_or_default();

        for host in &hosts {
            if let Some(table) = self.host_table(host) {
                host_used = host.clone();
                if let Some((entry, groups)) =
                    Self::find_rule(table, &path, false, true, &mediatypes, &profiles)
                        .or_else(|| Self::find_rule(table, &path, true, true, &mediatypes, &profiles))
                {
                    let ctx = ResolveContext {
                        proto: &proto,
                        host: &host_used,
                        path: path.as_str(),
                        fragment: None,
                        query_params: req.query,
                        mediatype: Some(&mediatypes),
                        profile: Some(&profiles),
                        extension,
                    };
                    if let Ok(rewritten) = self.resolve_target(entry, &groups, &ctx) {
                        // A rewrite consumes a single rule; re-normalize
                        // before Phase B, it does not chain further rewrites.
                        path = rewritten.trim_start_matches('/').to_ascii_lowercase();
                    }
                }
                break;
            }
        }

        for host in &hosts {
            let Some(table) = self.host_table(host) else { continue };
            host_used = host.clone();

            let found = Self::find_rule(table, &path, false, false, &mediatypes, &profiles)
                .or_else(|| Self::find_rule(table, &path, true, false, &mediatypes, &profiles));

            let Some((entry, groups)) = found else { continue };

            let ctx = ResolveContext {
                proto: &proto,
                host: &host_used,
                path: path.as_str(),
                fragment: None,
                query_params: req.query,
                mediatype: Some(&mediatypes),
                profile: Some(&profiles),
                extension,
            };

            let Ok(target) = self.resolve_target(entry, &groups, &ctx) else {
                continue;
            };

            let qsa = entry.qsa.unwrap_or(table.default_qsa);
            let location = if qsa {
                Self::apply_qsa(&target, req.raw_query)
            } else {
                target
            };

            let code = entry.code.unwrap_or(table.default_redir_code);
            return Outcome::Redirect { location, code };
        }

        Outcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, HostTable, RuleEntry, RuleKind};

    fn simple_entry(to: &str) -> RuleEntry {
        RuleEntry {
            to: to.to_string(),
            kind: RuleKind::Simple,
            allow_slash: false,
            condition: None,
            code: None,
            qsa: None,
            append_route: false,
            route_prefix: None,
            regex: None,
            startsmatch: String::new(),
        }
    }

    fn engine_with(table: HostTable) -> Engine {
        let mut defs: DefinitionsContext = HashMap::new();
        defs.insert("".to_string(), Arc::new(table));
        Engine::new(defs, HashMap::new(), None)
    }

    #[test]
    fn static_redirect_matches() {
        let mut table = HostTable::new();
        table.redirects.insert("a".to_string(), simple_entry("https://example.org/a"));
        let engine = engine_with(table);

        let headers = HeaderBag::new();
        let query = HashMap::new();
        let req = RequestContext {
            headers: &headers,
            path: "/a",
            query: &query,
            raw_query: "",
            iri_host: None,
            default_proto: "http",
        };
        let outcome = engine.make_redir(&req);
        assert_eq!(
            outcome,
            Outcome::Redirect {
                location: "https://example.org/a".to_string(),
                code: 307
            }
        );
    }

    #[test]
    fn qsa_merge_prefers_incoming_value_on_conflict() {
        let mut table = HostTable::new();
        table.default_qsa = true;
        table
            .redirects
            .insert("a".to_string(), simple_entry("https://example.org/a?x=1"));
        let engine = engine_with(table);

        let headers = HeaderBag::new();
        let mut query = HashMap::new();
        query.insert("x".to_string(), "2".to_string());
        let req = RequestContext {
            headers: &headers,
            path: "/a",
            query: &query,
            raw_query: "x=2",
            iri_host: None,
            default_proto: "http",
        };
        let outcome = engine.make_redir(&req);
        match outcome {
            Outcome::Redirect { location, .. } => assert!(location.contains("x=2")),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn regex_rule_substitutes_backreferences() {
        let mut table = HostTable::new();
        let mut entry = simple_entry("https://example.org/item/${1}");
        entry.kind = RuleKind::Regex;
        entry.regex = Some(regex::RegexBuilder::new(r"^items/(\w+)$").case_insensitive(true).build().unwrap());
        entry.startsmatch = "items/".to_string();
        table.redirects.insert(r"^items/(\w+)$".to_string(), entry);
        table.has_regex_redirects.push(r"^items/(\w+)$".to_string());
        let engine = engine_with(table);

        let headers = HeaderBag::new();
        let query = HashMap::new();
        let req = RequestContext {
            headers: &headers,
            path: "/items/42",
            query: &query,
            raw_query: "",
            iri_host: None,
            default_proto: "http",
        };
        let outcome = engine.make_redir(&req);
        assert_eq!(
            outcome,
            Outcome::Redirect {
                location: "https://example.org/item/42".to_string(),
                code: 307
            }
        );
    }

    #[test]
    fn conditional_rule_requires_matching_mediatype() {
        // Static rules outrank conditional ones in the four-stage order, so
        // this only exercises the conditional table when no static rule
        // exists for the same key.
        let mut table = HostTable::new();
        let mut entry = simple_entry("https://example.org/html");
        entry.condition = Some(Condition::Mediatype("html".to_string()));
        table
            .conditional_redirects
            .entry("a".to_string())
            .or_default()
            .push(entry);
        let engine = engine_with(table);

        let mut headers = HeaderBag::new();
        headers.insert("accept", "text/html");
        let query = HashMap::new();
        let req = RequestContext {
            headers: &headers,
            path: "/a",
            query: &query,
            raw_query: "",
            iri_host: None,
            default_proto: "http",
        };
        let outcome = engine.make_redir(&req);
        assert_eq!(
            outcome,
            Outcome::Redirect {
                location: "https://example.org/html".to_string(),
                code: 307
            }
        );
    }

    #[test]
    fn no_match_is_not_found() {
        let table = HostTable::new();
        let engine = engine_with(table);
        let headers = HeaderBag::new();
        let query = HashMap::new();
        let req = RequestContext {
            headers: &headers,
            path: "/nope",
            query: &query,
            raw_query: "",
            iri_host: None,
            default_proto: "http",
        };
        assert_eq!(engine.make_redir(&req), Outcome::NotFound);
    }
}
