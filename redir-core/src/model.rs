//! Core data model for the redirect/rewrite rule engine.
//!
//! Mirrors the "Data Model" section of the PID redirect specification: a
//! [`RuleEntry`] is the atomic unit of matching, grouped per virtual host
//! into a [`HostTable`], and hosts are collected into a [`DefinitionsContext`].

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

/// Whether a rule key is matched literally or as a regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Simple,
    Regex,
}

impl Default for RuleKind {
    fn default() -> Self {
        RuleKind::Simple
    }
}

/// A content-negotiation predicate guarding a conditional rule.
///
/// The TOML shape `{mediatype = "...", profile = "...", not = {...}}` parses
/// as an `And` of whichever keys are present; an empty predicate is `And(vec![])`,
/// which evaluates to `true`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Not(Box<Condition>),
    Mediatype(String),
    Profile(String),
}

impl Condition {
    /// Recognized abbreviations for media types used only when matching a
    /// `mediatype` condition, not when negotiating (see `connegp`'s
    /// `EXT_TO_MEDIATYPE`, a distinct table). Carried over from
    /// `iri_redirect.py`'s `mediatype_expands`.
    fn expand_mediatype(mt: &str) -> &str {
        match mt {
            "html" => "text/html",
            "xhtml" => "application/xhtml+xml",
            "xml" => "application/xml",
            "rdf" => "application/rdf+xml",
            "ttl" | "turtle" => "text/turtle",
            "n3" | "nt" => "text/n3",
            "jsonld" | "json-ld" => "application/ld+json",
            "json" => "application/json",
            other => other,
        }
    }

    /// Evaluate this predicate against the ranked negotiation lists.
    pub fn evaluate(&self, mediatypes: &[(f64, String)], profiles: &[(f64, String)]) -> bool {
        match self {
            Condition::And(parts) => {
                parts.is_empty() || parts.iter().all(|p| p.evaluate(mediatypes, profiles))
            }
            Condition::Not(inner) => !inner.evaluate(mediatypes, profiles),
            Condition::Mediatype(mt) => {
                let wanted = Self::expand_mediatype(mt);
                mediatypes.iter().any(|(_, m)| m == wanted)
            }
            Condition::Profile(p) => profiles.iter().any(|(_, pr)| pr == p),
        }
    }

    /// True for the "no recognized keys" shape; used to skip negotiation
    /// work lazily, mirroring `len(cond) > 0` checks in the original source.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Condition::And(parts) if parts.is_empty())
    }
}

/// The resolved target of a matched rule, once any rewrite substitution has
/// been applied. A leading `!` in the substituted value names a destination
/// resolver rather than a literal URL/path (§9 "pluggable destination
/// resolvers" redesign).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Literal(String),
    DestRef(String),
}

impl Target {
    pub fn parse(resolved: &str) -> Target {
        match resolved.strip_prefix('!') {
            Some(name) => Target::DestRef(name.to_string()),
            None => Target::Literal(resolved.to_string()),
        }
    }
}

/// The atomic unit of matching: one `[redirects]` or `[rewrites]` entry.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Raw template for the output path/URL. For regex rules this may
    /// contain `${1}`/`$1`-style backreferences; substitution happens
    /// before `Target::parse` is applied to the result.
    pub to: String,
    pub kind: RuleKind,
    pub allow_slash: bool,
    pub condition: Option<Condition>,
    pub code: Option<u16>,
    pub qsa: Option<bool>,
    pub append_route: bool,
    /// Per-rule override of the host's `route_prefix` (simple rules only).
    /// Already folded into the stored match key at load time; kept here so
    /// it survives for inspection (e.g. `redir-cli dump`).
    pub route_prefix: Option<String>,
    /// Compiled case-insensitive pattern, present only for `kind == Regex`.
    pub regex: Option<Regex>,
    /// Lowercased literal prefix before the first regex metacharacter,
    /// used as a cheap pre-filter before running the full pattern. Empty
    /// when the pattern starts with a metacharacter (see `find_startsmatch`).
    pub startsmatch: String,
}

impl RuleEntry {
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// Per-host bundle of rewrite and redirect tables plus defaults.
#[derive(Debug, Clone, Default)]
pub struct HostTable {
    pub redirects: HashMap<String, RuleEntry>,
    pub rewrites: HashMap<String, RuleEntry>,
    pub conditional_redirects: HashMap<String, Vec<RuleEntry>>,
    pub conditional_rewrites: HashMap<String, Vec<RuleEntry>>,
    /// Regex keys present in `redirects`, in their original (pre-prefix) form.
    pub has_regex_redirects: Vec<String>,
    pub has_regex_rewrites: Vec<String>,
    pub has_conditional_regex_redirects: Vec<String>,
    /// Corrected per §9 anomaly #2: the Python source aliases this to the
    /// non-conditional rewrite regex list; we track it separately.
    pub has_conditional_regex_rewrites: Vec<String>,
    pub default_redir_code: u16,
    pub default_qsa: bool,
}

impl HostTable {
    pub fn new() -> Self {
        HostTable {
            default_redir_code: 307,
            ..Default::default()
        }
    }
}

/// virtualhost -> host rule table. The empty string `""` is the default
/// host. Aliases share the identical `Arc<HostTable>`.
pub type DefinitionsContext = HashMap<String, Arc<HostTable>>;
