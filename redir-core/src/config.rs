//! TOML config-directory loader (§4.2).
//!
//! Reads every `*.toml` file under a directory into a [`DefinitionsContext`]
//! plus a destination registry, compiling regex rules along the way.
//! Re-running [`ConfigLoader::load_dir`] is mtime-gated per file unless
//! `force` is set, so it is cheap to call on a timer for hot reload.
//!
//! One file configures exactly one virtual host: a `[default]` block names
//! the host (`virtualhost`, `code`, `route_prefix`, `host_aliases`,
//! `allow_slash`, `qsa`), and the top-level `[redirects]`/`[rewrites]`
//! tables hold that host's rules. `[dests]` is global across every file.
//! `host_aliases` share one table while rules from later files are still
//! being folded in, so the table is built behind an `Rc<RefCell<_>>` and
//! only frozen into an immutable `Arc<HostTable>` once the whole directory
//! has been read.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

use regex::RegexBuilder;

use crate::redirs;

use crate::destinations::{DestinationResolver, PrezV3, PrezV3Params, PrezV4};
use crate::error::ConfigError;
use crate::model::{Condition, DefinitionsContext, HostTable, RuleEntry, RuleKind};

const TRUTH_STRINGS: &[&str] = &["true", "1", "t", "yes"];

fn bool_ish(value: &toml::Value) -> bool {
    match value {
        toml::Value::Boolean(b) => *b,
        toml::Value::Integer(1) => true,
        toml::Value::String(s) => TRUTH_STRINGS.contains(&s.to_ascii_lowercase().as_str()),
        _ => false,
    }
}

/// The safe interpretation of `_startsmatch`: stop at (not skip over) the
/// first regex metacharacter, rather than the original's off-by-one skip.
pub fn find_startsmatch(pattern: &str) -> String {
    const METACHARS: &[char] = &[
        '^', '$', '.', '[', ']', '(', ')', '{', '}', '|', '*', '+', '?', '\\',
    ];
    let trimmed = pattern.strip_prefix('^').unwrap_or(pattern);
    trimmed
        .chars()
        .take_while(|c| !METACHARS.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Join a host's (or rule's) `route_prefix` onto a rule key, collapsing the
/// boundary slash and stripping any leading slash from the result.
fn join_route_prefix(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

fn compile_regex(pattern: &str) -> Option<regex::Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

fn parse_condition(value: &toml::Value) -> Condition {
    let mut parts = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            match k.as_str() {
                "mediatype" => {
                    if let Some(s) = v.as_str() {
                        parts.push(Condition::Mediatype(s.to_string()));
                    }
                }
                "profile" => {
                    if let Some(s) = v.as_str() {
                        parts.push(Condition::Profile(s.to_string()));
                    }
                }
                "not" => parts.push(Condition::Not(Box::new(parse_condition(v)))),
                _ => {}
            }
        }
    }
    Condition::And(parts)
}

struct RawRule {
    to: String,
    kind: RuleKind,
    allow_slash: Option<bool>,
    condition: Option<Condition>,
    code: Option<u16>,
    qsa: Option<bool>,
    append_route: bool,
    /// Overrides the TOML table key as the match/pattern key.
    from: Option<String>,
    /// Per-rule override of the host's `route_prefix` (simple rules only).
    route_prefix: Option<String>,
}

fn parse_rule_value(key: &str, value: &toml::Value, path: &Path) -> Result<RawRule, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(RawRule {
            to: s.clone(),
            kind: RuleKind::Simple,
            allow_slash: None,
            condition: None,
            code: None,
            qsa: None,
            append_route: false,
            from: None,
            route_prefix: None,
        }),
        toml::Value::Table(t) => {
            let to = t
                .get("to")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ConfigError::MissingTo {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                })?
                .to_string();
            let kind = match t.get("kind").and_then(|v| v.as_str()) {
                Some(k) if k.eq_ignore_ascii_case("regex") => RuleKind::Regex,
                _ => RuleKind::Simple,
            };
            Ok(RawRule {
                to,
                kind,
                allow_slash: t.get("allow_slash").map(bool_ish),
                condition: t.get("condition").map(parse_condition),
                code: t.get("code").and_then(|v| v.as_integer()).map(|c| c as u16),
                qsa: t.get("qsa").map(bool_ish),
                append_route: t.get("append_route").map(bool_ish).unwrap_or(false),
                from: t.get("from").and_then(|v| v.as_str()).map(String::from),
                route_prefix: t.get("route_prefix").and_then(|v| v.as_str()).map(String::from),
            })
        }
        _ => Err(ConfigError::BadRuleShape {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
    }
}

/// Builds a [`RuleEntry`] from a raw parsed rule and its match key. Regex
/// rules that fail to compile return `None`: the caller logs and skips the
/// rule, a soft load-time error per §7.
fn build_entry(key: &str, raw: RawRule, default_allow_slash: bool) -> Option<RuleEntry> {
    let (regex, startsmatch, allow_slash) = if raw.kind == RuleKind::Regex {
        let compiled = compile_regex(key)?;
        (Some(compiled), find_startsmatch(key), false)
    } else {
        (None, String::new(), raw.allow_slash.unwrap_or(default_allow_slash))
    };

    Some(RuleEntry {
        to: raw.to,
        kind: raw.kind,
        allow_slash,
        condition: raw.condition,
        code: raw.code,
        qsa: raw.qsa,
        append_route: raw.append_route,
        route_prefix: raw.route_prefix,
        regex,
        startsmatch,
    })
}

/// A host table under construction, shared by every alias of the host it
/// belongs to until the load finishes.
type BuildingTable = Rc<RefCell<HostTable>>;

struct Builder {
    /// canonical host -> table. Aliases resolve to the same `Rc` as their
    /// canonical host, so mutating through any alias mutates them all.
    tables: HashMap<String, BuildingTable>,
    destinations: HashMap<String, Arc<dyn DestinationResolver>>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            tables: HashMap::new(),
            destinations: HashMap::new(),
        }
    }

    fn table_for(&mut self, host: &str) -> BuildingTable {
        self.tables
            .entry(host.to_string())
            .or_insert_with(|| Rc::new(RefCell::new(HostTable::new())))
            .clone()
    }

    /// Link `alias` to `canonical`'s table. A clash where `alias` already
    /// names a *different* host's table is a logged soft error (§3/§7:
    /// mirrors the original's `if not defs_ctx[alias] is host_def:
    /// logger.error(...)`); the first mapping wins, it is not overwritten.
    fn alias(&mut self, canonical: &str, alias: &str, path: &Path) {
        let table = self.table_for(canonical);
        if let Some(existing) = self.tables.get(alias) {
            if !Rc::ptr_eq(existing, &table) {
                redirs!(
                    warn,
                    "{}: alias \"{}\" already maps to a different host, keeping the existing mapping",
                    path.display(),
                    alias
                );
                return;
            }
        }
        self.tables.insert(alias.to_string(), table);
    }

    fn insert_rule(
        &self,
        path: &Path,
        table: &BuildingTable,
        key: String,
        entry: RuleEntry,
        is_rewrite: bool,
    ) -> Result<(), ConfigError> {
        let mut table = table.borrow_mut();
        if entry.is_conditional() {
            let list = if is_rewrite {
                &mut table.conditional_rewrites
            } else {
                &mut table.conditional_redirects
            };
            if entry.kind == RuleKind::Regex {
                let marker = if is_rewrite {
                    &mut table.has_conditional_regex_rewrites
                } else {
                    &mut table.has_conditional_regex_redirects
                };
                marker.push(key.clone());
            }
            list.entry(key).or_default().push(entry);
        } else {
            let (map, regex_marker) = if is_rewrite {
                (&mut table.rewrites, &mut table.has_regex_rewrites)
            } else {
                (&mut table.redirects, &mut table.has_regex_redirects)
            };
            if map.contains_key(&key) {
                return Err(ConfigError::DuplicateKey {
                    path: path.to_path_buf(),
                    key,
                });
            }
            if entry.kind == RuleKind::Regex {
                regex_marker.push(key.clone());
            }
            map.insert(key, entry);
        }
        Ok(())
    }
}

fn load_dest_entry(name: &str, value: &toml::Value, path: &Path) -> Result<Arc<dyn DestinationResolver>, ConfigError> {
    let table = value.as_table().ok_or_else(|| ConfigError::MissingDestKind {
        path: path.to_path_buf(),
        name: name.to_string(),
    })?;
    let kind = table
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ConfigError::MissingDestKind {
            path: path.to_path_buf(),
            name: name.to_string(),
        })?;

    match kind {
        "prez_v3" => {
            let mut prefixes = HashMap::new();
            if let Some(p) = table.get("prefixes").and_then(|v| v.as_table()) {
                for (k, v) in p {
                    if let Some(v) = v.as_str() {
                        prefixes.insert(k.clone(), v.to_string());
                    }
                }
            }
            let params = PrezV3Params {
                web_endpoint: table.get("web_endpoint").and_then(|v| v.as_str()).map(String::from),
                api_endpoint: table.get("api_endpoint").and_then(|v| v.as_str()).map(String::from),
                prez_kind: table.get("prez_kind").and_then(|v| v.as_str()).map(String::from),
                prez_parent: table.get("prez_parent").and_then(|v| v.as_str()).map(String::from),
                prefixes,
            };
            Ok(Arc::new(PrezV3::new(params)))
        }
        "prez_v4" => Ok(Arc::new(PrezV4)),
        other => Err(ConfigError::UnknownDestKind {
            path: path.to_path_buf(),
            name: name.to_string(),
            kind: other.to_string(),
        }),
    }
}

/// Parse and fold one config file into `builder`. A file configures exactly
/// one virtual host, named by its `[default]` block's `virtualhost` (`""`
/// or `"@"` mean the default host). `[dests]` entries are global.
fn load_one_file(path: &Path, builder: &mut Builder) -> Result<(), ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: toml::Value = toml::from_str(&text).map_err(|source| ConfigError::BadToml {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = doc.as_table().ok_or_else(|| ConfigError::BadRuleShape {
        path: path.to_path_buf(),
        key: "<root>".to_string(),
    })?;

    if let Some(dests) = doc.get("dests").and_then(|v| v.as_table()) {
        for (name, value) in dests {
            if builder.destinations.contains_key(name) {
                return Err(ConfigError::DuplicateDestination {
                    path: path.to_path_buf(),
                    name: name.clone(),
                });
            }
            let resolver = load_dest_entry(name, value, path)?;
            builder.destinations.insert(name.clone(), resolver);
        }
    }

    let default = doc.get("default").and_then(|v| v.as_table());

    let virtualhost = default
        .and_then(|t| t.get("virtualhost"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let host = if virtualhost.is_empty() || virtualhost == "@" { "" } else { virtualhost };

    let code = default.and_then(|t| t.get("code")).and_then(|v| v.as_integer());
    let route_prefix = default
        .and_then(|t| t.get("route_prefix"))
        .and_then(|v| v.as_str())
        .unwrap_or("/");
    let default_allow_slash = default.and_then(|t| t.get("allow_slash")).map(bool_ish).unwrap_or(false);
    let default_qsa = default.and_then(|t| t.get("qsa")).map(bool_ish).unwrap_or(false);

    let host_table = builder.table_for(host);
    {
        let mut ht = host_table.borrow_mut();
        if let Some(code) = code {
            ht.default_redir_code = code as u16;
        }
        ht.default_qsa = default_qsa;
    }

    if let Some(aliases) = default.and_then(|t| t.get("host_aliases")).and_then(|v| v.as_array()) {
        for alias in aliases {
            if let Some(alias) = alias.as_str() {
                builder.alias(host, alias, path);
            }
        }
    }

    // route_prefix/allow_slash apply only to redirects, never rewrites,
    // matching the original implementation's asymmetric handling of the two
    // rule tables.
    if let Some(redirects) = doc.get("redirects").and_then(|v| v.as_table()) {
        for (key, value) in redirects {
            let raw = parse_rule_value(key, value, path)?;
            let from_key = raw.from.clone().unwrap_or_else(|| key.clone());
            let rule_prefix = raw.route_prefix.clone().unwrap_or_else(|| route_prefix.to_string());
            let rule_allow_slash_default = raw.allow_slash.unwrap_or(default_allow_slash);
            let kind = raw.kind;

            match kind {
                RuleKind::Regex => {
                    if let Some(entry) = build_entry(&from_key, raw, rule_allow_slash_default) {
                        builder.insert_rule(path, &host_table, from_key, entry, false)?;
                    } else {
                        redirs!(warn, "{}: skipping redirect \"{}\", invalid regex", path.display(), from_key);
                    }
                }
                RuleKind::Simple => {
                    let full_key = join_route_prefix(&rule_prefix, &from_key).to_lowercase();
                    if let Some(entry) = build_entry(&full_key, raw, rule_allow_slash_default) {
                        if entry.allow_slash {
                            let bare = full_key.trim_end_matches('/').to_string();
                            let slashed = format!("{}/", bare);
                            builder.insert_rule(path, &host_table, bare, entry.clone(), false)?;
                            builder.insert_rule(path, &host_table, slashed, entry, false)?;
                        } else {
                            builder.insert_rule(path, &host_table, full_key, entry, false)?;
                        }
                    } else {
                        redirs!(warn, "{}: skipping redirect \"{}\", invalid regex", path.display(), from_key);
                    }
                }
            }
        }
    }

    if let Some(rewrites) = doc.get("rewrites").and_then(|v| v.as_table()) {
        for (key, value) in rewrites {
            let raw = parse_rule_value(key, value, path)?;
            let from_key = raw.from.clone().unwrap_or_else(|| key.clone());
            let kind = raw.kind;
            let match_key = match kind {
                RuleKind::Regex => from_key.clone(),
                RuleKind::Simple => from_key.to_lowercase(),
            };
            if let Some(entry) = build_entry(&match_key, raw, false) {
                builder.insert_rule(path, &host_table, match_key, entry, true)?;
            } else {
                redirs!(warn, "{}: skipping rewrite \"{}\", invalid regex", path.display(), from_key);
            }
        }
    }

    Ok(())
}

/// Loaded config state plus the per-file mtimes used to skip unchanged
/// files on subsequent reload polls.
pub struct ConfigLoader {
    file_mtimes: HashMap<PathBuf, SystemTime>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        ConfigLoader {
            file_mtimes: HashMap::new(),
        }
    }

    /// True if any `*.toml` file under `dir` is new or changed since the
    /// last successful load.
    pub fn needs_reload(&self, dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let Ok(mtime) = meta.modified() else { continue };
            match self.file_mtimes.get(&path) {
                Some(known) if *known == mtime => continue,
                _ => return true,
            }
        }
        self.file_mtimes.len()
            != fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .filter(|e| e.path().extension().and_then(|e| e.to_str()) == Some("toml"))
                        .count()
                })
                .unwrap_or(0)
    }

    /// Load every `*.toml` file in `dir` (non-recursive, sorted by name for
    /// deterministic duplicate-key error reporting). A file that fails to
    /// be read, fails to parse as TOML, or whose mtime can't be read is a
    /// soft error (§7): it is logged and skipped, the rest of the directory
    /// still loads. A hard error (missing `to`, duplicate key, unknown
    /// destination kind, ...) aborts the whole load. When `force` is false
    /// and no file's mtime changed since last load, returns `Ok(None)`.
    pub fn load_dir(
        &mut self,
        dir: &Path,
        force: bool,
    ) -> Result<Option<(DefinitionsContext, HashMap<String, Arc<dyn DestinationResolver>>)>, ConfigError> {
        if !dir.exists() {
            return Err(ConfigError::DirectoryMissing(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory(dir.to_path_buf()));
        }

        if !force && !self.needs_reload(dir) {
            return Ok(None);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("toml"))
            .collect();
        files.sort();

        let mut builder = Builder::new();
        let mut new_mtimes = HashMap::new();
        for path in &files {
            let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(source) => {
                    redirs!(warn, "{}: cannot read mtime, skipping file: {}", path.display(), source);
                    continue;
                }
            };

            if let Err(err) = load_one_file(path, &mut builder) {
                match err {
                    ConfigError::BadToml { path, source } => {
                        redirs!(warn, "{}: malformed TOML, skipping file: {}", path.display(), source);
                        continue;
                    }
                    ConfigError::UnreadableFile { path, source } => {
                        redirs!(warn, "{}: cannot read file, skipping: {}", path.display(), source);
                        continue;
                    }
                    other => return Err(other),
                }
            }

            new_mtimes.insert(path.clone(), mtime);
        }

        self.file_mtimes = new_mtimes;

        // Freeze each distinct building table exactly once, keyed by its
        // `Rc` pointer, so aliases of the same host end up sharing one
        // `Arc<HostTable>` rather than each getting an independent copy.
        let mut frozen_by_ptr: HashMap<*const RefCell<HostTable>, Arc<HostTable>> = HashMap::new();
        let mut defs: DefinitionsContext = HashMap::new();
        for (host, table) in &builder.tables {
            let ptr = Rc::as_ptr(table);
            let frozen = frozen_by_ptr
                .entry(ptr)
                .or_insert_with(|| Arc::new(table.borrow().clone()))
                .clone();
            defs.insert(host.clone(), frozen);
        }

        Ok(Some((defs, builder.destinations)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn startsmatch_stops_at_first_metachar() {
        assert_eq!(find_startsmatch("^abc.*"), "abc");
        assert_eq!(find_startsmatch("ABC[0-9]"), "abc");
        assert_eq!(find_startsmatch(".*"), "");
    }

    #[test]
    fn bool_ish_recognizes_truthy_strings() {
        assert!(bool_ish(&toml::Value::String("yes".into())));
        assert!(bool_ish(&toml::Value::String("T".into())));
        assert!(!bool_ish(&toml::Value::String("nope".into())));
    }

    #[test]
    fn loads_simple_redirect_and_rewrite() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "a.toml",
            r#"
            [default]
            virtualhost = ""

            [redirects]
            "a" = "https://example.org/a"

            [rewrites]
            "b" = "c"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let (defs, _dests) = loader.load_dir(&dir, true).unwrap().unwrap();
        let table = defs.get("").unwrap();
        assert_eq!(table.redirects.get("a").unwrap().to, "https://example.org/a");
        assert_eq!(table.rewrites.get("b").unwrap().to, "c");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn aliases_share_the_same_table() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-alias-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "a.toml",
            r#"
            [default]
            virtualhost = "canonical.org"
            host_aliases = ["alias.org"]

            [redirects]
            "a" = "https://example.org/a"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let (defs, _dests) = loader.load_dir(&dir, true).unwrap().unwrap();
        assert!(defs.contains_key("canonical.org"));
        assert!(defs.get("alias.org").unwrap().redirects.contains_key("a"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn duplicate_key_is_a_hard_error() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-dup-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "a.toml",
            r#"
            [default]
            virtualhost = ""

            [redirects]
            "a" = "https://example.org/1"
            "#,
        );
        write_file(
            &dir,
            "b.toml",
            r#"
            [default]
            virtualhost = ""

            [redirects]
            "a" = "https://example.org/2"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let result = loader.load_dir(&dir, true);
        assert!(matches!(result, Err(ConfigError::DuplicateKey { .. })));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn route_prefix_applies_only_to_redirects() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-prefix-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "a.toml",
            r#"
            [default]
            virtualhost = ""
            route_prefix = "/api"

            [redirects]
            "a" = "https://example.org/a"

            [rewrites]
            "b" = "c"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let (defs, _dests) = loader.load_dir(&dir, true).unwrap().unwrap();
        let table = defs.get("").unwrap();
        assert!(table.redirects.contains_key("api/a"));
        assert!(table.rewrites.contains_key("b"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_toml_is_a_soft_error_and_does_not_abort_the_load() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-soft-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(&dir, "bad.toml", "this is [ not valid toml");
        write_file(
            &dir,
            "good.toml",
            r#"
            [default]
            virtualhost = ""

            [redirects]
            "a" = "https://example.org/a"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let (defs, _dests) = loader.load_dir(&dir, true).unwrap().unwrap();
        assert!(defs.get("").unwrap().redirects.contains_key("a"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn alias_clash_with_a_different_host_is_logged_and_keeps_the_first_mapping() {
        let dir = std::env::temp_dir().join(format!("redir-cfg-test-clash-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "a.toml",
            r#"
            [default]
            virtualhost = "one.org"
            host_aliases = ["shared.org"]

            [redirects]
            "a" = "https://example.org/one"
            "#,
        );
        write_file(
            &dir,
            "b.toml",
            r#"
            [default]
            virtualhost = "two.org"
            host_aliases = ["shared.org"]

            [redirects]
            "b" = "https://example.org/two"
            "#,
        );
        let mut loader = ConfigLoader::new();
        let (defs, _dests) = loader.load_dir(&dir, true).unwrap().unwrap();
        // "shared.org" keeps whichever host claimed it first; files are
        // processed in sorted name order, so "one.org" wins.
        assert!(defs.get("shared.org").unwrap().redirects.contains_key("a"));
        fs::remove_dir_all(&dir).ok();
    }
}
