//! Public Suffix List matching.
//!
//! The database is fed two newline-delimited, byte-sorted rule tables (the
//! normal rules and the exception rules, both in unicode label form, the way
//! the list is distributed). Loading the data is the embedder's problem;
//! tests install small synthetic tables.

use crate::idna;
use std::ops::Range;
use std::sync::OnceLock;

const WILDCARD_LABEL: &str = "*";

static GLOBAL: OnceLock<PublicSuffixDatabase> = OnceLock::new();

/// An effective-TLD matcher over Public Suffix List data.
#[derive(Debug, Clone)]
pub struct PublicSuffixDatabase {
    rules: RuleTable,
    exceptions: RuleTable,
}

impl PublicSuffixDatabase {
    /// Build a database from sorted newline-delimited rule bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, exception_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            rules: RuleTable::new(bytes.into()),
            exceptions: RuleTable::new(exception_bytes.into()),
        }
    }

    /// Install `db` as the process-wide database consulted by
    /// [`HttpUrl::top_private_domain`][crate::HttpUrl::top_private_domain].
    /// The first installation wins; later calls are ignored and return
    /// `false`.
    pub fn install(db: PublicSuffixDatabase) -> bool {
        GLOBAL.set(db).is_ok()
    }

    /// Ensure the process-wide database exists, building it from `load` on
    /// the first call. `load` supplies the two sorted rule tables; it runs
    /// at most once per process.
    pub fn ensure_loaded(
        load: impl FnOnce() -> (Vec<u8>, Vec<u8>),
    ) -> &'static PublicSuffixDatabase {
        GLOBAL.get_or_init(|| {
            let (bytes, exception_bytes) = load();
            Self::from_bytes(bytes, exception_bytes)
        })
    }

    /// The installed process-wide database, if any.
    pub fn global() -> Option<&'static PublicSuffixDatabase> {
        let global = GLOBAL.get();
        if global.is_none() {
            log::warn!("no public suffix database has been installed");
        }
        global
    }

    /// Returns the domain one label below the public suffix of `domain`, or
    /// `None` if the domain is itself a public suffix (or has no label
    /// above one).
    ///
    /// The returned string keeps the label form of the input; matching is
    /// performed on the unicode form since that is how the list is
    /// distributed.
    pub fn effective_tld_plus_one(&self, domain: &str) -> Option<String> {
        let domain = domain.strip_suffix('.').unwrap_or(domain);
        let domain_labels: Vec<&str> = domain.split('.').collect();
        if domain_labels.iter().any(|label| label.is_empty()) {
            return None;
        }

        let unicode = idna::to_unicode(domain);
        let unicode_labels: Vec<&str> = unicode.split('.').collect();
        let rule = self.find_matching_rule(&unicode_labels);

        if domain_labels.len() == rule.len() && !rule[0].starts_with('!') {
            // the domain is exactly a public suffix
            return None;
        }

        let first_label_offset = if rule[0].starts_with('!') {
            // exception rules are registrable themselves
            domain_labels.len() - rule.len()
        } else {
            match domain_labels.len().checked_sub(rule.len() + 1) {
                Some(offset) => offset,
                None => return None,
            }
        };

        Some(domain_labels[first_label_offset..].join("."))
    }

    /// The prevailing-rule search: exception rules win, then the longer of
    /// the exact and wildcard matches, then the implicit `*` rule.
    fn find_matching_rule(&self, labels: &[&str]) -> Vec<String> {
        let mut exact_match = None;
        for start in 0..labels.len() {
            if let Some(rule) = self.rules.find(labels, start, None) {
                exact_match = Some(rule);
                break;
            }
        }

        let mut wildcard_match = None;
        if labels.len() > 1 {
            for start in 0..labels.len() - 1 {
                if let Some(rule) = self.rules.find(labels, start, Some(start)) {
                    wildcard_match = Some(rule);
                    break;
                }
            }
        }

        let mut exception_match = None;
        if wildcard_match.is_some() {
            for start in 0..labels.len() - 1 {
                if let Some(rule) = self.exceptions.find(labels, start, None) {
                    exception_match = Some(rule);
                    break;
                }
            }
        }

        if let Some(exception) = exception_match {
            return format!("!{exception}")
                .split('.')
                .map(str::to_string)
                .collect();
        }

        match (exact_match, wildcard_match) {
            (None, None) => vec![WILDCARD_LABEL.to_string()],
            (exact, wildcard) => {
                let exact: Vec<String> = exact
                    .map(|rule| rule.split('.').map(str::to_string).collect())
                    .unwrap_or_default();
                let wildcard: Vec<String> = wildcard
                    .map(|rule| rule.split('.').map(str::to_string).collect())
                    .unwrap_or_default();
                if exact.len() > wildcard.len() {
                    exact
                } else {
                    wildcard
                }
            }
        }
    }
}

/// One sorted newline-delimited rule table, searched without parsing the
/// bytes up front beyond line boundaries.
#[derive(Debug, Clone)]
struct RuleTable {
    bytes: Vec<u8>,
    lines: Vec<Range<usize>>,
}

impl RuleTable {
    fn new(bytes: Vec<u8>) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, byte) in bytes.iter().enumerate() {
            if *byte == b'\n' {
                if start < i {
                    lines.push(start..i);
                }
                start = i + 1;
            }
        }
        if start < bytes.len() {
            lines.push(start..bytes.len());
        }
        debug_assert!(
            lines
                .windows(2)
                .all(|w| bytes[w[0].clone()] <= bytes[w[1].clone()]),
            "rule table must be byte-sorted"
        );
        Self { bytes, lines }
    }

    /// Binary-search for the rule equal to `labels[start..]` joined with
    /// dots, with `labels[wildcard]` (if any) read as `*`.
    fn find(&self, labels: &[&str], start: usize, wildcard: Option<usize>) -> Option<String> {
        let query = labels[start..]
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if wildcard == Some(start + i) {
                    WILDCARD_LABEL
                } else {
                    label
                }
            })
            .collect::<Vec<_>>()
            .join(".");

        self.lines
            .binary_search_by(|range| self.bytes[range.clone()].cmp(query.as_bytes()))
            .ok()
            .map(|index| {
                String::from_utf8_lossy(&self.bytes[self.lines[index].clone()]).into_owned()
            })
    }
}
