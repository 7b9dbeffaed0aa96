use std::collections::BTreeMap;
use tracing::debug;

/// Trigger -> expansion pairs, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AbbreviationTable {
    // (normalized trigger, expansion)
    entries: Vec<(String, String)>,
}

impl AbbreviationTable {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), v.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { entries }
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self::new(map.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Matches `typed` against every trigger. An exact match wins over prefixes.
    pub fn lookup(&self, typed: &str) -> AbbrevResult {
        if typed.is_empty() {
            return AbbrevResult::Matching;
        }
        let typed = normalize(typed);
        let mut candidates = 0;
        for (trigger, expansion) in &self.entries {
            if *trigger == typed {
                return AbbrevResult::Matched(expansion.clone());
            }
            if trigger.starts_with(&typed) {
                candidates += 1;
            }
        }
        if candidates > 0 {
            AbbrevResult::Matching
        } else {
            AbbrevResult::NoMatch
        }
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbbrevResult {
    /// At least one trigger still starts with the typed text.
    Matching,
    Matched(String),
    NoMatch,
}

/// Outcome of one key fed to the expander, for listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbbrevOutcome {
    Started,
    Progress(String),
    Expanded { trigger: String, text: String },
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct AbbreviationSession {
    pub active: bool,
    pub typed: String,
    pub suppress_count: usize,
}

/// Incremental matcher. Owns the session and the count of self-injected
/// key-downs that must be skipped before any other interpretation.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    table: AbbreviationTable,
    session: AbbreviationSession,
}

impl Expander {
    pub fn new(table: AbbreviationTable) -> Self {
        Self {
            table,
            session: AbbreviationSession::default(),
        }
    }

    pub fn table(&self) -> &AbbreviationTable {
        &self.table
    }

    pub fn is_matching(&self) -> bool {
        self.session.active
    }

    pub fn typed(&self) -> &str {
        &self.session.typed
    }

    pub fn begin(&mut self) {
        self.session.active = true;
        self.session.typed.clear();
        debug!("Abbreviation mode entered");
    }

    /// Leaves matching mode and drops the buffer. Returns whether a session was active.
    pub fn cancel(&mut self) -> bool {
        let was = self.session.active;
        self.session.active = false;
        self.session.typed.clear();
        was
    }

    /// Consumes one pending synthetic key-down, if any.
    pub fn take_suppressed(&mut self) -> bool {
        if self.session.suppress_count > 0 {
            self.session.suppress_count -= 1;
            true
        } else {
            false
        }
    }

    pub fn suppress_count(&self) -> usize {
        self.session.suppress_count
    }

    /// Appends the text of one typed key and rescans the table.
    ///
    /// On `Matched` the caller must inject the expansion; the suppression
    /// counter is already armed with its length.
    pub fn feed(&mut self, text: &str) -> AbbrevResult {
        if !self.session.active {
            return AbbrevResult::NoMatch;
        }
        self.session.typed.push_str(&text.to_lowercase());

        let result = self.table.lookup(&self.session.typed);
        match &result {
            AbbrevResult::Matching => {
                debug!("Abbreviation prefix {:?} matches so far", self.session.typed);
            }
            AbbrevResult::Matched(expansion) => {
                debug!("Expanding {:?} -> {:?}", self.session.typed, expansion);
                self.session.suppress_count = expansion.encode_utf16().count();
                self.session.active = false;
                self.session.typed.clear();
            }
            AbbrevResult::NoMatch => {
                debug!("No abbreviation for {:?}", self.session.typed);
                self.session.active = false;
                self.session.typed.clear();
            }
        }
        result
    }
}
