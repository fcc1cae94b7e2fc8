//! Line filtering, match highlighting and severity hints.
//!
//! Both the user filter and the severity keywords are compiled with the ripgrep matcher
//! libraries. Filter patterns that fail to compile are treated as "no filter" rather than as
//! errors: the user is usually halfway through typing them.

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

fn case_insensitive(pattern: &str) -> Option<RegexMatcher> {
    RegexMatcherBuilder::new()
        .case_insensitive(true)
        .build(pattern)
        .ok()
}

/// A compiled, case-insensitive line filter
#[derive(Debug, Clone)]
pub struct LineFilter {
    pattern: String,
    matcher: RegexMatcher,
}

impl LineFilter {
    /// Compile `pattern`.
    ///
    /// Returns `None` for an empty pattern or one that is not a valid regex.
    pub fn parse(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }
        match case_insensitive(pattern) {
            Some(matcher) => Some(Self {
                pattern: pattern.to_string(),
                matcher,
            }),
            None => {
                log::debug!("ignoring invalid filter pattern {pattern:?}");
                None
            }
        }
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `text` contains a match
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text.as_bytes()).unwrap_or(false)
    }

    /// Byte ranges of every non-empty match in `text`
    pub fn match_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let _ = self.matcher.find_iter(text.as_bytes(), |m| {
            if m.end() > m.start() {
                spans.push((m.start(), m.end()));
            }
            true
        });
        spans
    }
}

/// Cosmetic color hint derived from keywords in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// error, fail, exception
    Bad,
    /// warn, timeout, retry
    Caution,
    /// started, listening, ready, success
    Good,
    #[default]
    Neutral,
}

/// Classifies lines into [`Severity`] buckets by whole-word keyword match
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    rules: Vec<(Severity, RegexMatcher)>,
}

impl SeverityClassifier {
    pub fn new() -> Self {
        let rules = [
            (Severity::Bad, r"\b(error|fail|exception)\b"),
            (Severity::Caution, r"\b(warn|timeout|retry)\b"),
            (Severity::Good, r"\b(started|listening|ready|success)\b"),
        ]
        .into_iter()
        .filter_map(|(severity, pattern)| case_insensitive(pattern).map(|m| (severity, m)))
        .collect();

        Self { rules }
    }

    /// First matching bucket in Bad, Caution, Good order
    pub fn classify(&self, text: &str) -> Severity {
        self.rules
            .iter()
            .find(|(_, matcher)| matcher.is_match(text.as_bytes()).unwrap_or(false))
            .map_or(Severity::Neutral, |(severity, _)| *severity)
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new()
    }
}
