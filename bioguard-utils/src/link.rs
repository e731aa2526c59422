use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Scheme-qualified or `www.`-prefixed domain with an optional path, or a
/// Telegram short link. Short links must start a word, so `robot.me/x` is
/// plain text.
const LINK_PATTERN: &str = concat!(
    r"(?P<link>(?:https?://|www\.)[a-zA-Z0-9.\-]+(?:\.[a-zA-Z]{2,})+(?:/[a-zA-Z0-9._%+\-]*)*)",
    r"|(?:^|[^a-zA-Z0-9_.\-])(?P<short>(?:t|telegram)\.me/[a-zA-Z0-9_+]+)",
);

static DEFAULT_DETECTOR: LazyLock<LinkDetector> = LazyLock::new(|| LinkDetector::new(false));

/// Classifies profile bios as link-bearing or not.
#[derive(Clone, Debug)]
pub struct LinkDetector {
    pattern: Regex,
    case_insensitive: bool,
}

impl LinkDetector {
    pub fn new(case_insensitive: bool) -> Self {
        let pattern = RegexBuilder::new(LINK_PATTERN)
            .case_insensitive(case_insensitive)
            .build()
            .expect("static link pattern compiles");

        Self {
            pattern,
            case_insensitive,
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn contains_link(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && self.pattern.is_match(text)
    }

    /// Absent bios are link-free.
    pub fn bio_contains_link(&self, bio: Option<&str>) -> bool {
        bio.is_some_and(|text| self.contains_link(text))
    }

    /// The first link-looking substring, for log lines.
    pub fn first_link<'t>(&self, text: &'t str) -> Option<&'t str> {
        let captures = self.pattern.captures(text)?;
        captures
            .name("link")
            .or_else(|| captures.name("short"))
            .map(|found| found.as_str())
    }
}

impl Default for LinkDetector {
    fn default() -> Self {
        DEFAULT_DETECTOR.clone()
    }
}

/// Case-sensitive check with the default pattern.
pub fn contains_link(text: &str) -> bool {
    DEFAULT_DETECTOR.contains_link(text)
}
