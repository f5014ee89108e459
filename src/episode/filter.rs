use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Characters with special meaning in the download tool's episode regex
const REGEX_METACHARACTERS: &[char] = &[
    '[', ']', '.', '*', '^', '$', '(', ')', '+', '?', '{', '}', '|', '\\',
];

/// Gap placed between fuzzy fragments and around the whole pattern
const WILDCARD_GAP: &str = ".*";

/// Fragments this short or shorter are dropped from fuzzy patterns
const MIN_FRAGMENT_LEN: usize = 2;

/// Runs of whitespace, hyphens, colons and commas separate title fragments
static FRAGMENT_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-:,]+").expect("fragment separator regex is valid"));

/// Precedence tier of an episode filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Whole title, escaped
    Exact,
    /// Title fragments in order with wildcard gaps
    Fuzzy,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Exact => f.write_str("exact"),
            FilterKind::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

/// Pattern used to pick one episode out of a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFilter {
    kind: FilterKind,
    pattern: String,
}

impl EpisodeFilter {
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Escape every regex metacharacter in `text` with a backslash
pub fn escape_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build a filter matching the literal title
pub fn build_exact_filter(title: &str) -> EpisodeFilter {
    EpisodeFilter {
        kind: FilterKind::Exact,
        pattern: escape_pattern(title),
    }
}

/// Build a filter matching any title that contains the title's significant
/// fragments in their original order.
///
/// Returns `None` when no fragment is longer than two characters.
pub fn build_fuzzy_filter(title: &str) -> Option<EpisodeFilter> {
    let fragments: Vec<String> = FRAGMENT_SEPARATORS
        .split(title)
        .filter(|fragment| fragment.chars().count() > MIN_FRAGMENT_LEN)
        .map(escape_pattern)
        .collect();

    if fragments.is_empty() {
        return None;
    }

    let pattern = format!(
        "{WILDCARD_GAP}{}{WILDCARD_GAP}",
        fragments.join(WILDCARD_GAP)
    );

    Some(EpisodeFilter {
        kind: FilterKind::Fuzzy,
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY_TITLE: &str = r"What's (really) up? [Part 1] $5+tax | 50% off {now} a.b*c^d\e";

    /// True if every metacharacter in `pattern` is preceded by an escaping backslash
    fn all_metacharacters_escaped(pattern: &str) -> bool {
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if chars.next().is_none_or(|next| !REGEX_METACHARACTERS.contains(&next)) {
                    return false;
                }
            } else if REGEX_METACHARACTERS.contains(&c) {
                return false;
            }
        }
        true
    }

    #[test]
    fn exact_filter_escapes_all_metacharacters() {
        let filter = build_exact_filter(TRICKY_TITLE);

        assert_eq!(filter.kind(), FilterKind::Exact);
        assert!(all_metacharacters_escaped(filter.pattern()));
        assert_eq!(
            filter.pattern(),
            r"What's \(really\) up\? \[Part 1\] \$5\+tax \| 50% off \{now\} a\.b\*c\^d\\e"
        );
    }

    #[test]
    fn exact_filter_matches_its_own_title_literally() {
        let filter = build_exact_filter(TRICKY_TITLE);
        let anchored = Regex::new(&format!("^{}$", filter.pattern())).unwrap();

        assert!(anchored.is_match(TRICKY_TITLE));
        assert!(!anchored.is_match("What's really up? Part 1"));
    }

    #[test]
    fn exact_filter_leaves_plain_titles_unchanged() {
        assert_eq!(
            build_exact_filter("Episode 42: Deep Dive").pattern(),
            "Episode 42: Deep Dive"
        );
    }

    #[test]
    fn fuzzy_filter_keeps_long_fragments_in_order() {
        let filter = build_fuzzy_filter("The A.I. Revolution: Part One").unwrap();

        // Periods do not split, so "A.I." survives as one escaped fragment
        assert_eq!(filter.kind(), FilterKind::Fuzzy);
        assert_eq!(filter.pattern(), r".*The.*A\.I\..*Revolution.*Part.*One.*");
    }

    #[test]
    fn fuzzy_filter_drops_short_fragments() {
        let filter = build_fuzzy_filter("Ep 7 - An Of Big-Ideas, Go").unwrap();

        assert_eq!(filter.pattern(), ".*Big.*Ideas.*");
    }

    #[test]
    fn fuzzy_filter_tolerates_rewording_around_fragments() {
        let filter = build_fuzzy_filter("Episode 42: Deep Dive").unwrap();
        let regex = Regex::new(filter.pattern()).unwrap();

        assert!(regex.is_match("Episode 42: Deep Dive"));
        assert!(regex.is_match("#42 Episode - The Deep Dive (Rebroadcast)"));
        assert!(regex.is_match("Episode 42 | Deep Dive, part 2"));
        assert!(!regex.is_match("Deep Dive Episode"));
    }

    #[test]
    fn fuzzy_filter_escapes_each_fragment() {
        let filter = build_fuzzy_filter("C++ (and) Rust?").unwrap();

        assert!(all_metacharacters_escaped(
            &filter.pattern().replace(WILDCARD_GAP, "")
        ));
        assert_eq!(filter.pattern(), r".*C\+\+.*\(and\).*Rust\?.*");
    }

    #[test]
    fn fuzzy_filter_needs_a_surviving_fragment() {
        assert!(build_fuzzy_filter("").is_none());
        assert!(build_fuzzy_filter("A: B - to, of").is_none());
        assert!(build_fuzzy_filter("   ").is_none());
    }

    #[test]
    fn fragment_length_counts_characters_not_bytes() {
        // Two multibyte characters are still a two-character fragment
        assert!(build_fuzzy_filter("éé").is_none());
        assert_eq!(build_fuzzy_filter("ééé").unwrap().pattern(), ".*ééé.*");
    }
}
