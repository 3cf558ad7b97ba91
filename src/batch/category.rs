//! Heuristic commit categorization.
//!
//! Conventional-commit types and leading verbs are checked first, then
//! keywords anywhere in the first line. Verbs and keywords are stems matched
//! at the start of a word together with their regular inflections. Both phases walk the
//! categories in the same fixed priority order and the first match wins.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Work category of a commit or batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Feature,
    Bugfix,
    Refactor,
    Docs,
    Test,
    Chore,
    Style,
    Performance,
    Other,
}

impl Category {
    /// All categories in matching priority order, `Other` last.
    pub const ALL: [Category; 9] = [
        Category::Feature,
        Category::Bugfix,
        Category::Refactor,
        Category::Docs,
        Category::Test,
        Category::Chore,
        Category::Style,
        Category::Performance,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Feature => "feature",
            Category::Bugfix => "bugfix",
            Category::Refactor => "refactor",
            Category::Docs => "docs",
            Category::Test => "test",
            Category::Chore => "chore",
            Category::Style => "style",
            Category::Performance => "performance",
            Category::Other => "other",
        }
    }

    /// Parse a label returned by a model. Accepts the canonical labels and
    /// the common conventional-commit spellings (`feat`, `fix`, `perf`, ...).
    pub fn from_label(label: &str) -> Option<Category> {
        match label.trim().to_lowercase().as_str() {
            "feature" | "feat" | "features" => Some(Category::Feature),
            "bugfix" | "fix" | "bug" => Some(Category::Bugfix),
            "refactor" | "refactoring" => Some(Category::Refactor),
            "docs" | "doc" | "documentation" => Some(Category::Docs),
            "test" | "tests" | "testing" => Some(Category::Test),
            "chore" | "build" | "ci" => Some(Category::Chore),
            "style" => Some(Category::Style),
            "performance" | "perf" => Some(Category::Performance),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn is_other(&self) -> bool {
        *self == Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    category: Category,
    /// Stems matched against the leading word of the lower-cased first line.
    leading: &'static [&'static str],
    /// Stems matched against any word of the lower-cased first line.
    keywords: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: Category::Feature,
        leading: &[
            "feat",
            "feature",
            "add",
            "implement",
            "introduce",
            "support",
            "create",
        ],
        keywords: &["feature", "implement", "introduce"],
    },
    Rule {
        category: Category::Bugfix,
        leading: &[
            "fix", "bugfix", "hotfix", "bug", "resolve", "patch", "correct",
        ],
        keywords: &["fix", "bug", "hotfix", "resolve", "crash", "regression"],
    },
    Rule {
        category: Category::Refactor,
        leading: &[
            "refactor",
            "restructure",
            "rework",
            "reorganize",
            "rename",
            "simplify",
            "extract",
            "move",
        ],
        keywords: &["refactor", "restructure", "simplify", "cleanup"],
    },
    Rule {
        category: Category::Docs,
        leading: &["doc", "document", "readme"],
        keywords: &["doc", "documentation", "readme", "changelog", "comment"],
    },
    Rule {
        category: Category::Test,
        leading: &["test"],
        keywords: &["test", "spec", "coverage"],
    },
    Rule {
        category: Category::Chore,
        leading: &[
            "chore", "build", "ci", "release", "bump", "deps", "upgrade", "merge",
        ],
        keywords: &[
            "chore",
            "bump",
            "dependency",
            "deps",
            "release",
            "version",
        ],
    },
    Rule {
        category: Category::Style,
        leading: &["style", "format", "reformat", "lint"],
        keywords: &[
            "style",
            "format",
            "lint",
            "whitespace",
            "rustfmt",
            "prettier",
        ],
    },
    Rule {
        category: Category::Performance,
        leading: &["perf", "optimize", "optimise", "speed"],
        keywords: &[
            "performance",
            "optimize",
            "optimise",
            "faster",
            "speedup",
            "cache",
        ],
    },
];

const SUFFIXES: &[&str] = &[
    "s", "es", "ed", "ing", "er", "ers", "ation", "ations", "ion", "ions",
];

/// Whether `word` is `stem` or one of its regular inflections
/// ("fix" -> "fixes", "fixing"; "optimize" -> "optimizing", "optimization";
/// "format" -> "formatting"; "dependency" -> "dependencies").
///
/// Stems only match at the start of a word, so "prefix" is not a fix, and
/// only whole inflections count, so "address" is not an addition.
fn inflects(word: &str, stem: &str) -> bool {
    let Some(rest) = word.strip_prefix(stem) else {
        return inflects_changed_ending(word, stem);
    };
    if rest.is_empty() || SUFFIXES.contains(&rest) {
        return true;
    }
    // Doubled final consonant: "format" -> "formatting", "bug" -> "bugged"
    stem.chars()
        .last()
        .and_then(|last| rest.strip_prefix(last))
        .is_some_and(|tail| matches!(tail, "ing" | "ed" | "er"))
}

/// Inflections that change the stem's last letter: a dropped `e`
/// ("optimize" -> "optimizing") or `y` turning into `i` ("simplify" -> "simplified").
fn inflects_changed_ending(word: &str, stem: &str) -> bool {
    if let Some(base) = stem.strip_suffix('e')
        && let Some(rest) = word.strip_prefix(base)
    {
        return matches!(rest, "ing" | "ation" | "ations" | "ion" | "ions");
    }
    if let Some(base) = stem.strip_suffix('y')
        && let Some(rest) = word.strip_prefix(base)
    {
        return matches!(rest, "ies" | "ied");
    }
    false
}

// Pattern: type(scope)!: description
static CONVENTIONAL_RE: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?\s*:\s*")
        .expect("conventional commit regex")
});

/// Categorize a commit message. Total and deterministic.
pub fn categorize(message: &str) -> Category {
    let first_line = message.lines().next().unwrap_or("").trim().to_lowercase();
    if first_line.is_empty() {
        return Category::Other;
    }

    // A recognized conventional type settles it outright.
    if let Some(caps) = CONVENTIONAL_RE.captures(&first_line)
        && let Some(category) = caps.get(1).and_then(|m| conventional_type(m.as_str()))
    {
        return category;
    }

    let words: Vec<&str> = first_line
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(leading) = words.first() {
        for rule in RULES {
            if rule.leading.iter().any(|stem| inflects(leading, stem)) {
                return rule.category;
            }
        }
    }

    for rule in RULES {
        let matched = rule
            .keywords
            .iter()
            .any(|stem| words.iter().any(|word| inflects(word, stem)));
        if matched {
            return rule.category;
        }
    }

    Category::Other
}

fn conventional_type(ty: &str) -> Option<Category> {
    match ty {
        "feat" | "feature" => Some(Category::Feature),
        "fix" | "bugfix" | "hotfix" => Some(Category::Bugfix),
        "refactor" => Some(Category::Refactor),
        "docs" | "doc" => Some(Category::Docs),
        "test" | "tests" => Some(Category::Test),
        "chore" | "build" | "ci" | "release" | "deps" => Some(Category::Chore),
        "style" => Some(Category::Style),
        "perf" => Some(Category::Performance),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples() {
        assert_eq!(categorize("Fix login bug"), Category::Bugfix);
        assert_eq!(categorize("docs: update readme"), Category::Docs);
        assert_eq!(categorize("sdfkj random"), Category::Other);
    }

    #[test]
    fn test_conventional_types() {
        let cases = [
            ("feat: add x", Category::Feature),
            ("fix(auth): y", Category::Bugfix),
            ("refactor!: z", Category::Refactor),
            ("docs: add usage section", Category::Docs),
            ("test: cover parser", Category::Test),
            ("chore: add z", Category::Chore),
            ("ci: pin toolchain", Category::Chore),
            ("style: rustfmt", Category::Style),
            ("perf: avoid clone", Category::Performance),
        ];
        for (message, expected) in cases {
            assert_eq!(categorize(message), expected, "message: {}", message);
        }
    }

    #[test]
    fn test_prefix_rules_follow_priority() {
        assert_eq!(categorize("Add OAuth login"), Category::Feature);
        assert_eq!(categorize("Implement retry for uploads"), Category::Feature);
        assert_eq!(categorize("Hotfix for release crash"), Category::Bugfix);
        assert_eq!(categorize("Bump serde to 1.0.200"), Category::Chore);
        assert_eq!(categorize("Optimize query planner"), Category::Performance);
    }

    #[test]
    fn test_inflected_verbs_are_recognized() {
        assert_eq!(categorize("Fixing login redirect"), Category::Bugfix);
        assert_eq!(categorize("Fixed race in scheduler"), Category::Bugfix);
        assert_eq!(categorize("Adding user profiles"), Category::Feature);
        assert_eq!(categorize("Added export button"), Category::Feature);
        assert_eq!(categorize("Documenting the API"), Category::Docs);
        assert_eq!(categorize("Optimizing queries"), Category::Performance);
        assert_eq!(categorize("Simplified config loading"), Category::Refactor);
        assert_eq!(categorize("Formatting pass over parser"), Category::Style);
        assert_eq!(categorize("Update dependencies"), Category::Chore);
        assert_eq!(categorize("Speed up startup via caching"), Category::Performance);
    }

    #[test]
    fn test_stems_require_word_start_and_whole_inflection() {
        assert!(inflects("testing", "test"));
        assert!(inflects("optimization", "optimize"));
        assert!(inflects("bugged", "bug"));
        assert!(!inflects("prefix", "fix"));
        assert!(!inflects("address", "add"));
        assert!(!inflects("circular", "ci"));
        assert!(!inflects("docker", "doc"));
    }

    #[test]
    fn test_keyword_rules_match_word_starts() {
        assert_eq!(categorize("Update README with examples"), Category::Docs);
        assert_eq!(categorize("Handle crash when config missing"), Category::Bugfix);
        // "prefix" must not count as "fix"
        assert_eq!(categorize("Tweak prefix helper"), Category::Other);
        assert_eq!(categorize("Circular import in loader"), Category::Other);
    }

    #[test]
    fn test_only_first_line_is_considered() {
        assert_eq!(categorize("Update docs\n\nfix: typo in body"), Category::Docs);
        assert_eq!(categorize("Tweak thing\n\nfixes a bug"), Category::Other);
    }

    #[test]
    fn test_case_insensitive_and_deterministic() {
        assert_eq!(categorize("FEAT: shout"), Category::Feature);
        for _ in 0..3 {
            assert_eq!(categorize("Fix login bug"), Category::Bugfix);
        }
    }

    #[test]
    fn test_empty_and_unknown_conventional_type() {
        assert_eq!(categorize(""), Category::Other);
        assert_eq!(categorize("   \n"), Category::Other);
        // unknown type falls through to keyword rules
        assert_eq!(categorize("wip: fix parser bug"), Category::Bugfix);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Category::from_label("Feature"), Some(Category::Feature));
        assert_eq!(Category::from_label(" perf "), Some(Category::Performance));
        assert_eq!(Category::from_label("security"), None);
        assert_eq!(Category::Bugfix.to_string(), "bugfix");
    }
}
