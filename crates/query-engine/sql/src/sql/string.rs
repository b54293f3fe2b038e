//! Type definitions of a low-level SQL string representation.

/// A positional parameter placeholder. Emitted as-is, never quoted.
pub const POSITIONAL_PARAMETER: &str = "?";

/// Text rewrites applied to the whole buffer, in order, each time a binary node is closed.
/// They remove the debris left behind by operands which rendered to nothing, and turn
/// comparisons against NULL into null tests.
///
/// These work on raw text, so a string literal containing one of the patterns is rewritten too.
const CLEANUP_REWRITES: [(&str, &str); 7] = [
    ("( )", ""),
    ("AND )", ")"),
    ("OR )", ")"),
    ("( AND", "("),
    ("( OR", "("),
    ("= NULL", "IS NULL"),
    ("<> NULL", "IS NOT NULL"),
];

/// A SQL fragment under construction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SQL {
    pub sql: String,
}

impl SQL {
    pub fn new() -> SQL {
        SQL { sql: String::new() }
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Whether the fragment so far ends with one of `chars`.
    pub fn ends_with_any(&self, chars: &[char]) -> bool {
        self.sql.ends_with(chars)
    }

    pub fn apply_cleanup_rewrites(&mut self) {
        for (pattern, replacement) in CLEANUP_REWRITES {
            if self.sql.contains(pattern) {
                self.sql = self.sql.replace(pattern, replacement);
            }
        }
    }

    pub fn has_balanced_parentheses(&self) -> bool {
        has_balanced_parentheses(&self.sql)
    }
}

impl std::fmt::Display for SQL {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Checks that every `(` is closed by a later `)`. Literals are inlined without escaping,
/// so parentheses inside them are counted too.
pub fn has_balanced_parentheses(sql: &str) -> bool {
    let mut depth: usize = 0;
    for c in sql.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(new_depth) => depth = new_depth,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
