//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern matching any value containing at least one word of
/// a search input.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Characters having a special meaning in `SIMILAR TO` patterns.
    const SPECIAL: &'static [char] = &[
        '\\', '%', '_', '|', '*', '+', '?', '{', '}', '(', ')', '[', ']',
    ];

    /// Creates a new [`FuzzPattern`] out of the whitespace-separated words
    /// of the provided `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let words = input.split_whitespace().format_with("|", |w, f| {
            f(&format_args!("%{}%", Self::escape(w)))
        });
        Self(format!("({words})"))
    }

    /// Escapes all the [`FuzzPattern::SPECIAL`] characters in the provided
    /// `word`.
    fn escape(word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        for c in word.chars() {
            if Self::SPECIAL.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        assert_eq!(
            FuzzPattern::new("  Acme   hosting ").to_string(),
            "(%Acme%|%hosting%)",
        );
    }

    #[test]
    fn escapes_special_chars() {
        assert_eq!(
            FuzzPattern::new(r"50%_off (a|b)\").to_string(),
            r"(%50\%\_off%|%\(a\|b\)\\%)",
        );
    }
}
