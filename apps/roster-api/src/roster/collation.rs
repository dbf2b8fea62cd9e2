//! Locale-aware nickname comparison.
//!
//! The [`Normalizer`](super::normalize::Normalizer) receives a collator as an
//! `Arc<dyn Collator>` so tests can swap in [`OrdinalCollator`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A total order over display names.
pub trait Collator: Send + Sync + fmt::Debug {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Plain code point order.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrdinalCollator;

impl Collator for OrdinalCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// German dictionary order (DIN 5007, variant 1).
///
/// Umlauts sort with their base letter (`ä` next to `a`), `ß` as `ss`, other
/// accented Latin letters with their base letter. Comparison runs in levels:
/// base letters ignoring case, then accents (plain before accented), then case
/// (lower before upper), then code points so only equal strings tie.
#[derive(Debug, Default, Clone, Copy)]
pub struct GermanCollator;

impl Collator for GermanCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        CollationKey::german(a)
            .cmp(&CollationKey::german(b))
            .then_with(|| a.cmp(b))
    }
}

/// Accented forms per base. A letter's accent weight is its position + 1.
const FOLDS: &[(&str, &str)] = &[
    ("áàâäãåāăą", "a"),
    ("çćĉċč", "c"),
    ("ďđ", "d"),
    ("éèêëēĕėęě", "e"),
    ("ĝğġģ", "g"),
    ("ĥħ", "h"),
    ("íìîïĩīĭįı", "i"),
    ("ĵ", "j"),
    ("ķ", "k"),
    ("ĺļľŀł", "l"),
    ("ñńņň", "n"),
    ("óòôöõøōŏő", "o"),
    ("ŕŗř", "r"),
    ("śŝşš", "s"),
    ("ţťŧ", "t"),
    ("úùûüũūŭůűų", "u"),
    ("ŵ", "w"),
    ("ýÿŷ", "y"),
    ("źżž", "z"),
    ("ß", "ss"),
    ("æ", "ae"),
    ("œ", "oe"),
];

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    primary: Vec<char>,
    secondary: Vec<u8>,
    tertiary: Vec<bool>,
}

impl CollationKey {
    fn german(s: &str) -> Self {
        let mut key = CollationKey {
            primary: Vec::with_capacity(s.len()),
            secondary: Vec::with_capacity(s.len()),
            tertiary: Vec::with_capacity(s.len()),
        };

        for ch in s.chars() {
            let upper = ch.is_uppercase();
            for lower in ch.to_lowercase() {
                let (base, accent) = fold(lower);
                match base {
                    Some(base) => key.primary.extend(base.chars()),
                    None => key.primary.push(lower),
                }
                key.secondary.push(accent);
                key.tertiary.push(upper);
            }
        }

        key
    }
}

fn fold(ch: char) -> (Option<&'static str>, u8) {
    if ch.is_ascii() {
        return (None, 0);
    }
    FOLDS
        .iter()
        .find_map(|(accented, base)| {
            accented
                .chars()
                .position(|c| c == ch)
                .map(|pos| (Some(*base), pos as u8 + 1))
        })
        .unwrap_or((None, 0))
}

/// Look up a collator by its configuration name (`de`, `ordinal`).
pub fn by_name(name: &str) -> Option<Arc<dyn Collator>> {
    match name.to_ascii_lowercase().as_str() {
        "de" | "de-de" | "german" => Some(Arc::new(GermanCollator)),
        "ordinal" | "binary" => Some(Arc::new(OrdinalCollator)),
        _ => None,
    }
}
