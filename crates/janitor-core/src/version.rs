//! Artifact version ordering.
//!
//! Implements the ordering rules used by Maven's `ComparableVersion`:
//! versions are tokenized into numeric and qualifier segments on `.`,
//! `-` and digit/letter boundaries, numeric segments compare
//! numerically, and well-known qualifiers rank
//! `alpha < beta < milestone < rc < snapshot < release < sp`, with
//! unknown qualifiers after all of those in lexical order. Parsing
//! never fails; every string denotes some version.

use std::cmp::Ordering;
use std::fmt;

/// Sort key of a qualifier. Unknown qualifiers carry their own text so
/// they order lexically among themselves, after every known qualifier.
fn qualifier_order(qualifier: &str) -> (u8, &str) {
    match qualifier {
        "alpha" => (0, ""),
        "beta" => (1, ""),
        "milestone" => (2, ""),
        "rc" => (3, ""),
        "snapshot" => (4, ""),
        "" => (5, ""),
        "sp" => (6, ""),
        other => (7, other),
    }
}

/// Sort key of the empty (release) qualifier.
const RELEASE_ORDER: (u8, &str) = (5, "");

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Integer(u128),
    Qualifier(String),
    Sublist(Vec<Item>),
}

impl Item {
    /// True for items that are insignificant in trailing position:
    /// zero, the release qualifier, an empty sublist.
    fn is_null(&self) -> bool {
        match self {
            Item::Integer(n) => *n == 0,
            Item::Qualifier(q) => qualifier_order(q) == RELEASE_ORDER,
            Item::Sublist(items) => items.is_empty(),
        }
    }

    /// Compares against the implicit padding of a shorter version.
    fn cmp_null(&self) -> Ordering {
        match self {
            Item::Integer(0) => Ordering::Equal,
            Item::Integer(_) => Ordering::Greater,
            Item::Qualifier(q) => qualifier_order(q).cmp(&RELEASE_ORDER),
            Item::Sublist(items) => items
                .iter()
                .map(Item::cmp_null)
                .find(|order| *order != Ordering::Equal)
                .unwrap_or(Ordering::Equal),
        }
    }

    fn cmp_item(&self, other: &Item) -> Ordering {
        match (self, other) {
            (Item::Integer(a), Item::Integer(b)) => a.cmp(b),
            (Item::Integer(_), _) => Ordering::Greater,
            (_, Item::Integer(_)) => Ordering::Less,
            (Item::Qualifier(a), Item::Qualifier(b)) => {
                qualifier_order(a).cmp(&qualifier_order(b))
            }
            (Item::Qualifier(_), Item::Sublist(_)) => Ordering::Less,
            (Item::Sublist(_), Item::Qualifier(_)) => Ordering::Greater,
            (Item::Sublist(a), Item::Sublist(b)) => cmp_lists(a, b),
        }
    }
}

fn cmp_lists(left: &[Item], right: &[Item]) -> Ordering {
    for i in 0..left.len().max(right.len()) {
        let order = match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) => l.cmp_item(r),
            (Some(l), None) => l.cmp_null(),
            (None, Some(r)) => r.cmp_null().reverse(),
            (None, None) => Ordering::Equal,
        };
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

/// Strips trailing insignificant items. Removal continues past
/// non-null sublists so `1.0-x` normalizes the same as `1-x`.
fn normalize(items: &mut Vec<Item>) {
    let mut i = items.len();
    while i > 0 {
        i -= 1;
        if items[i].is_null() {
            items.remove(i);
        } else if !matches!(items[i], Item::Sublist(_)) {
            break;
        }
    }
}

/// Canonicalizes a qualifier token. Single letters directly followed
/// by a digit expand (`a1` is `alpha-1`), and the release aliases
/// `ga`, `final` and `release` collapse to the empty qualifier.
fn canonical_qualifier(raw: &str, followed_by_digit: bool) -> String {
    let expanded = if followed_by_digit && raw.len() == 1 {
        match raw {
            "a" => "alpha",
            "b" => "beta",
            "m" => "milestone",
            other => other,
        }
    } else {
        raw
    };
    match expanded {
        "ga" | "final" | "release" => String::new(),
        "cr" => "rc".to_owned(),
        other => other.to_owned(),
    }
}

fn numeric_item(buf: &str) -> Item {
    let stripped = buf.trim_start_matches('0');
    if stripped.is_empty() {
        Item::Integer(0)
    } else {
        // components beyond 128 bits saturate
        Item::Integer(stripped.parse::<u128>().unwrap_or(u128::MAX))
    }
}

fn finish(buf: &str, is_digit: bool) -> Item {
    if is_digit {
        numeric_item(buf)
    } else {
        Item::Qualifier(canonical_qualifier(buf, false))
    }
}

fn parse(raw: &str) -> Vec<Item> {
    let lower = raw.to_lowercase();

    let mut stack: Vec<Vec<Item>> = Vec::new();
    let mut list: Vec<Item> = Vec::new();
    let mut start = 0;
    let mut is_digit = false;

    for (i, c) in lower.char_indices() {
        if c == '.' {
            let item = if i == start {
                Item::Integer(0)
            } else {
                finish(&lower[start..i], is_digit)
            };
            list.push(item);
            start = i + 1;
        } else if c == '-' {
            let item = if i == start {
                Item::Integer(0)
            } else {
                finish(&lower[start..i], is_digit)
            };
            list.push(item);
            start = i + 1;
            stack.push(std::mem::take(&mut list));
        } else if c.is_ascii_digit() {
            if !is_digit && i > start {
                list.push(Item::Qualifier(canonical_qualifier(&lower[start..i], true)));
                start = i;
                stack.push(std::mem::take(&mut list));
            }
            is_digit = true;
        } else {
            if is_digit && i > start {
                list.push(finish(&lower[start..i], true));
                start = i;
                stack.push(std::mem::take(&mut list));
            }
            is_digit = false;
        }
    }
    if lower.len() > start {
        list.push(finish(&lower[start..], is_digit));
    }

    normalize(&mut list);
    while let Some(mut parent) = stack.pop() {
        parent.push(Item::Sublist(list));
        list = parent;
        normalize(&mut list);
    }
    list
}

/// An artifact version string with total ordering semantics.
///
/// Equality follows the ordering, so `1.0`, `1` and `1.0-ga` all
/// compare equal while keeping their original text for display.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

impl Version {
    /// Parses a version string. Never fails.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            items: parse(raw),
        }
    }

    /// The original version text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_lists(&self.items, &other.items)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
