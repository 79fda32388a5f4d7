//! Column and index labels.

use std::borrow::Cow;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Identity of a column or index level.
///
/// Labels are usually strings. Integer labels stand for positional
/// identities (an unnamed index level flattened into a table uses its level
/// number), and tuple labels are the keys of multi-level columns.
///
/// # Example
///
/// ```rust
/// use framecheck::Label;
///
/// let plain = Label::from("price");
/// let positional = Label::from(0usize);
/// let nested = Label::tuple(["sales", "q1"]);
///
/// assert_eq!(plain.to_string(), "price");
/// assert_eq!(positional.to_string(), "0");
/// assert_eq!(nested.to_string(), "(sales, q1)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// A string label.
    Str(String),
    /// An integer label.
    Int(i64),
    /// A composite key, one element per column level.
    Tuple(Vec<Label>),
}

impl Label {
    /// Creates a tuple label from its per-level parts.
    pub fn tuple<I, L>(parts: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        Label::Tuple(parts.into_iter().map(Into::into).collect())
    }

    /// Returns the string content of a `Str` label.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Label::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the parts of a `Tuple` label.
    pub fn as_tuple(&self) -> Option<&[Label]> {
        match self {
            Label::Tuple(parts) => Some(parts),
            _ => None,
        }
    }

    /// Text used when matching this label against a regex pattern.
    ///
    /// Tuples have no single-level text form and never match.
    pub fn match_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Label::Str(s) => Some(Cow::Borrowed(s)),
            Label::Int(n) => Some(Cow::Owned(n.to_string())),
            Label::Tuple(_) => None,
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Str(s) => write!(f, "{}", s),
            Label::Int(n) => write!(f, "{}", n),
            Label::Tuple(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Str(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Str(s)
    }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self {
        Label::Str(s.clone())
    }
}

impl From<i64> for Label {
    fn from(n: i64) -> Self {
        Label::Int(n)
    }
}

impl From<i32> for Label {
    fn from(n: i32) -> Self {
        Label::Int(i64::from(n))
    }
}

impl From<usize> for Label {
    fn from(n: usize) -> Self {
        Label::Int(n as i64)
    }
}

impl From<&Label> for Label {
    fn from(label: &Label) -> Self {
        label.clone()
    }
}
