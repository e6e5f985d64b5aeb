//! Null-safe extraction of nested properties from a successful result.
//!
//! [`pluck`] wraps a completion callback so that, on success, only one nested property of
//! the result is forwarded. An absent property is the normal case, not an error: anything
//! that does not resolve becomes [`Value::Null`].
//!
//! Paths use the familiar JavaScript accessor syntax:
//!
//! | path             | segments                  |
//! |------------------|---------------------------|
//! | `a.b.c`          | `a`, `b`, `c`             |
//! | `items[0].name`  | `items`, `0`, `name`      |
//! | `a["b.c"]`       | `a`, `b.c`                |
//! | `a['x'][2]`      | `a`, `x`, `2`             |

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::intercept::intercept;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key (`.name` or `["name"]`)
    Key(String),
    /// Array position (`[3]`)
    Index(usize),
}

/// A parsed property accessor such as `a.b[0]`.
///
/// Parsing never fails. Malformed input degrades to literal keys, which then simply do
/// not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// Parse a dot/bracket accessor.
    ///
    /// ```
    /// use cbx::{PropertyPath, Segment};
    ///
    /// let path = PropertyPath::parse("users[1].name");
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         Segment::Key("users".into()),
    ///         Segment::Index(1),
    ///         Segment::Key("name".into()),
    ///     ]
    /// );
    /// ```
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut key = String::new();
        // A key segment is open: true at the start and after `.`, false right after `]`.
        let mut open = true;
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if open {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    open = true;
                }
                '[' => match parse_bracket(chars.as_str()) {
                    Some((segment, consumed)) => {
                        if !key.is_empty() {
                            segments.push(Segment::Key(std::mem::take(&mut key)));
                        }
                        segments.push(segment);
                        chars = chars.as_str()[consumed..].chars();
                        open = false;
                    }
                    None => {
                        // Unterminated: the rest of the input is one literal key.
                        key.push('[');
                        key.extend(chars.by_ref());
                        open = true;
                    }
                },
                c => {
                    key.push(c);
                    open = true;
                }
            }
        }

        if open {
            segments.push(Segment::Key(key));
        }

        Self { segments }
    }

    /// The parsed steps, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk `value` along the path, returning `None` as soon as a step does not resolve.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match (current, segment) {
                (Value::Object(map), Segment::Key(key)) => map.get(key),
                (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
                (Value::Array(items), Segment::Index(index)) => items.get(*index),
                (Value::Array(items), Segment::Key(key)) => {
                    parse_index(key).and_then(|index| items.get(index))
                }
                _ => None,
            })
    }

    /// Like [`resolve`](Self::resolve), but yields an owned value and maps "absent" to
    /// [`Value::Null`].
    pub fn extract(&self, value: &Value) -> Value {
        self.resolve(value).cloned().unwrap_or(Value::Null)
    }
}

// Parses the inside of `[...]` from the text following `[`.
// Returns the segment and how many bytes were consumed, including the closing `]`.
fn parse_bracket(rest: &str) -> Option<(Segment, usize)> {
    let mut chars = rest.char_indices();
    match chars.next()? {
        (_, quote @ ('"' | '\'')) => {
            let mut key = String::new();
            let mut escaped = false;
            let close = loop {
                let (at, c) = chars.next()?;
                match c {
                    '\\' if !escaped => escaped = true,
                    c if c == quote && !escaped => break at,
                    c => {
                        escaped = false;
                        key.push(c);
                    }
                }
            };
            // The closing quote must be followed directly by `]`.
            match rest[close + 1..].chars().next()? {
                ']' => Some((Segment::Key(key), close + 2)),
                _ => None,
            }
        }
        _ => {
            let end = rest.find(']')?;
            let inner = &rest[..end];
            let segment = match parse_index(inner) {
                Some(index) => Segment::Index(index),
                None => Segment::Key(inner.to_string()),
            };
            Some((segment, end + 1))
        }
    }
}

// Canonical array index: ASCII digits without sign, padding or leading zeros.
fn parse_index(text: &str) -> Option<usize> {
    let canonical = match text.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        digits => digits.iter().all(u8::is_ascii_digit),
    };
    if canonical {
        text.parse().ok()
    } else {
        None
    }
}

impl FromStr for PropertyPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for PropertyPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c: char| matches!(c, '.' | '[' | ']' | '"' | '\''))
}

/// Wrap `callback` so that it receives only the property at `path` of a successful result.
///
/// - `Err(e)` is forwarded as `callback(Err(e))`.
/// - `Ok(result)` is serialized to JSON and `callback(Ok(value))` receives the property at
///   `path`, or [`Value::Null`] if any step of the path is absent.
///
/// # Examples
///
/// ```
/// use cbx::pluck;
/// use serde_json::{json, Value};
///
/// let mut got = None;
/// pluck("user.emails[0]", |outcome: Result<Value, String>| got = Some(outcome))(Ok(json!({
///     "user": { "emails": ["ada@example.com"] }
/// })));
/// assert_eq!(got, Some(Ok(json!("ada@example.com"))));
///
/// let mut got = None;
/// pluck("user.phone", |outcome: Result<Value, String>| got = Some(outcome))(Ok(json!({ "user": {} })));
/// assert_eq!(got, Some(Ok(Value::Null)));
/// ```
pub fn pluck<T, E, C>(path: impl Into<PropertyPath>, callback: C) -> impl FnOnce(Result<T, E>)
where
    T: Serialize,
    C: FnOnce(Result<Value, E>),
{
    let path = path.into();

    move |outcome| {
        let plucked = intercept(Err, |result: T| Ok(extract_serialized(&path, &result)))(outcome);
        callback(plucked)
    }
}

fn extract_serialized<T: Serialize>(path: &PropertyPath, result: &T) -> Value {
    match serde_json::to_value(result) {
        Ok(value) => path.extract(&value),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            debug!(path = %path, error = %_err, "result is not representable as JSON, plucking null");

            Value::Null
        }
    }
}
