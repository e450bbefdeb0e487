//! Strict URL query string parser.
//!
//! A two-state scan (field name / field value) over the raw query, per
//! [RFC 3986, Section 3.4](https://datatracker.ietf.org/doc/html/rfc3986#section-3.4):
//!
//! ```text
//! query = *( pchar / "/" / "?" )
//! ```
//!
//! Unlike a permissive form decoder, this parser is strict on purpose —
//! the API surface is small enough that anything unexpected in a query
//! is a client bug worth reporting:
//!
//! - duplicate parameter names are an error, not an overwrite
//! - an empty name before `=` is an error
//! - a second `=` inside a value is an error
//! - a dangling name with no `=` at end of input is an error
//!
//! The only tolerated sloppiness is stray `&` separators between empty
//! parameters (`a=1&&b=2`, leading or trailing `&`). Values are kept
//! verbatim; percent triplets are not decoded.

use crate::http::path::QUERY_CHARS;
use std::{collections::HashMap, error, fmt};

enum State {
    Name,
    Value,
}

/// Parses a raw query string into a unique key/value map.
///
/// # Examples
/// ```
/// use webrcon::query;
///
/// let params = query::parse("map=ffa1&&mode=3").unwrap();
/// assert_eq!(params["map"], "ffa1");
/// assert_eq!(params["mode"], "3");
///
/// assert!(query::parse("a=1&a=2").is_err()); // duplicates rejected
/// assert!(query::parse("=2").is_err());      // empty name rejected
/// ```
pub fn parse(raw: &str) -> Result<HashMap<String, String>, Error> {
    let mut params = HashMap::new();
    let bytes = raw.as_bytes();

    let mut state = State::Name;
    let mut start = 0usize;
    let mut name = "";

    let mut i = 0usize;
    while i <= bytes.len() {
        let byte = bytes.get(i).copied();

        match state {
            State::Name => match byte {
                None => {
                    if i > start {
                        // dangling `name` with no `=`
                        return Err(Error::UnexpectedEnd);
                    }
                    break;
                }
                Some(b'&') => {
                    if i > start {
                        return Err(Error::UnexpectedAmpersand);
                    }
                    // stray separator, start over on the next byte
                    start = i + 1;
                }
                Some(b'=') => {
                    if i == start {
                        return Err(Error::EmptyName);
                    }
                    name = &raw[start..i];
                    state = State::Value;
                    start = i + 1;
                }
                Some(b) if QUERY_CHARS[b as usize] => {}
                Some(_) => return Err(Error::InvalidCharacter(char_at(raw, i))),
            },
            State::Value => match byte {
                None | Some(b'&') => {
                    if params.contains_key(name) {
                        return Err(Error::Duplicate(name.to_owned()));
                    }
                    params.insert(name.to_owned(), raw[start..i].to_owned());

                    if byte.is_none() {
                        break;
                    }
                    state = State::Name;
                    start = i + 1;
                }
                Some(b'=') => return Err(Error::UnexpectedEquals),
                Some(b) if QUERY_CHARS[b as usize] => {}
                Some(_) => return Err(Error::InvalidCharacter(char_at(raw, i))),
            },
        }

        i += 1;
    }

    Ok(params)
}

// `pos` is the offset of a byte that failed the grammar table; every
// rejected byte is either ASCII or the leading byte of a multi-byte
// character, so it always sits on a char boundary.
fn char_at(raw: &str, pos: usize) -> char {
    raw[pos..].chars().next().unwrap_or('\u{fffd}')
}

/// Ways a raw query string can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `=` was encountered after an empty field name.
    EmptyName,
    /// The same parameter name appeared twice.
    Duplicate(String),
    /// `&` was encountered while a field name was still being read.
    UnexpectedAmpersand,
    /// A second `=` was encountered inside a field value.
    UnexpectedEquals,
    /// The input ended while a field name was still being read.
    UnexpectedEnd,
    /// A byte outside the query grammar was encountered.
    InvalidCharacter(char),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyName => {
                write!(f, "Invalid query; encountered '=' after an empty field name.")
            }
            Error::Duplicate(name) => {
                write!(f, "Invalid query; duplicate parameter {name:?} given.")
            }
            Error::UnexpectedAmpersand => {
                write!(f, "Invalid query; unexpected '&' while parsing a field name.")
            }
            Error::UnexpectedEquals => {
                write!(f, "Invalid query; unexpected '=' while parsing a field value.")
            }
            Error::UnexpectedEnd => {
                write!(f, "Invalid query; reached end of input while parsing a field name.")
            }
            Error::InvalidCharacter(c) => {
                write!(f, "Invalid query; invalid character {c:?}.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        let params = parse("a=1&b=2").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["a"], "1");
        assert_eq!(params["b"], "2");
    }

    #[test]
    fn empty_input_and_empty_values() {
        assert!(parse("").unwrap().is_empty());
        assert_eq!(parse("flag=").unwrap()["flag"], "");
    }

    #[test]
    fn stray_ampersands_tolerated() {
        let params = parse("&&a=1&&b=2&").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["a"], "1");
        assert_eq!(params["b"], "2");
        assert!(parse("&&&").unwrap().is_empty());
    }

    #[test]
    fn duplicates_rejected() {
        assert_eq!(parse("a=1&a=2"), Err(Error::Duplicate("a".to_owned())));
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(parse("a=1&=2"), Err(Error::EmptyName));
        assert_eq!(parse("=2"), Err(Error::EmptyName));
    }

    #[test]
    fn dangling_name_rejected() {
        assert_eq!(parse("a"), Err(Error::UnexpectedEnd));
        assert_eq!(parse("a=1&b"), Err(Error::UnexpectedEnd));
        assert_eq!(parse("a&b=1"), Err(Error::UnexpectedAmpersand));
    }

    #[test]
    fn equals_in_value_rejected() {
        assert_eq!(parse("a=1=2"), Err(Error::UnexpectedEquals));
    }

    #[test]
    fn grammar_enforced() {
        assert_eq!(parse("a=b c"), Err(Error::InvalidCharacter(' ')));
        assert_eq!(
            parse("a=/ok?yes"),
            Ok(HashMap::from([("a".to_owned(), "/ok?yes".to_owned())]))
        );
    }

    #[test]
    fn idempotent_round_trip() {
        let params = parse("&x=1&map=ffa%202&flag=&").unwrap();

        let mut pairs: Vec<_> = params.iter().collect();
        pairs.sort();
        let rendered = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        assert_eq!(parse(&rendered).unwrap(), params);
    }
}
