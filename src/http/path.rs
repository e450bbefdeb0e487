//! Strict request path parser.
//!
//! Implements the `absolute-path` grammar of
//! [RFC 3986, Section 3.3](https://datatracker.ietf.org/doc/html/rfc3986#section-3.3):
//!
//! ```text
//! absolute-path = 1*( "/" segment )
//! segment       = *pchar
//! pchar         = unreserved / pct-encoded / sub-delims / ":" / "@"
//! ```
//!
//! Percent-encoded triplets are validated as literal characters and never
//! decoded. Repeated slashes collapse, so `//a///b/` parses the same as
//! `/a/b`. Parsing is all-or-nothing: an invalid byte anywhere discards
//! every segment.

use memchr::memchr;
use std::{error, fmt};

const fn char_table(extra: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];

    let mut i = 0usize;
    while i < 256 {
        table[i] = (i as u8).is_ascii_alphanumeric();
        i += 1;
    }

    let mut i = 0usize;
    while i < extra.len() {
        table[extra[i] as usize] = true;
        i += 1;
    }

    table
}

// unreserved + pct-encoded + sub-delims + ":" / "@"
pub(crate) static SEGMENT_CHARS: [bool; 256] = char_table(b":@-._~%!$&'()*+,;=");

// query = *( pchar / "/" / "?" )
pub(crate) static QUERY_CHARS: [bool; 256] = char_table(b":@-._~%!$&'()*+,;=/?");

/// Parses an absolute request path into its non-empty segments.
///
/// # Examples
/// ```
/// use webrcon::path;
///
/// assert_eq!(path::parse("/players/2/kick").unwrap(), ["players", "2", "kick"]);
/// assert_eq!(path::parse("//a///b/").unwrap(), ["a", "b"]);
/// assert!(path::parse("relative").is_err());
/// assert!(path::parse("/with space").is_err());
/// ```
pub fn parse(raw: &str) -> Result<Vec<String>, Error> {
    if !raw.starts_with('/') {
        return Err(Error::NotAbsolute);
    }

    let mut segments = Vec::new();
    let mut rest = &raw[1..];

    loop {
        let end = memchr(b'/', rest.as_bytes()).unwrap_or(rest.len());
        let segment = &rest[..end];

        // discard empty segments
        if !segment.is_empty() {
            if let Some(pos) = segment
                .bytes()
                .position(|b| !SEGMENT_CHARS[b as usize])
            {
                // the first rejected byte always sits on a char boundary
                let found = segment[pos..].chars().next().unwrap_or('\u{fffd}');
                return Err(Error::InvalidCharacter(found));
            }

            segments.push(segment.to_owned());
        }

        if end == rest.len() {
            break;
        }
        rest = &rest[end + 1..];
    }

    Ok(segments)
}

/// Ways a raw path can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The path does not start with `/`.
    NotAbsolute,
    /// A segment contains a byte outside the path grammar.
    InvalidCharacter(char),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotAbsolute => {
                write!(f, "Invalid path; path does not start with '/'.")
            }
            Error::InvalidCharacter(c) => {
                write!(f, "Invalid path; invalid character {c:?} in segment.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        assert_eq!(parse("/server").unwrap(), ["server"]);
        assert_eq!(parse("/players/2/kick").unwrap(), ["players", "2", "kick"]);
        assert_eq!(parse("/").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn collapses_repeated_slashes() {
        assert_eq!(parse("//a///b/"), parse("/a/b"));
        assert_eq!(parse("/a/b/").unwrap(), ["a", "b"]);
    }

    #[test]
    fn must_be_absolute() {
        assert_eq!(parse(""), Err(Error::NotAbsolute));
        assert_eq!(parse("a/b"), Err(Error::NotAbsolute));
        assert_eq!(parse("?a=1"), Err(Error::NotAbsolute));
    }

    #[test]
    fn pchar_set_accepted() {
        assert_eq!(
            parse("/a:b@c/~x.y_z-0/%20/!$&'()*+,;=").unwrap(),
            ["a:b@c", "~x.y_z-0", "%20", "!$&'()*+,;="]
        );
    }

    #[test]
    fn rejects_whole_path() {
        assert_eq!(parse("/ok/no no"), Err(Error::InvalidCharacter(' ')));
        assert_eq!(parse("/a?b"), Err(Error::InvalidCharacter('?')));
        assert_eq!(parse("/a#b"), Err(Error::InvalidCharacter('#')));
        assert_eq!(parse("/héllo"), Err(Error::InvalidCharacter('é')));
    }

    #[test]
    fn idempotent_round_trip() {
        let segments = parse("//players//2/kick/").unwrap();
        let rendered = format!("/{}", segments.join("/"));
        assert_eq!(parse(&rendered).unwrap(), segments);
    }
}
