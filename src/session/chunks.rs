//! Chunked cookie storage for oversized sealed values
//!
//! A sealed session routinely exceeds the per-cookie ceiling, so it is
//! split across `identifier.0 .. identifier.N` cookies and reassembled in
//! numeric index order. Chunk boundaries carry no meaning; reassembly must
//! reproduce the sealed value byte for byte.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SessionError;
use crate::utils::cookie::{CookieCarrier, CookieOptions};

/// Largest value written into a single chunk cookie.
pub const MAX_CHUNK_SIZE: usize = 3072;

/// Hard ceiling on chunk count. Exceeding it is an error, never a
/// truncation: a silently truncated session would corrupt undetectably.
pub const MAX_CHUNK_COUNT: usize = 10;

// Suffix of a chunk cookie name, after the identifier: ".<digits>".
static CHUNK_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.(\d+)$").unwrap());

/// One cookie-sized piece of a sealed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieChunk {
    pub name: String,
    pub value: String,
}

/// Split a sealed value into ordered chunk cookies named
/// `identifier.0 ..`.
///
/// # Errors
///
/// Returns [`SessionError::PayloadTooLarge`] when more than
/// [`MAX_CHUNK_COUNT`] chunks would be required, and an encryption-layer
/// error if a chunk boundary would fall inside a multi-byte character
/// (sealed values are base64url, so this only guards misuse).
pub fn split(identifier: &str, sealed: &str) -> Result<Vec<CookieChunk>, SessionError> {
    let required = sealed.len().div_ceil(MAX_CHUNK_SIZE);
    if required > MAX_CHUNK_COUNT {
        return Err(SessionError::PayloadTooLarge {
            required,
            limit: MAX_CHUNK_COUNT,
        });
    }

    let mut chunks = Vec::with_capacity(required);
    for (index, part) in sealed.as_bytes().chunks(MAX_CHUNK_SIZE).enumerate() {
        let value = std::str::from_utf8(part)
            .map_err(|_| SessionError::Encryption("sealed value is not ASCII-safe".to_string()))?;
        chunks.push(CookieChunk {
            name: format!("{identifier}.{index}"),
            value: value.to_owned(),
        });
    }

    Ok(chunks)
}

/// Reassemble the sealed value for `identifier` from the carrier, or
/// `None` when no chunk cookie is present. A gap in the index sequence
/// yields a corrupt value that fails decryption downstream; it is never
/// silently skipped.
#[must_use]
pub fn join(cookies: &dyn CookieCarrier, identifier: &str) -> Option<String> {
    let mut present = present_chunks(cookies, identifier);
    if present.is_empty() {
        return None;
    }

    present.sort_by_key(|(index, _)| *index);

    let mut sealed = String::new();
    for (_, name) in present {
        sealed.push_str(&cookies.get(&name)?);
    }
    Some(sealed)
}

/// Write the chunks for a freshly sealed value, then clear any stale chunk
/// a previous, larger session left behind. Shrinking sessions must leave
/// no orphan chunks to resurrect stale data on the next read.
pub fn write(
    cookies: &dyn CookieCarrier,
    identifier: &str,
    chunks: &[CookieChunk],
    options: &CookieOptions,
) {
    for chunk in chunks {
        cookies.set(&chunk.name, chunk.value.clone(), options);
    }

    for (index, name) in present_chunks(cookies, identifier) {
        if index >= chunks.len() {
            cookies.delete(&name);
        }
    }
}

/// Clear every chunk cookie currently present for `identifier`.
pub fn clear(cookies: &dyn CookieCarrier, identifier: &str) {
    for (_, name) in present_chunks(cookies, identifier) {
        cookies.delete(&name);
    }
}

// Chunk cookies currently visible for `identifier`, unordered.
fn present_chunks(cookies: &dyn CookieCarrier, identifier: &str) -> Vec<(usize, String)> {
    cookies
        .names()
        .into_iter()
        .filter_map(|name| {
            let suffix = name.strip_prefix(identifier)?;
            let captures = CHUNK_SUFFIX.captures(suffix)?;
            let index = captures.get(1)?.as_str().parse::<usize>().ok()?;
            Some((index, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::cookie::{CookieOptions, RequestCookies};

    fn carrier_from_chunks(chunks: &[CookieChunk]) -> RequestCookies {
        RequestCookies::with_cookies(
            chunks.iter().map(|c| (c.name.clone(), c.value.clone())),
            false,
        )
    }

    #[test]
    fn round_trips_are_byte_exact() {
        for len in [1, 100, MAX_CHUNK_SIZE - 1, MAX_CHUNK_SIZE, MAX_CHUNK_SIZE + 1, 7000] {
            let sealed: String = "a".repeat(len);
            let chunks = split("app_session", &sealed).unwrap();
            let cookies = carrier_from_chunks(&chunks);

            assert_eq!(join(&cookies, "app_session").unwrap(), sealed);
        }
    }

    #[test]
    fn seven_thousand_chars_make_three_cookies() {
        let sealed = "x".repeat(7000);
        let chunks = split("app_session", &sealed).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].name, "app_session.0");
        assert_eq!(chunks[1].name, "app_session.1");
        assert_eq!(chunks[2].name, "app_session.2");
        assert_eq!(chunks[0].value.len(), 3072);
        assert_eq!(chunks[1].value.len(), 3072);
        assert_eq!(chunks[2].value.len(), 856);
    }

    #[test]
    fn ten_chunks_fit_eleven_fail() {
        let at_limit = "x".repeat(MAX_CHUNK_SIZE * MAX_CHUNK_COUNT);
        assert_eq!(split("s", &at_limit).unwrap().len(), 10);

        let over = "x".repeat(MAX_CHUNK_SIZE * MAX_CHUNK_COUNT + 1);
        let err = split("s", &over).unwrap_err();
        assert!(matches!(
            err,
            SessionError::PayloadTooLarge {
                required: 11,
                limit: 10
            }
        ));
    }

    #[test]
    fn indexes_sort_numerically_not_lexically() {
        // Eleven present chunks: ".10" must land after ".9", not after ".1".
        let cookies = RequestCookies::with_cookies(
            (0..=10).map(|i| (format!("s.{i}"), i.to_string())),
            false,
        );

        assert_eq!(join(&cookies, "s").unwrap(), "012345678910");
    }

    #[test]
    fn join_ignores_unrelated_cookies() {
        let cookies = RequestCookies::with_cookies(
            [
                ("s.0".to_string(), "data".to_string()),
                ("s".to_string(), "bare".to_string()),
                ("s.x".to_string(), "garbage".to_string()),
                ("sother.0".to_string(), "other".to_string()),
            ],
            false,
        );

        assert_eq!(join(&cookies, "s").unwrap(), "data");
    }

    #[test]
    fn absent_chunks_mean_no_session() {
        let cookies = RequestCookies::empty(false);
        assert!(join(&cookies, "app_session").is_none());
    }

    #[test]
    fn write_clears_stale_trailing_chunks() {
        let big = split("s", &"x".repeat(7000)).unwrap();
        let cookies = carrier_from_chunks(&big);

        let small = split("s", &"y".repeat(100)).unwrap();
        write(&cookies, "s", &small, &CookieOptions::default());

        assert_eq!(cookies.get("s.0").as_deref(), Some(&"y".repeat(100)[..]));
        assert!(cookies.get("s.1").is_none());
        assert!(cookies.get("s.2").is_none());
        assert_eq!(join(&cookies, "s").unwrap(), "y".repeat(100));
    }

    #[test]
    fn clear_removes_every_present_chunk() {
        let chunks = split("s", &"x".repeat(7000)).unwrap();
        let cookies = carrier_from_chunks(&chunks);

        clear(&cookies, "s");
        assert!(join(&cookies, "s").is_none());
    }
}
