//! Deobfuscation of `eval(function(p,a,c,k,e,d){...})` packed scripts.
//!
//! The packer stores the program as a payload whose identifiers are replaced
//! by base-`a` indices into a `|`-separated keyword list. Unpacking rebuilds
//! the same symbol table the packed code builds at runtime and substitutes
//! every word token of the payload.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

static PACKED_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"eval\(function\(p,\s*a,\s*c,\s*k,\s*e,\s*[dr]\)").unwrap());

// }('payload', base, count, 'k0|k1|...'.split('|')
static PACKED_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\}\s*\(\s*'((?:[^'\\]|\\.)*)'\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*'((?:[^'\\]|\\.)*)'\s*\.split\(\s*'\|'\s*\)"#,
    )
    .unwrap()
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Whether `script` contains the packer signature.
pub fn is_packed(script: &str) -> bool {
    PACKED_SIGNATURE.is_match(script)
}

/// Unpacks the first packed program found in `script`.
///
/// Tokens are read in base `a` over `0-9a-zA-Z`, so for `a <= 36` this is the
/// plain base-36 reading and above that `A..Z` continue the digit set.
///
/// Returns an empty string when no packed arguments can be parsed.
pub fn unpack(script: &str) -> String {
    let Some(caps) = PACKED_ARGS.captures(script) else {
        return String::new();
    };

    let payload = unescape(&caps[1]);
    let (Ok(base), Ok(count)) = (caps[2].parse::<usize>(), caps[3].parse::<usize>()) else {
        return String::new();
    };
    if !(2..=DIGITS.len()).contains(&base) {
        return String::new();
    }

    let keywords = unescape(&caps[4]);
    let keywords: Vec<&str> = keywords.split('|').collect();

    // Indices past the keyword list map to themselves, which the lookup
    // below already does for unknown tokens.
    let mut symbols = FxHashMap::default();
    for index in 0..count.min(keywords.len()) {
        let token = encode_index(index, base);
        let word = keywords
            .get(index)
            .filter(|word| !word.is_empty())
            .map(|word| word.to_string())
            .unwrap_or_else(|| token.clone());
        symbols.insert(token, word);
    }

    WORD.replace_all(&payload, |caps: &Captures| {
        let token = &caps[0];
        symbols
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    })
    .into_owned()
}

/// Base-`base` representation of `index` with the packer's digit set:
/// `0-9`, then `a-z`, then `A-Z`.
fn encode_index(mut index: usize, base: usize) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(DIGITS[index % base]);
        index /= base;
        if index == 0 {
            break;
        }
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Undoes the packer's escaping of `\` and `'` inside single-quoted literals.
fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '\'')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
