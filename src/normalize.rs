//! Unicode text canonicalization
//!
//! Every text-bearing schema normalizes its input before validation, and
//! normalizes again on encode so callers never depend on pre-normalized
//! input. The pipeline:
//!
//! 1. Canonical composition (NFC)
//! 2. CRLF and the Unicode line/paragraph separators become a line feed
//! 3. Unicode space separators become the ASCII space
//!
//! The original wire format also replaced lone UTF-16 surrogates with
//! U+FFFD; a Rust `String` is always well-formed UTF-8 and cannot hold a
//! lone surrogate, so that step is vacuous here.

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes text. Pure; there is no error path.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.nfc().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push('\n');
            }
            '\u{2028}' | '\u{2029}' => out.push('\n'),
            c if is_space_separator(c) => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// The Unicode `Zs` category, minus the ASCII space it collapses to.
fn is_space_separator(c: char) -> bool {
    matches!(
        c,
        '\u{00a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}
