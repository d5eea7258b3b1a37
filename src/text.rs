//! Text clean-up steps applied to rendered cells

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{ExportError, Result};

/// Character substituted for code points the output encoding cannot represent
pub const REPLACEMENT_CHAR: char = '?';

/// Remove markup tags and comments, keeping their text content
///
/// A `<` that does not open a tag (`a < b`) is kept as-is.
pub fn strip_tags(input: &str) -> Cow<'_, str> {
    if !input.contains('<') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("<!--") {
            rest = match tail.find("-->") {
                Some(end) => &tail[end + 3..],
                None => "",
            };
            continue;
        }
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            out.push('<');
            rest = &tail[1..];
            continue;
        }
        rest = match tag_end(tail) {
            Some(end) => &tail[end + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Index of the `>` closing the tag at the start of `tail`, skipping quoted attribute values
fn tag_end(tail: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tail.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Decode HTML entities (`&amp;`, `&eacute;`, `&#8364;`)
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(input)
}

/// Replace `\r\n`, `\n` and `\r` with the given substitute
pub fn replace_newlines<'a>(input: &'a str, replacement: &str) -> Cow<'a, str> {
    if !input.contains(['\n', '\r']) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(
        input
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\n', replacement),
    )
}

/// Replace `<br>`, `<br/>` and `<br />` (any case) with a single space
pub fn normalize_line_breaks(input: &str) -> Cow<'_, str> {
    let lower = input.to_ascii_lowercase();
    if !lower.contains("<br") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if lower[i..].starts_with("<br") {
            let after = &lower[i + 3..];
            let ws = after.len() - after.trim_start().len();
            let close = &after[ws..];
            let consumed = if close.starts_with("/>") {
                Some(3 + ws + 2)
            } else if close.starts_with('>') {
                Some(3 + ws + 1)
            } else {
                None
            };
            if let Some(len) = consumed {
                out.push(' ');
                i += len;
                continue;
            }
        }
        let c = input[i..].chars().next().unwrap_or_default();
        out.push(c);
        i += c.len_utf8().max(1);
    }
    Cow::Owned(out)
}

/// Restricts text to what a target character encoding can represent
#[derive(Debug, Clone, Copy)]
pub struct Transliterator {
    encoding: &'static Encoding,
}

impl Transliterator {
    /// Look up an encoding by label (`"ISO-8859-2"`, `"windows-1250"`, `"latin1"`)
    pub fn for_label(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ExportError::UnknownEncoding(label.to_string()))?;
        Ok(Transliterator {
            encoding: encoding.output_encoding(),
        })
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Canonical encoding name
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn is_utf8(&self) -> bool {
        self.encoding == UTF_8
    }

    /// Return the text unchanged when representable, otherwise with each
    /// unmappable character replaced by [`REPLACEMENT_CHAR`]
    pub fn transliterate<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if self.is_utf8() || input.is_ascii() {
            return Cow::Borrowed(input);
        }
        let (_, _, had_errors) = self.encoding.encode(input);
        if !had_errors {
            return Cow::Borrowed(input);
        }

        let err = ExportError::EncodingConversion {
            encoding: self.name().to_string(),
            value: input.to_string(),
        };
        tracing::warn!("{}; substituting {:?}", err, REPLACEMENT_CHAR);

        let mut buf = [0u8; 4];
        let out = input
            .chars()
            .map(|c| {
                let (_, _, unmappable) = self.encoding.encode(c.encode_utf8(&mut buf));
                if unmappable {
                    REPLACEMENT_CHAR
                } else {
                    c
                }
            })
            .collect();
        Cow::Owned(out)
    }
}
