//! Pure text transforms used by the layout engine: fullwidth
//! normalization, whitespace stripping, and embedded-image extraction.
//! None of these depend on font metrics, so they test in isolation.

use regex::Regex;

/// Convert ASCII characters to their fullwidth forms, space included.
///
/// Matches the halfwidth-to-fullwidth convention of CJK novel text:
/// U+0021..U+007E shift into U+FF01..U+FF5E, space becomes an
/// ideographic space. Everything else passes through.
pub fn half_to_full(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Remove every whitespace character, fullwidth spaces included.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Prepare one body paragraph for measurement and line construction.
///
/// Returns `None` for paragraphs that are whitespace-only; otherwise the
/// stripped text gains a two-space indent and a trailing `\n` marker and
/// is converted to fullwidth, so measurement sees exactly the text that
/// lands in page lines.
pub fn normalize_paragraph(raw: &str) -> Option<String> {
    let stripped = strip_whitespace(raw);
    if stripped.is_empty() {
        return None;
    }
    Some(half_to_full(&format!("  {}\n", stripped)))
}

/// Pull the `src` reference out of every `<img>` tag in a raw paragraph.
///
/// Works on the pre-normalization text (stripping would mangle the tag).
/// Order of appearance is preserved; deduplication is the caller's call.
pub fn extract_image_srcs(raw: &str) -> Vec<String> {
    let img_re = Regex::new(r"(?i)<img\s[^>]*>").unwrap();
    let src_re = Regex::new(r#"(?i)src\s*=\s*["']?([^"'>\s]+)"#).unwrap();

    let mut srcs = Vec::new();
    for tag in img_re.find_iter(raw) {
        if let Some(caps) = src_re.captures(tag.as_str()) {
            srcs.push(caps[1].to_string());
        }
    }
    srcs
}
