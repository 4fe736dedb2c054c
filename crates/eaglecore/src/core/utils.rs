//! Small text helpers shared by prompts, storage and search.

/// Escapes every character MarkdownV2 treats as markup.
///
/// # Example
///
/// ```
/// use eaglecore::core::utils::escape_markdown_v2;
///
/// assert_eq!(escape_markdown_v2("Lash by Sarah!"), "Lash by Sarah\\!");
/// ```
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '_' => result.push_str("\\_"),
            '*' => result.push_str("\\*"),
            '[' => result.push_str("\\["),
            ']' => result.push_str("\\]"),
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            '~' => result.push_str("\\~"),
            '`' => result.push_str("\\`"),
            '>' => result.push_str("\\>"),
            '#' => result.push_str("\\#"),
            '+' => result.push_str("\\+"),
            '-' => result.push_str("\\-"),
            '=' => result.push_str("\\="),
            '|' => result.push_str("\\|"),
            '{' => result.push_str("\\{"),
            '}' => result.push_str("\\}"),
            '.' => result.push_str("\\."),
            '!' => result.push_str("\\!"),
            _ => result.push(c),
        }
    }

    result
}

/// Title-cases text the way the category names have always been derived:
/// a letter is upper-cased when it does not follow another letter, every
/// other letter is lower-cased.
///
/// ```
/// use eaglecore::core::utils::title_case;
///
/// assert_eq!(title_case("lash"), "Lash");
/// assert_eq!(title_case("volume lash"), "Volume Lash");
/// assert_eq!(title_case("3d design"), "3D Design");
/// ```
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            result.push(c);
            prev_is_letter = false;
        }
    }

    result
}

/// Derives a URL slug from a category name: lower-cased, spaces become dashes.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Formats an amount in minor units (kobo) as whole naira with thousands
/// separators, e.g. `150000` → `₦1,500`. A non-zero kobo remainder is kept
/// as two decimals.
pub fn format_naira(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let major = abs / 100;
    let minor = abs % 100;

    let digits = major.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if minor == 0 {
        format!("{sign}₦{grouped}")
    } else {
        format!("{sign}₦{grouped}.{minor:02}")
    }
}

/// Cuts `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown_v2("08012345678"), "08012345678");
        assert_eq!(escape_markdown_v2("@lash.by.sarah"), "@lash\\.by\\.sarah");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("lash"), "Lash");
        assert_eq!(title_case("MAKEUP"), "Makeup");
        assert_eq!(title_case("front-end dev"), "Front-End Dev");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Lash"), "lash");
        assert_eq!(slugify("Volume  Lash"), "volume-lash");
        assert_eq!(slugify(" Web Design "), "web-design");
    }

    #[test]
    fn test_format_naira() {
        assert_eq!(format_naira(150_000), "₦1,500");
        assert_eq!(format_naira(300_000), "₦3,000");
        assert_eq!(format_naira(500_000), "₦5,000");
        assert_eq!(format_naira(123_456_700), "₦1,234,567");
        assert_eq!(format_naira(99), "₦0.99");
        assert_eq!(format_naira(0), "₦0");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
