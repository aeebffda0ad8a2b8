/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

pub fn sanitize_xml_text(text: &str) -> String {
    text.chars().filter(|&c| is_valid_xml_char(c)).collect()
}

/// Escape text for element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Service names are free-form; element ids are not.
///
/// `_` is written as `__` and any other unsafe char as `_<hex code point>_`,
/// so distinct names never share an id.
pub fn xml_id(prefix: &str, name: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + name.len() + 1);
    id.push_str(prefix);
    id.push('-');
    for c in name.chars() {
        match c {
            '_' => id.push_str("__"),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') => id.push(c),
            c => id.push_str(&format!("_{:x}_", c as u32)),
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::{escape_xml, sanitize_xml_text, xml_id};

    #[test]
    fn remove_invalid_control_chars() {
        let s = "db\u{0007}-\u{000C}main";
        assert_eq!(sanitize_xml_text(s), "db-main");
        assert_eq!(escape_xml(s), "db-main");
    }

    #[test]
    fn escape_special_xml_chars() {
        let s = r#"KEY="a&b" <x> 'y'"#;
        assert_eq!(
            escape_xml(s),
            "KEY=&quot;a&amp;b&quot; &lt;x&gt; &apos;y&apos;"
        );
    }

    #[test]
    fn ids_encode_unsafe_chars() {
        assert_eq!(xml_id("node", "api-gateway.v1"), "node-api-gateway.v1");
        assert_eq!(xml_id("node", "a b/c\"d"), "node-a_20_b_2f_c_22_d");
        assert_eq!(xml_id("group", "é"), "group-_e9_");
    }

    #[test]
    fn ids_of_distinct_names_differ() {
        let names = ["a b", "a_b", "a__b", "a_20_b", "a-b", "a.b", "a/b"];
        let ids: std::collections::HashSet<_> = names.iter().map(|n| xml_id("node", n)).collect();
        assert_eq!(ids.len(), names.len());
        assert_eq!(xml_id("node", "a_b"), "node-a__b");
    }
}
