use crate::models::ReadingTime;

const WORDS_PER_MINUTE: usize = 230;
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Title-cases each word; words of one or two characters stay lower case.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if word.chars().count() <= 2 {
                return word.to_lowercase();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn estimate_reading_time(text: &str) -> ReadingTime {
    let words = text.split_whitespace().count();
    ReadingTime {
        words,
        minutes: words.div_ceil(WORDS_PER_MINUTE),
    }
}

/// Decodes raw content bytes, skipping a UTF-8 byte order mark if present.
pub fn decode_text(bytes: &[u8]) -> Result<String, std::string::FromUtf8Error> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(body.to_vec())
}

/// Page numbers typed by the reader. Anything that is not a positive integer is ignored.
pub fn parse_page(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|page| *page >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_keeps_connectors_lower() {
        assert_eq!(title_case("A TALE OF TWO CITIES"), "a Tale of Two Cities");
        assert_eq!(title_case("  notes   TO   self "), "Notes to Self");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(estimate_reading_time(""), ReadingTime { words: 0, minutes: 0 });
        let text = "word ".repeat(231);
        assert_eq!(estimate_reading_time(&text), ReadingTime { words: 231, minutes: 2 });
    }

    #[test]
    fn decode_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("PROLOGUE".as_bytes());
        assert_eq!(decode_text(&bytes).unwrap(), "PROLOGUE");
        assert!(decode_text(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn page_input_parsing() {
        assert_eq!(parse_page(" 4 "), Some(4));
        assert_eq!(parse_page("0"), None);
        assert_eq!(parse_page("-2"), None);
        assert_eq!(parse_page("four"), None);
    }

    #[test]
    fn escapes_markup_characters() {
        let escaped = escape_html("<a href=\"x\">Tom & 'Jerry'</a>");
        assert!(escaped.contains("&lt;a href="));
        assert!(escaped.contains("&amp;"));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert!(!escaped.contains('>'));
    }
}
