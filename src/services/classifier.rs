use crate::models::{BlockKind, ContentBlock, Section};
use crate::utils::text::{escape_html, title_case};
use regex::Regex;
use std::sync::LazyLock;

const RULE_CHARS: &str = "\u{2550}\u{2501}\u{2500}\u{254C}";
const SEPARATOR_ORNAMENT: &str = "\u{2022} \u{2022} \u{2022}";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph break pattern"));
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{2550}\x{2501}\x{2500}\x{254C}\-_~*]{5,}$").expect("valid separator pattern")
});
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z\s0-9\x{2550}\x{2501}\x{2500}\x{254C}:&,.'\-!?()]{5,}$")
        .expect("valid heading pattern")
});
static CHAPTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(chapter|part)\s").expect("valid chapter pattern"));
static DASH_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---\s+(.+?)\s+---$").expect("valid dash title pattern"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+\.\s|[-\x{2022}]\s)").expect("valid list pattern"));

/// Classification state carried across paragraphs of one book.
#[derive(Debug, Default)]
pub struct Sections {
    next_id: usize,
}

impl Sections {
    fn next(&mut self) -> String {
        self.next_id += 1;
        format!("section-{}", self.next_id)
    }
}

pub type RuleFn = fn(&str, &mut Sections) -> Option<ContentBlock>;

/// Ordered rule table; the first rule returning a block wins.
pub const RULES: &[(BlockKind, RuleFn)] = &[
    (BlockKind::Separator, separator),
    (BlockKind::Heading, heading),
    (BlockKind::Subheading, chapter_subheading),
    (BlockKind::Subheading, dash_subheading),
    (BlockKind::Quote, quote),
    (BlockKind::ListItem, list_item),
    (BlockKind::Paragraph, paragraph),
];

fn block(kind: BlockKind, text: impl Into<String>) -> ContentBlock {
    ContentBlock {
        kind,
        text: text.into(),
        section: None,
    }
}

fn separator(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    SEPARATOR
        .is_match(text)
        .then(|| block(BlockKind::Separator, SEPARATOR_ORNAMENT))
}

fn heading(text: &str, sections: &mut Sections) -> Option<ContentBlock> {
    let len = text.chars().count();
    if !(4..80).contains(&len) || !HEADING.is_match(text) {
        return None;
    }
    let title = format_heading(text);
    Some(ContentBlock {
        kind: BlockKind::Heading,
        text: title.clone(),
        section: Some(Section {
            section_id: sections.next(),
            title,
        }),
    })
}

fn chapter_subheading(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    (CHAPTER_PREFIX.is_match(text) && text.chars().count() < 120)
        .then(|| block(BlockKind::Subheading, text))
}

fn dash_subheading(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    DASH_TITLE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|title| block(BlockKind::Subheading, title.as_str()))
}

fn quote(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    (text.starts_with('"') && text.ends_with('"') && text.chars().count() < 300)
        .then(|| block(BlockKind::Quote, text))
}

fn list_item(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    LIST_MARKER
        .is_match(text)
        .then(|| block(BlockKind::ListItem, text))
}

fn paragraph(text: &str, _: &mut Sections) -> Option<ContentBlock> {
    Some(block(BlockKind::Paragraph, text))
}

/// Strips box-drawing rules and title-cases the remaining words.
pub fn format_heading(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !RULE_CHARS.contains(*c)).collect();
    title_case(stripped.trim())
}

pub fn classify_paragraph(text: &str, sections: &mut Sections) -> ContentBlock {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(text, sections))
        .unwrap_or_else(|| block(BlockKind::Paragraph, text))
}

/// Splits raw book text on blank lines and classifies every non-empty paragraph.
pub fn classify(text: &str) -> Vec<ContentBlock> {
    let mut sections = Sections::default();
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| classify_paragraph(para, &mut sections))
        .collect()
}

impl ContentBlock {
    pub fn section_id(&self) -> Option<&str> {
        self.section.as_ref().map(|s| s.section_id.as_str())
    }

    /// HTML fragment for the reading area. Escaping happens here and nowhere else.
    pub fn to_html(&self) -> String {
        let escaped = escape_html(&self.text);
        match self.kind {
            BlockKind::Heading => format!(
                "<h2 class=\"section-heading\" id=\"{}\">{}</h2>",
                self.section_id().unwrap_or_default(),
                escaped
            ),
            BlockKind::Subheading => {
                format!("<h3 class=\"sub-heading\">{}</h3>", line_breaks(&escaped))
            }
            BlockKind::Quote => format!("<blockquote>{escaped}</blockquote>"),
            BlockKind::ListItem => {
                format!("<p class=\"list-item\">{}</p>", line_breaks(&escaped))
            }
            BlockKind::Separator => format!("<div class=\"separator\">{escaped}</div>"),
            BlockKind::Paragraph => format!("<p>{}</p>", line_breaks(&escaped)),
        }
    }
}

fn line_breaks(text: &str) -> String {
    text.replace("\r\n", "<br>").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[ContentBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn classifies_mixed_document() {
        let blocks = classify("ACT ONE\n\nHello there.\n\n-----\n\nChapter 1\nBegins now.");
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Separator,
                BlockKind::Subheading,
            ]
        );
        assert_eq!(blocks[0].text, "Act One");
        assert_eq!(blocks[0].section_id(), Some("section-1"));
        assert_eq!(blocks[1].text, "Hello there.");
        assert_eq!(blocks[3].text, "Chapter 1\nBegins now.");
    }

    #[test]
    fn separator_takes_precedence_over_heading() {
        let mut sections = Sections::default();
        for rule in ["-----", "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}", "~~~~~", "*****", "_____"] {
            let block = classify_paragraph(rule, &mut sections);
            assert_eq!(block.kind, BlockKind::Separator, "{rule}");
            assert_eq!(block.section, None);
        }
        assert_eq!(classify_paragraph("----", &mut sections).kind, BlockKind::Paragraph);
    }

    #[test]
    fn heading_titles_lower_case_short_words() {
        let blocks = classify("THE ART OF WAR\n\n\u{2550}\u{2550} KEY THEMES \u{2550}\u{2550}");
        assert_eq!(blocks[0].text, "The Art of War");
        assert_eq!(blocks[1].text, "Key Themes");
        assert_eq!(blocks[1].section_id(), Some("section-2"));
    }

    #[test]
    fn heading_length_bounds() {
        let mut sections = Sections::default();
        assert_eq!(classify_paragraph("WHY", &mut sections).kind, BlockKind::Paragraph);
        let long = "A".repeat(80);
        assert_eq!(classify_paragraph(&long, &mut sections).kind, BlockKind::Paragraph);
        let edge = "A".repeat(79);
        assert_eq!(classify_paragraph(&edge, &mut sections).kind, BlockKind::Heading);
        assert_eq!(
            classify_paragraph("Mostly lower case", &mut sections).kind,
            BlockKind::Paragraph
        );
    }

    #[test]
    fn only_ascii_digits_count_as_heading_or_list_digits() {
        let mut sections = Sections::default();
        assert_eq!(classify_paragraph("CHAPTER 3", &mut sections).kind, BlockKind::Heading);
        assert_eq!(
            classify_paragraph("CHAPTER \u{0663}", &mut sections).kind,
            BlockKind::Subheading
        );
        assert_eq!(
            classify_paragraph("\u{0663}. Arabic-Indic numbering", &mut sections).kind,
            BlockKind::Paragraph
        );
    }

    #[test]
    fn subheading_forms() {
        let mut sections = Sections::default();
        let part = classify_paragraph("part two: the return", &mut sections);
        assert_eq!(part.kind, BlockKind::Subheading);

        let dashed = classify_paragraph("--- The Long Night ---", &mut sections);
        assert_eq!(dashed.kind, BlockKind::Subheading);
        assert_eq!(dashed.text, "The Long Night");

        let long_chapter = format!("Chapter {}", "x".repeat(120));
        assert_eq!(
            classify_paragraph(&long_chapter, &mut sections).kind,
            BlockKind::Paragraph
        );
        assert_eq!(
            classify_paragraph("Chapterhouse Dune", &mut sections).kind,
            BlockKind::Paragraph
        );
    }

    #[test]
    fn quotes_and_list_items() {
        let mut sections = Sections::default();
        assert_eq!(
            classify_paragraph("\"It was the best of times.\"", &mut sections).kind,
            BlockKind::Quote
        );
        let long_quote = format!("\"{}\"", "word ".repeat(70));
        assert_eq!(
            classify_paragraph(&long_quote, &mut sections).kind,
            BlockKind::Paragraph
        );
        for item in ["1. First theme", "- a bullet", "\u{2022} a glyph bullet"] {
            assert_eq!(classify_paragraph(item, &mut sections).kind, BlockKind::ListItem);
        }
        assert_eq!(classify_paragraph("1.5 million", &mut sections).kind, BlockKind::Paragraph);
    }

    #[test]
    fn rules_match_their_samples_in_isolation() {
        let samples = [
            "-----",
            "THE END",
            "Chapter 9",
            "--- Interlude ---",
            "\"Quoted\"",
            "2. Second",
            "plain words",
        ];
        let order: Vec<BlockKind> = RULES.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            order,
            vec![
                BlockKind::Separator,
                BlockKind::Heading,
                BlockKind::Subheading,
                BlockKind::Subheading,
                BlockKind::Quote,
                BlockKind::ListItem,
                BlockKind::Paragraph,
            ]
        );
        let mut sections = Sections::default();
        let (separator_rule, heading_rule) = (RULES[0].1, RULES[1].1);
        assert!(separator_rule("-----", &mut sections).is_some());
        assert!(separator_rule("plain words", &mut sections).is_none());
        assert!(heading_rule("plain words", &mut sections).is_none());
        for (sample, (kind, rule)) in samples.iter().zip(RULES).skip(1) {
            let block = rule(sample, &mut sections).expect("rule matches its sample");
            assert_eq!(block.kind, *kind, "{sample}");
        }
    }

    #[test]
    fn classification_is_repeatable() {
        let text = "PROLOGUE\n\nOne.\n\nINTERLUDE\n\n- two\n\nEPILOGUE";
        let first = classify(text);
        let second = classify(text);
        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().filter_map(|b| b.section_id()).collect();
        assert_eq!(ids, vec!["section-1", "section-2", "section-3"]);
    }

    #[test]
    fn blank_lines_with_whitespace_split_paragraphs() {
        let blocks = classify("First line\nsecond line\n   \n\r\nNext paragraph\n\n\n\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "First line\nsecond line");
        assert!(classify("").is_empty());
        assert!(classify("\n\n   \n\n").is_empty());
    }

    #[test]
    fn rendering_escapes_text() {
        let mut sections = Sections::default();
        let para = classify_paragraph("Fish & <chips>\nand peas", &mut sections);
        assert_eq!(para.to_html(), "<p>Fish &amp; &lt;chips&gt;<br>and peas</p>");

        let quote = classify_paragraph("\"Hi\"", &mut sections).to_html();
        assert!(quote.starts_with("<blockquote>"));
        assert!(!quote.contains("\"Hi\""));

        let heading = classify_paragraph("PART & PARCEL", &mut sections);
        assert_eq!(heading.kind, BlockKind::Heading);
        assert_eq!(
            heading.to_html(),
            "<h2 class=\"section-heading\" id=\"section-1\">Part &amp; Parcel</h2>"
        );

        let sep = classify_paragraph("~~~~~~", &mut sections);
        assert_eq!(sep.to_html(), "<div class=\"separator\">\u{2022} \u{2022} \u{2022}</div>");

        let list = classify_paragraph("- one\ntwo", &mut sections);
        assert_eq!(list.to_html(), "<p class=\"list-item\">- one<br>two</p>");
    }
}
