use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::markup::{class_selector, element_text, markers};

static MEANING_TEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::MEANING_TEXT));
static ENGLISH_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::ENGLISH_SENTENCE));
static READING_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::SENTENCE_READING));
static UNLINKED_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::UNLINKED_FORM));
static LIST_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("ul"));
static ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("li"));

fn parse_selector(selector: &str) -> Selector {
    Selector::parse(selector).expect("list selector")
}

/// One segment of an example sentence: the display form plus the reading
/// annotated above it, either of which the source may omit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePiece {
    pub reading: Option<String>,
    pub segment: Option<String>,
}

/// Extracted content of one meaning wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedMeaning {
    pub meaning: String,
    pub sentence: Vec<SentencePiece>,
    pub english: String,
}

impl ParsedMeaning {
    /// The example sentence as plain text, segments joined in order.
    pub fn sentence_text(&self) -> String {
        self.sentence
            .iter()
            .filter_map(|piece| piece.segment.as_deref())
            .collect()
    }
}

/// Extracts definition, example-sentence segments and translation from a
/// meaning wrapper.
///
/// The wrapper shape varies across entries, so absent pieces yield empty
/// fields rather than errors: the first meaning-text marker (or empty), the
/// list items of the first list in document order, and the first
/// English-sentence marker (or empty).
pub fn parse_meaning(markup: &str) -> ParsedMeaning {
    let fragment = Html::parse_fragment(markup);

    let meaning = fragment
        .select(&MEANING_TEXT_SEL)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let english = fragment
        .select(&ENGLISH_SEL)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let mut sentence = Vec::new();
    if let Some(list) = fragment.select(&LIST_SEL).next() {
        for item in list.select(&ITEM_SEL) {
            let reading = item.select(&READING_SEL).next().map(element_text);
            let segment = item.select(&UNLINKED_SEL).next().map(element_text);
            sentence.push(SentencePiece { reading, segment });
        }
    }

    ParsedMeaning {
        meaning,
        sentence,
        english,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPER: &str = "<div class=\"meaning-wrapper\">\
        <span class=\"meaning-meaning\">to read</span>\
        <div class=\"sentence\"><ul>\
        <li><span class=\"furigana\">ほん</span><span class=\"unlinked\">本</span></li>\
        <li><span class=\"unlinked\">を</span></li>\
        <li><span class=\"furigana\">よ</span><span class=\"unlinked\">読む</span></li>\
        </ul>\
        <span class=\"english\">I read a book.</span></div></div>";

    #[test]
    fn extracts_all_fields() {
        let parsed = parse_meaning(WRAPPER);

        assert_eq!(parsed.meaning, "to read");
        assert_eq!(parsed.english, "I read a book.");
        assert_eq!(parsed.sentence.len(), 3);
        assert_eq!(parsed.sentence[0].reading.as_deref(), Some("ほん"));
        assert_eq!(parsed.sentence[0].segment.as_deref(), Some("本"));
        assert_eq!(parsed.sentence[1].reading, None);
        assert_eq!(parsed.sentence[1].segment.as_deref(), Some("を"));
        assert_eq!(parsed.sentence_text(), "本を読む");
    }

    #[test]
    fn missing_pieces_yield_empty_fields() {
        let parsed = parse_meaning("<div class=\"meaning-wrapper\"><p>bare</p></div>");

        assert_eq!(parsed.meaning, "");
        assert_eq!(parsed.english, "");
        assert!(parsed.sentence.is_empty());
    }

    #[test]
    fn item_without_spans_yields_empty_piece() {
        let parsed =
            parse_meaning("<div><ul><li>plain</li></ul></div>");

        assert_eq!(parsed.sentence.len(), 1);
        assert_eq!(parsed.sentence[0].reading, None);
        assert_eq!(parsed.sentence[0].segment, None);
    }

    #[test]
    fn only_first_list_is_read() {
        let markup = "<div><ul><li><span class=\"unlinked\">一</span></li></ul>\
                      <ul><li><span class=\"unlinked\">二</span></li></ul></div>";
        let parsed = parse_meaning(markup);

        assert_eq!(parsed.sentence.len(), 1);
        assert_eq!(parsed.sentence[0].segment.as_deref(), Some("一"));
    }
}
