//! Extraction of structured entries from jisho.org markup fragments.
//!
//! Every assumption about the source site's markup shape lives here: the
//! class markers below are a fixed contract with jisho's search pages, and
//! the submodules are the only code that walks the raw trees.

use std::sync::LazyLock;

use scraper::Selector;

pub mod meaning;
pub mod representation;

pub use meaning::{parse_meaning, ParsedMeaning, SentencePiece};
pub use representation::{parse_representation, ParsedWord, ReadingUnit};

/// Class markers fixed by the source site's markup.
pub mod markers {
    /// Container of one word entry on a search page.
    pub const WORD_CONTAINER: &str = "concept_light";
    /// Display form of the headword (kanji/kana plus furigana annotations).
    pub const REPRESENTATION: &str = "concept_light-representation";
    /// Reading-annotation region inside the representation.
    pub const READING_REGION: &str = "furigana";
    /// Display-text region inside the representation.
    pub const DISPLAY_REGION: &str = "text";
    /// One sense of a word, wrapping definition and example sentences.
    pub const MEANING_WRAPPER: &str = "meaning-wrapper";
    /// Example-sentence block inside a wrapper.
    pub const SENTENCE: &str = "sentence";
    /// English definition text inside a wrapper.
    pub const MEANING_TEXT: &str = "meaning-meaning";
    /// Reading fragment of one sentence segment.
    pub const SENTENCE_READING: &str = "furigana";
    /// Non-linked dictionary form of one sentence segment.
    pub const UNLINKED_FORM: &str = "unlinked";
    /// English translation of the example sentence.
    pub const ENGLISH_SENTENCE: &str = "english";
    /// Divider between definition sections, dropped before persistence.
    pub const SECTION_DIVIDER: &str = "meaning-definition-section_divider";
    /// Supplemental notes, dropped before persistence.
    pub const SUPPLEMENTAL_INFO: &str = "supplemental_info";
}

pub(crate) static REPRESENTATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("div", markers::REPRESENTATION));
pub(crate) static READING_REGION_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::READING_REGION));
pub(crate) static DISPLAY_REGION_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("span", markers::DISPLAY_REGION));

// Marker names are constants; a selector that fails to parse is a bug.
pub(crate) fn class_selector(element: &str, class: &str) -> Selector {
    Selector::parse(&format!("{element}.{class}")).expect("class marker selector")
}

/// Concatenated, trimmed text of one element (inner tags contribute their
/// text, matching how the site's annotations read).
pub(crate) fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
