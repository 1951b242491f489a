//! SVG vocabulary cards.
//!
//! Each (word, gloss) pair renders to one fixed-size card: headword with
//! per-unit furigana, the definition line, the example sentence with its
//! readings and translation, and a QR code linking back to the dictionary.
//! Text widths are approximated from character classes (full-width glyphs
//! advance one em, half-width just over half), which is close enough for
//! the font-fit loops the layout relies on.

use std::path::{Path, PathBuf};

use tokio_rusqlite::Connection;
use tracing::{info, warn};

use crate::database::entries;
use crate::error::{Error, Result};
use crate::markup::{parse_meaning, parse_representation, ParsedMeaning, ParsedWord};

mod qr;

pub use qr::{qr_matrix, QrMatrix};

const SEARCH_URL: &str = "https://jisho.org/search/";

/// Fixed card geometry.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            width: 780,
            height: 460,
            margin: 10,
        }
    }
}

/// Deterministic output path for one card.
pub fn card_path(out_dir: &Path, word_id: i64, gloss_id: i64) -> PathBuf {
    out_dir.join(format!("word-{word_id}-{gloss_id}.svg"))
}

fn is_fullwidth(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{303E}'
        | '\u{3041}'..='\u{33FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{A000}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}')
}

/// Approximate advance width of `text` at `font_size`.
fn measure(text: &str, font_size: f64) -> f64 {
    text.chars()
        .map(|c| if is_fullwidth(c) { 1.0 } else { 0.55 })
        .sum::<f64>()
        * font_size
}

/// Largest font size in `[min_size, initial_size]` that keeps `text` within
/// `max_width`.
fn fit_width(text: &str, max_width: f64, initial_size: u32, min_size: u32) -> u32 {
    let mut font_size = initial_size;
    loop {
        if measure(text, font_size as f64) < max_width {
            return font_size;
        }
        font_size -= 1;
        if font_size < min_size {
            return font_size;
        }
    }
}

/// Largest font size whose glyph row plus a furigana row above it fits in
/// `max_height`.
fn fit_height(max_height: f64, initial_size: u32, min_size: u32) -> u32 {
    let mut font_size = initial_size;
    loop {
        if font_size as f64 + font_size as f64 / 3.0 < max_height {
            return font_size;
        }
        font_size -= 1;
        if font_size < min_size {
            return font_size;
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn text_element(out: &mut String, x: f64, y: f64, font_size: f64, weight: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" font-family=\"Noto Sans JP\" \
         font-weight=\"{weight}\" font-size=\"{font_size:.1}\">{}</text>",
        escape(text)
    ));
}

/// Renders one card to SVG markup.
///
/// Fails only when the example sentence carries a piece with no display
/// text, which cannot be drawn; the caller skips such entries.
pub fn render_card(
    word: &ParsedWord,
    meaning: &ParsedMeaning,
    layout: &CardLayout,
) -> Result<String> {
    let margin = layout.margin as f64;
    let plot_width = layout.width as f64 - 2.0 * margin;
    let plot_height = layout.height as f64 - 2.0 * margin;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\"><g transform=\"translate({margin},{margin})\">",
        w = layout.width,
        h = layout.height,
    );

    let headword = word.headword();

    // Headword with per-unit furigana, centered in the upper half.
    let size_w = fit_width(&headword, plot_width, 96, 48);
    let size_h = fit_height(plot_height / 2.0, 96, 48);
    let font_size = size_w.min(size_h) as f64;

    let mut x = (plot_width - measure(&headword, font_size)) / 2.0;
    let y = plot_height / 2.0 - margin;
    let y_furigana = y - font_size;

    for unit in &word.units {
        let unit_width = measure(&unit.display, font_size);
        text_element(&mut svg, x, y, font_size, "bold", &unit.display);

        let furigana_size = font_size / 3.0;
        let x_furigana = x + (unit_width - measure(&unit.reading, furigana_size)) / 2.0;
        text_element(&mut svg, x_furigana, y_furigana, furigana_size, "bold", &unit.reading);

        x += unit_width + 3.0;
    }

    // Definition line under the headword.
    let meaning_size = fit_width(&meaning.meaning, plot_width, 18, 8) as f64;
    let meaning_y = y + meaning_size + 10.0;
    let meaning_x = (plot_width - measure(&meaning.meaning, meaning_size)) / 2.0;
    text_element(&mut svg, meaning_x, meaning_y, meaning_size, "normal", &meaning.meaning);

    // Example sentence with readings, then the translation, anchored to the
    // bottom edge.
    let sentence = meaning.sentence_text();
    let sentence_size = fit_width(&sentence, plot_width, 28, 8) as f64;
    let english_size = fit_width(&meaning.english, plot_width, 20, 8) as f64;

    let y_english = plot_height - 10.0;
    let y_segment = y_english - english_size - 5.0;
    let y_reading = y_segment - sentence_size;

    let mut x = (plot_width - measure(&sentence, sentence_size)) / 2.0;
    for piece in &meaning.sentence {
        let Some(segment) = piece.segment.as_deref() else {
            return Err(Error::MalformedAnnotation(
                "example sentence piece has no display text".to_string(),
            ));
        };

        text_element(&mut svg, x, y_segment, sentence_size, "normal", segment);

        if let Some(reading) = piece.reading.as_deref() {
            text_element(&mut svg, x, y_reading, sentence_size / 2.0, "normal", reading);
        }

        x += measure(segment, sentence_size);
    }

    let english_x = (plot_width - measure(&meaning.english, english_size)) / 2.0;
    text_element(&mut svg, english_x, y_english, english_size, "normal", &meaning.english);

    // QR code back to the dictionary entry, top-right.
    let box_size = if plot_width < 400.0 { 1.5 } else { 3.0 };
    let matrix = qr_matrix(&format!("{SEARCH_URL}{headword}"))?;
    matrix.append_svg_rects(box_size, 0.0, plot_width, &mut svg);

    svg.push_str("</g></svg>");
    Ok(svg)
}

/// Renders every stored entry into `out_dir`, skipping (and logging)
/// entries whose markup cannot be drawn. Returns the number of cards
/// written.
pub async fn render_all(conn: &Connection, out_dir: &Path, layout: &CardLayout) -> Result<usize> {
    tokio::fs::create_dir_all(out_dir).await?;

    let mut written = 0usize;

    for entry in entries::list_all(conn).await? {
        let word = match parse_representation(&entry.representation_markup) {
            Ok(word) => word,
            Err(error) => {
                warn!(
                    %error,
                    word_id = entry.word_id,
                    markup = %entry.representation_markup,
                    "skipping unrenderable word"
                );
                continue;
            }
        };

        let meaning = parse_meaning(&entry.wrapper_markup);

        let svg = match render_card(&word, &meaning, layout) {
            Ok(svg) => svg,
            Err(error) => {
                warn!(
                    %error,
                    word_id = entry.word_id,
                    gloss_id = entry.gloss_id,
                    markup = %entry.wrapper_markup,
                    "skipping unrenderable gloss"
                );
                continue;
            }
        };

        let path = card_path(out_dir, entry.word_id, entry.gloss_id);
        tokio::fs::write(&path, svg).await?;
        written += 1;
    }

    info!(written, dir = %out_dir.display(), "cards rendered");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_word() -> ParsedWord {
        parse_representation(
            "<div class=\"concept_light-representation\">\
             <span class=\"furigana\"><span>よ</span><span>む</span></span>\
             <span class=\"text\">読む</span></div>",
        )
        .unwrap()
    }

    fn sample_meaning() -> ParsedMeaning {
        parse_meaning(
            "<div class=\"meaning-wrapper\">\
             <span class=\"meaning-meaning\">to read</span>\
             <div class=\"sentence\"><ul>\
             <li><span class=\"furigana\">ほん</span><span class=\"unlinked\">本</span></li>\
             <li><span class=\"unlinked\">を</span></li>\
             </ul><span class=\"english\">A book.</span></div></div>",
        )
    }

    #[test]
    fn renders_card_with_all_sections() {
        let svg = render_card(&sample_word(), &sample_meaning(), &CardLayout::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("読"));
        assert!(svg.contains("よ"));
        assert!(svg.contains("to read"));
        assert!(svg.contains("A book."));
        assert!(svg.contains("<rect"));
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn sentence_piece_without_text_is_unrenderable() {
        let mut meaning = sample_meaning();
        meaning.sentence[0].segment = None;

        let err = render_card(&sample_word(), &meaning, &CardLayout::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedAnnotation(_)));
    }

    #[test]
    fn escapes_markup_in_text() {
        let mut meaning = sample_meaning();
        meaning.meaning = "a < b & c".to_string();

        let svg = render_card(&sample_word(), &meaning, &CardLayout::default()).unwrap();
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn fit_width_shrinks_until_text_fits() {
        let wide = "読".repeat(20);
        let size = fit_width(&wide, 400.0, 96, 8);

        assert!(size < 96);
        assert!(measure(&wide, size as f64) < 400.0);
    }

    #[test]
    fn fit_width_respects_minimum() {
        let wide = "読".repeat(1000);
        assert_eq!(fit_width(&wide, 100.0, 96, 48), 47);
    }

    #[test]
    fn card_path_is_deterministic() {
        let path = card_path(Path::new("www/img"), 7, 13);
        assert_eq!(path, PathBuf::from("www/img/word-7-13.svg"));
    }

    #[tokio::test]
    async fn render_all_writes_cards() {
        let conn = crate::database::open_in_memory().await.unwrap();
        let word_id = crate::database::entries::insert_word(
            &conn,
            "<div class=\"concept_light-representation\">\
             <span class=\"furigana\"><span>にほん</span></span>\
             <span class=\"text\"><span>日本</span></span></div>"
                .to_string(),
        )
        .await
        .unwrap();
        let gloss_id = crate::database::entries::insert_gloss(
            &conn,
            word_id,
            "<div><span class=\"meaning-meaning\">Japan</span></div>".to_string(),
        )
        .await
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = render_all(&conn, dir.path(), &CardLayout::default())
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert!(card_path(dir.path(), word_id, gloss_id).exists());
    }
}
