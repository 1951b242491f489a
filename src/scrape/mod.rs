//! Batch extraction of word entries from saved dictionary search pages.
//!
//! Pages are read from disk in numeric filename order; each entry is cut out
//! of the page markup, cleaned, validated and bulk-inserted in one
//! transaction. A bad entry is logged with its raw markup and skipped, never
//! aborting the rest of the batch.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use lol_html::{element, rewrite_str, RewriteStrSettings};
use regex::Regex;
use scraper::{Html, Selector};
use tokio_rusqlite::Connection;
use tracing::{info, warn};

use crate::database::entries;
use crate::error::Result;
use crate::markup::{self, class_selector, markers, parse_representation};

static WORD_CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("div", markers::WORD_CONTAINER));
static WRAPPER_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("div", markers::MEANING_WRAPPER));
static SENTENCE_SEL: LazyLock<Selector> =
    LazyLock::new(|| class_selector("div", markers::SENTENCE));

static PAGE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^page_(\d+)\.html$").expect("page file pattern"));

/// One extracted word entry: the headword representation snippet plus every
/// meaning wrapper that carries at least one example sentence.
#[derive(Debug, Clone)]
pub struct WordEntry {
    pub representation: String,
    pub wrappers: Vec<String>,
}

/// Extracts all sentence-bearing word entries from one search page.
///
/// Entries without a representation snippet or without any qualifying
/// wrapper are dropped here, so everything returned is worth persisting.
pub fn extract_entries(page: &str) -> Vec<WordEntry> {
    let document = Html::parse_document(page);
    let mut results = Vec::new();

    for container in document.select(&WORD_CONTAINER_SEL) {
        let Some(representation) = container.select(&markup::REPRESENTATION_SEL).next() else {
            continue;
        };

        let mut wrappers = Vec::new();
        for wrapper in container.select(&WRAPPER_SEL) {
            if wrapper.select(&SENTENCE_SEL).next().is_none() {
                continue;
            }

            match clean_wrapper(&wrapper.html()) {
                Ok(cleaned) => wrappers.push(cleaned),
                Err(error) => {
                    warn!(%error, markup = %wrapper.html(), "skipping meaning wrapper");
                }
            }
        }

        if !wrappers.is_empty() {
            results.push(WordEntry {
                representation: representation.html().replace('\n', ""),
                wrappers,
            });
        }
    }

    results
}

/// Strips presentation junk out of a wrapper snippet before persistence:
/// definition-section dividers, supplemental notes, zero-width spaces and
/// newlines.
fn clean_wrapper(wrapper: &str) -> Result<String> {
    let divider = format!("span.{}", markers::SECTION_DIVIDER);
    let supplemental = format!("span.{}", markers::SUPPLEMENTAL_INFO);

    let cleaned = rewrite_str(
        wrapper,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(divider, |el| {
                    el.remove();
                    Ok(())
                }),
                element!(supplemental, |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    Ok(cleaned.replace('\u{200b}', "").replace('\n', ""))
}

/// Saved page files in a directory, ordered by page number.
pub fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(captures) = PAGE_FILE.captures(name) {
            if let Ok(number) = captures[1].parse::<u64>() {
                pages.push((number, entry.path()));
            }
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

/// Reads every saved page under `dir`, extracts and validates its entries
/// and stores the whole batch in one transaction.
///
/// Returns the number of words and glosses inserted.
pub async fn ingest_dir(conn: &Connection, dir: &Path) -> Result<(usize, usize)> {
    let mut batch = Vec::new();
    let mut skipped = 0usize;

    for path in page_files(dir)? {
        let page = match tokio::fs::read_to_string(&path).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%error, path = %path.display(), "skipping unreadable page");
                continue;
            }
        };

        for entry in extract_entries(&page) {
            // Only alignable headwords enter the store; the renderer relies
            // on that.
            match parse_representation(&entry.representation) {
                Ok(_) => batch.push(entry),
                Err(error) => {
                    warn!(%error, markup = %entry.representation, "skipping entry");
                    skipped += 1;
                }
            }
        }
    }

    let (words, glosses) = entries::bulk_insert(conn, batch).await?;
    info!(words, glosses, skipped, "scrape batch stored");

    Ok((words, glosses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(representation: &str, wrappers: &str) -> String {
        format!("<div class=\"concept_light\">{representation}{wrappers}</div>")
    }

    const REPRESENTATION: &str = "<div class=\"concept_light-representation\">\
        <span class=\"furigana\"><span>よ</span><span>む</span></span>\
        <span class=\"text\">読む</span></div>";

    const SENTENCE_WRAPPER: &str = "<div class=\"meaning-wrapper\">\
        <span class=\"meaning-meaning\">to read</span>\
        <div class=\"sentence\"><span class=\"english\">ok</span></div></div>";

    const PLAIN_WRAPPER: &str = "<div class=\"meaning-wrapper\">\
        <span class=\"meaning-meaning\">reading (activity)</span></div>";

    #[test]
    fn keeps_only_sentence_bearing_wrappers() {
        let page = format!(
            "<html><body>{}</body></html>",
            entry(REPRESENTATION, &format!("{SENTENCE_WRAPPER}{PLAIN_WRAPPER}"))
        );
        let entries = extract_entries(&page);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].wrappers.len(), 1);
        assert!(entries[0].wrappers[0].contains("to read"));
    }

    #[test]
    fn drops_entries_without_representation_or_sentences() {
        let page = format!(
            "<html><body>{}{}</body></html>",
            "<div class=\"concept_light\"><div class=\"meaning-wrapper\">\
             <div class=\"sentence\"></div></div></div>",
            entry(REPRESENTATION, PLAIN_WRAPPER),
        );

        assert!(extract_entries(&page).is_empty());
    }

    #[test]
    fn cleans_wrapper_markup() {
        let dirty = "<div class=\"meaning-wrapper\">\
            <span class=\"meaning-definition-section_divider\">1.</span>\
            <span class=\"meaning-meaning\">to read\u{200b}</span>\
            <span class=\"supplemental_info\">Only applies to 読む</span>\n\
            <div class=\"sentence\"></div></div>";
        let page = format!("<html><body>{}</body></html>", entry(REPRESENTATION, dirty));
        let entries = extract_entries(&page);

        let wrapper = &entries[0].wrappers[0];
        assert!(!wrapper.contains("section_divider"));
        assert!(!wrapper.contains("supplemental_info"));
        assert!(!wrapper.contains('\u{200b}'));
        assert!(!wrapper.contains('\n'));
        assert!(wrapper.contains("to read"));
    }

    #[test]
    fn orders_page_files_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page_10.html", "page_2.html", "page_1.html", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let pages = page_files(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, ["page_1.html", "page_2.html", "page_10.html"]);
    }

    #[tokio::test]
    async fn ingests_pages_into_store() {
        let dir = tempfile::tempdir().unwrap();
        let page = format!(
            "<html><body>{}</body></html>",
            entry(REPRESENTATION, SENTENCE_WRAPPER)
        );
        std::fs::write(dir.path().join("page_1.html"), &page).unwrap();
        // Unalignable entry: three readings against two characters.
        let bad = entry(
            "<div class=\"concept_light-representation\">\
             <span class=\"furigana\"><span>よ</span><span>み</span><span>こ</span></span>\
             <span class=\"text\">読む</span></div>",
            SENTENCE_WRAPPER,
        );
        std::fs::write(
            dir.path().join("page_2.html"),
            format!("<html><body>{bad}</body></html>"),
        )
        .unwrap();

        let conn = crate::database::open_in_memory().await.unwrap();
        let (words, glosses) = ingest_dir(&conn, dir.path()).await.unwrap();

        assert_eq!(words, 1);
        assert_eq!(glosses, 1);
    }
}
