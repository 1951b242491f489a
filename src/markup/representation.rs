use scraper::{ElementRef, Html, Node};

use crate::error::{Error, Result};
use crate::markup::{element_text, DISPLAY_REGION_SEL, READING_REGION_SEL, REPRESENTATION_SEL};

/// One display unit of a headword with the reading that applies to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingUnit {
    pub display: String,
    pub reading: String,
    /// Un-collapsed base text of a combined ruby annotation, kept for
    /// traceability.
    pub base: Option<String>,
}

/// Validated decomposition of a headword's display markup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedWord {
    pub units: Vec<ReadingUnit>,
}

impl ParsedWord {
    /// The headword as plain text, display units joined in order.
    pub fn headword(&self) -> String {
        self.units.iter().map(|unit| unit.display.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// One entry of the display-text region: either a literal run of characters
/// or a marked span whose characters share one collective reading.
#[derive(Debug)]
struct DisplayUnit {
    text: String,
    is_span: bool,
}

impl DisplayUnit {
    /// Logical length in characters. A span collapses to a single unit no
    /// matter how many characters it displays.
    fn len(&self) -> usize {
        if self.is_span {
            1
        } else {
            self.text.chars().count()
        }
    }
}

/// Decomposes a headword representation fragment into ordered
/// `(display, reading)` units.
///
/// The reading-annotation region and the display-text region are parsed
/// independently and then reconciled: either they align one to one, or the
/// readings align with the individual characters of the display text (spans
/// still counting as one unit). Anything else cannot be drawn and fails with
/// [`Error::ReadingCountMismatch`].
pub fn parse_representation(markup: &str) -> Result<ParsedWord> {
    let fragment = Html::parse_fragment(markup);

    let Some(container) = fragment.select(&REPRESENTATION_SEL).next() else {
        return Ok(ParsedWord::default());
    };

    let readings = match container.select(&READING_REGION_SEL).next() {
        Some(region) => parse_readings(region)?,
        None => Vec::new(),
    };

    let units = match container.select(&DISPLAY_REGION_SEL).next() {
        Some(region) => parse_display_units(region),
        None => Vec::new(),
    };

    reconcile(readings, units)
}

/// Reads the annotation region in child order: bare `span` fragments carry a
/// reading only, `ruby` children carry a reading plus its base text.
fn parse_readings(region: ElementRef<'_>) -> Result<Vec<(String, Option<String>)>> {
    let mut readings = Vec::new();

    for child in region.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    return Err(Error::MalformedAnnotation(format!(
                        "unexpected text {:?} in reading region",
                        text.trim()
                    )));
                }
            }
            Node::Element(element) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                match element.name() {
                    "span" => readings.push((element_text(child), None)),
                    "ruby" => readings.push(parse_ruby(child)?),
                    name => {
                        return Err(Error::MalformedAnnotation(format!(
                            "unexpected <{name}> in reading region"
                        )))
                    }
                }
            }
            _ => {}
        }
    }

    Ok(readings)
}

fn parse_ruby(ruby: ElementRef<'_>) -> Result<(String, Option<String>)> {
    let mut reading = None;
    let mut base = None;

    for child in ruby.children() {
        if let Some(element) = ElementRef::wrap(child) {
            match element.value().name() {
                "rt" => reading = Some(element_text(element)),
                "rb" => base = Some(element_text(element)),
                _ => {}
            }
        }
    }

    let Some(reading) = reading else {
        return Err(Error::MalformedAnnotation(
            "ruby annotation is missing its reading text".to_string(),
        ));
    };

    Ok((reading, base))
}

/// Reads the display region in child order: literal text runs become plain
/// units, marked spans become combined units. Other nodes carry no display
/// text and are skipped.
fn parse_display_units(region: ElementRef<'_>) -> Vec<DisplayUnit> {
    let mut units = Vec::new();

    for child in region.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    units.push(DisplayUnit {
                        text: text.to_string(),
                        is_span: false,
                    });
                }
            }
            Node::Element(element) if element.name() == "span" => {
                if let Some(child) = ElementRef::wrap(child) {
                    units.push(DisplayUnit {
                        text: element_text(child),
                        is_span: true,
                    });
                }
            }
            _ => {}
        }
    }

    units
}

fn reconcile(
    readings: Vec<(String, Option<String>)>,
    units: Vec<DisplayUnit>,
) -> Result<ParsedWord> {
    if readings.len() == units.len() {
        let units = units
            .into_iter()
            .zip(readings)
            .map(|(unit, (reading, base))| ReadingUnit {
                display: unit.text,
                reading,
                base,
            })
            .collect();
        return Ok(ParsedWord { units });
    }

    let character_count: usize = units.iter().map(DisplayUnit::len).sum();
    if readings.len() == character_count {
        let mut expanded = Vec::with_capacity(character_count);
        for unit in units {
            if unit.is_span {
                expanded.push(unit.text);
            } else {
                expanded.extend(unit.text.chars().map(String::from));
            }
        }
        let units = expanded
            .into_iter()
            .zip(readings)
            .map(|(display, (reading, base))| ReadingUnit {
                display,
                reading,
                base,
            })
            .collect();
        return Ok(ParsedWord { units });
    }

    Err(Error::ReadingCountMismatch {
        readings: readings.len(),
        units: character_count,
    })
}
