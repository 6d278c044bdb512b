//! # vCard reader
//!
//! A small, lenient reader for vCard 2.1 / 3.0 / 4.0 records, covering what the
//! contact importer needs: line unfolding, property groups, parameters
//! (including RFC 6868 caret encoding and 2.1-style bare types), text
//! unescaping and the structured `N` and `ADR` values.
//!
//! ```
//! use rehome::vcard;
//!
//! let card = vcard::parse_single("BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane Doe\r\nEND:VCARD\r\n")
//!     .unwrap();
//! assert_eq!(card.formatted_name(), Some("Jane Doe".to_string()));
//! ```
//!
//! Only syntax is checked. Missing properties (even `FN` or `VERSION`) are not
//! errors; callers decide which fields they need.

mod error;
mod lexer;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, unfold, ContentLine};
pub use values::{
    parse_address, parse_structured_name, split_structured, unescape_text, Address,
    StructuredName,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCardParameter {
    /// Uppercased.
    pub name: String,
    pub values: Vec<String>,
}

impl VCardParameter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            values,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCardProperty {
    pub group: Option<String>,
    pub name: String,
    pub params: Vec<VCardParameter>,
    /// Raw, still escaped.
    pub value: String,
}

impl VCardProperty {
    pub fn param(&self, name: &str) -> Option<&VCardParameter> {
        self.params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The value with text escapes resolved.
    pub fn text(&self) -> String {
        unescape_text(&self.value)
    }

    /// All `TYPE` values, lowercased, in order.
    pub fn types(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.name == "TYPE")
            .flat_map(|p| p.values.iter())
            .flat_map(|v| v.split(','))
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// `PREF=1` (4.0) or `TYPE=pref` (3.0).
    pub fn is_preferred(&self) -> bool {
        self.param("PREF").and_then(|p| p.value()) == Some("1")
            || self.types().iter().any(|t| t == "pref")
    }
}

impl From<ContentLine> for VCardProperty {
    fn from(line: ContentLine) -> Self {
        Self {
            group: line.group,
            name: line.name,
            params: line.params,
            value: line.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCard {
    pub properties: Vec<VCardProperty>,
}

impl VCard {
    /// First property with the given name.
    pub fn get(&self, name: &str) -> Option<&VCardProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Every property with the given name, in document order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a VCardProperty> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn formatted_name(&self) -> Option<String> {
        self.get("FN").map(VCardProperty::text)
    }

    pub fn name(&self) -> Option<StructuredName> {
        self.get("N").map(|p| parse_structured_name(&p.value))
    }

    pub fn addresses(&self) -> Vec<(&VCardProperty, Address)> {
        self.all("ADR")
            .map(|p| (p, parse_address(&p.value)))
            .collect()
    }
}

/// Parses every `BEGIN:VCARD` ... `END:VCARD` block in `input`.
pub fn parse(input: &str) -> ParseResult<Vec<VCard>> {
    read_cards(input, false)
}

/// Parses the first card of `input`; input without any card is an error.
/// Whatever follows the first `END:VCARD` is not read.
pub fn parse_single(input: &str) -> ParseResult<VCard> {
    read_cards(input, true)?.into_iter().next().ok_or_else(|| {
        ParseError::new(ParseErrorKind::UnexpectedEof, 0, "no vCard found")
    })
}

fn read_cards(input: &str, first_only: bool) -> ParseResult<Vec<VCard>> {
    let unfolded = unfold(input);
    let mut cards = Vec::new();
    let mut current: Option<VCard> = None;
    let mut last_line = 0;

    for (idx, raw) in unfolded.lines().enumerate() {
        let line_num = idx + 1;
        last_line = line_num;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }

        let line = parse_content_line(raw, line_num)?;
        let marker = line.value.eq_ignore_ascii_case("VCARD");
        if line.name == "BEGIN" && marker {
            if current.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    line_num,
                    "nested BEGIN:VCARD",
                ));
            }
            current = Some(VCard::default());
        } else if line.name == "END" && marker {
            match current.take() {
                Some(card) => {
                    cards.push(card);
                    if first_only {
                        return Ok(cards);
                    }
                }
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        line_num,
                        "END:VCARD without BEGIN",
                    ))
                }
            }
        } else if let Some(card) = current.as_mut() {
            card.properties.push(line.into());
        } else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                line_num,
                format!("expected BEGIN:VCARD, found {}", line.name),
            ));
        }
    }

    if current.is_some() {
        return Err(ParseError::new(
            ParseErrorKind::UnexpectedEof,
            last_line,
            "missing END:VCARD",
        ));
    }

    Ok(cards)
}
