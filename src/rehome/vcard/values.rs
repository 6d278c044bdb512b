//! Text and structured value decoding.

/// Unescapes a text value (`\n`, `\N`, `\,`, `\;`, `\\`).
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('n' | 'N') => {
                chars.next();
                result.push('\n');
            }
            Some(&next) if matches!(next, ',' | ';' | '\\') => {
                chars.next();
                result.push(next);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Splits a structured value on unescaped semicolons. Components stay escaped.
pub fn split_structured(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ';' => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&s[start..]);
    parts
}

/// Components of an `N` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredName {
    pub family: String,
    pub given: String,
    pub additional: String,
    pub prefix: String,
    pub suffix: String,
}

/// Components of an `ADR` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub po_box: String,
    pub extended: String,
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Non-empty components joined on one line, street first.
    pub fn one_line(&self) -> String {
        [
            &self.po_box,
            &self.extended,
            &self.street,
            &self.locality,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

fn component(parts: &[&str], index: usize) -> String {
    parts
        .get(index)
        .map(|s| unescape_text(s).trim().to_string())
        .unwrap_or_default()
}

/// `family;given;additional;prefixes;suffixes`, every part optional.
pub fn parse_structured_name(value: &str) -> StructuredName {
    let parts = split_structured(value);
    StructuredName {
        family: component(&parts, 0),
        given: component(&parts, 1),
        additional: component(&parts, 2),
        prefix: component(&parts, 3),
        suffix: component(&parts, 4),
    }
}

/// `pobox;extended;street;locality;region;postcode;country`, every part optional.
pub fn parse_address(value: &str) -> Address {
    let parts = split_structured(value);
    Address {
        po_box: component(&parts, 0),
        extended: component(&parts, 1),
        street: component(&parts, 2),
        locality: component(&parts, 3),
        region: component(&parts, 4),
        postal_code: component(&parts, 5),
        country: component(&parts, 6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape() {
        assert_eq!(unescape_text(r"a\,b\;c\\d\ne"), "a,b;c\\d\ne");
        assert_eq!(unescape_text(r"trailing\"), "trailing\\");
    }

    #[test]
    fn split_keeps_escaped_semicolons() {
        assert_eq!(split_structured(r"a;b\;c;;d"), vec!["a", r"b\;c", "", "d"]);
    }

    #[test]
    fn structured_name_partial() {
        let name = parse_structured_name("Doe;Jane");
        assert_eq!(name.family, "Doe");
        assert_eq!(name.given, "Jane");
        assert_eq!(name.additional, "");
        assert_eq!(name.suffix, "");
    }

    #[test]
    fn address_components() {
        let adr = parse_address(r";;42 Rue de la Paix\, Bat. B;Paris;IDF;75002;France");
        assert_eq!(adr.street, "42 Rue de la Paix, Bat. B");
        assert_eq!(adr.locality, "Paris");
        assert_eq!(adr.postal_code, "75002");
        assert_eq!(
            adr.one_line(),
            "42 Rue de la Paix, Bat. B, Paris, IDF, 75002, France"
        );
    }
}
