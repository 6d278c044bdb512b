//! Line unfolding and content-line parsing.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::VCardParameter;

/// Unfolds continuation lines (a line break followed by a space or tab).
///
/// Accepts CRLF and bare LF line endings.
pub fn unfold(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                if matches!(chars.peek(), Some(' ' | '\t')) {
                    chars.next();
                } else {
                    result.push('\n');
                }
            }
            '\n' => {
                if matches!(chars.peek(), Some(' ' | '\t')) {
                    chars.next();
                } else {
                    result.push('\n');
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// One `[group.]NAME[;param=value]*:value` line, value still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    pub group: Option<String>,
    /// Uppercased.
    pub name: String,
    pub params: Vec<VCardParameter>,
    pub value: String,
}

pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let colon = find_value_separator(line).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            "missing colon separator",
        )
    })?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    // A group prefix can only appear before the first parameter.
    let name_end = head.find(';').unwrap_or(head.len());
    let (group, head) = match head[..name_end].split_once('.') {
        Some((g, _)) if is_name(g) => (Some(g.to_string()), &head[g.len() + 1..]),
        _ => (None, head),
    };

    let (name, params_str) = match head.split_once(';') {
        Some((name, params)) => (name, Some(params)),
        None => (head, None),
    };

    if !is_name(name) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            format!("{:?}", name),
        ));
    }

    let params = match params_str {
        Some(s) => parse_parameters(s, line_num)?,
        None => Vec::new(),
    };

    Ok(ContentLine {
        group,
        name: name.to_ascii_uppercase(),
        params,
        value: value.to_string(),
    })
}

/// Property, group and parameter names: anything but blanks and separators.
fn is_name(s: &str) -> bool {
    !s.is_empty()
        && !s.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, ';' | ':' | '=' | '"' | ',')
        })
}

/// The first colon outside a quoted parameter value.
fn find_value_separator(line: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_parameters(s: &str, line_num: usize) -> ParseResult<Vec<VCardParameter>> {
    let mut params = Vec::new();
    for raw in split_unquoted(s, ';') {
        if raw.is_empty() {
            continue;
        }
        let param = match raw.split_once('=') {
            Some((name, values)) => {
                if !is_name(name) {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidParameter,
                        line_num,
                        format!("name {:?}", name),
                    ));
                }
                let values = split_unquoted(values, ',')
                    .into_iter()
                    .map(|v| decode_param_value(v.trim_matches('"')))
                    .collect();
                VCardParameter::new(name, values)
            }
            // vCard 2.1 bare types, e.g. `TEL;HOME;VOICE:`
            None => VCardParameter::new("TYPE", vec![raw.to_string()]),
        };
        params.push(param);
    }
    Ok(params)
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// RFC 6868 caret decoding.
fn decode_param_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\'') => {
                chars.next();
                out.push('"');
            }
            Some('^') => {
                chars.next();
                out.push('^');
            }
            _ => out.push('^'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfold_crlf_and_lf() {
        assert_eq!(unfold("FN:John\r\n  Doe\r\nN:Doe"), "FN:John Doe\nN:Doe");
        assert_eq!(unfold("NOTE:a\n\tb"), "NOTE:ab");
    }

    #[test]
    fn parse_simple_line() {
        let line = parse_content_line("fn:John Doe", 1).unwrap();
        assert_eq!(line.group, None);
        assert_eq!(line.name, "FN");
        assert!(line.params.is_empty());
        assert_eq!(line.value, "John Doe");
    }

    #[test]
    fn parse_grouped_line_with_params() {
        let line = parse_content_line("item1.TEL;TYPE=home,voice;PREF=1:+1-555", 3).unwrap();
        assert_eq!(line.group.as_deref(), Some("item1"));
        assert_eq!(line.name, "TEL");
        assert_eq!(line.params[0].name, "TYPE");
        assert_eq!(line.params[0].values, vec!["home", "voice"]);
        assert_eq!(line.params[1].value(), Some("1"));
    }

    #[test]
    fn parse_quoted_param_with_colon() {
        let line = parse_content_line("ADR;LABEL=\"1 Main St: Rear\":;;1 Main St;;;;", 1).unwrap();
        assert_eq!(line.params[0].value(), Some("1 Main St: Rear"));
        assert_eq!(line.value, ";;1 Main St;;;;");
    }

    #[test]
    fn parse_bare_type_params() {
        let line = parse_content_line("TEL;HOME;VOICE:555", 1).unwrap();
        assert_eq!(line.params.len(), 2);
        assert_eq!(line.params[0].name, "TYPE");
        assert_eq!(line.params[1].value(), Some("VOICE"));
    }

    #[test]
    fn parse_caret_encoding() {
        let line = parse_content_line("ADR;LABEL=a^nb^'c^':;;", 1).unwrap();
        assert_eq!(line.params[0].value(), Some("a\nb\"c\""));
    }

    #[test]
    fn parse_colon_in_value() {
        let line = parse_content_line("URL:https://example.com:8080/x", 1).unwrap();
        assert_eq!(line.value, "https://example.com:8080/x");
    }

    #[test]
    fn missing_colon_is_an_error() {
        let err = parse_content_line("this is not a property", 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
        assert_eq!(err.line, 7);
    }

    #[test]
    fn parse_underscore_names() {
        let line = parse_content_line("X-CUSTOM_FIELD;X_PARAM=1:value", 1).unwrap();
        assert_eq!(line.name, "X-CUSTOM_FIELD");
        assert_eq!(line.params[0].name, "X_PARAM");
        assert_eq!(line.value, "value");

        let line = parse_content_line("my_item.X-ABLabel:Work", 1).unwrap();
        assert_eq!(line.group.as_deref(), Some("my_item"));
        assert_eq!(line.name, "X-ABLABEL");
    }

    #[test]
    fn invalid_name_message() {
        let err = parse_content_line("BAD NAME:x", 4).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
        assert_eq!(err.to_string(), "line 4: invalid property name: \"BAD NAME\"");
    }
}
