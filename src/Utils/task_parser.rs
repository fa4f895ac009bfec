// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" which has titles and
/// pairs key-vector of values into HashMap<title, HashMap<key, Option<Vec<Value>>>>.
/// Lines starting with //, #, % or ; are comments. A key listed in a template but absent from the
/// document ends up as key: None.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, map_res, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;

pub type SectionMap = HashMap<String, Option<Vec<Value>>>;
pub type DocumentMap = HashMap<String, SectionMap>;

/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_string(&self) -> Option<&String> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// integers are accepted as floats: "3" and "3.0" mean the same number
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_integer().and_then(|i| usize::try_from(i).ok())
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// `None` -> Some(None), `Some(text)` or `text` -> Some(Some(text)), non-strings -> None
    pub fn as_option_string(&self) -> Option<Option<String>> {
        let s = self.as_string()?;
        if s == "None" {
            return Some(None);
        }
        let inner = s
            .strip_prefix("Some(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        Some(Some(inner.to_string()))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

/// identifier: letter or underscore followed by letters, digits, underscores
fn parse_identifier(input: &str) -> IResult<&str, String> {
    let word = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(word, String::from).parse(input)
}

fn parse_title(input: &str) -> IResult<&str, String> {
    let (input, title) = parse_identifier(input)?;
    Ok((input.trim_start(), title))
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    let token = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\r' | '\n' | ';'));
    map_res(token, |s: &str| -> Result<Value, String> {
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    })
    .parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let comma = delimited(space0, tag(","), space0);
    separated_list0(comma, parse_value).parse(input)
}

/// key: value, value, ...
fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    let (input, pair) = separated_pair(parse_identifier, colon, parse_value_list).parse(input)?;
    Ok((input.trim_start(), pair))
}

fn parse_section(input: &str) -> IResult<&str, (String, HashMap<String, Vec<Value>>)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_title(input)?;
    let (input, _) = multispace0(input)?;
    let (input, pairs) = many1(terminated(parse_key_value_pair, space0)).parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

fn filter_comments(input: &str) -> String {
    input
        .lines()
        .map(str::trim)
        .filter(|line| {
            !(line.is_empty()
                || line.starts_with("//")
                || line.starts_with('#')
                || line.starts_with('%')
                || line.starts_with(';'))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the entire document (comments already removed) into a DocumentMap
pub fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let (input, _) = multispace0(input)?;
    let (input, sections) = many1(terminated(parse_section, multispace0)).parse(input)?;
    let document = sections
        .into_iter()
        .map(|(title, section)| {
            let section = section
                .into_iter()
                .map(|(key, values)| (key, Some(values)))
                .collect::<SectionMap>();
            (title, section)
        })
        .collect();
    Ok((input, document))
}

/// Removes comments, parses the whole document and fills in the keys of `template` the
/// document does not mention with None.
pub fn parse_document_as(input: &str, template: Option<&DocumentMap>) -> Result<DocumentMap, String> {
    let filtered = filter_comments(input);
    let (remaining, mut parsed) =
        parse_document(&filtered).map_err(|e| format!("Parsing error: {:?}", e))?;
    if !remaining.trim().is_empty() {
        return Err(format!(
            "Failed to parse entire document. Remaining: '{}'",
            remaining
        ));
    }
    if let Some(template) = template {
        for (title, keys) in template {
            let section = parsed.entry(title.clone()).or_default();
            for key in keys.keys() {
                section.entry(key.clone()).or_insert(None);
            }
        }
    }
    Ok(parsed)
}

/// lower-cases titles and keys, values are left untouched
pub fn keys_to_lower_case(document: DocumentMap) -> DocumentMap {
    document
        .into_iter()
        .map(|(title, section)| {
            let section = section
                .into_iter()
                .map(|(key, values)| (key.to_lowercase(), values))
                .collect::<SectionMap>();
            (title.to_lowercase(), section)
        })
        .collect()
}

/// Renames alternative spellings of titles and keys to their canonical names.
/// `header_pseudonyms` maps a canonical title to its alternatives, `field_pseudonyms` does
/// the same for keys in every section.
pub fn with_pseudonyms(
    document: DocumentMap,
    header_pseudonyms: &HashMap<String, Vec<String>>,
    field_pseudonyms: &HashMap<String, Vec<String>>,
) -> DocumentMap {
    let canonical = |name: String, table: &HashMap<String, Vec<String>>| -> String {
        table
            .iter()
            .find(|(_, alternatives)| alternatives.contains(&name))
            .map(|(canonical, _)| canonical.clone())
            .unwrap_or(name)
    };
    let mut renamed = DocumentMap::new();
    for (title, section) in document {
        let target = renamed
            .entry(canonical(title, header_pseudonyms))
            .or_default();
        for (key, values) in section {
            target.insert(canonical(key, field_pseudonyms), values);
        }
    }
    renamed
}
