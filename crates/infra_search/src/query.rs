//! Query-string language
//!
//! A subset of the Lucene query-string syntax, evaluated against the
//! searchable fields an entity exposes.
//!
//! | Syntax | Meaning |
//! |---|---|
//! | `frost` | any field contains the word `frost` |
//! | `uuid:AAAA` | field `uuid` contains the word `AAAA` |
//! | `name:"main street"` | phrase match |
//! | `token:ab*` | prefix match |
//! | `device.id:*` | field is present |
//! | `*` or `*:*` | everything |
//! | `a AND b`, `a OR b`, `NOT a` | boolean operators (`&&`, `||`, `!` also accepted) |
//! | `+a -b` | required / prohibited clause |
//! | `(a OR b) AND c` | grouping, also `field:(a b)` |
//!
//! Adjacent clauses without an operator are combined with OR. Matching is
//! case-insensitive; field values are split into words on any
//! non-alphanumeric character.

use core_kernel::SearchField;

use crate::error::SearchError;

/// Longest accepted query, in characters
pub const MAX_QUERY_LENGTH: usize = 4096;

/// Deepest accepted parenthesis nesting
pub const MAX_NESTING: usize = 32;

/// How a clause participates in a boolean query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    pub query: Query,
}

/// A parsed query
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Term { field: Option<String>, text: String },
    Prefix { field: Option<String>, prefix: String },
    Phrase { field: Option<String>, words: Vec<String>, raw: String },
    Exists { field: String },
    Boolean(Vec<Clause>),
}

impl Query {
    /// Parses a query string
    ///
    /// An empty or blank query matches everything.
    pub fn parse(input: &str) -> Result<Query, SearchError> {
        if input.chars().count() > MAX_QUERY_LENGTH {
            return Err(SearchError::invalid_query("query too long", MAX_QUERY_LENGTH));
        }
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Ok(Query::MatchAll);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let query = parser.parse_group(None)?;
        if let Some((token, at)) = parser.peek() {
            return Err(SearchError::invalid_query(format!("unexpected {:?}", token), at));
        }
        Ok(query)
    }

    /// Evaluates the query against an entity's search document
    pub fn matches(&self, document: &[SearchField]) -> bool {
        match self {
            Query::MatchAll => true,
            Query::Exists { field } => document.iter().any(|f| f.name == field.as_str()),
            Query::Term { field, text } => fields(document, field).any(|value| {
                let lowered = value.to_lowercase();
                lowered == *text || analyze(value).iter().any(|w| w == text)
            }),
            Query::Prefix { field, prefix } => fields(document, field).any(|value| {
                value.to_lowercase().starts_with(prefix.as_str())
                    || analyze(value).iter().any(|w| w.starts_with(prefix.as_str()))
            }),
            Query::Phrase { field, words, raw } => fields(document, field).any(|value| {
                let lowered = value.to_lowercase();
                if lowered == *raw {
                    return true;
                }
                let tokens = analyze(value);
                !words.is_empty() && tokens.windows(words.len()).any(|w| w == words.as_slice())
            }),
            Query::Boolean(clauses) => {
                let mut has_must = false;
                let mut any_should = false;
                let mut has_should = false;
                for clause in clauses {
                    let hit = clause.query.matches(document);
                    match clause.occur {
                        Occur::MustNot if hit => return false,
                        Occur::MustNot => {}
                        Occur::Must if !hit => return false,
                        Occur::Must => has_must = true,
                        Occur::Should => {
                            has_should = true;
                            any_should |= hit;
                        }
                    }
                }
                has_must || !has_should || any_should
            }
        }
    }
}

fn fields<'a>(
    document: &'a [SearchField],
    field: &'a Option<String>,
) -> impl Iterator<Item = &'a str> + 'a {
    document
        .iter()
        .filter(move |f| field.as_deref().map_or(true, |name| f.name == name))
        .map(|f| f.value.as_str())
}

/// Lowercases and splits on non-alphanumeric characters
fn analyze(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Field(String),
    Word(String),
    Phrase(String),
}

fn lex(input: &str) -> Result<Vec<(Token, usize)>, SearchError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push((Token::LParen, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                i += 1;
            }
            '[' | '{' => {
                return Err(SearchError::invalid_query("range queries are not supported", start));
            }
            '"' => {
                let mut phrase = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(SearchError::invalid_query("unterminated phrase", start));
                        }
                        Some('\\') if i + 1 < chars.len() => {
                            phrase.push(chars[i + 1]);
                            i += 2;
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            phrase.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push((Token::Phrase(phrase), start));
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push((Token::And, start));
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push((Token::Or, start));
                i += 2;
            }
            '!' => {
                tokens.push((Token::Not, start));
                i += 1;
            }
            '+' | '-' if chars.get(i + 1).is_some_and(|n| !n.is_whitespace()) => {
                tokens.push((if c == '+' { Token::Plus } else { Token::Minus }, start));
                i += 1;
            }
            _ => {
                let mut word = String::new();
                let mut is_field = false;
                while let Some(&ch) = chars.get(i) {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                        break;
                    }
                    if ch == '\\' && i + 1 < chars.len() {
                        word.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    if ch == ':' {
                        is_field = true;
                        i += 1;
                        break;
                    }
                    word.push(ch);
                    i += 1;
                }
                if is_field {
                    if word.is_empty() {
                        return Err(SearchError::invalid_query("missing field name", start));
                    }
                    tokens.push((Token::Field(word), start));
                } else {
                    let token = match word.as_str() {
                        "AND" => Token::And,
                        "OR" => Token::Or,
                        "NOT" => Token::Not,
                        _ => Token::Word(word),
                    };
                    tokens.push((token, start));
                }
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Open parentheses around the current position
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(&Token, usize)> {
        self.tokens.get(self.pos).map(|(t, at)| (t, *at))
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |(_, at)| at + 1)
    }

    /// Parses clauses until a closing parenthesis or the end of input
    fn parse_group(&mut self, field: Option<&str>) -> Result<Query, SearchError> {
        let mut clauses: Vec<Clause> = Vec::new();

        while let Some((token, at)) = self.peek() {
            if *token == Token::RParen {
                break;
            }

            let mut conjunction = None;
            if matches!(token, Token::And | Token::Or) {
                if clauses.is_empty() {
                    return Err(SearchError::invalid_query("operator without left operand", at));
                }
                conjunction = self.next().map(|(t, _)| t);
            }

            let modifier = match self.peek() {
                Some((Token::Plus | Token::Minus | Token::Not, _)) => self.next().map(|(t, _)| t),
                _ => None,
            };

            let query = self.parse_primary(field)?;

            if conjunction == Some(Token::And) {
                if let Some(last) = clauses.last_mut() {
                    if last.occur != Occur::MustNot {
                        last.occur = Occur::Must;
                    }
                }
            }

            let occur = match modifier {
                Some(Token::Minus) | Some(Token::Not) => Occur::MustNot,
                Some(Token::Plus) => Occur::Must,
                _ if conjunction == Some(Token::And) => Occur::Must,
                _ => Occur::Should,
            };
            clauses.push(Clause { occur, query });
        }

        match clauses.len() {
            0 => Err(SearchError::invalid_query("empty group", self.end_position())),
            1 if clauses[0].occur == Occur::Should => Ok(clauses.remove(0).query),
            _ => Ok(Query::Boolean(clauses)),
        }
    }

    fn parse_primary(&mut self, field: Option<&str>) -> Result<Query, SearchError> {
        let end = self.end_position();
        let (token, at) = self
            .next()
            .ok_or_else(|| SearchError::invalid_query("unexpected end of query", end))?;

        match token {
            Token::Field(name) => {
                let name = if name == "*" { None } else { Some(name) };
                match self.peek() {
                    Some((Token::Word(_) | Token::Phrase(_) | Token::LParen, _)) => {
                        self.parse_primary(name.as_deref())
                    }
                    _ => Err(SearchError::invalid_query("field without a value", at)),
                }
            }
            Token::Word(word) => Ok(term(field, &word)),
            Token::Phrase(text) => Ok(phrase(field, &text)),
            Token::LParen => {
                if self.depth >= MAX_NESTING {
                    return Err(SearchError::invalid_query("query nested too deeply", at));
                }
                self.depth += 1;
                let group = self.parse_group(field)?;
                self.depth -= 1;
                match self.next() {
                    Some((Token::RParen, _)) => Ok(group),
                    _ => Err(SearchError::invalid_query("missing ')'", at)),
                }
            }
            other => Err(SearchError::invalid_query(format!("unexpected {:?}", other), at)),
        }
    }
}

fn term(field: Option<&str>, word: &str) -> Query {
    let field = field.map(str::to_string);
    if word == "*" {
        return match field {
            Some(field) => Query::Exists { field },
            None => Query::MatchAll,
        };
    }
    if let Some(prefix) = word.strip_suffix('*') {
        return Query::Prefix {
            field,
            prefix: prefix.to_lowercase(),
        };
    }
    let words = analyze(word);
    if words.len() > 1 {
        Query::Phrase {
            field,
            words,
            raw: word.to_lowercase(),
        }
    } else {
        Query::Term {
            field,
            text: word.to_lowercase(),
        }
    }
}

fn phrase(field: Option<&str>, text: &str) -> Query {
    Query::Phrase {
        field: field.map(str::to_string),
        words: analyze(text),
        raw: text.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: &[(&'static str, &str)]) -> Vec<SearchField> {
        fields.iter().map(|(n, v)| SearchField::new(n, v)).collect()
    }

    #[test]
    fn test_blank_query_matches_all() {
        assert_eq!(Query::parse("   ").unwrap(), Query::MatchAll);
        assert_eq!(Query::parse("*").unwrap(), Query::MatchAll);
        assert_eq!(Query::parse("*:*").unwrap(), Query::MatchAll);
    }

    #[test]
    fn test_field_term() {
        let q = Query::parse("id:1001").unwrap();
        assert_eq!(
            q,
            Query::Term {
                field: Some("id".into()),
                text: "1001".into()
            }
        );
        assert!(q.matches(&doc(&[("id", "1001")])));
        assert!(!q.matches(&doc(&[("id", "1002")])));
        assert!(!q.matches(&doc(&[("name", "1001")])));
    }

    #[test]
    fn test_bare_term_searches_all_fields() {
        let q = Query::parse("cellar").unwrap();
        assert!(q.matches(&doc(&[("name", "Wine Cellar"), ("address", "x")])));
        assert!(q.matches(&doc(&[("address", "cellar door")])));
        assert!(!q.matches(&doc(&[("name", "cellars")])));
    }

    #[test]
    fn test_prefix_and_exists() {
        let q = Query::parse("token:ab*").unwrap();
        assert!(q.matches(&doc(&[("token", "ABCDEF")])));
        assert!(!q.matches(&doc(&[("token", "xab")])));

        let q = Query::parse("device.id:*").unwrap();
        assert!(q.matches(&doc(&[("device.id", "4")])));
        assert!(!q.matches(&doc(&[("id", "4")])));
    }

    #[test]
    fn test_phrase() {
        let q = Query::parse("address:\"main street\"").unwrap();
        assert!(q.matches(&doc(&[("address", "12 Main Street")])));
        assert!(!q.matches(&doc(&[("address", "Street Main")])));
    }

    #[test]
    fn test_punctuated_word_becomes_phrase() {
        let q = Query::parse("appVersion:1.2").unwrap();
        assert!(q.matches(&doc(&[("appVersion", "1.2")])));
        assert!(q.matches(&doc(&[("appVersion", "build 1.2 beta")])));
        assert!(!q.matches(&doc(&[("appVersion", "1.20")])));
    }

    #[test]
    fn test_default_operator_is_or() {
        let q = Query::parse("alpha beta").unwrap();
        assert!(q.matches(&doc(&[("name", "alpha")])));
        assert!(q.matches(&doc(&[("name", "beta")])));
        assert!(!q.matches(&doc(&[("name", "gamma")])));
    }

    #[test]
    fn test_and_not() {
        let q = Query::parse("alpha AND NOT beta").unwrap();
        assert!(q.matches(&doc(&[("name", "alpha")])));
        assert!(!q.matches(&doc(&[("name", "alpha beta")])));

        let q = Query::parse("alpha && !beta").unwrap();
        assert!(!q.matches(&doc(&[("name", "alpha beta")])));
    }

    #[test]
    fn test_required_and_prohibited() {
        let q = Query::parse("+alpha -beta gamma").unwrap();
        assert!(q.matches(&doc(&[("name", "alpha")])));
        assert!(!q.matches(&doc(&[("name", "gamma")])));
        assert!(!q.matches(&doc(&[("name", "alpha beta")])));
    }

    #[test]
    fn test_only_prohibited_clauses_match_the_rest() {
        let q = Query::parse("-beta").unwrap();
        assert!(q.matches(&doc(&[("name", "alpha")])));
        assert!(!q.matches(&doc(&[("name", "beta")])));
    }

    #[test]
    fn test_grouping() {
        let q = Query::parse("(alpha OR beta) AND gamma").unwrap();
        assert!(q.matches(&doc(&[("name", "beta gamma")])));
        assert!(!q.matches(&doc(&[("name", "beta")])));

        let q = Query::parse("name:(alpha beta)").unwrap();
        assert!(q.matches(&doc(&[("name", "beta")])));
        assert!(!q.matches(&doc(&[("address", "beta")])));
    }

    #[test]
    fn test_escaped_colon() {
        let q = Query::parse("createTimestamp:1970-01-01T00\\:00\\:00+00\\:00").unwrap();
        assert!(q.matches(&doc(&[("createTimestamp", "1970-01-01T00:00:00+00:00")])));
    }

    #[test]
    fn test_errors() {
        assert!(Query::parse("(alpha").is_err());
        assert!(Query::parse("alpha)").is_err());
        assert!(Query::parse("\"open").is_err());
        assert!(Query::parse("AND alpha").is_err());
        assert!(Query::parse("alpha AND").is_err());
        assert!(Query::parse("name:").is_err());
        assert!(Query::parse("value:[1 TO 5]").is_err());
    }

    #[test]
    fn test_nesting_is_bounded() {
        let at_limit = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(Query::parse(&at_limit).unwrap().matches(&doc(&[("name", "a")])));

        let too_deep = format!("{}a{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        let err = Query::parse(&too_deep).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        assert!(Query::parse(&"(".repeat(50_000)).is_err());
    }

    #[test]
    fn test_overlong_query_is_rejected() {
        let long = "a ".repeat(MAX_QUERY_LENGTH);
        let err = Query::parse(&long).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}
