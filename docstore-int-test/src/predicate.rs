//! A small evaluator for the WHERE-clause grammar the postgres backend
//! compiles to. The in-memory server parses each predicate once into an AST
//! (placeholder indices assigned left-to-right, matching bind order) and
//! evaluates it per row with SQL WHERE semantics: an unknown comparison
//! outcome does not match.

use docstore_postgres::SqlValue;
use serde_json::Value;

/// A compiled field reference inside a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    /// A bare physical column (`id`, `created_at`, `updated_at`).
    Column(String),
    /// A JSON text extraction: `document->'a'->>'b'`.
    JsonText(Vec<String>),
    /// A JSON container navigation: `document->'a'->'b'`.
    JsonContainer(Vec<String>),
}

/// Supplies row values to predicate evaluation.
pub trait ValueSource {
    fn column_text(&self, column: &str) -> Option<String>;
    fn json_value(&self, path: &[String]) -> Option<&Value>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CmpOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ilike,
}

/// Parsed predicate AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Pred {
    Or(Box<Pred>, Box<Pred>),
    And(Box<Pred>, Box<Pred>),
    /// Textual comparison (`=`, `!=`, `ILIKE`) against one placeholder.
    Compare {
        field: FieldRef,
        op: CmpOp,
        param: usize,
    },
    /// `CAST (<ref> AS NUMERIC) <op> ?`.
    Numeric {
        field: FieldRef,
        op: CmpOp,
        param: usize,
    },
    /// `<ref> [NOT] IN (?, ...)`.
    InList {
        field: FieldRef,
        negated: bool,
        params: Vec<usize>,
    },
    /// `<ref> IS [NOT] NULL`.
    Null { field: FieldRef, negated: bool },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Placeholder,
    Arrow,
    DoubleArrow,
    Str(String),
    Ident(String),
    Op(CmpOp),
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Tokenizer {
            chars: text.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' | '\t' => {
                    self.chars.next();
                }
                '(' => {
                    self.chars.next();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::RParen);
                }
                ',' => {
                    self.chars.next();
                    tokens.push(Token::Comma);
                }
                '?' => {
                    self.chars.next();
                    tokens.push(Token::Placeholder);
                }
                '\'' => {
                    self.chars.next();
                    tokens.push(Token::Str(self.read_quoted()?));
                }
                '-' => {
                    self.chars.next();
                    if self.chars.next() != Some('>') {
                        return Err("expected > after -".to_string());
                    }
                    if self.chars.peek() == Some(&'>') {
                        self.chars.next();
                        tokens.push(Token::DoubleArrow);
                    } else {
                        tokens.push(Token::Arrow);
                    }
                }
                '=' => {
                    self.chars.next();
                    tokens.push(Token::Op(CmpOp::Eq));
                }
                '!' => {
                    self.chars.next();
                    if self.chars.next() != Some('=') {
                        return Err("expected = after !".to_string());
                    }
                    tokens.push(Token::Op(CmpOp::Neq));
                }
                '>' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        tokens.push(Token::Op(CmpOp::Gte));
                    } else {
                        tokens.push(Token::Op(CmpOp::Gt));
                    }
                }
                '<' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        tokens.push(Token::Op(CmpOp::Lte));
                    } else {
                        tokens.push(Token::Op(CmpOp::Lt));
                    }
                }
                c if c.is_ascii_alphanumeric() || c == '_' || c == '*' => {
                    tokens.push(Token::Ident(self.read_ident()));
                }
                other => return Err(format!("unexpected character {:?}", other)),
            }
        }
        Ok(tokens)
    }

    fn read_quoted(&mut self) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('\'') => {
                    // doubled quote is an escaped quote
                    if self.chars.peek() == Some(&'\'') {
                        self.chars.next();
                        out.push('\'');
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => out.push(c),
                None => return Err("unterminated string literal".to_string()),
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '*' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }
}

/// Parses a compiled predicate, assigning placeholder indices starting at
/// `first_param` in left-to-right order.
pub fn parse_predicate(text: &str, first_param: usize) -> Result<Pred, String> {
    let tokens = Tokenizer::new(text).tokenize()?;
    let mut parser = Parser {
        tokens,
        position: 0,
        next_param: first_param,
    };
    let pred = parser.or_expr()?;
    if parser.position != parser.tokens.len() {
        return Err(format!("trailing tokens in predicate: {}", text));
    }
    Ok(pred)
}

/// Parses the pair list of a `json_build_object(...)` projection into
/// `(result key, field reference)` pairs.
pub fn parse_projection(text: &str) -> Result<Vec<(String, FieldRef)>, String> {
    let tokens = Tokenizer::new(text).tokenize()?;
    let mut parser = Parser {
        tokens,
        position: 0,
        next_param: 0,
    };
    let mut pairs = Vec::new();
    loop {
        let name = match parser.next() {
            Some(Token::Str(name)) => name,
            other => return Err(format!("expected projection key, found {:?}", other)),
        };
        parser.expect(&Token::Comma)?;
        let field = parser.field_ref()?;
        pairs.push((name, field));
        if parser.peek() == Some(&Token::Comma) {
            parser.next();
        } else {
            break;
        }
    }
    if parser.position != parser.tokens.len() {
        return Err(format!("trailing tokens in projection: {}", text));
    }
    Ok(pairs)
}

/// Parses a standalone field reference (used for ORDER BY and projections).
pub fn parse_field_ref(text: &str) -> Result<FieldRef, String> {
    let tokens = Tokenizer::new(text).tokenize()?;
    let mut parser = Parser {
        tokens,
        position: 0,
        next_param: 0,
    };
    let field = parser.field_ref()?;
    if parser.position != parser.tokens.len() {
        return Err(format!("trailing tokens in field reference: {}", text));
    }
    Ok(field)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    next_param: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(format!("expected {:?}, found {:?}", expected, other)),
        }
    }

    fn take_placeholder(&mut self) -> Result<usize, String> {
        self.expect(&Token::Placeholder)?;
        let index = self.next_param;
        self.next_param += 1;
        Ok(index)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word == keyword)
    }

    fn take_keyword(&mut self, keyword: &str) -> Result<(), String> {
        match self.next() {
            Some(Token::Ident(ref word)) if word == keyword => Ok(()),
            other => Err(format!("expected {}, found {:?}", keyword, other)),
        }
    }

    fn or_expr(&mut self) -> Result<Pred, String> {
        let mut left = self.and_expr()?;
        while self.is_keyword("OR") {
            self.take_keyword("OR")?;
            let right = self.and_expr()?;
            left = Pred::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Pred, String> {
        let mut left = self.primary()?;
        while self.is_keyword("AND") {
            self.take_keyword("AND")?;
            let right = self.primary()?;
            left = Pred::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Pred, String> {
        if self.peek() == Some(&Token::LParen) {
            self.next();
            let inner = self.or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        if self.is_keyword("CAST") {
            return self.numeric_comparison();
        }
        let field = self.field_ref()?;
        match self.next() {
            Some(Token::Op(op @ (CmpOp::Eq | CmpOp::Neq))) => Ok(Pred::Compare {
                field,
                op,
                param: self.take_placeholder()?,
            }),
            Some(Token::Ident(word)) if word == "ILIKE" => Ok(Pred::Compare {
                field,
                op: CmpOp::Ilike,
                param: self.take_placeholder()?,
            }),
            Some(Token::Ident(word)) if word == "IS" => {
                // `negated` records the NOT: IS NULL matches absent
                // containers, IS NOT NULL present ones
                let negated = if self.is_keyword("NOT") {
                    self.take_keyword("NOT")?;
                    true
                } else {
                    false
                };
                self.take_keyword("NULL")?;
                Ok(Pred::Null { field, negated })
            }
            Some(Token::Ident(word)) if word == "IN" => self.in_list(field, false),
            Some(Token::Ident(word)) if word == "NOT" => {
                self.take_keyword("IN")?;
                self.in_list(field, true)
            }
            other => Err(format!("unexpected token after field: {:?}", other)),
        }
    }

    fn numeric_comparison(&mut self) -> Result<Pred, String> {
        self.take_keyword("CAST")?;
        self.expect(&Token::LParen)?;
        let field = self.field_ref()?;
        self.take_keyword("AS")?;
        self.take_keyword("NUMERIC")?;
        self.expect(&Token::RParen)?;
        let op = match self.next() {
            Some(Token::Op(op @ (CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte))) => op,
            other => return Err(format!("expected numeric comparison, found {:?}", other)),
        };
        Ok(Pred::Numeric {
            field,
            op,
            param: self.take_placeholder()?,
        })
    }

    fn in_list(&mut self, field: FieldRef, negated: bool) -> Result<Pred, String> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            params.push(self.take_placeholder()?);
            while self.peek() == Some(&Token::Comma) {
                self.next();
                params.push(self.take_placeholder()?);
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Pred::InList {
            field,
            negated,
            params,
        })
    }

    fn field_ref(&mut self) -> Result<FieldRef, String> {
        let head = match self.next() {
            Some(Token::Ident(word)) => word,
            other => return Err(format!("expected field reference, found {:?}", other)),
        };
        if head != "document" {
            return Ok(FieldRef::Column(head));
        }
        let mut path = Vec::new();
        let mut text_terminal = false;
        loop {
            match self.peek() {
                Some(Token::Arrow) => {
                    self.next();
                }
                Some(Token::DoubleArrow) => {
                    self.next();
                    text_terminal = true;
                }
                _ => break,
            }
            match self.next() {
                Some(Token::Str(segment)) => path.push(segment),
                other => return Err(format!("expected path segment, found {:?}", other)),
            }
            if text_terminal {
                break;
            }
        }
        if path.is_empty() {
            // a bare `document` reference (whole-blob projection)
            return Ok(FieldRef::JsonContainer(path));
        }
        Ok(if text_terminal {
            FieldRef::JsonText(path)
        } else {
            FieldRef::JsonContainer(path)
        })
    }
}

impl Pred {
    /// Evaluates the predicate against one row. Unknown (NULL-involved)
    /// comparisons do not match, per SQL WHERE semantics.
    pub fn matches(&self, source: &dyn ValueSource, params: &[SqlValue]) -> bool {
        match self {
            Pred::Or(left, right) => {
                left.matches(source, params) || right.matches(source, params)
            }
            Pred::And(left, right) => {
                left.matches(source, params) && right.matches(source, params)
            }
            Pred::Compare { field, op, param } => {
                let field_text = match text_of(field, source) {
                    Some(text) => text,
                    None => return false,
                };
                let param_text = match param_text(params.get(*param)) {
                    Some(text) => text,
                    None => return false,
                };
                match op {
                    CmpOp::Eq => field_text == param_text,
                    CmpOp::Neq => field_text != param_text,
                    CmpOp::Ilike => ilike_match(&field_text, &param_text),
                    _ => false,
                }
            }
            Pred::Numeric { field, op, param } => {
                let field_num = match text_of(field, source).and_then(|t| t.parse::<f64>().ok()) {
                    Some(n) => n,
                    None => return false,
                };
                let param_num = match params.get(*param).and_then(numeric_of) {
                    Some(n) => n,
                    None => return false,
                };
                match op {
                    CmpOp::Gt => field_num > param_num,
                    CmpOp::Gte => field_num >= param_num,
                    CmpOp::Lt => field_num < param_num,
                    CmpOp::Lte => field_num <= param_num,
                    _ => false,
                }
            }
            Pred::InList {
                field,
                negated,
                params: indices,
            } => {
                let field_text = match text_of(field, source) {
                    Some(text) => text,
                    None => return false,
                };
                let found = indices
                    .iter()
                    .filter_map(|index| param_text(params.get(*index)))
                    .any(|candidate| candidate == field_text);
                if *negated {
                    !found
                } else {
                    found
                }
            }
            Pred::Null { field, negated } => {
                let present = match field {
                    FieldRef::Column(column) => source.column_text(column).is_some(),
                    FieldRef::JsonContainer(path) | FieldRef::JsonText(path) => {
                        source.json_value(path).is_some()
                    }
                };
                if *negated {
                    present
                } else {
                    !present
                }
            }
        }
    }
}

/// Renders a field reference to text the way postgres `->>` / column reads
/// would: scalars as their text form, containers as compact JSON, JSON null
/// and absent fields as SQL NULL.
pub fn text_of(field: &FieldRef, source: &dyn ValueSource) -> Option<String> {
    match field {
        FieldRef::Column(column) => source.column_text(column),
        FieldRef::JsonText(path) => match source.json_value(path)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        },
        FieldRef::JsonContainer(path) => source.json_value(path).map(|value| value.to_string()),
    }
}

fn param_text(param: Option<&SqlValue>) -> Option<String> {
    match param? {
        SqlValue::Null => None,
        SqlValue::Bool(b) => Some(b.to_string()),
        SqlValue::Int(i) => Some(i.to_string()),
        SqlValue::Float(f) => Some(f.to_string()),
        SqlValue::Text(text) => Some(text.clone()),
        SqlValue::Json(json) => Some(json.to_string()),
    }
}

fn numeric_of(param: &SqlValue) -> Option<f64> {
    match param {
        SqlValue::Int(i) => Some(*i as f64),
        SqlValue::Float(f) => Some(*f),
        SqlValue::Text(text) => text.parse().ok(),
        _ => None,
    }
}

/// Case-insensitive SQL LIKE matching with `%` wildcards.
fn ilike_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let pieces: Vec<&str> = pattern.split('%').collect();
    if pieces.len() == 1 {
        return text == pattern;
    }
    let mut remaining = text.as_str();
    let last = pieces.len() - 1;
    for (index, piece) in pieces.iter().enumerate() {
        if piece.is_empty() {
            continue;
        }
        if index == 0 {
            match remaining.strip_prefix(piece) {
                Some(rest) => remaining = rest,
                None => return false,
            }
        } else if index == last {
            return remaining.ends_with(piece);
        } else {
            match remaining.find(piece) {
                Some(at) => remaining = &remaining[at + piece.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TestRow {
        id: String,
        document: Value,
    }

    impl ValueSource for TestRow {
        fn column_text(&self, column: &str) -> Option<String> {
            match column {
                "id" => Some(self.id.clone()),
                _ => None,
            }
        }

        fn json_value(&self, path: &[String]) -> Option<&Value> {
            let mut current = &self.document;
            for segment in path {
                current = current.as_object()?.get(segment)?;
            }
            Some(current)
        }
    }

    fn row(document: Value) -> TestRow {
        TestRow {
            id: "k1".to_string(),
            document,
        }
    }

    fn text(value: &str) -> SqlValue {
        SqlValue::Text(value.to_string())
    }

    #[test]
    fn test_parse_and_eval_eq() {
        let pred = parse_predicate("document->>'key1' = ?", 0).unwrap();
        let params = [text("val1")];
        assert!(pred.matches(&row(json!({"key1": "val1"})), &params));
        assert!(!pred.matches(&row(json!({"key1": "other"})), &params));
        assert!(!pred.matches(&row(json!({})), &params));
    }

    #[test]
    fn test_null_safe_neq() {
        let pred =
            parse_predicate("document->'key1' IS NULL OR document->>'key1' != ?", 0).unwrap();
        let params = [text("val1")];
        // missing field counts as "not equal"
        assert!(pred.matches(&row(json!({})), &params));
        assert!(pred.matches(&row(json!({"key1": "other"})), &params));
        assert!(!pred.matches(&row(json!({"key1": "val1"})), &params));
    }

    #[test]
    fn test_physical_column() {
        let pred = parse_predicate("id = ?", 0).unwrap();
        assert!(pred.matches(&row(json!({})), &[text("k1")]));
        assert!(!pred.matches(&row(json!({})), &[text("k2")]));
    }

    #[test]
    fn test_numeric_cast() {
        let pred = parse_predicate("CAST (document->>'age' AS NUMERIC) >= ?", 0).unwrap();
        let params = [SqlValue::Int(18)];
        assert!(pred.matches(&row(json!({"age": 21})), &params));
        assert!(pred.matches(&row(json!({"age": "18"})), &params));
        assert!(!pred.matches(&row(json!({"age": 17})), &params));
        assert!(!pred.matches(&row(json!({})), &params));
    }

    #[test]
    fn test_in_and_not_in() {
        let pred = parse_predicate("document->>'key1' IN (?, ?)", 0).unwrap();
        let params = [text("a"), text("b")];
        assert!(pred.matches(&row(json!({"key1": "b"})), &params));
        assert!(!pred.matches(&row(json!({"key1": "c"})), &params));

        let pred = parse_predicate(
            "document->'key1' IS NULL OR document->>'key1' NOT IN (?, ?)",
            0,
        )
        .unwrap();
        assert!(pred.matches(&row(json!({"key1": "c"})), &params));
        assert!(pred.matches(&row(json!({})), &params));
        assert!(!pred.matches(&row(json!({"key1": "a"})), &params));
    }

    #[test]
    fn test_existence() {
        let pred = parse_predicate("document->'key1'->'key2' IS NOT NULL ", 0).unwrap();
        assert!(pred.matches(&row(json!({"key1": {"key2": 1}})), &[]));
        assert!(!pred.matches(&row(json!({"key1": {}})), &[]));

        let pred = parse_predicate("document->'key1' IS NULL ", 0).unwrap();
        assert!(pred.matches(&row(json!({})), &[]));
        assert!(!pred.matches(&row(json!({"key1": 1})), &[]));
    }

    #[test]
    fn test_nested_boolean_precedence() {
        let pred = parse_predicate(
            "((id = ?) AND (document->>'key2' = ?)) OR ((id = ?) AND (document->>'key4' = ?))",
            0,
        )
        .unwrap();
        let params = [text("k1"), text("v2"), text("zz"), text("v4")];
        assert!(pred.matches(&row(json!({"key2": "v2"})), &params));
        assert!(!pred.matches(&row(json!({"key4": "v4"})), &params));
    }

    #[test]
    fn test_ilike() {
        let pred = parse_predicate("document->>'name' ILIKE ?", 0).unwrap();
        assert!(pred.matches(&row(json!({"name": "Alice Smith"})), &[text("%ali%")]));
        assert!(pred.matches(&row(json!({"name": "Alice"})), &[text("%ALICE%")]));
        assert!(!pred.matches(&row(json!({"name": "Bob"})), &[text("%ali%")]));
    }

    #[test]
    fn test_ilike_without_wildcards_is_exact() {
        assert!(ilike_match("Alice", "alice"));
        assert!(!ilike_match("Alice Smith", "alice"));
    }

    #[test]
    fn test_parse_field_ref() {
        assert_eq!(
            parse_field_ref("id").unwrap(),
            FieldRef::Column("id".to_string())
        );
        assert_eq!(
            parse_field_ref("document->>'age'").unwrap(),
            FieldRef::JsonText(vec!["age".to_string()])
        );
        assert_eq!(
            parse_field_ref("document->'a'->'b'").unwrap(),
            FieldRef::JsonContainer(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_param_indices_assigned_left_to_right() {
        let pred = parse_predicate("(document->>'a' = ?) AND (document->>'b' = ?)", 2).unwrap();
        match pred {
            Pred::And(left, right) => {
                assert!(matches!(*left, Pred::Compare { param: 2, .. }));
                assert!(matches!(*right, Pred::Compare { param: 3, .. }));
            }
            other => panic!("expected AND, got {:?}", other),
        }
    }
}
