//! Formula parser
//!
//! A recursive descent parser for Excel formulas with proper operator precedence.
//! The output is a post-order token sequence (see [`crate::token`]).

use crate::error::{ParseError, ParseErrorKind};
use crate::token::{BinaryOperator, Token, UnaryOperator};
use crate::value::{format_number, FormulaValue};
use lazy_regex::regex_find;
use sheetcalc_core::{parse_a1, CellAddress, ErrorCode, Reference};
use std::fmt;

/// A formula parsed once, to be evaluated any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    source: String,
    tokens: Vec<Token>,
}

impl ParsedFormula {
    /// The text this formula was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tokens in post-order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// References named literally in the formula text
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Ref(r) | Token::Area(r) => Some(r),
            _ => None,
        })
    }
}

impl fmt::Display for ParsedFormula {
    /// Canonical formula text: `=` followed by the expression without whitespace
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<String> = Vec::new();
        for token in &self.tokens {
            let rendered = match token {
                Token::Number(n) => format_number(*n),
                Token::Text(s) => quote_text(s),
                Token::Boolean(b) => render_constant(&FormulaValue::Boolean(*b)),
                Token::Error(e) => e.to_string(),
                Token::Ref(r) | Token::Area(r) => r.to_string(),
                Token::Name(name) => name.clone(),
                Token::Array(rows) => {
                    let rows: Vec<String> = rows
                        .iter()
                        .map(|row| row.iter().map(render_constant).collect::<Vec<_>>().join(","))
                        .collect();
                    format!("{{{}}}", rows.join(";"))
                }
                Token::Missing => String::new(),
                Token::Unary(op) => {
                    let operand = stack.pop().ok_or(fmt::Error)?;
                    match op {
                        UnaryOperator::Negate => format!("-{}", operand),
                        UnaryOperator::Plus => format!("+{}", operand),
                        UnaryOperator::Percent => format!("{}%", operand),
                    }
                }
                Token::Binary(op) => {
                    let right = stack.pop().ok_or(fmt::Error)?;
                    let left = stack.pop().ok_or(fmt::Error)?;
                    format!("{}{}{}", left, op.symbol(), right)
                }
                Token::Function { name, arity } => {
                    let at = stack.len().checked_sub(*arity).ok_or(fmt::Error)?;
                    let args = stack.split_off(at);
                    format!("{}({})", name, args.join(","))
                }
                Token::Paren => {
                    let inner = stack.pop().ok_or(fmt::Error)?;
                    format!("({})", inner)
                }
            };
            stack.push(rendered);
        }
        write!(f, "={}", stack.join(""))
    }
}

fn quote_text(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn render_constant(value: &FormulaValue) -> String {
    match value {
        FormulaValue::String(s) => quote_text(s),
        other => other.as_string(),
    }
}

/// Parse formula text into a token sequence
///
/// The leading `=` is optional.
///
/// # Example
/// ```rust
/// use sheetcalc_formula::parse;
///
/// let formula = parse("=SUM(A1:A10)").unwrap();
/// assert_eq!(formula.to_string(), "=SUM(A1:A10)");
///
/// let err = parse("=1+").unwrap_err();
/// assert_eq!(err.offset, 3);
/// ```
pub fn parse(formula: &str) -> Result<ParsedFormula, ParseError> {
    let trimmed = formula.trim_start();
    let offset = formula.len() - trimmed.len();
    let (body, offset) = match trimmed.strip_prefix('=') {
        Some(rest) => (rest, offset + 1),
        None => (trimmed, offset),
    };
    if body.trim().is_empty() {
        return Err(ParseError::new(offset, ParseErrorKind::Empty));
    }

    let mut parser = FormulaParser::new(body, offset)?;
    parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current != Lexeme::Eof {
        return Err(parser.unexpected());
    }

    Ok(ParsedFormula {
        source: formula.to_string(),
        tokens: parser.tokens,
    })
}

/// Lexical tokens
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),

    // Identifiers and references
    Cell(Reference),
    Lines(Reference),
    Name(String),
    /// Function name; the opening parenthesis is already consumed
    Function(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Eof,
}

impl Lexeme {
    fn describe(&self) -> String {
        match self {
            Lexeme::Number(n) => format!("number {}", format_number(*n)),
            Lexeme::Text(s) => format!("text {}", quote_text(s)),
            Lexeme::Boolean(b) => format!("boolean {}", if *b { "TRUE" } else { "FALSE" }),
            Lexeme::Error(e) => format!("error {}", e),
            Lexeme::Cell(r) | Lexeme::Lines(r) => format!("reference {}", r),
            Lexeme::Name(n) => format!("name {}", n),
            Lexeme::Function(n) => format!("function {}", n),
            Lexeme::Eof => "end of formula".into(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Lexeme::Plus => "+",
            Lexeme::Minus => "-",
            Lexeme::Star => "*",
            Lexeme::Slash => "/",
            Lexeme::Caret => "^",
            Lexeme::Percent => "%",
            Lexeme::Ampersand => "&",
            Lexeme::Equal => "=",
            Lexeme::NotEqual => "<>",
            Lexeme::LessThan => "<",
            Lexeme::LessEqual => "<=",
            Lexeme::GreaterThan => ">",
            Lexeme::GreaterEqual => ">=",
            Lexeme::Colon => ":",
            Lexeme::Comma => ",",
            Lexeme::Semicolon => ";",
            Lexeme::LeftParen => "(",
            Lexeme::RightParen => ")",
            Lexeme::LeftBrace => "{",
            Lexeme::RightBrace => "}",
            _ => "",
        }
    }
}

/// `A1:Sheet1!B2` is a range whose right end is qualified, not a sheet range
/// starting at a sheet named `A1`
fn starts_with_cell(qualifier: &str) -> bool {
    match qualifier.split_once(':') {
        Some((first, _)) => !first.starts_with('[') && CellAddress::parse(first).is_ok(),
        None => false,
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    /// Offset of `input` within the text handed to [`parse`]
    base: usize,
    pos: usize,
    current: Lexeme,
    /// Where `current` starts
    token_start: usize,
    tokens: Vec<Token>,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, base: usize) -> ParseResult<Self> {
        let mut parser = Self {
            input,
            base,
            pos: 0,
            current: Lexeme::Eof,
            token_start: 0,
            tokens: Vec::new(),
        };
        parser.advance()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance(&mut self) -> ParseResult<Lexeme> {
        self.skip_whitespace();
        self.token_start = self.pos;
        let next = self.scan_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn scan_token(&mut self) -> ParseResult<Lexeme> {
        let Some(c) = self.peek_char() else {
            return Ok(Lexeme::Eof);
        };

        let single = match c {
            '+' => Some(Lexeme::Plus),
            '-' => Some(Lexeme::Minus),
            '*' => Some(Lexeme::Star),
            '/' => Some(Lexeme::Slash),
            '^' => Some(Lexeme::Caret),
            '%' => Some(Lexeme::Percent),
            '&' => Some(Lexeme::Ampersand),
            '=' => Some(Lexeme::Equal),
            ':' => Some(Lexeme::Colon),
            ',' => Some(Lexeme::Comma),
            ';' => Some(Lexeme::Semicolon),
            '(' => Some(Lexeme::LeftParen),
            ')' => Some(Lexeme::RightParen),
            '{' => Some(Lexeme::LeftBrace),
            '}' => Some(Lexeme::RightBrace),
            _ => None,
        };
        if let Some(token) = single {
            self.bump(1);
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.bump(1);
            return Ok(match self.peek_char() {
                Some('=') => {
                    self.bump(1);
                    Lexeme::LessEqual
                }
                Some('>') => {
                    self.bump(1);
                    Lexeme::NotEqual
                }
                _ => Lexeme::LessThan,
            });
        }
        if c == '>' {
            self.bump(1);
            if self.peek_char() == Some('=') {
                self.bump(1);
                return Ok(Lexeme::GreaterEqual);
            }
            return Ok(Lexeme::GreaterThan);
        }

        match c {
            '"' => self.scan_string(),
            '#' => self.scan_error(),
            '\'' => self.scan_quoted_reference(),
            _ => self.scan_word(),
        }
    }

    fn scan_string(&mut self) -> ParseResult<Lexeme> {
        self.bump(1);
        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.bump(1);
                    // Escaped quote ("")
                    if self.peek_char() == Some('"') {
                        s.push('"');
                        self.bump(1);
                    } else {
                        return Ok(Lexeme::Text(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.bump(c.len_utf8());
                }
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
            }
        }
    }

    fn scan_error(&mut self) -> ParseResult<Lexeme> {
        let rest = self.rest();
        let found = ErrorCode::ALL.iter().find(|e| {
            let literal = e.as_str();
            rest.get(..literal.len())
                .map_or(false, |s| s.eq_ignore_ascii_case(literal))
        });
        match found {
            Some(e) => {
                self.bump(e.as_str().len());
                Ok(Lexeme::Error(*e))
            }
            None => Err(self.error(ParseErrorKind::UnexpectedCharacter('#'))),
        }
    }

    /// `'Sheet name'!A1`; the quoted part can only ever be a sheet qualifier
    fn scan_quoted_reference(&mut self) -> ParseResult<Lexeme> {
        let rest = self.rest();
        let mut chars = rest.char_indices().skip(1);
        let qualifier_len = loop {
            match chars.next() {
                Some((i, '\'')) => {
                    if rest[i + 1..].starts_with('\'') {
                        chars.next();
                    } else if rest[i + 1..].starts_with('!') {
                        break i + 2;
                    } else {
                        return Err(self.error(ParseErrorKind::InvalidReference(
                            "expected '!' after quoted sheet name".into(),
                        )));
                    }
                }
                Some(_) => {}
                None => return Err(self.error(ParseErrorKind::UnterminatedSheetName)),
            }
        };
        self.scan_qualified_body(qualifier_len)
    }

    /// Numbers, references, names, function names and booleans
    fn scan_word(&mut self) -> ParseResult<Lexeme> {
        let rest = self.rest();

        // Sheet qualifier: Sheet1!, Sheet1:Sheet3!, [Book]Sheet1!
        if let Some(qualifier) = regex_find!(
            r"^(?:\[[^\]]+\])?[\p{L}\p{N}_.]+(?::[\p{L}\p{N}_.]+)?!",
            rest
        ) {
            if !starts_with_cell(qualifier) {
                return self.scan_qualified_body(qualifier.len());
            }
        }

        if let Some(lexeme) = self.scan_reference_body(0)? {
            return Ok(lexeme);
        }

        if let Some(number) = regex_find!(r"^([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", rest) {
            let value: f64 = number
                .parse()
                .map_err(|_| self.error(ParseErrorKind::InvalidNumber(number.to_string())))?;
            if !value.is_finite() {
                return Err(self.error(ParseErrorKind::InvalidNumber(number.to_string())));
            }
            self.bump(number.len());
            return Ok(Lexeme::Number(value));
        }

        if let Some(ident) = regex_find!(r"^[\p{L}_\\][\p{L}\p{N}_.]*", rest) {
            self.bump(ident.len());
            if self.peek_char() == Some('(') {
                self.bump(1);
                return Ok(Lexeme::Function(ident.to_uppercase()));
            }
            if ident.eq_ignore_ascii_case("TRUE") {
                return Ok(Lexeme::Boolean(true));
            }
            if ident.eq_ignore_ascii_case("FALSE") {
                return Ok(Lexeme::Boolean(false));
            }
            return Ok(Lexeme::Name(ident.to_string()));
        }

        let c = self.peek_char().unwrap_or(' ');
        Err(self.error(ParseErrorKind::UnexpectedCharacter(c)))
    }

    /// A reference body must follow a sheet qualifier of `qualifier_len` bytes
    fn scan_qualified_body(&mut self, qualifier_len: usize) -> ParseResult<Lexeme> {
        match self.scan_reference_body(qualifier_len)? {
            Some(lexeme) => Ok(lexeme),
            None => Err(self.error(ParseErrorKind::InvalidReference(format!(
                "expected a cell reference after '{}'",
                &self.rest()[..qualifier_len]
            )))),
        }
    }

    /// Try to read a cell, whole-column or whole-row reference after an optional
    /// qualifier; `None` when the text at that point is not one
    fn scan_reference_body(&mut self, qualifier_len: usize) -> ParseResult<Option<Lexeme>> {
        let rest = self.rest();
        let body = &rest[qualifier_len..];

        let (len, whole_lines) =
            if let Some(m) = regex_find!(r"^\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3}", body) {
                (m.len(), true)
            } else if let Some(m) = regex_find!(r"^\$?[0-9]{1,7}:\$?[0-9]{1,7}", body) {
                (m.len(), true)
            } else if let Some(m) = regex_find!(r"^\$?[A-Za-z]{1,3}\$?[0-9]{1,7}", body) {
                (m.len(), false)
            } else {
                return Ok(None);
            };

        // `A1B`, `LOG10(` and `A1.x` are names or function calls, not references
        let next = body[len..].chars().next();
        if next.map_or(false, |c| is_name_char(c) || c == '(' || c == '$') {
            return Ok(None);
        }

        let text = &rest[..qualifier_len + len];
        match parse_a1(text) {
            Ok(reference) => {
                self.bump(text.len());
                Ok(Some(if whole_lines {
                    Lexeme::Lines(reference)
                } else {
                    Lexeme::Cell(reference)
                }))
            }
            // Past the grid edge without a qualifier (`XFZ1`) it is just a name
            Err(_) if qualifier_len == 0 => Ok(None),
            Err(e) => Err(self.error(ParseErrorKind::InvalidReference(e.reason))),
        }
    }

    // === Helper methods ===

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, bytes: usize) {
        self.pos = (self.pos + bytes).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char().filter(|c| c.is_whitespace()) {
            self.bump(c.len_utf8());
        }
    }

    /// An error located at the start of the token being scanned
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.base + self.token_start, kind)
    }

    fn unexpected(&self) -> ParseError {
        match self.current {
            Lexeme::Eof => self.error(ParseErrorKind::UnexpectedEnd),
            ref other => self.error(ParseErrorKind::UnexpectedToken(other.describe())),
        }
    }

    fn expect(&mut self, expected: Lexeme, missing: ParseErrorKind) -> ParseResult<()> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else if self.current == Lexeme::Eof {
            Err(self.error(missing))
        } else {
            Err(self.unexpected())
        }
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^ (left associative)
    // 6. Unary: prefix -, +, postfix %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> ParseResult<()> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<()> {
        self.parse_concatenation()?;
        loop {
            let op = match self.current {
                Lexeme::Equal => BinaryOperator::Equal,
                Lexeme::NotEqual => BinaryOperator::NotEqual,
                Lexeme::LessThan => BinaryOperator::LessThan,
                Lexeme::LessEqual => BinaryOperator::LessEqual,
                Lexeme::GreaterThan => BinaryOperator::GreaterThan,
                Lexeme::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => return Ok(()),
            };
            self.advance()?;
            self.parse_concatenation()?;
            self.push(Token::Binary(op));
        }
    }

    fn parse_concatenation(&mut self) -> ParseResult<()> {
        self.parse_additive()?;
        while self.current == Lexeme::Ampersand {
            self.advance()?;
            self.parse_additive()?;
            self.push(Token::Binary(BinaryOperator::Concat));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> ParseResult<()> {
        self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Lexeme::Plus => BinaryOperator::Add,
                Lexeme::Minus => BinaryOperator::Subtract,
                _ => return Ok(()),
            };
            self.advance()?;
            self.parse_multiplicative()?;
            self.push(Token::Binary(op));
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<()> {
        self.parse_exponent()?;
        loop {
            let op = match self.current {
                Lexeme::Star => BinaryOperator::Multiply,
                Lexeme::Slash => BinaryOperator::Divide,
                _ => return Ok(()),
            };
            self.advance()?;
            self.parse_exponent()?;
            self.push(Token::Binary(op));
        }
    }

    fn parse_exponent(&mut self) -> ParseResult<()> {
        self.parse_unary()?;
        // Left associative: 2^3^2 is 64
        while self.current == Lexeme::Caret {
            self.advance()?;
            self.parse_unary()?;
            self.push(Token::Binary(BinaryOperator::Power));
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> ParseResult<()> {
        let prefix = match self.current {
            Lexeme::Minus => Some(UnaryOperator::Negate),
            Lexeme::Plus => Some(UnaryOperator::Plus),
            _ => None,
        };
        if let Some(op) = prefix {
            self.advance()?;
            self.parse_unary()?;
            self.push(Token::Unary(op));
            return Ok(());
        }

        self.parse_range()?;
        while self.current == Lexeme::Percent {
            self.advance()?;
            self.push(Token::Unary(UnaryOperator::Percent));
        }
        Ok(())
    }

    fn parse_range(&mut self) -> ParseResult<()> {
        let start = self.tokens.len();
        self.parse_primary()?;

        while self.current == Lexeme::Colon {
            let mid = self.tokens.len();
            self.advance()?;
            self.parse_primary()?;

            let merged = match (&self.tokens[start..mid], &self.tokens[mid..]) {
                ([Token::Ref(first)], [Token::Ref(last)])
                    if last.sheet.is_none() || last.sheet == first.sheet =>
                {
                    let area = Reference::area(first.first(), last.first());
                    Some(match &first.sheet {
                        Some(sheet) => area.with_sheet(sheet.clone()),
                        None => area,
                    })
                }
                _ => None,
            };

            match merged {
                Some(area) => {
                    self.tokens.truncate(start);
                    self.push(Token::Area(area));
                }
                None => self.push(Token::Binary(BinaryOperator::Range)),
            }
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> ParseResult<()> {
        match self.current.clone() {
            Lexeme::Number(n) => self.push(Token::Number(n)),
            Lexeme::Text(s) => self.push(Token::Text(s)),
            Lexeme::Boolean(b) => self.push(Token::Boolean(b)),
            Lexeme::Error(e) => self.push(Token::Error(e)),
            Lexeme::Cell(r) => self.push(Token::Ref(r)),
            Lexeme::Lines(r) => self.push(Token::Area(r)),
            Lexeme::Name(n) => self.push(Token::Name(n)),
            Lexeme::LeftParen => return self.parse_group(),
            Lexeme::LeftBrace => return self.parse_array(),
            Lexeme::Function(name) => return self.parse_function_call(name),
            _ => return Err(self.unexpected()),
        }
        self.advance()?;
        Ok(())
    }

    /// `(expr)` or a union `(expr,expr,...)`
    fn parse_group(&mut self) -> ParseResult<()> {
        self.advance()?;
        self.parse_expression()?;
        while self.current == Lexeme::Comma {
            self.advance()?;
            self.parse_expression()?;
            self.push(Token::Binary(BinaryOperator::Union));
        }
        self.expect(Lexeme::RightParen, ParseErrorKind::MissingCloseParen)?;
        self.push(Token::Paren);
        Ok(())
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<()> {
        self.advance()?;

        let mut arity = 0;
        if self.current == Lexeme::RightParen {
            self.advance()?;
            self.push(Token::Function { name, arity });
            return Ok(());
        }

        loop {
            if matches!(self.current, Lexeme::Comma | Lexeme::RightParen) {
                self.push(Token::Missing);
            } else {
                self.parse_expression()?;
            }
            arity += 1;

            match self.current {
                Lexeme::Comma => {
                    self.advance()?;
                }
                Lexeme::RightParen => {
                    self.advance()?;
                    break;
                }
                Lexeme::Eof => return Err(self.error(ParseErrorKind::MissingCloseParen)),
                _ => return Err(self.unexpected()),
            }
        }

        self.push(Token::Function { name, arity });
        Ok(())
    }

    /// `{1,2;3,4}`: constants only, rows of equal length
    fn parse_array(&mut self) -> ParseResult<()> {
        let open = self.token_start;
        self.advance()?;

        let mut rows: Vec<Vec<FormulaValue>> = Vec::new();
        let mut row = Vec::new();
        loop {
            row.push(self.parse_array_element()?);
            self.advance()?;
            match self.advance()? {
                Lexeme::Comma => {}
                Lexeme::Semicolon => rows.push(std::mem::take(&mut row)),
                Lexeme::RightBrace => {
                    rows.push(row);
                    break;
                }
                Lexeme::Eof => {
                    return Err(ParseError::new(self.base + open, ParseErrorKind::UnexpectedEnd))
                }
                other => {
                    return Err(ParseError::new(
                        self.base + self.token_start,
                        ParseErrorKind::UnexpectedToken(other.describe()),
                    ))
                }
            }
        }

        if rows.iter().any(|r| r.len() != rows[0].len()) {
            return Err(ParseError::new(self.base + open, ParseErrorKind::RaggedArray));
        }
        self.push(Token::Array(rows));
        Ok(())
    }

    /// One array constant; leaves its last lexeme as the current token
    fn parse_array_element(&mut self) -> ParseResult<FormulaValue> {
        let sign = match self.current {
            Lexeme::Minus => Some(-1.0),
            Lexeme::Plus => Some(1.0),
            _ => None,
        };
        if let Some(sign) = sign {
            self.advance()?;
            return match self.current {
                Lexeme::Number(n) => Ok(FormulaValue::Number(sign * n)),
                _ => Err(self.error(ParseErrorKind::InvalidArrayElement)),
            };
        }

        match &self.current {
            Lexeme::Number(n) => Ok(FormulaValue::Number(*n)),
            Lexeme::Text(s) => Ok(FormulaValue::String(s.clone())),
            Lexeme::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
            Lexeme::Error(e) => Ok(FormulaValue::Error(*e)),
            Lexeme::Eof => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            _ => Err(self.error(ParseErrorKind::InvalidArrayElement)),
        }
    }
}
