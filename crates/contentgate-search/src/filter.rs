//! OData `$filter` parser.
//!
//! # Syntax
//!
//! ```text
//! filter     = orExp
//! orExp      = andExp *("or" andExp)
//! andExp     = notExp *("and" notExp)
//! notExp     = ["not"] primary
//! primary    = "(" filter ")" / call [boolCmp] / path compareOp value
//! call       = name "(" [arg *("," arg)] ")"
//! boolCmp    = ("eq" / "ne") ("true" / "false")
//! compareOp  = "eq" / "ne" / "lt" / "le" / "gt" / "ge"
//! value      = 'string' / number / token
//! ```
//!
//! Supported functions: `isof('Type')`, `contains(Field,'x')`,
//! `substringof('x',Field)`, `startswith(Field,'x')`, `endswith(Field,'x')`.
//!
//! # Examples
//!
//! ```text
//! isof('User')
//! Name eq 'Admin' and Index gt 3
//! contains(DisplayName,'john') or startswith(Name,'j')
//! not (Hidden eq true)
//! Manager/Name eq 'Smith'
//! ```

use crate::error::TranslateError;
use crate::expression::{CompareOp, FilterExpressionNode};

/// Maximum parenthesis nesting accepted in a `$filter`.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of terms accepted in a `$filter`.
pub const MAX_FILTER_TERMS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    QuotedString(String),
    Number(String),
    OpenParen,
    CloseParen,
    Comma,
    And,
    Or,
    Not,
    Operator(CompareOp),
    Eof,
}

/// Tokenizer for filter expressions.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    /// Returns the next token and the byte offset it starts at.
    fn next_token(&mut self) -> Result<(Token, usize), TranslateError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(ch) = self.peek_char() else {
            return Ok((Token::Eof, start));
        };

        match ch {
            '(' => {
                self.pos += 1;
                return Ok((Token::OpenParen, start));
            }
            ')' => {
                self.pos += 1;
                return Ok((Token::CloseParen, start));
            }
            ',' => {
                self.pos += 1;
                return Ok((Token::Comma, start));
            }
            '\'' | '"' => return self.quoted(ch, start).map(|t| (t, start)),
            _ => {}
        }

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ':' | '/' | '$') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(TranslateError::syntax(
                format!("Unexpected character '{ch}'"),
                start,
            ));
        }

        let word = &self.input[start..self.pos];
        let token = match word.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => {
                if let Some(op) = CompareOp::from_keyword(word) {
                    Token::Operator(op)
                } else if word.starts_with(|c: char| c.is_ascii_digit() || c == '-')
                    && word
                        .chars()
                        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'))
                {
                    Token::Number(word.to_string())
                } else {
                    Token::Identifier(word.to_string())
                }
            }
        };
        Ok((token, start))
    }

    /// Read a quoted literal; a doubled quote stands for one quote character.
    fn quoted(&mut self, quote: char, start: usize) -> Result<Token, TranslateError> {
        self.pos += quote.len_utf8();
        let mut value = String::new();
        while let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == quote {
                if self.peek_char() == Some(quote) {
                    self.pos += quote.len_utf8();
                    value.push(quote);
                    continue;
                }
                return Ok(Token::QuotedString(value));
            }
            value.push(c);
        }
        Err(TranslateError::syntax("Unterminated string literal", start))
    }
}

/// A function-call argument.
#[derive(Debug, Clone)]
enum Arg {
    Field(String),
    Literal(String),
}

/// Parser for filter expressions.
struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Token,
    position: usize,
    /// Open parentheses around the current token
    depth: usize,
    terms: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, TranslateError> {
        let mut tokenizer = Tokenizer::new(input);
        let (current, position) = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            current,
            position,
            depth: 0,
            terms: 0,
        })
    }

    fn advance(&mut self) -> Result<(), TranslateError> {
        let (token, position) = self.tokenizer.next_token()?;
        self.current = token;
        self.position = position;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> TranslateError {
        TranslateError::syntax(message, self.position)
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), TranslateError> {
        if self.current != token {
            return Err(self.error(format!("Expected {what}")));
        }
        self.advance()
    }

    fn parse(&mut self) -> Result<FilterExpressionNode, TranslateError> {
        self.parse_or()
    }

    /// Parse OR expressions (lowest precedence).
    fn parse_or(&mut self) -> Result<FilterExpressionNode, TranslateError> {
        let mut left = self.parse_and()?;
        while self.current == Token::Or {
            self.advance()?;
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<FilterExpressionNode, TranslateError> {
        let mut left = self.parse_not()?;
        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_not()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<FilterExpressionNode, TranslateError> {
        if self.current == Token::Not {
            self.advance()?;
            let expr = self.parse_primary()?;
            return Ok(expr.not());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<FilterExpressionNode, TranslateError> {
        if self.current == Token::OpenParen {
            if self.depth >= MAX_NESTING_DEPTH {
                return Err(self.error("Filter nesting too deep"));
            }
            self.depth += 1;
            self.advance()?;
            let expr = self.parse()?;
            self.expect(Token::CloseParen, "')'")?;
            self.depth -= 1;
            return Ok(expr);
        }

        self.terms += 1;
        if self.terms > MAX_FILTER_TERMS {
            return Err(self.error("Filter has too many terms"));
        }

        let name = match &self.current {
            Token::Identifier(s) => s.clone(),
            _ => return Err(self.error("Expected field name or function")),
        };
        let name_position = self.position;
        self.advance()?;

        if self.current == Token::OpenParen {
            let args = self.parse_args()?;
            let call = build_call(&name, args, name_position)?;
            return self.parse_bool_comparison(call);
        }

        let op = match &self.current {
            Token::Operator(op) => *op,
            _ => return Err(self.error("Expected comparison operator")),
        };
        self.advance()?;

        let value = match &self.current {
            Token::QuotedString(s) | Token::Identifier(s) | Token::Number(s) => s.clone(),
            _ => return Err(self.error("Expected value")),
        };
        self.advance()?;

        Ok(FilterExpressionNode::comparison(name, op, value))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, TranslateError> {
        self.expect(Token::OpenParen, "'('")?;
        let mut args = Vec::new();
        if self.current == Token::CloseParen {
            self.advance()?;
            return Ok(args);
        }
        loop {
            let arg = match &self.current {
                Token::Identifier(s) => Arg::Field(s.clone()),
                Token::QuotedString(s) | Token::Number(s) => Arg::Literal(s.clone()),
                _ => return Err(self.error("Expected function argument")),
            };
            args.push(arg);
            self.advance()?;
            match self.current {
                Token::Comma => self.advance()?,
                Token::CloseParen => {
                    self.advance()?;
                    return Ok(args);
                }
                _ => return Err(self.error("Expected ',' or ')'")),
            }
        }
    }

    /// Handle an optional `eq true` / `ne false` suffix on a boolean function.
    fn parse_bool_comparison(
        &mut self,
        call: FilterExpressionNode,
    ) -> Result<FilterExpressionNode, TranslateError> {
        let op = match self.current {
            Token::Operator(op @ (CompareOp::Eq | CompareOp::Ne)) => op,
            Token::Operator(_) => return Err(self.error("Only eq/ne can follow a function")),
            _ => return Ok(call),
        };
        self.advance()?;

        let expected = match &self.current {
            Token::Identifier(s) if s.eq_ignore_ascii_case("true") => true,
            Token::Identifier(s) if s.eq_ignore_ascii_case("false") => false,
            _ => return Err(self.error("Expected true or false")),
        };
        self.advance()?;

        let positive = (op == CompareOp::Eq) == expected;
        Ok(if positive { call } else { call.not() })
    }
}

fn build_call(
    name: &str,
    args: Vec<Arg>,
    position: usize,
) -> Result<FilterExpressionNode, TranslateError> {
    let function = name.to_lowercase();
    let arity_error = |expected: usize| {
        TranslateError::syntax(
            format!("{name}() expects {expected} argument(s), got {}", args.len()),
            position,
        )
    };

    match function.as_str() {
        "isof" => match args.as_slice() {
            [Arg::Literal(type_name)] => Ok(FilterExpressionNode::type_is(type_name.clone())),
            [_] => Err(TranslateError::syntax(
                "isof() expects a quoted type name",
                position,
            )),
            _ => Err(arity_error(1)),
        },
        "contains" | "startswith" | "endswith" => {
            let op = match function.as_str() {
                "contains" => CompareOp::Contains,
                "startswith" => CompareOp::StartsWith,
                _ => CompareOp::EndsWith,
            };
            match args.as_slice() {
                [Arg::Field(field), Arg::Literal(value)] => {
                    Ok(FilterExpressionNode::comparison(field.clone(), op, value.clone()))
                }
                [_, _] => Err(TranslateError::syntax(
                    format!("{name}() expects a field and a literal"),
                    position,
                )),
                _ => Err(arity_error(2)),
            }
        }
        "substringof" => match args.as_slice() {
            [Arg::Literal(value), Arg::Field(field)] => Ok(FilterExpressionNode::comparison(
                field.clone(),
                CompareOp::Contains,
                value.clone(),
            )),
            [_, _] => Err(TranslateError::syntax(
                "substringof() expects a literal and a field",
                position,
            )),
            _ => Err(arity_error(2)),
        },
        _ => Err(TranslateError::UnsupportedFunction(name.to_string())),
    }
}

/// Parse a `$filter` expression string.
pub fn parse_filter(input: &str) -> Result<FilterExpressionNode, TranslateError> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse()?;

    if parser.current != Token::Eof {
        return Err(parser.error("Unexpected tokens after expression"));
    }

    Ok(expr)
}
