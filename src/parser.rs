// The reader: tokenizes Scheme source text and builds Value::Pair chains
// from it. 'x is sugar for (quote x), (a . b) builds an improper pair,
// everything else follows ordinary list syntax.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Result, SchemeError};
use crate::value::Value;

#[derive(Debug, Clone)]
enum Token {
    LParen,
    RParen,
    Quote,
    Dot,
    Symbol(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '(' | '[' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' | ']' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '\'' => {
                tokens.push(Token::Quote);
                chars.next();
            }
            '"' => tokens.push(tokenize_string(&mut chars)?),
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                for next_c in chars.by_ref() {
                    if next_c == '\n' {
                        break;
                    }
                }
            }
            '#' => {
                chars.next();
                match chars.next() {
                    Some('t') => tokens.push(Token::Bool(true)),
                    Some('f') => tokens.push(Token::Bool(false)),
                    Some(other) => {
                        return Err(SchemeError::Parser(format!(
                            "invalid boolean literal: #{other}"
                        )))
                    }
                    None => return Err(SchemeError::Parser("incomplete literal: #".to_string())),
                }
            }
            '.' if is_lone_dot(&chars) => {
                tokens.push(Token::Dot);
                chars.next();
            }
            c if c.is_ascii_digit() || (c == '-' && starts_number(&chars)) => {
                tokens.push(tokenize_number(&mut chars)?)
            }
            _ => tokens.push(tokenize_symbol(&mut chars)?),
        }
    }
    Ok(tokens)
}

fn is_lone_dot(chars: &Peekable<Chars<'_>>) -> bool {
    let mut clone = chars.clone();
    clone.next();
    matches!(clone.peek(), None) || clone.peek().is_some_and(|c| c.is_whitespace() || *c == '(' || *c == ')')
}

fn starts_number(chars: &Peekable<Chars<'_>>) -> bool {
    let mut clone = chars.clone();
    clone.next();
    clone.peek().is_some_and(|c| c.is_ascii_digit())
}

fn tokenize_string(chars: &mut Peekable<Chars<'_>>) -> Result<Token> {
    chars.next();
    let mut s = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(Token::Str(s)),
            Some('\\') => match chars.next() {
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some('\\') => s.push('\\'),
                Some('"') => s.push('"'),
                Some(other) => {
                    return Err(SchemeError::Parser(format!(
                        "invalid escape sequence: \\{other}"
                    )))
                }
                None => return Err(SchemeError::Parser("unterminated string literal".to_string())),
            },
            Some(c) => s.push(c),
            None => return Err(SchemeError::Parser("unterminated string literal".to_string())),
        }
    }
}

fn tokenize_number(chars: &mut Peekable<Chars<'_>>) -> Result<Token> {
    let mut raw = String::new();
    if chars.peek() == Some(&'-') {
        raw.push(chars.next().unwrap());
    }
    let mut is_float = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            raw.push(c);
            chars.next();
        } else if c == '.' && !is_float {
            is_float = true;
            raw.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if is_float {
        raw.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| SchemeError::Parser(format!("invalid number literal: {raw}")))
    } else {
        raw.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| SchemeError::Parser(format!("invalid number literal: {raw}")))
    }
}

fn tokenize_symbol(chars: &mut Peekable<Chars<'_>>) -> Result<Token> {
    let mut sym = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || "()[]'\";".contains(c) {
            break;
        }
        sym.push(c);
        chars.next();
    }
    if sym.is_empty() {
        let bad = chars.next().unwrap();
        return Err(SchemeError::Parser(format!("unexpected character: {bad}")));
    }
    Ok(Token::Symbol(sym))
}

struct Reader<'a> {
    tokens: Peekable<std::slice::Iter<'a, Token>>,
}

impl<'a> Reader<'a> {
    fn parse_expr(&mut self) -> Result<Value> {
        let token = self
            .tokens
            .next()
            .ok_or_else(|| SchemeError::Parser("unexpected end of input".to_string()))?;
        match token {
            Token::LParen => self.parse_list(),
            Token::Quote => {
                let expr = self.parse_expr()?;
                Ok(Value::list(vec![Value::symbol("quote"), expr]))
            }
            Token::RParen => Err(SchemeError::Parser("unexpected ')'".to_string())),
            Token::Dot => Err(SchemeError::Parser("unexpected '.'".to_string())),
            Token::Symbol(s) => Ok(Value::symbol(s.clone())),
            Token::Int(n) => Ok(Value::int(*n)),
            Token::Float(f) => Ok(Value::float(*f)),
            Token::Bool(b) => Ok(Value::Boolean(*b)),
            Token::Str(s) => Ok(Value::string(s.clone())),
        }
    }

    fn parse_list(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        let mut tail = Value::EmptyList;
        loop {
            match self.tokens.peek() {
                Some(Token::RParen) => {
                    self.tokens.next();
                    break;
                }
                Some(Token::Dot) => {
                    self.tokens.next();
                    tail = self.parse_expr()?;
                    match self.tokens.next() {
                        Some(Token::RParen) => break,
                        _ => return Err(SchemeError::Parser("expected ')' after dotted tail".to_string())),
                    }
                }
                Some(_) => items.push(self.parse_expr()?),
                None => return Err(SchemeError::Parser("unmatched '('".to_string())),
            }
        }
        let mut result = tail;
        for item in items.into_iter().rev() {
            result = Value::cons(item, result);
        }
        Ok(result)
    }
}

// Parse every top-level form in input.
pub fn parse(input: &str) -> Result<Vec<Value>> {
    let tokens = tokenize(input)?;
    let mut reader = Reader {
        tokens: tokens.iter().peekable(),
    };
    let mut forms = Vec::new();
    while reader.tokens.peek().is_some() {
        forms.push(reader.parse_expr()?);
    }
    Ok(forms)
}

// Parse input as exactly one top-level form.
pub fn parse_one(input: &str) -> Result<Value> {
    let mut forms = parse(input)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        0 => Err(SchemeError::Parser("no expression to read".to_string())),
        n => Err(SchemeError::Parser(format!(
            "expected a single expression, found {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atoms() {
        assert_eq!(parse_one("42").unwrap(), Value::int(42));
        assert_eq!(parse_one("-3.5").unwrap(), Value::float(-3.5));
        assert_eq!(parse_one("\"hi\\n\"").unwrap(), Value::string("hi\n"));
        assert_eq!(parse_one("#t").unwrap(), Value::Boolean(true));
        assert_eq!(parse_one("abc").unwrap(), Value::symbol("abc"));
    }

    #[test]
    fn parses_nested_lists() {
        let parsed = parse_one("(+ 1 (* 2 3))").unwrap();
        assert_eq!(
            parsed,
            Value::list(vec![
                Value::symbol("+"),
                Value::int(1),
                Value::list(vec![Value::symbol("*"), Value::int(2), Value::int(3)]),
            ])
        );
    }

    #[test]
    fn quote_sugar_desugars_to_quote_form() {
        assert_eq!(
            parse_one("'x").unwrap(),
            Value::list(vec![Value::symbol("quote"), Value::symbol("x")])
        );
    }

    #[test]
    fn dotted_pair_syntax_builds_an_improper_pair() {
        assert_eq!(
            parse_one("(1 . 2)").unwrap(),
            Value::cons(Value::int(1), Value::int(2))
        );
    }

    #[test]
    fn multiple_top_level_forms_are_all_returned() {
        let forms = parse("(define x 1) (define y 2)").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn unmatched_paren_is_a_parser_error() {
        assert!(parse_one("(+ 1 2").is_err());
    }
}
