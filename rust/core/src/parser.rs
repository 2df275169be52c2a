// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP/IFC Parser using nom
//!
//! Zero-copy tokenization of entity instances and a statement scanner that
//! respects quoted strings.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// STEP/IFC Token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: #123
    EntityRef(u32),
    /// String literal as written in the file (escapes not yet decoded)
    String(&'a str),
    /// Integer: 42
    Integer(i64),
    /// Float: 3.14
    Float(f64),
    /// Enum: .TRUE., .FALSE., .UNKNOWN.
    Enum(&'a str),
    /// List: (1, 2, 3)
    List(Vec<Token<'a>>),
    /// Typed value: IFCLABEL('x'), IFCBOOLEAN(.T.)
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value: $
    Null,
    /// Asterisk (derived value): *
    Derived,
}

/// Parse entity reference: #123
fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        Token::EntityRef,
    )(input)
}

/// Parse string literal: 'text' or "binary"
/// STEP doubles the quote character to escape it inside a string.
fn string_literal(input: &str) -> IResult<&str, Token> {
    fn parse_string_content(input: &str, quote: u8) -> IResult<&str, &str> {
        let bytes = input.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == quote {
                if i + 1 < bytes.len() && bytes[i + 1] == quote {
                    i += 2;
                    continue;
                }
                return Ok((&input[i..], &input[..i]));
            }
            i += 1;
        }

        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )))
    }

    alt((
        map(
            delimited(char('\''), |i| parse_string_content(i, b'\''), char('\'')),
            Token::String,
        ),
        map(
            delimited(char('"'), |i| parse_string_content(i, b'"'), char('"')),
            Token::String,
        ),
    ))(input)
}

/// Parse integer: 42, -42, +42
fn integer(input: &str) -> IResult<&str, Token> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>().map(Token::Integer)
    })(input)
}

/// Parse float: 3.14, -3.14, 1.5E-10, 0.
/// STEP allows a trailing dot without fraction digits.
fn float(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().map(Token::Float),
    )(input)
}

/// Parse enum: .T., .F., .U., .NOTDEFINED.
fn enum_value(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )(input)
}

/// Parse null: $
fn null(input: &str) -> IResult<&str, Token> {
    map(char('$'), |_| Token::Null)(input)
}

/// Parse derived: *
fn derived(input: &str) -> IResult<&str, Token> {
    map(char('*'), |_| Token::Derived)(input)
}

/// Parse typed value: IFCLABEL('Concrete'), IFCBOOLEAN(.T.)
fn typed_value(input: &str) -> IResult<&str, Token> {
    map(
        pair(
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            delimited(
                char('('),
                separated_list0(delimited(ws, char(','), ws), token),
                char(')'),
            ),
        ),
        |(type_name, args)| Token::TypedValue(type_name, args),
    )(input)
}

/// Skip whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

/// Parse a token with optional surrounding whitespace
fn token(input: &str) -> IResult<&str, Token> {
    delimited(
        ws,
        alt((
            float, // float before integer: both start with digits
            integer,
            entity_ref,
            string_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

/// Parse list: (1, 2, 3) or nested lists
fn list(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('('),
            separated_list0(delimited(ws, char(','), ws), token),
            char(')'),
        ),
        Token::List,
    )(input)
}

/// Parse a complete entity instance.
///
/// Example: `#123=IFCWALL('guid',#2,'name',$,$,$,$,$);`
/// Returns the instance id, the upper-case type keyword and the attribute tokens.
pub fn parse_entity(input: &str) -> Result<(u32, &str, Vec<Token>)> {
    let result: IResult<&str, (u32, &str, Vec<Token>)> = tuple((
        delimited(
            ws,
            preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
            ws,
        ),
        preceded(
            char('='),
            delimited(
                ws,
                take_while1(|c: char| c.is_alphanumeric() || c == '_'),
                ws,
            ),
        ),
        delimited(
            char('('),
            separated_list0(delimited(ws, char(','), ws), token),
            tuple((char(')'), ws, char(';'))),
        ),
    ))(input);

    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(Error::parse(0, format!("Failed to parse entity: {}", e))),
    }
}

/// Find the end of the statement that contains `from`.
///
/// Returns the byte offset just past the terminating `;`. Semicolons inside
/// quoted strings do not terminate a statement.
pub fn find_statement_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    let mut in_string = false;

    while pos < bytes.len() {
        if in_string {
            let offset = memchr::memchr(b'\'', &bytes[pos..])?;
            pos += offset + 1;
            in_string = false;
        } else {
            let offset = memchr::memchr2(b'\'', b';', &bytes[pos..])?;
            pos += offset;
            if bytes[pos] == b';' {
                return Some(pos + 1);
            }
            in_string = true;
            pos += 1;
        }
    }

    None
}

/// Byte offset of the first statement after the `DATA;` marker (0 if absent).
pub fn data_section_start(content: &str) -> usize {
    memchr::memmem::find(content.as_bytes(), b"DATA;")
        .map(|offset| offset + "DATA;".len())
        .unwrap_or(0)
}

/// Fast entity scanner - walks statements without decoding attributes
pub struct EntityScanner<'a> {
    content: &'a str,
    position: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned at the start of the DATA section
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            position: data_section_start(content),
        }
    }

    /// Scan for the next entity instance
    /// Returns (entity_id, type_name, line_start, line_end)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        loop {
            let offset = memchr::memchr(b'#', &bytes[self.position..])?;
            let line_start = self.position + offset;

            let Some(line_end) = find_statement_end(bytes, line_start) else {
                self.position = bytes.len();
                return None;
            };
            self.position = line_end;

            let mut pos = line_start + 1;
            while pos < line_end && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let Ok(id) = self.content[line_start + 1..pos].parse::<u32>() else {
                continue;
            };

            while pos < line_end && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= line_end || bytes[pos] != b'=' {
                continue;
            }
            pos += 1;
            while pos < line_end && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            let type_start = pos;
            while pos < line_end && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            if pos == type_start {
                // Complex instance: #1=(IFCA() IFCB());
                continue;
            }

            return Some((id, &self.content[type_start..pos], line_start, line_end));
        }
    }
}
