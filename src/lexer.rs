//! PDF tokenizer.
//!
//! Splits raw PDF bytes into tokens: numbers, literal and hex strings, names,
//! keywords and delimiters. Whitespace (space, `\t`, `\r`, `\n`, `\0`, `\f`)
//! and `%` comments between tokens are skipped.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    sequence::{delimited, preceded},
    IResult,
};

/// Token types recognized by the lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),
    /// Real number (e.g., 3.5, -.002)
    Real(f64),
    /// Raw bytes between `(` and `)`, escapes not yet decoded
    LiteralString(&'a [u8]),
    /// Raw bytes between `<` and `>`
    HexString(&'a [u8]),
    /// Name with `#xx` escapes decoded
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `obj`
    ObjStart,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamStart,
    /// `endstream`
    StreamEnd,
    /// `R`
    R,
}

/// PDF whitespace bytes.
pub(crate) fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(c: u8) -> bool {
    matches!(c, b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}')
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip any run of whitespace and comments.
pub(crate) fn skip_ws(input: &[u8]) -> &[u8] {
    let mut remaining = input;
    loop {
        let (rest, ws) = take_while::<_, _, nom::error::Error<&[u8]>>(is_pdf_whitespace)(remaining)
            .unwrap_or((remaining, &[][..]));
        remaining = rest;
        match comment(remaining) {
            Ok((rest, _)) => remaining = rest,
            Err(_) if ws.is_empty() => return remaining,
            Err(_) => {},
        }
    }
}

fn digit_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
}

fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, sign) = opt(one_of("+-"))(input)?;
    let (rest, int_part) = opt(digit1)(rest)?;
    let (rest, frac_part) = opt(preceded(char('.'), opt(digit1)))(rest)?;

    if int_part.is_none() && frac_part.is_none() {
        return Err(digit_error(input));
    }

    let negative = sign == Some('-');
    let int_str = int_part
        .map(|b| std::str::from_utf8(b).map_err(|_| digit_error(input)))
        .transpose()?;

    match frac_part {
        Some(frac) => {
            let frac_str = frac
                .map(|b| std::str::from_utf8(b).map_err(|_| digit_error(input)))
                .transpose()?;
            let text = format!("{}.{}", int_str.unwrap_or("0"), frac_str.unwrap_or("0"));
            let num: f64 = text.parse().map_err(|_| digit_error(input))?;
            Ok((rest, Token::Real(if negative { -num } else { num })))
        },
        None => {
            let digits = int_str.ok_or_else(|| digit_error(input))?;
            let num: i64 = match digits.parse() {
                Ok(n) => n,
                // Out-of-range integers degrade to reals instead of failing the object.
                Err(_) => {
                    let real: f64 = digits.parse().map_err(|_| digit_error(input))?;
                    return Ok((rest, Token::Real(if negative { -real } else { real })));
                },
            };
            Ok((rest, Token::Integer(if negative { -num } else { num })))
        },
    }
}

/// Literal string with balanced parentheses; escapes are left for the parser.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0;

    while pos < body.len() {
        match body[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[pos + 1..], Token::LiteralString(&body[..pos])));
                }
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)))
}

fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_pdf_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode `#xx` escapes in a name.
///
/// ```
/// # use pdf_annotator::lexer::decode_name_escapes;
/// assert_eq!(decode_name_escapes(b"A#20B"), "A B");
/// assert_eq!(decode_name_escapes(b"A#"), "A#");
/// ```
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = &raw[i + 1..i + 3];
            if let Some(byte) = std::str::from_utf8(hex)
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok())
            {
                bytes.push(byte);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| !is_pdf_whitespace(c) && !is_delimiter(c)),
            |bytes| Token::Name(decode_name_escapes(bytes)),
        ),
    )(input)
}

/// Keywords must not run into a regular character (`nullx` is not `null`).
fn keyword<'a>(
    word: &'static [u8],
    tok: Token<'static>,
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], Token<'a>> {
    move |input: &'a [u8]| {
        let (rest, _) = tag::<_, _, nom::error::Error<&'a [u8]>>(word)(input)?;
        match rest.first() {
            Some(&c) if !is_pdf_whitespace(c) && !is_delimiter(c) => Err(nom::Err::Error(
                nom::error::Error::new(input, nom::error::ErrorKind::Tag),
            )),
            _ => Ok((rest, tok.clone())),
        }
    }
}

fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        keyword(b"false", Token::False),
        keyword(b"true", Token::True),
        keyword(b"null", Token::Null),
        keyword(b"obj", Token::ObjStart),
        keyword(b"endobj", Token::ObjEnd),
        keyword(b"endstream", Token::StreamEnd),
        keyword(b"stream", Token::StreamStart),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        keyword(b"R", Token::R),
    ))(input)
}

/// Parse a single token after skipping whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_ws(input);
    alt((parse_keyword, parse_name, parse_number, parse_literal_string, parse_hex_string))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Numbers
    // ========================================================================

    #[test]
    fn test_integers() {
        assert_eq!(token(b"42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"-123"), Ok((&b""[..], Token::Integer(-123))));
        assert_eq!(token(b"+7 "), Ok((&b" "[..], Token::Integer(7))));
    }

    #[test]
    fn test_reals() {
        assert_eq!(token(b"-2.5"), Ok((&b""[..], Token::Real(-2.5))));
        assert_eq!(token(b".5"), Ok((&b""[..], Token::Real(0.5))));
        assert_eq!(token(b"5."), Ok((&b""[..], Token::Real(5.0))));
        assert_eq!(token(b"841.8898"), Ok((&b""[..], Token::Real(841.8898))));
    }

    #[test]
    fn test_huge_integer_becomes_real() {
        let (_, tok) = token(b"99999999999999999999").unwrap();
        assert!(matches!(tok, Token::Real(_)));
    }

    // ========================================================================
    // Strings and names
    // ========================================================================

    #[test]
    fn test_literal_string_nested() {
        assert_eq!(
            token(b"(made (in) India)"),
            Ok((&b""[..], Token::LiteralString(b"made (in) India")))
        );
    }

    #[test]
    fn test_literal_string_escaped_paren() {
        assert_eq!(token(br"(a\)b)"), Ok((&b""[..], Token::LiteralString(br"a\)b"))));
    }

    #[test]
    fn test_unbalanced_literal_string() {
        assert!(token(b"(open").is_err());
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(token(b"<FEFF 0041>"), Ok((&b""[..], Token::HexString(b"FEFF 0041"))));
    }

    #[test]
    fn test_names() {
        assert_eq!(token(b"/Subtype"), Ok((&b""[..], Token::Name("Subtype".into()))));
        assert_eq!(token(b"/FreeText/Text"), Ok((&b"/Text"[..], Token::Name("FreeText".into()))));
        assert_eq!(token(b"/A#20B"), Ok((&b""[..], Token::Name("A B".into()))));
    }

    // ========================================================================
    // Keywords and delimiters
    // ========================================================================

    #[test]
    fn test_keywords() {
        assert_eq!(token(b"true"), Ok((&b""[..], Token::True)));
        assert_eq!(token(b"null]"), Ok((&b"]"[..], Token::Null)));
        assert_eq!(token(b"endobj"), Ok((&b""[..], Token::ObjEnd)));
        assert_eq!(token(b"endstream"), Ok((&b""[..], Token::StreamEnd)));
        assert_eq!(token(b"<<"), Ok((&b""[..], Token::DictStart)));
        assert_eq!(token(b"R>>"), Ok((&b">>"[..], Token::R)));
    }

    #[test]
    fn test_keyword_prefix_is_not_keyword() {
        assert!(token(b"nullx").is_err());
    }

    #[test]
    fn test_skips_whitespace_and_comments() {
        assert_eq!(
            token(b"  % a comment\r\n\t 12"),
            Ok((&b""[..], Token::Integer(12)))
        );
    }
}
