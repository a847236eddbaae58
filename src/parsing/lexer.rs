//! Scanner for the script subset.

use super::pending_error::PendingCompilationError;
use super::token::Token;
use crate::messages::MessageTemplate;

/// A token with its absolute source span.
///
/// `newline_before` records whether a line terminator separated this token
/// from the previous one, which drives automatic semicolon insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub newline_before: bool,
}

/// Character-level scanner over one source range.
///
/// Positions are character offsets; `base` is added to every span so that
/// tokens carry positions in the coordinates of the whole script.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    base: usize,
    newline_before: bool,
}

type LexResult<T> = Result<T, PendingCompilationError>;

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

impl Lexer {
    pub fn new(source: Vec<char>, base: usize) -> Self {
        Lexer {
            source,
            pos: 0,
            base,
            newline_before: false,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn invalid(&self, start: usize) -> PendingCompilationError {
        let end = self.pos.max(start + 1).min(self.source.len()).max(start);
        PendingCompilationError::new(
            MessageTemplate::InvalidOrUnexpectedToken,
            self.base + start..self.base + end,
        )
    }

    /// Scans the whole range. The last token is always [`Token::Eos`].
    pub fn tokenize(mut self) -> LexResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eos;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        while let Some(ch) = self.current() {
            if is_line_terminator(ch) {
                self.newline_before = true;
                self.pos += 1;
            } else if ch.is_whitespace() {
                self.pos += 1;
            } else if ch == '/' && self.peek() == Some('/') {
                while let Some(c) = self.current() {
                    if is_line_terminator(c) {
                        break;
                    }
                    self.pos += 1;
                }
            } else if ch == '/' && self.peek() == Some('*') {
                let start = self.pos;
                self.pos += 2;
                loop {
                    match self.advance() {
                        Some('*') if self.current() == Some('/') => {
                            self.pos += 1;
                            break;
                        }
                        Some(c) if is_line_terminator(c) => self.newline_before = true,
                        Some(_) => {}
                        None => return Err(self.invalid(start)),
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> LexResult<Spanned> {
        self.newline_before = false;
        self.skip_trivia()?;

        let start = self.pos;
        let token = match self.current() {
            None => Token::Eos,
            Some(ch) if is_identifier_start(ch) => self.lex_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.lex_number()?,
            Some('.') if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
            Some(quote @ ('"' | '\'')) => self.lex_string(quote)?,
            Some(_) => self.lex_punctuator()?,
        };

        Ok(Spanned {
            token,
            start: self.base + start,
            end: self.base + self.pos,
            newline_before: self.newline_before,
        })
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.pos;
        while self.current().is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        let word: String = self.source[start..self.pos].iter().collect();
        Token::keyword(&word).unwrap_or(Token::Identifier(word))
    }

    fn lex_number(&mut self) -> LexResult<Token> {
        let start = self.pos;

        let value = if self.current() == Some('0') && matches!(self.peek(), Some('x' | 'X')) {
            self.pos += 2;
            let mut value = 0.0_f64;
            let mut digits = 0;
            while let Some(d) = self.current().and_then(|c| c.to_digit(16)) {
                value = value * 16.0 + f64::from(d);
                digits += 1;
                self.pos += 1;
            }
            if digits == 0 {
                return Err(self.invalid(start));
            }
            value
        } else {
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            if self.current() == Some('.') {
                self.pos += 1;
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            if matches!(self.current(), Some('e' | 'E')) {
                self.pos += 1;
                if matches!(self.current(), Some('+' | '-')) {
                    self.pos += 1;
                }
                if !self.current().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.invalid(start));
                }
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            let text: String = self.source[start..self.pos].iter().collect();
            text.parse::<f64>().map_err(|_| self.invalid(start))?
        };

        // `3in` and `1x` are not two tokens.
        if self.current().is_some_and(is_identifier_start) {
            self.pos += 1;
            return Err(self.invalid(start));
        }
        Ok(Token::Number(value))
    }

    fn lex_string(&mut self, quote: char) -> LexResult<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(self.invalid(start)),
                Some(ch) if ch == quote => break,
                Some(ch) if is_line_terminator(ch) => return Err(self.invalid(start)),
                Some('\\') => match self.advance() {
                    None => return Err(self.invalid(start)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some('v') => value.push('\u{b}'),
                    Some('0') => value.push('\0'),
                    Some('x') => value.push(self.lex_hex_escape(2, start)?),
                    Some('u') => value.push(self.lex_hex_escape(4, start)?),
                    // Line continuation
                    Some(c) if is_line_terminator(c) => {
                        if c == '\r' {
                            self.eat('\n');
                        }
                    }
                    Some(c) => value.push(c),
                },
                Some(ch) => value.push(ch),
            }
        }
        Ok(Token::String(value))
    }

    fn lex_hex_escape(&mut self, digits: usize, start: usize) -> LexResult<char> {
        let mut code = 0_u32;
        for _ in 0..digits {
            let digit = self
                .current()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.invalid(start))?;
            code = code * 16 + digit;
            self.pos += 1;
        }
        char::from_u32(code).ok_or_else(|| self.invalid(start))
    }

    fn lex_punctuator(&mut self) -> LexResult<Token> {
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(Token::Eos);
        };

        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Dot,
            '?' => Token::Question,
            ':' => Token::Colon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '~' => Token::Tilde,
            '^' => Token::BitXor,
            '&' if self.eat('&') => Token::And,
            '&' => Token::BitAnd,
            '|' if self.eat('|') => Token::Or,
            '|' => Token::BitOr,
            '=' if self.eat('=') => {
                if self.eat('=') {
                    Token::StrictEq
                } else {
                    Token::Eq
                }
            }
            '=' => Token::Assign,
            '!' if self.eat('=') => {
                if self.eat('=') {
                    Token::StrictNotEq
                } else {
                    Token::NotEq
                }
            }
            '!' => Token::Bang,
            '<' if self.eat('=') => Token::LtEq,
            '<' => Token::Lt,
            '>' if self.eat('=') => Token::GtEq,
            '>' => Token::Gt,
            _ => return Err(self.invalid(start)),
        };
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> LexResult<Vec<Token>> {
        Lexer::new(source.chars().collect(), 0)
            .tokenize()
            .map(|tokens| tokens.into_iter().map(|s| s.token).collect())
    }

    #[test]
    fn test_identifier_and_keywords() {
        assert_eq!(
            lex("var source = function").unwrap(),
            vec![
                Token::Var,
                Token::Identifier("source".into()),
                Token::Assign,
                Token::Function,
                Token::Eos,
            ]
        );
    }

    #[test]
    fn test_caret_sequence() {
        assert_eq!(
            lex("^^^").unwrap(),
            vec![Token::BitXor, Token::BitXor, Token::BitXor, Token::Eos]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("1 2.5 .5 0x1F 1e3").unwrap(),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(31.0),
                Token::Number(1000.0),
                Token::Eos,
            ]
        );
    }

    #[test]
    fn test_number_followed_by_identifier_is_invalid() {
        let err = lex("3in").unwrap_err();
        assert_eq!(err.template(), MessageTemplate::InvalidOrUnexpectedToken);
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            lex(r#"'a\n' "b\x41B""#).unwrap(),
            vec![
                Token::String("a\n".into()),
                Token::String("bAB".into()),
                Token::Eos,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex("'abc").unwrap_err();
        assert_eq!(err.template(), MessageTemplate::InvalidOrUnexpectedToken);
        assert_eq!(err.location().start, 0);
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            lex("=== !== == != <= >= && || = !").unwrap(),
            vec![
                Token::StrictEq,
                Token::StrictNotEq,
                Token::Eq,
                Token::NotEq,
                Token::LtEq,
                Token::GtEq,
                Token::And,
                Token::Or,
                Token::Assign,
                Token::Bang,
                Token::Eos,
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = Lexer::new("a // c\n/* x\n */ b /* y */ c".chars().collect(), 0)
            .tokenize()
            .unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert!(!tokens[2].newline_before);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(lex("/* never closed").is_err());
    }

    #[test]
    fn test_illegal_character() {
        let err = lex("a @ b").unwrap_err();
        assert_eq!(err.template(), MessageTemplate::InvalidOrUnexpectedToken);
        assert_eq!(err.location(), 2..3);
    }

    #[test]
    fn test_spans_are_offset_by_base() {
        let tokens = Lexer::new("ab cd".chars().collect(), 10).tokenize().unwrap();
        assert_eq!((tokens[0].start, tokens[0].end), (10, 12));
        assert_eq!((tokens[1].start, tokens[1].end), (13, 15));
        assert_eq!((tokens[2].start, tokens[2].end), (15, 15));
    }
}
