//! Tokens of the script subset.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// A lexical token.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals and names
    Identifier(String),
    Number(f64),
    String(String),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    True,
    False,
    Null,
    Typeof,

    // Punctuators
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Question,
    Colon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    /// End of the source range.
    Eos,
}

static KEYWORDS: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    HashMap::from([
        ("var", Token::Var),
        ("let", Token::Let),
        ("const", Token::Const),
        ("function", Token::Function),
        ("return", Token::Return),
        ("if", Token::If),
        ("else", Token::Else),
        ("while", Token::While),
        ("true", Token::True),
        ("false", Token::False),
        ("null", Token::Null),
        ("typeof", Token::Typeof),
    ])
});

impl Token {
    /// Returns the keyword token spelled `word`, if any.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Token> {
        KEYWORDS.get(word).cloned()
    }

    /// Returns the keyword spelling if this token is a keyword.
    #[must_use]
    pub fn as_keyword(&self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, token)| *token == self)
            .map(|(word, _)| *word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = self.as_keyword() {
            return f.write_str(word);
        }
        let text = match self {
            Token::Identifier(name) => return f.write_str(name),
            Token::Number(n) => return write!(f, "{n}"),
            Token::String(s) => return write!(f, "\"{s}\""),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::BitAnd => "&",
            Token::BitOr => "|",
            Token::BitXor => "^",
            Token::And => "&&",
            Token::Or => "||",
            Token::Eq => "==",
            Token::NotEq => "!=",
            Token::StrictEq => "===",
            Token::StrictNotEq => "!==",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Eos => "end of input",
            _ => "",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Token::keyword("function"), Some(Token::Function));
        assert_eq!(Token::keyword("source"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::BitXor.to_string(), "^");
        assert_eq!(Token::StrictNotEq.to_string(), "!==");
        assert_eq!(Token::Return.to_string(), "return");
        assert_eq!(Token::Identifier("x".into()).to_string(), "x");
    }
}
