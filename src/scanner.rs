use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Pos {
    pub offset_in_line: usize,
    pub line: usize,
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.offset_in_line + 1)
    }
}

#[derive(Clone, Error, Debug, PartialEq, Eq)]
#[error("scan error: {} at {pos}", .error.message())]
pub struct ScanError {
    pub error: ScanErrorType,
    pub pos: Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanErrorType {
    UnterminatedString,
    UnrecognizedToken,
}

impl ScanErrorType {
    pub fn message(&self) -> &'static str {
        match self {
            ScanErrorType::UnterminatedString => "unterminated string",
            ScanErrorType::UnrecognizedToken => "unrecognized token",
        }
    }
}

/// A token in the input stream
/// Note that pos is always defined, but in the case of EOF will describe a location
/// potentially off the end of the input stream
#[derive(Debug, PartialEq, Clone)]
pub struct Token<'code> {
    pub data: TokenType<'code>,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType<'code> {
    Symbol(Symbol),
    Keyword(Keyword),
    Identifier(&'code str),
    String(&'code str),
    Number(f64),
    Eof,
}

impl<'code> PartialEq<Symbol> for TokenType<'code> {
    fn eq(&self, other: &Symbol) -> bool {
        matches!(self, TokenType::Symbol(symbol) if symbol == other)
    }
}

impl<'code> PartialEq<Keyword> for TokenType<'code> {
    fn eq(&self, other: &Keyword) -> bool {
        matches!(self, TokenType::Keyword(keyword) if keyword == other)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Symbol {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    And,
    Break,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
}

const KEYWORD_LITERAL_TO_SYMBOL: [(&str, Keyword); 17] = [
    ("and", Keyword::And),
    ("break", Keyword::Break),
    ("class", Keyword::Class),
    ("else", Keyword::Else),
    ("false", Keyword::False),
    ("fun", Keyword::Fun),
    ("for", Keyword::For),
    ("if", Keyword::If),
    ("nil", Keyword::Nil),
    ("or", Keyword::Or),
    ("print", Keyword::Print),
    ("return", Keyword::Return),
    ("super", Keyword::Super),
    ("this", Keyword::This),
    ("true", Keyword::True),
    ("var", Keyword::Var),
    ("while", Keyword::While),
];

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone)]
pub struct Scanner<'lex> {
    code: &'lex str,
    code_iter: Peekable<CharIndices<'lex>>,
    emitted_eof: bool, // Have we sent the EOF yet

    line: usize,
    offset_in_line: usize,
}

impl<'lex> Scanner<'lex> {
    pub fn new(code: &'lex str) -> Scanner<'lex> {
        Scanner {
            code,
            code_iter: code.char_indices().peekable(),
            emitted_eof: false,
            line: 0,
            offset_in_line: 0,
        }
    }

    fn current_pos(&self) -> Pos {
        Pos {
            line: self.line,
            offset_in_line: self.offset_in_line,
        }
    }

    // Byte offset of the next unconsumed character
    fn next_offset(&mut self) -> usize {
        self.code_iter
            .peek()
            .map(|(offset, _)| *offset)
            .unwrap_or(self.code.len())
    }

    fn consume_next_char_if_eq(&mut self, next_ch: char) -> bool {
        self.code_iter.next_if(|(_, ch)| *ch == next_ch).is_some()
    }

    fn consume_next_char_if_neq(&mut self, not_next_ch: char) -> bool {
        self.code_iter
            .next_if(|(_, ch)| *ch != not_next_ch)
            .is_some()
    }

    fn consume_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while self.code_iter.next_if(|(_, ch)| predicate(*ch)).is_some() {}
    }

    fn gobble_whitespace(&mut self) {
        loop {
            if self
                .code_iter
                .next_if(|(_, ch)| WS_CHARS.contains(*ch))
                .is_some()
            {
                self.offset_in_line += 1;
            } else if self.consume_next_char_if_eq('\n') {
                self.offset_in_line = 0;
                self.line += 1;
            } else {
                break;
            }
        }
    }

    fn symbol(&mut self, symbol: Symbol, pos: Pos, len: usize) -> Token<'lex> {
        self.offset_in_line += len;
        Token {
            data: TokenType::Symbol(symbol),
            pos,
        }
    }

    // Tokens like '!' that may be extended into '!=' by a following '='
    fn symbol_with_eq(&mut self, plain: Symbol, with_eq: Symbol, pos: Pos) -> Token<'lex> {
        if self.consume_next_char_if_eq('=') {
            self.symbol(with_eq, pos, 2)
        } else {
            self.symbol(plain, pos, 1)
        }
    }

    fn number(&mut self, offset: usize, pos: Pos) -> Token<'lex> {
        self.consume_while(|ch| ch.is_ascii_digit());
        // Only take the '.' if a digit follows it, otherwise it belongs to a property access
        let mut lookahead = self.code_iter.clone();
        if let (Some((_, '.')), Some((_, digit))) = (lookahead.next(), lookahead.next()) {
            if digit.is_ascii_digit() {
                self.code_iter.next();
                self.consume_while(|ch| ch.is_ascii_digit());
            }
        }
        let end = self.next_offset();
        let literal = &self.code[offset..end];
        self.offset_in_line += literal.len();
        // The slice holds only ascii digits and at most one interior '.'
        let number = literal.parse::<f64>().unwrap_or(f64::NAN);
        Token {
            data: TokenType::Number(number),
            pos,
        }
    }

    fn string(&mut self, offset: usize, pos: Pos) -> Result<Token<'lex>, ScanError> {
        self.offset_in_line += 1;
        // Strings are multiline, so we need to track whether or not we cross a newline
        let mut end = None;
        for (char_offset, ch) in self.code_iter.by_ref() {
            match ch {
                '\n' => {
                    self.offset_in_line = 0;
                    self.line += 1;
                }
                '"' => {
                    self.offset_in_line += 1;
                    end = Some(char_offset);
                    break;
                }
                _ => self.offset_in_line += 1,
            }
        }
        match end {
            // Skip over the leading quote which is a single byte
            Some(end) => Ok(Token {
                data: TokenType::String(&self.code[offset + 1..end]),
                pos,
            }),
            None => Err(ScanError {
                error: ScanErrorType::UnterminatedString,
                pos,
            }),
        }
    }

    fn identifier(&mut self, offset: usize, pos: Pos) -> Token<'lex> {
        self.consume_while(|ch| ch.is_alphanumeric() || ch == '_');
        let end = self.next_offset();
        let identifier = &self.code[offset..end];
        self.offset_in_line += identifier.chars().count();
        let data = match KEYWORD_LITERAL_TO_SYMBOL
            .iter()
            .find(|(lit, _)| *lit == identifier)
        {
            Some((_, kw)) => TokenType::Keyword(*kw),
            None => TokenType::Identifier(identifier),
        };
        Token { data, pos }
    }
}

const WS_CHARS: &str = " \r\t";

impl<'lex> Iterator for Scanner<'lex> {
    type Item = Result<Token<'lex>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.current_pos();
        let Some((offset, ch)) = self.code_iter.next() else {
            if self.emitted_eof {
                return None;
            }
            self.emitted_eof = true;
            return Some(Ok(Token {
                data: TokenType::Eof,
                pos,
            }));
        };
        let token = match ch {
            '(' => self.symbol(Symbol::LeftParen, pos, 1),
            ')' => self.symbol(Symbol::RightParen, pos, 1),
            '{' => self.symbol(Symbol::LeftBrace, pos, 1),
            '}' => self.symbol(Symbol::RightBrace, pos, 1),
            '[' => self.symbol(Symbol::LeftBracket, pos, 1),
            ']' => self.symbol(Symbol::RightBracket, pos, 1),
            ',' => self.symbol(Symbol::Comma, pos, 1),
            '.' => self.symbol(Symbol::Dot, pos, 1),
            '-' => self.symbol(Symbol::Minus, pos, 1),
            '+' => self.symbol(Symbol::Plus, pos, 1),
            ';' => self.symbol(Symbol::Semicolon, pos, 1),
            '*' => self.symbol(Symbol::Star, pos, 1),
            '?' => self.symbol(Symbol::Question, pos, 1),
            ':' => self.symbol(Symbol::Colon, pos, 1),
            '!' => self.symbol_with_eq(Symbol::Bang, Symbol::BangEqual, pos),
            '=' => self.symbol_with_eq(Symbol::Equal, Symbol::EqualEqual, pos),
            '<' => self.symbol_with_eq(Symbol::Less, Symbol::LessEqual, pos),
            '>' => self.symbol_with_eq(Symbol::Greater, Symbol::GreaterEqual, pos),
            '/' => {
                if self.consume_next_char_if_eq('/') {
                    let mut comment_len = 2;
                    while self.consume_next_char_if_neq('\n') {
                        comment_len += 1;
                    }
                    self.offset_in_line += comment_len;
                    // The newline is left for the recursive call to gobble
                    return self.next();
                }
                self.symbol(Symbol::Slash, pos, 1)
            }
            // Gobble all the whitespace we can to avoid increasing recursion depth on long runs of blank lines
            ' ' | '\r' | '\t' => {
                self.offset_in_line += 1;
                self.gobble_whitespace();
                return self.next();
            }
            '\n' => {
                self.offset_in_line = 0;
                self.line += 1;
                self.gobble_whitespace();
                return self.next();
            }
            '0'..='9' => self.number(offset, pos),
            '"' => return Some(self.string(offset, pos)),
            c if c.is_alphabetic() || c == '_' => self.identifier(offset, pos),
            _ => {
                self.offset_in_line += 1;
                return Some(Err(ScanError {
                    error: ScanErrorType::UnrecognizedToken,
                    pos,
                }));
            }
        };
        Some(Ok(token))
    }
}
