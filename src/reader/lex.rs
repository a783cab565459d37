//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A lexer for textual IR that lazily produces tokens.
pub struct Lex<'a> {
    raw: RawLex<'a>,
    next: Option<TokPair<'a>>,
}

impl<'a> Lex<'a> {
    /// Creates a new [`Lex`] based on a given source file.
    pub fn new(source: &'a str) -> Self {
        let mut raw = RawLex::new(source);
        let first = raw.next();

        Self { raw, next: first }
    }

    /// Produces the next token, if one exists. If `None` is returned,
    /// EOF has been reached.
    pub fn next_token(&mut self) -> Option<TokPair<'a>> {
        // we stay "one ahead" of the raw lexer, that makes `peek_token` trivial
        let old = self.next.take();

        self.next = self.raw.next();

        old
    }

    /// Returns whether or not the lexer is able to yield more tokens via [`Self::next_token`]
    pub fn is_at_end(&self) -> bool {
        self.next.is_none()
    }

    /// Peek at the next token to be yielded, if there are any
    pub fn peek_token(&self) -> Option<TokPair<'a>> {
        self.next
    }

    /// Gets the line and column right after the last character in the source.
    pub fn eof_position(&self) -> (u32, u16) {
        (u32::try_from(self.raw.line).unwrap_or(u32::MAX), saturate(self.raw.col + 1))
    }
}

/// A single lex token
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Token<'a> {
    /// A local identifier, `%ident`
    LocalIdent(&'a str),
    /// A global identifier, `@ident`
    GlobalIdent(&'a str),
    /// A decimal integer literal with an optional `-`, e.g. `-1` or `42`
    IntLit(&'a str),
    /// `add`
    Add,
    /// `call`
    Call,
    /// `const`
    Const,
    /// `declare`
    Declare,
    /// `fn`
    Fn,
    /// `mul`
    Mul,
    /// `private`
    Private,
    /// `ret`
    Ret,
    /// `sub`
    Sub,
    /// `{`
    CurlyOpen,
    /// `}`
    CurlyClose,
    /// `(`
    ParenOpen,
    /// `)`
    ParenClose,
    /// `,`
    Comma,
    /// `=`
    Eq,
    /// Anything that isn't a valid token
    Unknown(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LocalIdent(name) => write!(f, "`%{name}`"),
            Token::GlobalIdent(name) => write!(f, "`@{name}`"),
            Token::IntLit(lit) => write!(f, "`{lit}`"),
            Token::Unknown(s) => write!(f, "`{s}`"),
            Token::CurlyOpen => write!(f, "`{{`"),
            Token::CurlyClose => write!(f, "`}}`"),
            Token::ParenOpen => write!(f, "`(`"),
            Token::ParenClose => write!(f, "`)`"),
            Token::Comma => write!(f, "`,`"),
            Token::Eq => write!(f, "`=`"),
            keyword => {
                let (name, _) = KEYWORDS
                    .iter()
                    .find(|(_, tok)| tok == keyword)
                    .copied()
                    .unwrap_or(("?", Token::Unknown("?")));

                write!(f, "`{name}`")
            }
        }
    }
}

/// A token along with where it is in the source.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TokPair<'a> {
    /// The token
    pub tok: Token<'a>,
    /// The 1-indexed line the token starts on
    pub line: u32,
    /// The 1-indexed column the token starts at
    pub col: u16,
    /// The length of the token in bytes
    pub len: u16,
}

// sorted so that keyword lookup can be a binary search
const KEYWORDS: [(&str, Token<'static>); 9] = [
    ("add", Token::Add),
    ("call", Token::Call),
    ("const", Token::Const),
    ("declare", Token::Declare),
    ("fn", Token::Fn),
    ("mul", Token::Mul),
    ("private", Token::Private),
    ("ret", Token::Ret),
    ("sub", Token::Sub),
];

struct RawLex<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    current: usize,
    token_start: usize,
    line: usize,
    col: usize,
}

impl<'a> RawLex<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            current: 0,
            token_start: 0,
            line: 1,
            col: 0,
            chars: source.chars().peekable(),
        }
    }

    fn next(&mut self) -> Option<TokPair<'a>> {
        let ch = self.take_next()?;
        let start = self.current - ch.len_utf8();

        self.token_start = start;

        let col = self.col;
        let line = self.line;

        let tok = match ch {
            '%' => match self.try_lex_ident_without_first() {
                Some(ident) => Token::LocalIdent(ident),
                None => Token::Unknown(self.last_consumed_as_str()),
            },
            '@' => match self.try_lex_ident_without_first() {
                Some(ident) => Token::GlobalIdent(ident),
                None => Token::Unknown(self.last_consumed_as_str()),
            },
            '{' => Token::CurlyOpen,
            '}' => Token::CurlyClose,
            '(' => Token::ParenOpen,
            ')' => Token::ParenClose,
            ',' => Token::Comma,
            '=' => Token::Eq,
            '-' => self.try_lex_decimal(),
            c if c.is_ascii_digit() => self.try_lex_decimal(),
            c if c.is_ascii_alphabetic() || c == '_' => self.try_lex_keyword(),
            _ => Token::Unknown(self.last_consumed_as_str()),
        };

        Some(TokPair {
            tok,
            line: u32::try_from(line).unwrap_or(u32::MAX),
            col: saturate(col),
            len: saturate(self.current - start),
        })
    }

    fn lex_ident_raw(&mut self, start: usize) -> &'a str {
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');

        &self.source[start..self.current]
    }

    // lexes an identifier after a `%` or `@` prefix, if no identifier-compatible
    // characters follow this returns `None`
    fn try_lex_ident_without_first(&mut self) -> Option<&'a str> {
        let full = self.lex_ident_raw(self.current);

        (!full.is_empty()).then_some(full)
    }

    // bare words are only ever keywords
    fn try_lex_keyword(&mut self) -> Token<'a> {
        let full = self.lex_ident_raw(self.token_start);

        match KEYWORDS.binary_search_by_key(&full, |(s, _)| *s) {
            Ok(idx) => KEYWORDS[idx].1,
            Err(_) => Token::Unknown(full),
        }
    }

    // the first character (a digit or `-`) has already been consumed
    fn try_lex_decimal(&mut self) -> Token<'a> {
        let start = self.token_start;

        self.consume_while(|c| c.is_ascii_digit());

        let full = &self.source[start..self.current];

        if full == "-" {
            Token::Unknown(full)
        } else {
            Token::IntLit(full)
        }
    }

    fn take_next(&mut self) -> Option<char> {
        // whitespace and comments are skipped entirely at lex time
        while let Some(ch) = self.consume_next() {
            if ch.is_ascii_whitespace() {
                continue;
            }

            if ch == ';' {
                self.consume_while(|c| c != '\n');

                continue;
            }

            return Some(ch);
        }

        None
    }

    fn consume_next(&mut self) -> Option<char> {
        let ch = self.chars.next();

        if let Some(ch) = ch {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }

            self.current += ch.len_utf8();
        }

        ch
    }

    fn consume_while(&mut self, f: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek_next() {
            if !f(ch) {
                return;
            }

            self.consume_next();
        }
    }

    #[inline]
    fn peek_next(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    #[inline]
    fn last_consumed_as_str(&self) -> &'a str {
        &self.source[self.token_start..self.current]
    }
}

// positions past what a `u16` holds point at the end of the line instead of wrapping
fn saturate(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        let mut lex = Lex::new(source);
        let mut toks = Vec::default();

        while let Some(pair) = lex.next_token() {
            toks.push(pair.tok);
        }

        toks
    }

    #[test]
    fn keywords_are_sorted() {
        assert!(KEYWORDS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn lexes_functions() {
        assert_eq!(
            tokens("private fn @f(%a) { ; comment\n %1 = add %a, -12\n ret }"),
            vec![
                Token::Private,
                Token::Fn,
                Token::GlobalIdent("f"),
                Token::ParenOpen,
                Token::LocalIdent("a"),
                Token::ParenClose,
                Token::CurlyOpen,
                Token::LocalIdent("1"),
                Token::Eq,
                Token::Add,
                Token::LocalIdent("a"),
                Token::Comma,
                Token::IntLit("-12"),
                Token::Ret,
                Token::CurlyClose,
            ]
        );
    }

    #[test]
    fn unknown_tokens() {
        assert_eq!(
            tokens("@ - bogus #"),
            vec![
                Token::Unknown("@"),
                Token::Unknown("-"),
                Token::Unknown("bogus"),
                Token::Unknown("#"),
            ]
        );
    }

    #[test]
    fn positions() {
        let mut lex = Lex::new("fn\n  @main");

        let first = lex.next_token().unwrap();
        let second = lex.next_token().unwrap();

        assert_eq!((first.line, first.col, first.len), (1, 1, 2));
        assert_eq!((second.line, second.col, second.len), (2, 3, 5));
        assert!(lex.is_at_end());
    }

    #[test]
    fn non_ascii_characters_are_unknown() {
        assert_eq!(
            tokens("fn é %a→ ;ü\n}"),
            vec![
                Token::Fn,
                Token::Unknown("é"),
                Token::LocalIdent("a"),
                Token::Unknown("→"),
                Token::CurlyClose,
            ]
        );

        let mut lex = Lex::new("é @f");
        let first = lex.next_token().unwrap();
        let second = lex.next_token().unwrap();

        assert_eq!((first.col, first.len), (1, 2));
        assert_eq!((second.col, second.len), (3, 2));
    }

    #[test]
    fn long_lines_saturate() {
        let source = format!("{}@f", " ".repeat(70_000));
        let mut lex = Lex::new(&source);
        let pair = lex.next_token().unwrap();

        assert_eq!(pair.tok, Token::GlobalIdent("f"));
        assert_eq!(pair.col, u16::MAX);
    }
}
