//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{BinaryOp, Inst, Linkage, Module, Value};
use crate::reader::{Lex, ParseError, TokPair, Token};
use crate::utility::SaHashMap;
use smallvec::SmallVec;

type ParseResult<T> = Result<T, ParseError>;

/// A recursive-descent parser for textual IR.
pub struct Parser<'a> {
    lex: Lex<'a>,
    module: Module,
    locals: SaHashMap<&'a str, Value>,
    next_value: u32,
}

impl<'a> Parser<'a> {
    /// Creates a parser for a [`Module`] named `name`.
    ///
    /// `source` will be parsed into the module when [`Self::parse`] is called.
    pub fn new(name: &'a str, source: &'a str) -> Self {
        Self {
            lex: Lex::new(source),
            module: Module::new(name),
            locals: SaHashMap::default(),
            next_value: 0,
        }
    }

    /// Parses the file, and if there are no errors returns a [`Module`].
    ///
    /// The first error stops the parse.
    pub fn parse(mut self) -> ParseResult<Module> {
        while let Some(pair) = self.lex.next_token() {
            match pair.tok {
                Token::Declare => self.parse_declaration()?,
                Token::Fn => self.parse_definition(Linkage::Public)?,
                Token::Private => {
                    self.expect(Token::Fn, "`fn`")?;
                    self.parse_definition(Linkage::Private)?
                }
                _ => return Err(unexpected(pair, "`declare`, `fn` or `private fn`")),
            }
        }

        Ok(self.module)
    }

    // `declare @name(%a, %b)`, the leading `declare` has been consumed
    fn parse_declaration(&mut self) -> ParseResult<()> {
        let name = self.parse_function_name()?;
        let params = self.parse_params()?;

        self.module.declare_function(name, params);

        Ok(())
    }

    // `fn @name(%a, %b) { ... }`, the leading `fn` has been consumed
    fn parse_definition(&mut self, linkage: Linkage) -> ParseResult<()> {
        let name = self.parse_function_name()?;
        let params = self.parse_params()?;

        self.expect(Token::CurlyOpen, "`{`")?;

        let mut insts = Vec::default();

        loop {
            let pair = self.next("an instruction or `}`")?;

            match pair.tok {
                Token::CurlyClose => break,
                Token::LocalIdent(local) => insts.push(self.parse_definition_inst(pair, local)?),
                Token::Call => {
                    let (callee, args) = self.parse_call_operands()?;

                    insts.push(Inst::Call {
                        dest: None,
                        callee,
                        args,
                    });
                }
                Token::Ret => insts.push(self.parse_ret(pair)?),
                _ => return Err(unexpected(pair, "an instruction or `}`")),
            }
        }

        let mut builder = self.module.define_function(name, params, linkage);

        for inst in insts {
            builder.append(inst);
        }

        builder.define();

        Ok(())
    }

    fn parse_function_name(&mut self) -> ParseResult<&'a str> {
        let pair = self.next("a function name")?;

        let Token::GlobalIdent(name) = pair.tok else {
            return Err(unexpected(pair, "a function name"));
        };

        if self.module.find_function_by_name(name).is_some() {
            return Err(ParseError::at(pair, format!("redefinition of function `@{name}`")));
        }

        Ok(name)
    }

    // parses `(%a, %b, ...)` and binds every parameter in order
    fn parse_params(&mut self) -> ParseResult<u32> {
        self.locals.clear();
        self.next_value = 0;

        self.expect(Token::ParenOpen, "`(`")?;

        if self.eat(Token::ParenClose) {
            return Ok(0);
        }

        loop {
            let pair = self.next("a parameter")?;

            let Token::LocalIdent(name) = pair.tok else {
                return Err(unexpected(pair, "a parameter"));
            };

            self.bind(pair, name)?;

            if self.eat(Token::ParenClose) {
                break;
            }

            self.expect(Token::Comma, "`,` or `)`")?;
        }

        Ok(self.next_value)
    }

    // `%x = const N`, `%x = add %a, %b`, `%x = call @f(...)`
    fn parse_definition_inst(&mut self, pair: TokPair<'a>, local: &'a str) -> ParseResult<Inst> {
        self.expect(Token::Eq, "`=`")?;

        let op = self.next("`const`, `add`, `sub`, `mul` or `call`")?;

        // operands are resolved before the result is bound, `%x = add %x, %x` is a use of
        // an undefined value
        let inst = match op.tok {
            Token::Const => {
                let lit = self.next("an integer literal")?;

                let Token::IntLit(text) = lit.tok else {
                    return Err(unexpected(lit, "an integer literal"));
                };

                let value = text
                    .parse::<i64>()
                    .map_err(|_| ParseError::at(lit, format!("integer literal `{text}` is out of range")))?;

                let dest = self.bind(pair, local)?;

                Inst::Const { dest, value }
            }
            Token::Add | Token::Sub | Token::Mul => {
                let op = match op.tok {
                    Token::Add => BinaryOp::Add,
                    Token::Sub => BinaryOp::Sub,
                    _ => BinaryOp::Mul,
                };

                let lhs = self.parse_operand()?;
                self.expect(Token::Comma, "`,`")?;
                let rhs = self.parse_operand()?;
                let dest = self.bind(pair, local)?;

                Inst::Binary { dest, op, lhs, rhs }
            }
            Token::Call => {
                let (callee, args) = self.parse_call_operands()?;
                let dest = self.bind(pair, local)?;

                Inst::Call {
                    dest: Some(dest),
                    callee,
                    args,
                }
            }
            _ => return Err(unexpected(op, "`const`, `add`, `sub`, `mul` or `call`")),
        };

        Ok(inst)
    }

    // `@f(%a, %b)` after a `call`
    fn parse_call_operands(&mut self) -> ParseResult<(String, SmallVec<[Value; 4]>)> {
        let pair = self.next("a function name")?;

        let Token::GlobalIdent(callee) = pair.tok else {
            return Err(unexpected(pair, "a function name"));
        };

        self.expect(Token::ParenOpen, "`(`")?;

        let mut args = SmallVec::new();

        if self.eat(Token::ParenClose) {
            return Ok((callee.to_owned(), args));
        }

        loop {
            args.push(self.parse_operand()?);

            if self.eat(Token::ParenClose) {
                break;
            }

            self.expect(Token::Comma, "`,` or `)`")?;
        }

        Ok((callee.to_owned(), args))
    }

    // `ret` or `ret %x`, a returned value has to be on the same line as the `ret`
    fn parse_ret(&mut self, ret: TokPair<'a>) -> ParseResult<Inst> {
        match self.lex.peek_token() {
            Some(TokPair {
                tok: Token::LocalIdent(_),
                line,
                ..
            }) if line == ret.line => Ok(Inst::Ret {
                value: Some(self.parse_operand()?),
            }),
            _ => Ok(Inst::Ret { value: None }),
        }
    }

    fn parse_operand(&mut self) -> ParseResult<Value> {
        let pair = self.next("a value")?;

        let Token::LocalIdent(name) = pair.tok else {
            return Err(unexpected(pair, "a value"));
        };

        self.locals
            .get(name)
            .copied()
            .ok_or_else(|| ParseError::at(pair, format!("use of undefined value `%{name}`")))
    }

    fn bind(&mut self, pair: TokPair<'a>, name: &'a str) -> ParseResult<Value> {
        if self.locals.contains_key(name) {
            return Err(ParseError::at(pair, format!("redefinition of value `%{name}`")));
        }

        let value = Value::new(self.next_value);

        self.next_value += 1;
        self.locals.insert(name, value);

        Ok(value)
    }

    fn next(&mut self, expected: &str) -> ParseResult<TokPair<'a>> {
        match self.lex.next_token() {
            Some(pair) => Ok(pair),
            None => {
                let (line, col) = self.lex.eof_position();

                Err(ParseError::new(
                    line,
                    col,
                    1,
                    format!("expected {expected} but hit end of file"),
                ))
            }
        }
    }

    fn expect(&mut self, tok: Token<'static>, expected: &str) -> ParseResult<TokPair<'a>> {
        let pair = self.next(expected)?;

        if pair.tok == tok {
            Ok(pair)
        } else {
            Err(unexpected(pair, expected))
        }
    }

    fn eat(&mut self, tok: Token<'static>) -> bool {
        let matches = self.lex.peek_token().map_or(false, |pair| pair.tok == tok);

        if matches {
            self.lex.next_token();
        }

        matches
    }
}

fn unexpected(pair: TokPair<'_>, expected: &str) -> ParseError {
    ParseError::at(pair, format!("expected {expected}, got {}", pair.tok))
}
