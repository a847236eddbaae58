//! Recursive-descent parser with a nesting budget.

use super::ast::{
    BinaryOp, DeclarationKind, Expression, FunctionLiteral, ParseArtifact, Statement, UnaryOp,
};
use super::lexer::{Lexer, Spanned};
use super::pending_error::PendingCompilationError;
use super::source::SourceStream;
use super::token::Token;
use crate::messages::MessageTemplate;

/// Part of the stack limit left unused by nested productions. It covers the
/// frames between two checks and the leaf productions below the last one.
pub const STACK_HEADROOM_DIVISOR: usize = 8;

type ParseResult<T> = Result<T, PendingCompilationError>;

/// Parses the characters of `stream`.
///
/// `stack_limit` is the parser stack size in KiB, measured from the stack
/// position at this call. Once recursion has used that much stack, minus
/// `1 / STACK_HEADROOM_DIVISOR` of headroom, the parse records a
/// [`MessageTemplate::StackOverflow`] instead of recursing further. The
/// calling thread must have at least `stack_limit` KiB of stack left.
///
/// # Errors
///
/// Returns the first lexical or syntax error as a
/// [`PendingCompilationError`].
pub fn parse(stream: &SourceStream, stack_limit: usize) -> ParseResult<ParseArtifact> {
    let tokens = Lexer::new(stream.chars(), stream.start()).tokenize()?;
    let literal = Parser::new(tokens, stack_limit).parse_program(stream.start()..stream.end())?;
    Ok(ParseArtifact::new(literal))
}

/// Address of a local in a fresh frame.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0_u8;
    std::hint::black_box(std::ptr::from_ref(&marker)).addr()
}

/// Lowest stack address recursion may reach.
///
/// Stacks grow downward on every supported target.
#[derive(Debug, Clone, Copy)]
struct StackGuard {
    limit: usize,
}

impl StackGuard {
    fn new(stack_limit: usize) -> Self {
        let budget = stack_limit.saturating_mul(1024);
        let budget = budget - budget / STACK_HEADROOM_DIVISOR;
        Self {
            limit: stack_position().saturating_sub(budget),
        }
    }

    fn has_overflowed(self) -> bool {
        stack_position() < self.limit
    }
}

/// Recursive-descent parser over a token list that ends in [`Token::Eos`].
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    stack: StackGuard,
}

fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    let entry = match token {
        Token::Or => (BinaryOp::Or, 1),
        Token::And => (BinaryOp::And, 2),
        Token::BitOr => (BinaryOp::BitOr, 3),
        Token::BitXor => (BinaryOp::BitXor, 4),
        Token::BitAnd => (BinaryOp::BitAnd, 5),
        Token::Eq => (BinaryOp::Eq, 6),
        Token::NotEq => (BinaryOp::NotEq, 6),
        Token::StrictEq => (BinaryOp::StrictEq, 6),
        Token::StrictNotEq => (BinaryOp::StrictNotEq, 6),
        Token::Lt => (BinaryOp::Lt, 7),
        Token::Gt => (BinaryOp::Gt, 7),
        Token::LtEq => (BinaryOp::LtEq, 7),
        Token::GtEq => (BinaryOp::GtEq, 7),
        Token::Plus => (BinaryOp::Add, 8),
        Token::Minus => (BinaryOp::Sub, 8),
        Token::Star => (BinaryOp::Mul, 9),
        Token::Slash => (BinaryOp::Div, 9),
        Token::Percent => (BinaryOp::Mod, 9),
        _ => return None,
    };
    Some(entry)
}

fn unary_op(token: &Token) -> Option<UnaryOp> {
    match token {
        Token::Bang => Some(UnaryOp::Not),
        Token::Minus => Some(UnaryOp::Negate),
        Token::Plus => Some(UnaryOp::Plus),
        Token::Tilde => Some(UnaryOp::BitNot),
        Token::Typeof => Some(UnaryOp::Typeof),
        _ => None,
    }
}

impl Parser {
    /// Creates a parser whose recursion may use `stack_limit` KiB of stack
    /// below the current position.
    pub fn new(mut tokens: Vec<Spanned>, stack_limit: usize) -> Self {
        if tokens.last().is_none_or(|last| last.token != Token::Eos) {
            let end = tokens.last().map_or(0, |last| last.end);
            tokens.push(Spanned {
                token: Token::Eos,
                start: end,
                end,
                newline_before: false,
            });
        }
        Parser {
            tokens,
            pos: 0,
            stack: StackGuard::new(stack_limit),
        }
    }

    fn current(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    /// Consumes the current token. `Eos` is never consumed.
    fn advance(&mut self) -> Spanned {
        let token = self.current().clone();
        if token.token != Token::Eos {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> ParseResult<Spanned> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        if let Token::Identifier(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(&Token::Semicolon)
            || self.check(&Token::RBrace)
            || self.check(&Token::Eos)
            || self.current().newline_before
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or_else(|| self.current().start, |t| t.end)
    }

    /// Error for the current token being out of place.
    fn unexpected(&self) -> PendingCompilationError {
        let current = self.current();
        let location = current.start..current.end;
        match &current.token {
            Token::Eos => PendingCompilationError::new(MessageTemplate::UnexpectedEos, location),
            Token::Identifier(name) => {
                PendingCompilationError::new(MessageTemplate::UnexpectedTokenIdentifier, location)
                    .with_arg(name.clone())
            }
            Token::Number(_) => {
                PendingCompilationError::new(MessageTemplate::UnexpectedTokenNumber, location)
            }
            Token::String(_) => {
                PendingCompilationError::new(MessageTemplate::UnexpectedTokenString, location)
            }
            other => PendingCompilationError::new(MessageTemplate::UnexpectedToken, location)
                .with_arg(other.to_string()),
        }
    }

    /// Every recursive cycle of the grammar passes through a production
    /// that calls this first.
    fn check_stack(&self) -> ParseResult<()> {
        if self.stack.has_overflowed() {
            let current = self.current();
            return Err(PendingCompilationError::new(
                MessageTemplate::StackOverflow,
                current.start..current.end,
            ));
        }
        Ok(())
    }

    /// Parses statements until the end of input.
    pub fn parse_program(mut self, span: std::ops::Range<usize>) -> ParseResult<FunctionLiteral> {
        let mut body = Vec::new();
        while !self.check(&Token::Eos) {
            body.push(self.parse_statement()?);
        }
        Ok(FunctionLiteral {
            name: None,
            params: Vec::new(),
            body,
            span,
        })
    }

    // Statements

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        self.check_stack()?;
        match self.peek().clone() {
            Token::LBrace => self.parse_block().map(Statement::Block),
            Token::Var => self.parse_declaration(DeclarationKind::Var),
            Token::Let => self.parse_declaration(DeclarationKind::Let),
            Token::Const => self.parse_declaration(DeclarationKind::Const),
            Token::Function => self.parse_function(true).map(Statement::Function),
            Token::Return => self.parse_return(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eos) {
            statements.push(self.parse_statement()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(statements)
    }

    fn parse_declaration(&mut self, kind: DeclarationKind) -> ParseResult<Statement> {
        self.advance();
        let mut bindings = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.eat(&Token::Assign) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            bindings.push((name, init));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Declaration { kind, bindings })
    }

    fn parse_function(&mut self, is_declaration: bool) -> ParseResult<FunctionLiteral> {
        let start = self.expect(&Token::Function)?.start;

        let name = match self.peek() {
            Token::Identifier(_) => Some(self.expect_identifier()?),
            _ if is_declaration => return Err(self.unexpected()),
            _ => None,
        };

        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        let body = self.parse_block()?;
        Ok(FunctionLiteral {
            name,
            params,
            body,
            span: start..self.previous_end(),
        })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.advance();
        let ends_here = self.check(&Token::Semicolon)
            || self.check(&Token::RBrace)
            || self.check(&Token::Eos)
            || self.current().newline_before;
        let value = if ends_here {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(value))
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.advance();
        self.expect(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.advance();
        self.expect(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While { condition, body })
    }

    // Expressions

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expression> {
        self.check_stack()?;
        let start = self.current().start;
        let target = self.parse_conditional()?;

        if !self.check(&Token::Assign) {
            return Ok(target);
        }
        if !target.is_reference() {
            return Err(PendingCompilationError::new(
                MessageTemplate::InvalidLhsInAssignment,
                start..self.previous_end(),
            ));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expression::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> ParseResult<Expression> {
        let condition = self.parse_binary(1)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then_value = self.parse_assignment()?;
        self.expect(&Token::Colon)?;
        let else_value = self.parse_assignment()?;
        Ok(Expression::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = binary_op(self.peek()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let Some(op) = unary_op(self.peek()) else {
            return self.parse_postfix();
        };
        self.check_stack()?;
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expression = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::LParen => {
                    let arguments = self.parse_arguments()?;
                    expression = Expression::Call {
                        callee: Box::new(expression),
                        arguments,
                    };
                }
                Token::Dot => {
                    self.advance();
                    let property = match &self.current().token {
                        Token::Identifier(name) => name.clone(),
                        other => match other.as_keyword() {
                            Some(word) => word.to_string(),
                            None => return Err(self.unexpected()),
                        },
                    };
                    self.advance();
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property,
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    expression = Expression::Index {
                        object: Box::new(expression),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect(&Token::LParen)?;
        let mut arguments = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let expression = match self.peek().clone() {
            Token::Number(n) => Expression::Number(n),
            Token::String(s) => Expression::String(s),
            Token::True => Expression::Boolean(true),
            Token::False => Expression::Boolean(false),
            Token::Null => Expression::Null,
            Token::Identifier(name) => Expression::Identifier(name),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&Token::RBracket) {
                    elements.push(self.parse_assignment()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(&Token::RBracket)?;
                return Ok(Expression::Array(elements));
            }
            Token::Function => {
                let literal = self.parse_function(false)?;
                return Ok(Expression::Function(Box::new(literal)));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expression)
    }
}
