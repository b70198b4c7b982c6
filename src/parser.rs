use std::rc::Rc;

use ordered_float::OrderedFloat;
use thiserror::Error;

use crate::ast::*;
use crate::reporter::{ErrorReporter, StateTrackingReporter};
use crate::scanner::Keyword;
use crate::scanner::Pos;
use crate::scanner::ScanError;
use crate::scanner::Scanner;
use crate::scanner::Symbol;
use crate::scanner::Token;
use crate::scanner::TokenType;

const MAX_ARGUMENTS: usize = 255;

// Public error type that is returned from the API, the details have already been delivered to the reporter
#[derive(Error, Debug, PartialEq, Eq)]
#[error("parse error")]
pub struct ParseError {}

// For unwinding, we don't actually care that much about the internal cause which is reported through the reporter
#[derive(Error, Debug)]
#[error("internal parse error")]
struct ParsePanic {}

/// One token of lookahead over the scanner. Once the scanner is exhausted it keeps yielding EOF so the grammar
/// functions never have to handle a missing token.
pub struct TokenStream<'src> {
    scanner: Scanner<'src>,
    peeked: Option<Result<Token<'src>, ScanError>>,
    last_pos: Pos,
}

impl<'src> TokenStream<'src> {
    pub fn new(scanner: Scanner<'src>) -> TokenStream<'src> {
        TokenStream {
            scanner,
            peeked: None,
            last_pos: Pos {
                offset_in_line: 0,
                line: 0,
            },
        }
    }

    fn pull(&mut self) -> Result<Token<'src>, ScanError> {
        match self.scanner.next() {
            Some(Ok(token)) => {
                self.last_pos = token.pos;
                Ok(token)
            }
            Some(Err(error)) => {
                self.last_pos = error.pos;
                Err(error)
            }
            None => Ok(Token {
                data: TokenType::Eof,
                pos: self.last_pos,
            }),
        }
    }

    pub fn next(&mut self) -> Result<Token<'src>, ScanError> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.pull(),
        }
    }

    pub fn peek(&mut self) -> &Result<Token<'src>, ScanError> {
        let peeked = match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.pull(),
        };
        self.peeked.insert(peeked)
    }

    pub fn peek_pos(&mut self) -> Pos {
        match self.peek() {
            Ok(token) => token.pos,
            Err(error) => error.pos,
        }
    }

    pub fn is_at_eof(&mut self) -> bool {
        matches!(
            self.peek(),
            Ok(Token {
                data: TokenType::Eof,
                ..
            })
        )
    }

    /// Consume the next token only if it satisfies the predicate
    pub fn next_if<F>(&mut self, predicate: F) -> Option<Token<'src>>
    where
        F: FnOnce(&TokenType<'src>) -> bool,
    {
        let matched = match self.peek() {
            Ok(token) => predicate(&token.data),
            Err(_) => false,
        };
        if matched {
            self.next().ok()
        } else {
            None
        }
    }

    /// Consume the next token only if the extractor produces something from it
    pub fn next_if_some<F, T>(&mut self, extract: F) -> Option<T>
    where
        F: FnOnce(&TokenType<'src>) -> Option<T>,
    {
        let extracted = match self.peek() {
            Ok(token) => extract(&token.data),
            Err(_) => None,
        };
        if extracted.is_some() {
            _ = self.next();
        }
        extracted
    }
}

pub fn parse<Reporter>(reporter: &mut Reporter, scanner: Scanner<'_>) -> Result<Program, ParseError>
where
    Reporter: ErrorReporter,
{
    let mut reporter = StateTrackingReporter {
        reporter,
        errored: false,
    };
    let mut tokens = TokenStream::new(scanner);
    let program = program(&mut reporter, &mut tokens);
    if reporter.errored {
        Err(ParseError {})
    } else {
        tracing::debug!(statements = program.0.len(), "parsed program");
        Ok(program)
    }
}

fn program<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Program
where
    Reporter: ErrorReporter,
{
    let mut stmts = Vec::<Stmt>::new();
    while !scanner.is_at_eof() {
        match declaration(reporter, scanner) {
            Ok(stmt) => stmts.push(stmt),
            Err(_) => synchronize(scanner),
        }
    }
    Program(stmts)
}

fn synchronize(scanner: &mut TokenStream<'_>) {
    // Consume tokens until we have consumed a ';'
    // Avoid consuming EOF since we can abort there
    loop {
        match scanner.peek() {
            Ok(token) if token.data == Symbol::Semicolon => {
                _ = scanner.next();
                break;
            }
            Ok(Token {
                data: TokenType::Eof,
                ..
            }) => break,
            _ => {
                _ = scanner.next();
            }
        }
    }
}

fn declaration<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    if scanner.next_if(|data| *data == Keyword::Var).is_some() {
        finish_var_decl(reporter, scanner)
    } else if scanner.next_if(|data| *data == Keyword::Fun).is_some() {
        Ok(Stmt::FunDecl(Rc::new(function(reporter, scanner)?)))
    } else if scanner.next_if(|data| *data == Keyword::Class).is_some() {
        finish_class_decl(reporter, scanner)
    } else {
        statement(reporter, scanner)
    }
}

fn finish_var_decl<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let name = expect_identifier(reporter, scanner)?.to_string();
    let init = if scanner.next_if(|next| *next == Symbol::Equal).is_some() {
        Some(expr(reporter, scanner)?)
    } else {
        None
    };
    expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after variable declaration")?;
    Ok(Stmt::VarDecl { name, init })
}

// Shared by `fun` declarations and class methods, which don't have the fun prefix
fn function<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<FunDecl, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let name = expect_identifier(reporter, scanner)?.to_string();
    expect_symbol(reporter, scanner, Symbol::LeftParen, "expected '(' after function name")?;

    let mut parameters = Vec::new();
    if scanner.next_if(|next| *next == Symbol::RightParen).is_none() {
        comma_separated_identifiers(&mut parameters, reporter, scanner)?;
        expect_symbol(reporter, scanner, Symbol::RightParen, "expect ')' after parameter list")?;
    }
    expect_symbol(reporter, scanner, Symbol::LeftBrace, "function bodies start with '{'")?;
    let body = block_stmts(reporter, scanner)?;
    Ok(FunDecl {
        name,
        parameters,
        body,
    })
}

fn finish_class_decl<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let name = expect_identifier(reporter, scanner)?.to_string();
    let parent = if scanner.next_if(|next| *next == Symbol::Less).is_some() {
        Some(Expr::Variable(expect_identifier(reporter, scanner)?.to_string()))
    } else {
        None
    };
    expect_symbol(reporter, scanner, Symbol::LeftBrace, "class bodies start with '{'")?;
    let mut methods = Vec::new();
    while scanner.next_if(|next| *next == Symbol::RightBrace).is_none() {
        if scanner.is_at_eof() {
            reporter.report(scanner.peek_pos(), "expected '}' after class body");
            return Err(ParsePanic {});
        }
        methods.push(Rc::new(function(reporter, scanner)?));
    }
    Ok(Stmt::ClassDecl {
        name,
        parent,
        methods,
    })
}

fn statement<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    if scanner.next_if(|next| *next == Keyword::If).is_some() {
        if_stmt(reporter, scanner)
    } else if scanner.next_if(|next| *next == Keyword::While).is_some() {
        while_stmt(reporter, scanner)
    } else if scanner.next_if(|next| *next == Keyword::For).is_some() {
        for_stmt(reporter, scanner)
    } else if scanner.next_if(|next| *next == Keyword::Print).is_some() {
        let expr = expr(reporter, scanner)?;
        expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after value")?;
        Ok(Stmt::Print(expr))
    } else if scanner.next_if(|next| *next == Keyword::Return).is_some() {
        let expr = if scanner.next_if(|next| *next == Symbol::Semicolon).is_some() {
            None
        } else {
            let e = expr(reporter, scanner)?;
            expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after return value")?;
            Some(e)
        };
        Ok(Stmt::Return(expr))
    } else if scanner.next_if(|next| *next == Keyword::Break).is_some() {
        expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after break")?;
        Ok(Stmt::Break)
    } else if scanner.next_if(|next| *next == Symbol::LeftBrace).is_some() {
        Ok(Stmt::Block(block_stmts(reporter, scanner)?))
    } else {
        expr_stmt(reporter, scanner)
    }
}

// Statements up to and including the closing '}', the opening brace has already been consumed
fn block_stmts<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Vec<Stmt>, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut stmts: Vec<Stmt> = Vec::new();
    while !scanner.is_at_eof() && !peek_matches(scanner, Symbol::RightBrace) {
        stmts.push(declaration(reporter, scanner)?);
    }
    expect_symbol(reporter, scanner, Symbol::RightBrace, "expected '}' after block")?;
    Ok(stmts)
}

fn if_stmt<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    expect_symbol(reporter, scanner, Symbol::LeftParen, "expected '(' after if")?;
    let test_expr = expr(reporter, scanner)?;
    expect_symbol(reporter, scanner, Symbol::RightParen, "expected ')' after if condition")?;
    let then_branch = Box::new(statement(reporter, scanner)?);
    let else_branch = if scanner.next_if(|next| *next == Keyword::Else).is_some() {
        Some(Box::new(statement(reporter, scanner)?))
    } else {
        None
    };
    Ok(Stmt::If {
        expr: test_expr,
        then: then_branch,
        or_else: else_branch,
    })
}

fn while_stmt<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    expect_symbol(reporter, scanner, Symbol::LeftParen, "expected '(' after while")?;
    let expr = expr(reporter, scanner)?;
    expect_symbol(reporter, scanner, Symbol::RightParen, "expected ')' after while condition")?;
    let body = Box::new(statement(reporter, scanner)?);
    Ok(Stmt::Loop { expr, body })
}

fn for_stmt<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    expect_symbol(reporter, scanner, Symbol::LeftParen, "expected '(' after for")?;
    let initializer = if scanner.next_if(|next| *next == Symbol::Semicolon).is_some() {
        None
    } else if peek_matches(scanner, Keyword::Var) {
        Some(declaration(reporter, scanner)?)
    } else {
        Some(expr_stmt(reporter, scanner)?)
    };

    let condition = if scanner.next_if(|next| *next == Symbol::Semicolon).is_some() {
        Expr::Literal(Literal::Boolean(true))
    } else {
        let cond = expr(reporter, scanner)?;
        expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after loop condition")?;
        cond
    };

    let incr = if scanner.next_if(|next| *next == Symbol::RightParen).is_some() {
        None
    } else {
        let expr = expr(reporter, scanner)?;
        expect_symbol(reporter, scanner, Symbol::RightParen, "expected ')' after for clauses")?;
        Some(Stmt::Expr(expr))
    };

    let mut body = statement(reporter, scanner)?;
    if let Some(incr) = incr {
        body = Stmt::Block(vec![body, incr]);
    }

    let for_loop = Stmt::Loop {
        expr: condition,
        body: Box::new(body),
    };

    match initializer {
        Some(init) => Ok(Stmt::Block(vec![init, for_loop])),
        None => Ok(for_loop),
    }
}

fn expr_stmt<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let expr = expr(reporter, scanner)?;
    expect_symbol(reporter, scanner, Symbol::Semicolon, "expected ';' after an expression")?;
    Ok(Stmt::Expr(expr))
}

fn expr<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    assignment(reporter, scanner)
}

fn assignment<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let expr = logical_or(reporter, scanner)?;
    let Some(eq) = scanner.next_if(|token| *token == Symbol::Equal) else {
        return Ok(expr);
    };
    // Right associative, a = b = c assigns c to both
    let value = Box::new(assignment(reporter, scanner)?);
    match expr {
        Expr::Variable(target) => Ok(Expr::Assignment { target, expr: value }),
        Expr::Get { object, property } => Ok(Expr::Set {
            object,
            property,
            value,
        }),
        Expr::Index { object, index } => Ok(Expr::SetIndex {
            object,
            index,
            value,
        }),
        // Report the error to trigger top level error, but don't error out here so we continue parsing
        _ => {
            reporter.report(eq.pos, "invalid assignment target");
            Ok(expr)
        }
    }
}

// Each level of binary operators is described by its symbols and the next higher precedence parser
const EQUALITY_SYMBOLS: [Symbol; 2] = [Symbol::EqualEqual, Symbol::BangEqual];

const COMPARISON_SYMBOLS: [Symbol; 4] = [
    Symbol::Greater,
    Symbol::GreaterEqual,
    Symbol::Less,
    Symbol::LessEqual,
];

const TERM_SYMBOLS: [Symbol; 2] = [Symbol::Minus, Symbol::Plus];

const FACTOR_SYMBOLS: [Symbol; 2] = [Symbol::Star, Symbol::Slash];

// All binary symbols, used by primary to recover when we see a binary symbol without a left hand operand
const BINARY_SYMBOLS: [Symbol; 10] = [
    Symbol::EqualEqual,
    Symbol::BangEqual,
    Symbol::Greater,
    Symbol::GreaterEqual,
    Symbol::Less,
    Symbol::LessEqual,
    Symbol::Minus,
    Symbol::Plus,
    Symbol::Star,
    Symbol::Slash,
];

fn logical_or<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_logical_op(reporter, scanner, Keyword::Or, logical_and)
}

fn logical_and<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_logical_op(reporter, scanner, Keyword::And, equality)
}

fn equality<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, &EQUALITY_SYMBOLS, ternary)
}

fn ternary<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let expr = comparison(reporter, scanner)?;
    if scanner.next_if(|next| *next == Symbol::Question).is_none() {
        return Ok(expr);
    }
    let if_true = Box::new(comparison(reporter, scanner)?);
    expect_symbol(reporter, scanner, Symbol::Colon, "expected a ':' in ternary")?;
    let if_false = Box::new(comparison(reporter, scanner)?);
    Ok(Expr::Ternary {
        test: Box::new(expr),
        if_true,
        if_false,
    })
}

fn comparison<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, &COMPARISON_SYMBOLS, term)
}

fn term<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, &TERM_SYMBOLS, factor)
}

fn factor<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, &FACTOR_SYMBOLS, unary)
}

const UNARY_SYMBOLS: [Symbol; 2] = [Symbol::Minus, Symbol::Bang];

fn unary<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    if let Some(symbol) = scanner.next_if_some(|next| match next {
        TokenType::Symbol(symbol) if UNARY_SYMBOLS.contains(symbol) => Some(*symbol),
        _ => None,
    }) {
        let op = symbol_to_unary_op(symbol);
        let expr = Box::new(unary(reporter, scanner)?);
        Ok(Expr::Unary { op, expr })
    } else {
        call(reporter, scanner)
    }
}

fn call<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut expr = primary(reporter, scanner)?;
    loop {
        if scanner.next_if(|next| *next == Symbol::LeftParen).is_some() {
            let arguments = finish_arguments(reporter, scanner, Symbol::RightParen)?;
            expr = Expr::Call {
                callee: Box::new(expr),
                arguments,
            };
        } else if scanner.next_if(|next| *next == Symbol::Dot).is_some() {
            let name = expect_identifier(reporter, scanner)?;
            expr = Expr::Get {
                object: Box::new(expr),
                property: name.to_string(),
            };
        } else if scanner.next_if(|next| *next == Symbol::LeftBracket).is_some() {
            let index = Box::new(self::expr(reporter, scanner)?);
            expect_symbol(reporter, scanner, Symbol::RightBracket, "expected ']' after index")?;
            expr = Expr::Index {
                object: Box::new(expr),
                index,
            };
        } else {
            break;
        }
    }
    Ok(expr)
}

fn finish_arguments<Reporter>(
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'_>,
    close: Symbol,
) -> Result<Vec<Expr>, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut args = Vec::new();
    if scanner.next_if(|next| *next == close).is_some() {
        return Ok(args);
    }
    loop {
        if args.len() >= MAX_ARGUMENTS {
            reporter.report(scanner.peek_pos(), "too many arguments");
        }
        args.push(expr(reporter, scanner)?);
        if scanner.next_if(|next| *next == Symbol::Comma).is_none() {
            break;
        }
    }
    expect_symbol(reporter, scanner, close, "expected closing delimiter after arguments")?;
    Ok(args)
}

// Sequence literals have no element limit
fn finish_list<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Vec<Expr>, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut items = Vec::new();
    if scanner.next_if(|next| *next == Symbol::RightBracket).is_some() {
        return Ok(items);
    }
    loop {
        items.push(expr(reporter, scanner)?);
        if scanner.next_if(|next| *next == Symbol::Comma).is_none() {
            break;
        }
    }
    expect_symbol(reporter, scanner, Symbol::RightBracket, "expected ']' after list elements")?;
    Ok(items)
}

fn primary<Reporter>(reporter: &mut Reporter, scanner: &mut TokenStream<'_>) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let token = match scanner.next() {
        Ok(token) => token,
        Err(scan_err) => {
            reporter.report(scan_err.pos, scan_err.error.message());
            return Err(ParsePanic {});
        }
    };
    let expr = match token.data {
        TokenType::Keyword(Keyword::True) => Expr::Literal(Literal::Boolean(true)),
        TokenType::Keyword(Keyword::False) => Expr::Literal(Literal::Boolean(false)),
        TokenType::Keyword(Keyword::Nil) => Expr::Literal(Literal::Nil),
        TokenType::Keyword(Keyword::This) => Expr::This,
        TokenType::Keyword(Keyword::Super) => {
            expect_symbol(reporter, scanner, Symbol::Dot, "expected '.' after 'super'")?;
            let method = expect_identifier(reporter, scanner)?.to_string();
            Expr::Super { method }
        }
        TokenType::String(string) => Expr::Literal(Literal::String(string.to_string())),
        TokenType::Number(number) => Expr::Literal(Literal::Number(OrderedFloat(number))),
        TokenType::Identifier(ident) => Expr::Variable(ident.to_string()),
        TokenType::Symbol(Symbol::LeftParen) => {
            let inner = expr(reporter, scanner)?;
            expect_symbol(reporter, scanner, Symbol::RightParen, "expected a ')'")?;
            Expr::Group(Box::new(inner))
        }
        TokenType::Symbol(Symbol::LeftBracket) => {
            Expr::List(finish_list(reporter, scanner)?)
        }
        // An unexpected binary symbol so lets try and parse the rhs before raising the error
        TokenType::Symbol(symbol) if BINARY_SYMBOLS.contains(&symbol) => {
            reporter.report(token.pos, "binary operator without a left-hand side");
            // result is unimportant, we are bailing anyway
            let _rhs = expr(reporter, scanner);
            return Err(ParsePanic {});
        }
        _ => {
            reporter.report(token.pos, "expected an expression");
            return Err(ParsePanic {});
        }
    };
    Ok(expr)
}

fn left_recursive_binary_op<'src, Reporter, F>(
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'src>,
    symbols: &[Symbol],
    higher_precedence: F,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
    F: Fn(&mut Reporter, &mut TokenStream<'src>) -> Result<Expr, ParsePanic>,
{
    let mut expr = higher_precedence(reporter, scanner)?;
    while let Some(symbol) = scanner.next_if_some(|next| match next {
        TokenType::Symbol(s) if symbols.contains(s) => Some(*s),
        _ => None,
    }) {
        let op = symbol_to_binary_op(symbol);
        let right = Box::new(higher_precedence(reporter, scanner)?);
        expr = Expr::Binary {
            left: Box::new(expr),
            op,
            right,
        }
    }
    Ok(expr)
}

fn left_recursive_logical_op<'src, Reporter, F>(
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'src>,
    keyword: Keyword,
    higher_precedence: F,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
    F: Fn(&mut Reporter, &mut TokenStream<'src>) -> Result<Expr, ParsePanic>,
{
    let mut expr = higher_precedence(reporter, scanner)?;
    while scanner.next_if(|next| *next == keyword).is_some() {
        let op = match keyword {
            Keyword::And => LogicalOp::And,
            _ => LogicalOp::Or,
        };
        let right = Box::new(higher_precedence(reporter, scanner)?);
        expr = Expr::Logical {
            left: Box::new(expr),
            op,
            right,
        }
    }
    Ok(expr)
}

// Only called with members of BINARY_SYMBOLS, everything else falls through to division
fn symbol_to_binary_op(symbol: Symbol) -> BinaryOp {
    match symbol {
        Symbol::EqualEqual => BinaryOp::Equal,
        Symbol::BangEqual => BinaryOp::NotEqual,
        Symbol::Less => BinaryOp::LessThan,
        Symbol::LessEqual => BinaryOp::LessThanEqual,
        Symbol::Greater => BinaryOp::GreaterThan,
        Symbol::GreaterEqual => BinaryOp::GreaterThanEqual,
        Symbol::Plus => BinaryOp::Add,
        Symbol::Minus => BinaryOp::Subtract,
        Symbol::Star => BinaryOp::Multiply,
        _ => BinaryOp::Divide,
    }
}

fn symbol_to_unary_op(symbol: Symbol) -> UnaryOp {
    match symbol {
        Symbol::Bang => UnaryOp::Not,
        _ => UnaryOp::Negative,
    }
}

/// Expect that the next token is the given symbol, reporting `message` at the offending token otherwise
fn expect_symbol<Reporter>(
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'_>,
    symbol: Symbol,
    message: &str,
) -> Result<(), ParsePanic>
where
    Reporter: ErrorReporter,
{
    match scanner.next() {
        Ok(token) if token.data == symbol => Ok(()),
        Ok(token) => {
            reporter.report(token.pos, message);
            Err(ParsePanic {})
        }
        Err(err) => {
            reporter.report(err.pos, err.error.message());
            Err(ParsePanic {})
        }
    }
}

fn expect_identifier<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'src>,
) -> Result<&'src str, ParsePanic>
where
    Reporter: ErrorReporter,
{
    match scanner.next() {
        Ok(Token {
            data: TokenType::Identifier(ident),
            pos: _,
        }) => Ok(ident),
        Ok(Token { data: _, pos }) => {
            reporter.report(pos, "expected identifier");
            Err(ParsePanic {})
        }
        Err(error) => {
            reporter.report(error.pos, "expected identifier");
            Err(ParsePanic {})
        }
    }
}

// Helper to determine if the next token matches a specific symbol or keyword without consuming it
fn peek_matches<'src, A>(scanner: &mut TokenStream<'src>, rhs: A) -> bool
where
    TokenType<'src>: PartialEq<A>,
{
    match scanner.peek() {
        Ok(token) => token.data == rhs,
        _ => false,
    }
}

fn comma_separated_identifiers<Reporter>(
    idents: &mut Vec<String>,
    reporter: &mut Reporter,
    scanner: &mut TokenStream<'_>,
) -> Result<(), ParsePanic>
where
    Reporter: ErrorReporter,
{
    idents.push(expect_identifier(reporter, scanner)?.to_string());
    while scanner.next_if(|next| *next == Symbol::Comma).is_some() {
        if idents.len() >= MAX_ARGUMENTS {
            reporter.report(scanner.peek_pos(), "too many parameters");
        }
        idents.push(expect_identifier(reporter, scanner)?.to_string());
    }
    Ok(())
}
