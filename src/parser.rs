/*!
Time & Space Complexity: whole‑file overview
==============================================

* **n** = number of tokens (including the sole EOF).

| Phase / function              | Cost | Rationale                                                      |
|-------------------------------|-----:|----------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                   |
| Arrow‑lambda lookahead        | O(k) | Scans an identifier list once; `k` = parameter tokens.         |
| Error recovery `synchronize()`| O(k) | Discards tokens up to the next statement boundary.            |
| `synchronize_member()`        | O(k) | Discards tokens up to the next prototype member.               |

Call‑stack depth grows with syntactic nesting.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths                  | `debug`| Context before reporting.                 |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → varDecl | constDecl | subDecl | protoDecl | statement ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
constDecl      → "const" IDENT "=" expression ";" ;
subDecl        → "subroutine" IDENT lambdaTail ;
protoDecl      → "prototype" IDENT prototypeTail ;
statement      → exprStmt | forStmt | whileStmt | ifStmt | returnStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";" expression? ")" statement ;
whileStmt      → "while" "(" expression ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
returnStmt     → "return" expression? ";" ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | ternary ;
ternary        → logic_or ( "?" expression ":" ternary )? ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" | "%" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this" | IDENT
               | "(" expression ")" | lambda | arrowLambda | prototypeExpr ;
lambda         → "lambda" lambdaTail ;
lambdaTail     → "(" parameters? ")" block ;
parameters     → IDENT ( "=" expression )? ( "," IDENT ( "=" expression )? )* ;
arrowLambda    → "(" ( IDENT ( "," IDENT )* )? ")" "->" ( block | expression ) ;
prototypeExpr  → "prototype" prototypeTail ;
prototypeTail  → ( "from" call )? "{" member* "}" ;
member         → ( "public" | "private" ) ":"
               | "var" IDENT ( "=" expression )? ";" | "subroutine" IDENT lambdaTail ;
```
*/

use std::rc::Rc;

use crate::diagnostics::Diagnostics;
use crate::error::{Result, WickError};
use crate::expr::{Expr, Lambda, LiteralValue, Member, Param, Prototype};
use crate::stmt::Stmt;
use crate::token::{Literal, Token, TokenKind};

use log::{debug, info};

const MAX_ARGUMENTS: usize = 255;

/// Recursive‑descent parser over a scanned token sequence.
///
/// Syntax errors are reported to the diagnostics sink, never returned: the
/// parser always consumes the whole input and hands back every statement that
/// parsed cleanly.
pub struct Parser<'d> {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: &'d mut dyn Diagnostics,
}

impl<'d> Parser<'d> {
    pub fn new(mut tokens: Vec<Token>, diagnostics: &'d mut dyn Diagnostics) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        // Every production relies on an EOF sentinel.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::EOF, "", None, line, 0));
        }

        Self {
            tokens,
            current: 0,
            diagnostics,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return the statements that parsed.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} statements", statements.len());

        statements
    }

    /// Parse a single expression that must span the whole input.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        info!("Parsing a single expression");

        let result = self.expression().and_then(|expr| {
            if self.is_at_end() {
                Ok(expr)
            } else {
                Err(self.error(self.peek(), "Expected end of expression."))
            }
        });

        match result {
            Ok(expr) => Some(expr),
            Err(e) => {
                self.diagnostics.report_error(&e);
                None
            }
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Parse one declaration. On error: report once, resynchronize, yield `None`.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at {}", self.peek());

        let result = if self.matches(TokenKind::VAR) {
            self.var_declaration(false)
        } else if self.matches(TokenKind::CONST) {
            self.var_declaration(true)
        } else if self.matches(TokenKind::SUBROUTINE) {
            self.subroutine_declaration()
        } else if self.check(TokenKind::PROTOTYPE) && self.check_next(TokenKind::IDENTIFIER) {
            self.advance();
            self.prototype_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!("Parse error, synchronizing: {}", e);

                self.diagnostics.report_error(&e);
                self.synchronize();

                None
            }
        }
    }

    fn var_declaration(&mut self, constant: bool) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenKind::IDENTIFIER, "Expected variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenKind::EQUAL) {
            Some(self.expression()?)
        } else if constant {
            return Err(self.error(self.peek(), "Expected '=' after constant name."));
        } else {
            None
        };

        self.consume(
            TokenKind::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Variable {
            name,
            initializer,
            constant,
        })
    }

    fn subroutine_declaration(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let name: Token = self
            .consume(TokenKind::IDENTIFIER, "Expected subroutine name.")?
            .clone();

        let lambda: Rc<Lambda> = self.lambda_tail(keyword)?;

        Ok(Stmt::Variable {
            name,
            initializer: Some(Expr::Lambda(lambda)),
            constant: false,
        })
    }

    fn prototype_declaration(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let name: Token = self.advance().clone();

        let prototype: Prototype = self.prototype_tail(keyword)?;

        Ok(Stmt::Variable {
            name,
            initializer: Some(Expr::Prototype(Box::new(prototype))),
            constant: false,
        })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {}", self.peek());

        if self.matches(TokenKind::FOR) {
            self.for_statement()
        } else if self.matches(TokenKind::IF) {
            self.if_statement()
        } else if self.matches(TokenKind::WHILE) {
            self.while_statement()
        } else if self.matches(TokenKind::RETURN) {
            self.return_statement()
        } else if self.matches(TokenKind::LEFT_BRACE) {
            Ok(Stmt::Scope(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer: Option<Box<Stmt>> = if self.matches(TokenKind::SEMICOLON) {
            None
        } else if self.matches(TokenKind::VAR) {
            Some(Box::new(self.var_declaration(false)?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition: Option<Expr> = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenKind::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after for clauses.")?;

        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expected '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after condition.")?;

        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::For {
            initializer: None,
            condition: Some(condition),
            increment: None,
            body,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expected '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenKind::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::SEMICOLON, "Expected ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenKind::SEMICOLON, "Expected ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    /// Statements up to the closing `}`; the `{` is already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expected '}' after block.")?;

        Ok(statements)
    }

    // ───────────────────────── expression rules ───────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.ternary()?;

        if self.matches(TokenKind::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable(name) if name.kind == TokenKind::IDENTIFIER => {
                    Ok(Expr::Assignment {
                        name,
                        value: Box::new(value),
                    })
                }

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                _ => Err(self.error(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let condition: Expr = self.logical_or()?;

        if self.matches(TokenKind::QUESTION) {
            let question: Token = self.previous().clone();
            let then_branch: Expr = self.expression()?;

            self.consume(
                TokenKind::COLON,
                "Expected ':' after the then branch of a ternary.",
            )?;

            let else_branch: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                question,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    /// Left‑associative chain of binary operators at one precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while self.matches_any(operators) {
            let operator: Token = self.previous().clone();
            let right: Expr = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenKind::OR], Self::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenKind::AND], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::BANG_EQUAL, TokenKind::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenKind::GREATER,
                TokenKind::GREATER_EQUAL,
                TokenKind::LESS,
                TokenKind::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenKind::MINUS, TokenKind::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::STAR, TokenKind::SLASH, TokenKind::PERCENT],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches_any(&[TokenKind::BANG, TokenKind::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenKind::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenKind::DOT) {
                let name: Token = self
                    .consume(TokenKind::IDENTIFIER, "Expected property name after '.'.")?
                    .clone();

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(self.error(self.peek(), "Can't have more than 255 arguments."));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenKind::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenKind::RIGHT_PAREN, "Expected ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenKind::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenKind::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenKind::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[TokenKind::NUMBER, TokenKind::STRING]) {
            return Ok(Expr::Literal(match &self.previous().literal {
                Some(Literal::Number(n)) => LiteralValue::Number(*n),
                Some(Literal::Str(s)) => LiteralValue::Str(Rc::clone(s)),
                None => LiteralValue::Nil,
            }));
        }

        if self.matches_any(&[TokenKind::IDENTIFIER, TokenKind::THIS]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }

        if self.matches(TokenKind::LAMBDA) {
            let keyword: Token = self.previous().clone();
            return Ok(Expr::Lambda(self.lambda_tail(keyword)?));
        }

        if self.matches(TokenKind::PROTOTYPE) {
            let keyword: Token = self.previous().clone();
            return Ok(Expr::Prototype(Box::new(self.prototype_tail(keyword)?)));
        }

        if self.check(TokenKind::LEFT_PAREN) && self.arrow_ahead() {
            return self.arrow_lambda();
        }

        if self.matches(TokenKind::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Group(Box::new(expr)));
        }

        Err(self.error(self.peek(), "Expected expression."))
    }

    // ───────────────────── lambdas and prototypes ─────────────────

    /// `"(" parameters? ")" block` after `lambda` or a subroutine name.
    fn lambda_tail(&mut self, keyword: Token) -> Result<Rc<Lambda>> {
        self.consume(TokenKind::LEFT_PAREN, "Expected '(' before parameters.")?;

        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error(self.peek(), "Can't have more than 255 parameters."));
                }

                let name: Token = self
                    .consume(TokenKind::IDENTIFIER, "Expected parameter name.")?
                    .clone();

                let default: Option<Expr> = if self.matches(TokenKind::EQUAL) {
                    Some(self.expression()?)
                } else if params.iter().any(|p| p.default.is_some()) {
                    return Err(self.error(&name, "Parameters with defaults must come last."));
                } else {
                    None
                };

                params.push(Param { name, default });

                if !self.matches(TokenKind::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(TokenKind::LEFT_BRACE, "Expected '{' before subroutine body.")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(Lambda {
            keyword,
            params,
            body,
        }))
    }

    /// Bounded lookahead: does `( IDENT, … ) ->` start at the current token?
    fn arrow_ahead(&self) -> bool {
        let kind_at = |i: usize| self.tokens.get(i).map(|t| t.kind);

        let mut i = self.current + 1;

        if kind_at(i) == Some(TokenKind::RIGHT_PAREN) {
            return kind_at(i + 1) == Some(TokenKind::ARROW);
        }

        loop {
            if kind_at(i) != Some(TokenKind::IDENTIFIER) {
                return false;
            }

            match kind_at(i + 1) {
                Some(TokenKind::COMMA) => i += 2,
                Some(TokenKind::RIGHT_PAREN) => return kind_at(i + 2) == Some(TokenKind::ARROW),
                _ => return false,
            }
        }
    }

    fn arrow_lambda(&mut self) -> Result<Expr> {
        self.consume(TokenKind::LEFT_PAREN, "Expected '(' before parameters.")?;

        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error(self.peek(), "Can't have more than 255 parameters."));
                }

                let name: Token = self
                    .consume(TokenKind::IDENTIFIER, "Expected parameter name.")?
                    .clone();

                params.push(Param {
                    name,
                    default: None,
                });

                if !self.matches(TokenKind::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RIGHT_PAREN, "Expected ')' after parameters.")?;

        let arrow: Token = self
            .consume(TokenKind::ARROW, "Expected '->' after parameters.")?
            .clone();

        let body: Vec<Stmt> = if self.matches(TokenKind::LEFT_BRACE) {
            self.block()?
        } else {
            vec![Stmt::Return {
                keyword: arrow.clone(),
                value: Some(self.expression()?),
            }]
        };

        Ok(Expr::Lambda(Rc::new(Lambda {
            keyword: arrow,
            params,
            body,
        })))
    }

    /// `( "from" call )? "{" member* "}"` after `prototype [Name]`.
    ///
    /// A malformed member is reported on its own and parsing resumes at the
    /// next member, so one typo costs one diagnostic.
    fn prototype_tail(&mut self, keyword: Token) -> Result<Prototype> {
        let parent: Option<Expr> = if self.matches(TokenKind::FROM) {
            Some(self.call()?)
        } else {
            None
        };

        self.consume(TokenKind::LEFT_BRACE, "Expected '{' before prototype body.")?;

        let mut members: Vec<Member> = Vec::new();
        let mut private: bool = false;

        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            match self.member(&mut private) {
                Ok(Some(member)) => members.push(member),
                Ok(None) => {}
                Err(e) => {
                    debug!("Member parse error, skipping to next member: {}", e);

                    self.diagnostics.report_error(&e);
                    self.synchronize_member();
                }
            }
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expected '}' after prototype body.")?;

        Ok(Prototype {
            keyword,
            parent,
            members,
        })
    }

    /// One prototype member, or `None` after a `public:` / `private:` label.
    fn member(&mut self, private: &mut bool) -> Result<Option<Member>> {
        if self.matches_any(&[TokenKind::PUBLIC, TokenKind::PRIVATE]) {
            *private = self.previous().kind == TokenKind::PRIVATE;

            self.consume(TokenKind::COLON, "Expected ':' after visibility label.")?;

            return Ok(None);
        }

        if self.matches(TokenKind::VAR) {
            let name: Token = self
                .consume(TokenKind::IDENTIFIER, "Expected property name.")?
                .clone();

            let value: Expr = if self.matches(TokenKind::EQUAL) {
                self.expression()?
            } else {
                Expr::Literal(LiteralValue::Nil)
            };

            self.consume(TokenKind::SEMICOLON, "Expected ';' after property.")?;

            return Ok(Some(Member {
                name,
                value,
                private: *private,
            }));
        }

        if self.matches(TokenKind::SUBROUTINE) {
            let sub_keyword: Token = self.previous().clone();
            let name: Token = self
                .consume(TokenKind::IDENTIFIER, "Expected subroutine name.")?
                .clone();

            let lambda: Rc<Lambda> = self.lambda_tail(sub_keyword)?;

            return Ok(Some(Member {
                name,
                value: Expr::Lambda(lambda),
                private: *private,
            }));
        }

        Err(self.error(
            self.peek(),
            "Expected 'var' or 'subroutine' in prototype body.",
        ))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();

            return true;
        }

        false
    }

    fn matches_any(&mut self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|&kind| self.matches(kind))
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(self.error(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.kind == kind)
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error(&self, token: &Token, message: &str) -> WickError {
        WickError::parse(token.line, token.location(), message)
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::SEMICOLON {
                return;
            }

            match self.peek().kind {
                TokenKind::VAR
                | TokenKind::CONST
                | TokenKind::SUBROUTINE
                | TokenKind::PROTOTYPE
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }

    /// Skips to the next member start or to the body's closing `}`.
    ///
    /// Every failed member has consumed at least one token or stopped on one
    /// that cannot start a member, so this always makes progress.
    fn synchronize_member(&mut self) {
        let mut depth: usize = 0;

        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::LEFT_BRACE => depth += 1,
                TokenKind::RIGHT_BRACE if depth == 0 => return,
                TokenKind::RIGHT_BRACE => depth -= 1,
                TokenKind::VAR
                | TokenKind::SUBROUTINE
                | TokenKind::PUBLIC
                | TokenKind::PRIVATE
                    if depth == 0 =>
                {
                    return
                }
                _ => {}
            }

            self.advance();
        }
    }
}
