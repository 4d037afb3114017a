//! Generic statement-tree parser
//!
//! Turns the token stream into an untyped tree of `keyword argument? { ... }`
//! nodes (RFC 7950 §6.3). `lower.rs` is the only consumer; it is the layer
//! that knows what `container`, `type`, `key`, etc. mean. Keeping the two
//! separate — a pure-syntax lexer/parser pair feeding an untyped tree, with
//! semantic interpretation pushed to a later layer — is the same split a
//! lexer/parser/lowering pipeline uses for any recursive-descent front end.

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::util::normalize_dquote_string;

use super::lexer::{Lexer, Token};

#[derive(Debug, Clone)]
pub struct Stmt {
    /// Raw keyword text, e.g. `"container"`, `"type"`, or an extension
    /// keyword `"ext-prefix:name"`. Lowering splits the prefix itself.
    pub keyword: String,
    pub argument: Option<String>,
    pub substatements: Vec<Stmt>,
}

impl Stmt {
    pub fn find(&self, keyword: &str) -> Option<&Stmt> {
        self.substatements.iter().find(|s| s.keyword == keyword)
    }

    pub fn find_all<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Stmt> {
        self.substatements.iter().filter(move |s| s.keyword == keyword)
    }

    pub fn arg(&self) -> &str {
        self.argument.as_deref().unwrap_or("")
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<(Token, crate::front::lexer::Pos)>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Parser { lexer: Lexer::new(src), lookahead: None }
    }

    fn peek(&mut self) -> Result<Token, Diagnostic> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token()?);
        }
        Ok(self.lookahead.as_ref().unwrap().0.clone())
    }

    fn bump(&mut self) -> Result<(Token, crate::front::lexer::Pos), Diagnostic> {
        if let Some(tok) = self.lookahead.take() {
            return Ok(tok);
        }
        self.lexer.next_token()
    }

    /// Consumes one keyword statement. `keyword` may itself be a prefixed
    /// extension name (`pfx:ext`); the YANG grammar doesn't distinguish
    /// that from an ordinary keyword lexically.
    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let (tok, _) = self.bump()?;
        let keyword = match tok {
            Token::Word(w) => w,
            other => {
                return Err(Diagnostic::error(
                    ErrorKind::Syntax,
                    format!("expected keyword, found {other:?}"),
                ))
            }
        };
        let argument = self.parse_optional_argument()?;
        let substatements = match self.peek()? {
            Token::Semi => {
                self.bump()?;
                Vec::new()
            }
            Token::LBrace => {
                self.bump()?;
                let mut subs = Vec::new();
                loop {
                    if self.peek()? == Token::RBrace {
                        self.bump()?;
                        break;
                    }
                    subs.push(self.parse_statement()?);
                }
                subs
            }
            other => {
                return Err(Diagnostic::error(
                    ErrorKind::Syntax,
                    format!("expected ';' or '{{' after '{keyword}', found {other:?}"),
                ))
            }
        };
        Ok(Stmt { keyword, argument, substatements })
    }

    /// An argument is either a bare word or one or more quoted strings
    /// joined by `+` (RFC 7950 §6.1.3 string concatenation); a statement
    /// with no argument at all (rare, extension-only) yields `None`.
    fn parse_optional_argument(&mut self) -> Result<Option<String>, Diagnostic> {
        match self.peek()? {
            Token::Semi | Token::LBrace => Ok(None),
            Token::Word(w) => {
                self.bump()?;
                Ok(Some(w))
            }
            Token::QuotedString(_, _) => {
                let mut combined = String::new();
                loop {
                    match self.bump()? {
                        (Token::QuotedString(body, col), _) => {
                            combined.push_str(&normalize_dquote_string(&body, col));
                        }
                        (other, _) => {
                            return Err(Diagnostic::error(
                                ErrorKind::Syntax,
                                format!("expected quoted string, found {other:?}"),
                            ))
                        }
                    }
                    if self.peek()? == Token::Plus {
                        self.bump()?;
                        continue;
                    }
                    break;
                }
                Ok(Some(combined))
            }
            other => Err(Diagnostic::error(
                ErrorKind::Syntax,
                format!("unexpected token {other:?} where a statement argument was expected"),
            )),
        }
    }
}

/// Parses one top-level `module { ... }` or `submodule { ... }` statement
/// out of `src`. Trailing content after the first top-level statement is
/// rejected — a source buffer holds exactly one module (§6 "compile-from-
/// buffer").
pub fn parse_module_source(src: &str) -> Result<Stmt, Diagnostic> {
    let mut parser = Parser::new(src);
    let stmt = parser.parse_statement()?;
    if stmt.keyword != "module" && stmt.keyword != "submodule" {
        return Err(Diagnostic::error(
            ErrorKind::MisplacedStatement,
            format!("expected top-level 'module' or 'submodule', found '{}'", stmt.keyword),
        ));
    }
    match parser.peek()? {
        Token::Eof => Ok(stmt),
        other => Err(Diagnostic::error(
            ErrorKind::Syntax,
            format!("unexpected trailing content after top-level statement: {other:?}"),
        )),
    }
}
