//! Recursive-descent parser for override scripts.
//!
//! The accepted language is a small, line-oriented subset of Python:
//! `import` statements, assignments to attributes or items, bare calls, and
//! literal expressions (numbers, strings, `None`/`True`/`False`, lists,
//! tuples, dicts, unary minus, attribute access, indexing and calls).

use crate::error::{Error, Result};
use crate::script::ast::{Expr, ImportName, Script, Statement};
use crate::script::lexer::{tokenize, Token, TokenKind};
use crate::value::Value;

/// Parses a whole script; nothing is executed.
///
/// # Errors
///
/// Returns [`Error::Syntax`] with the line and column of the first problem.
///
/// # Examples
///
/// ```
/// use cfgtree::script::{parse, Statement};
///
/// let script = parse("import mod.sub\nconfig.f=3.0\n").unwrap();
/// assert_eq!(script.statements.len(), 2);
/// assert!(matches!(script.statements[0], Statement::Import { .. }));
/// assert!(parse("config.f = = 3").is_err());
/// ```
pub fn parse(source: &str) -> Result<Script> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut statements = Vec::new();
    while !parser.at(&TokenKind::Eof) {
        statements.push(parser.statement()?);
    }
    Ok(Script { statements })
}

const KEYWORDS: &[&str] = &["import", "from", "as", "None", "True", "False"];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn at_name(&self, name: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(n) if n == name)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::Syntax {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_here(format!("expected {expected}, found {}", self.peek().kind.describe()))
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Name(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    fn end_of_statement(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        let line = self.peek().line;
        let statement = if self.at_name("import") {
            self.advance();
            let module = self.dotted()?;
            let alias = self.alias()?;
            Statement::Import {
                module,
                alias,
                line,
            }
        } else if self.at_name("from") {
            self.advance();
            let module = self.dotted()?;
            if !self.at_name("import") {
                return Err(self.unexpected("'import'"));
            }
            self.advance();
            let mut names = vec![self.import_name()?];
            while self.at(&TokenKind::Comma) {
                self.advance();
                names.push(self.import_name()?);
            }
            Statement::FromImport {
                module,
                names,
                line,
            }
        } else {
            let start = self.peek().clone();
            let expr = self.expression()?;
            if self.at(&TokenKind::Equals) {
                if !matches!(expr, Expr::Attribute { .. } | Expr::Subscript { .. }) {
                    return Err(Error::Syntax {
                        line: start.line,
                        column: start.column,
                        message: "only attributes and items can be assigned".to_string(),
                    });
                }
                self.advance();
                let value = self.expression()?;
                Statement::Assign {
                    target: expr,
                    value,
                    line,
                }
            } else if matches!(expr, Expr::Call { .. }) {
                Statement::Call { expr, line }
            } else {
                return Err(Error::Syntax {
                    line: start.line,
                    column: start.column,
                    message: "expected an assignment or a call".to_string(),
                });
            }
        };
        self.end_of_statement()?;
        Ok(statement)
    }

    fn dotted(&mut self) -> Result<String> {
        let mut path = self.identifier()?;
        while self.at(&TokenKind::Dot) {
            self.advance();
            path.push('.');
            path.push_str(&self.identifier()?);
        }
        Ok(path)
    }

    fn alias(&mut self) -> Result<Option<String>> {
        if self.at_name("as") {
            self.advance();
            return self.identifier().map(Some);
        }
        Ok(None)
    }

    fn import_name(&mut self) -> Result<ImportName> {
        let name = self.identifier()?;
        let alias = self.alias()?;
        Ok(ImportName { name, alias })
    }

    fn expression(&mut self) -> Result<Expr> {
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                // i64::MIN has no positive counterpart to negate.
                if self.peek().kind == TokenKind::Int(i64::MIN.unsigned_abs()) {
                    self.advance();
                    return Ok(Expr::Literal(Value::Int(i64::MIN)));
                }
                Ok(Expr::Neg(Box::new(self.expression()?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.expression()
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.atom()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.identifier()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let (args, kwargs) = self.arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        kwargs,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let is_keyword = matches!(self.peek().kind, TokenKind::Name(_))
                && self.peek_at(1) == &TokenKind::Equals;
            if is_keyword {
                let name = self.identifier()?;
                self.advance();
                kwargs.push((name, self.expression()?));
            } else if kwargs.is_empty() {
                args.push(self.expression()?);
            } else {
                return Err(self.error_here("positional argument follows keyword argument"));
            }
            if !self.at(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RParen)?;
        Ok((args, kwargs))
    }

    /// Comma-separated expressions up to `close`, allowing a trailing comma.
    /// Returns the items and whether a comma was seen.
    fn sequence(&mut self, close: &TokenKind) -> Result<(Vec<Expr>, bool)> {
        let mut items = Vec::new();
        let mut comma = false;
        while !self.at(close) {
            items.push(self.expression()?);
            if !self.at(&TokenKind::Comma) {
                break;
            }
            comma = true;
            self.advance();
        }
        self.expect(close)?;
        Ok((items, comma))
    }

    fn atom(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(magnitude) => i64::try_from(magnitude)
                .map(|i| Expr::Literal(Value::Int(i)))
                .map_err(|_| Error::Syntax {
                    line: token.line,
                    column: token.column,
                    message: format!("integer literal {magnitude} is too large"),
                }),
            TokenKind::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            TokenKind::Str(mut text) => {
                // Adjacent string literals concatenate.
                while let TokenKind::Str(next) = &self.peek().kind {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::Literal(Value::Str(text)))
            }
            TokenKind::Name(name) => match name.as_str() {
                "None" => Ok(Expr::Literal(Value::None)),
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                "import" | "from" | "as" => Err(Error::Syntax {
                    line: token.line,
                    column: token.column,
                    message: format!("unexpected keyword '{name}'"),
                }),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::LBracket => {
                let (items, _) = self.sequence(&TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::LParen => {
                let (mut items, comma) = self.sequence(&TokenKind::RParen)?;
                if items.len() == 1 && !comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Expr::Tuple(items))
                }
            }
            TokenKind::LBrace => {
                let mut entries = Vec::new();
                while !self.at(&TokenKind::RBrace) {
                    let key = self.expression()?;
                    self.expect(&TokenKind::Colon)?;
                    let value = self.expression()?;
                    entries.push((key, value));
                    if !self.at(&TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::Dict(entries))
            }
            other => Err(Error::Syntax {
                line: token.line,
                column: token.column,
                message: format!("unexpected {}", other.describe()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_statement(source: &str) -> Statement {
        let mut script = parse(source).unwrap();
        assert_eq!(script.statements.len(), 1);
        script.statements.remove(0)
    }

    fn attr(value: Expr, name: &str) -> Expr {
        Expr::Attribute {
            value: Box::new(value),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_assignment_to_nested_attribute() {
        let statement = only_statement("config.c.f = -1.5");
        assert_eq!(
            statement,
            Statement::Assign {
                target: attr(attr(Expr::Name("config".into()), "c"), "f"),
                value: Expr::Neg(Box::new(Expr::Literal(Value::Float(1.5)))),
                line: 1,
            }
        );
    }

    #[test]
    fn test_integer_extremes() {
        let Statement::Assign { value, .. } = only_statement("config.i = -9223372036854775808") else {
            panic!("expected assignment");
        };
        assert_eq!(value, Expr::Literal(Value::Int(i64::MIN)));

        let Statement::Assign { value, .. } = only_statement("config.i = 9223372036854775807") else {
            panic!("expected assignment");
        };
        assert_eq!(value, Expr::Literal(Value::Int(i64::MAX)));

        let err = parse("config.i = 9223372036854775808").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, column: 12, .. }));
    }

    #[test]
    fn test_imports() {
        let script = parse("import a.b as c\nfrom x.y import P, Q as R\n").unwrap();
        assert_eq!(
            script.statements[0],
            Statement::Import {
                module: "a.b".into(),
                alias: Some("c".into()),
                line: 1
            }
        );
        match &script.statements[1] {
            Statement::FromImport { module, names, line } => {
                assert_eq!(module, "x.y");
                assert_eq!(*line, 2);
                assert_eq!(names[1].alias.as_deref(), Some("R"));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_retarget_call_with_keywords() {
        match only_statement("config.c.retarget(target=mod.Cls, ConfigClass=mod.Cfg)") {
            Statement::Call {
                expr: Expr::Call { args, kwargs, .. },
                ..
            } => {
                assert!(args.is_empty());
                assert_eq!(kwargs[0].0, "target");
                assert_eq!(kwargs[1].0, "ConfigClass");
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn test_multiline_literals() {
        let statement = only_statement("config.d = {\n  'a': 1,\n  'b': [1, 2,],\n}\n");
        let Statement::Assign { value: Expr::Dict(entries), .. } = statement else {
            panic!("expected a dict assignment");
        };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parenthesized_and_tuple() {
        let Statement::Assign { value, .. } = only_statement("config.x = (1)") else {
            panic!("expected assignment");
        };
        assert_eq!(value, Expr::Literal(Value::Int(1)));
        let Statement::Assign { value, .. } = only_statement("config.x = (1,)") else {
            panic!("expected assignment");
        };
        assert_eq!(value, Expr::Tuple(vec![Expr::Literal(Value::Int(1))]));
    }

    #[test]
    fn test_name_assignment_rejected() {
        let err = parse("x = 1").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, column: 1, .. }));
    }

    #[test]
    fn test_bare_expression_rejected() {
        assert!(parse("config.f").is_err());
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse("config.a = 1\nconfig.b = = 2\n").unwrap_err();
        match err {
            Error::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_two_statements_on_one_line_rejected() {
        assert!(parse("config.a = 1 config.b = 2").is_err());
    }
}
