//! Recursive-descent parser building directly into the corpus arena.

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::error::{ParseError, Result};
use crate::lexer::{lex, Token, TokenKind};

/// Parse one source text and append its units to `corpus`.
///
/// File-level `use` headers are copied onto every unit of the file, since a
/// unit is the independently compilable item and must carry its own headers.
pub fn parse_file(corpus: &mut Corpus, text: &str) -> Result<Vec<NodeId>> {
    let tokens = lex(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        corpus,
    };
    parser.file()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    corpus: &'a mut Corpus,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            let token = self.peek();
            Err(ParseError::new(
                token.line,
                token.column,
                format!("expected {what}, found '{}'", describe(token)),
            ))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(token.line, token.column, message)
    }

    fn file(&mut self) -> Result<Vec<NodeId>> {
        let mut headers = Vec::new();
        while self.at(TokenKind::KwUse) {
            headers.push(self.use_header()?);
        }

        let mut units = Vec::new();
        while self.at(TokenKind::KwUnit) {
            units.push(self.unit(&headers)?);
        }
        if !self.at(TokenKind::Eof) {
            return Err(self.error_here(format!(
                "expected 'unit', found '{}'",
                describe(self.peek())
            )));
        }
        if units.is_empty() {
            return Err(self.error_here("source file contains no units"));
        }
        Ok(units)
    }

    fn use_header(&mut self) -> Result<String> {
        self.expect(TokenKind::KwUse, "'use'")?;
        let std_token = self.expect(TokenKind::Ident, "'std'")?;
        if std_token.text != "std" {
            return Err(ParseError::new(
                std_token.line,
                std_token.column,
                "use headers must name the std namespace",
            ));
        }
        self.expect(TokenKind::Dot, "'.'")?;
        let name = self.expect(TokenKind::Ident, "builtin name")?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(name.text)
    }

    fn unit(&mut self, headers: &[String]) -> Result<NodeId> {
        self.expect(TokenKind::KwUnit, "'unit'")?;
        let name = self.expect(TokenKind::Ident, "unit name")?;
        let unit = self
            .corpus
            .arena_mut()
            .alloc(SyntaxKind::Unit, Some(name.text));
        let root = self.corpus.root();
        self.corpus.arena_mut().add_child(root, unit);

        for header in headers {
            let node = self
                .corpus
                .arena_mut()
                .alloc(SyntaxKind::UseHeader, Some(header.clone()));
            self.corpus.arena_mut().add_child(unit, node);
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        loop {
            if self.at(TokenKind::Comment) {
                let comment = self.bump();
                let node = self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::Comment, Some(comment.text));
                self.corpus.arena_mut().add_child(unit, node);
            } else if self.at(TokenKind::KwFn) {
                let function = self.function()?;
                self.corpus.arena_mut().add_child(unit, function);
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(unit)
    }

    fn function(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::KwFn, "'fn'")?;
        let name = self.expect(TokenKind::Ident, "function name")?;
        let function = self
            .corpus
            .arena_mut()
            .alloc(SyntaxKind::Function, Some(name.text));

        self.expect(TokenKind::LParen, "'('")?;
        if !self.at(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Ident, "parameter name")?;
                let node = self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::Param, Some(param.text));
                self.corpus.arena_mut().add_child(function, node);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let block = self.block()?;
        self.corpus.arena_mut().add_child(function, block);
        Ok(function)
    }

    fn block(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let block = self.corpus.arena_mut().alloc(SyntaxKind::Block, None);
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let stmt = self.statement()?;
            self.corpus.arena_mut().add_child(block, stmt);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(block)
    }

    fn statement(&mut self) -> Result<NodeId> {
        match self.peek().kind {
            TokenKind::Comment => {
                let comment = self.bump();
                Ok(self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::Comment, Some(comment.text)))
            }
            TokenKind::KwLet => {
                self.bump();
                let name = self.expect(TokenKind::Ident, "variable name")?;
                self.expect(TokenKind::Assign, "'='")?;
                let value = self.expression()?;
                self.expect(TokenKind::Semi, "';'")?;
                let stmt = self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::LetStmt, Some(name.text));
                self.corpus.arena_mut().add_child(stmt, value);
                Ok(stmt)
            }
            TokenKind::KwReturn => {
                self.bump();
                let stmt = self.corpus.arena_mut().alloc(SyntaxKind::ReturnStmt, None);
                if !self.at(TokenKind::Semi) {
                    let value = self.expression()?;
                    self.corpus.arena_mut().add_child(stmt, value);
                }
                self.expect(TokenKind::Semi, "';'")?;
                Ok(stmt)
            }
            TokenKind::KwIf => {
                self.bump();
                let condition = self.expression()?;
                let then_block = self.block()?;
                let stmt = self.corpus.arena_mut().alloc(SyntaxKind::IfStmt, None);
                self.corpus.arena_mut().add_child(stmt, condition);
                self.corpus.arena_mut().add_child(stmt, then_block);
                if self.eat(TokenKind::KwElse) {
                    let else_block = self.block()?;
                    self.corpus.arena_mut().add_child(stmt, else_block);
                }
                Ok(stmt)
            }
            _ => {
                let value = self.expression()?;
                self.expect(TokenKind::Semi, "';'")?;
                let stmt = self.corpus.arena_mut().alloc(SyntaxKind::ExprStmt, None);
                self.corpus.arena_mut().add_child(stmt, value);
                Ok(stmt)
            }
        }
    }

    fn expression(&mut self) -> Result<NodeId> {
        self.equality()
    }

    fn binary_chain(
        &mut self,
        operators: &[TokenKind],
        next: fn(&mut Self) -> Result<NodeId>,
    ) -> Result<NodeId> {
        let mut lhs = next(self)?;
        while operators.contains(&self.peek().kind) {
            let op = self.bump();
            let rhs = next(self)?;
            let node = self
                .corpus
                .arena_mut()
                .alloc(SyntaxKind::Binary, Some(op.text));
            self.corpus.arena_mut().add_child(node, lhs);
            self.corpus.arena_mut().add_child(node, rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<NodeId> {
        self.binary_chain(&[TokenKind::EqEq, TokenKind::NotEq], Self::comparison)
    }

    fn comparison(&mut self) -> Result<NodeId> {
        self.binary_chain(&[TokenKind::Lt, TokenKind::Gt], Self::additive)
    }

    fn additive(&mut self) -> Result<NodeId> {
        self.binary_chain(&[TokenKind::Plus, TokenKind::Minus], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<NodeId> {
        self.binary_chain(&[TokenKind::Star, TokenKind::Slash], Self::primary)
    }

    fn primary(&mut self) -> Result<NodeId> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => {
                self.bump();
                Ok(self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::IntLiteral, Some(token.text)))
            }
            TokenKind::Float => {
                self.bump();
                Ok(self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::FloatLiteral, Some(token.text)))
            }
            TokenKind::Str => {
                self.bump();
                Ok(self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::StringLiteral, Some(token.text)))
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                self.bump();
                Ok(self
                    .corpus
                    .arena_mut()
                    .alloc(SyntaxKind::BoolLiteral, Some(token.text)))
            }
            TokenKind::Ident => {
                self.bump();
                if self.eat(TokenKind::LParen) {
                    let call = self
                        .corpus
                        .arena_mut()
                        .alloc(SyntaxKind::Call, Some(token.text));
                    if !self.at(TokenKind::RParen) {
                        loop {
                            let arg = self.expression()?;
                            self.corpus.arena_mut().add_child(call, arg);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "')'")?;
                    Ok(call)
                } else {
                    Ok(self
                        .corpus
                        .arena_mut()
                        .alloc(SyntaxKind::Ident, Some(token.text)))
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error_here(format!(
                "expected expression, found '{}'",
                describe(&token)
            ))),
        }
    }
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        token.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
use std.print;

unit Greeter {
    // salutation helper
    fn greet(name) {
        let msg = \"hello \" + name;
        print(msg);
        return msg;
    }

    fn silence() {
    }
}
";

    #[test]
    fn parses_sample_structure() {
        let mut corpus = Corpus::new();
        let units = parse_file(&mut corpus, SAMPLE).unwrap();
        assert_eq!(units.len(), 1);

        let unit = units[0];
        assert_eq!(corpus.unit_name(unit), "Greeter");

        let headers = corpus.arena().find_descendants(unit, SyntaxKind::UseHeader);
        assert_eq!(headers.len(), 1);
        assert_eq!(corpus.arena().text(headers[0]), Some("print"));

        let functions = corpus.functions_in(unit);
        assert_eq!(functions.len(), 2);

        let body = corpus.function_body(functions[0]).unwrap();
        assert_eq!(corpus.arena().children(body).len(), 3);

        let comments = corpus.arena().find_descendants(unit, SyntaxKind::Comment);
        assert_eq!(comments.len(), 1);
        assert_eq!(corpus.arena().text(comments[0]), Some("salutation helper"));
    }

    #[test]
    fn headers_are_copied_to_every_unit() {
        let source = "use std.print;\nunit A { }\nunit B { }\n";
        let mut corpus = Corpus::new();
        let units = parse_file(&mut corpus, source).unwrap();
        assert_eq!(units.len(), 2);
        for unit in units {
            let headers = corpus.arena().find_descendants(unit, SyntaxKind::UseHeader);
            assert_eq!(headers.len(), 1);
        }
    }

    #[test]
    fn parses_if_else_and_precedence() {
        let source = "\
unit Math {
    fn pick(a, b) {
        if a + 1 < b * 2 {
            return a;
        } else {
            return b;
        }
    }
}
";
        let mut corpus = Corpus::new();
        let units = parse_file(&mut corpus, source).unwrap();
        let ifs = corpus.arena().find_descendants(units[0], SyntaxKind::IfStmt);
        assert_eq!(ifs.len(), 1);
        // condition, then-block, else-block
        assert_eq!(corpus.arena().children(ifs[0]).len(), 3);

        let condition = corpus.arena().children(ifs[0])[0];
        assert_eq!(corpus.arena().kind(condition), SyntaxKind::Binary);
        assert_eq!(corpus.arena().text(condition), Some("<"));
    }

    #[test]
    fn missing_semicolon_reports_line() {
        let source = "unit A {\n    fn f() {\n        let x = 1\n    }\n}\n";
        let mut corpus = Corpus::new();
        let err = parse_file(&mut corpus, source).unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("';'"));
    }

    #[test]
    fn rejects_files_without_units() {
        let mut corpus = Corpus::new();
        let err = parse_file(&mut corpus, "use std.print;\n").unwrap_err();
        assert!(err.message.contains("no units"));
    }
}
