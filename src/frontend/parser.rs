//! Resilient recursive-descent parser for the managed source language.
//!
//! Produces a best-effort [`SourceFile`] plus a list of syntax errors.
//! Invalid regions are skipped to the next declaration boundary so a
//! half-edited file still yields a usable code model.

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;

/// Parse result containing the AST and any errors.
#[derive(Debug, Clone)]
pub struct Parse {
    pub file: SourceFile,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Check if parsing succeeded without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with byte offset and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub offset: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: u32) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parse source text into an AST.
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens);
    parser.parse_source_file();
    parser.finish()
}

/// The parser state.
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    file: SourceFile,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            file: SourceFile::default(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            file: self.file,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Error)
    }

    fn current_text(&self) -> &'a str {
        self.current().map(|t| t.text).unwrap_or("")
    }

    fn current_offset(&self) -> u32 {
        self.current().map(|t| t.offset).unwrap_or(0)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Ident) && self.current_text() == word
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Error)
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {:?}", kind));
            false
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let offset = self.current_offset();
        self.errors.push(SyntaxError::new(message, offset));
    }

    /// Skips a balanced pair starting at the current `open` token.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        debug_assert!(self.at(open));
        let mut depth = 0usize;
        while !self.at_eof() {
            if self.at(open) {
                depth += 1;
            } else if self.at(close) {
                depth -= 1;
                if depth == 0 {
                    self.bump();
                    return;
                }
            }
            self.bump();
        }
    }

    /// Skips forward to the next declaration boundary (`;` consumed, or a
    /// `}` left in place).
    fn recover_to_boundary(&mut self) {
        while !self.at_eof() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    // =========================================================================
    // File structure
    // =========================================================================

    fn parse_source_file(&mut self) {
        // Types after a file-scoped `namespace X;` land in that namespace.
        let mut file_scoped: Option<usize> = None;

        while !self.at_eof() {
            if self.at_word("using") {
                self.bump();
                let name = self.parse_dotted_name();
                self.file.usings.push(name);
                self.eat(TokenKind::Semicolon);
            } else if self.at_word("namespace") {
                self.bump();
                let name = self.parse_dotted_name();
                if self.eat(TokenKind::Semicolon) {
                    self.file.namespaces.push(NamespaceDecl {
                        name,
                        types: Vec::new(),
                    });
                    file_scoped = Some(self.file.namespaces.len() - 1);
                } else if self.eat(TokenKind::LBrace) {
                    let mut types = Vec::new();
                    self.parse_namespace_body(&name, &mut types);
                    self.file.namespaces.push(NamespaceDecl { name, types });
                } else {
                    self.error("expected '{' or ';' after namespace name");
                    self.recover_to_boundary();
                }
            } else if let Some(decl) = self.try_parse_type_decl() {
                match file_scoped {
                    Some(idx) => self.file.namespaces[idx].types.push(decl),
                    None => self.file.types.push(decl),
                }
            } else if self.at(TokenKind::RBrace) {
                // Stray closing brace at top level.
                self.error("unmatched '}'");
                self.bump();
            } else {
                self.error(format!("unexpected token {:?}", self.current_kind()));
                self.bump();
            }
        }
    }

    /// Parses declarations until the closing `}` of a namespace, flattening
    /// nested namespaces into dotted names.
    fn parse_namespace_body(&mut self, prefix: &str, types: &mut Vec<TypeDecl>) {
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            if self.at_word("using") {
                self.bump();
                let name = self.parse_dotted_name();
                self.file.usings.push(name);
                self.eat(TokenKind::Semicolon);
            } else if self.at_word("namespace") {
                self.bump();
                let inner = self.parse_dotted_name();
                let name: SmolStr = format!("{prefix}.{inner}").into();
                if self.eat(TokenKind::LBrace) {
                    let mut nested = Vec::new();
                    self.parse_namespace_body(&name, &mut nested);
                    self.file.namespaces.push(NamespaceDecl {
                        name,
                        types: nested,
                    });
                } else {
                    self.error("expected '{' after nested namespace name");
                    self.recover_to_boundary();
                }
            } else if let Some(decl) = self.try_parse_type_decl() {
                types.push(decl);
            } else {
                self.error(format!("unexpected token {:?}", self.current_kind()));
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace);
    }

    fn parse_dotted_name(&mut self) -> SmolStr {
        let mut name = String::new();
        while self.at(TokenKind::Ident) {
            name.push_str(self.current_text());
            self.bump();
            if self.at(TokenKind::Dot) {
                name.push('.');
                self.bump();
            } else {
                break;
            }
        }
        name.into()
    }

    // =========================================================================
    // Type declarations
    // =========================================================================

    fn try_parse_type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.pos;
        let attributes = self.parse_attribute_lists();
        let mut modifiers = Modifiers::default();
        while self.at(TokenKind::Ident) && modifiers.apply(self.current_text()) {
            self.bump();
        }

        let kind = if self.at_word("class") || self.at_word("struct") || self.at_word("record") {
            TypeKind::Class
        } else if self.at_word("interface") {
            TypeKind::Interface
        } else if self.at_word("enum") {
            TypeKind::Enum
        } else {
            self.pos = start;
            return None;
        };
        self.bump();

        if !self.at(TokenKind::Ident) {
            self.error("expected type name");
            self.recover_to_boundary();
            return None;
        }
        let name: SmolStr = self.current_text().into();
        self.bump();

        let type_params = self.parse_type_params();

        let mut bases = Vec::new();
        if self.eat(TokenKind::Colon) {
            loop {
                match self.try_parse_type_ref() {
                    Some(base) => bases.push(base),
                    None => {
                        self.error("expected base type name");
                        break;
                    }
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        // Generic constraints: `where T : class` etc.
        while self.at_word("where") {
            while !self.at_eof() && !self.at(TokenKind::LBrace) && !self.at(TokenKind::Semicolon) {
                self.bump();
            }
        }

        let mut decl = TypeDecl {
            kind,
            name,
            type_params,
            modifiers,
            attributes,
            bases,
            members: Vec::new(),
            enum_values: Vec::new(),
        };

        if !self.expect(TokenKind::LBrace) {
            self.recover_to_boundary();
            return Some(decl);
        }

        match kind {
            TypeKind::Enum => self.parse_enum_body(&mut decl),
            _ => self.parse_type_body(&mut decl),
        }
        Some(decl)
    }

    fn parse_type_params(&mut self) -> Vec<SmolStr> {
        let mut params = Vec::new();
        if self.eat(TokenKind::Lt) {
            while self.at(TokenKind::Ident) {
                params.push(SmolStr::from(self.current_text()));
                self.bump();
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt);
        }
        params
    }

    fn parse_enum_body(&mut self, decl: &mut TypeDecl) {
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            let attributes = self.parse_attribute_lists();
            if !self.at(TokenKind::Ident) {
                self.error("expected enum value name");
                self.recover_to_boundary();
                break;
            }
            let name: SmolStr = self.current_text().into();
            self.bump();

            let mut value = None;
            if self.eat(TokenKind::Eq) {
                let negative = self.eat(TokenKind::Minus);
                if self.at(TokenKind::Integer) {
                    let parsed = parse_int(self.current_text());
                    value = parsed.map(|v| if negative { -v } else { v });
                    self.bump();
                } else {
                    // Non-literal constant expression; skip it.
                    while !self.at_eof()
                        && !self.at(TokenKind::Comma)
                        && !self.at(TokenKind::RBrace)
                    {
                        self.bump();
                    }
                }
            }
            decl.enum_values.push(EnumValueDecl {
                name,
                attributes,
                value,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace);
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn parse_type_body(&mut self, decl: &mut TypeDecl) {
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            // Nested type declarations are parsed and hoisted alongside the
            // outer type's file container by the semantic layer; here we
            // keep them out of the member list.
            if let Some(member) = self.parse_member(&decl.name) {
                decl.members.push(member);
            }
        }
        self.expect(TokenKind::RBrace);
    }

    /// Parses one member; returns None for constructors, nested types, and
    /// unrecognized declarations (all skipped with recovery).
    fn parse_member(&mut self, type_name: &str) -> Option<MemberDecl> {
        let attributes = self.parse_attribute_lists();
        let mut modifiers = Modifiers::default();
        // `new` is both a modifier and an expression keyword; as a member
        // head it is always the modifier.
        while self.at(TokenKind::Ident) && modifiers.apply(self.current_text()) {
            self.bump();
        }

        // Nested types.
        if self.at_word("class")
            || self.at_word("struct")
            || self.at_word("record")
            || self.at_word("interface")
            || self.at_word("enum")
        {
            self.recover_nested_type();
            return None;
        }

        // Constructor: `Name(` where Name matches the enclosing type.
        if self.at_word(type_name) && self.nth_kind(1) == TokenKind::LParen {
            self.bump();
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            // Optional `: base(...)` / `: this(...)` initializer.
            if self.eat(TokenKind::Colon) {
                while !self.at_eof() && !self.at(TokenKind::LBrace) && !self.at(TokenKind::Semicolon)
                {
                    self.bump();
                }
            }
            if self.at(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            } else if self.at(TokenKind::FatArrow) {
                self.recover_to_boundary();
            } else {
                self.eat(TokenKind::Semicolon);
            }
            return None;
        }

        let Some(ty) = self.try_parse_type_ref() else {
            self.error("expected member declaration");
            self.recover_to_boundary();
            return None;
        };

        if !self.at(TokenKind::Ident) {
            self.error("expected member name");
            self.recover_to_boundary();
            return None;
        }
        let name: SmolStr = self.current_text().into();
        self.bump();

        // Generic method: `T Foo<T>(...)`.
        if self.at(TokenKind::Lt) && looks_like_type_params(self.tokens, self.pos) {
            self.parse_type_params();
        }

        match self.current_kind() {
            TokenKind::LParen => {
                let params = self.parse_params();
                let body = self.parse_method_body();
                Some(MemberDecl::Method(MethodDecl {
                    name,
                    modifiers,
                    attributes,
                    return_type: ty,
                    params,
                    body,
                }))
            }
            TokenKind::LBrace => {
                // Property with accessor block; accessor bodies are opaque.
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                if self.at(TokenKind::Eq) {
                    // Auto-property initializer.
                    self.recover_to_boundary();
                }
                Some(MemberDecl::Property(PropertyDecl {
                    name,
                    modifiers,
                    attributes,
                    ty,
                }))
            }
            TokenKind::FatArrow => {
                // Expression-bodied property.
                self.recover_to_boundary();
                Some(MemberDecl::Property(PropertyDecl {
                    name,
                    modifiers,
                    attributes,
                    ty,
                }))
            }
            TokenKind::Eq => {
                self.bump();
                let value = self.collect_text_until_semicolon();
                Some(MemberDecl::Field(FieldDecl {
                    name,
                    modifiers,
                    attributes,
                    ty,
                    value: Some(value),
                }))
            }
            TokenKind::Semicolon => {
                self.bump();
                Some(MemberDecl::Field(FieldDecl {
                    name,
                    modifiers,
                    attributes,
                    ty,
                    value: None,
                }))
            }
            _ => {
                self.error("expected '(', '{', '=' or ';' after member name");
                self.recover_to_boundary();
                None
            }
        }
    }

    fn recover_nested_type(&mut self) {
        // Skip the nested declaration wholesale.
        while !self.at_eof() && !self.at(TokenKind::LBrace) && !self.at(TokenKind::Semicolon) {
            self.bump();
        }
        if self.at(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        } else {
            self.eat(TokenKind::Semicolon);
        }
    }

    fn parse_params(&mut self) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        self.expect(TokenKind::LParen);
        while !self.at_eof() && !self.at(TokenKind::RParen) {
            // Parameter attributes and modifiers.
            while self.at(TokenKind::LBracket) {
                self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
            }
            while self.at_word("ref")
                || self.at_word("out")
                || self.at_word("in")
                || self.at_word("params")
                || self.at_word("this")
            {
                self.bump();
            }
            let Some(ty) = self.try_parse_type_ref() else {
                self.error("expected parameter type");
                break;
            };
            if !self.at(TokenKind::Ident) {
                self.error("expected parameter name");
                break;
            }
            let name: SmolStr = self.current_text().into();
            self.bump();
            // Default value.
            if self.eat(TokenKind::Eq) {
                while !self.at_eof() && !self.at(TokenKind::Comma) && !self.at(TokenKind::RParen) {
                    self.bump();
                }
            }
            params.push(ParamDecl { name, ty });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        params
    }

    fn parse_method_body(&mut self) -> Option<Body> {
        if self.at(TokenKind::LBrace) {
            Some(Body::Block(self.parse_block()))
        } else if self.eat(TokenKind::FatArrow) {
            let expr = self.parse_expr();
            self.eat(TokenKind::Semicolon);
            Some(Body::Expr(expr))
        } else {
            self.eat(TokenKind::Semicolon);
            None
        }
    }

    fn collect_text_until_semicolon(&mut self) -> String {
        let mut text = String::new();
        while !self.at_eof() && !self.at(TokenKind::Semicolon) {
            if self.at(TokenKind::LBrace) {
                // Initializer blocks are not interesting as text.
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(self.current_text());
            self.bump();
        }
        self.eat(TokenKind::Semicolon);
        text
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn parse_attribute_lists(&mut self) -> Vec<AttributeDecl> {
        let mut attrs = Vec::new();
        while self.at(TokenKind::LBracket) {
            self.bump();
            loop {
                // Attribute target specifier, e.g. `[return: ...]`.
                if self.at(TokenKind::Ident) && self.nth_kind(1) == TokenKind::Colon {
                    self.bump();
                    self.bump();
                }
                let name = self.parse_dotted_name();
                if name.is_empty() {
                    self.error("expected attribute name");
                    break;
                }
                let simple: SmolStr = name.rsplit('.').next().unwrap_or(&name).into();
                let mut attr = AttributeDecl {
                    name: simple,
                    positional: Vec::new(),
                    named: Vec::new(),
                };
                if self.eat(TokenKind::LParen) {
                    while !self.at_eof() && !self.at(TokenKind::RParen) {
                        if self.at(TokenKind::Ident) && self.nth_kind(1) == TokenKind::Eq {
                            let key: SmolStr = self.current_text().into();
                            self.bump();
                            self.bump();
                            let value = self.parse_attr_value();
                            attr.named.push((key, value));
                        } else {
                            let value = self.parse_attr_value();
                            attr.positional.push(value);
                        }
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen);
                }
                attrs.push(attr);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket);
        }
        attrs
    }

    fn parse_attr_value(&mut self) -> AttrValue {
        match self.current_kind() {
            TokenKind::Integer => {
                let v = parse_int(self.current_text()).unwrap_or_default();
                self.bump();
                AttrValue::Int(v)
            }
            TokenKind::Minus => {
                self.bump();
                match self.current_kind() {
                    TokenKind::Integer => {
                        let v = parse_int(self.current_text()).unwrap_or_default();
                        self.bump();
                        AttrValue::Int(-v)
                    }
                    TokenKind::Decimal => {
                        let v = parse_float(self.current_text());
                        self.bump();
                        AttrValue::Float(-v)
                    }
                    _ => AttrValue::Null,
                }
            }
            TokenKind::Decimal => {
                let v = parse_float(self.current_text());
                self.bump();
                AttrValue::Float(v)
            }
            TokenKind::String => {
                let v = unquote(self.current_text());
                self.bump();
                AttrValue::Str(v)
            }
            TokenKind::Ident => {
                if self.at_word("true") {
                    self.bump();
                    AttrValue::Bool(true)
                } else if self.at_word("false") {
                    self.bump();
                    AttrValue::Bool(false)
                } else if self.at_word("null") {
                    self.bump();
                    AttrValue::Null
                } else if self.at_word("new") {
                    self.parse_attr_array()
                } else if self.at_word("typeof") {
                    self.bump();
                    let mut inner = String::from("typeof(");
                    if self.eat(TokenKind::LParen) {
                        while !self.at_eof() && !self.at(TokenKind::RParen) {
                            inner.push_str(self.current_text());
                            self.bump();
                        }
                        self.expect(TokenKind::RParen);
                    }
                    inner.push(')');
                    AttrValue::Symbol(inner.into())
                } else {
                    AttrValue::Symbol(self.parse_dotted_name())
                }
            }
            _ => {
                self.error("expected attribute argument");
                self.bump();
                AttrValue::Null
            }
        }
    }

    /// `new[] { a, b }` or `new T[] { a, b }`.
    fn parse_attr_array(&mut self) -> AttrValue {
        self.eat_word("new");
        if self.at(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        } else {
            // Element type name.
            let _ = self.try_parse_type_ref();
            if self.at(TokenKind::LBracket) {
                self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
            }
        }
        let mut values = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at_eof() && !self.at(TokenKind::RBrace) {
                values.push(self.parse_attr_value());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace);
        }
        AttrValue::Array(values)
    }

    // =========================================================================
    // Type references
    // =========================================================================

    fn try_parse_type_ref(&mut self) -> Option<TypeRef> {
        if !self.at(TokenKind::Ident) {
            return None;
        }
        let start = self.pos;
        let name = self.parse_dotted_name();
        if name.is_empty() {
            self.pos = start;
            return None;
        }

        let mut args = Vec::new();
        if self.at(TokenKind::Lt) {
            let save = self.pos;
            self.bump();
            loop {
                match self.try_parse_type_ref() {
                    Some(arg) => args.push(arg),
                    None => {
                        // Not a generic argument list after all.
                        self.pos = save;
                        args.clear();
                        break;
                    }
                }
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                if self.eat(TokenKind::Gt) {
                    break;
                }
                self.pos = save;
                args.clear();
                break;
            }
        }

        let mut ty = TypeRef {
            name,
            args,
            nullable: false,
            is_array: false,
        };
        if self.eat(TokenKind::Question) {
            ty.nullable = true;
        }
        if self.at(TokenKind::LBracket) && self.nth_kind(1) == TokenKind::RBracket {
            self.bump();
            self.bump();
            ty.is_array = true;
            if self.eat(TokenKind::Question) {
                ty.nullable = true;
            }
        }
        Some(ty)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Block {
        let mut block = Block::default();
        self.expect(TokenKind::LBrace);
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            block.statements.push(self.parse_stmt());
        }
        self.expect(TokenKind::RBrace);
        block
    }

    fn parse_stmt(&mut self) -> Stmt {
        if self.at(TokenKind::LBrace) {
            return Stmt::Block(self.parse_block());
        }

        if self.at_word("return") {
            self.bump();
            if self.eat(TokenKind::Semicolon) {
                return Stmt::Return(None);
            }
            let expr = self.parse_expr();
            self.consume_to_semicolon();
            return Stmt::Return(Some(expr));
        }

        if self.at_control_keyword() {
            return self.parse_control_stmt();
        }

        // Local declaration: `var x = ...;` or `T x = ...;` / `T x;`.
        if let Some(stmt) = self.try_parse_local() {
            return stmt;
        }

        // Local function: `T Name(...) { ... }`. The body is skipped so its
        // returns are never attributed to the enclosing method.
        if self.try_skip_local_function() {
            return Stmt::Other;
        }

        self.skip_opaque_stmt();
        Stmt::Other
    }

    fn at_control_keyword(&self) -> bool {
        matches!(
            self.current_text(),
            "if" | "else"
                | "while"
                | "for"
                | "foreach"
                | "switch"
                | "try"
                | "catch"
                | "finally"
                | "lock"
                | "using"
                | "do"
                | "checked"
                | "unchecked"
                | "unsafe"
        ) && self.at(TokenKind::Ident)
    }

    fn parse_control_stmt(&mut self) -> Stmt {
        let word = self.current_text();
        let is_do = word == "do";
        // `using (...) ...` vs `using X;` directive-lookalike: only the
        // statement form appears inside a body.
        self.bump();
        if self.at(TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
        }
        if self.at(TokenKind::Semicolon) {
            self.bump();
            return Stmt::Other;
        }
        let body = self.parse_stmt();
        if is_do {
            // `do stmt while (...);`
            if self.eat_word("while") {
                if self.at(TokenKind::LParen) {
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                }
                self.eat(TokenKind::Semicolon);
            }
        }
        match body {
            Stmt::Block(b) => Stmt::Block(b),
            other => {
                // Wrap a single-statement body so returns inside it are
                // still found by the scanner.
                Stmt::Block(Block {
                    statements: vec![other],
                })
            }
        }
    }

    fn try_parse_local(&mut self) -> Option<Stmt> {
        let start = self.pos;
        let ty = if self.at_word("var") {
            self.bump();
            None
        } else {
            match self.try_parse_type_ref() {
                Some(t) => Some(t),
                None => {
                    self.pos = start;
                    return None;
                }
            }
        };
        if !self.at(TokenKind::Ident) {
            self.pos = start;
            return None;
        }
        let name: SmolStr = self.current_text().into();
        self.bump();
        match self.current_kind() {
            TokenKind::Eq => {
                self.bump();
                let init = self.parse_expr();
                self.consume_to_semicolon();
                Some(Stmt::Local {
                    name,
                    ty,
                    init: Some(init),
                })
            }
            TokenKind::Semicolon => {
                self.bump();
                Some(Stmt::Local {
                    name,
                    ty,
                    init: None,
                })
            }
            _ => {
                self.pos = start;
                None
            }
        }
    }

    fn try_skip_local_function(&mut self) -> bool {
        let start = self.pos;
        if self.try_parse_type_ref().is_none() {
            self.pos = start;
            return false;
        }
        if !self.at(TokenKind::Ident) {
            self.pos = start;
            return false;
        }
        self.bump();
        if self.at(TokenKind::Lt) && looks_like_type_params(self.tokens, self.pos) {
            self.parse_type_params();
        }
        if !self.at(TokenKind::LParen) {
            self.pos = start;
            return false;
        }
        self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
        if self.at(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            true
        } else if self.at(TokenKind::FatArrow) {
            self.consume_to_semicolon();
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Consumes an opaque statement: everything up to the next `;` at
    /// nesting depth zero. Braced groups inside (lambda bodies, object
    /// initializers) are skipped without inspection.
    fn skip_opaque_stmt(&mut self) {
        while !self.at_eof() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen),
                TokenKind::LBracket => self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket),
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                    // A brace group not followed by more expression ends the
                    // statement (e.g. a lambda passed as the last argument).
                    if !self.at(TokenKind::Semicolon) && !self.at(TokenKind::Dot) {
                        return;
                    }
                }
                _ => self.bump(),
            }
        }
    }

    /// Consumes any expression remainder up to `;`, then the `;` itself.
    fn consume_to_semicolon(&mut self) {
        while !self.at_eof() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen),
                TokenKind::LBracket => self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket),
                TokenKind::LBrace => self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace),
                _ => self.bump(),
            }
        }
    }

    // =========================================================================
    // Expressions (bounded)
    // =========================================================================

    /// Parses a bounded expression, stopping before the terminator (`;`,
    /// `,`, `)` or `}` at this level). Forms the inferencer cannot type
    /// come back as `Expr::Unknown`.
    fn parse_expr(&mut self) -> Expr {
        // Lambdas first: `x => ...` or `(a, b) => ...`.
        if self.at_lambda() {
            self.skip_lambda();
            return Expr::Lambda;
        }

        if self.at_word("await") {
            self.bump();
            return self.parse_expr();
        }

        let primary = self.parse_primary();

        if self.at_expr_terminator() {
            return primary;
        }
        // A larger expression than we model; swallow the rest.
        self.consume_expr_remainder();
        Expr::Unknown
    }

    fn at_expr_terminator(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace
        ) || self.at_eof()
    }

    fn at_lambda(&self) -> bool {
        if self.at(TokenKind::Ident) && self.nth_kind(1) == TokenKind::FatArrow {
            return true;
        }
        if self.at(TokenKind::LParen) {
            // Scan to the matching paren and peek for `=>`.
            let mut depth = 0usize;
            let mut i = self.pos;
            while let Some(t) = self.tokens.get(i) {
                match t.kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            return self.tokens.get(i + 1).map(|t| t.kind)
                                == Some(TokenKind::FatArrow);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        }
        false
    }

    fn skip_lambda(&mut self) {
        if self.at(TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
        } else {
            self.bump(); // parameter
        }
        self.eat(TokenKind::FatArrow);
        if self.at(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        } else {
            self.consume_expr_remainder();
        }
    }

    fn parse_primary(&mut self) -> Expr {
        match self.current_kind() {
            TokenKind::Integer => {
                let v = parse_int(self.current_text()).unwrap_or_default();
                self.bump();
                Expr::Int(v)
            }
            TokenKind::Decimal => {
                let v = parse_float(self.current_text());
                self.bump();
                Expr::Float(v)
            }
            TokenKind::String => {
                let v = unquote(self.current_text());
                self.bump();
                Expr::Str(v)
            }
            TokenKind::Char => {
                let text = self.current_text();
                let c = text.chars().nth(1).unwrap_or('\0');
                self.bump();
                Expr::Char(c)
            }
            TokenKind::Ident => match self.current_text() {
                "true" => {
                    self.bump();
                    Expr::Bool(true)
                }
                "false" => {
                    self.bump();
                    Expr::Bool(false)
                }
                "null" => {
                    self.bump();
                    Expr::Null
                }
                "new" => self.parse_new_expr(),
                _ => {
                    let save = self.pos;
                    let name: SmolStr = self.current_text().into();
                    self.bump();
                    if self.at_expr_terminator() {
                        Expr::Ident(name)
                    } else {
                        self.pos = save;
                        self.consume_expr_remainder();
                        Expr::Unknown
                    }
                }
            },
            TokenKind::LParen => {
                // Possible cast: `(T)primary`.
                let save = self.pos;
                self.bump();
                if let Some(ty) = self.try_parse_type_ref() {
                    if self.eat(TokenKind::RParen) && self.at_cast_operand() {
                        let operand = self.parse_primary();
                        if self.at_expr_terminator() {
                            return Expr::Cast(ty, Box::new(operand));
                        }
                        self.consume_expr_remainder();
                        return Expr::Cast(ty, Box::new(Expr::Unknown));
                    }
                }
                self.pos = save;
                self.consume_expr_remainder();
                Expr::Unknown
            }
            _ => {
                self.consume_expr_remainder();
                Expr::Unknown
            }
        }
    }

    fn at_cast_operand(&self) -> bool {
        self.current_kind().is_literal()
            || self.at(TokenKind::Ident)
            || self.at(TokenKind::LParen)
    }

    fn parse_new_expr(&mut self) -> Expr {
        self.eat_word("new");

        if self.at(TokenKind::LBrace) {
            // Anonymous object: `new { A = e, B = f }`.
            self.bump();
            let mut props = Vec::new();
            while !self.at_eof() && !self.at(TokenKind::RBrace) {
                if self.at(TokenKind::Ident) && self.nth_kind(1) == TokenKind::Eq {
                    let name: SmolStr = self.current_text().into();
                    self.bump();
                    self.bump();
                    let value = self.parse_expr();
                    props.push((name, value));
                } else if self.at(TokenKind::Ident) {
                    // Projection form: `new { x.Name }` / `new { name }`.
                    let name: SmolStr = self.current_text().into();
                    self.bump();
                    if self.at_expr_terminator() {
                        props.push((name, Expr::Unknown));
                    } else {
                        self.consume_expr_remainder();
                    }
                } else {
                    self.consume_expr_remainder();
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace);
            return Expr::AnonObject(props);
        }

        if self.at(TokenKind::LBracket) {
            // Implicitly typed array.
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
            if self.at(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            }
            return Expr::Unknown;
        }

        let Some(ty) = self.try_parse_type_ref() else {
            self.consume_expr_remainder();
            return Expr::Unknown;
        };
        if self.at(TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
        }
        if self.at(TokenKind::LBrace) {
            // Object / collection initializer.
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        }
        if self.at_expr_terminator() {
            Expr::New(ty)
        } else {
            self.consume_expr_remainder();
            Expr::Unknown
        }
    }

    /// Consumes expression tokens up to (not including) the terminator.
    fn consume_expr_remainder(&mut self) {
        while !self.at_eof() && !self.at_expr_terminator() {
            match self.current_kind() {
                TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen),
                TokenKind::LBracket => self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket),
                TokenKind::LBrace => self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace),
                _ => self.bump(),
            }
        }
    }
}

/// True if `<` at `pos` opens a plausible type parameter list (idents and
/// commas up to a `>`).
fn looks_like_type_params(tokens: &[Token<'_>], pos: usize) -> bool {
    let mut i = pos;
    debug_assert_eq!(tokens.get(i).map(|t| t.kind), Some(TokenKind::Lt));
    i += 1;
    while let Some(t) = tokens.get(i) {
        match t.kind {
            TokenKind::Ident | TokenKind::Comma => i += 1,
            TokenKind::Gt => return true,
            _ => return false,
        }
    }
    false
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    cleaned.parse().ok()
}

fn parse_float(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == 'e' || *c == 'E' || *c == '-' || *c == '+')
        .collect();
    cleaned.parse().unwrap_or_default()
}

fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')).unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
