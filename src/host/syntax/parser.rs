//! Recursive-descent parser producing [`CompilationUnit`] trees.
//!
//! The parser works on the token vector produced by the lexer and never looks at trivia. A
//! handful of C# ambiguities (generic argument lists versus comparisons, casts versus
//! parenthesized expressions, local declarations versus expression statements) are resolved
//! by speculative parsing: the parser records its position, tries the narrower reading and
//! rewinds if it does not fit.

use crate::{
    host::syntax::{
        ast::{
            Accessor, Argument, ArgumentList, AssignOp, AttributeSyntax, BinaryOp, Block,
            CatchClause, CompilationUnit, Declarator, Expr, ExprKind, FieldDecl, Ident, LambdaBody,
            LambdaParam, Literal, MemberDecl, MethodBody, MethodDecl, Modifiers, NameSegment,
            NamespaceDecl, NamespaceMember, NodeId, ParamModifier, Parameter, Pattern,
            PropertyDecl, Stmt, StmtKind, SwitchSection, TypeDecl, TypeDeclKind, TypeSyntax,
            TypeSyntaxKind, UnaryOp, UsingDirective, UsingResource,
        },
        lexer::line_column,
        token::{is_predefined_type, Span, Token, TokenKind},
    },
    Error, Result,
};

/// Tokens that may follow a generic argument list in expression context
const TYPE_ARG_FOLLOWERS: &[&str] = &[
    "(", ")", "]", "}", ":", ";", ",", ".", "?", "==", "!=", "|", "&", "^", "&&", "||", "=>",
    "?.",
];

/// Parse a token vector into a compilation unit
///
/// # Errors
///
/// Returns [`Error::Syntax`] for constructs outside the supported subset.
pub fn parse_tokens(source: &str, tokens: &[Token]) -> Result<CompilationUnit> {
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        next_id: 0,
    };
    parser.compilation_unit()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    next_id: u32,
}

impl<'a> Parser<'a> {
    // ---- token cursor ----

    fn peek(&self, ahead: usize) -> &'a Token {
        let index = (self.pos + ahead).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn at(&self, text: &str) -> bool {
        self.peek(0).is(text)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek(0).kind == kind
    }

    fn at_eof(&self) -> bool {
        self.at_kind(TokenKind::EndOfFile)
    }

    fn bump(&mut self) -> &'a Token {
        let token = self.peek(0);
        if token.kind != TokenKind::EndOfFile {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, text: &str) -> Option<Span> {
        if self.at(text) {
            Some(self.bump().span)
        } else {
            None
        }
    }

    fn expect(&mut self, text: &str) -> Result<Span> {
        match self.eat(text) {
            Some(span) => Ok(span),
            None => Err(self.error(format!("expected '{}'", text))),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let token = self.peek(0);
        let (line, column) = line_column(self.source, token.span.start);
        let found = if token.kind == TokenKind::EndOfFile {
            "end of file".to_string()
        } else {
            format!("'{}'", token.text)
        };
        Error::Syntax {
            message: format!("{}, found {}", message.into(), found),
            line,
            column,
        }
    }

    fn start(&self) -> usize {
        self.peek(0).span.start
    }

    fn span_from(&self, start: usize) -> Span {
        let end = if self.pos == 0 {
            start
        } else {
            self.tokens[self.pos - 1].span.end
        };
        Span::new(start, end.max(start))
    }

    fn new_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn expr(&mut self, start: usize, kind: ExprKind) -> Expr {
        Expr {
            id: self.new_id(),
            span: self.span_from(start),
            kind,
        }
    }

    /// Run `f`; rewind if it fails or declines
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<Option<T>>) -> Option<T> {
        let (pos, next_id) = (self.pos, self.next_id);
        match f(self) {
            Ok(Some(value)) => Some(value),
            _ => {
                self.pos = pos;
                self.next_id = next_id;
                None
            }
        }
    }

    fn ident(&mut self) -> Result<Ident> {
        let token = self.peek(0);
        if token.kind != TokenKind::Identifier {
            return Err(self.error("expected identifier"));
        }
        self.bump();
        Ok(Ident {
            text: token.text.trim_start_matches('@').to_string(),
            span: token.span,
        })
    }

    // ---- declarations ----

    fn compilation_unit(&mut self) -> Result<CompilationUnit> {
        let usings = self.using_directives()?;
        let members = self.namespace_members()?;
        if !self.at_eof() {
            return Err(self.error("expected declaration"));
        }
        Ok(CompilationUnit { usings, members })
    }

    fn using_directives(&mut self) -> Result<Vec<UsingDirective>> {
        let mut usings = Vec::new();
        while self.at("using") || (self.at("global") && self.peek(1).is("using")) {
            let start = self.start();
            self.eat("global");
            self.expect("using")?;
            let is_static = self.eat("static").is_some();
            let alias = if self.peek(0).kind == TokenKind::Identifier && self.peek(1).is("=") {
                let alias = self.ident()?;
                self.bump();
                Some(alias)
            } else {
                None
            };
            let name = self.type_syntax()?;
            self.expect(";")?;
            usings.push(UsingDirective {
                span: self.span_from(start),
                name,
                is_static,
                alias,
            });
        }
        Ok(usings)
    }

    fn namespace_members(&mut self) -> Result<Vec<NamespaceMember>> {
        let mut members = Vec::new();
        while !self.at_eof() && !self.at("}") {
            if self.at("namespace") {
                let start = self.start();
                self.bump();
                let name = self.dotted_name()?;
                if self.eat(";").is_some() {
                    let usings = self.using_directives()?;
                    let inner = self.namespace_members()?;
                    members.push(NamespaceMember::Namespace(NamespaceDecl {
                        span: self.span_from(start),
                        name,
                        usings,
                        members: inner,
                    }));
                    continue;
                }
                self.expect("{")?;
                let usings = self.using_directives()?;
                let inner = self.namespace_members()?;
                self.expect("}")?;
                members.push(NamespaceMember::Namespace(NamespaceDecl {
                    span: self.span_from(start),
                    name,
                    usings,
                    members: inner,
                }));
            } else if self.at(";") {
                self.bump();
            } else {
                let start = self.start();
                let attributes = self.attributes()?;
                let modifiers = self.modifiers();
                let decl = self.type_decl(start, attributes, modifiers)?;
                members.push(NamespaceMember::Type(decl));
            }
        }
        Ok(members)
    }

    fn dotted_name(&mut self) -> Result<String> {
        let mut name = self.ident()?.text;
        while self.eat(".").is_some() {
            name.push('.');
            name.push_str(&self.ident()?.text);
        }
        Ok(name)
    }

    fn attributes(&mut self) -> Result<Vec<AttributeSyntax>> {
        let mut attributes = Vec::new();
        while self.at("[") {
            self.bump();
            // attribute target such as `assembly:` or `return:`
            if (self.at_kind(TokenKind::Identifier) || self.at_kind(TokenKind::Keyword))
                && self.peek(1).is(":")
            {
                self.bump();
                self.bump();
            }
            loop {
                let start = self.start();
                let name = self.type_syntax()?;
                let args = if self.at("(") {
                    Some(self.argument_list("(", ")")?)
                } else {
                    None
                };
                attributes.push(AttributeSyntax {
                    span: self.span_from(start),
                    name,
                    args,
                });
                if self.eat(",").is_none() || self.at("]") {
                    break;
                }
            }
            self.expect("]")?;
        }
        Ok(attributes)
    }

    fn modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            let token = self.peek(0);
            let flag = match token.kind {
                TokenKind::Keyword => Modifiers::from_keyword(&token.text),
                // `partial` and `async` are contextual
                TokenKind::Identifier
                    if matches!(token.text.as_str(), "partial" | "async")
                        && matches!(
                            self.peek(1).kind,
                            TokenKind::Identifier | TokenKind::Keyword
                        ) =>
                {
                    Modifiers::from_keyword(&token.text)
                }
                _ => None,
            };
            // `new` starts an expression unless it is followed by another declaration token
            if token.is("new")
                && !matches!(self.peek(1).kind, TokenKind::Keyword | TokenKind::Identifier)
            {
                return modifiers;
            }
            match flag {
                Some(flag) => {
                    modifiers |= flag;
                    self.bump();
                }
                None => return modifiers,
            }
        }
    }

    fn type_decl_kind(&mut self) -> Option<TypeDeclKind> {
        let kind = match self.peek(0).text.as_str() {
            "class" if self.at_kind(TokenKind::Keyword) => TypeDeclKind::Class,
            "struct" if self.at_kind(TokenKind::Keyword) => TypeDeclKind::Struct,
            "interface" if self.at_kind(TokenKind::Keyword) => TypeDeclKind::Interface,
            "enum" if self.at_kind(TokenKind::Keyword) => TypeDeclKind::Enum,
            "delegate" if self.at_kind(TokenKind::Keyword) => TypeDeclKind::Delegate,
            "record" if self.at_kind(TokenKind::Identifier) => {
                self.bump();
                if self.at("struct") {
                    self.bump();
                    return Some(TypeDeclKind::Struct);
                }
                self.eat("class");
                return Some(TypeDeclKind::Record);
            }
            _ => return None,
        };
        self.bump();
        Some(kind)
    }

    fn at_type_decl(&self) -> bool {
        matches!(
            self.peek(0).text.as_str(),
            "class" | "struct" | "interface" | "enum"
        ) && self.at_kind(TokenKind::Keyword)
            || (self.at("delegate") && !self.peek(1).is("{") && !self.peek(1).is("("))
            || (self.at("record") && self.peek(1).kind == TokenKind::Identifier)
            || (self.at("record") && (self.peek(1).is("class") || self.peek(1).is("struct")))
    }

    fn type_decl(
        &mut self,
        start: usize,
        attributes: Vec<AttributeSyntax>,
        modifiers: Modifiers,
    ) -> Result<TypeDecl> {
        let Some(kind) = self.type_decl_kind() else {
            return Err(self.error("expected type declaration"));
        };

        if kind == TypeDeclKind::Delegate {
            let ret = self.type_syntax()?;
            let name = self.ident()?;
            let type_params = self.type_params()?;
            let params = self.parameters("(", ")")?;
            self.skip_constraints();
            self.expect(";")?;
            return Ok(TypeDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                kind,
                name,
                type_params,
                bases: Vec::new(),
                members: Vec::new(),
                enum_members: Vec::new(),
                delegate: Some((ret, params)),
            });
        }

        let name = self.ident()?;
        let type_params = self.type_params()?;
        let mut members = Vec::new();
        if self.at("(") {
            // primary constructor parameters become get-only properties
            for param in self.parameters("(", ")")? {
                members.push(MemberDecl::Property(PropertyDecl {
                    span: param.name.span,
                    attributes: Vec::new(),
                    modifiers: Modifiers::PUBLIC,
                    ty: param.ty,
                    name: param.name,
                    params: Vec::new(),
                    accessors: vec![Accessor {
                        kind: "get".to_string(),
                        body: None,
                    }],
                    expr_body: None,
                    initializer: None,
                }));
            }
        }
        let mut bases = Vec::new();
        if self.eat(":").is_some() {
            loop {
                bases.push(self.type_syntax()?);
                if self.at("(") {
                    // record base arguments
                    self.argument_list("(", ")")?;
                }
                if self.eat(",").is_none() {
                    break;
                }
            }
        }
        self.skip_constraints();

        let mut enum_members = Vec::new();
        if self.eat(";").is_none() {
            self.expect("{")?;
            if kind == TypeDeclKind::Enum {
                while !self.at("}") {
                    self.attributes()?;
                    enum_members.push(self.ident()?);
                    if self.eat("=").is_some() {
                        self.expression()?;
                    }
                    if self.eat(",").is_none() {
                        break;
                    }
                }
            } else {
                while !self.at("}") && !self.at_eof() {
                    members.push(self.member_decl(&name.text)?);
                }
            }
            self.expect("}")?;
            self.eat(";");
        }

        Ok(TypeDecl {
            span: self.span_from(start),
            attributes,
            modifiers,
            kind,
            name,
            type_params,
            bases,
            members,
            enum_members,
            delegate: None,
        })
    }

    fn type_params(&mut self) -> Result<Vec<Ident>> {
        let mut params = Vec::new();
        if self.eat("<").is_some() {
            loop {
                self.attributes()?;
                if self.at("in") || self.at("out") {
                    self.bump();
                }
                params.push(self.ident()?);
                if self.eat(",").is_none() {
                    break;
                }
            }
            self.expect(">")?;
        }
        Ok(params)
    }

    /// Skip `where T : ...` clauses
    fn skip_constraints(&mut self) {
        while self.at("where")
            && self.peek(1).kind == TokenKind::Identifier
            && self.peek(2).is(":")
        {
            self.bump();
            let mut depth = 0usize;
            while !self.at_eof() {
                if depth == 0
                    && (self.at("{") || self.at(";") || self.at("=>") || self.at("where"))
                {
                    break;
                }
                if self.at("(") || self.at("<") {
                    depth += 1;
                } else if (self.at(")") || self.at(">")) && depth > 0 {
                    depth -= 1;
                }
                self.bump();
            }
        }
    }

    fn member_decl(&mut self, type_name: &str) -> Result<MemberDecl> {
        let start = self.start();
        let attributes = self.attributes()?;
        let modifiers = self.modifiers();

        if self.at_type_decl() {
            return Ok(MemberDecl::Type(self.type_decl(start, attributes, modifiers)?));
        }

        // constructor or finalizer
        let is_finalizer = self.eat("~").is_some();
        if self.peek(0).kind == TokenKind::Identifier
            && self.peek(0).text == type_name
            && self.peek(1).is("(")
        {
            let mut name = self.ident()?;
            if is_finalizer {
                name.text = "Finalize".to_string();
            }
            let params = self.parameters("(", ")")?;
            let initializer = if self.eat(":").is_some() {
                if !(self.at("base") || self.at("this")) {
                    return Err(self.error("expected 'base' or 'this'"));
                }
                self.bump();
                Some(self.argument_list("(", ")")?)
            } else {
                None
            };
            let body = self.method_body()?;
            return Ok(MemberDecl::Method(MethodDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                return_type: None,
                name,
                type_params: Vec::new(),
                params,
                initializer,
                body,
                is_constructor: !is_finalizer,
            }));
        }

        if self.at("event") {
            self.bump();
        }

        // conversion operators: `implicit operator T(...)`
        if self.at("implicit") || self.at("explicit") {
            let op_start = self.peek(0).span;
            let kind = self.bump().text.clone();
            self.expect("operator")?;
            let ret = self.type_syntax()?;
            let params = self.parameters("(", ")")?;
            let body = self.method_body()?;
            return Ok(MemberDecl::Method(MethodDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                return_type: Some(ret),
                name: Ident {
                    text: if kind == "implicit" {
                        "op_Implicit"
                    } else {
                        "op_Explicit"
                    }
                    .to_string(),
                    span: op_start,
                },
                type_params: Vec::new(),
                params,
                initializer: None,
                body,
                is_constructor: false,
            }));
        }

        let ty = self.type_syntax()?;

        if self.at("operator") {
            let op_span = self.bump().span;
            let op = self.bump().text.clone();
            let name = match op.parse::<BinaryOp>() {
                Ok(op) => op.operator_method().to_string(),
                Err(_) => match op.as_str() {
                    "!" => "op_LogicalNot".to_string(),
                    "true" => "op_True".to_string(),
                    "false" => "op_False".to_string(),
                    _ => "op_Unknown".to_string(),
                },
            };
            let params = self.parameters("(", ")")?;
            let body = self.method_body()?;
            return Ok(MemberDecl::Method(MethodDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                return_type: Some(ty),
                name: Ident {
                    text: name,
                    span: op_span,
                },
                type_params: Vec::new(),
                params,
                initializer: None,
                body,
                is_constructor: false,
            }));
        }

        if self.at("this") {
            let name_span = self.bump().span;
            let params = self.parameters("[", "]")?;
            let (accessors, expr_body) = self.property_body()?;
            return Ok(MemberDecl::Property(PropertyDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                ty,
                name: Ident {
                    text: "this".to_string(),
                    span: name_span,
                },
                params,
                accessors,
                expr_body,
                initializer: None,
            }));
        }

        let mut name = self.ident()?;
        // explicit interface implementation, `IDisposable.Dispose`
        while self.at(".") && self.peek(1).kind == TokenKind::Identifier {
            self.bump();
            name = self.ident()?;
        }

        if self.at("(") || self.at("<") {
            let type_params = self.type_params()?;
            let params = self.parameters("(", ")")?;
            self.skip_constraints();
            let body = self.method_body()?;
            return Ok(MemberDecl::Method(MethodDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                return_type: Some(ty),
                name,
                type_params,
                params,
                initializer: None,
                body,
                is_constructor: false,
            }));
        }

        if self.at("{") || self.at("=>") {
            let (accessors, expr_body) = self.property_body()?;
            let initializer = if self.eat("=").is_some() {
                let init = self.expression()?;
                self.expect(";")?;
                Some(init)
            } else {
                None
            };
            return Ok(MemberDecl::Property(PropertyDecl {
                span: self.span_from(start),
                attributes,
                modifiers,
                ty,
                name,
                params: Vec::new(),
                accessors,
                expr_body,
                initializer,
            }));
        }

        let declarators = self.declarators_from(name)?;
        self.expect(";")?;
        Ok(MemberDecl::Field(FieldDecl {
            span: self.span_from(start),
            attributes,
            modifiers,
            ty,
            declarators,
        }))
    }

    fn property_body(&mut self) -> Result<(Vec<Accessor>, Option<Expr>)> {
        if self.eat("=>").is_some() {
            let body = self.expression()?;
            self.expect(";")?;
            return Ok((Vec::new(), Some(body)));
        }
        self.expect("{")?;
        let mut accessors = Vec::new();
        while !self.at("}") && !self.at_eof() {
            self.attributes()?;
            self.modifiers();
            let kind = self.ident()?.text;
            if !matches!(kind.as_str(), "get" | "set" | "init" | "add" | "remove") {
                return Err(self.error("expected accessor"));
            }
            let body = self.method_body()?;
            accessors.push(Accessor { kind, body });
        }
        self.expect("}")?;
        Ok((accessors, None))
    }

    fn method_body(&mut self) -> Result<Option<MethodBody>> {
        if self.eat(";").is_some() {
            return Ok(None);
        }
        if self.eat("=>").is_some() {
            let body = self.expression()?;
            self.expect(";")?;
            return Ok(Some(MethodBody::Expr(body)));
        }
        Ok(Some(MethodBody::Block(self.block()?)))
    }

    fn parameters(&mut self, open: &str, close: &str) -> Result<Vec<Parameter>> {
        self.expect(open)?;
        let mut params = Vec::new();
        while !self.at(close) {
            let attributes = self.attributes()?;
            let modifier = match self.peek(0).text.as_str() {
                "params" => ParamModifier::Params,
                "ref" => ParamModifier::Ref,
                "out" => ParamModifier::Out,
                "in" => ParamModifier::In,
                "this" => ParamModifier::This,
                _ => ParamModifier::None,
            };
            if modifier != ParamModifier::None {
                self.bump();
            }
            let ty = self.type_syntax()?;
            let name = self.ident()?;
            let default = if self.eat("=").is_some() {
                Some(self.expression()?)
            } else {
                None
            };
            params.push(Parameter {
                attributes,
                modifier,
                ty,
                name,
                default,
            });
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect(close)?;
        Ok(params)
    }

    fn declarators_from(&mut self, first: Ident) -> Result<Vec<Declarator>> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let start = name.span.start;
            let init = if self.eat("=").is_some() {
                Some(self.variable_initializer()?)
            } else {
                None
            };
            declarators.push(Declarator {
                span: self.span_from(start),
                name,
                init,
            });
            if self.eat(",").is_none() {
                break;
            }
            name = self.ident()?;
        }
        Ok(declarators)
    }

    fn variable_initializer(&mut self) -> Result<Expr> {
        if self.at("{") {
            let start = self.start();
            let elements = self.initializer()?;
            return Ok(self.expr(start, ExprKind::InitializerList(elements)));
        }
        self.expression()
    }

    // ---- types ----

    fn type_syntax(&mut self) -> Result<TypeSyntax> {
        let start = self.start();
        let mut ty = if self.at("(") {
            self.bump();
            let mut elements = Vec::new();
            loop {
                elements.push(self.type_syntax()?);
                if self.peek(0).kind == TokenKind::Identifier {
                    self.bump();
                }
                if self.eat(",").is_none() {
                    break;
                }
            }
            self.expect(")")?;
            TypeSyntax {
                span: self.span_from(start),
                kind: TypeSyntaxKind::Tuple(elements),
            }
        } else if self.at_kind(TokenKind::Keyword) && is_predefined_type(&self.peek(0).text) {
            let name = self.bump().text.clone();
            TypeSyntax {
                span: self.span_from(start),
                kind: TypeSyntaxKind::Predefined(name),
            }
        } else {
            let mut segments = Vec::new();
            if self.at("global") && self.peek(1).is("::") {
                self.bump();
                self.bump();
            }
            loop {
                let name = self.ident()?;
                let args = if self.at("<") {
                    self.type_arg_list()?
                } else {
                    Vec::new()
                };
                segments.push(NameSegment { name, args });
                if !(self.at(".") && self.peek(1).kind == TokenKind::Identifier) {
                    break;
                }
                self.bump();
            }
            TypeSyntax {
                span: self.span_from(start),
                kind: TypeSyntaxKind::Named(segments),
            }
        };

        loop {
            if self.at("?") && !self.peek(1).is("?") {
                self.bump();
                ty = TypeSyntax {
                    span: self.span_from(start),
                    kind: TypeSyntaxKind::Nullable(Box::new(ty)),
                };
            } else if self.at("[") && (self.peek(1).is("]") || self.peek(1).is(",")) {
                self.bump();
                let mut rank = 1;
                while self.eat(",").is_some() {
                    rank += 1;
                }
                self.expect("]")?;
                ty = TypeSyntax {
                    span: self.span_from(start),
                    kind: TypeSyntaxKind::Array {
                        elem: Box::new(ty),
                        rank,
                    },
                };
            } else {
                return Ok(ty);
            }
        }
    }

    fn type_arg_list(&mut self) -> Result<Vec<TypeSyntax>> {
        self.expect("<")?;
        let mut args = Vec::new();
        loop {
            args.push(self.type_syntax()?);
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect(">")?;
        Ok(args)
    }

    /// Generic arguments in expression context, only when followed by a token that cannot
    /// continue a comparison
    fn try_type_args(&mut self) -> Vec<TypeSyntax> {
        if !self.at("<") {
            return Vec::new();
        }
        self.speculate(|p| {
            let args = p.type_arg_list()?;
            let next = p.peek(0);
            if next.kind == TokenKind::EndOfFile || TYPE_ARG_FOLLOWERS.iter().any(|t| next.is(t)) {
                Ok(Some(args))
            } else {
                Ok(None)
            }
        })
        .unwrap_or_default()
    }

    // ---- statements ----

    fn block(&mut self) -> Result<Block> {
        let start = self.start();
        let open = self.expect("{")?;
        let mut stmts = Vec::new();
        while !self.at("}") && !self.at_eof() {
            stmts.push(self.statement()?);
        }
        let close = self.expect("}")?;
        Ok(Block {
            span: self.span_from(start),
            open,
            close,
            stmts,
        })
    }

    fn embedded(&mut self) -> Result<Box<Stmt>> {
        Ok(Box::new(self.statement()?))
    }

    fn paren_expr(&mut self) -> Result<Expr> {
        self.expect("(")?;
        let expr = self.expression()?;
        self.expect(")")?;
        Ok(expr)
    }

    fn stmt(&self, start: usize, kind: StmtKind) -> Stmt {
        Stmt {
            span: self.span_from(start),
            kind,
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        let start = self.start();
        let token = self.peek(0);

        if token.kind == TokenKind::Keyword {
            match token.text.as_str() {
                "if" => {
                    self.bump();
                    let cond = self.paren_expr()?;
                    let then = self.embedded()?;
                    let otherwise = if self.eat("else").is_some() {
                        Some(self.embedded()?)
                    } else {
                        None
                    };
                    return Ok(self.stmt(start, StmtKind::If { cond, then, otherwise }));
                }
                "switch" => return self.switch_statement(start),
                "try" => {
                    self.bump();
                    let block = self.block()?;
                    let mut catches = Vec::new();
                    while self.at("catch") {
                        self.bump();
                        let (mut ty, mut name) = (None, None);
                        if self.eat("(").is_some() {
                            ty = Some(self.type_syntax()?);
                            if self.at_kind(TokenKind::Identifier) {
                                name = Some(self.ident()?);
                            }
                            self.expect(")")?;
                        }
                        let filter = if self.at("when") {
                            self.bump();
                            Some(self.paren_expr()?)
                        } else {
                            None
                        };
                        let block = self.block()?;
                        catches.push(CatchClause { ty, name, filter, block });
                    }
                    let finally = if self.eat("finally").is_some() {
                        Some(self.block()?)
                    } else {
                        None
                    };
                    return Ok(self.stmt(start, StmtKind::Try { block, catches, finally }));
                }
                "using" => {
                    self.bump();
                    return self.using_statement(start, false);
                }
                "await" if self.peek(1).is("using") => {
                    self.bump();
                    self.bump();
                    return self.using_statement(start, true);
                }
                "await" if self.peek(1).is("foreach") => {
                    self.bump();
                    return self.statement_foreach(start);
                }
                "return" => {
                    self.bump();
                    let value = if self.at(";") { None } else { Some(self.expression()?) };
                    self.expect(";")?;
                    return Ok(self.stmt(start, StmtKind::Return(value)));
                }
                "throw" => {
                    self.bump();
                    let value = if self.at(";") { None } else { Some(self.expression()?) };
                    self.expect(";")?;
                    return Ok(self.stmt(start, StmtKind::Throw(value)));
                }
                "while" => {
                    self.bump();
                    let cond = self.paren_expr()?;
                    let body = self.embedded()?;
                    return Ok(self.stmt(start, StmtKind::While { cond, body }));
                }
                "do" => {
                    self.bump();
                    let body = self.embedded()?;
                    self.expect("while")?;
                    let cond = self.paren_expr()?;
                    self.expect(";")?;
                    return Ok(self.stmt(start, StmtKind::DoWhile { body, cond }));
                }
                "for" => return self.for_statement(start),
                "foreach" => return self.statement_foreach(start),
                "lock" => {
                    self.bump();
                    let expr = self.paren_expr()?;
                    let body = self.embedded()?;
                    return Ok(self.stmt(start, StmtKind::Lock { expr, body }));
                }
                "break" => {
                    self.bump();
                    self.expect(";")?;
                    return Ok(self.stmt(start, StmtKind::Break));
                }
                "continue" => {
                    self.bump();
                    self.expect(";")?;
                    return Ok(self.stmt(start, StmtKind::Continue));
                }
                "const" => {
                    self.bump();
                    let ty = self.type_syntax()?;
                    let first = self.ident()?;
                    let declarators = self.declarators_from(first)?;
                    self.expect(";")?;
                    return Ok(self.stmt(
                        start,
                        StmtKind::Local { ty, declarators, is_using: false, is_const: true },
                    ));
                }
                _ => {}
            }
        }

        if self.at("{") {
            let block = self.block()?;
            return Ok(self.stmt(start, StmtKind::Block(block)));
        }
        if self.eat(";").is_some() {
            return Ok(self.stmt(start, StmtKind::Empty));
        }

        if let Some(function) = self.speculate(|p| p.local_function()) {
            return Ok(self.stmt(start, StmtKind::LocalFunction(Box::new(function))));
        }

        if let Some((ty, first)) = self.speculate(|p| p.local_declaration_head()) {
            let declarators = self.declarators_from(first)?;
            self.expect(";")?;
            return Ok(self.stmt(
                start,
                StmtKind::Local { ty, declarators, is_using: false, is_const: false },
            ));
        }

        let expr = self.expression()?;
        self.expect(";")?;
        Ok(self.stmt(start, StmtKind::Expression(expr)))
    }

    fn local_declaration_head(&mut self) -> Result<Option<(TypeSyntax, Ident)>> {
        let ty = self.type_syntax()?;
        if !self.at_kind(TokenKind::Identifier) {
            return Ok(None);
        }
        let name = self.ident()?;
        if self.at("=") || self.at(";") || self.at(",") {
            Ok(Some((ty, name)))
        } else {
            Ok(None)
        }
    }

    fn local_function(&mut self) -> Result<Option<MethodDecl>> {
        let start = self.start();
        let attributes = self.attributes()?;
        let modifiers = self.modifiers();
        let return_type = self.type_syntax()?;
        if !self.at_kind(TokenKind::Identifier) {
            return Ok(None);
        }
        let name = self.ident()?;
        if !(self.at("(") || self.at("<")) {
            return Ok(None);
        }
        let type_params = self.type_params()?;
        let params = self.parameters("(", ")")?;
        self.skip_constraints();
        if !(self.at("{") || self.at("=>")) {
            return Ok(None);
        }
        let body = self.method_body()?;
        Ok(Some(MethodDecl {
            span: self.span_from(start),
            attributes,
            modifiers,
            return_type: Some(return_type),
            name,
            type_params,
            params,
            initializer: None,
            body,
            is_constructor: false,
        }))
    }

    fn using_statement(&mut self, start: usize, is_await: bool) -> Result<Stmt> {
        if self.eat("(").is_some() {
            let resource = match self.speculate(|p| p.local_declaration_head()) {
                Some((ty, first)) => UsingResource::Declaration {
                    ty,
                    declarators: self.declarators_from(first)?,
                },
                None => UsingResource::Expr(self.expression()?),
            };
            self.expect(")")?;
            let body = self.embedded()?;
            return Ok(self.stmt(start, StmtKind::Using { is_await, resource, body }));
        }
        let ty = self.type_syntax()?;
        let first = self.ident()?;
        let declarators = self.declarators_from(first)?;
        self.expect(";")?;
        Ok(self.stmt(
            start,
            StmtKind::Local { ty, declarators, is_using: true, is_const: false },
        ))
    }

    fn switch_statement(&mut self, start: usize) -> Result<Stmt> {
        self.expect("switch")?;
        let expr = self.paren_expr()?;
        self.expect("{")?;
        let mut sections = Vec::new();
        while !self.at("}") && !self.at_eof() {
            let mut labels = Vec::new();
            while self.at("case") || self.at("default") {
                if self.eat("default").is_some() {
                    labels.push(None);
                } else {
                    self.bump();
                    labels.push(Some(self.pattern()?));
                    if self.at("when") {
                        self.bump();
                        self.expression()?;
                    }
                }
                self.expect(":")?;
            }
            if labels.is_empty() {
                return Err(self.error("expected 'case' or 'default'"));
            }
            let mut stmts = Vec::new();
            while !self.at("case") && !self.at("default") && !self.at("}") && !self.at_eof() {
                stmts.push(self.statement()?);
            }
            sections.push(SwitchSection { labels, stmts });
        }
        self.expect("}")?;
        Ok(self.stmt(start, StmtKind::Switch { expr, sections }))
    }

    fn for_statement(&mut self, start: usize) -> Result<Stmt> {
        self.expect("for")?;
        self.expect("(")?;
        let init = if self.at(";") {
            None
        } else if let Some((ty, first)) = self.speculate(|p| p.local_declaration_head()) {
            let init_start = ty.span.start;
            let declarators = self.declarators_from(first)?;
            Some(Box::new(self.stmt(
                init_start,
                StmtKind::Local { ty, declarators, is_using: false, is_const: false },
            )))
        } else {
            let init_start = self.start();
            let expr = self.expression()?;
            Some(Box::new(self.stmt(init_start, StmtKind::Expression(expr))))
        };
        self.expect(";")?;
        let cond = if self.at(";") { None } else { Some(self.expression()?) };
        self.expect(";")?;
        let mut step = Vec::new();
        while !self.at(")") {
            step.push(self.expression()?);
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect(")")?;
        let body = self.embedded()?;
        Ok(self.stmt(start, StmtKind::For { init, cond, step, body }))
    }

    fn statement_foreach(&mut self, start: usize) -> Result<Stmt> {
        self.expect("foreach")?;
        self.expect("(")?;
        let ty = self.type_syntax()?;
        let name = self.ident()?;
        self.expect("in")?;
        let expr = self.expression()?;
        self.expect(")")?;
        let body = self.embedded()?;
        Ok(self.stmt(start, StmtKind::Foreach { ty, name, expr, body }))
    }

    // ---- patterns ----

    fn pattern(&mut self) -> Result<Pattern> {
        if self.at("not") && self.at_kind(TokenKind::Identifier) {
            self.bump();
            return Ok(Pattern::Not(Box::new(self.pattern()?)));
        }
        if self.at("var") && self.peek(1).kind == TokenKind::Identifier {
            self.bump();
            return Ok(Pattern::Var(self.ident()?));
        }
        if self.at("_") {
            self.bump();
            return Ok(Pattern::Discard);
        }
        if self.at("{") {
            let mut depth = 0usize;
            loop {
                if self.at("{") {
                    depth += 1;
                } else if self.at("}") {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        break;
                    }
                } else if self.at_eof() {
                    return Err(self.error("expected '}'"));
                }
                self.bump();
            }
            let designation = if self.at_kind(TokenKind::Identifier) && !self.at("when") {
                Some(self.ident()?)
            } else {
                None
            };
            return Ok(Pattern::Property(designation));
        }
        if let Some(pattern) = self.speculate(|p| {
            let ty = p.type_syntax()?;
            if p.at(".") || p.at("(") {
                return Ok(None);
            }
            let designation = if p.at_kind(TokenKind::Identifier)
                && !(p.at("when") || p.at("and") || p.at("or"))
            {
                Some(p.ident()?)
            } else {
                None
            };
            Ok(Some(Pattern::Type { ty, designation }))
        }) {
            return Ok(pattern);
        }
        Ok(Pattern::Constant(Box::new(self.binary(BinaryOp::Shl.precedence() - 1)?)))
    }

    // ---- expressions ----

    /// Parse a full expression
    fn expression(&mut self) -> Result<Expr> {
        if let Some(lambda) = self.try_lambda()? {
            return Ok(lambda);
        }
        let start = self.start();
        let target = self.conditional()?;
        let op = match self.peek(0).text.as_str() {
            text if self.at_kind(TokenKind::Punct) => text.parse::<AssignOp>().ok(),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let value = if self.at("{") {
                let init_start = self.start();
                let elements = self.initializer()?;
                self.expr(init_start, ExprKind::InitializerList(elements))
            } else {
                self.expression()?
            };
            return Ok(self.expr(
                start,
                ExprKind::Assignment {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
            ));
        }
        Ok(target)
    }

    fn try_lambda(&mut self) -> Result<Option<Expr>> {
        let start = self.start();
        let mut offset = 0;
        let is_async = self.at("async")
            && (self.peek(1).kind == TokenKind::Identifier
                || self.peek(1).is("(")
                || self.peek(1).is("delegate"));
        if is_async {
            offset = 1;
        }

        if self.peek(offset).is("delegate") {
            self.pos += offset + 1;
            let params = if self.at("(") {
                self.parameters("(", ")")?
                    .into_iter()
                    .map(|p| LambdaParam { ty: Some(p.ty), name: p.name })
                    .collect()
            } else {
                Vec::new()
            };
            let body = LambdaBody::Block(self.block()?);
            return Ok(Some(self.expr(start, ExprKind::Lambda { is_async, params, body })));
        }

        let params = if self.peek(offset).kind == TokenKind::Identifier
            && self.peek(offset + 1).is("=>")
        {
            self.pos += offset;
            let name = self.ident()?;
            vec![LambdaParam { ty: None, name }]
        } else if self.peek(offset).is("(") {
            // find the matching parenthesis and check for `=>`
            let mut depth = 0usize;
            let mut index = offset;
            loop {
                let token = self.peek(index);
                if token.kind == TokenKind::EndOfFile {
                    return Ok(None);
                }
                if token.is("(") {
                    depth += 1;
                } else if token.is(")") {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                index += 1;
            }
            if !self.peek(index + 1).is("=>") {
                return Ok(None);
            }
            self.pos += offset;
            self.expect("(")?;
            let mut params = Vec::new();
            while !self.at(")") {
                self.eat("ref");
                self.eat("out");
                self.eat("in");
                let param = if self.peek(1).is(",") || self.peek(1).is(")") {
                    LambdaParam { ty: None, name: self.ident()? }
                } else {
                    let ty = self.type_syntax()?;
                    LambdaParam { ty: Some(ty), name: self.ident()? }
                };
                params.push(param);
                if self.eat(",").is_none() {
                    break;
                }
            }
            self.expect(")")?;
            params
        } else {
            return Ok(None);
        };

        self.expect("=>")?;
        let body = if self.at("{") {
            LambdaBody::Block(self.block()?)
        } else {
            LambdaBody::Expr(Box::new(self.expression()?))
        };
        Ok(Some(self.expr(start, ExprKind::Lambda { is_async, params, body })))
    }

    fn conditional(&mut self) -> Result<Expr> {
        let start = self.start();
        let cond = self.binary(0)?;
        if self.at("?") {
            self.bump();
            let when_true = self.expression()?;
            self.expect(":")?;
            let when_false = self.expression()?;
            return Ok(self.expr(
                start,
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                },
            ));
        }
        Ok(cond)
    }

    fn binary_op(&self) -> Option<(BinaryOp, usize)> {
        let token = self.peek(0);
        if token.kind != TokenKind::Punct {
            return None;
        }
        // `>` `>` written without a gap is a right shift
        if token.text == ">" {
            let next = self.peek(1);
            if next.is(">") && next.span.start == token.span.end {
                return Some((BinaryOp::Shr, 2));
            }
        }
        token.text.parse::<BinaryOp>().ok().map(|op| (op, 1))
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr> {
        let start = self.start();
        let mut left = self.unary()?;
        loop {
            let relational = BinaryOp::Lt.precedence();
            if self.at("is") && relational > min_prec {
                self.bump();
                let pattern = self.pattern()?;
                left = self.expr(start, ExprKind::Is { expr: Box::new(left), pattern });
                continue;
            }
            if self.at("as") && relational > min_prec {
                self.bump();
                let ty = self.type_syntax()?;
                left = self.expr(start, ExprKind::As { expr: Box::new(left), ty });
                continue;
            }
            let Some((op, width)) = self.binary_op() else {
                break;
            };
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            self.pos += width;
            // `??` is right associative
            let right = if op == BinaryOp::Coalesce {
                self.binary(prec - 1)?
            } else {
                self.binary(prec)?
            };
            left = self.expr(
                start,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let start = self.start();
        let op = match self.peek(0).text.as_str() {
            "!" => Some(UnaryOp::Not),
            "-" => Some(UnaryOp::Neg),
            "+" => Some(UnaryOp::Plus),
            "~" => Some(UnaryOp::Complement),
            "++" => Some(UnaryOp::PreIncrement),
            "--" => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        if let Some(op) = op.filter(|_| self.at_kind(TokenKind::Punct)) {
            self.bump();
            let operand = self.unary()?;
            return Ok(self.expr(start, ExprKind::Unary { op, operand: Box::new(operand) }));
        }
        if self.at("await") {
            self.bump();
            let operand = self.unary()?;
            return Ok(self.expr(start, ExprKind::Await(Box::new(operand))));
        }
        if self.at("throw") {
            self.bump();
            let operand = self.expression()?;
            return Ok(self.expr(start, ExprKind::Throw(Box::new(operand))));
        }
        if self.at("(") {
            if let Some(ty) = self.speculate(|p| p.cast_head()) {
                let operand = self.unary()?;
                return Ok(self.expr(start, ExprKind::Cast { ty, expr: Box::new(operand) }));
            }
        }
        let primary = self.primary()?;
        self.postfix(start, primary)
    }

    fn cast_head(&mut self) -> Result<Option<TypeSyntax>> {
        self.expect("(")?;
        let ty = self.type_syntax()?;
        self.expect(")")?;
        let predefined = matches!(ty.kind, TypeSyntaxKind::Predefined(_))
            || matches!(
                &ty.kind,
                TypeSyntaxKind::Nullable(inner)
                    if matches!(inner.kind, TypeSyntaxKind::Predefined(_))
            );
        let next = self.peek(0);
        let starts_operand = match next.kind {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::InterpolatedString
            | TokenKind::CharLiteral => true,
            TokenKind::Keyword => matches!(
                next.text.as_str(),
                "this" | "base" | "new" | "typeof" | "default" | "true" | "false" | "null" | "await"
            ) || is_predefined_type(&next.text),
            TokenKind::Punct => {
                next.is("(")
                    || next.is("!")
                    || next.is("~")
                    || (predefined && (next.is("-") || next.is("+")))
            }
            TokenKind::EndOfFile => false,
        };
        Ok(starts_operand.then_some(ty))
    }

    fn postfix(&mut self, start: usize, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.at(".") {
                self.bump();
                let name = self.ident()?;
                let type_args = self.try_type_args();
                expr = self.expr(
                    start,
                    ExprKind::MemberAccess { target: Box::new(expr), name, type_args },
                );
            } else if self.at("?.") {
                self.bump();
                let binding_start = self.start();
                let name = self.ident()?;
                let type_args = self.try_type_args();
                let binding = self.expr(binding_start, ExprKind::MemberBinding { name, type_args });
                let access = self.postfix(binding_start, binding)?;
                return Ok(self.expr(
                    start,
                    ExprKind::ConditionalAccess {
                        target: Box::new(expr),
                        access: Box::new(access),
                    },
                ));
            } else if self.at("(") {
                let args = self.argument_list("(", ")")?;
                expr = self.expr(start, ExprKind::Invocation { callee: Box::new(expr), args });
            } else if self.at("[") {
                let args = self.argument_list("[", "]")?;
                expr = self.expr(start, ExprKind::ElementAccess { target: Box::new(expr), args });
            } else if self.at("++") || self.at("--") {
                let op = if self.at("++") {
                    UnaryOp::PostIncrement
                } else {
                    UnaryOp::PostDecrement
                };
                self.bump();
                expr = self.expr(start, ExprKind::Unary { op, operand: Box::new(expr) });
            } else if self.at("!")
                && [".", ")", ";", ",", "]", "?.", "[", "}", "("].iter().any(|t| self.peek(1).is(t))
            {
                self.bump();
                let operand = Box::new(expr);
                expr = self.expr(start, ExprKind::Unary { op: UnaryOp::Suppress, operand });
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let start = self.start();
        let token = self.peek(0);
        match token.kind {
            TokenKind::IntLiteral => {
                self.bump();
                Ok(self.expr(start, ExprKind::Literal(Literal::Int(token.text.clone()))))
            }
            TokenKind::RealLiteral => {
                self.bump();
                Ok(self.expr(start, ExprKind::Literal(Literal::Real(token.text.clone()))))
            }
            TokenKind::StringLiteral => {
                self.bump();
                let (value, verbatim) = decode_string(&token.text);
                Ok(self.expr(start, ExprKind::Literal(Literal::String { value, verbatim })))
            }
            TokenKind::CharLiteral => {
                self.bump();
                Ok(self.expr(start, ExprKind::Literal(Literal::Char(token.text.clone()))))
            }
            TokenKind::InterpolatedString => {
                self.bump();
                Ok(self.expr(start, ExprKind::Interpolated(token.text.clone())))
            }
            TokenKind::Identifier => {
                let name = self.ident()?;
                let type_args = self.try_type_args();
                Ok(self.expr(start, ExprKind::Name { name, type_args }))
            }
            TokenKind::Keyword => self.keyword_primary(start, token),
            TokenKind::Punct if token.is("(") => {
                self.bump();
                let first = self.argument()?;
                if self.at(",") {
                    let mut elements = vec![first];
                    while self.eat(",").is_some() {
                        elements.push(self.argument()?);
                    }
                    self.expect(")")?;
                    return Ok(self.expr(start, ExprKind::Tuple(elements)));
                }
                self.expect(")")?;
                if first.name.is_some() {
                    return Err(self.error("expected tuple element"));
                }
                Ok(self.expr(start, ExprKind::Parenthesized(Box::new(first.expr))))
            }
            _ => Err(self.error("expected expression")),
        }
    }

    fn keyword_primary(&mut self, start: usize, token: &'a Token) -> Result<Expr> {
        match token.text.as_str() {
            "true" | "false" => {
                self.bump();
                Ok(self.expr(start, ExprKind::Literal(Literal::Bool(token.text == "true"))))
            }
            "null" => {
                self.bump();
                Ok(self.expr(start, ExprKind::Literal(Literal::Null)))
            }
            "this" => {
                self.bump();
                Ok(self.expr(start, ExprKind::This))
            }
            "base" => {
                self.bump();
                Ok(self.expr(start, ExprKind::Base))
            }
            "typeof" => {
                self.bump();
                self.expect("(")?;
                let ty = self.type_syntax()?;
                self.expect(")")?;
                Ok(self.expr(start, ExprKind::TypeOf(ty)))
            }
            "default" => {
                self.bump();
                let ty = if self.eat("(").is_some() {
                    let ty = self.type_syntax()?;
                    self.expect(")")?;
                    Some(ty)
                } else {
                    None
                };
                Ok(self.expr(start, ExprKind::Default(ty)))
            }
            "new" => self.creation(start),
            "delegate" => self
                .try_lambda()?
                .ok_or_else(|| self.error("expected anonymous method")),
            text if is_predefined_type(text) => {
                self.bump();
                Ok(self.expr(start, ExprKind::PredefinedType(text.to_string())))
            }
            _ => Err(self.error("expected expression")),
        }
    }

    fn creation(&mut self, start: usize) -> Result<Expr> {
        self.expect("new")?;
        if self.at("[") {
            // new[] { ... }
            self.bump();
            let mut rank = 1;
            while self.eat(",").is_some() {
                rank += 1;
            }
            self.expect("]")?;
            let initializer = Some(self.initializer()?);
            return Ok(self.expr(
                start,
                ExprKind::ArrayCreation { elem: None, rank, sizes: Vec::new(), initializer },
            ));
        }
        if self.at("(") {
            let args = Some(self.argument_list("(", ")")?);
            let initializer = if self.at("{") { Some(self.initializer()?) } else { None };
            return Ok(self.expr(start, ExprKind::ObjectCreation { ty: None, args, initializer }));
        }

        let ty = self.type_syntax()?;
        if self.at("[") {
            self.bump();
            let mut sizes = Vec::new();
            let mut rank = 1;
            loop {
                if !self.at(",") && !self.at("]") {
                    sizes.push(self.expression()?);
                }
                if self.eat(",").is_none() {
                    break;
                }
                rank += 1;
            }
            self.expect("]")?;
            let mut elem = ty;
            while self.at("[") {
                // jagged arrays: the trailing ranks belong to the element type
                let rank_start = elem.span.start;
                self.bump();
                let mut inner = 1;
                while self.eat(",").is_some() {
                    inner += 1;
                }
                self.expect("]")?;
                elem = TypeSyntax {
                    span: self.span_from(rank_start),
                    kind: TypeSyntaxKind::Array { elem: Box::new(elem), rank: inner },
                };
            }
            let initializer = if self.at("{") { Some(self.initializer()?) } else { None };
            return Ok(self.expr(
                start,
                ExprKind::ArrayCreation { elem: Some(elem), rank, sizes, initializer },
            ));
        }

        if let TypeSyntaxKind::Array { elem, rank } = ty.kind {
            let initializer = Some(self.initializer()?);
            return Ok(self.expr(
                start,
                ExprKind::ArrayCreation { elem: Some(*elem), rank, sizes: Vec::new(), initializer },
            ));
        }

        let args = if self.at("(") { Some(self.argument_list("(", ")")?) } else { None };
        let initializer = if self.at("{") { Some(self.initializer()?) } else { None };
        if args.is_none() && initializer.is_none() {
            return Err(self.error("expected '(' or '{'"));
        }
        Ok(self.expr(start, ExprKind::ObjectCreation { ty: Some(ty), args, initializer }))
    }

    fn initializer(&mut self) -> Result<Vec<Expr>> {
        self.expect("{")?;
        let mut elements = Vec::new();
        while !self.at("}") {
            let element = if self.at("{") {
                let start = self.start();
                let nested = self.initializer()?;
                self.expr(start, ExprKind::InitializerList(nested))
            } else {
                self.expression()?
            };
            elements.push(element);
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect("}")?;
        Ok(elements)
    }

    fn argument_list(&mut self, open: &str, close: &str) -> Result<ArgumentList> {
        let start = self.start();
        let open_span = self.expect(open)?;
        let mut args = Vec::new();
        let mut separators = Vec::new();
        while !self.at(close) {
            args.push(self.argument()?);
            match self.eat(",") {
                Some(separator) => separators.push(separator),
                None => break,
            }
        }
        let close_span = self.expect(close)?;
        Ok(ArgumentList {
            span: self.span_from(start),
            open: open_span,
            close: close_span,
            args,
            separators,
        })
    }

    fn argument(&mut self) -> Result<Argument> {
        let start = self.start();
        let name = if self.at_kind(TokenKind::Identifier) && self.peek(1).is(":") {
            let name = self.ident()?;
            self.bump();
            Some(name)
        } else {
            None
        };
        let modifier = if self.at("ref") || self.at("out") || self.at("in") {
            Some(self.bump().text.clone())
        } else {
            None
        };
        let expr = if modifier.as_deref() == Some("out") {
            let decl_start = self.start();
            match self.speculate(|p| {
                let ty = p.type_syntax()?;
                if !p.at_kind(TokenKind::Identifier) {
                    return Ok(None);
                }
                let name = p.ident()?;
                Ok((p.at(",") || p.at(")")).then_some((ty, name)))
            }) {
                Some((ty, name)) => self.expr(decl_start, ExprKind::Declaration { ty, name }),
                None => self.expression()?,
            }
        } else {
            self.expression()?
        };
        Ok(Argument {
            span: self.span_from(start),
            name,
            modifier,
            expr,
        })
    }
}

/// Decode the content of a regular or verbatim string literal token
fn decode_string(text: &str) -> (String, bool) {
    if let Some(body) = text.strip_prefix("@\"") {
        let body = body.strip_suffix('"').unwrap_or(body);
        return (body.replace("\"\"", "\""), true);
    }
    let body = text.strip_prefix('"').unwrap_or(text);
    let body = body.strip_suffix('"').unwrap_or(body);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    (out, false)
}
