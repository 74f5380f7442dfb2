//! Expression and statement binding.
//!
//! The binder walks every member body of a tree and records, per expression, its type, the
//! symbol it refers to and, for invocations and object creations, the selected overload with
//! its argument-to-parameter mapping.
//!
//! Overload resolution ranks applicable candidates by the sum of their argument conversion
//! ranks. Ties prefer instance methods over extension methods, a delegate with a non-void
//! return when a lambda argument returns a value, the non-expanded form of a `params` method
//! and finally fewer defaulted parameters. Lambdas whose parameters are untyped are bound
//! after the candidate is selected, once their target delegate type is known; a lambda never
//! infers a generic parameter it is passed as directly.

use rustc_hash::FxHashMap;

use crate::host::{
    semantic::{
        declare::{attribute_name, DeclarationIndex},
        model::{AttributeInfo, CallInfo, SemanticModel, Symbol},
        scope::{Imports, TypeScope},
    },
    syntax::{
        Argument, ArgumentList, AssignOp, AttributeSyntax, BinaryOp, Block, Expr, ExprKind,
        Declarator, FieldDecl, Ident, LambdaBody, LambdaParam, Literal, MemberDecl, MethodBody,
        MethodDecl, NamespaceMember, Parameter, Pattern, PropertyDecl, Stmt, StmtKind,
        SyntaxTree, TypeDecl, TypeSyntax, UnaryOp, UsingDirective, UsingResource,
    },
    types::{
        classify_conversion, Conversion, DefId, MemberKind, MemberRef, NumericKind, ParamDef,
        Ty, TypeRegistry, WellKnown,
    },
};

/// Bind every member of every type declared in `tree`
pub(crate) fn bind_tree(
    registry: &TypeRegistry,
    tree: &SyntaxTree,
    tree_index: usize,
    index: &DeclarationIndex,
) -> SemanticModel {
    let mut model = SemanticModel::default();
    let usings: Vec<&UsingDirective> = tree.root().usings.iter().collect();
    let scope = TypeScope {
        imports: Imports::from_usings(&usings),
        ..TypeScope::default()
    };
    let mut walker = TreeBinder {
        registry,
        tree_index,
        index,
        model: &mut model,
    };
    walker.namespace_members(&tree.root().members, &scope, &usings);
    log::trace!("bound {} expressions in {}", model.len(), tree.path());
    model
}

struct TreeBinder<'a> {
    registry: &'a TypeRegistry,
    tree_index: usize,
    index: &'a DeclarationIndex,
    model: &'a mut SemanticModel,
}

impl TreeBinder<'_> {
    fn namespace_members(
        &mut self,
        members: &[NamespaceMember],
        scope: &TypeScope,
        usings: &[&UsingDirective],
    ) {
        for member in members {
            match member {
                NamespaceMember::Type(decl) => self.bind_type(decl, scope),
                NamespaceMember::Namespace(ns) => {
                    let mut inner = usings.to_vec();
                    inner.extend(ns.usings.iter());
                    let namespace = if scope.namespace.is_empty() {
                        ns.name.clone()
                    } else {
                        format!("{}.{}", scope.namespace, ns.name)
                    };
                    let nested = TypeScope {
                        namespace,
                        imports: Imports::from_usings(&inner),
                        ..TypeScope::default()
                    };
                    self.namespace_members(&ns.members, &nested, &inner);
                }
            }
        }
    }

    fn bind_type(&mut self, decl: &TypeDecl, scope: &TypeScope) {
        let Some(def) = self.index.type_at(self.tree_index, decl.span) else {
            return;
        };
        let scope = scope.nested(def);
        let this_ty = self_type(self.registry, def);
        {
            let mut binder = Binder::new(self.registry, &mut *self.model, scope.clone(), this_ty);
            binder.bind_attributes(&decl.attributes);
            for member in &decl.members {
                match member {
                    MemberDecl::Field(field) => binder.bind_field(field),
                    MemberDecl::Property(property) => binder.bind_property(property),
                    MemberDecl::Method(method) => binder.bind_method(method),
                    MemberDecl::Type(_) => {}
                }
            }
        }
        for member in &decl.members {
            if let MemberDecl::Type(nested) = member {
                self.bind_type(nested, &scope);
            }
        }
    }
}

/// A definition instantiated with its own generic parameters
fn self_type(registry: &TypeRegistry, def: DefId) -> Ty {
    let generics = &registry.def(def).generics;
    Ty::generic(def, generics.iter().map(|g| Ty::Param(g.clone())).collect())
}

#[derive(Debug, Clone)]
struct LocalFunction {
    ret: Ty,
    params: Vec<ParamDef>,
}

#[derive(Debug, Default)]
struct Frame {
    vars: FxHashMap<String, Symbol>,
    functions: FxHashMap<String, LocalFunction>,
}

#[derive(Debug, Clone)]
struct Candidate {
    member: MemberRef,
    extension: bool,
}

#[derive(Debug, Clone)]
enum Receiver {
    /// `Type.Member`
    Static,
    /// `value.Member`
    Instance(Ty),
    /// A simple name resolved against the enclosing types
    Implicit,
}

#[derive(Debug, Clone)]
enum Bound {
    Value(Ty),
    Type(Ty),
    Namespace(String),
    Methods {
        receiver: Receiver,
        candidates: Vec<Candidate>,
    },
    Function(LocalFunction),
    Error,
}

#[derive(Debug, Clone)]
struct ArgInfo {
    ty: Ty,
    /// An implicitly typed lambda bound once its target is known
    deferred: bool,
}

#[derive(Debug, Clone)]
struct Application {
    candidate: Candidate,
    map: FxHashMap<String, Ty>,
    params: Vec<ParamDef>,
    arg_params: Vec<Option<usize>>,
    expanded: bool,
    key: (u8, u32, u32, u8, u32),
}

impl Application {
    /// The type an argument bound to `index` converts to
    fn target(&self, registry: &TypeRegistry, index: usize) -> Ty {
        let ty = &self.params[index].ty;
        if self.expanded && index + 1 == self.params.len() {
            if let Ty::Array { elem, .. } = ty {
                return (**elem).clone();
            }
            return registry.element_type(ty).unwrap_or(Ty::Error);
        }
        ty.clone()
    }
}

struct Binder<'a> {
    registry: &'a TypeRegistry,
    model: &'a mut SemanticModel,
    scope: TypeScope,
    this_ty: Ty,
    frames: Vec<Frame>,
    receivers: Vec<Ty>,
    returns: Vec<Option<Ty>>,
}

impl<'a> Binder<'a> {
    fn new(
        registry: &'a TypeRegistry,
        model: &'a mut SemanticModel,
        scope: TypeScope,
        this_ty: Ty,
    ) -> Self {
        Binder {
            registry,
            model,
            scope,
            this_ty,
            frames: Vec::new(),
            receivers: Vec::new(),
            returns: Vec::new(),
        }
    }

    fn resolve(&self, syntax: &TypeSyntax) -> Ty {
        self.scope.resolve(self.registry, syntax)
    }

    fn resolve_all(&self, syntax: &[TypeSyntax]) -> Vec<Ty> {
        syntax.iter().map(|s| self.resolve(s)).collect()
    }

    fn void(&self) -> Ty {
        self.registry.well_known_ty(WellKnown::Void)
    }

    fn is_void(&self, ty: &Ty) -> bool {
        self.registry.is_well_known(ty, WellKnown::Void)
    }

    fn nullable_of(&self, ty: Ty) -> Ty {
        if self.registry.is_value_type(&ty)
            && !self.is_void(&ty)
            && self.registry.nullable_underlying(&ty).is_none()
        {
            self.registry.well_known_generic(WellKnown::Nullable, vec![ty])
        } else {
            ty
        }
    }

    // ------------------------------------------------------------------------------------
    // scopes

    fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &Ident, symbol: Symbol) {
        if self.frames.is_empty() {
            self.push();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.vars.insert(name.text.clone(), symbol);
        }
    }

    fn declare_local(&mut self, name: &Ident, ty: Ty) {
        self.declare(
            name,
            Symbol::Local {
                name: name.text.clone(),
                ty,
                span: name.span,
            },
        );
    }

    fn lookup_local(&self, name: &str) -> Option<Symbol> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(name).cloned())
    }

    fn lookup_function(&self, name: &str) -> Option<LocalFunction> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.functions.get(name).cloned())
    }

    fn declare_params(&mut self, params: &[Parameter]) {
        for (index, param) in params.iter().enumerate() {
            let ty = self.resolve(&param.ty);
            self.bind_attributes(&param.attributes);
            if let Some(default) = &param.default {
                self.bind_expr(default, Some(&ty));
            }
            self.declare(
                &param.name,
                Symbol::Parameter {
                    name: param.name.text.clone(),
                    ty,
                    index,
                },
            );
        }
    }

    // ------------------------------------------------------------------------------------
    // members

    fn bind_field(&mut self, field: &FieldDecl) {
        self.bind_attributes(&field.attributes);
        let ty = self.resolve(&field.ty);
        for declarator in &field.declarators {
            if let Some(init) = &declarator.init {
                self.bind_expr(init, Some(&ty));
            }
        }
    }

    fn bind_property(&mut self, property: &PropertyDecl) {
        self.bind_attributes(&property.attributes);
        let ty = self.resolve(&property.ty);
        self.push();
        self.declare_params(&property.params);
        if let Some(init) = &property.initializer {
            self.bind_expr(init, Some(&ty));
        }
        if let Some(body) = &property.expr_body {
            self.bind_expr(body, None);
        }
        for accessor in &property.accessors {
            let Some(body) = &accessor.body else { continue };
            self.push();
            if accessor.kind == "set" || accessor.kind == "init" {
                let value = Ident {
                    text: "value".to_string(),
                    span: property.name.span,
                };
                self.declare(
                    &value,
                    Symbol::Parameter {
                        name: "value".to_string(),
                        ty: ty.clone(),
                        index: property.params.len(),
                    },
                );
            }
            self.bind_body(body);
            self.pop();
        }
        self.pop();
    }

    fn bind_method(&mut self, method: &MethodDecl) {
        self.bind_attributes(&method.attributes);
        let saved = self.scope.clone();
        self.scope = self
            .scope
            .with_type_params(method.type_params.iter().map(|p| p.text.as_str()));
        self.push();
        self.declare_params(&method.params);
        if let Some(initializer) = &method.initializer {
            self.bind_args_plain(&initializer.args);
        }
        if let Some(body) = &method.body {
            self.bind_body(body);
        }
        self.pop();
        self.scope = saved;
    }

    fn bind_body(&mut self, body: &MethodBody) {
        match body {
            MethodBody::Block(block) => self.bind_block(block),
            MethodBody::Expr(expr) => {
                self.bind_expr(expr, None);
            }
        }
    }

    fn bind_attributes(&mut self, attributes: &[AttributeSyntax]) {
        for attribute in attributes {
            let name = attribute_name(self.registry, &self.scope, attribute);
            let ty = self.registry.lookup(&name).map_or(Ty::Error, Ty::named);
            let empty = ArgumentList::default();
            let list = attribute.args.as_ref().unwrap_or(&empty);

            // property setters are not constructor arguments
            let mut included = Vec::new();
            for (index, arg) in list.args.iter().enumerate() {
                match &arg.expr.kind {
                    ExprKind::Assignment { target, value, .. }
                        if matches!(target.kind, ExprKind::Name { .. }) =>
                    {
                        self.bind_member_assignment(&ty, &arg.expr, target, value);
                    }
                    _ => included.push(index),
                }
            }

            let args: Vec<&Argument> = included.iter().map(|i| &list.args[*i]).collect();
            let candidates = self.constructors(&ty);
            let call = self
                .resolve_call(&candidates, &Receiver::Static, &[], &args)
                .map(|mut call| {
                    let mut arg_params = vec![None; list.args.len()];
                    for (position, index) in included.iter().enumerate() {
                        arg_params[*index] = call.arg_params[position];
                    }
                    call.arg_params = arg_params;
                    call
                });
            self.model
                .attributes
                .insert(attribute.span, AttributeInfo { ty, call });
        }
    }

    fn constructors(&self, ty: &Ty) -> Vec<Candidate> {
        let Some(def) = ty.def() else {
            return Vec::new();
        };
        self.registry
            .members_named(ty, ".ctor")
            .into_iter()
            .filter(|m| m.owner.def() == Some(def))
            .map(|member| Candidate {
                member,
                extension: false,
            })
            .collect()
    }

    // ------------------------------------------------------------------------------------
    // statements

    fn bind_block(&mut self, block: &Block) {
        self.push();
        self.predeclare_functions(&block.stmts);
        for stmt in &block.stmts {
            self.bind_stmt(stmt);
        }
        self.pop();
    }

    fn bind_stmts(&mut self, stmts: &[Stmt]) {
        self.predeclare_functions(stmts);
        for stmt in stmts {
            self.bind_stmt(stmt);
        }
    }

    fn predeclare_functions(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let StmtKind::LocalFunction(method) = &stmt.kind {
                let scope = self
                    .scope
                    .with_type_params(method.type_params.iter().map(|p| p.text.as_str()));
                let ret = method
                    .return_type
                    .as_ref()
                    .map_or_else(|| self.void(), |r| scope.resolve(self.registry, r));
                let params = method
                    .params
                    .iter()
                    .map(|p| ParamDef {
                        name: p.name.text.clone(),
                        ty: scope.resolve(self.registry, &p.ty),
                        modifier: p.modifier,
                        has_default: p.default.is_some(),
                    })
                    .collect();
                if self.frames.is_empty() {
                    self.push();
                }
                if let Some(frame) = self.frames.last_mut() {
                    frame
                        .functions
                        .insert(method.name.text.clone(), LocalFunction { ret, params });
                }
            }
        }
    }

    fn bind_local_declarators(&mut self, ty: &TypeSyntax, declarators: &[Declarator]) {
        let declared = if ty.is_var() { None } else { Some(self.resolve(ty)) };
        for declarator in declarators {
            let init = declarator
                .init
                .as_ref()
                .map(|e| self.bind_expr(e, declared.as_ref()));
            let local = declared
                .clone()
                .or(init)
                .map(|t| match t {
                    Ty::Null | Ty::Function { .. } => Ty::Error,
                    other => other,
                })
                .unwrap_or(Ty::Error);
            self.declare_local(&declarator.name, local);
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.bind_block(block),
            StmtKind::Local { ty, declarators, .. } => self.bind_local_declarators(ty, declarators),
            StmtKind::Expression(expr) => {
                self.bind_expr(expr, None);
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.bind_expr(cond, None);
                self.bind_stmt(then);
                if let Some(otherwise) = otherwise {
                    self.bind_stmt(otherwise);
                }
            }
            StmtKind::Switch { expr, sections } => {
                let subject = self.bind_expr(expr, None);
                for section in sections {
                    self.push();
                    for pattern in section.labels.iter().flatten() {
                        self.bind_pattern(pattern, &subject);
                    }
                    self.bind_stmts(&section.stmts);
                    self.pop();
                }
            }
            StmtKind::Try {
                block,
                catches,
                finally,
            } => {
                self.bind_block(block);
                for clause in catches {
                    self.push();
                    if let (Some(ty), Some(name)) = (&clause.ty, &clause.name) {
                        let ty = self.resolve(ty);
                        self.declare_local(name, ty);
                    }
                    if let Some(filter) = &clause.filter {
                        self.bind_expr(filter, None);
                    }
                    self.bind_block(&clause.block);
                    self.pop();
                }
                if let Some(finally) = finally {
                    self.bind_block(finally);
                }
            }
            StmtKind::Using { resource, body, .. } => {
                self.push();
                match resource {
                    UsingResource::Declaration { ty, declarators } => {
                        self.bind_local_declarators(ty, declarators);
                    }
                    UsingResource::Expr(expr) => {
                        self.bind_expr(expr, None);
                    }
                }
                self.bind_stmt(body);
                self.pop();
            }
            StmtKind::Return(expr) => {
                if let Some(expr) = expr {
                    let ty = self.bind_expr(expr, None);
                    if let Some(top) = self.returns.last_mut() {
                        if top.is_none() && !matches!(ty, Ty::Null | Ty::Error) {
                            *top = Some(ty);
                        }
                    }
                }
            }
            StmtKind::Throw(expr) => {
                if let Some(expr) = expr {
                    self.bind_expr(expr, None);
                }
            }
            StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => {
                self.bind_expr(cond, None);
                self.bind_stmt(body);
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.push();
                if let Some(init) = init {
                    self.bind_stmt(init);
                }
                if let Some(cond) = cond {
                    self.bind_expr(cond, None);
                }
                for expr in step {
                    self.bind_expr(expr, None);
                }
                self.bind_stmt(body);
                self.pop();
            }
            StmtKind::Foreach {
                ty,
                name,
                expr,
                body,
            } => {
                let collection = self.bind_expr(expr, None);
                let element = if ty.is_var() {
                    if self.registry.is_well_known(&collection, WellKnown::String) {
                        self.registry.well_known_ty(WellKnown::Char)
                    } else {
                        self.registry.element_type(&collection).unwrap_or(Ty::Error)
                    }
                } else {
                    self.resolve(ty)
                };
                self.push();
                self.declare_local(name, element);
                self.bind_stmt(body);
                self.pop();
            }
            StmtKind::Lock { expr, body } => {
                self.bind_expr(expr, None);
                self.bind_stmt(body);
            }
            StmtKind::LocalFunction(method) => {
                let saved = self.scope.clone();
                self.scope = self
                    .scope
                    .with_type_params(method.type_params.iter().map(|p| p.text.as_str()));
                self.push();
                self.declare_params(&method.params);
                let saved_returns = std::mem::take(&mut self.returns);
                if let Some(body) = &method.body {
                    self.bind_body(body);
                }
                self.returns = saved_returns;
                self.pop();
                self.scope = saved;
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern, subject: &Ty) {
        match pattern {
            Pattern::Type { ty, designation } => {
                let ty = self.resolve(ty);
                if let Some(name) = designation {
                    self.declare_local(name, ty);
                }
            }
            Pattern::Var(name) => self.declare_local(name, subject.clone()),
            Pattern::Constant(expr) => {
                self.bind_expr(expr, Some(subject));
            }
            Pattern::Not(inner) => self.bind_pattern(inner, subject),
            Pattern::Property(designation) => {
                if let Some(name) = designation {
                    self.declare_local(name, subject.clone());
                }
            }
            Pattern::Discard => {}
        }
    }

    // ------------------------------------------------------------------------------------
    // expressions

    fn bind_expr(&mut self, expr: &Expr, expected: Option<&Ty>) -> Ty {
        let ty = self.expr_type(expr, expected);
        self.model.types.insert(expr.id, ty.clone());
        ty
    }

    fn bind_args_plain(&mut self, args: &[Argument]) {
        for arg in args {
            self.bind_expr(&arg.expr, None);
        }
    }

    fn expr_type(&mut self, expr: &Expr, expected: Option<&Ty>) -> Ty {
        match &expr.kind {
            ExprKind::Name { .. }
            | ExprKind::MemberAccess { .. }
            | ExprKind::MemberBinding { .. }
            | ExprKind::PredefinedType(_) => {
                let bound = self.bind_target(expr);
                self.bound_value(&bound)
            }
            ExprKind::Literal(literal) => self.literal_type(literal),
            ExprKind::Interpolated(_) => self.registry.well_known_ty(WellKnown::String),
            ExprKind::ConditionalAccess { target, access } => {
                let target = self.bind_expr(target, None);
                let receiver = self.registry.strip_nullable(&target).clone();
                self.receivers.push(receiver);
                let ty = self.bind_expr(access, None);
                self.receivers.pop();
                self.nullable_of(ty)
            }
            ExprKind::Invocation { callee, args } => self.bind_invocation(expr, callee, args),
            ExprKind::ElementAccess { target, args } => {
                let target = self.bind_expr(target, None);
                self.bind_args_plain(&args.args);
                match &target {
                    Ty::Array { elem, .. } => (**elem).clone(),
                    _ if self.registry.is_well_known(&target, WellKnown::String) => {
                        self.registry.well_known_ty(WellKnown::Char)
                    }
                    _ => {
                        let indexer = self
                            .registry
                            .members_named(&target, "this")
                            .into_iter()
                            .find(|m| self.registry.member(m).params.len() == args.args.len());
                        match indexer {
                            Some(member) => {
                                let ty = self.registry.member_type(&member);
                                self.model.symbols.insert(expr.id, Symbol::Member(member));
                                ty
                            }
                            None => Ty::Error,
                        }
                    }
                }
            }
            ExprKind::ObjectCreation {
                ty,
                args,
                initializer,
            } => {
                let created = match ty {
                    Some(ty) => self.resolve(ty),
                    None => expected.cloned().unwrap_or(Ty::Error),
                };
                let empty = ArgumentList::default();
                let list = args.as_ref().unwrap_or(&empty);
                let candidates = self.constructors(&created);
                if candidates.is_empty() {
                    self.bind_args_plain(&list.args);
                } else {
                    let refs: Vec<&Argument> = list.args.iter().collect();
                    if let Some(call) =
                        self.resolve_call(&candidates, &Receiver::Static, &[], &refs)
                    {
                        self.model
                            .symbols
                            .insert(expr.id, Symbol::Member(call.method.clone()));
                        self.model.calls.insert(expr.id, call);
                    }
                }
                if let Some(elements) = initializer {
                    self.bind_initializer(&created, elements);
                }
                created
            }
            ExprKind::ArrayCreation {
                elem,
                rank,
                sizes,
                initializer,
            } => {
                for size in sizes {
                    self.bind_expr(size, None);
                }
                let declared = elem.as_ref().map(|e| self.resolve(e));
                let mut inferred = None;
                for element in initializer.iter().flatten() {
                    let ty = self.bind_expr(element, declared.as_ref());
                    if inferred.is_none() && !matches!(ty, Ty::Null | Ty::Error) {
                        inferred = Some(ty);
                    }
                }
                match declared.or(inferred) {
                    Some(elem) => Ty::Array {
                        elem: Box::new(elem),
                        rank: *rank,
                    },
                    None => expected.cloned().unwrap_or(Ty::Error),
                }
            }
            ExprKind::InitializerList(items) => {
                for item in items {
                    self.bind_expr(item, None);
                }
                expected.cloned().unwrap_or(Ty::Error)
            }
            ExprKind::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                self.bind_expr(cond, None);
                let a = self.bind_expr(when_true, expected);
                let b = self.bind_expr(when_false, expected);
                self.common_type(a, b)
            }
            ExprKind::Binary { op, left, right } => self.bind_binary(*op, left, right, expected),
            ExprKind::Unary { op, operand } => self.bind_unary(*op, operand),
            ExprKind::Assignment { op, target, value } => {
                let target_ty = self.bind_expr(target, None);
                let value_ty = self.bind_expr(value, Some(&target_ty));
                if target_ty.is_error() && *op == AssignOp::Assign {
                    value_ty
                } else {
                    target_ty
                }
            }
            ExprKind::Await(operand) => {
                let ty = self.bind_expr(operand, None);
                self.awaited(&ty)
            }
            ExprKind::Is { expr: value, pattern } => {
                let subject = self.bind_expr(value, None);
                self.bind_pattern(pattern, &subject);
                self.registry.well_known_ty(WellKnown::Boolean)
            }
            ExprKind::As { expr: value, ty } => {
                self.bind_expr(value, None);
                let ty = self.resolve(ty);
                self.nullable_of(ty)
            }
            ExprKind::Cast { ty, expr: value } => {
                let ty = self.resolve(ty);
                self.bind_expr(value, Some(&ty));
                ty
            }
            ExprKind::Lambda {
                is_async,
                params,
                body,
            } => self.bind_lambda(*is_async, params, body, expected),
            ExprKind::Parenthesized(inner) => self.bind_expr(inner, expected),
            ExprKind::Tuple(elements) => {
                let args: Vec<Ty> = elements
                    .iter()
                    .map(|e| self.bind_expr(&e.expr, None))
                    .collect();
                self.registry
                    .lookup(&format!("System.ValueTuple`{}", args.len()))
                    .map_or(Ty::Error, |def| Ty::generic(def, args))
            }
            ExprKind::TypeOf(operand) => {
                let operand = self.resolve(operand);
                self.model.typeof_operands.insert(expr.id, operand);
                self.registry.well_known_ty(WellKnown::Type)
            }
            ExprKind::Default(ty) => match ty {
                Some(ty) => self.resolve(ty),
                None => expected.cloned().unwrap_or(Ty::Error),
            },
            ExprKind::Declaration { ty, name } => {
                let ty = if ty.is_var() {
                    expected.cloned().unwrap_or(Ty::Error)
                } else {
                    self.resolve(ty)
                };
                self.declare_local(name, ty.clone());
                ty
            }
            ExprKind::This => self.this_ty.clone(),
            ExprKind::Base => self.registry.base_type(&self.this_ty).unwrap_or(Ty::Error),
            ExprKind::Throw(inner) => {
                self.bind_expr(inner, None);
                expected.cloned().unwrap_or(Ty::Error)
            }
        }
    }

    fn literal_type(&self, literal: &Literal) -> Ty {
        let which = match literal {
            Literal::Int(raw) => {
                let lower = raw.to_ascii_lowercase().replace('_', "");
                if lower.ends_with("ul") || lower.ends_with("lu") {
                    WellKnown::UInt64
                } else if lower.ends_with('l') {
                    WellKnown::Int64
                } else if lower.ends_with('u') {
                    WellKnown::UInt32
                } else if !lower.starts_with("0x")
                    && !lower.starts_with("0b")
                    && lower.parse::<i64>().is_ok_and(|v| v > i64::from(i32::MAX))
                {
                    WellKnown::Int64
                } else {
                    WellKnown::Int32
                }
            }
            Literal::Real(raw) => {
                let lower = raw.to_ascii_lowercase();
                if lower.ends_with('f') {
                    WellKnown::Single
                } else if lower.ends_with('m') {
                    WellKnown::Decimal
                } else {
                    WellKnown::Double
                }
            }
            Literal::String { .. } => WellKnown::String,
            Literal::Char(_) => WellKnown::Char,
            Literal::Bool(_) => WellKnown::Boolean,
            Literal::Null => return Ty::Null,
        };
        self.registry.well_known_ty(which)
    }

    fn common_type(&self, a: Ty, b: Ty) -> Ty {
        if a == b {
            return a;
        }
        match (&a, &b) {
            (Ty::Null, _) => self.nullable_of(b),
            (_, Ty::Null) => self.nullable_of(a),
            (Ty::Error, _) => b,
            (_, Ty::Error) => a,
            _ => {
                if classify_conversion(self.registry, &b, &a).is_implicit() {
                    a
                } else if classify_conversion(self.registry, &a, &b).is_implicit() {
                    b
                } else {
                    a
                }
            }
        }
    }

    fn awaited(&self, ty: &Ty) -> Ty {
        let registry = self.registry;
        if registry.is_well_known(ty, WellKnown::Task)
            || registry.is_well_known(ty, WellKnown::ValueTask)
        {
            return self.void();
        }
        if registry.is_well_known(ty, WellKnown::TaskOfT)
            || registry.is_well_known(ty, WellKnown::ValueTaskOfT)
        {
            return ty.args().first().cloned().unwrap_or(Ty::Error);
        }
        if let Some(def) = ty.def() {
            let name = registry.metadata_name(def);
            if let Some(rest) = name.strip_prefix("System.Runtime.CompilerServices.Configured") {
                return if rest.ends_with("`1") {
                    ty.args().first().cloned().unwrap_or(Ty::Error)
                } else {
                    self.void()
                };
            }
        }
        Ty::Error
    }

    fn task_of(&self, ret: Ty) -> Ty {
        if self.is_void(&ret) {
            self.registry.well_known_ty(WellKnown::Task)
        } else if ret.is_error() {
            Ty::Error
        } else {
            self.registry.well_known_generic(WellKnown::TaskOfT, vec![ret])
        }
    }

    fn bind_lambda(
        &mut self,
        is_async: bool,
        params: &[LambdaParam],
        body: &LambdaBody,
        expected: Option<&Ty>,
    ) -> Ty {
        let signature = expected.and_then(|t| self.registry.delegate_signature(t));
        self.push();
        for (index, param) in params.iter().enumerate() {
            let ty = match &param.ty {
                Some(syntax) => self.resolve(syntax),
                None => signature
                    .as_ref()
                    .and_then(|(types, _)| types.get(index))
                    .filter(|t| !t.has_params())
                    .cloned()
                    .unwrap_or(Ty::Error),
            };
            self.declare(
                &param.name,
                Symbol::Parameter {
                    name: param.name.text.clone(),
                    ty,
                    index,
                },
            );
        }
        self.returns.push(None);
        let ret = match body {
            LambdaBody::Expr(expr) => self.bind_expr(expr, None),
            LambdaBody::Block(block) => {
                self.bind_block(block);
                self.returns
                    .last()
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| self.void())
            }
        };
        self.returns.pop();
        self.pop();
        let ret = if is_async { self.task_of(ret) } else { ret };
        Ty::Function {
            arity: params.len(),
            ret: Box::new(ret),
        }
    }

    fn bind_initializer(&mut self, created: &Ty, elements: &[Expr]) {
        let element_ty = self.registry.element_type(created);
        for element in elements {
            match &element.kind {
                ExprKind::Assignment { target, value, .. }
                    if matches!(target.kind, ExprKind::Name { .. }) =>
                {
                    self.bind_member_assignment(created, element, target, value);
                }
                _ => {
                    self.bind_expr(element, element_ty.as_ref());
                }
            }
        }
    }

    /// `Name = value` inside an object initializer or attribute argument list
    fn bind_member_assignment(
        &mut self,
        owner: &Ty,
        assignment: &Expr,
        target: &Expr,
        value: &Expr,
    ) {
        let Some(name) = target.member_name() else {
            return;
        };
        let receiver = Receiver::Instance(owner.clone());
        let ty = match self.lookup_member(target, owner, &name.text, receiver) {
            Bound::Value(ty) => ty,
            _ => Ty::Error,
        };
        self.model.types.insert(target.id, ty.clone());
        self.bind_expr(value, Some(&ty));
        self.model.types.insert(assignment.id, ty);
    }

    // ------------------------------------------------------------------------------------
    // operators

    fn numeric_well_known(kind: NumericKind) -> WellKnown {
        match kind {
            NumericKind::SByte => WellKnown::SByte,
            NumericKind::Byte => WellKnown::Byte,
            NumericKind::Int16 => WellKnown::Int16,
            NumericKind::UInt16 => WellKnown::UInt16,
            NumericKind::Int32 => WellKnown::Int32,
            NumericKind::UInt32 => WellKnown::UInt32,
            NumericKind::Int64 => WellKnown::Int64,
            NumericKind::UInt64 => WellKnown::UInt64,
            NumericKind::Char => WellKnown::Char,
            NumericKind::Single => WellKnown::Single,
            NumericKind::Double => WellKnown::Double,
            NumericKind::Decimal => WellKnown::Decimal,
        }
    }

    /// Binary numeric promotion, lifted over nullable operands
    fn promote(&self, a: &Ty, b: &Ty) -> Option<Ty> {
        let registry = self.registry;
        let ka = registry.numeric_kind(registry.strip_nullable(a))?;
        let kb = registry.numeric_kind(registry.strip_nullable(b))?;
        let rank = |k: NumericKind| match k {
            NumericKind::Decimal => 6,
            NumericKind::Double => 5,
            NumericKind::Single => 4,
            NumericKind::UInt64 => 3,
            NumericKind::Int64 => 2,
            NumericKind::UInt32 => 1,
            _ => 0,
        };
        let kind = if rank(ka) >= rank(kb) { ka } else { kb };
        let which = if rank(kind) == 0 {
            WellKnown::Int32
        } else {
            Self::numeric_well_known(kind)
        };
        let ty = registry.well_known_ty(which);
        let lifted =
            registry.nullable_underlying(a).is_some() || registry.nullable_underlying(b).is_some();
        Some(if lifted { self.nullable_of(ty) } else { ty })
    }

    /// Return type of a user-defined operator declared on either operand type
    fn operator_type(&self, method: &str, operands: &[&Ty]) -> Option<Ty> {
        if method.is_empty() {
            return None;
        }
        for ty in operands {
            for member in self.registry.members_named(ty, method) {
                if self.registry.member(&member).params.len() == operands.len() {
                    return Some(self.registry.member_type(&member));
                }
            }
        }
        None
    }

    fn bind_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        expected: Option<&Ty>,
    ) -> Ty {
        let boolean = self.registry.well_known_ty(WellKnown::Boolean);
        match op {
            BinaryOp::And | BinaryOp::Or => {
                self.bind_expr(left, None);
                self.bind_expr(right, None);
                boolean
            }
            BinaryOp::Coalesce => {
                let l = self.bind_expr(left, expected);
                let underlying = self.registry.strip_nullable(&l).clone();
                let r = self.bind_expr(right, Some(&underlying));
                if l.is_error() || matches!(l, Ty::Null) {
                    r
                } else if self.registry.nullable_underlying(&l).is_some()
                    && self.registry.nullable_underlying(&r).is_none()
                    && !matches!(r, Ty::Null)
                {
                    underlying
                } else {
                    l
                }
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                self.bind_expr(left, None);
                self.bind_expr(right, None);
                boolean
            }
            _ => {
                let l = self.bind_expr(left, None);
                let r = self.bind_expr(right, None);
                let string = self.registry.well_known_ty(WellKnown::String);
                if op == BinaryOp::Add && (l == string || r == string) {
                    return string;
                }
                if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                    return self.promote(&l, &l).unwrap_or(Ty::Error);
                }
                if let Some(ty) = self.promote(&l, &r) {
                    return ty;
                }
                let bitwise = matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor);
                if bitwise && l == boolean && r == boolean {
                    return boolean;
                }
                if self.registry.is_enum(&l)
                    && (l == r || self.registry.numeric_kind(&r).is_some())
                {
                    return l;
                }
                self.operator_type(op.operator_method(), &[&l, &r])
                    .unwrap_or(Ty::Error)
            }
        }
    }

    fn bind_unary(&mut self, op: UnaryOp, operand: &Expr) -> Ty {
        let ty = self.bind_expr(operand, None);
        match op {
            UnaryOp::Not => {
                let boolean = self.registry.well_known_ty(WellKnown::Boolean);
                if self.registry.strip_nullable(&ty) == &boolean {
                    ty
                } else {
                    self.operator_type("op_LogicalNot", &[&ty]).unwrap_or(boolean)
                }
            }
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Complement => {
                if self.registry.is_enum(&ty) {
                    ty
                } else {
                    self.promote(&ty, &ty).unwrap_or(ty)
                }
            }
            UnaryOp::PreIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostIncrement
            | UnaryOp::PostDecrement
            | UnaryOp::Suppress => ty,
        }
    }

    // ------------------------------------------------------------------------------------
    // names and members

    fn bound_value(&self, bound: &Bound) -> Ty {
        match bound {
            Bound::Value(ty) | Bound::Type(ty) => ty.clone(),
            Bound::Methods { candidates, .. } => match candidates.first() {
                Some(first) => {
                    let member = self.registry.member(&first.member);
                    Ty::Function {
                        arity: member.params.len().saturating_sub(usize::from(first.extension)),
                        ret: Box::new(self.registry.member_type(&first.member)),
                    }
                }
                None => Ty::Error,
            },
            Bound::Function(function) => Ty::Function {
                arity: function.params.len(),
                ret: Box::new(function.ret.clone()),
            },
            Bound::Namespace(_) | Bound::Error => Ty::Error,
        }
    }

    /// Bind a name, member access or member binding without collapsing method groups,
    /// types and namespaces into values
    fn bind_target(&mut self, expr: &Expr) -> Bound {
        let bound = match &expr.kind {
            ExprKind::Name { name, type_args } => self.bind_name(expr, name, type_args),
            ExprKind::PredefinedType(keyword) => WellKnown::from_keyword(keyword)
                .map_or(Bound::Error, |w| Bound::Type(self.registry.well_known_ty(w))),
            ExprKind::MemberAccess {
                target,
                name,
                type_args,
            } => {
                let target = self.bind_target(target);
                self.bind_member(expr, target, name, type_args)
            }
            ExprKind::MemberBinding { name, type_args } => {
                let receiver = self.receivers.last().cloned().unwrap_or(Ty::Error);
                self.bind_member(expr, Bound::Value(receiver), name, type_args)
            }
            _ => return Bound::Value(self.bind_expr(expr, None)),
        };
        match &bound {
            Bound::Type(ty) => {
                self.model.types.insert(expr.id, ty.clone());
                self.model.symbols.insert(expr.id, Symbol::Type(ty.clone()));
            }
            Bound::Namespace(ns) => {
                self.model.symbols.insert(expr.id, Symbol::Namespace(ns.clone()));
            }
            _ => {
                let ty = self.bound_value(&bound);
                self.model.types.insert(expr.id, ty);
            }
        }
        bound
    }

    fn member_owners(&self) -> Vec<Ty> {
        let mut owners = vec![self.this_ty.clone()];
        for def in self.scope.enclosing.iter().rev().skip(1) {
            owners.push(self_type(self.registry, *def));
        }
        owners
    }

    fn bind_name(&mut self, expr: &Expr, name: &Ident, type_args: &[TypeSyntax]) -> Bound {
        if type_args.is_empty() {
            if let Some(symbol) = self.lookup_local(&name.text) {
                let ty = match &symbol {
                    Symbol::Local { ty, .. } | Symbol::Parameter { ty, .. } => ty.clone(),
                    _ => Ty::Error,
                };
                self.model.symbols.insert(expr.id, symbol);
                return Bound::Value(ty);
            }
            if let Some(function) = self.lookup_function(&name.text) {
                return Bound::Function(function);
            }
        }

        for owner in self.member_owners() {
            match self.lookup_member(expr, &owner, &name.text, Receiver::Implicit) {
                Bound::Error => continue,
                found => return found,
            }
        }

        let statics = self.scope.imports.static_types.clone();
        for syntax in &statics {
            let ty = TypeScope::default().resolve(self.registry, syntax);
            if ty.is_error() {
                continue;
            }
            match self.lookup_member(expr, &ty, &name.text, Receiver::Static) {
                Bound::Error => continue,
                found => return found,
            }
        }

        if let Some(ty) = self
            .scope
            .resolve_simple(self.registry, &name.text, type_args.len())
        {
            return Bound::Type(match ty {
                Ty::Named { def, .. } => Ty::generic(def, self.resolve_all(type_args)),
                other => other,
            });
        }
        if let Some(ns) = self.scope.resolve_namespace(self.registry, &name.text) {
            return Bound::Namespace(ns);
        }
        Bound::Error
    }

    fn bind_member(
        &mut self,
        expr: &Expr,
        target: Bound,
        name: &Ident,
        type_args: &[TypeSyntax],
    ) -> Bound {
        let arity = type_args.len();
        match target {
            Bound::Namespace(ns) => {
                if let Some(def) =
                    TypeScope::lookup_in_namespace(self.registry, &ns, &name.text, arity)
                {
                    Bound::Type(Ty::generic(def, self.resolve_all(type_args)))
                } else {
                    let nested = format!("{}.{}", ns, name.text);
                    if self.registry.is_namespace(&nested) {
                        Bound::Namespace(nested)
                    } else {
                        Bound::Error
                    }
                }
            }
            Bound::Type(ty) => {
                if let Some(def) = ty.def() {
                    if let Some(nested) =
                        TypeScope::lookup_nested(self.registry, def, &name.text, arity)
                    {
                        return Bound::Type(Ty::generic(nested, self.resolve_all(type_args)));
                    }
                }
                self.lookup_member(expr, &ty, &name.text, Receiver::Static)
            }
            Bound::Value(ty) => {
                let receiver = Receiver::Instance(ty.clone());
                self.lookup_member(expr, &ty, &name.text, receiver)
            }
            Bound::Methods { .. } | Bound::Function(_) | Bound::Error => Bound::Error,
        }
    }

    fn lookup_member(&mut self, expr: &Expr, ty: &Ty, name: &str, receiver: Receiver) -> Bound {
        let members = self.registry.members_named(ty, name);
        if let Some(variable) = members.iter().find(|m| {
            !matches!(
                self.registry.member(m).kind,
                MemberKind::Method | MemberKind::Constructor
            )
        }) {
            let member_ty = self.registry.member_type(variable);
            self.model
                .symbols
                .insert(expr.id, Symbol::Member(variable.clone()));
            return Bound::Value(member_ty);
        }

        let mut candidates: Vec<Candidate> = members
            .into_iter()
            .filter(|m| self.registry.member(m).kind == MemberKind::Method)
            .map(|member| Candidate {
                member,
                extension: false,
            })
            .collect();
        if matches!(receiver, Receiver::Instance(_)) {
            candidates.extend(
                self.registry
                    .extensions_named(name)
                    .into_iter()
                    .map(|member| Candidate {
                        member,
                        extension: true,
                    }),
            );
        }
        if candidates.is_empty() {
            Bound::Error
        } else {
            Bound::Methods {
                receiver,
                candidates,
            }
        }
    }

    // ------------------------------------------------------------------------------------
    // invocations

    fn bind_invocation(&mut self, expr: &Expr, callee: &Expr, args: &ArgumentList) -> Ty {
        if let ExprKind::Name { name, type_args } = &callee.kind {
            if name.is("nameof")
                && type_args.is_empty()
                && self.registry.members_named(&self.this_ty, "nameof").is_empty()
            {
                for arg in &args.args {
                    let bound = self.bind_target(&arg.expr);
                    if let Bound::Methods { candidates, .. } = &bound {
                        if let Some(first) = candidates.first() {
                            self.model
                                .symbols
                                .insert(arg.expr.id, Symbol::Member(first.member.clone()));
                        }
                    }
                }
                return self.registry.well_known_ty(WellKnown::String);
            }
        }

        let type_args = match &callee.kind {
            ExprKind::Name { type_args, .. }
            | ExprKind::MemberAccess { type_args, .. }
            | ExprKind::MemberBinding { type_args, .. } => self.resolve_all(type_args),
            _ => Vec::new(),
        };
        let bound = match &callee.kind {
            ExprKind::Name { .. }
            | ExprKind::MemberAccess { .. }
            | ExprKind::MemberBinding { .. } => self.bind_target(callee),
            _ => Bound::Value(self.bind_expr(callee, None)),
        };

        match bound {
            Bound::Methods {
                receiver,
                candidates,
            } => {
                let refs: Vec<&Argument> = args.args.iter().collect();
                match self.resolve_call(&candidates, &receiver, &type_args, &refs) {
                    Some(call) => {
                        let ty = call.return_type.clone();
                        self.model
                            .symbols
                            .insert(expr.id, Symbol::Member(call.method.clone()));
                        self.model
                            .symbols
                            .insert(callee.id, Symbol::Member(call.method.clone()));
                        self.model.calls.insert(expr.id, call);
                        ty
                    }
                    None => Ty::Error,
                }
            }
            Bound::Function(function) => {
                for (index, arg) in args.args.iter().enumerate() {
                    let expected = function.params.get(index).map(|p| p.ty.clone());
                    self.bind_expr(&arg.expr, expected.as_ref());
                }
                function.ret
            }
            Bound::Value(ty) => {
                if let Some((params, ret)) = self.registry.delegate_signature(&ty) {
                    for (index, arg) in args.args.iter().enumerate() {
                        self.bind_expr(&arg.expr, params.get(index));
                    }
                    ret
                } else {
                    self.bind_args_plain(&args.args);
                    match ty {
                        Ty::Function { ret, .. } => *ret,
                        _ => Ty::Error,
                    }
                }
            }
            Bound::Type(_) | Bound::Namespace(_) | Bound::Error => {
                self.bind_args_plain(&args.args);
                Ty::Error
            }
        }
    }

    fn prebind_arg(&mut self, arg: &Argument) -> ArgInfo {
        if let ExprKind::Lambda { params, .. } = &arg.expr.unparenthesized().kind {
            if params.iter().any(|p| p.ty.is_none()) {
                return ArgInfo {
                    ty: Ty::Function {
                        arity: params.len(),
                        ret: Box::new(Ty::Error),
                    },
                    deferred: true,
                };
            }
        }
        ArgInfo {
            ty: self.bind_expr(&arg.expr, None),
            deferred: false,
        }
    }

    /// Select an overload among `candidates` and bind the arguments against it
    fn resolve_call(
        &mut self,
        candidates: &[Candidate],
        receiver: &Receiver,
        type_args: &[Ty],
        args: &[&Argument],
    ) -> Option<CallInfo> {
        let mut infos: Vec<ArgInfo> = args.iter().map(|a| self.prebind_arg(a)).collect();

        let mut best: Option<Application> = None;
        for candidate in candidates {
            for expanded in [false, true] {
                let Some(app) =
                    self.applicable(candidate, receiver, type_args, args, &infos, expanded)
                else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| app.key < b.key) {
                    best = Some(app);
                }
            }
        }

        let Some(app) = best else {
            for (arg, info) in args.iter().zip(&infos) {
                if info.deferred {
                    self.bind_expr(&arg.expr, None);
                }
            }
            return None;
        };
        Some(self.finalize(app, args, &mut infos))
    }

    #[allow(clippy::too_many_lines)]
    fn applicable(
        &self,
        candidate: &Candidate,
        receiver: &Receiver,
        type_args: &[Ty],
        args: &[&Argument],
        infos: &[ArgInfo],
        expanded: bool,
    ) -> Option<Application> {
        let registry = self.registry;
        let def = registry.member(&candidate.member);
        if !matches!(def.kind, MemberKind::Method | MemberKind::Constructor) {
            return None;
        }
        match receiver {
            Receiver::Static
                if !candidate.extension
                    && def.kind == MemberKind::Method
                    && !def.is_static() =>
            {
                return None
            }
            Receiver::Instance(_) if !candidate.extension && def.is_static() => return None,
            _ => {}
        }

        let owner_map = registry.type_map(&candidate.member.owner);
        let mut params: Vec<ParamDef> = def
            .params
            .iter()
            .map(|p| ParamDef {
                ty: p.ty.substitute(&owner_map),
                ..p.clone()
            })
            .collect();
        let receiver_param = if candidate.extension {
            if params.is_empty() {
                return None;
            }
            Some(params.remove(0))
        } else {
            None
        };
        let count = params.len();
        if expanded && !params.last().is_some_and(ParamDef::is_params) {
            return None;
        }

        let mut arg_params = vec![None; args.len()];
        let mut filled = vec![false; count];
        for (i, arg) in args.iter().enumerate() {
            let index = if let Some(name) = &arg.name {
                params.iter().position(|p| p.name == name.text)?
            } else if expanded && i + 1 >= count {
                count - 1
            } else if i < count {
                i
            } else {
                return None;
            };
            if filled[index] && !(expanded && index + 1 == count) {
                return None;
            }
            filled[index] = true;
            arg_params[i] = Some(index);
        }
        for (index, param) in params.iter().enumerate() {
            if !filled[index] && !param.has_default && !(expanded && index + 1 == count) {
                return None;
            }
        }

        let mut app = Application {
            candidate: candidate.clone(),
            map: FxHashMap::default(),
            params,
            arg_params,
            expanded,
            key: (0, 0, 0, 0, 0),
        };

        let generics = &def.generics;
        if generics.is_empty() {
            if !type_args.is_empty() {
                return None;
            }
        } else if !type_args.is_empty() {
            if type_args.len() != generics.len() {
                return None;
            }
            for (name, ty) in generics.iter().zip(type_args) {
                app.map.insert(name.clone(), ty.clone());
            }
        } else {
            let mut map = FxHashMap::default();
            if let (Some(param), Receiver::Instance(ty)) = (&receiver_param, receiver) {
                self.infer(&param.ty, ty, generics, &mut map);
            }
            for (i, info) in infos.iter().enumerate() {
                if info.deferred {
                    continue;
                }
                if let Some(index) = app.arg_params[i] {
                    self.infer(&app.target(registry, index), &info.ty, generics, &mut map);
                }
            }
            let pending = infos.iter().enumerate().any(|(i, info)| {
                info.deferred
                    && app.arg_params[i]
                        .is_some_and(|index| app.target(registry, index).has_params())
            });
            if generics.iter().any(|g| !map.contains_key(g)) && !pending {
                return None;
            }
            app.map = map;
        }

        let mut score = 0u32;
        let mut void_mismatch = 0u32;
        if let (Some(param), Receiver::Instance(ty)) = (&receiver_param, receiver) {
            score += self.rank(ty, &param.ty.substitute(&app.map))?;
        }
        for (i, info) in infos.iter().enumerate() {
            let Some(index) = app.arg_params[i] else {
                continue;
            };
            let target = app.target(registry, index).substitute(&app.map);
            score += self.rank(&info.ty, &target)?;
            if let Ty::Function { ret, .. } = &info.ty {
                if let Some((_, invoke_ret)) = registry.delegate_signature(&target) {
                    if !ret.is_error() && !self.is_void(ret) && self.is_void(&invoke_ret) {
                        void_mismatch += 1;
                    }
                }
            }
        }
        let defaults = filled.iter().filter(|f| !**f).count() as u32;
        app.key = (
            u8::from(candidate.extension),
            score,
            void_mismatch,
            u8::from(expanded),
            defaults,
        );
        Some(app)
    }

    /// Conversion rank of an argument, `None` if it cannot convert
    fn rank(&self, from: &Ty, to: &Ty) -> Option<u32> {
        let conversion = classify_conversion(self.registry, from, to);
        if conversion.is_implicit() {
            Some(conversion.rank())
        } else if conversion == Conversion::ExplicitReference
            && (from.contains_error()
                || to.contains_error()
                || from.has_params()
                || to.has_params())
        {
            Some(5)
        } else {
            None
        }
    }

    /// Infer method type arguments from one parameter/argument pair
    fn infer(&self, param: &Ty, arg: &Ty, generics: &[String], map: &mut FxHashMap<String, Ty>) {
        let registry = self.registry;
        match (param, arg) {
            (Ty::Param(name), _) if generics.contains(name) => {
                if !matches!(arg, Ty::Function { .. } | Ty::Null | Ty::Error) {
                    map.entry(name.clone()).or_insert_with(|| arg.clone());
                }
            }
            (Ty::Array { elem: p, .. }, Ty::Array { elem: a, .. }) => {
                self.infer(p, a, generics, map)
            }
            (Ty::Array { elem: p, .. }, _) => {
                if let Some(element) = registry.element_type(arg) {
                    self.infer(p, &element, generics, map);
                }
            }
            (Ty::Named { def, args: params }, _) if !params.is_empty() => {
                if registry.is_well_known(param, WellKnown::Nullable) {
                    let inner = registry.strip_nullable(arg);
                    self.infer(&params[0], inner, generics, map);
                    return;
                }
                if let Ty::Function { ret, .. } = arg {
                    if let Some((_, invoke_ret)) = registry.delegate_signature(param) {
                        if !ret.is_error() && !self.is_void(ret) {
                            self.infer(&invoke_ret, ret, generics, map);
                        }
                    }
                    return;
                }
                if let Some(instance) = registry.find_supertype(arg, *def) {
                    for (p, a) in params.iter().zip(instance.args()) {
                        self.infer(p, a, generics, map);
                    }
                }
            }
            _ => {}
        }
    }

    fn finalize(
        &mut self,
        app: Application,
        args: &[&Argument],
        infos: &mut [ArgInfo],
    ) -> CallInfo {
        let registry = self.registry;
        let member = registry.member(&app.candidate.member);
        let generics = member.generics.clone();
        let declared_ret = member.ty.substitute(&registry.type_map(&app.candidate.member.owner));
        let mut map = app.map.clone();

        for (i, arg) in args.iter().enumerate() {
            if !infos[i].deferred {
                continue;
            }
            let target = app.arg_params[i]
                .map(|index| app.target(registry, index).substitute(&map));
            let ty = self.bind_expr(&arg.expr, target.as_ref());
            if let Some(target) = &target {
                self.infer(target, &ty, &generics, &mut map);
            }
            infos[i].ty = ty;
        }

        let param_types: Vec<Ty> = app.params.iter().map(|p| p.ty.substitute(&map)).collect();
        for (i, arg) in args.iter().enumerate() {
            if let ExprKind::Declaration { ty, name } = &arg.expr.kind {
                if let (true, Some(index)) = (ty.is_var(), app.arg_params[i]) {
                    let local = param_types[index].clone();
                    self.declare_local(name, local.clone());
                    self.model.types.insert(arg.expr.id, local);
                }
            }
        }

        CallInfo {
            type_args: generics
                .iter()
                .map(|g| map.get(g).cloned().unwrap_or(Ty::Error))
                .collect(),
            param_names: app.params.iter().map(|p| p.name.clone()).collect(),
            param_types,
            arg_params: app.arg_params,
            expanded: app.expanded,
            is_extension: app.candidate.extension,
            return_type: declared_ret.substitute(&map),
            method: app.candidate.member,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::host::{
        semantic::{Compilation, Symbol},
        syntax::{visit::collect_exprs, Expr, ExprKind, MemberDecl, MethodBody, Stmt},
    };

    fn statements(compilation: &Compilation) -> Vec<&Stmt> {
        let mut out = Vec::new();
        for ty in compilation.tree(0).root().types() {
            for member in &ty.members {
                if let MemberDecl::Method(method) = member {
                    if let Some(MethodBody::Block(block)) = &method.body {
                        out.extend(block.stmts.iter());
                    }
                }
            }
        }
        out
    }

    fn invocations<'c>(compilation: &'c Compilation, name: &str) -> Vec<&'c Expr> {
        statements(compilation)
            .into_iter()
            .flat_map(|s| collect_exprs(s, |e| e.invoked_name() == Some(name)))
            .collect()
    }

    fn display(compilation: &Compilation, expr: &Expr) -> String {
        compilation
            .registry()
            .display(compilation.model(0).type_of(expr))
    }

    #[test]
    fn test_locals_and_literals() {
        let compilation = Compilation::from_source(
            "t.cs",
            "class C { void M() { var a = 1; var b = 2.5; var c = a + b; long d = 3L; var s = \
             \"x\" + a; F(c, d, s); } void F(object a, object b, object c) { } }",
        )
        .unwrap();
        let call = invocations(&compilation, "F")[0];
        let ExprKind::Invocation { args, .. } = &call.kind else {
            panic!()
        };
        let types: Vec<String> = args.args.iter().map(|a| display(&compilation, &a.expr)).collect();
        assert_eq!(types, vec!["double", "long", "string"]);
    }

    #[test]
    fn test_generic_inference_selects_typed_overload() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using NUnit.Framework; class C { void M() { int x = 1; Assert.That(x, \
             Is.EqualTo(2)); } }",
        )
        .unwrap();
        let that = invocations(&compilation, "That")[0];
        let call = compilation.model(0).call_of(that).unwrap();
        assert_eq!(call.param_names[0], "actual");
        assert_eq!(compilation.registry().display(&call.param_types[0]), "int");
    }

    #[test]
    fn test_lambda_prefers_value_returning_delegate() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using NUnit.Framework; class C { int F() => 1; void M() { Assert.That(() => F(), \
             Is.EqualTo(1)); Assert.That(() => M(), Throws.Nothing); } }",
        )
        .unwrap();
        let calls = invocations(&compilation, "That");
        let model = compilation.model(0);
        let registry = compilation.registry();
        let first = model.call_of(calls[0]).unwrap();
        assert_eq!(registry.display(&first.param_types[0]), "ActualValueDelegate<int>");
        let second = model.call_of(calls[1]).unwrap();
        assert_eq!(registry.display(&second.param_types[0]), "TestDelegate");
    }

    #[test]
    fn test_params_expanded_and_named_arguments() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using NUnit.Framework; class C { void M(bool b) { Assert.That(b, \"m {0} {1}\", 1, \
             2); Assert.That(message: \"m\", condition: b, args: null); } }",
        )
        .unwrap();
        let calls = invocations(&compilation, "That");
        let model = compilation.model(0);
        let expanded = model.call_of(calls[0]).unwrap();
        assert!(expanded.expanded);
        assert_eq!(expanded.arg_params, vec![Some(0), Some(1), Some(2), Some(2)]);
        let named = model.call_of(calls[1]).unwrap();
        assert!(!named.expanded);
        assert_eq!(named.argument_named("condition"), Some(1));
    }

    #[test]
    fn test_await_and_conditional_access() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using System.IO; using System.Threading.Tasks; class C { Stream s; async Task<int> \
             G() => 1; async Task M() { var v = await G(); var w = await \
             G().ConfigureAwait(false); var p = s?.Length; Use(v, w, p); } void Use(object a, \
             object b, object c) { } }",
        )
        .unwrap();
        let call = invocations(&compilation, "Use")[0];
        let ExprKind::Invocation { args, .. } = &call.kind else {
            panic!()
        };
        let types: Vec<String> = args.args.iter().map(|a| display(&compilation, &a.expr)).collect();
        assert_eq!(types, vec!["int", "int", "long?"]);
    }

    #[test]
    fn test_symbols_for_fields_and_types() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using System.IO; class C { private Stream field; void M() { field.Dispose(); \
             File.Exists(\"x\"); } }",
        )
        .unwrap();
        let dispose = invocations(&compilation, "Dispose")[0];
        let ExprKind::Invocation { callee, .. } = &dispose.kind else {
            panic!()
        };
        let ExprKind::MemberAccess { target, .. } = &callee.kind else {
            panic!()
        };
        let model = compilation.model(0);
        assert!(matches!(model.symbol_of(target), Some(Symbol::Member(_))));
        let exists = invocations(&compilation, "Exists")[0];
        let ExprKind::Invocation { callee, .. } = &exists.kind else {
            panic!()
        };
        let ExprKind::MemberAccess { target, .. } = &callee.kind else {
            panic!()
        };
        assert!(matches!(model.symbol_of(target), Some(Symbol::Type(_))));
    }

    #[test]
    fn test_foreach_and_pattern_variables() {
        let compilation = Compilation::from_source(
            "t.cs",
            "using System; using System.Collections.Generic; class C { void M(List<string> items, \
             object o) { foreach (var item in items) { Use(item); } if (o is IDisposable d) { \
             Use(d); } } void Use(object x) { } }",
        )
        .unwrap();
        let uses = invocations(&compilation, "Use");
        let arg = |call: &Expr| -> String {
            let ExprKind::Invocation { args, .. } = &call.kind else {
                panic!()
            };
            display(&compilation, &args.args[0].expr)
        };
        assert_eq!(arg(uses[0]), "string");
        assert_eq!(arg(uses[1]), "IDisposable");
    }
}
