//! Syntax tree node types.
//!
//! The tree is a set of closed sum types ([`ExprKind`], [`StmtKind`], [`MemberDecl`]) so that
//! consumers dispatch with a plain `match`. Nodes do not own their text: every node records the
//! [`Span`] of its first to last token, and the owning
//! [`SyntaxTree`](crate::host::syntax::SyntaxTree) renders that span (with or without the
//! surrounding trivia) straight from the source. Rendering therefore reproduces the input byte
//! for byte.

use bitflags::bitflags;
use strum::{AsRefStr, Display, EnumString};

use crate::host::syntax::token::Span;

/// Identifier of an expression node, unique within one syntax tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A simple name with its location. `text` has any `@` verbatim prefix removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The name
    pub text: String,
    /// Location of the name token
    pub span: Span,
}

impl Ident {
    /// True if the name equals `text`
    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

bitflags! {
    /// Declaration modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// `public`
        const PUBLIC = 0x0001;
        /// `private`
        const PRIVATE = 0x0002;
        /// `protected`
        const PROTECTED = 0x0004;
        /// `internal`
        const INTERNAL = 0x0008;
        /// `static`
        const STATIC = 0x0010;
        /// `abstract`
        const ABSTRACT = 0x0020;
        /// `virtual`
        const VIRTUAL = 0x0040;
        /// `override`
        const OVERRIDE = 0x0080;
        /// `sealed`
        const SEALED = 0x0100;
        /// `readonly`
        const READONLY = 0x0200;
        /// `const`
        const CONST = 0x0400;
        /// `async`
        const ASYNC = 0x0800;
        /// `extern`
        const EXTERN = 0x1000;
        /// `new` used as a member modifier
        const NEW = 0x2000;
        /// `partial`
        const PARTIAL = 0x4000;
        /// `volatile`
        const VOLATILE = 0x8000;
    }
}

impl Modifiers {
    /// Map a modifier keyword to its flag
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Modifiers> {
        Some(match text {
            "public" => Modifiers::PUBLIC,
            "private" => Modifiers::PRIVATE,
            "protected" => Modifiers::PROTECTED,
            "internal" => Modifiers::INTERNAL,
            "static" => Modifiers::STATIC,
            "abstract" => Modifiers::ABSTRACT,
            "virtual" => Modifiers::VIRTUAL,
            "override" => Modifiers::OVERRIDE,
            "sealed" => Modifiers::SEALED,
            "readonly" => Modifiers::READONLY,
            "const" => Modifiers::CONST,
            "async" => Modifiers::ASYNC,
            "extern" => Modifiers::EXTERN,
            "new" => Modifiers::NEW,
            "partial" => Modifiers::PARTIAL,
            "volatile" => Modifiers::VOLATILE,
            _ => return None,
        })
    }
}

/// A type as written in source
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSyntax {
    /// Location
    pub span: Span,
    /// Shape
    pub kind: TypeSyntaxKind,
}

/// One segment of a possibly qualified type name, e.g. `List<int>` in `System.List<int>`
#[derive(Debug, Clone, PartialEq)]
pub struct NameSegment {
    /// The simple name
    pub name: Ident,
    /// Generic arguments, empty if none were written
    pub args: Vec<TypeSyntax>,
}

/// Shapes of [`TypeSyntax`]
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSyntaxKind {
    /// A predefined keyword type such as `int` or `string`
    Predefined(String),
    /// A simple or dotted name with optional generic arguments per segment
    Named(Vec<NameSegment>),
    /// `T[]`, `T[,]`
    Array {
        /// Element type
        elem: Box<TypeSyntax>,
        /// Number of dimensions
        rank: u32,
    },
    /// `T?`
    Nullable(Box<TypeSyntax>),
    /// `(int, string name)`
    Tuple(Vec<TypeSyntax>),
}

impl TypeSyntax {
    /// True if this is the contextual `var` type
    #[must_use]
    pub fn is_var(&self) -> bool {
        matches!(&self.kind, TypeSyntaxKind::Named(segments)
            if segments.len() == 1 && segments[0].name.is("var") && segments[0].args.is_empty())
    }

    /// The last simple name for named types
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeSyntaxKind::Named(segments) => segments.last().map(|s| s.name.text.as_str()),
            TypeSyntaxKind::Predefined(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal, raw text kept for rendering
    Int(String),
    /// Real literal
    Real(String),
    /// String literal; `value` is the decoded content
    String {
        /// Decoded content
        value: String,
        /// `@"..."` form
        verbatim: bool,
    },
    /// Character literal
    Char(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[allow(missing_docs)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Rem,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "??")]
    Coalesce,
}

impl BinaryOp {
    /// Binding power; higher binds tighter
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Coalesce => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::BitOr => 4,
            BinaryOp::BitXor => 5,
            BinaryOp::BitAnd => 6,
            BinaryOp::Eq | BinaryOp::Ne => 7,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 8,
            BinaryOp::Shl | BinaryOp::Shr => 9,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 11,
        }
    }

    /// The user-defined operator method name, e.g. `op_BitwiseAnd`
    #[must_use]
    pub fn operator_method(self) -> &'static str {
        match self {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Sub => "op_Subtraction",
            BinaryOp::Mul => "op_Multiply",
            BinaryOp::Div => "op_Division",
            BinaryOp::Rem => "op_Modulus",
            BinaryOp::BitAnd => "op_BitwiseAnd",
            BinaryOp::BitOr => "op_BitwiseOr",
            BinaryOp::BitXor => "op_ExclusiveOr",
            BinaryOp::Shl => "op_LeftShift",
            BinaryOp::Shr => "op_RightShift",
            BinaryOp::Eq => "op_Equality",
            BinaryOp::Ne => "op_Inequality",
            BinaryOp::Lt => "op_LessThan",
            BinaryOp::Le => "op_LessThanOrEqual",
            BinaryOp::Gt => "op_GreaterThan",
            BinaryOp::Ge => "op_GreaterThanOrEqual",
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => "",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[allow(missing_docs)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "~")]
    Complement,
    #[strum(serialize = "++")]
    PreIncrement,
    #[strum(serialize = "--")]
    PreDecrement,
    #[strum(serialize = "++")]
    PostIncrement,
    #[strum(serialize = "--")]
    PostDecrement,
    /// Null-forgiving `x!`
    #[strum(serialize = "!")]
    Suppress,
}

/// Assignment operators; `Assign` is the simple `=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[allow(missing_docs)]
pub enum AssignOp {
    #[strum(serialize = "=")]
    Assign,
    #[strum(serialize = "+=")]
    Add,
    #[strum(serialize = "-=")]
    Sub,
    #[strum(serialize = "*=")]
    Mul,
    #[strum(serialize = "/=")]
    Div,
    #[strum(serialize = "%=")]
    Rem,
    #[strum(serialize = "&=")]
    And,
    #[strum(serialize = "|=")]
    Or,
    #[strum(serialize = "^=")]
    Xor,
    #[strum(serialize = "<<=")]
    Shl,
    #[strum(serialize = "??=")]
    Coalesce,
}

/// A single argument of a call
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Location, from the name colon (if any) to the end of the expression
    pub span: Span,
    /// `name:` prefix
    pub name: Option<Ident>,
    /// `ref`, `out` or `in`
    pub modifier: Option<String>,
    /// The argument value
    pub expr: Expr,
}

/// A parenthesized or bracketed argument list with its separators
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentList {
    /// From the opening to the closing delimiter
    pub span: Span,
    /// Opening delimiter token
    pub open: Span,
    /// Closing delimiter token
    pub close: Span,
    /// Arguments in source order
    pub args: Vec<Argument>,
    /// Comma tokens; always `args.len() - 1` entries when non-empty
    pub separators: Vec<Span>,
}

/// Pattern forms used after `is` and in `case` labels
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `T` or `T name`
    Type {
        /// Tested type
        ty: TypeSyntax,
        /// Bound variable
        designation: Option<Ident>,
    },
    /// `var name`
    Var(Ident),
    /// A constant such as `null` or `3`
    Constant(Box<Expr>),
    /// `not P`
    Not(Box<Pattern>),
    /// `{ }` with optional designation
    Property(Option<Ident>),
    /// `_`
    Discard,
}

/// Parameter of a lambda expression
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParam {
    /// Explicit type, if written
    pub ty: Option<TypeSyntax>,
    /// Name
    pub name: Ident,
}

/// Body of a lambda or expression-bodied member
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    /// `=> expr`
    Expr(Box<Expr>),
    /// `=> { ... }`
    Block(Block),
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Identity within the tree, used as the key of semantic information
    pub id: NodeId,
    /// Location of the expression text, without outer trivia
    pub span: Span,
    /// Shape
    pub kind: ExprKind,
}

/// Expression shapes
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Simple name, possibly generic: `x`, `Foo<int>`
    Name {
        /// The name
        name: Ident,
        /// Explicit generic arguments
        type_args: Vec<TypeSyntax>,
    },
    /// Predefined type keyword used as an expression receiver, e.g. `string.Empty`
    PredefinedType(String),
    /// Literal
    Literal(Literal),
    /// Interpolated string, kept opaque
    Interpolated(String),
    /// `target.name`
    MemberAccess {
        /// Receiver
        target: Box<Expr>,
        /// Accessed member
        name: Ident,
        /// Explicit generic arguments
        type_args: Vec<TypeSyntax>,
    },
    /// `target?.access`; `access` is rooted at a [`ExprKind::MemberBinding`]
    ConditionalAccess {
        /// Receiver tested for null
        target: Box<Expr>,
        /// Chain applied when non-null
        access: Box<Expr>,
    },
    /// The `.name` at the root of a conditional access chain
    MemberBinding {
        /// Accessed member
        name: Ident,
        /// Explicit generic arguments
        type_args: Vec<TypeSyntax>,
    },
    /// `callee(args)`
    Invocation {
        /// Invoked expression
        callee: Box<Expr>,
        /// Arguments
        args: ArgumentList,
    },
    /// `target[args]`
    ElementAccess {
        /// Indexed expression
        target: Box<Expr>,
        /// Indices
        args: ArgumentList,
    },
    /// `new T(args) { initializer }`
    ObjectCreation {
        /// Created type; `None` for target-typed `new()`
        ty: Option<TypeSyntax>,
        /// Constructor arguments
        args: Option<ArgumentList>,
        /// Object or collection initializer expressions
        initializer: Option<Vec<Expr>>,
    },
    /// `new T[n]`, `new T[] { ... }`, `new[] { ... }`
    ArrayCreation {
        /// Element type; `None` for implicitly typed arrays
        elem: Option<TypeSyntax>,
        /// Number of dimensions
        rank: u32,
        /// Explicit sizes
        sizes: Vec<Expr>,
        /// Initializer elements
        initializer: Option<Vec<Expr>>,
    },
    /// `{ a, b }` nested inside an initializer
    InitializerList(Vec<Expr>),
    /// `cond ? a : b`
    Conditional {
        /// Condition
        cond: Box<Expr>,
        /// Value when true
        when_true: Box<Expr>,
        /// Value when false
        when_false: Box<Expr>,
    },
    /// `left op right`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Prefix or postfix unary operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `target op value`
    Assignment {
        /// Operator
        op: AssignOp,
        /// Assigned location
        target: Box<Expr>,
        /// Assigned value
        value: Box<Expr>,
    },
    /// `await operand`
    Await(Box<Expr>),
    /// `expr is pattern`
    Is {
        /// Tested value
        expr: Box<Expr>,
        /// Pattern
        pattern: Pattern,
    },
    /// `expr as T`
    As {
        /// Converted value
        expr: Box<Expr>,
        /// Target type
        ty: TypeSyntax,
    },
    /// `(T)expr`
    Cast {
        /// Target type
        ty: TypeSyntax,
        /// Converted value
        expr: Box<Expr>,
    },
    /// Lambda expression
    Lambda {
        /// `async` modifier present
        is_async: bool,
        /// Parameters
        params: Vec<LambdaParam>,
        /// Body
        body: LambdaBody,
    },
    /// `(expr)`
    Parenthesized(Box<Expr>),
    /// `(a, b)`
    Tuple(Vec<Argument>),
    /// `typeof(T)`
    TypeOf(TypeSyntax),
    /// `default` or `default(T)`
    Default(Option<TypeSyntax>),
    /// `out var x` / `out T x` inside an argument
    Declaration {
        /// Declared type
        ty: TypeSyntax,
        /// Declared variable
        name: Ident,
    },
    /// `this`
    This,
    /// `base`
    Base,
    /// `throw expr` in expression position
    Throw(Box<Expr>),
}

impl Expr {
    /// Strip any number of enclosing parentheses
    #[must_use]
    pub fn unparenthesized(&self) -> &Expr {
        let mut current = self;
        while let ExprKind::Parenthesized(inner) = &current.kind {
            current = inner;
        }
        current
    }

    /// The member name for names, member accesses and member bindings
    #[must_use]
    pub fn member_name(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Name { name, .. }
            | ExprKind::MemberAccess { name, .. }
            | ExprKind::MemberBinding { name, .. } => Some(name),
            _ => None,
        }
    }

    /// For an invocation, the name of the invoked member
    #[must_use]
    pub fn invoked_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Invocation { callee, .. } => callee.member_name().map(|n| n.text.as_str()),
            _ => None,
        }
    }

    /// True for string literals
    #[must_use]
    pub fn is_string_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::String { .. }))
    }

    /// The decoded value of a string literal
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Literal(Literal::String { value, .. }) => Some(value),
            _ => None,
        }
    }
}

/// A variable declarator `name = init`
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    /// Location from name to the end of the initializer
    pub span: Span,
    /// Declared name
    pub name: Ident,
    /// Initializer
    pub init: Option<Expr>,
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Location from `{` to `}`
    pub span: Span,
    /// Opening brace
    pub open: Span,
    /// Closing brace
    pub close: Span,
    /// Statements
    pub stmts: Vec<Stmt>,
}

/// One `case`/`default` group of a switch statement
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    /// Case labels; `None` is `default:`
    pub labels: Vec<Option<Pattern>>,
    /// Statements
    pub stmts: Vec<Stmt>,
}

/// `catch (T name) when (filter) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Caught exception type
    pub ty: Option<TypeSyntax>,
    /// Exception variable
    pub name: Option<Ident>,
    /// Exception filter
    pub filter: Option<Expr>,
    /// Handler
    pub block: Block,
}

/// Resource of a `using` statement
#[derive(Debug, Clone, PartialEq)]
pub enum UsingResource {
    /// `using (var x = ...)`
    Declaration {
        /// Declared type
        ty: TypeSyntax,
        /// Declarators
        declarators: Vec<Declarator>,
    },
    /// `using (expr)`
    Expr(Expr),
}

/// A statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Location without outer trivia
    pub span: Span,
    /// Shape
    pub kind: StmtKind,
}

/// Statement shapes
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `{ ... }`
    Block(Block),
    /// Local variable declaration, including `using var` and `const`
    Local {
        /// Declared type
        ty: TypeSyntax,
        /// Declarators
        declarators: Vec<Declarator>,
        /// `using var x = ...;`
        is_using: bool,
        /// `const`
        is_const: bool,
    },
    /// `expr;`
    Expression(Expr),
    /// `if (cond) then else otherwise`
    If {
        /// Condition
        cond: Expr,
        /// Then branch
        then: Box<Stmt>,
        /// Else branch
        otherwise: Option<Box<Stmt>>,
    },
    /// `switch (expr) { sections }`
    Switch {
        /// Switched value
        expr: Expr,
        /// Sections
        sections: Vec<SwitchSection>,
    },
    /// `try { } catch { } finally { }`
    Try {
        /// Protected block
        block: Block,
        /// Handlers
        catches: Vec<CatchClause>,
        /// Finally block
        finally: Option<Block>,
    },
    /// `using (resource) body`
    Using {
        /// `await using`
        is_await: bool,
        /// Resource
        resource: UsingResource,
        /// Body
        body: Box<Stmt>,
    },
    /// `return expr;`
    Return(Option<Expr>),
    /// `throw expr;`
    Throw(Option<Expr>),
    /// `while (cond) body`
    While {
        /// Condition
        cond: Expr,
        /// Body
        body: Box<Stmt>,
    },
    /// `do body while (cond);`
    DoWhile {
        /// Body
        body: Box<Stmt>,
        /// Condition
        cond: Expr,
    },
    /// `for (init; cond; step) body`
    For {
        /// Initializer statement
        init: Option<Box<Stmt>>,
        /// Condition
        cond: Option<Expr>,
        /// Iteration expressions
        step: Vec<Expr>,
        /// Body
        body: Box<Stmt>,
    },
    /// `foreach (T name in expr) body`
    Foreach {
        /// Declared type
        ty: TypeSyntax,
        /// Iteration variable
        name: Ident,
        /// Iterated collection
        expr: Expr,
        /// Body
        body: Box<Stmt>,
    },
    /// `lock (expr) body`
    Lock {
        /// Lock object
        expr: Expr,
        /// Body
        body: Box<Stmt>,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `;`
    Empty,
    /// Local function
    LocalFunction(Box<MethodDecl>),
}

/// `[Name(args)]`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSyntax {
    /// Location of the attribute inside the brackets
    pub span: Span,
    /// Attribute name, possibly qualified and possibly without the `Attribute` suffix
    pub name: TypeSyntax,
    /// Argument list
    pub args: Option<ArgumentList>,
}

impl AttributeSyntax {
    /// The attribute's simple name with any `Attribute` suffix removed
    #[must_use]
    pub fn short_name(&self) -> &str {
        let name = self.name.simple_name().unwrap_or_default();
        name.strip_suffix("Attribute").unwrap_or(name)
    }
}

/// Parameter modifier keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr)]
#[allow(missing_docs)]
pub enum ParamModifier {
    #[default]
    #[strum(serialize = "")]
    None,
    #[strum(serialize = "params")]
    Params,
    #[strum(serialize = "ref")]
    Ref,
    #[strum(serialize = "out")]
    Out,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "this")]
    This,
}

/// A method or indexer parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Attributes
    pub attributes: Vec<AttributeSyntax>,
    /// Modifier
    pub modifier: ParamModifier,
    /// Declared type
    pub ty: TypeSyntax,
    /// Name
    pub name: Ident,
    /// Default value
    pub default: Option<Expr>,
}

/// Body of a method, accessor or constructor
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    /// `{ ... }`
    Block(Block),
    /// `=> expr;`
    Expr(Expr),
}

/// Method, constructor or local function
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Location including attributes
    pub span: Span,
    /// Attributes
    pub attributes: Vec<AttributeSyntax>,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Return type; `None` for constructors
    pub return_type: Option<TypeSyntax>,
    /// Name; the type name for constructors
    pub name: Ident,
    /// Generic parameters
    pub type_params: Vec<Ident>,
    /// Parameters
    pub params: Vec<Parameter>,
    /// `: base(...)` / `: this(...)` initializer of a constructor
    pub initializer: Option<ArgumentList>,
    /// Body; `None` for abstract and interface members and stubs
    pub body: Option<MethodBody>,
    /// True for constructors
    pub is_constructor: bool,
}

/// `get`/`set`/`init` accessor
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// `get`, `set` or `init`
    pub kind: String,
    /// Body, `None` for auto accessors
    pub body: Option<MethodBody>,
}

/// Property or indexer
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    /// Location including attributes
    pub span: Span,
    /// Attributes
    pub attributes: Vec<AttributeSyntax>,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Property type
    pub ty: TypeSyntax,
    /// Name; `this` for indexers
    pub name: Ident,
    /// Indexer parameters
    pub params: Vec<Parameter>,
    /// Accessors
    pub accessors: Vec<Accessor>,
    /// `=> expr` body
    pub expr_body: Option<Expr>,
    /// `= value;` initializer
    pub initializer: Option<Expr>,
}

impl PropertyDecl {
    /// True if the property has a body-less `get` accessor, i.e. is auto-implemented
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.expr_body.is_none() && self.accessors.iter().all(|a| a.body.is_none())
    }
}

/// Field declaration, possibly declaring several variables
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Location including attributes
    pub span: Span,
    /// Attributes
    pub attributes: Vec<AttributeSyntax>,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Field type
    pub ty: TypeSyntax,
    /// Declared variables
    pub declarators: Vec<Declarator>,
}

/// Members of a type declaration
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    /// Field
    Field(FieldDecl),
    /// Property or indexer
    Property(PropertyDecl),
    /// Method or constructor
    Method(MethodDecl),
    /// Nested type
    Type(TypeDecl),
}

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[allow(missing_docs)]
#[strum(serialize_all = "lowercase")]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Record,
}

/// Class, struct, interface, enum or delegate declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Location including attributes
    pub span: Span,
    /// Attributes
    pub attributes: Vec<AttributeSyntax>,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Kind
    pub kind: TypeDeclKind,
    /// Name
    pub name: Ident,
    /// Generic parameters
    pub type_params: Vec<Ident>,
    /// Base class and interfaces
    pub bases: Vec<TypeSyntax>,
    /// Members
    pub members: Vec<MemberDecl>,
    /// Enum member names
    pub enum_members: Vec<Ident>,
    /// Return type and parameters of a delegate
    pub delegate: Option<(TypeSyntax, Vec<Parameter>)>,
}

impl TypeDecl {
    /// Iterate the methods and constructors
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            MemberDecl::Method(method) => Some(method),
            _ => None,
        })
    }
}

/// `using System.IO;` / `using static X;` / `using A = B;`
#[derive(Debug, Clone, PartialEq)]
pub struct UsingDirective {
    /// Location
    pub span: Span,
    /// Imported namespace or type
    pub name: TypeSyntax,
    /// `using static`
    pub is_static: bool,
    /// `using Alias = ...`
    pub alias: Option<Ident>,
}

/// `namespace X { ... }` or `namespace X;`
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// Location
    pub span: Span,
    /// Dotted name
    pub name: String,
    /// Usings inside the namespace
    pub usings: Vec<UsingDirective>,
    /// Members
    pub members: Vec<NamespaceMember>,
}

/// Top-level or namespace-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceMember {
    /// Nested namespace
    Namespace(NamespaceDecl),
    /// Type
    Type(TypeDecl),
}

/// Root of a syntax tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    /// File-level usings
    pub usings: Vec<UsingDirective>,
    /// Declarations
    pub members: Vec<NamespaceMember>,
}

impl CompilationUnit {
    /// Visit every type declaration with its namespace and the usings in scope
    pub fn for_each_type<'a>(
        &'a self,
        f: &mut dyn FnMut(&'a TypeDecl, &str, &[&'a UsingDirective]),
    ) {
        fn walk<'a>(
            members: &'a [NamespaceMember],
            namespace: &str,
            usings: &mut Vec<&'a UsingDirective>,
            f: &mut dyn FnMut(&'a TypeDecl, &str, &[&'a UsingDirective]),
        ) {
            for member in members {
                match member {
                    NamespaceMember::Type(ty) => walk_type(ty, namespace, usings, f),
                    NamespaceMember::Namespace(ns) => {
                        let name = if namespace.is_empty() {
                            ns.name.clone()
                        } else {
                            format!("{}.{}", namespace, ns.name)
                        };
                        let depth = usings.len();
                        usings.extend(ns.usings.iter());
                        walk(&ns.members, &name, usings, f);
                        usings.truncate(depth);
                    }
                }
            }
        }

        fn walk_type<'a>(
            ty: &'a TypeDecl,
            namespace: &str,
            usings: &mut Vec<&'a UsingDirective>,
            f: &mut dyn FnMut(&'a TypeDecl, &str, &[&'a UsingDirective]),
        ) {
            f(ty, namespace, usings);
            for member in &ty.members {
                if let MemberDecl::Type(nested) = member {
                    walk_type(nested, namespace, usings, f);
                }
            }
        }

        let mut usings: Vec<&UsingDirective> = self.usings.iter().collect();
        walk(&self.members, "", &mut usings, f);
    }

    /// All type declarations, nested ones included
    #[must_use]
    pub fn types(&self) -> Vec<&TypeDecl> {
        let mut out = Vec::new();
        self.for_each_type(&mut |ty, _, _| out.push(ty));
        out
    }
}
