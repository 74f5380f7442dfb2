//! Per-tree semantic information produced by the binder.

use rustc_hash::FxHashMap;

use crate::host::{
    syntax::{AttributeSyntax, Expr, NodeId, Span},
    types::{MemberRef, Ty},
};

static ERROR_TY: Ty = Ty::Error;

/// What a name or member access refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A local variable, pattern variable, `foreach` or `catch` variable
    Local {
        /// Name
        name: String,
        /// Declared or inferred type
        ty: Ty,
        /// Location of the declaring identifier
        span: Span,
    },
    /// A parameter of the enclosing method, accessor, local function or lambda
    Parameter {
        /// Name
        name: String,
        /// Declared type
        ty: Ty,
        /// Position in the parameter list
        index: usize,
    },
    /// A field, property, method, constructor or enum member
    Member(MemberRef),
    /// A type used as an expression receiver
    Type(Ty),
    /// A namespace prefix of a qualified name
    Namespace(String),
}

impl Symbol {
    /// True for locals and parameters
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Symbol::Local { .. } | Symbol::Parameter { .. })
    }

    /// The member reference of member symbols
    #[must_use]
    pub fn member(&self) -> Option<&MemberRef> {
        match self {
            Symbol::Member(member) => Some(member),
            _ => None,
        }
    }
}

/// The resolved target of an invocation or object creation
#[derive(Debug, Clone, PartialEq)]
pub struct CallInfo {
    /// The selected method or constructor
    pub method: MemberRef,
    /// Inferred or explicit method type arguments, in declaration order
    pub type_args: Vec<Ty>,
    /// Parameter types after substitution; the receiver of an extension method is excluded
    pub param_types: Vec<Ty>,
    /// Parameter names, parallel to `param_types`
    pub param_names: Vec<String>,
    /// For each argument, the index of the parameter it binds to
    pub arg_params: Vec<Option<usize>>,
    /// The `params` array was passed in expanded form
    pub expanded: bool,
    /// The call is an extension method invoked with receiver syntax
    pub is_extension: bool,
    /// Return type after substitution
    pub return_type: Ty,
}

impl CallInfo {
    /// Index of the parameter named `name`
    #[must_use]
    pub fn param_named(&self, name: &str) -> Option<usize> {
        self.param_names.iter().position(|p| p == name)
    }

    /// Index of the first argument bound to the parameter at `param`
    #[must_use]
    pub fn argument_for(&self, param: usize) -> Option<usize> {
        self.arg_params.iter().position(|p| *p == Some(param))
    }

    /// Indices of all arguments bound to the parameter at `param`, in source order
    #[must_use]
    pub fn arguments_for(&self, param: usize) -> Vec<usize> {
        self.arg_params
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(param))
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the first argument bound to the parameter named `name`
    #[must_use]
    pub fn argument_named(&self, name: &str) -> Option<usize> {
        self.param_named(name).and_then(|p| self.argument_for(p))
    }
}

/// An applied attribute with its resolved constructor
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// Attribute class
    pub ty: Ty,
    /// Selected constructor, if overload resolution succeeded
    pub call: Option<CallInfo>,
}

/// Semantic information for one syntax tree.
///
/// Queries never fail: an expression the binder could not resolve has the error type and no
/// symbol.
#[derive(Debug, Default, Clone)]
pub struct SemanticModel {
    pub(crate) types: FxHashMap<NodeId, Ty>,
    pub(crate) symbols: FxHashMap<NodeId, Symbol>,
    pub(crate) calls: FxHashMap<NodeId, CallInfo>,
    pub(crate) attributes: FxHashMap<Span, AttributeInfo>,
    pub(crate) typeof_operands: FxHashMap<NodeId, Ty>,
}

impl SemanticModel {
    /// The type of an expression; [`Ty::Error`] if unknown
    #[must_use]
    pub fn type_of(&self, expr: &Expr) -> &Ty {
        self.types.get(&expr.id).unwrap_or(&ERROR_TY)
    }

    /// The symbol an expression refers to
    #[must_use]
    pub fn symbol_of(&self, expr: &Expr) -> Option<&Symbol> {
        self.symbols.get(&expr.id)
    }

    /// The resolved target of an invocation or object creation
    #[must_use]
    pub fn call_of(&self, expr: &Expr) -> Option<&CallInfo> {
        self.calls.get(&expr.id)
    }

    /// The resolved class and constructor of an applied attribute
    #[must_use]
    pub fn attribute(&self, attribute: &AttributeSyntax) -> Option<&AttributeInfo> {
        self.attributes.get(&attribute.span)
    }

    /// The type named by a `typeof` expression
    #[must_use]
    pub fn typeof_operand(&self, expr: &Expr) -> Option<&Ty> {
        self.typeof_operands.get(&expr.id)
    }

    /// Number of expressions with a recorded type
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if nothing was bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
