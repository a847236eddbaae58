//! Parse tree for the script subset.

use std::ops::Range;

/// A function: its parameters and body statements.
///
/// The top level of a parsed source range is represented as an anonymous
/// function literal with no parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    /// Function name, absent for the top level and anonymous expressions
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Statement>,
    /// Absolute source span
    pub span: Range<usize>,
}

/// Binding keyword of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var a = 1, b;`
    Declaration {
        /// Binding keyword
        kind: DeclarationKind,
        /// Names with optional initializers
        bindings: Vec<(String, Option<Expression>)>,
    },
    /// `function f() {}`
    Function(FunctionLiteral),
    /// `return x;`
    Return(Option<Expression>),
    /// `if (c) a else b`
    If {
        /// Condition
        condition: Expression,
        /// Taken branch
        then_branch: Box<Statement>,
        /// Optional `else` branch
        else_branch: Option<Box<Statement>>,
    },
    /// `while (c) body`
    While {
        /// Condition
        condition: Expression,
        /// Loop body
        body: Box<Statement>,
    },
    /// `{ ... }`
    Block(Vec<Statement>),
    /// An expression followed by a semicolon
    Expression(Expression),
    /// `;`
    Empty,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
}

/// Infix operators, including the short-circuiting logical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Expression {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Identifier(String),
    Array(Vec<Expression>),
    Function(Box<FunctionLiteral>),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Member {
        object: Box<Expression>,
        property: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Expression {
    /// Returns true if the expression can be assigned to.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_) | Self::Member { .. } | Self::Index { .. }
        )
    }

    fn node_count(&self) -> usize {
        1 + match self {
            Self::Number(_)
            | Self::String(_)
            | Self::Boolean(_)
            | Self::Null
            | Self::Identifier(_) => 0,
            Self::Array(items) => items.iter().map(Self::node_count).sum(),
            Self::Function(literal) => literal.node_count(),
            Self::Unary { operand, .. } => operand.node_count(),
            Self::Binary { left, right, .. } => left.node_count() + right.node_count(),
            Self::Conditional {
                condition,
                then_value,
                else_value,
            } => condition.node_count() + then_value.node_count() + else_value.node_count(),
            Self::Assignment { target, value } => target.node_count() + value.node_count(),
            Self::Call { callee, arguments } => {
                callee.node_count() + arguments.iter().map(Self::node_count).sum::<usize>()
            }
            Self::Member { object, .. } => object.node_count(),
            Self::Index { object, index } => object.node_count() + index.node_count(),
        }
    }
}

impl Statement {
    fn node_count(&self) -> usize {
        1 + match self {
            Self::Declaration { bindings, .. } => bindings
                .iter()
                .filter_map(|(_, init)| init.as_ref())
                .map(Expression::node_count)
                .sum(),
            Self::Function(literal) => literal.node_count(),
            Self::Return(value) => value.as_ref().map_or(0, Expression::node_count),
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.node_count()
                    + then_branch.node_count()
                    + else_branch.as_ref().map_or(0, |s| s.node_count())
            }
            Self::While { condition, body } => condition.node_count() + body.node_count(),
            Self::Block(statements) => statements.iter().map(Self::node_count).sum(),
            Self::Expression(expr) => expr.node_count(),
            Self::Empty => 0,
        }
    }
}

impl FunctionLiteral {
    /// Number of statement and expression nodes beneath this literal.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.body.iter().map(Statement::node_count).sum()
    }
}

/// The artifact a successful parse produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseArtifact {
    literal: FunctionLiteral,
    node_count: usize,
}

impl ParseArtifact {
    pub(crate) fn new(literal: FunctionLiteral) -> Self {
        let node_count = literal.node_count();
        Self {
            literal,
            node_count,
        }
    }

    /// The top-level function literal.
    #[must_use]
    pub fn literal(&self) -> &FunctionLiteral {
        &self.literal
    }

    /// Total statement and expression nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Absolute span that was parsed.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.literal.span.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count() {
        let literal = FunctionLiteral {
            name: None,
            params: vec![],
            body: vec![Statement::Expression(Expression::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expression::Number(1.0)),
                right: Box::new(Expression::Identifier("x".into())),
            })],
            span: 0..5,
        };
        let artifact = ParseArtifact::new(literal);
        assert_eq!(artifact.node_count(), 4);
        assert_eq!(artifact.span(), 0..5);
    }

    #[test]
    fn test_is_reference() {
        assert!(Expression::Identifier("a".into()).is_reference());
        assert!(!Expression::Number(1.0).is_reference());
    }
}
