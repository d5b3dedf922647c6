//! IR statements and expressions

use super::decl::IrFunction;
use super::types::IrType;
use super::NodeId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrConst {
    Null,
    Boolean(bool),
    /// Any integral literal; the expression type tells which one
    Int(i64),
    /// Floating point literal
    Double(f64),
    String(String),
    Char(char),
}

// ============================================================================
// Expressions
// ============================================================================

/// A typed expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrExpr {
    pub id: NodeId,
    pub ty: IrType,
    pub kind: IrExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrExprKind {
    /// Literal constant
    Const(IrConst),

    /// Read of a local variable or value parameter
    GetValue { target: NodeId },

    /// Write of a local variable
    SetValue { target: NodeId, value: Box<IrExpr> },

    /// The instance of the given class (or extension) scope
    This { class: NodeId },

    /// The single instance of an object or companion object
    GetObject { class: NodeId },

    /// An entry of an enum class
    GetEnumEntry { entry: NodeId },

    /// Property read through its accessor
    GetProperty {
        property: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<IrExpr>>,
        #[serde(default)]
        null_aware: bool,
    },

    /// Property write through its accessor; skipped for a null receiver
    /// when `null_aware`
    SetProperty {
        property: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<IrExpr>>,
        value: Box<IrExpr>,
        #[serde(default)]
        null_aware: bool,
    },

    /// Direct backing field read
    GetField {
        field: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<IrExpr>>,
    },

    /// Direct backing field write
    SetField {
        field: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<IrExpr>>,
        value: Box<IrExpr>,
    },

    /// Function or method call
    Call(IrCall),

    /// Constructor invocation
    ConstructorCall(IrConstructorCall),

    /// `as`, `as?`, `is`, `!is` and implicit casts
    TypeOp {
        operator: TypeOperator,
        operand: Box<IrExpr>,
        argument: IrType,
    },

    /// `when`/`if`, also the desugaring of `&&` and `||`
    When(IrWhen),

    /// Statements followed by a result expression
    Block(IrBlock),

    /// String template
    StringConcat(Vec<IrExpr>),

    /// Function literal
    Lambda(Box<IrFunction>),

    Throw(Box<IrExpr>),

    /// The `Unit` object
    Unit,

    // Lowered-only kinds
    /// Binary operator with a fixed target token
    Binary {
        op: IrBinaryOp,
        left: Box<IrExpr>,
        right: Box<IrExpr>,
    },

    /// Unary operator with a fixed target token
    Unary { op: IrUnaryOp, operand: Box<IrExpr> },

    /// `condition ? then : else`
    Conditional {
        condition: Box<IrExpr>,
        then_branch: Box<IrExpr>,
        else_branch: Box<IrExpr>,
    },

    /// `receiver[index]`
    Index {
        receiver: Box<IrExpr>,
        index: Box<IrExpr>,
    },

    /// `receiver[index] = value`
    IndexSet {
        receiver: Box<IrExpr>,
        index: Box<IrExpr>,
        value: Box<IrExpr>,
    },
}

impl IrExpr {
    pub fn new(id: NodeId, ty: IrType, kind: IrExprKind) -> Self {
        Self { id, ty, kind }
    }

    pub fn as_const(&self) -> Option<&IrConst> {
        match &self.kind {
            IrExprKind::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, IrExprKind::Const(IrConst::Null))
    }

    pub fn is_bool(&self, value: bool) -> bool {
        matches!(self.kind, IrExprKind::Const(IrConst::Boolean(b)) if b == value)
    }

    /// Whether this is a read of the given variable or parameter.
    pub fn is_get_value(&self, target: NodeId) -> bool {
        matches!(self.kind, IrExprKind::GetValue { target: t } if t == target)
    }
}

/// What a call refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// A declared function
    Function(NodeId),
    /// A builtin or intrinsic, by qualified name (e.g. `kotlin.Int.plus`)
    Builtin(String),
}

/// Syntactic form a call was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOrigin {
    Plus,
    Minus,
    Mul,
    Div,
    Perc,
    UPlus,
    UMinus,
    Excl,
    ExclEq,
    EqEq,
    EqEqEq,
    ExclEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    GetArrayElement,
    SetArrayElement,
    Invoke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrCall {
    pub callee: Callee,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_receiver: Option<Box<IrExpr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_receiver: Option<Box<IrExpr>>,
    /// One slot per parameter; `None` means the parameter's default applies
    #[serde(default)]
    pub arguments: Vec<Option<IrExpr>>,
    #[serde(default)]
    pub type_arguments: Vec<IrType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<CallOrigin>,
    /// `?.` call
    #[serde(default)]
    pub null_aware: bool,
    /// `super.f()` call
    #[serde(default)]
    pub is_super: bool,
}

impl IrCall {
    pub fn new(callee: Callee) -> Self {
        Self {
            callee,
            dispatch_receiver: None,
            extension_receiver: None,
            arguments: Vec::new(),
            type_arguments: Vec::new(),
            origin: None,
            null_aware: false,
            is_super: false,
        }
    }

    pub fn builtin_name(&self) -> Option<&str> {
        match &self.callee {
            Callee::Builtin(name) => Some(name),
            Callee::Function(_) => None,
        }
    }

    pub fn function(&self) -> Option<NodeId> {
        match self.callee {
            Callee::Function(id) => Some(id),
            Callee::Builtin(_) => None,
        }
    }

    /// Arguments that were actually passed.
    pub fn present_arguments(&self) -> impl Iterator<Item = &IrExpr> {
        self.arguments.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrConstructorCall {
    pub constructor: NodeId,
    #[serde(default)]
    pub arguments: Vec<Option<IrExpr>>,
    #[serde(default)]
    pub type_arguments: Vec<IrType>,
    /// Written with the dialect's `@const` call-site annotation
    #[serde(default)]
    pub const_annotated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOperator {
    Cast,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
    ImplicitCast,
    /// Value discarded into `Unit`
    ImplicitCoercionToUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenOrigin {
    If,
    When,
    AndAnd,
    OrOr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrBranch {
    /// `None` for the `else` branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<IrExpr>,
    pub result: IrExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrWhen {
    pub branches: Vec<IrBranch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<WhenOrigin>,
}

impl IrWhen {
    pub fn else_branch(&self) -> Option<&IrBranch> {
        self.branches.iter().find(|b| b.condition.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOrigin {
    /// `a ?: b`
    Elvis,
    /// `a?.b`
    SafeCall,
    PostfixIncr,
    PostfixDecr,
    PrefixIncr,
    PrefixDecr,
}

/// Composite expression; its value is the value of the last statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrBlock {
    pub statements: Vec<IrStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<BlockOrigin>,
}

/// Binary operators the target spells with a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrBinaryOp {
    AndAnd,
    OrOr,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Mul,
    Div,
    IntDiv,
    Rem,
    IfNull,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

impl IrBinaryOp {
    pub const ALL: [IrBinaryOp; 21] = [
        IrBinaryOp::AndAnd,
        IrBinaryOp::OrOr,
        IrBinaryOp::Eq,
        IrBinaryOp::NotEq,
        IrBinaryOp::Lt,
        IrBinaryOp::Gt,
        IrBinaryOp::LtEq,
        IrBinaryOp::GtEq,
        IrBinaryOp::Plus,
        IrBinaryOp::Minus,
        IrBinaryOp::Mul,
        IrBinaryOp::Div,
        IrBinaryOp::IntDiv,
        IrBinaryOp::Rem,
        IrBinaryOp::IfNull,
        IrBinaryOp::BitAnd,
        IrBinaryOp::BitOr,
        IrBinaryOp::BitXor,
        IrBinaryOp::Shl,
        IrBinaryOp::Shr,
        IrBinaryOp::UShr,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrUnaryOp {
    Not,
    Negate,
    BitNot,
    /// `x!`
    NotNull,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableOrigin {
    ForLoopIterator,
    ForLoopVariable,
    Temporary,
}

/// A local `val`/`var`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrVariable {
    pub id: NodeId,
    pub name: String,
    pub ty: IrType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<IrExpr>,
    #[serde(default)]
    pub is_var: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<VariableOrigin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrCatch {
    pub parameter: IrVariable,
    pub body: Vec<IrStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrTry {
    pub body: Vec<IrStatement>,
    #[serde(default)]
    pub catches: Vec<IrCatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finally: Option<Vec<IrStatement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrStatement {
    Expr(IrExpr),
    Variable(IrVariable),
    Return(Option<IrExpr>),
    While {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        condition: IrExpr,
        body: Vec<IrStatement>,
    },
    DoWhile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        body: Vec<IrStatement>,
        condition: IrExpr,
    },
    Break {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Continue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Block(Vec<IrStatement>),
    Try(IrTry),
    LocalFunction(IrFunction),
    /// Lowered-only statement form of `when`
    If {
        condition: IrExpr,
        then_branch: Vec<IrStatement>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_branch: Option<Vec<IrStatement>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_table_is_complete() {
        let mut ops = IrBinaryOp::ALL.to_vec();
        ops.dedup();
        assert_eq!(ops.len(), 21);
    }

    #[test]
    fn test_expr_serde() {
        let expr = IrExpr::new(
            NodeId(3),
            IrType::int(),
            IrExprKind::GetValue { target: NodeId(1) },
        );
        let json = serde_json::to_string(&expr).unwrap();
        let back: IrExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
        assert!(back.is_get_value(NodeId(1)));
    }
}
