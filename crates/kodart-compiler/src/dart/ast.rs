//! Target AST
//!
//! Concrete syntax of the emitted language, built by the translator and
//! consumed by the renderer. Nodes are plain data; every operator and keyword
//! is a closed variant so the renderer never has to interpret strings.

use super::identifier::DartSimpleIdentifier;
use super::operators::{precedence, DartBinaryOperator, DartPostfixOperator, DartPrefixOperator, Precedence};

// ============================================================================
// Compilation unit
// ============================================================================

/// One emitted `.dart` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DartCompilationUnit {
    pub directives: Vec<DartDirective>,
    pub declarations: Vec<DartDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartDirective {
    Import(DartImportDirective),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DartImportDirective {
    pub uri: String,
    /// `import '...' as prefix;`
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartDeclaration {
    Class(DartClassDeclaration),
    Function(DartFunctionDeclaration),
    Variable(DartTopLevelVariableDeclaration),
    /// Top-level getter or setter
    Accessor(DartMethodDeclaration),
    Extension(DartExtensionDeclaration),
}

/// `@name` or `@name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DartAnnotation {
    pub name: String,
    pub arguments: Option<DartArgumentList>,
}

impl DartAnnotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DartTypeParameter {
    pub name: String,
    pub bound: Option<DartTypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartClassDeclaration {
    pub name: DartSimpleIdentifier,
    pub is_abstract: bool,
    pub type_parameters: Vec<DartTypeParameter>,
    pub extends: Option<DartTypeAnnotation>,
    pub with: Vec<DartTypeAnnotation>,
    pub implements: Vec<DartTypeAnnotation>,
    pub members: Vec<DartClassMember>,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartClassMember {
    Constructor(DartConstructorDeclaration),
    Method(DartMethodDeclaration),
    Field(DartFieldDeclaration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartConstructorDeclaration {
    pub class_name: DartSimpleIdentifier,
    /// Named constructor suffix, `Class.name(...)`
    pub name: Option<DartSimpleIdentifier>,
    pub is_const: bool,
    pub parameters: DartFormalParameterList,
    pub initializers: Vec<DartConstructorInitializer>,
    pub body: DartFunctionBody,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartConstructorInitializer {
    /// `x = value`
    Field {
        name: DartSimpleIdentifier,
        value: DartExpression,
    },
    /// `super(...)` or `super.name(...)`
    Super {
        name: Option<DartSimpleIdentifier>,
        arguments: DartArgumentList,
    },
    /// `this(...)` or `this.name(...)`
    Redirecting {
        name: Option<DartSimpleIdentifier>,
        arguments: DartArgumentList,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartMethodKind {
    Method,
    Getter,
    Setter,
    /// `operator <token>`
    Operator(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartMethodDeclaration {
    pub name: DartSimpleIdentifier,
    pub kind: DartMethodKind,
    pub is_static: bool,
    pub return_type: Option<DartTypeAnnotation>,
    pub type_parameters: Vec<DartTypeParameter>,
    /// `None` for getters
    pub parameters: Option<DartFormalParameterList>,
    pub body: DartFunctionBody,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartFieldDeclaration {
    pub is_static: bool,
    pub variables: DartVariableDeclarationList,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartVariableKeyword {
    Final,
    Const,
    Var,
}

impl DartVariableKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            DartVariableKeyword::Final => "final",
            DartVariableKeyword::Const => "const",
            DartVariableKeyword::Var => "var",
        }
    }
}

/// `late final int a = 1, b;`
#[derive(Debug, Clone, PartialEq)]
pub struct DartVariableDeclarationList {
    pub keyword: Option<DartVariableKeyword>,
    pub is_late: bool,
    pub ty: Option<DartTypeAnnotation>,
    pub variables: Vec<DartVariableDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartVariableDeclaration {
    pub name: DartSimpleIdentifier,
    pub initializer: Option<DartExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartTopLevelVariableDeclaration {
    pub variables: DartVariableDeclarationList,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartFunctionDeclaration {
    pub name: DartSimpleIdentifier,
    pub return_type: Option<DartTypeAnnotation>,
    pub type_parameters: Vec<DartTypeParameter>,
    pub parameters: DartFormalParameterList,
    pub body: DartFunctionBody,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartExtensionDeclaration {
    pub name: Option<DartSimpleIdentifier>,
    pub type_parameters: Vec<DartTypeParameter>,
    pub on: DartTypeAnnotation,
    pub members: Vec<DartClassMember>,
    pub annotations: Vec<DartAnnotation>,
    pub documentation: Option<String>,
}

// ============================================================================
// Parameters and types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartParameterKind {
    Required,
    /// `[int b = 1]`
    OptionalPositional,
    /// `{int b = 1}`
    OptionalNamed,
    /// `{required int b}`
    RequiredNamed,
}

impl DartParameterKind {
    pub fn is_named(self) -> bool {
        matches!(self, DartParameterKind::OptionalNamed | DartParameterKind::RequiredNamed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartFormalParameter {
    pub kind: DartParameterKind,
    pub name: DartSimpleIdentifier,
    pub ty: Option<DartTypeAnnotation>,
    /// `this.name`
    pub is_field_formal: bool,
    pub default_value: Option<DartExpression>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DartFormalParameterList {
    pub parameters: Vec<DartFormalParameter>,
}

impl DartFormalParameterList {
    pub fn new(parameters: Vec<DartFormalParameter>) -> Self {
        Self { parameters }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DartTypeAnnotation {
    Named {
        /// Possibly prefixed, e.g. `core.int`
        name: String,
        type_arguments: Vec<DartTypeAnnotation>,
        nullable: bool,
    },
    Function {
        return_type: Box<DartTypeAnnotation>,
        parameters: Vec<DartTypeAnnotation>,
        nullable: bool,
    },
}

impl DartTypeAnnotation {
    pub fn named(name: impl Into<String>) -> Self {
        DartTypeAnnotation::Named {
            name: name.into(),
            type_arguments: Vec::new(),
            nullable: false,
        }
    }

    pub fn with_nullable(mut self, value: bool) -> Self {
        match &mut self {
            DartTypeAnnotation::Named { nullable, .. } | DartTypeAnnotation::Function { nullable, .. } => {
                *nullable = value
            }
        }
        self
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DartTypeAnnotation::Named { name, .. } if name == "void")
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DartFunctionBody {
    /// `;`
    Empty,
    Block(Vec<DartStatement>),
    /// `=> expression;`
    Expression(Box<DartExpression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DartCatchClause {
    pub on: Option<DartTypeAnnotation>,
    pub exception: DartSimpleIdentifier,
    pub body: Vec<DartStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartStatement {
    Expression(DartExpression),
    Variable(DartVariableDeclarationList),
    Return(Option<DartExpression>),
    If {
        condition: DartExpression,
        then_branch: Vec<DartStatement>,
        else_branch: Option<Vec<DartStatement>>,
    },
    Block(Vec<DartStatement>),
    While {
        label: Option<String>,
        condition: DartExpression,
        body: Vec<DartStatement>,
    },
    Do {
        label: Option<String>,
        body: Vec<DartStatement>,
        condition: DartExpression,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Try {
        body: Vec<DartStatement>,
        catches: Vec<DartCatchClause>,
        finally: Option<Vec<DartStatement>>,
    },
    LocalFunction(DartFunctionDeclaration),
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DartLiteral {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartInterpolationElement {
    Text(String),
    Expression(DartExpression),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DartArgumentList {
    pub positional: Vec<DartExpression>,
    pub named: Vec<(DartSimpleIdentifier, DartExpression)>,
}

impl DartArgumentList {
    pub fn positional(arguments: Vec<DartExpression>) -> Self {
        Self {
            positional: arguments,
            named: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DartExpression {
    Literal(DartLiteral),
    StringInterpolation(Vec<DartInterpolationElement>),
    Identifier {
        /// Import prefix
        prefix: Option<String>,
        name: DartSimpleIdentifier,
    },
    This,
    Super,
    PropertyAccess {
        target: Box<DartExpression>,
        name: DartSimpleIdentifier,
        null_aware: bool,
    },
    MethodInvocation {
        target: Option<Box<DartExpression>>,
        name: DartSimpleIdentifier,
        type_arguments: Vec<DartTypeAnnotation>,
        arguments: DartArgumentList,
        null_aware: bool,
    },
    /// Call of a function-typed value
    FunctionInvocation {
        function: Box<DartExpression>,
        arguments: DartArgumentList,
    },
    InstanceCreation {
        is_const: bool,
        ty: DartTypeAnnotation,
        constructor_name: Option<DartSimpleIdentifier>,
        arguments: DartArgumentList,
    },
    Assignment {
        target: Box<DartExpression>,
        value: Box<DartExpression>,
    },
    Binary {
        operator: DartBinaryOperator,
        left: Box<DartExpression>,
        right: Box<DartExpression>,
    },
    Prefix {
        operator: DartPrefixOperator,
        operand: Box<DartExpression>,
    },
    Postfix {
        operator: DartPostfixOperator,
        operand: Box<DartExpression>,
    },
    Conditional {
        condition: Box<DartExpression>,
        then_expression: Box<DartExpression>,
        else_expression: Box<DartExpression>,
    },
    As {
        expression: Box<DartExpression>,
        ty: DartTypeAnnotation,
    },
    Is {
        expression: Box<DartExpression>,
        ty: DartTypeAnnotation,
        negated: bool,
    },
    Index {
        target: Box<DartExpression>,
        index: Box<DartExpression>,
    },
    Throw(Box<DartExpression>),
    FunctionExpression {
        parameters: DartFormalParameterList,
        body: DartFunctionBody,
    },
}

impl DartExpression {
    pub fn identifier(name: impl Into<DartSimpleIdentifier>) -> Self {
        DartExpression::Identifier {
            prefix: None,
            name: name.into(),
        }
    }

    pub fn null() -> Self {
        DartExpression::Literal(DartLiteral::Null)
    }

    /// How tightly the expression binds when it appears as an operand.
    pub fn precedence(&self) -> Precedence {
        match self {
            DartExpression::Assignment { .. } | DartExpression::Throw(_) | DartExpression::FunctionExpression { .. } => {
                precedence::ASSIGNMENT
            }
            DartExpression::Conditional { .. } => precedence::CONDITIONAL,
            DartExpression::Binary { operator, .. } => operator.precedence(),
            DartExpression::As { .. } | DartExpression::Is { .. } => precedence::RELATIONAL,
            DartExpression::Prefix { .. } => precedence::PREFIX,
            DartExpression::Postfix { .. } => precedence::POSTFIX,
            DartExpression::InstanceCreation { .. } => precedence::POSTFIX,
            _ => precedence::PRIMARY,
        }
    }
}
