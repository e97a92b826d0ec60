use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expression {
    IntLit(i32, Span),
    FloatLit(f32, Span),
    BoolLit(bool, Span),
    Variable(Variable),
    ArrayIndex(ArrayIndex),
    Unary(Unary),
    Binary(Box<Binary>),
    Assign(Box<Assign>),
    Call(Call),
}

impl Expression {
    pub fn position(&self) -> Span {
        match self {
            Expression::IntLit(_, position)
            | Expression::FloatLit(_, position)
            | Expression::BoolLit(_, position) => *position,
            Expression::Variable(Variable { position, .. }) => *position,
            Expression::ArrayIndex(ArrayIndex { position, .. }) => *position,
            Expression::Unary(Unary { position, .. }) => *position,
            Expression::Binary(binary) => binary.position,
            Expression::Assign(assign) => assign.position,
            Expression::Call(Call { position, .. }) => *position,
        }
    }
}

/// A bare identifier reference.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Variable {
    pub name: String,
    pub position: Span,
}

/// `name[i]...[k]` with one index expression per subscript.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayIndex {
    pub name: String,
    pub indices: Vec<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperator {
    Minus,
    Not,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Unary {
    pub op: UnaryOperator,
    pub operand: Box<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    And,
    Or,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Binary {
    pub op: BinaryOperator,
    pub left: Expression,
    pub right: Expression,
    pub position: Span,
}

/// An assignment target is decided at parse time; the lowerer never has to
/// re-discover the shape of the left-hand side.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AssignTarget {
    Variable(Variable),
    ArrayIndex(ArrayIndex),
}

impl AssignTarget {
    pub fn position(&self) -> Span {
        match self {
            AssignTarget::Variable(variable) => variable.position,
            AssignTarget::ArrayIndex(index) => index.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assign {
    pub target: AssignTarget,
    pub value: Expression,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Expression>,
    pub position: Span,
}
