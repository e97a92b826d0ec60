use std::fmt::Display;

/// Source position of a token, 1-based line and column of its first
/// character.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Renders a diagnostic in the `<line>:<column> Error: <message>` form
    /// every stage of the compiler reports with.
    pub fn diagnostic(&self, msg: impl Display) -> String {
        format!("{}:{} Error: {}", self.line, self.col, msg)
    }
}

impl PartialEq for Span {
    fn eq(&self, _other: &Span) -> bool {
        // Nodes are compared structurally; positions never take part.
        true
    }
}

impl Eq for Span {}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Token {
    Ident { value: String, position: Span },
    IntLit { value: i32, position: Span },
    FloatLit { value: f32, position: Span },
    BoolLit { value: bool, position: Span },
    IntKeyword { position: Span },
    FloatKeyword { position: Span },
    BoolKeyword { position: Span },
    VoidKeyword { position: Span },
    ExternKeyword { position: Span },
    IfKeyword { position: Span },
    ElseKeyword { position: Span },
    WhileKeyword { position: Span },
    ReturnKeyword { position: Span },
    Assign { position: Span },
    Plus { position: Span },
    Minus { position: Span },
    Times { position: Span },
    Divide { position: Span },
    Modulo { position: Span },
    Not { position: Span },
    Equal { position: Span },
    NotEqual { position: Span },
    LessThan { position: Span },
    LessOrEqual { position: Span },
    GreaterThan { position: Span },
    GreaterOrEqual { position: Span },
    And { position: Span },
    Or { position: Span },
    LParen { position: Span },
    RParen { position: Span },
    LBrace { position: Span },
    RBrace { position: Span },
    LBracket { position: Span },
    RBracket { position: Span },
    Semicolon { position: Span },
    Comma { position: Span },
    Eof { position: Span },
}

impl Token {
    pub fn position(&self) -> Span {
        match self {
            Token::Ident { position, .. }
            | Token::IntLit { position, .. }
            | Token::FloatLit { position, .. }
            | Token::BoolLit { position, .. }
            | Token::IntKeyword { position }
            | Token::FloatKeyword { position }
            | Token::BoolKeyword { position }
            | Token::VoidKeyword { position }
            | Token::ExternKeyword { position }
            | Token::IfKeyword { position }
            | Token::ElseKeyword { position }
            | Token::WhileKeyword { position }
            | Token::ReturnKeyword { position }
            | Token::Assign { position }
            | Token::Plus { position }
            | Token::Minus { position }
            | Token::Times { position }
            | Token::Divide { position }
            | Token::Modulo { position }
            | Token::Not { position }
            | Token::Equal { position }
            | Token::NotEqual { position }
            | Token::LessThan { position }
            | Token::LessOrEqual { position }
            | Token::GreaterThan { position }
            | Token::GreaterOrEqual { position }
            | Token::And { position }
            | Token::Or { position }
            | Token::LParen { position }
            | Token::RParen { position }
            | Token::LBrace { position }
            | Token::RBrace { position }
            | Token::LBracket { position }
            | Token::RBracket { position }
            | Token::Semicolon { position }
            | Token::Comma { position }
            | Token::Eof { position } => *position,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexeme = match self {
            Token::Ident { value, .. } => return write!(f, "{value}"),
            Token::IntLit { value, .. } => return write!(f, "{value}"),
            Token::FloatLit { value, .. } => return write!(f, "{value}"),
            Token::BoolLit { value, .. } => return write!(f, "{value}"),
            Token::IntKeyword { .. } => "int",
            Token::FloatKeyword { .. } => "float",
            Token::BoolKeyword { .. } => "bool",
            Token::VoidKeyword { .. } => "void",
            Token::ExternKeyword { .. } => "extern",
            Token::IfKeyword { .. } => "if",
            Token::ElseKeyword { .. } => "else",
            Token::WhileKeyword { .. } => "while",
            Token::ReturnKeyword { .. } => "return",
            Token::Assign { .. } => "=",
            Token::Plus { .. } => "+",
            Token::Minus { .. } => "-",
            Token::Times { .. } => "*",
            Token::Divide { .. } => "/",
            Token::Modulo { .. } => "%",
            Token::Not { .. } => "!",
            Token::Equal { .. } => "==",
            Token::NotEqual { .. } => "!=",
            Token::LessThan { .. } => "<",
            Token::LessOrEqual { .. } => "<=",
            Token::GreaterThan { .. } => ">",
            Token::GreaterOrEqual { .. } => ">=",
            Token::And { .. } => "&&",
            Token::Or { .. } => "||",
            Token::LParen { .. } => "(",
            Token::RParen { .. } => ")",
            Token::LBrace { .. } => "{",
            Token::RBrace { .. } => "}",
            Token::LBracket { .. } => "[",
            Token::RBracket { .. } => "]",
            Token::Semicolon { .. } => ";",
            Token::Comma { .. } => ",",
            Token::Eof { .. } => "end of input",
        };
        f.write_str(lexeme)
    }
}
