//! Predictive recursive-descent parser for mini-c. The expression grammar is
//! stratified to encode precedence and associativity without left recursion;
//! one token of lookahead decides every production.

pub mod ast;
mod stream;

pub use self::stream::*;

use std::{error::Error, fmt::Display};

use crate::lexer::{Span, Token};

use self::ast::{
    ArrayIndex, Assign, AssignTarget, Binary, BinaryOperator, Block, Call, Declaration, Expression,
    FunctionDeclaration, If, LocalDeclaration, Parameter, Program, Prototype, Return, Statement,
    TypeName, Unary, UnaryOperator, Variable, WhileLoop,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    pub message: String,
    pub position: Option<Span>,
}

impl ParseError {
    pub fn eof(item: &str) -> ParseError {
        ParseError {
            message: format!("hit end of input while parsing {item}"),
            position: None,
        }
    }

    fn unexpected(token: &Token, expected: &str) -> ParseError {
        ParseError {
            message: format!("expected {expected}, found '{token}'"),
            position: Some(token.position()),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(position) = &self.position {
            f.write_str(position.diagnostic(&self.message).as_str())
        } else {
            write!(f, "Error: {}", self.message)
        }
    }
}

impl Error for ParseError {}

pub struct Parser {
    tokens: TokenStream,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }

    /// program := extern_list decl_list
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();

        while matches!(self.tokens.peek(), Some(Token::ExternKeyword { .. })) {
            program.externs.push(self.parse_extern()?);
        }

        loop {
            match self.tokens.peek() {
                Some(Token::Eof { .. }) | None => break,
                _ => program.declarations.push(self.parse_decl()?),
            }
        }

        Ok(program)
    }

    fn next_token(&mut self, item: &str) -> Result<Token, ParseError> {
        self.tokens.next().ok_or_else(|| ParseError::eof(item))
    }

    /// var_type := "int" | "float" | "bool" — with "void" admitted only where
    /// the caller says so (function return types).
    fn parse_type_name(&mut self, allow_void: bool) -> Result<(TypeName, Span), ParseError> {
        let token = self.next_token("a type")?;

        let type_name = match &token {
            Token::IntKeyword { .. } => TypeName::Int,
            Token::FloatKeyword { .. } => TypeName::Float,
            Token::BoolKeyword { .. } => TypeName::Bool,
            Token::VoidKeyword { .. } if allow_void => TypeName::Void,
            other => {
                let expected = if allow_void {
                    "'int', 'float', 'bool' or 'void'"
                } else {
                    "'int', 'float' or 'bool'"
                };
                return Err(ParseError::unexpected(other, expected));
            }
        };

        Ok((type_name, token.position()))
    }

    fn parse_ident(&mut self, item: &str) -> Result<(String, Span), ParseError> {
        match self.next_token(item)? {
            Token::Ident { value, position } => Ok((value, position)),
            other => Err(ParseError::unexpected(&other, "an identifier")),
        }
    }

    fn expect_semicolon(&mut self, context: &str) -> Result<(), ParseError> {
        match self.next_token(context)? {
            Token::Semicolon { .. } => Ok(()),
            other => Err(ParseError::unexpected(
                &other,
                &format!("';' {context}"),
            )),
        }
    }

    /// extern := "extern" type IDENT "(" params ")" ";"
    fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        let extern_token = self.next_token("an extern declaration")?;
        debug_assert!(matches!(extern_token, Token::ExternKeyword { .. }));

        let (return_type, _) = self.parse_type_name(true)?;
        let (name, position) = self.parse_ident("an extern declaration")?;

        match self.next_token("an extern declaration")? {
            Token::LParen { .. } => {}
            other => {
                return Err(ParseError::unexpected(
                    &other,
                    "'(' in extern function declaration",
                ))
            }
        }

        let parameters = self.parse_params()?;

        match self.next_token("an extern declaration")? {
            Token::RParen { .. } => {}
            other => {
                return Err(ParseError::unexpected(
                    &other,
                    "')' closing extern function declaration",
                ))
            }
        }

        self.expect_semicolon("ending extern function declaration")?;

        Ok(Prototype {
            return_type,
            name,
            parameters,
            position,
        })
    }

    /// decl := type IDENT ( ";" | array_dims ";" | "(" params ")" block )
    ///
    /// One identifier of lookahead plus the following token decide between
    /// global variable, global array and function.
    fn parse_decl(&mut self) -> Result<Declaration, ParseError> {
        let (type_name, type_position) = self.parse_type_name(true)?;
        let (name, position) = self.parse_ident("a top-level declaration")?;

        let next = self.next_token("a top-level declaration")?;
        match next {
            Token::Semicolon { .. } => {
                if type_name == TypeName::Void {
                    return Err(ParseError {
                        message: "cannot declare a variable of type 'void'".into(),
                        position: Some(type_position),
                    });
                }
                Ok(Declaration::GlobalScalar {
                    type_name,
                    name,
                    position,
                })
            }
            Token::LBracket { .. } => {
                self.tokens.push_front(next);
                let dimensions = self.parse_array_dims()?;
                self.expect_semicolon("after array declaration")?;
                if type_name == TypeName::Void {
                    return Err(ParseError {
                        message: "cannot declare an array of type 'void'".into(),
                        position: Some(type_position),
                    });
                }
                Ok(Declaration::GlobalArray {
                    element_type: type_name,
                    name,
                    dimensions,
                    position,
                })
            }
            Token::LParen { .. } => {
                let parameters = self.parse_params()?;

                match self.next_token("a function declaration")? {
                    Token::RParen { .. } => {}
                    other => {
                        return Err(ParseError::unexpected(
                            &other,
                            "')' in function declaration",
                        ))
                    }
                }

                let body = self.parse_block()?;

                Ok(Declaration::Function(FunctionDeclaration {
                    prototype: Prototype {
                        return_type: type_name,
                        name,
                        parameters,
                        position,
                    },
                    body,
                }))
            }
            other => Err(ParseError::unexpected(
                &other,
                "';', '[' or '(' in top-level declaration",
            )),
        }
    }

    /// array_dims := ("[" INT_LIT "]")+
    fn parse_array_dims(&mut self) -> Result<Vec<usize>, ParseError> {
        let mut dimensions = vec![];

        while matches!(self.tokens.peek(), Some(Token::LBracket { .. })) {
            self.tokens.next();

            match self.next_token("an array dimension")? {
                Token::IntLit { value, .. } => dimensions.push(value as usize),
                other => {
                    return Err(ParseError::unexpected(
                        &other,
                        "an integer literal for array dimension",
                    ))
                }
            }

            match self.next_token("an array dimension")? {
                Token::RBracket { .. } => {}
                other => {
                    return Err(ParseError::unexpected(&other, "']' after array dimension"))
                }
            }
        }

        Ok(dimensions)
    }

    /// params := "void" | ε | param ("," param)*
    fn parse_params(&mut self) -> Result<Vec<Parameter>, ParseError> {
        match self.tokens.peek() {
            Some(Token::RParen { .. }) => return Ok(vec![]),
            Some(Token::VoidKeyword { .. }) => {
                self.tokens.next();
                return match self.tokens.peek() {
                    Some(Token::RParen { .. }) => Ok(vec![]),
                    Some(other) => Err(ParseError::unexpected(other, "')' after 'void'")),
                    None => Err(ParseError::eof("a parameter list")),
                };
            }
            _ => {}
        }

        let mut parameters = vec![self.parse_param()?];

        while matches!(self.tokens.peek(), Some(Token::Comma { .. })) {
            self.tokens.next();
            parameters.push(self.parse_param()?);
        }

        Ok(parameters)
    }

    /// param := type IDENT array_dims?
    fn parse_param(&mut self) -> Result<Parameter, ParseError> {
        let (type_name, _) = self.parse_type_name(false)?;
        let (name, position) = self.parse_ident("a parameter declaration")?;
        let dimensions = self.parse_array_dims()?;

        Ok(Parameter {
            type_name,
            name,
            dimensions,
            position,
        })
    }

    /// block := "{" local_decl* stmt* "}"
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.next_token("a block")?;
        let position = match open {
            Token::LBrace { position } => position,
            other => return Err(ParseError::unexpected(&other, "'{' to start a block")),
        };

        let mut declarations = vec![];
        while matches!(
            self.tokens.peek(),
            Some(Token::IntKeyword { .. })
                | Some(Token::FloatKeyword { .. })
                | Some(Token::BoolKeyword { .. })
        ) {
            declarations.push(self.parse_local_decl()?);
        }

        let mut statements = vec![];
        loop {
            if matches!(self.tokens.peek(), Some(Token::RBrace { .. })) {
                self.tokens.next();
                break;
            }

            if let Some(statement) = self.parse_stmt()? {
                statements.push(statement);
            }
        }

        Ok(Block {
            declarations,
            statements,
            position,
        })
    }

    /// local_decl := type IDENT array_dims? ";"
    fn parse_local_decl(&mut self) -> Result<LocalDeclaration, ParseError> {
        let (type_name, _) = self.parse_type_name(false)?;
        let (name, position) = self.parse_ident("a local declaration")?;

        let dimensions = self.parse_array_dims()?;
        self.expect_semicolon("to end local declaration")?;

        if dimensions.is_empty() {
            Ok(LocalDeclaration::Scalar {
                type_name,
                name,
                position,
            })
        } else {
            Ok(LocalDeclaration::Array {
                element_type: type_name,
                name,
                dimensions,
                position,
            })
        }
    }

    /// stmt := expr_stmt | block | if_stmt | while_stmt | return_stmt
    ///
    /// The empty expression statement `;` is legal and produces no node.
    fn parse_stmt(&mut self) -> Result<Option<Statement>, ParseError> {
        match self.tokens.peek() {
            Some(Token::Semicolon { .. }) => {
                self.tokens.next();
                Ok(None)
            }
            Some(Token::LBrace { .. }) => Ok(Some(Statement::Block(self.parse_block()?))),
            Some(Token::IfKeyword { .. }) => Ok(Some(self.parse_if_stmt()?)),
            Some(Token::WhileKeyword { .. }) => Ok(Some(self.parse_while_stmt()?)),
            Some(Token::ReturnKeyword { .. }) => Ok(Some(self.parse_return_stmt()?)),
            Some(
                Token::Not { .. }
                | Token::Minus { .. }
                | Token::LParen { .. }
                | Token::Ident { .. }
                | Token::IntLit { .. }
                | Token::FloatLit { .. }
                | Token::BoolLit { .. },
            ) => {
                let expression = self.parse_expr()?;
                self.expect_semicolon("to end expression statement")?;
                Ok(Some(Statement::Expression(expression)))
            }
            Some(other) => Err(ParseError::unexpected(other, "a statement")),
            None => Err(ParseError::eof("a statement")),
        }
    }

    /// if_stmt := "if" "(" expr ")" block ("else" block)?
    fn parse_if_stmt(&mut self) -> Result<Statement, ParseError> {
        let if_token = self.next_token("an if statement")?;
        let position = if_token.position();

        match self.next_token("an if statement")? {
            Token::LParen { .. } => {}
            other => return Err(ParseError::unexpected(&other, "'(' after 'if'")),
        }

        let condition = self.parse_expr()?;

        match self.next_token("an if statement")? {
            Token::RParen { .. } => {}
            other => return Err(ParseError::unexpected(&other, "')' after if condition")),
        }

        let then_block = self.parse_block()?;

        let else_block = if matches!(self.tokens.peek(), Some(Token::ElseKeyword { .. })) {
            self.tokens.next();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Statement::If(If {
            condition,
            then_block,
            else_block,
            position,
        }))
    }

    /// while_stmt := "while" "(" expr ")" stmt
    fn parse_while_stmt(&mut self) -> Result<Statement, ParseError> {
        let while_token = self.next_token("a while statement")?;
        let position = while_token.position();

        match self.next_token("a while statement")? {
            Token::LParen { .. } => {}
            other => return Err(ParseError::unexpected(&other, "'(' after 'while'")),
        }

        let condition = self.parse_expr()?;

        match self.next_token("a while statement")? {
            Token::RParen { .. } => {}
            other => return Err(ParseError::unexpected(&other, "')' after while condition")),
        }

        // The body is any statement; a bare `;` body becomes an empty block.
        let body = self.parse_stmt()?.unwrap_or(Statement::Block(Block {
            declarations: vec![],
            statements: vec![],
            position,
        }));

        Ok(Statement::While(WhileLoop {
            condition,
            body: Box::new(body),
            position,
        }))
    }

    /// return_stmt := "return" ";" | "return" expr ";"
    fn parse_return_stmt(&mut self) -> Result<Statement, ParseError> {
        let return_token = self.next_token("a return statement")?;
        let position = return_token.position();

        if matches!(self.tokens.peek(), Some(Token::Semicolon { .. })) {
            self.tokens.next();
            return Ok(Statement::Return(Return {
                value: None,
                position,
            }));
        }

        let value = self.parse_expr()?;
        self.expect_semicolon("to end return statement")?;

        Ok(Statement::Return(Return {
            value: Some(value),
            position,
        }))
    }

    pub fn parse_expr(&mut self) -> Result<Expression, ParseError> {
        self.parse_assign_expr()
    }

    /// assign_expr := or_expr ("=" assign_expr)?   (right-associative)
    ///
    /// The left-hand side is checked here, at parse time: only a variable or
    /// an array element may be assigned to.
    fn parse_assign_expr(&mut self) -> Result<Expression, ParseError> {
        let lhs = self.parse_or_expr()?;

        if !matches!(self.tokens.peek(), Some(Token::Assign { .. })) {
            return Ok(lhs);
        }

        let assign_token = self.next_token("an assignment")?;
        let position = assign_token.position();

        let target = match lhs {
            Expression::Variable(variable) => AssignTarget::Variable(variable),
            Expression::ArrayIndex(index) => AssignTarget::ArrayIndex(index),
            _ => {
                return Err(ParseError {
                    message: "left side of assignment must be a variable or array element".into(),
                    position: Some(position),
                })
            }
        };

        let value = self.parse_assign_expr()?;

        Ok(Expression::Assign(Box::new(Assign {
            target,
            value,
            position,
        })))
    }

    /// or_expr := and_expr ("||" and_expr)*
    fn parse_or_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_and_expr()?;

        while matches!(self.tokens.peek(), Some(Token::Or { .. })) {
            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_and_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op: BinaryOperator::Or,
                left: lhs,
                right: rhs,
                position,
            }));
        }

        Ok(lhs)
    }

    /// and_expr := eq_expr ("&&" eq_expr)*
    fn parse_and_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_eq_expr()?;

        while matches!(self.tokens.peek(), Some(Token::And { .. })) {
            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_eq_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op: BinaryOperator::And,
                left: lhs,
                right: rhs,
                position,
            }));
        }

        Ok(lhs)
    }

    /// eq_expr := rel_expr (("==" | "!=") rel_expr)*
    fn parse_eq_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_rel_expr()?;

        loop {
            let op = match self.tokens.peek() {
                Some(Token::Equal { .. }) => BinaryOperator::Equal,
                Some(Token::NotEqual { .. }) => BinaryOperator::NotEqual,
                _ => return Ok(lhs),
            };

            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_rel_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op,
                left: lhs,
                right: rhs,
                position,
            }));
        }
    }

    /// rel_expr := add_expr (("<" | "<=" | ">" | ">=") add_expr)*
    fn parse_rel_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_add_expr()?;

        loop {
            let op = match self.tokens.peek() {
                Some(Token::LessThan { .. }) => BinaryOperator::LessThan,
                Some(Token::LessOrEqual { .. }) => BinaryOperator::LessOrEqual,
                Some(Token::GreaterThan { .. }) => BinaryOperator::GreaterThan,
                Some(Token::GreaterOrEqual { .. }) => BinaryOperator::GreaterOrEqual,
                _ => return Ok(lhs),
            };

            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_add_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op,
                left: lhs,
                right: rhs,
                position,
            }));
        }
    }

    /// add_expr := mul_expr (("+" | "-") mul_expr)*
    fn parse_add_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_mul_expr()?;

        loop {
            let op = match self.tokens.peek() {
                Some(Token::Plus { .. }) => BinaryOperator::Add,
                Some(Token::Minus { .. }) => BinaryOperator::Subtract,
                _ => return Ok(lhs),
            };

            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_mul_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op,
                left: lhs,
                right: rhs,
                position,
            }));
        }
    }

    /// mul_expr := unary_expr (("*" | "/" | "%") unary_expr)*
    fn parse_mul_expr(&mut self) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_unary_expr()?;

        loop {
            let op = match self.tokens.peek() {
                Some(Token::Times { .. }) => BinaryOperator::Multiply,
                Some(Token::Divide { .. }) => BinaryOperator::Divide,
                Some(Token::Modulo { .. }) => BinaryOperator::Modulo,
                _ => return Ok(lhs),
            };

            let position = self.next_token("an expression")?.position();
            let rhs = self.parse_unary_expr()?;
            lhs = Expression::Binary(Box::new(Binary {
                op,
                left: lhs,
                right: rhs,
                position,
            }));
        }
    }

    /// unary_expr := ("-" | "!") unary_expr | postfix_expr
    ///
    /// Prefix operators stack: `--x` and `!!x` are legal.
    fn parse_unary_expr(&mut self) -> Result<Expression, ParseError> {
        let op = match self.tokens.peek() {
            Some(Token::Minus { .. }) => UnaryOperator::Minus,
            Some(Token::Not { .. }) => UnaryOperator::Not,
            _ => return self.parse_postfix_expr(),
        };

        let position = self.next_token("an expression")?.position();
        let operand = self.parse_unary_expr()?;

        Ok(Expression::Unary(Unary {
            op,
            operand: Box::new(operand),
            position,
        }))
    }

    /// postfix_expr := primary_expr ( "(" args ")" | ("[" expr "]")+ )?
    fn parse_postfix_expr(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_primary_expr()?;

        match self.tokens.peek() {
            Some(Token::LParen { .. }) => {
                let Expression::Variable(Variable { name, position }) = expr else {
                    let paren = self.next_token("a call")?;
                    return Err(ParseError {
                        message: "function name expected before '('".into(),
                        position: Some(paren.position()),
                    });
                };

                self.tokens.next();
                let args = self.parse_args()?;

                Ok(Expression::Call(Call {
                    callee: name,
                    args,
                    position,
                }))
            }
            Some(Token::LBracket { .. }) => {
                let Expression::Variable(Variable { name, position }) = expr else {
                    let bracket = self.next_token("an array access")?;
                    return Err(ParseError {
                        message: "expected identifier before '['".into(),
                        position: Some(bracket.position()),
                    });
                };

                let mut indices = vec![];
                while matches!(self.tokens.peek(), Some(Token::LBracket { .. })) {
                    self.tokens.next();
                    indices.push(self.parse_expr()?);
                    match self.next_token("an array access")? {
                        Token::RBracket { .. } => {}
                        other => {
                            return Err(ParseError::unexpected(&other, "']' after array index"))
                        }
                    }
                }

                Ok(Expression::ArrayIndex(ArrayIndex {
                    name,
                    indices,
                    position,
                }))
            }
            _ => Ok(expr),
        }
    }

    /// args := ε | expr ("," expr)*
    fn parse_args(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = vec![];

        if !matches!(self.tokens.peek(), Some(Token::RParen { .. })) {
            args.push(self.parse_expr()?);
            while matches!(self.tokens.peek(), Some(Token::Comma { .. })) {
                self.tokens.next();
                args.push(self.parse_expr()?);
            }
        }

        match self.next_token("a call")? {
            Token::RParen { .. } => Ok(args),
            other => Err(ParseError::unexpected(&other, "')' in function call")),
        }
    }

    /// primary_expr := IDENT | INT_LIT | FLOAT_LIT | BOOL_LIT | "(" expr ")"
    fn parse_primary_expr(&mut self) -> Result<Expression, ParseError> {
        let token = self.next_token("an expression")?;

        match token {
            Token::Ident { value, position } => Ok(Expression::Variable(Variable {
                name: value,
                position,
            })),
            Token::IntLit { value, position } => Ok(Expression::IntLit(value, position)),
            Token::FloatLit { value, position } => Ok(Expression::FloatLit(value, position)),
            Token::BoolLit { value, position } => Ok(Expression::BoolLit(value, position)),
            Token::LParen { .. } => {
                let expr = self.parse_expr()?;
                match self.next_token("a parenthesised expression")? {
                    Token::RParen { .. } => Ok(expr),
                    other => Err(ParseError::unexpected(&other, "')'")),
                }
            }
            other => Err(ParseError::unexpected(&other, "an expression")),
        }
    }
}
