//! Character-level scanner for mini-c. Produces a lookahead-1 token stream
//! with source positions; `//` comments and whitespace are skipped.

mod token;

pub use token::*;

use std::{collections::HashMap, error::Error, fmt::Display, iter::Peekable, str::Chars};

use once_cell::sync::Lazy;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LexError {
    pub message: String,
    pub position: Span,
}

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.position.diagnostic(&self.message).as_str())
    }
}

impl Error for LexError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Int,
    Float,
    Bool,
    Void,
    Extern,
    If,
    Else,
    While,
    Return,
    True,
    False,
}

impl Keyword {
    fn to_token(self, position: Span) -> Token {
        match self {
            Keyword::Int => Token::IntKeyword { position },
            Keyword::Float => Token::FloatKeyword { position },
            Keyword::Bool => Token::BoolKeyword { position },
            Keyword::Void => Token::VoidKeyword { position },
            Keyword::Extern => Token::ExternKeyword { position },
            Keyword::If => Token::IfKeyword { position },
            Keyword::Else => Token::ElseKeyword { position },
            Keyword::While => Token::WhileKeyword { position },
            Keyword::Return => Token::ReturnKeyword { position },
            Keyword::True => Token::BoolLit {
                value: true,
                position,
            },
            Keyword::False => Token::BoolLit {
                value: false,
                position,
            },
        }
    }
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("int", Keyword::Int);
    m.insert("float", Keyword::Float);
    m.insert("bool", Keyword::Bool);
    m.insert("void", Keyword::Void);
    m.insert("extern", Keyword::Extern);
    m.insert("if", Keyword::If);
    m.insert("else", Keyword::Else);
    m.insert("while", Keyword::While);
    m.insert("return", Keyword::Return);
    m.insert("true", Keyword::True);
    m.insert("false", Keyword::False);

    m
});

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.iterator.peek()
    }

    fn next(&mut self) -> Option<char> {
        let next = self.iterator.next();

        match next {
            Some('\n') | Some('\r') => {
                self.line += 1;
                self.col = 1;
            }
            Some(_) => self.col += 1,
            None => {}
        }

        next
    }

    fn next_if(&mut self, func: impl FnOnce(&char) -> bool) -> Option<char> {
        if self.peek().map(func).unwrap_or(false) {
            self.next()
        } else {
            None
        }
    }

    fn position(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn eat_whitespace(&mut self) {
        while self.next_if(|item| item.is_whitespace()).is_some() {}
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.eat_whitespace();

            let Some(next) = self.peek() else {
                self.tokens.push(Token::Eof {
                    position: self.position(),
                });
                return Ok(self.tokens);
            };

            match next {
                'a'..='z' | 'A'..='Z' | '_' => self.lex_word()?,
                '0'..='9' | '.' => self.lex_number()?,
                _ => self.lex_operator()?,
            };
        }
    }

    fn lex_word(&mut self) -> LexResult<()> {
        let position = self.position();
        let mut stack = vec![];

        while let Some(next) = self.next_if(|item| item.is_ascii_alphanumeric() || *item == '_') {
            stack.push(next);
        }

        let read = stack.iter().collect::<String>();

        if let Some(keyword) = KEYWORDS.get(read.as_str()) {
            self.tokens.push(keyword.to_token(position));
        } else {
            self.tokens.push(Token::Ident {
                value: read,
                position,
            });
        }

        Ok(())
    }

    fn lex_number(&mut self) -> LexResult<()> {
        let position = self.position();
        let mut stack = vec![];

        while let Some(next) = self.next_if(|item| item.is_ascii_digit()) {
            stack.push(next);
        }

        if let Some(dot) = self.next_if(|item| *item == '.') {
            stack.push(dot);
            while let Some(next) = self.next_if(|item| item.is_ascii_digit()) {
                stack.push(next);
            }
        }

        let read = stack.iter().collect::<String>();

        let token = if read.contains('.') {
            read.parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| Token::FloatLit { value, position })
                .ok_or(LexError {
                    message: format!("malformed float literal '{read}'"),
                    position,
                })?
        } else {
            read.parse::<i32>()
                .map(|value| Token::IntLit { value, position })
                .map_err(|_| LexError {
                    message: format!("malformed integer literal '{read}'"),
                    position,
                })?
        };

        self.tokens.push(token);

        Ok(())
    }

    fn lex_operator(&mut self) -> LexResult<()> {
        let position = self.position();

        let Some(first) = self.next() else {
            return Ok(());
        };

        let token = match first {
            '=' => match self.next_if(|item| *item == '=') {
                Some(_) => Token::Equal { position },
                None => Token::Assign { position },
            },
            '!' => match self.next_if(|item| *item == '=') {
                Some(_) => Token::NotEqual { position },
                None => Token::Not { position },
            },
            '<' => match self.next_if(|item| *item == '=') {
                Some(_) => Token::LessOrEqual { position },
                None => Token::LessThan { position },
            },
            '>' => match self.next_if(|item| *item == '=') {
                Some(_) => Token::GreaterOrEqual { position },
                None => Token::GreaterThan { position },
            },
            '&' => match self.next_if(|item| *item == '&') {
                Some(_) => Token::And { position },
                None => {
                    return Err(LexError {
                        message: "unexpected character '&'".into(),
                        position,
                    })
                }
            },
            '|' => match self.next_if(|item| *item == '|') {
                Some(_) => Token::Or { position },
                None => {
                    return Err(LexError {
                        message: "unexpected character '|'".into(),
                        position,
                    })
                }
            },
            '/' => match self.next_if(|item| *item == '/') {
                // a comment runs to the end of the line and produces nothing
                Some(_) => {
                    while self.next_if(|item| *item != '\n' && *item != '\r').is_some() {}
                    return Ok(());
                }
                None => Token::Divide { position },
            },
            '+' => Token::Plus { position },
            '-' => Token::Minus { position },
            '*' => Token::Times { position },
            '%' => Token::Modulo { position },
            '(' => Token::LParen { position },
            ')' => Token::RParen { position },
            '{' => Token::LBrace { position },
            '}' => Token::RBrace { position },
            '[' => Token::LBracket { position },
            ']' => Token::RBracket { position },
            ';' => Token::Semicolon { position },
            ',' => Token::Comma { position },
            other => {
                return Err(LexError {
                    message: format!("unexpected character '{other}'"),
                    position,
                })
            }
        };

        self.tokens.push(token);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_identifier() {
        let lexer = Lexer::new("total_2");

        assert_eq!(
            Ok(vec![
                Token::Ident {
                    value: "total_2".into(),
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                }
            ]),
            lexer.lex()
        );
    }

    #[test]
    fn test_lex_keywords_are_not_identifiers() {
        let tokens = Lexer::new("int floaty while0 while").lex().unwrap();

        assert_eq!(
            vec![
                Token::IntKeyword {
                    position: Span::default(),
                },
                Token::Ident {
                    value: "floaty".into(),
                    position: Span::default(),
                },
                Token::Ident {
                    value: "while0".into(),
                    position: Span::default(),
                },
                Token::WhileKeyword {
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_lex_integer_literal_roundtrip() {
        for input in ["0", "7", "1337", "2147483647"] {
            let tokens = Lexer::new(input).lex().unwrap();
            let Token::IntLit { value, .. } = &tokens[0] else {
                panic!("expected an integer literal for '{input}'");
            };
            assert_eq!(input, value.to_string());
        }
    }

    #[test]
    fn test_lex_float_literal_forms() {
        let tokens = Lexer::new("3.14 .5 5. 0.0").lex().unwrap();

        assert_eq!(
            vec![
                Token::FloatLit {
                    value: 3.14,
                    position: Span::default(),
                },
                Token::FloatLit {
                    value: 0.5,
                    position: Span::default(),
                },
                Token::FloatLit {
                    value: 5.0,
                    position: Span::default(),
                },
                Token::FloatLit {
                    value: 0.0,
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_lex_bool_literals() {
        let tokens = Lexer::new("true false").lex().unwrap();

        assert_eq!(
            vec![
                Token::BoolLit {
                    value: true,
                    position: Span::default(),
                },
                Token::BoolLit {
                    value: false,
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_lex_two_character_operators() {
        let tokens = Lexer::new("== != <= >= && || = ! < >").lex().unwrap();

        assert_eq!(
            vec![
                Token::Equal {
                    position: Span::default(),
                },
                Token::NotEqual {
                    position: Span::default(),
                },
                Token::LessOrEqual {
                    position: Span::default(),
                },
                Token::GreaterOrEqual {
                    position: Span::default(),
                },
                Token::And {
                    position: Span::default(),
                },
                Token::Or {
                    position: Span::default(),
                },
                Token::Assign {
                    position: Span::default(),
                },
                Token::Not {
                    position: Span::default(),
                },
                Token::LessThan {
                    position: Span::default(),
                },
                Token::GreaterThan {
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_lex_comment_runs_to_end_of_line() {
        let tokens = Lexer::new("a // b c d\n/ e").lex().unwrap();

        assert_eq!(
            vec![
                Token::Ident {
                    value: "a".into(),
                    position: Span::default(),
                },
                Token::Divide {
                    position: Span::default(),
                },
                Token::Ident {
                    value: "e".into(),
                    position: Span::default(),
                },
                Token::Eof {
                    position: Span::default(),
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_lex_positions() {
        let tokens = Lexer::new("int x;\n  x = 1;").lex().unwrap();

        let positions = tokens
            .iter()
            .map(|token| (token.position().line, token.position().col))
            .collect::<Vec<_>>();

        assert_eq!(
            vec![
                (1, 1),
                (1, 5),
                (1, 6),
                (2, 3),
                (2, 5),
                (2, 7),
                (2, 8),
                (2, 9),
            ],
            positions
        );
    }

    #[test]
    fn test_lex_stray_character_is_fatal() {
        let result = Lexer::new("int x @").lex();

        assert_eq!(
            Err(LexError {
                message: "unexpected character '@'".into(),
                position: Span::new(1, 7),
            }),
            result
        );
    }

    #[test]
    fn test_lex_lone_ampersand_is_fatal() {
        assert!(Lexer::new("a & b").lex().is_err());
    }

    #[test]
    fn test_lex_integer_overflow_is_fatal() {
        assert!(Lexer::new("99999999999999999999").lex().is_err());
    }

    #[test]
    fn test_lex_lone_dot_is_fatal() {
        assert!(Lexer::new("a = .;").lex().is_err());
    }
}
