use std::collections::VecDeque;

use crate::lexer::Token;

/// Token buffer the parser reads from. Consumption is front-to-back; a
/// single token can be pushed back to the front after being inspected.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: VecDeque<Token>,
}

impl TokenStream {
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    pub fn next(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    pub fn push_front(&mut self, token: Token) {
        self.tokens.push_front(token);
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Span;

    use super::*;

    #[test]
    fn test_pushback_restores_front() {
        let mut stream = TokenStream::from(vec![
            Token::LBracket {
                position: Span::default(),
            },
            Token::IntLit {
                value: 3,
                position: Span::default(),
            },
        ]);

        let first = stream.next().unwrap();
        stream.push_front(first.clone());

        assert_eq!(Some(&first), stream.peek());
    }
}
