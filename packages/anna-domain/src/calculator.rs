//! Arithmetic evaluator for agent-supplied expressions such as `"(2 + 3) * 4.5"`.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := '-' factor | '(' expr ')' | number
//! ```

const ALLOWED_CHARS: &str = "0123456789+-*/(). ";
/// Combined nesting of parentheses and unary minus.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
	#[error("Expression contains invalid character {0:?}.")]
	InvalidCharacter(char),
	#[error("Expression is empty.")]
	Empty,
	#[error("Invalid number literal {0:?}.")]
	InvalidNumber(String),
	#[error("Unexpected {found} at position {position}.")]
	Unexpected { found: String, position: usize },
	#[error("Division by zero.")]
	DivisionByZero,
	#[error("Expression nests deeper than {MAX_DEPTH} levels.")]
	TooDeep,
}

pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
	if let Some(bad) = expression.chars().find(|ch| !ALLOWED_CHARS.contains(*ch)) {
		return Err(CalcError::InvalidCharacter(bad));
	}

	let tokens = tokenize(expression)?;

	if tokens.is_empty() {
		return Err(CalcError::Empty);
	}

	let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
	let value = parser.expr()?;

	if let Some(token) = parser.peek() {
		return Err(CalcError::Unexpected { found: token.describe(), position: parser.pos });
	}

	Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Num(f64),
	Op(char),
	Open,
	Close,
}
impl Token {
	fn describe(&self) -> String {
		match self {
			Self::Num(value) => format!("number {value}"),
			Self::Op(op) => format!("operator '{op}'"),
			Self::Open => "'('".to_string(),
			Self::Close => "')'".to_string(),
		}
	}
}

fn tokenize(expression: &str) -> Result<Vec<Token>, CalcError> {
	let chars: Vec<char> = expression.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < chars.len() {
		match chars[i] {
			' ' => i += 1,
			'(' => {
				tokens.push(Token::Open);
				i += 1;
			},
			')' => {
				tokens.push(Token::Close);
				i += 1;
			},
			op @ ('+' | '-' | '*' | '/') => {
				tokens.push(Token::Op(op));
				i += 1;
			},
			_ => {
				let start = i;

				while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
					i += 1;
				}

				let literal: String = chars[start..i].iter().collect();
				let value =
					literal.parse::<f64>().map_err(|_| CalcError::InvalidNumber(literal.clone()))?;

				tokens.push(Token::Num(value));
			},
		}
	}

	Ok(tokens)
}

struct Parser<'a> {
	tokens: &'a [Token],
	pos: usize,
	depth: usize,
}
impl<'a> Parser<'a> {
	fn peek(&self) -> Option<&'a Token> {
		self.tokens.get(self.pos)
	}

	fn next(&mut self) -> Option<&'a Token> {
		let token = self.tokens.get(self.pos);

		if token.is_some() {
			self.pos += 1;
		}

		token
	}

	fn enter(&mut self) -> Result<(), CalcError> {
		if self.depth >= MAX_DEPTH {
			return Err(CalcError::TooDeep);
		}

		self.depth += 1;

		Ok(())
	}

	fn expr(&mut self) -> Result<f64, CalcError> {
		let mut value = self.term()?;

		while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
			let op = *op;

			self.pos += 1;

			let rhs = self.term()?;

			value = if op == '+' { value + rhs } else { value - rhs };
		}

		Ok(value)
	}

	fn term(&mut self) -> Result<f64, CalcError> {
		let mut value = self.factor()?;

		while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
			let op = *op;

			self.pos += 1;

			let rhs = self.factor()?;

			if op == '*' {
				value *= rhs;
			} else {
				if rhs == 0.0 {
					return Err(CalcError::DivisionByZero);
				}

				value /= rhs;
			}
		}

		Ok(value)
	}

	fn factor(&mut self) -> Result<f64, CalcError> {
		let position = self.pos;

		match self.next().cloned() {
			Some(Token::Num(value)) => Ok(value),
			Some(Token::Op('-')) => {
				self.enter()?;

				let value = self.factor();

				self.depth -= 1;

				Ok(-value?)
			},
			Some(Token::Open) => {
				self.enter()?;

				let value = self.expr();

				self.depth -= 1;

				let value = value?;

				match self.next() {
					Some(Token::Close) => Ok(value),
					Some(token) => Err(CalcError::Unexpected {
						found: token.describe(),
						position: self.pos - 1,
					}),
					None => Err(CalcError::Unexpected {
						found: "end of input".to_string(),
						position: self.pos,
					}),
				}
			},
			Some(token) => Err(CalcError::Unexpected { found: token.describe(), position }),
			None => Err(CalcError::Unexpected { found: "end of input".to_string(), position }),
		}
	}
}
