//! Tokens and the tokenizer.
//!
//! The tokenizer turns shader source text into a flat sequence of [`Token`]s. It knows nothing
//! about keywords: every alphabetic run is an [`TokenKind::Identifier`], except `true` and `false`
//! which are reclassified as [`TokenKind::BooleanLiteral`] here so that the parser never has to.

use std::error::Error;
use std::fmt;

/// Single-character punctuators.
const PUNCTUATORS: &[char] = &[
  '[', ']', '(', ')', '{', '}', ',', '.', ';', ':', '<', '>', '=', '!', '+', '-', '*', '/', '&',
  '|', '?',
];

/// Two-character operators. They win over single-character punctuators (maximal munch).
const DOUBLE_PUNCTUATORS: &[&str] = &[
  "==", ">=", "<=", "!=", "&&", "||", "+=", "*=", "/=", "&=", "|=",
];

/// Kind of a token.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
  EndOfFile,
  FloatLiteral,
  IntegerLiteral,
  BooleanLiteral,
  Operator,
  Identifier,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    let s = match *self {
      TokenKind::EndOfFile => "end of file",
      TokenKind::FloatLiteral => "float literal",
      TokenKind::IntegerLiteral => "integer literal",
      TokenKind::BooleanLiteral => "boolean literal",
      TokenKind::Operator => "operator",
      TokenKind::Identifier => "identifier",
    };

    f.write_str(s)
  }
}

/// A token.
///
/// `float_value` and `int_value` are only meaningful for the matching literal kinds and are zero
/// otherwise. `line` is 1-based and only used for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub float_value: f32,
  pub int_value: i32,
  pub line: usize,
}

impl Token {
  fn new(kind: TokenKind, text: String, line: usize) -> Self {
    Token {
      kind,
      text,
      float_value: 0.,
      int_value: 0,
      line,
    }
  }

  fn end_of_file(line: usize) -> Self {
    Token::new(TokenKind::EndOfFile, String::new(), line)
  }

  /// Is this token the given operator?
  pub fn is_operator(&self, op: &str) -> bool {
    self.kind == TokenKind::Operator && self.text == op
  }

  /// Is this token the given identifier (keywords included)?
  pub fn is_identifier(&self, name: &str) -> bool {
    self.kind == TokenKind::Identifier && self.text == name
  }

  /// Value of a boolean literal.
  pub fn bool_value(&self) -> bool {
    self.kind == TokenKind::BooleanLiteral && self.text == "true"
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match self.kind {
      TokenKind::EndOfFile => f.write_str("end of file"),
      kind => write!(f, "{} `{}`", kind, self.text),
    }
  }
}

/// Reason of a lexical failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LexErrorKind {
  /// A character that doesn’t start any token.
  UnexpectedCharacter(char),
  /// A `/*` comment that never ends.
  UnterminatedComment,
  /// A numeric literal that cannot be represented.
  InvalidNumber(String),
}

/// Lexical error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexError {
  pub line: usize,
  pub kind: LexErrorKind,
}

impl fmt::Display for LexError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match self.kind {
      LexErrorKind::UnexpectedCharacter(c) => {
        write!(f, "line {}: unexpected character {:?}", self.line, c)
      }

      LexErrorKind::UnterminatedComment => write!(f, "line {}: unterminated comment", self.line),

      LexErrorKind::InvalidNumber(ref n) => {
        write!(f, "line {}: invalid numeric literal {}", self.line, n)
      }
    }
  }
}

impl Error for LexError {}

/// Sequential tokenizer over an owned source text.
///
/// The cursor only goes forward. Once the end of the input is reached, every call to
/// [`Tokenizer::next_token`] yields the same [`TokenKind::EndOfFile`] token.
#[derive(Clone, Debug)]
pub struct Tokenizer {
  source: Vec<char>,
  pos: usize,
  line: usize,
}

impl Tokenizer {
  pub fn new<S>(source: S) -> Self
  where S: AsRef<str> {
    Tokenizer {
      source: source.as_ref().chars().collect(),
      pos: 0,
      line: 1,
    }
  }

  /// Current line of the cursor.
  pub fn line(&self) -> usize {
    self.line
  }

  fn peek_char(&self, offset: usize) -> Option<char> {
    self.source.get(self.pos + offset).cloned()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek_char(0)?;
    self.pos += 1;

    if c == '\n' {
      self.line += 1;
    }

    Some(c)
  }

  /// Skip whitespace and comments.
  fn skip_trivia(&mut self) -> Result<(), LexError> {
    loop {
      match (self.peek_char(0), self.peek_char(1)) {
        (Some(c), _) if c.is_whitespace() => {
          self.bump();
        }

        (Some('/'), Some('/')) => {
          while let Some(c) = self.peek_char(0) {
            if c == '\n' {
              break;
            }

            self.bump();
          }
        }

        (Some('/'), Some('*')) => {
          let start_line = self.line;
          self.pos += 2;

          loop {
            match (self.peek_char(0), self.peek_char(1)) {
              (Some('*'), Some('/')) => {
                self.pos += 2;
                break;
              }

              (Some(_), _) => {
                self.bump();
              }

              (None, _) => {
                return Err(LexError {
                  line: start_line,
                  kind: LexErrorKind::UnterminatedComment,
                });
              }
            }
          }
        }

        _ => return Ok(()),
      }
    }
  }

  fn take_while<F>(&mut self, pred: F) -> String
  where F: Fn(char) -> bool {
    let mut s = String::new();

    while let Some(c) = self.peek_char(0) {
      if !pred(c) {
        break;
      }

      s.push(c);
      self.bump();
    }

    s
  }

  fn identifier(&mut self) -> Token {
    let line = self.line;
    let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
    let kind = match text.as_str() {
      "true" | "false" => TokenKind::BooleanLiteral,
      _ => TokenKind::Identifier,
    };

    Token::new(kind, text, line)
  }

  fn number(&mut self) -> Result<Token, LexError> {
    let line = self.line;
    let mut text = self.take_while(|c| c.is_ascii_digit());

    if self.peek_char(0) == Some('.') {
      self.bump();
      text.push('.');
      text.push_str(&self.take_while(|c| c.is_ascii_digit()));

      // out of range literals parse as infinity
      let float_value = text
        .parse::<f32>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| LexError {
          line,
          kind: LexErrorKind::InvalidNumber(text.clone()),
        })?;

      let mut token = Token::new(TokenKind::FloatLiteral, text, line);
      token.float_value = float_value;
      Ok(token)
    } else {
      let int_value = text.parse::<i32>().map_err(|_| LexError {
        line,
        kind: LexErrorKind::InvalidNumber(text.clone()),
      })?;

      let mut token = Token::new(TokenKind::IntegerLiteral, text, line);
      token.int_value = int_value;
      Ok(token)
    }
  }

  fn operator(&mut self, c: char) -> Result<Token, LexError> {
    let line = self.line;

    if let Some(next) = self.peek_char(1) {
      let double: String = [c, next].iter().collect();

      if DOUBLE_PUNCTUATORS.contains(&double.as_str()) {
        self.pos += 2;
        return Ok(Token::new(TokenKind::Operator, double, line));
      }
    }

    if PUNCTUATORS.contains(&c) {
      self.pos += 1;
      Ok(Token::new(TokenKind::Operator, c.to_string(), line))
    } else {
      Err(LexError {
        line,
        kind: LexErrorKind::UnexpectedCharacter(c),
      })
    }
  }

  /// Produce the next token.
  pub fn next_token(&mut self) -> Result<Token, LexError> {
    self.skip_trivia()?;

    match self.peek_char(0) {
      None => Ok(Token::end_of_file(self.line)),
      Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(self.identifier()),
      Some(c) if c.is_ascii_digit() => self.number(),
      Some(c) => self.operator(c),
    }
  }
}

/// Tokenize a whole source, the final [`TokenKind::EndOfFile`] token included.
pub fn tokenize<S>(source: S) -> Result<Vec<Token>, LexError>
where S: AsRef<str> {
  let mut tokenizer = Tokenizer::new(source);
  let mut tokens = Vec::new();

  loop {
    let token = tokenizer.next_token()?;
    let done = token.kind == TokenKind::EndOfFile;

    tokens.push(token);

    if done {
      return Ok(tokens);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds_and_texts(src: &str) -> Vec<(TokenKind, String)> {
    tokenize(src)
      .unwrap()
      .into_iter()
      .map(|t| (t.kind, t.text))
      .collect()
  }

  #[test]
  fn maximal_munch() {
    let tokens = tokenize("==").unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::Operator);
    assert_eq!(tokens[0].text, "==");
    assert_eq!(tokens[1].kind, TokenKind::EndOfFile);
  }

  #[test]
  fn double_punctuators_then_single() {
    let ops: Vec<String> = tokenize("a<=b=!c&&=")
      .unwrap()
      .into_iter()
      .filter(|t| t.kind == TokenKind::Operator)
      .map(|t| t.text)
      .collect();

    assert_eq!(ops, vec!["<=", "=", "!", "&&", "="]);
  }

  #[test]
  fn float_literal() {
    let tokens = tokenize("3.14").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
    assert!((tokens[0].float_value - 3.14).abs() < 1e-6);
  }

  #[test]
  fn integer_literal() {
    let tokens = tokenize("42").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
    assert_eq!(tokens[0].int_value, 42);
  }

  #[test]
  fn trailing_dot_float() {
    let tokens = tokenize("1.").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[0].float_value, 1.);
  }

  #[test]
  fn no_sign_in_literals() {
    assert_eq!(
      kinds_and_texts("-2"),
      vec![
        (TokenKind::Operator, "-".to_owned()),
        (TokenKind::IntegerLiteral, "2".to_owned()),
        (TokenKind::EndOfFile, String::new()),
      ]
    );
  }

  #[test]
  fn booleans_are_reclassified() {
    let tokens = tokenize("true false truth").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::BooleanLiteral);
    assert!(tokens[0].bool_value());
    assert_eq!(tokens[1].kind, TokenKind::BooleanLiteral);
    assert!(!tokens[1].bool_value());
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
  }

  #[test]
  fn keywords_are_identifiers() {
    let tokens = tokenize("uniform vec4 _colourDiffuse;").unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].text, "_colourDiffuse");
    assert!(tokens[3].is_operator(";"));
  }

  #[test]
  fn line_numbers() {
    let tokens = tokenize("a\nb\n\n  c").unwrap();

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 4);
  }

  #[test]
  fn comments_are_skipped() {
    let tokens = tokenize("a // b c\n/* d\n e */ f / g").unwrap();
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

    assert_eq!(texts, vec!["a", "f", "/", "g", ""]);
    assert_eq!(tokens[1].line, 3);
  }

  #[test]
  fn unterminated_comment() {
    let err = tokenize("a\n/* never").unwrap_err();

    assert_eq!(err.line, 2);
    assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
  }

  #[test]
  fn unexpected_character() {
    let err = tokenize("a\nb # c").unwrap_err();

    assert_eq!(err.line, 2);
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('#'));
  }

  #[test]
  fn integer_overflow() {
    let err = tokenize("99999999999").unwrap_err();

    assert_eq!(err.kind, LexErrorKind::InvalidNumber("99999999999".to_owned()));
  }

  #[test]
  fn float_overflow() {
    let text = format!("{}.0", "9".repeat(50));
    let err = tokenize(&format!("x\n{}", text)).unwrap_err();

    assert_eq!(err.line, 2);
    assert_eq!(err.kind, LexErrorKind::InvalidNumber(text));

    // largest finite values are fine
    let tokens = tokenize("340282340000000000000000000000000000000.0").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
    assert!(tokens[0].float_value.is_finite());
  }

  #[test]
  fn end_of_file_is_sticky() {
    let mut tokenizer = Tokenizer::new("x");

    assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Identifier);

    for _ in 0..4 {
      assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::EndOfFile);
    }
  }
}
