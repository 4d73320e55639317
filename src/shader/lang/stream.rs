//! Token stream.
//!
//! A [`TokenParser`] materializes the whole token sequence of a source upfront and exposes a cursor
//! over it. Tokens are never dropped, so any already-seen token can be looked at again through a
//! negative offset or by seeking back to a saved position.

use crate::shader::lang::token::{tokenize, LexError, Token, TokenKind};

#[derive(Clone, Debug)]
pub struct TokenParser {
  // always ends with an EndOfFile token
  tokens: Vec<Token>,
  index: usize,
}

impl TokenParser {
  /// Tokenize `source` and place the cursor on its first token.
  pub fn new<S>(source: S) -> Result<Self, LexError>
  where S: AsRef<str> {
    let tokens = tokenize(source)?;

    Ok(TokenParser { tokens, index: 0 })
  }

  fn last(&self) -> usize {
    self.tokens.len() - 1
  }

  /// Move the cursor one token forward. Does nothing once on the end of file.
  pub fn advance(&mut self) {
    if self.index < self.last() {
      self.index += 1;
    }
  }

  /// Token under the cursor.
  pub fn current(&self) -> &Token {
    &self.tokens[self.index]
  }

  /// Token at `offset` from the cursor.
  ///
  /// Offsets past the end are clamped to the end of file token and offsets before the start are
  /// clamped to the first token.
  pub fn peek(&self, offset: isize) -> &Token {
    let target = self.index as isize + offset;
    let clamped = if target < 0 {
      0
    } else {
      (target as usize).min(self.last())
    };

    &self.tokens[clamped]
  }

  /// Is there anything left but the end of file?
  pub fn has_more(&self) -> bool {
    self.current().kind != TokenKind::EndOfFile
  }

  /// Position of the cursor, suitable for [`TokenParser::seek`].
  pub fn position(&self) -> usize {
    self.index
  }

  /// Move the cursor back (or forward) to a position previously returned by
  /// [`TokenParser::position`].
  pub fn seek(&mut self, position: usize) {
    self.index = position.min(self.last());
  }
}
