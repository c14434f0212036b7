// Register Allocator
//! Lexer
//
// Note this project relies on logos 0.12.1 see docs [here]
// (https://docs.rs/logos/0.12.1/logos/index.html)

#![allow(clippy::upper_case_acronyms)]
use anyhow::{bail, Result};
use enum_as_inner::EnumAsInner;
use logos::Logos;
use std::fmt;
use strum_macros::AsRefStr;

impl<'a> fmt::Display for Token<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Variable(s) | Token::Literal(s) | Token::BadIdent(s) => write!(f, "{}", s),
      Token::Newline => write!(f, "\\n"),
      other => write!(f, "{}", other.symbol().unwrap_or("?")),
    }
  }
}

#[derive(Clone, Copy, Logos, Debug, PartialEq, AsRefStr, EnumAsInner)]
pub enum Token<'a> {
  #[token("live")]
  Live,
  // a single lowercase letter other than `t`, or `t` followed by digits
  #[regex(r"[a-su-z]", priority = 3)]
  #[regex(r"t[0-9]+", priority = 3)]
  Variable(&'a str),
  #[regex(r"[0-9]+")]
  Literal(&'a str),

  #[token("+")]
  Plus,
  #[token("-")]
  Minus,
  #[token("*")]
  Asterisk,
  #[token("/")]
  Div,
  #[token("=")]
  Assgn,
  #[token(":")]
  Colon,
  #[token(",")]
  COMMA,
  #[token("\n")]
  Newline,

  // Any other word, e.g. `t`, `ab` or `Live`. Never valid.
  #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
  BadIdent(&'a str),

  #[error]
  #[regex(r"[ \t\r\f]+", logos::skip)] // Whitespace, except newlines
  Error,
}

impl<'a> Token<'a> {
  /// The source text of fixed tokens
  pub fn symbol(&self) -> Option<&'static str> {
    match self {
      Token::Live => Some("live"),
      Token::Plus => Some("+"),
      Token::Minus => Some("-"),
      Token::Asterisk => Some("*"),
      Token::Div => Some("/"),
      Token::Assgn => Some("="),
      Token::Colon => Some(":"),
      Token::COMMA => Some(","),
      Token::Newline => Some("\n"),
      _ => None,
    }
  }

  pub fn is_operator(&self) -> bool {
    matches!(
      self,
      Token::Plus | Token::Minus | Token::Asterisk | Token::Div
    )
  }
}

/// A token with the 1-based line it was found on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spanned<'a> {
  pub token: Token<'a>,
  pub line: usize,
}

/// Splits `input` into tokens. Fails on the first invalid token.
pub fn tokenize(input: &str) -> Result<Vec<Spanned<'_>>> {
  let mut lexer = Token::lexer(input);
  let mut tokens = vec![];
  let mut line = 1;

  while let Some(token) = lexer.next() {
    match token {
      Token::Error => bail!("Invalid token '{}' on line {}", lexer.slice(), line),
      Token::BadIdent(s) => bail!("Invalid token '{}' on line {}", s, line),
      _ => {}
    }
    tokens.push(Spanned { token, line });
    if token == Token::Newline {
      line += 1;
    }
  }

  log::debug!("Tokenized {} tokens over {} lines", tokens.len(), line);
  Ok(tokens)
}

/// Comma separated token values, newlines shown as `\n`.
pub fn display_tokens(tokens: &[Spanned<'_>]) -> String {
  tokens
    .iter()
    .map(|t| t.token.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<Token<'_>> {
    tokenize(input)
      .unwrap()
      .into_iter()
      .map(|t| t.token)
      .collect()
  }

  fn single(input: &str) -> Token<'_> {
    let tokens = kinds(input);
    assert_eq!(tokens.len(), 1, "{:?}", tokens);
    tokens[0]
  }

  #[test]
  fn test_token_kinds() {
    assert_eq!(single("live"), Token::Live);
    assert_eq!(single("+"), Token::Plus);
    assert_eq!(single("-"), Token::Minus);
    assert_eq!(single("/"), Token::Div);
    assert_eq!(single("*"), Token::Asterisk);
    assert_eq!(single("1"), Token::Literal("1"));
    assert_eq!(single("12"), Token::Literal("12"));
    assert_eq!(single("a"), Token::Variable("a"));
    assert_eq!(single("t1"), Token::Variable("t1"));
    assert_eq!(single("t12"), Token::Variable("t12"));
    assert_eq!(single(":"), Token::Colon);
    assert_eq!(single(","), Token::COMMA);
    assert_eq!(single("\n"), Token::Newline);
    assert_eq!(single("="), Token::Assgn);
  }

  #[test]
  fn test_invalid_words() {
    for bad in ["t", "ab", "Live", "liver", "A", "x1"] {
      assert!(tokenize(bad).is_err(), "{} should not lex", bad);
    }
    let err = tokenize("a = 1\nb = %\n").unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);
  }

  #[test]
  fn test_instruction_line() {
    assert_eq!(
      kinds("t3 = a * 12\n"),
      vec![
        Token::Variable("t3"),
        Token::Assgn,
        Token::Variable("a"),
        Token::Asterisk,
        Token::Literal("12"),
        Token::Newline,
      ]
    );
    // no whitespace needed between tokens
    assert_eq!(kinds("x=-y").len(), 4);
  }

  #[test]
  fn test_line_numbers() {
    let tokens = tokenize("a = 1\n\nlive: a").unwrap();
    let last = tokens.last().unwrap();
    assert_eq!(last.token, Token::Variable("a"));
    assert_eq!(last.line, 3);
  }

  #[test]
  fn test_display_tokens() {
    let tokens = tokenize("live: a, b\n").unwrap();
    assert_eq!(display_tokens(&tokens), "live, :, a, ,, b, \\n");
  }
}
