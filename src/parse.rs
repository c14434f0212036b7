// Register Allocator
//! Parser
//
// Each line is either an instruction, a live statement or blank:
//
//   line  := NL | instr (NL | EOF) | live (NL | EOF)
//   instr := VAR '=' ['-'] operand [op operand]
//   live  := 'live' ':' VAR (',' VAR)*

pub mod parser {
  use anyhow::{anyhow, bail, Context, Result};

  use crate::ir::{Instr, InstrSeq, Operand, Var};
  use crate::lex::{tokenize, Spanned, Token};

  struct Parser<'t, 'a> {
    tokens: &'t [Spanned<'a>],
    pos: usize,
    seq: InstrSeq,
    saw_live: bool,
  }

  impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Spanned<'a>]) -> Self {
      Parser {
        tokens,
        pos: 0,
        seq: InstrSeq::default(),
        saw_live: false,
      }
    }

    fn peek(&self) -> Option<&Spanned<'a>> {
      self.tokens.get(self.pos)
    }

    /// Line of the current token, or of the last one at end of input
    fn line(&self) -> usize {
      self
        .peek()
        .or_else(|| self.tokens.last())
        .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Result<Token<'a>> {
      let token = self
        .peek()
        .map(|t| t.token)
        .ok_or_else(|| anyhow!("Unexpected end of input on line {}", self.line()))?;
      self.pos += 1;
      Ok(token)
    }

    fn expect(&mut self, expected: Token<'static>) -> Result<()> {
      let line = self.line();
      let token = self.advance()?;
      if token != expected {
        bail!(
          "Expected {}, got {} '{}' on line {}",
          expected.as_ref(),
          token.as_ref(),
          token,
          line
        );
      }
      Ok(())
    }

    fn expect_var(&mut self) -> Result<Var> {
      let line = self.line();
      match self.advance()? {
        Token::Variable(name) => Ok(Var::from(name)),
        other => bail!("Expected Variable, got {} '{}' on line {}", other.as_ref(), other, line),
      }
    }

    fn parse(mut self) -> Result<InstrSeq> {
      while let Some(spanned) = self.peek() {
        match spanned.token {
          Token::Variable(_) => self.parse_instr()?,
          Token::Live => self.parse_live()?,
          Token::Newline => self.pos += 1,
          other => bail!(
            "Unexpected token '{}' at start of line {}",
            other,
            spanned.line
          ),
        }
      }
      Ok(self.seq)
    }

    /// `x = y`, `x = - y` or `x = y op z`
    fn parse_instr(&mut self) -> Result<()> {
      let line = self.line();
      let dest = self.expect_var()?;
      self.expect(Token::Assgn)?;

      let unary = match self.peek().map(|t| t.token) {
        Some(Token::Minus) => {
          self.pos += 1;
          Some("-")
        }
        Some(op) if op.is_operator() => bail!("Invalid unary operator '{}' on line {}", op, line),
        _ => None,
      };

      let src1 = self.parse_operand()?;

      let (op, src2) = match (unary, self.peek().map(|t| t.token)) {
        (None, Some(op)) if op.is_operator() => {
          self.pos += 1;
          (op.symbol(), Some(self.parse_operand()?))
        }
        _ => (unary, None),
      };

      self.end_of_line()?;
      let instr = Instr::from_parts(dest, src1, op, src2).with_context(|| format!("on line {}", line))?;
      log::trace!("line {}: {}", line, instr);
      self.seq.push(instr);
      Ok(())
    }

    fn parse_operand(&mut self) -> Result<Operand> {
      let line = self.line();
      match self.advance()? {
        Token::Variable(name) => Ok(Operand::Var(Var::from(name))),
        Token::Literal(digits) => {
          Operand::from_token(digits).with_context(|| format!("on line {}", line))
        }
        other => bail!(
          "Expected variable or literal, got {} '{}' on line {}",
          other.as_ref(),
          other,
          line
        ),
      }
    }

    /// `live: a, b, c`
    fn parse_live(&mut self) -> Result<()> {
      let line = self.line();
      self.expect(Token::Live)?;
      self.expect(Token::Colon)?;

      let mut vars = vec![self.expect_var()?];
      while let Some(Token::COMMA) = self.peek().map(|t| t.token) {
        self.pos += 1;
        vars.push(self.expect_var()?);
      }
      self.end_of_line()?;

      if self.saw_live {
        log::warn!("Live statement on line {} replaces an earlier one", line);
      }
      self.saw_live = true;
      self.seq.set_live_on_exit(vars);
      Ok(())
    }

    fn end_of_line(&mut self) -> Result<()> {
      match self.peek() {
        None => Ok(()),
        Some(Spanned {
          token: Token::Newline,
          ..
        }) => {
          self.pos += 1;
          Ok(())
        }
        Some(Spanned { token, line }) => {
          bail!("Unexpected token '{}' before end of line {}", token, line)
        }
      }
    }
  }

  /// Parse the tokens of a whole program into one instruction sequence
  pub fn parse_tokens(tokens: &[Spanned<'_>]) -> Result<InstrSeq> {
    Parser::new(tokens).parse()
  }

  pub fn parse_str(input: &str) -> Result<InstrSeq> {
    parse_tokens(&tokenize(input)?)
  }

}
