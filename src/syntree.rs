use std::fmt;
use std::fmt::Write;

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

impl<T, U> SynTree<T, U> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// Half-open span of input positions covered by this node.
  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(t) => write!(f, "{}", t),
      Self::Branch(t, ts) => {
        write!(f, "({}", t)?;
        if ts.len() == 1 {
          write!(f, " ({}))", ts[0])
        } else {
          for t in ts.iter() {
            let fmt = format!("{}", t);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}

/// A nonterminal node of a Viterbi parse: its symbol and the probability of
/// the rule used to expand it.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseNode {
  pub symbol: String,
  pub prob: f64,
}

impl fmt::Display for ParseNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.symbol, self.prob)
  }
}

/// Nonterminals are branches, terminals are leaves holding the word.
pub type ParseTree = SynTree<ParseNode, String>;

impl SynTree<ParseNode, String> {
  /// Nonterminal or terminal name
  pub fn symbol(&self) -> &str {
    match self {
      Self::Branch(c, _) => &c.value.symbol,
      Self::Leaf(w) => &w.value,
    }
  }

  /// Rule probability, `None` for terminals.
  pub fn prob(&self) -> Option<f64> {
    self.get_branch().map(|(c, _)| c.value.prob)
  }

  pub fn is_terminal(&self) -> bool {
    self.is_leaf()
  }

  pub fn children(&self) -> &[ParseTree] {
    self.get_branch().map(|(_, cs)| cs.as_slice()).unwrap_or(&[])
  }

  /// Symbols only: `S(A(a), B(b))`
  pub fn bracketed(&self) -> String {
    let mut out = String::new();
    self.write_bracketed(&mut out, false);
    out
  }

  /// Symbols with the probabilities of nonterminals:
  /// `S 1.000000(A 1.000000(a), B 1.000000(b))`
  pub fn annotated(&self) -> String {
    let mut out = String::new();
    self.write_bracketed(&mut out, true);
    out
  }

  fn write_bracketed(&self, out: &mut String, with_prob: bool) {
    match self {
      Self::Leaf(w) => out.push_str(&w.value),
      Self::Branch(c, children) => {
        out.push_str(&c.value.symbol);
        if with_prob {
          // writing to a String can't fail
          let _ = write!(out, " {:.6}", c.value.prob);
        }
        out.push('(');
        for (idx, child) in children.iter().enumerate() {
          if idx > 0 {
            out.push_str(", ");
          }
          child.write_bracketed(out, with_prob);
        }
        out.push(')');
      }
    }
  }
}
