use std::fmt;

use crate::utils::combinations;

/// A production in Chomsky normal form, either `lhs -> rhs1 rhs2` over two
/// nonterminals or `lhs -> terminal`. Nothing about the shape is checked until
/// the production is handed to `Pcfg::set`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
  pub lhs: String,
  pub rhs: Vec<String>,
}

impl Production {
  pub fn new(lhs: impl Into<String>, rhs: &[&str]) -> Self {
    Self {
      lhs: lhs.into(),
      rhs: rhs.iter().map(|s| s.to_string()).collect(),
    }
  }

  pub fn binary(lhs: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
    Self {
      lhs: lhs.into(),
      rhs: vec![left.into(), right.into()],
    }
  }

  pub fn unary(lhs: impl Into<String>, terminal: impl Into<String>) -> Self {
    Self {
      lhs: lhs.into(),
      rhs: vec![terminal.into()],
    }
  }

  pub fn is_binary(&self) -> bool {
    self.rhs.len() == 2
  }

  pub fn is_unary(&self) -> bool {
    self.rhs.len() == 1
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.lhs)?;
    for s in self.rhs.iter() {
      write!(f, " {}", s)?;
    }
    Ok(())
  }
}

/// A production paired with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduction {
  pub production: Production,
  pub prob: f64,
}

impl ScoredProduction {
  pub fn new(production: Production, prob: f64) -> Self {
    Self { production, prob }
  }
}

/// Renders in the textual grammar format, `0.4 NP -> NP PP;`
impl fmt::Display for ScoredProduction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {};", self.prob, self.production)
  }
}

/// Splits scored productions into the parallel vectors `Pcfg::set` takes.
pub fn split(scored: &[ScoredProduction]) -> (Vec<Production>, Vec<f64>) {
  scored
    .iter()
    .map(|sp| (sp.production.clone(), sp.prob))
    .unzip()
}

/// Every production in Chomsky normal form over the nonterminals `v0..v{n-1}`
/// and the terminals `t0..t{v-1}`: each nonterminal gets every ordered pair of
/// nonterminals and every terminal. `v0` comes first, so it is the start symbol.
///
/// ```
/// let vp = pcfg::rules::full_cnf(2, 1);
/// assert_eq!(vp.len(), 2 * (2 * 2 + 1));
/// assert_eq!(vp[0].lhs, "v0");
/// ```
pub fn full_cnf(n: usize, v: usize) -> Vec<Production> {
  let nonterminals = (0..n).map(|i| format!("v{}", i)).collect::<Vec<_>>();
  let terminals = (0..v).map(|i| format!("t{}", i)).collect::<Vec<_>>();
  let pairs = combinations(&[nonterminals.clone(), nonterminals.clone()]);

  let mut vp = Vec::with_capacity(n * (pairs.len() + v));
  for lhs in nonterminals.iter() {
    for pair in pairs.iter() {
      vp.push(Production::binary(lhs.as_str(), pair[0].as_str(), pair[1].as_str()));
    }
    for t in terminals.iter() {
      vp.push(Production::unary(lhs.as_str(), t.as_str()));
    }
  }
  vp
}
