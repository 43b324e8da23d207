use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::PcfgError;
use crate::rules::{Production, ScoredProduction};
use crate::utils::{is_normalized, Err};

/// Default tolerance for the per-nonterminal probability mass check.
pub const DEFAULT_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// `binary[j][(r, s)] = P(N_j -> N_r N_s)`
pub(crate) type Binary = BTreeMap<(usize, usize), f64>;
/// `unary[j][k] = P(N_j -> w_k)`
pub(crate) type Unary = BTreeMap<usize, f64>;

/// A probabilistic context-free grammar in Chomsky normal form.
///
/// Nonterminals are numbered `0..n` in order of their first appearance as a
/// left-hand side, so nonterminal 0 is the start symbol. Terminals are
/// numbered `0..V` in order of first appearance on a unary right-hand side.
///
/// A `Default` grammar is uninitialized; querying it panics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pcfg {
  nonterminals: Vec<String>,
  terminals: Vec<String>,
  nonterminal_map: HashMap<String, usize>,
  terminal_map: HashMap<String, usize>,
  pub(crate) binary: Vec<Binary>,
  pub(crate) unary: Vec<Unary>,
}

/// Symbol tables built while classifying the symbols of a production list.
#[derive(Debug, Default)]
struct Vocabulary {
  nonterminals: Vec<String>,
  terminals: Vec<String>,
  nonterminal_map: HashMap<String, usize>,
  terminal_map: HashMap<String, usize>,
}

impl Vocabulary {
  fn intern(names: &mut Vec<String>, map: &mut HashMap<String, usize>, name: &str) -> usize {
    if let Some(&idx) = map.get(name) {
      idx
    } else {
      let idx = names.len();
      names.push(name.to_string());
      map.insert(name.to_string(), idx);
      idx
    }
  }

  /// Every left-hand side is a nonterminal, a binary right-hand side must only
  /// name nonterminals, and a unary right-hand side must name a terminal.
  fn from_productions(vp: &[Production]) -> Result<Self, PcfgError> {
    let mut voc = Self::default();

    for p in vp.iter() {
      Self::intern(&mut voc.nonterminals, &mut voc.nonterminal_map, &p.lhs);
    }
    if voc.nonterminals.is_empty() {
      return Err(PcfgError::NoProductions);
    }

    for p in vp.iter() {
      match p.rhs.as_slice() {
        [left, right] => {
          for symbol in [left, right] {
            if !voc.nonterminal_map.contains_key(symbol) {
              return Err(PcfgError::UndeclaredNonterminal {
                symbol: symbol.clone(),
                production: p.to_string(),
              });
            }
          }
        }
        [terminal] => {
          if voc.nonterminal_map.contains_key(terminal) {
            return Err(PcfgError::AmbiguousSymbol {
              symbol: terminal.clone(),
            });
          }
          Self::intern(&mut voc.terminals, &mut voc.terminal_map, terminal);
        }
        _ => {
          return Err(PcfgError::NotCnf {
            production: p.to_string(),
          });
        }
      }
    }
    if voc.terminals.is_empty() {
      return Err(PcfgError::NoTerminals);
    }

    Ok(voc)
  }
}

impl Pcfg {
  /// Builds a grammar from CNF productions where `vp[i]` has probability
  /// `prob[i]`. Each nonterminal's probabilities must sum to `1 ± tol`.
  pub fn new(vp: &[Production], prob: &[f64], tol: f64) -> Result<Self, PcfgError> {
    if tol < 0.0 {
      return Err(PcfgError::NegativeTolerance(tol));
    }
    if vp.len() != prob.len() {
      return Err(PcfgError::LengthMismatch {
        productions: vp.len(),
        probabilities: prob.len(),
      });
    }

    let voc = Vocabulary::from_productions(vp)?;
    let n = voc.nonterminals.len();
    let mut binary = vec![Binary::new(); n];
    let mut unary = vec![Unary::new(); n];

    for (p, &pr) in vp.iter().zip(prob.iter()) {
      if !pr.is_finite() || pr < 0.0 {
        return Err(PcfgError::InvalidProbability {
          production: p.to_string(),
          prob: pr,
        });
      }
      let j = voc.nonterminal_map[&p.lhs];
      let previous = if p.is_binary() {
        let r = voc.nonterminal_map[&p.rhs[0]];
        let s = voc.nonterminal_map[&p.rhs[1]];
        binary[j].insert((r, s), pr)
      } else {
        unary[j].insert(voc.terminal_map[&p.rhs[0]], pr)
      };
      if previous.is_some() {
        return Err(PcfgError::DuplicateProduction {
          production: p.to_string(),
        });
      }
    }

    let g = Self {
      nonterminals: voc.nonterminals,
      terminals: voc.terminals,
      nonterminal_map: voc.nonterminal_map,
      terminal_map: voc.terminal_map,
      binary,
      unary,
    };
    g.check_probabilities(tol)?;
    Ok(g)
  }

  /// Replaces the grammar, see [`Pcfg::new`]. On error the grammar is left
  /// uninitialized.
  pub fn set(&mut self, vp: &[Production], prob: &[f64], tol: f64) -> Result<(), PcfgError> {
    self.clear();
    *self = Self::new(vp, prob, tol)?;
    debug!(
      nonterminals = self.nonterminal_count(),
      terminals = self.terminal_count(),
      productions = vp.len(),
      "grammar set"
    );
    Ok(())
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  pub fn is_valid(&self) -> bool {
    !self.nonterminals.is_empty()
  }

  pub(crate) fn check(&self) {
    assert!(self.is_valid(), "grammar is uninitialized");
  }

  pub fn nonterminal_count(&self) -> usize {
    self.nonterminals.len()
  }

  pub fn terminal_count(&self) -> usize {
    self.terminals.len()
  }

  pub fn nonterminals(&self) -> &[String] {
    &self.nonterminals
  }

  pub fn terminals(&self) -> &[String] {
    &self.terminals
  }

  /// The start symbol, if the grammar is initialized.
  pub fn start(&self) -> Option<&str> {
    self.nonterminals.first().map(|s| s.as_str())
  }

  pub(crate) fn nonterminal_name(&self, j: usize) -> &str {
    &self.nonterminals[j]
  }

  pub(crate) fn terminal_name(&self, k: usize) -> &str {
    &self.terminals[k]
  }

  /// `P(N_j -> N_r N_s)`, zero for a missing rule.
  pub(crate) fn binary_prob(&self, j: usize, r: usize, s: usize) -> f64 {
    self.binary[j].get(&(r, s)).copied().unwrap_or(0.0)
  }

  /// `P(N_j -> w_k)`, zero for a missing rule.
  pub(crate) fn unary_prob(&self, j: usize, k: usize) -> f64 {
    self.unary[j].get(&k).copied().unwrap_or(0.0)
  }

  /// Looks up a production's probability by symbol names.
  pub fn production_prob(&self, p: &Production) -> Option<f64> {
    let j = *self.nonterminal_map.get(&p.lhs)?;
    match p.rhs.as_slice() {
      [left, right] => {
        let r = *self.nonterminal_map.get(left)?;
        let s = *self.nonterminal_map.get(right)?;
        self.binary[j].get(&(r, s)).copied()
      }
      [terminal] => {
        let k = *self.terminal_map.get(terminal)?;
        self.unary[j].get(&k).copied()
      }
      _ => None,
    }
  }

  /// Maps terminal symbols to their indices.
  pub(crate) fn encode<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Vec<usize>, PcfgError> {
    if sentence.is_empty() {
      return Err(PcfgError::EmptySentence);
    }
    sentence
      .iter()
      .map(|w| {
        let w = w.as_ref();
        self
          .terminal_map
          .get(w)
          .copied()
          .ok_or_else(|| PcfgError::UnknownTerminal {
            symbol: w.to_string(),
          })
      })
      .collect()
  }

  /// Checks that every probability is a non-negative number and that every
  /// nonterminal's mass is `1 ± tol`.
  pub(crate) fn check_probabilities(&self, tol: f64) -> Result<(), PcfgError> {
    for j in 0..self.nonterminal_count() {
      let mut sum = 0.0;
      for (&(r, s), &p) in self.binary[j].iter() {
        if !p.is_finite() || p < 0.0 {
          return Err(PcfgError::InvalidProbability {
            production: Production::binary(
              self.nonterminal_name(j),
              self.nonterminal_name(r),
              self.nonterminal_name(s),
            )
            .to_string(),
            prob: p,
          });
        }
        sum += p;
      }
      for (&k, &p) in self.unary[j].iter() {
        if !p.is_finite() || p < 0.0 {
          return Err(PcfgError::InvalidProbability {
            production: Production::unary(self.nonterminal_name(j), self.terminal_name(k))
              .to_string(),
            prob: p,
          });
        }
        sum += p;
      }
      if !is_normalized(sum, tol) {
        return Err(PcfgError::NotNormalized {
          nonterminal: self.nonterminal_name(j).to_string(),
          sum,
        });
      }
    }
    Ok(())
  }

  /// True if every nonterminal's rule probabilities sum to `1 ± tol`.
  pub fn probabilities_valid(&self, tol: f64) -> bool {
    self.check_probabilities(tol).is_ok()
  }

  /// The productions and probabilities of the grammar. Each nonterminal's
  /// binary productions come before its unary ones, nonterminals in index
  /// order, so `set` on the result numbers nonterminals the same way.
  pub fn vecsprod(&self) -> Vec<ScoredProduction> {
    let mut vsp = Vec::new();
    for j in 0..self.nonterminal_count() {
      let lhs = self.nonterminal_name(j);
      for (&(r, s), &p) in self.binary[j].iter() {
        vsp.push(ScoredProduction::new(
          Production::binary(lhs, self.nonterminal_name(r), self.nonterminal_name(s)),
          p,
        ));
      }
      for (&k, &p) in self.unary[j].iter() {
        vsp.push(ScoredProduction::new(
          Production::unary(lhs, self.terminal_name(k)),
          p,
        ));
      }
    }
    vsp
  }

  /// Drops every production with probability `<= eps` and renormalizes the
  /// rest per nonterminal. A nonterminal can be left without productions, in
  /// which case the grammar no longer passes `probabilities_valid`.
  ///
  /// Useless nonterminals are not removed.
  pub fn remove_productions(&mut self, eps: f64) -> Result<(), PcfgError> {
    self.check();
    if !(0.0..1.0).contains(&eps) {
      return Err(PcfgError::InvalidEpsilon(eps));
    }

    for j in 0..self.nonterminal_count() {
      self.binary[j].retain(|_, p| *p > eps);
      self.unary[j].retain(|_, p| *p > eps);

      let sum: f64 = self.binary[j].values().chain(self.unary[j].values()).sum();
      if sum > 0.0 {
        self
          .binary[j]
          .values_mut()
          .chain(self.unary[j].values_mut())
          .for_each(|p| *p /= sum);
      } else {
        warn!(
          nonterminal = %self.nonterminals[j],
          eps,
          "all productions removed"
        );
      }
    }
    Ok(())
  }

  /// Reads a grammar in the textual format, see [`crate::parse_grammar`].
  pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Err> {
    Self::read_from_file_with_tolerance(path, DEFAULT_TOLERANCE)
  }

  /// Like [`Pcfg::read_from_file`], with `tol` as the normalization tolerance.
  pub fn read_from_file_with_tolerance<P: AsRef<Path>>(path: P, tol: f64) -> Result<Self, Err> {
    Self::parse_with_tolerance(&fs::read_to_string(path)?, tol)
  }
}

/// Draws random probabilities for CNF productions such that the result is
/// accepted by [`Pcfg::set`]: the productions of each nonterminal get a point
/// uniformly distributed on the probability simplex.
pub fn random_probabilities<R: Rng + ?Sized>(
  vp: &[Production],
  rng: &mut R,
) -> Result<Vec<f64>, PcfgError> {
  let voc = Vocabulary::from_productions(vp)?;

  // normalized exponential variates are uniform on the simplex
  let mut prob = Vec::with_capacity(vp.len());
  let mut totals = vec![0.0; voc.nonterminals.len()];
  for p in vp.iter() {
    let u: f64 = rng.random();
    let x = -(1.0 - u).ln();
    totals[voc.nonterminal_map[&p.lhs]] += x;
    prob.push(x);
  }
  for (p, x) in vp.iter().zip(prob.iter_mut()) {
    *x /= totals[voc.nonterminal_map[&p.lhs]];
  }

  Ok(prob)
}

/// A diagnostic dump: counts and symbol tables as comments, followed by every
/// production in the textual format. A precision, as in `{:.5}`, applies to
/// the probabilities.
///
/// Without a precision the dump parses back to the same grammar. Rounded
/// probabilities may no longer sum to 1 within [`DEFAULT_TOLERANCE`]; read
/// such a dump with [`Pcfg::parse_with_tolerance`].
impl fmt::Display for Pcfg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let binary_count: usize = self.binary.iter().map(|b| b.len()).sum();
    let unary_count: usize = self.unary.iter().map(|u| u.len()).sum();

    writeln!(f, "//** nonterminals: {}", self.nonterminal_count())?;
    writeln!(f, "//** terminals: {}", self.terminal_count())?;
    writeln!(f, "//** binary productions: {}", binary_count)?;
    writeln!(f, "//** unary productions: {}", unary_count)?;

    write!(f, "//** nonterminal symbols:")?;
    for nt in self.nonterminals.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    write!(f, "//** terminal symbols:")?;
    for t in self.terminals.iter() {
      write!(f, " {}", t)?;
    }
    writeln!(f)?;

    for sp in self.vecsprod() {
      match f.precision() {
        Some(precision) => writeln!(f, "{:.*} {};", precision, sp.prob, sp.production)?,
        None => writeln!(f, "{}", sp)?,
      }
    }

    Ok(())
  }
}
