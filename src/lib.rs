#[macro_use]
extern crate lazy_static;

mod backtrace;
pub mod chart;
mod error;
pub mod grammar;
mod inside;
mod outside;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod train;
pub mod utils;
mod viterbi;

#[cfg(test)]
mod testing;

use crate::backtrace::add_node;
use crate::inside::fill_beta;
use crate::outside::fill_alpha;
use crate::viterbi::fill_delta;

pub use crate::chart::SpanTable;
pub use crate::error::PcfgError;
pub use crate::grammar::{random_probabilities, Pcfg, DEFAULT_TOLERANCE};
pub use crate::rules::{full_cnf, split, Production, ScoredProduction};
pub use crate::syntree::{ParseNode, ParseTree};
pub use crate::train::{TrainFailure, TrainOptions, TrainReport, TrainStatus};
pub use crate::utils::Err;

/// The most probable parse of a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
  /// Probability of the best derivation
  pub prob: f64,
  /// Probability of the sentence, summed over all derivations
  pub inside_prob: f64,
  /// `None` if the sentence has no derivation
  pub tree: Option<ParseTree>,
}

impl Pcfg {
  /// Probability of a sentence, from the inside probabilities.
  ///
  /// Panics if the grammar is uninitialized.
  pub fn prob<S: AsRef<str>>(&self, sentence: &[S]) -> Result<f64, PcfgError> {
    self.check();
    let w = self.encode(sentence)?;
    Ok(self.sentence_prob(&w))
  }

  /// The inside probabilities `β_j(p, q)` of every span of a sentence.
  pub fn inside_chart<S: AsRef<str>>(&self, sentence: &[S]) -> Result<SpanTable<f64>, PcfgError> {
    self.check();
    let w = self.encode(sentence)?;
    Ok(fill_beta(self, &w))
  }

  pub(crate) fn sentence_prob(&self, w: &[usize]) -> f64 {
    fill_beta(self, w)[(0, 0, w.len() - 1)]
  }

  /// Log-probability of a corpus of independent sentences. Fails if any
  /// sentence has probability zero, which includes underflow.
  pub fn log_prob<S: AsRef<str>>(&self, corpus: &[Vec<S>]) -> Result<f64, PcfgError> {
    self.check();
    if corpus.is_empty() {
      return Err(PcfgError::EmptyCorpus);
    }
    let encoded = corpus
      .iter()
      .map(|s| self.encode(s))
      .collect::<Result<Vec<_>, _>>()?;
    self.encoded_log_prob(&encoded)
  }

  pub(crate) fn encoded_log_prob(&self, corpus: &[Vec<usize>]) -> Result<f64, PcfgError> {
    let mut sum = 0.0;
    for (index, w) in corpus.iter().enumerate() {
      let prob = self.sentence_prob(w);
      let lp = prob.ln();
      if !lp.is_finite() {
        return Err(PcfgError::NonPositiveProbability { index, prob });
      }
      sum += lp;
    }
    Ok(sum)
  }

  /// Probability of a sentence computed from the outside probabilities at
  /// position `k`: `Σ_j α_j(k, k) P(N_j -> w_k)`. Equals [`Pcfg::prob`] for
  /// every `k`; it exists to cross-check the outside computation.
  pub fn prob_outside<S: AsRef<str>>(&self, sentence: &[S], k: usize) -> Result<f64, PcfgError> {
    self.check();
    let w = self.encode(sentence)?;
    if k >= w.len() {
      return Err(PcfgError::PositionOutOfRange {
        position: k,
        len: w.len(),
      });
    }
    let beta = fill_beta(self, &w);
    let alpha = fill_alpha(self, &w, &beta);
    Ok(
      (0..self.nonterminal_count())
        .map(|j| alpha[(j, k, k)] * self.unary_prob(j, w[k]))
        .sum(),
    )
  }

  /// Finds the most probable parse of a sentence (probabilistic CYK).
  pub fn cyk<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Parse, PcfgError> {
    self.check();
    let w = self.encode(sentence)?;
    let m = w.len();

    let inside_prob = fill_beta(self, &w)[(0, 0, m - 1)];
    let (delta, psi) = fill_delta(self, &w);
    let prob = delta[(0, 0, m - 1)];
    let tree = if prob > 0.0 {
      Some(add_node(self, &w, &psi, 0, 0, m - 1))
    } else {
      None
    };

    Ok(Parse {
      prob,
      inside_prob,
      tree,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{
    assert_close, astronomers, binary_x, brute_force, scenario_one, self_recursive,
  };

  fn grammar((vp, prob): (Vec<Production>, Vec<f64>)) -> Pcfg {
    Pcfg::new(&vp, &prob, DEFAULT_TOLERANCE).unwrap()
  }

  #[test]
  fn test_scenario_one() {
    let g = grammar(scenario_one());
    assert_eq!(g.prob(&["a", "b"]).unwrap(), 1.0);

    let parse = g.cyk(&["a", "b"]).unwrap();
    assert_eq!(parse.prob, 1.0);
    assert_eq!(parse.inside_prob, 1.0);
    let tree = parse.tree.unwrap();
    assert_eq!(tree.bracketed(), "S(A(a), B(b))");
    assert_eq!(tree.children()[0].prob(), Some(1.0));

    assert_eq!(g.prob(&["b", "a"]).unwrap(), 0.0);
    assert_eq!(g.prob(&["a"]).unwrap(), 0.0);
  }

  #[test]
  fn test_scenario_two() {
    let g = grammar(binary_x(0.25));
    let parse = g.cyk(&["x", "x", "x"]).unwrap();
    // both splits tie, the first one (k = 0) is kept
    assert_eq!(parse.prob, 0.25 * 0.25 * 0.75 * 0.75 * 0.75);
    assert_eq!(parse.tree.unwrap().bracketed(), "S(S(x), S(S(x), S(x)))");
    assert_close(parse.inside_prob, 2.0 * 0.25 * 0.25 * 0.75 * 0.75 * 0.75);
  }

  #[test]
  fn test_astronomers() {
    let g = grammar(astronomers());
    let x = ["astronomers", "saw", "stars", "with", "ears"];

    let prob = g.prob(&x).unwrap();
    assert_close(prob, 0.0015876);
    for k in 0..x.len() {
      assert_close(g.prob_outside(&x, k).unwrap(), prob);
    }

    let parse = g.cyk(&x).unwrap();
    assert_close(parse.prob, 0.0009072);
    assert_close(parse.inside_prob, prob);
    assert_eq!(
      parse.tree.unwrap().annotated(),
      "S 1.000000(NP 0.100000(astronomers), VP 0.700000(V 1.000000(saw), \
       NP 0.400000(NP 0.180000(stars), PP 1.000000(P 1.000000(with), NP 0.180000(ears)))))"
    );
  }

  #[test]
  fn test_inside_chart() {
    let g = grammar(scenario_one());
    let chart = g.inside_chart(&["a", "b"]).unwrap();
    assert_eq!(chart.len(), 2);
    assert_eq!(chart.symbols(), 3);
    assert_eq!(chart[(0, 0, 1)], 1.0);
    assert_eq!(chart[(1, 0, 0)], 1.0);
    assert_eq!(chart[(2, 0, 0)], 0.0);
    assert_eq!(chart.to_string().lines().count(), 3);
  }

  #[test]
  fn test_no_parse() {
    let g = grammar(astronomers());
    let parse = g.cyk(&["with", "stars"]).unwrap();
    assert_eq!(parse.prob, 0.0);
    assert_eq!(parse.inside_prob, 0.0);
    assert!(parse.tree.is_none());
  }

  #[test]
  fn test_against_brute_force() {
    for (g, sentences) in [
      (
        grammar(astronomers()),
        vec![
          vec!["astronomers", "saw", "stars"],
          vec!["astronomers", "saw", "stars", "with", "telescopes"],
          vec!["saw", "saw", "saw", "with", "saw"],
        ],
      ),
      (
        grammar(self_recursive(0.25)),
        vec![vec!["x"], vec!["y", "x", "x", "y", "x"], vec!["x", "x", "x", "x"]],
      ),
      (grammar(binary_x(0.6)), vec![vec!["x"; 5]]),
    ] {
      for sentence in sentences {
        let w = g.encode(&sentence).unwrap();
        let all = brute_force(&g, &w, 0, 0, w.len() - 1);
        assert!(!all.is_empty());

        assert_close(g.prob(&sentence).unwrap(), all.iter().sum());
        for k in 0..w.len() {
          assert_close(g.prob_outside(&sentence, k).unwrap(), all.iter().sum());
        }

        let parse = g.cyk(&sentence).unwrap();
        assert_close(parse.prob, all.iter().copied().fold(0.0, f64::max));
        assert_eq!(parse.tree.unwrap().span(), (0, w.len()));
      }
    }
  }

  #[test]
  fn test_tree_probability_is_product() {
    fn product(t: &ParseTree) -> f64 {
      t.prob().unwrap_or(1.0) * t.children().iter().map(product).product::<f64>()
    }

    let g = grammar(self_recursive(0.3));
    let parse = g.cyk(&["y", "x", "x", "y", "x", "x"]).unwrap();
    assert_close(product(parse.tree.as_ref().unwrap()), parse.prob);
  }

  #[test]
  fn test_sentence_errors() {
    let g = grammar(scenario_one());
    let empty: [&str; 0] = [];
    assert_eq!(g.prob(&empty).unwrap_err(), PcfgError::EmptySentence);
    assert_eq!(g.cyk(&empty).unwrap_err(), PcfgError::EmptySentence);
    assert_eq!(g.prob_outside(&empty, 0).unwrap_err(), PcfgError::EmptySentence);
    assert_eq!(g.inside_chart(&empty).unwrap_err(), PcfgError::EmptySentence);
    assert!(matches!(
      g.prob(&["a", "z"]),
      Err(PcfgError::UnknownTerminal { .. })
    ));
    assert!(matches!(
      g.cyk(&["S"]),
      Err(PcfgError::UnknownTerminal { .. })
    ));
    assert_eq!(
      g.prob_outside(&["a", "b"], 2).unwrap_err(),
      PcfgError::PositionOutOfRange { position: 2, len: 2 }
    );
  }

  #[test]
  fn test_log_prob() {
    let g = grammar(binary_x(0.25));
    let corpus = vec![vec!["x"], vec!["x", "x"]];
    assert_close(
      g.log_prob(&corpus).unwrap(),
      0.75f64.ln() + (0.25f64 * 0.75 * 0.75).ln(),
    );

    let empty: Vec<Vec<&str>> = Vec::new();
    assert_eq!(g.log_prob(&empty).unwrap_err(), PcfgError::EmptyCorpus);

    let g = grammar(scenario_one());
    assert_eq!(g.log_prob(&[vec!["a", "b"]]).unwrap(), 0.0);
    assert_eq!(
      g.log_prob(&[vec!["a", "b"], vec!["b", "a"]]).unwrap_err(),
      PcfgError::NonPositiveProbability { index: 1, prob: 0.0 }
    );
    assert_eq!(
      g.log_prob(&[vec![], vec!["a", "b"]]).unwrap_err(),
      PcfgError::EmptySentence
    );
  }

  #[test]
  #[should_panic(expected = "grammar is uninitialized")]
  fn test_uninitialized() {
    let _ = Pcfg::default().prob(&["a"]);
  }

  #[test]
  #[should_panic(expected = "grammar is uninitialized")]
  fn test_cleared() {
    let mut g = grammar(scenario_one());
    g.clear();
    let _ = g.cyk(&["a", "b"]);
  }
}
