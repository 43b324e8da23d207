//! Inside-outside (EM) re-estimation of rule probabilities.
//!
//! Each iteration collects, for every sentence, the expected number of uses
//! of every rule and the expected number of spans every nonterminal heads,
//! each normalized by the sentence probability:
//!
//! ```text
//! f_j(r, s) = Σ_{p<q} Σ_{d=p}^{q-1} α_j(p, q) P(N_j -> N_r N_s) β_r(p, d) β_s(d + 1, q) / P(w)
//! g_j(k)    = Σ_{h: w_h = k} α_j(h, h) β_j(h, h) / P(w)
//! h_j       = Σ_{p<=q} α_j(p, q) β_j(p, q) / P(w)
//! ```
//!
//! and then sets `P(N_j -> N_r N_s) = Σ f_j(r, s) / Σ h_j` and
//! `P(N_j -> w_k) = Σ g_j(k) / Σ h_j`, sums taken over the corpus.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::PcfgError;
use crate::grammar::{Binary, Pcfg, Unary, DEFAULT_TOLERANCE};
use crate::inside::fill_beta;
use crate::outside::fill_alpha;

/// Sentence probabilities and occupancies at or below this are treated as
/// zero when used as a divisor.
const MIN_DENOMINATOR: f64 = 1e-50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
  /// Training stops once an iteration improves the corpus log-likelihood by
  /// less than this. Must be positive.
  pub accuracy: f64,
  /// Normalization tolerance the re-estimated grammar must satisfy.
  pub tolerance: f64,
  pub max_iter: usize,
}

impl Default for TrainOptions {
  fn default() -> Self {
    Self {
      accuracy: 1e-8,
      tolerance: DEFAULT_TOLERANCE,
      max_iter: 100,
    }
  }
}

impl TrainOptions {
  pub fn accuracy(mut self, accuracy: f64) -> Self {
    self.accuracy = accuracy;
    self
  }

  pub fn tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = tolerance;
    self
  }

  pub fn max_iter(mut self, max_iter: usize) -> Self {
    self.max_iter = max_iter;
    self
  }
}

/// Why a training run stopped early. Apart from the initial check, every
/// failure rolls the grammar back to the last accepted iteration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainFailure {
  #[error("some sentence of the corpus has probability zero under the initial grammar")]
  InitialLogProbNotFinite,
  #[error("probability of sentence {sentence} is too small to normalize by")]
  SentenceProbTooSmall { sentence: usize },
  #[error("expected occupancy of nonterminal {nonterminal} is too small to divide by")]
  OccupancyTooSmall { nonterminal: String },
  #[error("re-estimated probabilities are not normalized")]
  ProbabilitiesInvalid,
  #[error("log-likelihood of the re-estimated grammar is not finite")]
  LogProbNotFinite,
  #[error("log-likelihood decreased from {before} to {after}")]
  LogProbDecreased { before: f64, after: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainStatus {
  Converged,
  MaxIterExceeded,
  Failed(TrainFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
  pub status: TrainStatus,
  /// Iterations started, including a failed last one.
  pub iterations: usize,
  /// Corpus log-likelihood under the grammar as left by training.
  pub log_prob: f64,
  /// Log-likelihood of the initial grammar, then of every accepted iteration.
  pub history: Vec<f64>,
}

/// Expected counts summed over the corpus. Rule counts are laid out in the
/// iteration order of the grammar's rule maps, so they can be zipped back.
struct Expectations {
  binary: Vec<Vec<f64>>,
  unary: Vec<Vec<f64>>,
  occupancy: Vec<f64>,
}

impl Expectations {
  fn new(g: &Pcfg) -> Self {
    Self {
      binary: g.binary.iter().map(|b| vec![0.0; b.len()]).collect(),
      unary: g.unary.iter().map(|u| vec![0.0; u.len()]).collect(),
      occupancy: vec![0.0; g.nonterminal_count()],
    }
  }

  /// Adds the counts of sentence number `index`. Span positions are summed
  /// out right away, nothing larger than the rule tables is kept.
  fn add_sentence(&mut self, g: &Pcfg, w: &[usize], index: usize) -> Result<(), TrainFailure> {
    let m = w.len();
    let beta = fill_beta(g, w);
    let alpha = fill_alpha(g, w, &beta);

    let total = beta[(0, 0, m - 1)];
    if total <= MIN_DENOMINATOR {
      return Err(TrainFailure::SentenceProbTooSmall { sentence: index });
    }

    for j in 0..g.nonterminal_count() {
      for (count, (&(r, s), &prob)) in self.binary[j].iter_mut().zip(g.binary[j].iter()) {
        let mut sum = 0.0;
        for p in 0..m {
          for q in p + 1..m {
            let outside = alpha[(j, p, q)];
            if outside == 0.0 {
              continue;
            }
            for d in p..q {
              sum += outside * prob * beta[(r, p, d)] * beta[(s, d + 1, q)];
            }
          }
        }
        *count += sum / total;
      }

      for (count, &k) in self.unary[j].iter_mut().zip(g.unary[j].keys()) {
        let sum: f64 = w
          .iter()
          .enumerate()
          .filter(|&(_, &wh)| wh == k)
          .map(|(h, _)| alpha[(j, h, h)] * beta[(j, h, h)])
          .sum();
        *count += sum / total;
      }

      let mut sum = 0.0;
      for p in 0..m {
        for q in p..m {
          sum += alpha[(j, p, q)] * beta[(j, p, q)];
        }
      }
      self.occupancy[j] += sum / total;
    }

    Ok(())
  }
}

impl Pcfg {
  /// Re-estimates the rule probabilities on `corpus` with the inside-outside
  /// algorithm. Only the probabilities change, the rule set is kept.
  ///
  /// Invalid arguments are errors. Numerical breakdowns during training are
  /// reported in the returned [`TrainReport`], and leave the grammar as it
  /// was after the last accepted iteration.
  pub fn inside_outside<S: AsRef<str>>(
    &mut self,
    corpus: &[Vec<S>],
    options: &TrainOptions,
  ) -> Result<TrainReport, PcfgError> {
    self.check();
    if corpus.is_empty() {
      return Err(PcfgError::EmptyCorpus);
    }
    let encoded = corpus
      .iter()
      .map(|s| self.encode(s))
      .collect::<Result<Vec<_>, _>>()?;
    if !(options.accuracy > 0.0) {
      return Err(PcfgError::InvalidAccuracy(options.accuracy));
    }
    if options.tolerance < 0.0 {
      return Err(PcfgError::NegativeTolerance(options.tolerance));
    }

    let mut log_prob = match self.encoded_log_prob(&encoded) {
      Ok(lp) => lp,
      Err(_) => {
        warn!("initial grammar gives a sentence probability zero");
        return Ok(TrainReport {
          status: TrainStatus::Failed(TrainFailure::InitialLogProbNotFinite),
          iterations: 0,
          log_prob: f64::NEG_INFINITY,
          history: Vec::new(),
        });
      }
    };
    let mut history = vec![log_prob];
    let mut iterations = 0;

    let status = loop {
      if iterations >= options.max_iter {
        info!(iterations, log_prob, "iteration limit reached");
        break TrainStatus::MaxIterExceeded;
      }
      iterations += 1;

      let saved: (Vec<Binary>, Vec<Unary>) = (self.binary.clone(), self.unary.clone());
      match self.iterate(&encoded, options.tolerance, log_prob) {
        Ok(next) => {
          let improvement = next - log_prob;
          debug!(iteration = iterations, log_prob = next, improvement, "iteration accepted");
          log_prob = next;
          history.push(next);
          if improvement < options.accuracy {
            info!(iterations, log_prob, "training converged");
            break TrainStatus::Converged;
          }
        }
        Err(failure) => {
          warn!(iteration = iterations, reason = %failure, "training failed, rolling back");
          (self.binary, self.unary) = saved;
          break TrainStatus::Failed(failure);
        }
      }
    };

    Ok(TrainReport {
      status,
      iterations,
      log_prob,
      history,
    })
  }

  /// One E-step and M-step. Returns the new corpus log-likelihood, which
  /// must not be below `before`. May leave the tables half updated on error.
  fn iterate(&mut self, corpus: &[Vec<usize>], tol: f64, before: f64) -> Result<f64, TrainFailure> {
    let mut counts = Expectations::new(self);
    for (index, w) in corpus.iter().enumerate() {
      counts.add_sentence(self, w, index)?;
    }

    for j in 0..self.nonterminal_count() {
      let den = counts.occupancy[j];
      if den <= MIN_DENOMINATOR {
        return Err(TrainFailure::OccupancyTooSmall {
          nonterminal: self.nonterminal_name(j).to_string(),
        });
      }
      for (prob, &num) in self.binary[j].values_mut().zip(counts.binary[j].iter()) {
        *prob = num / den;
      }
      for (prob, &num) in self.unary[j].values_mut().zip(counts.unary[j].iter()) {
        *prob = num / den;
      }
    }

    if !self.probabilities_valid(tol) {
      return Err(TrainFailure::ProbabilitiesInvalid);
    }
    let after = self
      .encoded_log_prob(corpus)
      .map_err(|_| TrainFailure::LogProbNotFinite)?;
    if after < before {
      return Err(TrainFailure::LogProbDecreased { before, after });
    }
    Ok(after)
  }
}
