//! Errors raised while setting up a grammar or a query.
//!
//! Numerical trouble during training is not an error, see
//! [`TrainFailure`](crate::train::TrainFailure).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PcfgError {
  #[error("tolerance must not be negative, got {0}")]
  NegativeTolerance(f64),

  #[error("{productions} productions but {probabilities} probabilities")]
  LengthMismatch {
    productions: usize,
    probabilities: usize,
  },

  #[error("grammar has no productions")]
  NoProductions,

  #[error("grammar has no terminals")]
  NoTerminals,

  /// Right-hand side is neither two nonterminals nor one terminal.
  #[error("production is not in Chomsky normal form: {production}")]
  NotCnf { production: String },

  /// A binary right-hand side names a symbol that is never a left-hand side.
  #[error("undeclared nonterminal {symbol} in {production}")]
  UndeclaredNonterminal { symbol: String, production: String },

  /// A unary right-hand side names a nonterminal.
  #[error("symbol {symbol} is used both as a nonterminal and as a terminal")]
  AmbiguousSymbol { symbol: String },

  #[error("duplicate production {production}")]
  DuplicateProduction { production: String },

  #[error("invalid probability {prob} for {production}")]
  InvalidProbability { production: String, prob: f64 },

  #[error("probabilities of {nonterminal} sum to {sum}, not 1")]
  NotNormalized { nonterminal: String, sum: f64 },

  #[error("empty sentence")]
  EmptySentence,

  #[error("unknown terminal {symbol}")]
  UnknownTerminal { symbol: String },

  #[error("empty corpus")]
  EmptyCorpus,

  /// The sentence at `index` has probability zero, or it underflowed.
  #[error("sentence {index} has non-positive probability {prob}")]
  NonPositiveProbability { index: usize, prob: f64 },

  #[error("position {position} is outside a sentence of length {len}")]
  PositionOutOfRange { position: usize, len: usize },

  #[error("eps must be in [0, 1), got {0}")]
  InvalidEpsilon(f64),

  #[error("accuracy must be positive, got {0}")]
  InvalidAccuracy(f64),
}
