//! Simple recursive-descent parsing of grammar files.
//!
//! A grammar file is a list of scored productions, one `PROB LHS -> RHS... ;`
//! each, with `//` comments running to the end of the line:
//!
//! ```text
//! // prepositional phrases
//! 1.0 PP -> P NP;
//! 1.0 P -> with;
//! ```

use regex::Regex;
use std::str::FromStr;

use crate::grammar::{Pcfg, DEFAULT_TOLERANCE};
use crate::rules::{split, Production, ScoredProduction};
use crate::utils::Err;

/// Parses a grammar, checked with [`DEFAULT_TOLERANCE`]. The first left-hand
/// side is the start symbol.
impl FromStr for Pcfg {
  type Err = Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Pcfg::parse_with_tolerance(s, DEFAULT_TOLERANCE)
  }
}

impl Pcfg {
  /// Parses a grammar whose probabilities per nonterminal must sum to 1
  /// within `tol`.
  pub fn parse_with_tolerance(s: &str, tol: f64) -> Result<Self, Err> {
    let productions = parse_productions(s)?;
    let (vp, prob) = split(&productions);
    Ok(Pcfg::new(&vp, &prob, tol)?)
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(m) = re.find(s) {
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, s).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Skips whitespace and comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(?:\s+|//[^\n]*)*");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

fn parse_prob(s: &str) -> ParseResult<'_, f64> {
  regex_static!(PROB, r"[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?");
  let (number, s) =
    needed_re(&PROB, s).map_err(|e| -> Err { format!("probability: {}", e).into() })?;
  let prob = number
    .parse::<f64>()
    .map_err(|e| -> Err { format!("probability {}: {}", number, e).into() })?;
  Ok((prob, s))
}

/// A symbol is anything up to whitespace or `;`
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r"[^\s;]+");
  let (name, rest) =
    needed_re(&NAME, s).map_err(|e| -> Err { format!("name: {}", e).into() })?;
  if name.contains("->") || name.starts_with("//") {
    return Err(format!("name: unexpected {} at {}", name, s).into());
  }
  Ok((name, rest))
}

/// `PROB LHS -> RHS... ;`
fn parse_scored_production(s: &str) -> ParseResult<'_, ScoredProduction> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "->");

  let (prob, s) = parse_prob(s)?;
  let s = skip_whitespace(s);
  let (lhs, s) = parse_name(s).map_err(|e| -> Err { format!("lhs: {}", e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&ARROW, s).map_err(|e| -> Err { format!("arrow: {}", e).into() })?;

  let mut rhs = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(';', rem) {
      rem = s;
      break;
    }
    if rem.is_empty() {
      return Err(format!("missing ; after {} -> {}", lhs, rhs.join(" ")).into());
    }
    let (name, s) = parse_name(rem).map_err(|e| -> Err { format!("rhs: {}", e).into() })?;
    rhs.push(name.to_string());
    rem = s;
  }

  let production = Production {
    lhs: lhs.to_string(),
    rhs,
  };
  Ok((ScoredProduction::new(production, prob), rem))
}

/// Parses every scored production in `s`, in order. Nothing about CNF or
/// normalization is checked here.
pub fn parse_productions(s: &str) -> Result<Vec<ScoredProduction>, Err> {
  let mut productions = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok(productions);
    }
    let (sp, s) = parse_scored_production(rem)?;
    productions.push(sp);
    rem = s;
  }
}
