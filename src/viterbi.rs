//! Viterbi (probabilistic CYK) parsing.
//!
//! `δ_i(p, q)` is the probability of the most likely derivation of
//! `w_p .. w_q` from `N_i`, and `ψ_i(p, q)` records the rule and split point
//! that achieve it.

use crate::chart::SpanTable;
use crate::grammar::Pcfg;

/// Best way to build `N_i` over `[p, q]`: `N_i -> N_left N_right` with the
/// left child over `[p, split]` and the right child over `[split + 1, q]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backtrace {
  pub left: usize,
  pub right: usize,
  pub split: usize,
}

/// Fills the max-probability table and its backtrace for the encoded
/// sentence `w`. Only a strictly greater product replaces the current best,
/// so among equal candidates the first one found is kept: rules in
/// `(left, right)` order, then split points left to right. Spans of length
/// one and spans no rule can build have no backtrace.
pub fn fill_delta(g: &Pcfg, w: &[usize]) -> (SpanTable<f64>, SpanTable<Option<Backtrace>>) {
  let n = g.nonterminal_count();
  let m = w.len();
  let mut delta = SpanTable::new(n, m, 0.0);
  let mut psi = SpanTable::new(n, m, None);

  for i in 0..n {
    for (p, &k) in w.iter().enumerate() {
      delta[(i, p, p)] = g.unary_prob(i, k);
    }
  }

  for dg in 1..m {
    for p in 0..m - dg {
      let q = p + dg;
      for i in 0..n {
        let mut max = 0.0;
        for (&(j, k), &prob) in g.binary[i].iter() {
          for r in p..q {
            let d = prob * delta[(j, p, r)] * delta[(k, r + 1, q)];
            if d > max {
              max = d;
              psi[(i, p, q)] = Some(Backtrace {
                left: j,
                right: k,
                split: r,
              });
            }
          }
        }
        delta[(i, p, q)] = max;
      }
    }
  }

  (delta, psi)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::DEFAULT_TOLERANCE;
  use crate::rules::Production;
  use crate::testing::{assert_close, astronomers, binary_x, brute_force, self_recursive};

  #[test]
  fn test_ties_keep_first_split() {
    // quarters are exact, so both splits of "x x x" give exactly p1^2 p2^3
    let (vp, prob) = binary_x(0.25);
    let g = Pcfg::new(&vp, &prob, DEFAULT_TOLERANCE).unwrap();
    let w = g.encode(&["x", "x", "x"]).unwrap();
    let (delta, psi) = fill_delta(&g, &w);

    assert_eq!(delta[(0, 0, 2)], 0.25 * 0.25 * 0.75 * 0.75 * 0.75);
    assert_eq!(
      psi[(0, 0, 2)],
      Some(Backtrace {
        left: 0,
        right: 0,
        split: 0
      })
    );
  }

  #[test]
  fn test_larger_split_wins() {
    // "a" only comes from B, so "a a b" is best split as (a a)(b)
    let vp = vec![
      Production::binary("S", "S", "S"),
      Production::binary("S", "B", "B"),
      Production::unary("S", "b"),
      Production::unary("S", "a"),
      Production::unary("B", "a"),
    ];
    let g = Pcfg::new(&vp, &[0.2, 0.5, 0.2, 0.1, 1.0], DEFAULT_TOLERANCE).unwrap();
    let w = g.encode(&["a", "a", "b"]).unwrap();
    let (delta, psi) = fill_delta(&g, &w);

    // split 1: S -> S S over (a a)(b) = 0.2 * 0.5 * 0.2
    // split 0: S -> S S over (a)(a b) = 0.2 * 0.1 * (0.2 * 0.1 * 0.2)
    assert_close(delta[(0, 0, 2)], 0.2 * 0.5 * 0.2);
    assert_eq!(psi[(0, 0, 2)].map(|bt| bt.split), Some(1));
    assert_eq!(
      psi[(0, 0, 1)],
      Some(Backtrace {
        left: 1,
        right: 1,
        split: 0
      })
    );
  }

  #[test]
  fn test_no_backtrace_without_parse() {
    let (vp, prob) = astronomers();
    let g = Pcfg::new(&vp, &prob, DEFAULT_TOLERANCE).unwrap();
    let w = g.encode(&["with", "with"]).unwrap();
    let (delta, psi) = fill_delta(&g, &w);
    for i in 0..g.nonterminal_count() {
      assert_eq!(delta[(i, 0, 1)], 0.0);
      assert_eq!(psi[(i, 0, 1)], None);
      assert_eq!(psi[(i, 0, 0)], None);
    }
  }

  #[test]
  fn test_delta_matches_brute_force() {
    let (vp, prob) = self_recursive(0.35);
    let g = Pcfg::new(&vp, &prob, DEFAULT_TOLERANCE).unwrap();
    let w = g.encode(&["y", "x", "y", "x", "x"]).unwrap();
    let (delta, _) = fill_delta(&g, &w);

    for i in 0..g.nonterminal_count() {
      for p in 0..w.len() {
        for q in p..w.len() {
          let best = brute_force(&g, &w, i, p, q)
            .into_iter()
            .fold(0.0, f64::max);
          assert_close(delta[(i, p, q)], best);
        }
      }
    }
  }
}
