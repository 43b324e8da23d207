//! Inside probabilities.
//!
//! `β_j(p, q)` is the probability that `N_j` derives `w_p .. w_q`:
//!
//! ```text
//! β_j(p, p) = P(N_j -> w_p)
//! β_j(p, q) = Σ_{r, s} Σ_{d = p}^{q - 1} P(N_j -> N_r N_s) β_r(p, d) β_s(d + 1, q)
//! ```
//!
//! No scaling is applied, so long sentences or small rule probabilities can
//! underflow to zero.

use crate::chart::SpanTable;
use crate::grammar::Pcfg;

/// Fills the inside table bottom-up for the encoded sentence `w`. The
/// sentence probability is `β[(0, 0, w.len() - 1)]`.
pub fn fill_beta(g: &Pcfg, w: &[usize]) -> SpanTable<f64> {
  let n = g.nonterminal_count();
  let m = w.len();
  let mut beta = SpanTable::new(n, m, 0.0);

  for j in 0..n {
    for (p, &k) in w.iter().enumerate() {
      beta[(j, p, p)] = g.unary_prob(j, k);
    }
  }

  for dg in 1..m {
    for p in 0..m - dg {
      let q = p + dg;
      for j in 0..n {
        let mut sum = 0.0;
        for (&(r, s), &prob) in g.binary[j].iter() {
          for d in p..q {
            sum += prob * beta[(r, p, d)] * beta[(s, d + 1, q)];
          }
        }
        beta[(j, p, q)] = sum;
      }
    }
  }

  beta
}
