//! Outside probabilities.
//!
//! `α_j(p, q)` is the probability of deriving `w_0 .. w_{p-1} N_j w_{q+1} .. w_{m-1}`
//! from the start symbol. The whole sentence has `α_0(0, m - 1) = 1` and
//! every other span is filled top-down from the spans enclosing it:
//!
//! ```text
//! α_j(p, q) = Σ_{f, g} Σ_{e = q + 1}^{m - 1} α_f(p, e) P(N_f -> N_j N_g) β_g(q + 1, e)
//!           + Σ_{f, g} Σ_{e = 0}^{p - 1}     α_f(e, q) P(N_f -> N_g N_j) β_g(e, p - 1)
//! ```
//!
//! A rule `N_f -> N_j N_j` contributes to both sums. The two terms belong to
//! different positions of `N_j` in the tree, so they are not a double count.

use crate::chart::SpanTable;
use crate::grammar::Pcfg;

/// Fills the outside table for the encoded sentence `w`, given its finished
/// inside table. `beta` is only read. An empty sentence gets an empty table.
pub fn fill_alpha(g: &Pcfg, w: &[usize], beta: &SpanTable<f64>) -> SpanTable<f64> {
  let n = g.nonterminal_count();
  let m = w.len();
  debug_assert_eq!(beta.len(), m, "inside table is for another sentence");
  if m == 0 {
    return SpanTable::new(n, 0, 0.0);
  }

  // (parent, sibling, prob) of every rule where j is the left or right child
  let mut as_left = vec![Vec::new(); n];
  let mut as_right = vec![Vec::new(); n];
  for f in 0..n {
    for (&(l, r), &prob) in g.binary[f].iter() {
      as_left[l].push((f, r, prob));
      as_right[r].push((f, l, prob));
    }
  }

  let mut alpha = SpanTable::new(n, m, 0.0);
  alpha[(0, 0, m - 1)] = 1.0;

  for dg in (0..m - 1).rev() {
    for p in 0..m - dg {
      let q = p + dg;
      for j in 0..n {
        let mut sum = 0.0;
        for &(f, sibling, prob) in as_left[j].iter() {
          for e in q + 1..m {
            sum += alpha[(f, p, e)] * prob * beta[(sibling, q + 1, e)];
          }
        }
        for &(f, sibling, prob) in as_right[j].iter() {
          for e in 0..p {
            sum += alpha[(f, e, q)] * prob * beta[(sibling, e, p - 1)];
          }
        }
        alpha[(j, p, q)] = sum;
      }
    }
  }

  alpha
}
