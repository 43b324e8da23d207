//! Fixtures and brute-force derivation enumeration shared by the unit tests.

use crate::grammar::Pcfg;
use crate::rules::Production;
use crate::utils::combinations;

/// A node `(nonterminal, p, q)` of a derivation.
pub type Node = (usize, usize, usize);

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
  assert!(
    (actual - expected).abs() <= 1e-10 * actual.abs().max(expected.abs()),
    "{} is not close to {}",
    actual,
    expected
  );
}

/// `S -> A B`, `A -> a`, `B -> b`, all with probability 1.
pub fn scenario_one() -> (Vec<Production>, Vec<f64>) {
  (
    vec![
      Production::binary("S", "A", "B"),
      Production::unary("A", "a"),
      Production::unary("B", "b"),
    ],
    vec![1.0, 1.0, 1.0],
  )
}

/// `S -> S S` with probability `p`, `S -> x` with `1 - p`.
pub fn binary_x(p: f64) -> (Vec<Production>, Vec<f64>) {
  (
    vec![Production::binary("S", "S", "S"), Production::unary("S", "x")],
    vec![p, 1.0 - p],
  )
}

/// Two nonterminals that both rewrite to themselves twice; `p < 0.8`.
pub fn self_recursive(p: f64) -> (Vec<Production>, Vec<f64>) {
  (
    vec![
      Production::binary("S", "S", "S"),
      Production::binary("S", "A", "S"),
      Production::unary("S", "x"),
      Production::binary("A", "A", "A"),
      Production::unary("A", "y"),
      Production::unary("A", "x"),
    ],
    vec![p, 0.2, 0.8 - p, 0.3, 0.5, 0.2],
  )
}

/// The prepositional phrase attachment grammar of Manning & Schütze, ch. 11.
pub fn astronomers() -> (Vec<Production>, Vec<f64>) {
  (
    vec![
      Production::binary("S", "NP", "VP"),
      Production::binary("NP", "NP", "PP"),
      Production::binary("PP", "P", "NP"),
      Production::binary("VP", "V", "NP"),
      Production::binary("VP", "VP", "PP"),
      Production::unary("P", "with"),
      Production::unary("V", "saw"),
      Production::unary("NP", "astronomers"),
      Production::unary("NP", "ears"),
      Production::unary("NP", "saw"),
      Production::unary("NP", "stars"),
      Production::unary("NP", "telescopes"),
    ],
    vec![1.0, 0.4, 1.0, 0.7, 0.3, 1.0, 1.0, 0.1, 0.18, 0.04, 0.18, 0.1],
  )
}

/// Every derivation of `w[p..=q]` from nonterminal `j`, as its probability
/// and the nonterminal nodes it uses.
pub fn derivations(g: &Pcfg, w: &[usize], j: usize, p: usize, q: usize) -> Vec<(f64, Vec<Node>)> {
  if p == q {
    let prob = g.unary_prob(j, w[p]);
    return if prob > 0.0 {
      vec![(prob, vec![(j, p, q)])]
    } else {
      Vec::new()
    };
  }

  let mut out = Vec::new();
  for (&(r, s), &prob) in g.binary[j].iter() {
    for d in p..q {
      let left = derivations(g, w, r, p, d);
      let right = derivations(g, w, s, d + 1, q);
      for pair in combinations(&[left, right]) {
        let mut nodes = vec![(j, p, q)];
        nodes.extend(pair[0].1.iter().copied());
        nodes.extend(pair[1].1.iter().copied());
        out.push((prob * pair[0].0 * pair[1].0, nodes));
      }
    }
  }
  out
}

/// Probabilities of every derivation of `w[p..=q]` from nonterminal `j`.
pub fn brute_force(g: &Pcfg, w: &[usize], j: usize, p: usize, q: usize) -> Vec<f64> {
  derivations(g, w, j, p, q)
    .into_iter()
    .map(|(prob, _)| prob)
    .collect()
}
