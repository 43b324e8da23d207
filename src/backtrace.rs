//! Rebuilds the Viterbi parse from its backtrace table.

use crate::chart::SpanTable;
use crate::grammar::Pcfg;
use crate::syntree::{Constituent, ParseNode, ParseTree, SynTree, Word};
use crate::viterbi::Backtrace;

/// Builds the subtree headed by `N_i` over `[p, q]`. Every span is visited
/// once, and the tree owns copies of the symbol names, so it outlives `psi`.
///
/// `N_i` must have a positive Viterbi probability over `[p, q]`, which
/// guarantees a backtrace for every multi-word span below it.
pub fn add_node(
  g: &Pcfg,
  w: &[usize],
  psi: &SpanTable<Option<Backtrace>>,
  i: usize,
  p: usize,
  q: usize,
) -> ParseTree {
  let symbol = g.nonterminal_name(i).to_string();

  if p == q {
    let k = w[p];
    return SynTree::Branch(
      Constituent {
        value: ParseNode {
          symbol,
          prob: g.unary_prob(i, k),
        },
        span: (p, p + 1),
      },
      vec![SynTree::Leaf(Word {
        value: g.terminal_name(k).to_string(),
        span: (p, p + 1),
      })],
    );
  }

  let bt = psi[(i, p, q)].expect("no backtrace for a span with positive probability");
  let children = vec![
    add_node(g, w, psi, bt.left, p, bt.split),
    add_node(g, w, psi, bt.right, bt.split + 1, q),
  ];

  SynTree::Branch(
    Constituent {
      value: ParseNode {
        symbol,
        prob: g.binary_prob(i, bt.left, bt.right),
      },
      span: (p, q + 1),
    },
    children,
  )
}
