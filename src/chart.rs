use std::fmt;
use std::ops::{Index, IndexMut};

/// A table holding one value per nonterminal and per span `[p, q]`,
/// `0 <= p <= q < len`, of a sentence. The spans of a symbol are laid out
/// row by row in one flat vector: row `p` holds `q = p..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanTable<T> {
  symbols: usize,
  len: usize,
  cells: usize,
  data: Vec<T>,
}

impl<T: Clone> SpanTable<T> {
  pub fn new(symbols: usize, len: usize, fill: T) -> Self {
    let cells = len * (len + 1) / 2;
    Self {
      symbols,
      len,
      cells,
      data: vec![fill; symbols * cells],
    }
  }
}

impl<T> SpanTable<T> {
  /// Sentence length
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn symbols(&self) -> usize {
    self.symbols
  }

  fn offset(&self, j: usize, p: usize, q: usize) -> usize {
    debug_assert!(j < self.symbols, "symbol {} out of range", j);
    debug_assert!(p <= q && q < self.len, "bad span [{}, {}]", p, q);
    // rows 0..p hold len + (len - 1) + ... + (len - p + 1) cells
    j * self.cells + p * (2 * self.len + 1 - p) / 2 + (q - p)
  }
}

/// Indexed by `(symbol, p, q)`
impl<T> Index<(usize, usize, usize)> for SpanTable<T> {
  type Output = T;

  fn index(&self, (j, p, q): (usize, usize, usize)) -> &T {
    &self.data[self.offset(j, p, q)]
  }
}

impl<T> IndexMut<(usize, usize, usize)> for SpanTable<T> {
  fn index_mut(&mut self, (j, p, q): (usize, usize, usize)) -> &mut T {
    let offset = self.offset(j, p, q);
    &mut self.data[offset]
  }
}

impl fmt::Display for SpanTable<f64> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for d in 0..self.len {
      for p in 0..self.len - d {
        let q = p + d;
        write!(f, "{}..{}:", p, q + 1)?;
        for j in 0..self.symbols {
          write!(f, " {:e}", self[(j, p, q)])?;
        }
        writeln!(f)?;
      }
    }
    Ok(())
  }
}
