use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// True if a nonterminal's total rule mass is within `tol` of 1.
pub fn is_normalized(sum: f64, tol: f64) -> bool {
  (sum - 1.0).abs() <= tol
}

/// Takes a list where each element is a set of choices, and returns every way
/// of picking one element from each set. Will clone the elements. The first
/// set varies fastest.
///
/// ```
/// let v = vec![
///   vec!["A", "B"],
///   vec!["A", "B"],
/// ];
///
/// assert_eq!(pcfg::utils::combinations(&v), vec![
///   vec!["A", "A"],
///   vec!["B", "A"],
///   vec!["A", "B"],
///   vec!["B", "B"],
/// ]);
/// ```
pub fn combinations<T>(list: &[Vec<T>]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if list.is_empty() {
    Vec::new()
  } else if list.len() == 1 {
    list[0].iter().map(|e| vec![e.clone()]).collect()
  } else {
    let (head, tail) = list.split_at(1);
    let head = &head[0];

    combinations(tail)
      .into_iter()
      .flat_map(|subseq| {
        // prepend every element of the head to every possible subseq
        head.iter().map(move |v| {
          let mut newseq = subseq.clone();
          newseq.insert(0, v.clone());
          newseq
        })
      })
      .collect()
  }
}
