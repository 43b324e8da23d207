use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pcfg::{Pcfg, TrainOptions};

const GRAMMAR_SRC: &str = "
  1.0 S -> NP VP;
  0.4 NP -> NP PP;
  1.0 PP -> P NP;
  0.7 VP -> V NP;
  0.3 VP -> VP PP;
  1.0 P -> with;
  1.0 V -> saw;
  0.1 NP -> astronomers;
  0.18 NP -> ears;
  0.04 NP -> saw;
  0.18 NP -> stars;
  0.1 NP -> telescopes;
";

fn words(s: &str) -> Vec<&str> {
  s.split(' ').collect()
}

fn criterion_benchmark(c: &mut Criterion) {
  let grammar = GRAMMAR_SRC.parse::<Pcfg>().unwrap();
  let short_input = words("astronomers saw stars with ears");
  let long_input = words(
    "astronomers saw stars with ears with telescopes with stars with ears with telescopes",
  );
  let corpus = vec![
    words("astronomers saw stars with ears"),
    words("astronomers saw telescopes with stars"),
    words("astronomers saw ears with telescopes with stars"),
  ];

  c.bench_function("prob short", |b| {
    b.iter(|| black_box(&grammar).prob(black_box(&short_input)).unwrap())
  });

  c.bench_function("prob long", |b| {
    b.iter(|| black_box(&grammar).prob(black_box(&long_input)).unwrap())
  });

  c.bench_function("cyk long", |b| {
    b.iter(|| black_box(&grammar).cyk(black_box(&long_input)).unwrap())
  });

  let options = TrainOptions::default().max_iter(3);
  c.bench_function("inside-outside 3 iterations", |b| {
    b.iter(|| {
      let mut g = grammar.clone();
      g.inside_outside(black_box(&corpus), &options).unwrap()
    })
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
