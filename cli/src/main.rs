use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pcfg::{Err, Pcfg, TrainOptions, TrainStatus, DEFAULT_TOLERANCE};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads a grammar from FILE, then the sentences typed on stdin, and prints
their probability and most probable parse.

Options:
  -h, --help             Print this message
  -c, --chart            Print the inside chart of each sentence
  -d, --dump             Print the grammar before reading sentences
  -t, --train CORPUS     Re-estimate the grammar on CORPUS, one sentence per line
  -a, --accuracy X       Training stops when the log-likelihood improves by less (1e-8)
  -m, --max-iter N       Maximum number of training iterations (100)
      --tolerance X      Normalization tolerance for loading FILE and for training
  -p, --prune EPS        Drop productions with probability <= EPS after training

Set RUST_LOG=debug to follow training.",
    prog_name
  )
}

/// Whitespace-separated terminals of every non-empty line.
fn read_corpus(filename: &str) -> Result<Vec<Vec<String>>, Err> {
  Ok(
    fs::read_to_string(filename)?
      .lines()
      .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
      .filter(|s| !s.is_empty())
      .collect(),
  )
}

fn train(g: &mut Pcfg, corpus_file: &str, options: &TrainOptions) -> Result<(), Err> {
  let corpus = read_corpus(corpus_file)?;
  info!(sentences = corpus.len(), file = corpus_file, "training");

  let report = g.inside_outside(&corpus, options)?;
  match &report.status {
    TrainStatus::Converged => println!("converged after {} iterations", report.iterations),
    TrainStatus::MaxIterExceeded => println!("stopped after {} iterations", report.iterations),
    TrainStatus::Failed(reason) => println!(
      "training failed at iteration {}: {}",
      report.iterations, reason
    ),
  }
  println!("log-likelihood: {}", report.log_prob);
  Ok(())
}

fn parse(g: &Pcfg, sentence: &str, print_chart: bool) -> Result<(), Err> {
  let sentence = sentence.split_whitespace().collect::<Vec<_>>();
  if sentence.is_empty() {
    return Ok(());
  }

  if print_chart {
    println!("chart:\n{}\n", g.inside_chart(&sentence)?);
  }

  let parse = g.cyk(&sentence)?;
  println!("probability: {:e}", parse.inside_prob);
  match parse.tree {
    Some(tree) => {
      println!("best parse: {:e}", parse.prob);
      println!("{}", tree.annotated());
      println!("{}", tree);
    }
    None => println!("no parse"),
  }
  println!();

  Ok(())
}

struct Args {
  filename: String,
  print_chart: bool,
  dump: bool,
  corpus: Option<String>,
  train_options: TrainOptions,
  tolerance: f64,
  prune: Option<f64>,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "pcfg"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_default();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut print_chart = false;
    let mut dump = false;
    let mut corpus: Option<String> = None;
    let mut train_options = TrainOptions::default();
    let mut tolerance = DEFAULT_TOLERANCE;
    let mut prune: Option<f64> = None;

    while let Some(o) = iter.next() {
      let mut value = |name: &str| {
        iter
          .next()
          .ok_or_else(|| Self::make_error_message(&format!("{} needs a value", name), &prog_name))
      };

      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-d" || o == "--dump" {
        dump = true;
      } else if o == "-t" || o == "--train" {
        corpus = Some(value(&o)?);
      } else if o == "-a" || o == "--accuracy" {
        train_options = train_options.accuracy(Self::number(&value(&o)?, &prog_name)?);
      } else if o == "-m" || o == "--max-iter" {
        train_options = train_options.max_iter(Self::number(&value(&o)?, &prog_name)?);
      } else if o == "--tolerance" {
        tolerance = Self::number(&value(&o)?, &prog_name)?;
      } else if o == "-p" || o == "--prune" {
        prune = Some(Self::number(&value(&o)?, &prog_name)?);
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        print_chart,
        dump,
        corpus,
        train_options: train_options.tolerance(tolerance),
        tolerance,
        prune,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }

  fn number<T: std::str::FromStr>(s: &str, prog_name: &str) -> Result<T, String> {
    s.parse()
      .map_err(|_| Self::make_error_message(&format!("{} is not a valid number", s), prog_name))
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let mut g = Pcfg::read_from_file_with_tolerance(&opts.filename, opts.tolerance)?;
  info!(
    file = %opts.filename,
    nonterminals = g.nonterminal_count(),
    terminals = g.terminal_count(),
    "grammar loaded"
  );

  if let Some(corpus) = &opts.corpus {
    train(&mut g, corpus, &opts.train_options)?;
  }
  if let Some(eps) = opts.prune {
    g.remove_productions(eps)?;
  }
  if opts.dump {
    println!("{}", g);
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        // unknown words are reported, not fatal
        if let Err(e) = parse(&g, input.trim(), opts.print_chart) {
          println!("error: {}\n", e);
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
