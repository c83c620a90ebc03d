use std::env;
use std::process::{self, Command};
use std::time::{Duration, Instant};

use bsp_align::policies::{LcsScoring, PairwiseScoring};
use bsp_align::{bitops, AlignError, BspScheduler, SchedulerBuilder};

const DEFAULT_WARMUP_S: f64 = 2.0;

const USAGE_EXIT: i32 = 2;

fn main() {
    let code = {
        let _teardown = bitops::exit_guard();
        cli(env::args().skip(1))
    };
    process::exit(code);
}

fn cli<I: Iterator<Item = String>>(args: I) -> i32 {
    let mode = match Mode::parse(args) {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("bsp_timer: {err}");
            Mode::print_help();
            return USAGE_EXIT;
        }
    };

    match mode {
        Mode::Help => {
            Mode::print_help();
            0
        }
        Mode::Exec { warmup, argv } => exec(warmup, &argv),
        Mode::Align(opts) => match align(&opts) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("bsp_timer: {err}");
                1
            }
        },
    }
}

enum Mode {
    Help,
    /// Time an external command, optionally after warming up the pool.
    Exec {
        warmup: Option<f64>,
        argv: Vec<String>,
    },
    /// Time a scheduled alignment of two literal sequences.
    Align(AlignOptions),
}

#[derive(Copy, Clone)]
enum PolicyKind {
    Lcs,
    Pairwise,
}

impl PolicyKind {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "lcs" => Ok(Self::Lcs),
            "pairwise" => Ok(Self::Pairwise),
            other => Err(format!("unknown policy '{other}'")),
        }
    }
}

struct AlignOptions {
    left: String,
    top: String,
    workers: Option<usize>,
    warmup: Option<f64>,
    policy: PolicyKind,
    verify: bool,
}

impl Mode {
    fn parse<I, T>(args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.map(Into::into).collect();
        match args.first().map(String::as_str) {
            None => Err("missing command".to_string()),
            Some("-h") | Some("--help") => Ok(Mode::Help),
            Some("--align") => Self::parse_align(&args[1..]),
            Some("-w") => {
                // `-w` takes an optional positive duration before the command.
                let (warmup, rest) = match args.get(1).and_then(|s| s.parse::<f64>().ok()) {
                    Some(secs) if secs > 0.0 => (secs, &args[2..]),
                    _ => (DEFAULT_WARMUP_S, &args[1..]),
                };
                if rest.is_empty() {
                    return Err("missing command after -w".to_string());
                }
                Ok(Mode::Exec {
                    warmup: Some(warmup),
                    argv: rest.to_vec(),
                })
            }
            Some(_) => Ok(Mode::Exec {
                warmup: None,
                argv: args,
            }),
        }
    }

    fn parse_align(args: &[String]) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut workers = None;
        let mut warmup = None;
        let mut policy = PolicyKind::Lcs;
        let mut verify = false;

        let mut it = args.iter();
        while let Some(arg) = it.next() {
            let mut value = |name: &str| {
                it.next()
                    .cloned()
                    .ok_or_else(|| format!("missing value after {name}"))
            };
            match arg.as_str() {
                "--workers" => {
                    workers = Some(
                        value("--workers")?.parse::<usize>().map_err(|_| {
                            "worker count must be a non-negative integer".to_string()
                        })?,
                    )
                }
                "--warmup" => {
                    warmup = Some(
                        value("--warmup")?
                            .parse::<f64>()
                            .map_err(|_| "warmup must be a number of seconds".to_string())?,
                    )
                }
                "--policy" => policy = PolicyKind::from_str(&value("--policy")?)?,
                "--verify" => verify = true,
                other if other.starts_with("--") => {
                    return Err(format!("unrecognized argument '{other}'"))
                }
                other => positional.push(other.to_string()),
            }
        }

        let mut positional = positional.into_iter();
        match (positional.next(), positional.next(), positional.next()) {
            (Some(left), Some(top), None) => Ok(Mode::Align(AlignOptions {
                left,
                top,
                workers,
                warmup,
                policy,
                verify,
            })),
            (_, _, Some(extra)) => Err(format!("unexpected argument '{extra}'")),
            _ => Err("--align needs two sequences".to_string()),
        }
    }

    fn print_help() {
        println!(
            "\
Usage: bsp_timer [-w [seconds]] <command> [args...]
       bsp_timer --align <left> <top> [options]

Timing mode runs <command>, reports the elapsed wall-clock time and exits with
the command's own status. With -w the worker pool is warmed up first
(default {DEFAULT_WARMUP_S} s); warmup time is not included.

Align options:
  --workers <N>                 Worker threads (default: available cores)
  --warmup <S>                  Warmup seconds before the timed run (default: none)
  --policy <lcs|pairwise>       Scoring policy (default: lcs)
  --verify                      Cross-check against the sequential engine
  -h, --help                    Print this help message
"
        );
    }
}

fn exec(warmup: Option<f64>, argv: &[String]) -> i32 {
    if let Some(secs) = warmup {
        let duration = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        match SchedulerBuilder::new(LcsScoring).build() {
            Ok(scheduler) => {
                let spent = scheduler.warmup(duration);
                eprintln!("Warmup: {:.3} s", spent.as_secs_f64());
            }
            Err(err) => eprintln!("bsp_timer: warmup skipped: {err}"),
        }
    }

    println!("Executing {} ....", argv.join(" "));
    let start = Instant::now();
    let status = Command::new(&argv[0]).args(&argv[1..]).status();
    let elapsed = start.elapsed();
    println!();
    println!("Time elapsed: {:.6} s", elapsed.as_secs_f64());

    match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            eprintln!("bsp_timer: cannot run '{}': {err}", argv[0]);
            127
        }
    }
}

fn configure<P>(policy: P, opts: &AlignOptions) -> Result<BspScheduler<P>, AlignError> {
    let mut builder = SchedulerBuilder::new(policy);
    if let Some(workers) = opts.workers {
        builder = builder.workers(workers);
    }
    if let Some(secs) = opts.warmup {
        builder = builder.warmup_secs(secs);
    }
    builder.build()
}

fn align(opts: &AlignOptions) -> Result<(), AlignError> {
    match opts.policy {
        PolicyKind::Lcs => {
            let scheduler = configure(LcsScoring, opts)?;
            let (left, top) = (opts.left.as_bytes(), opts.top.as_bytes());
            let report = scheduler.run(left, top)?;
            print_report(report.score, report.elapsed, report.warmup, report.supersteps);
            if opts.verify {
                let sequential = scheduler.engine().align(left, top)?;
                let bit_parallel = scheduler.engine().lcs_length(left, top)? as f64;
                verify(
                    report.score,
                    &[("sequential", sequential), ("bit-parallel", bit_parallel)],
                );
            }
        }
        PolicyKind::Pairwise => {
            let scheduler = configure(PairwiseScoring::default(), opts)?;
            let left = scheduler.policy().translate(opts.left.as_bytes(), true);
            let top = scheduler.policy().translate(opts.top.as_bytes(), false);
            let report = scheduler.run(&left, &top)?;
            print_report(report.score, report.elapsed, report.warmup, report.supersteps);
            if opts.verify {
                let sequential = scheduler.engine().align(&left, &top)?;
                verify(report.score, &[("sequential", sequential)]);
            }
        }
    }
    Ok(())
}

fn print_report(score: f64, elapsed: Duration, warmup: Option<Duration>, supersteps: usize) {
    if let Some(w) = warmup {
        println!("warmup_s: {:.6}", w.as_secs_f64());
    }
    println!("score: {score}");
    println!("supersteps: {supersteps}");
    println!("Time elapsed: {:.6} s", elapsed.as_secs_f64());
}

fn verify(score: f64, baselines: &[(&str, f64)]) {
    for (name, expected) in baselines {
        let status = if *expected == score { "passed" } else { "failed" };
        println!("verify[{name}]: {status} (expected {expected}, got {score})");
    }
}
