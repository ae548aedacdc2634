//! CFR+ solver binary for the bundled games.
//!
//! Usage:
//!   cargo run --release --bin solve -- [OPTIONS]
//!
//! Options:
//!   --game <NAME>        kuhn, tictactoe or tictactoe-sym (default: kuhn)
//!   --iterations <N>     Number of iterations (default: 1000)
//!   --config <FILE>      Solver configuration JSON file (optional)
//!   --output <PREFIX>    Write PREFIX.{regret,strategy,instant,stats}.json
//!   --resume <PREFIX>    Continue from snapshots written with --output
//!   --hashed             Use fixed-width u64 info set keys
//!   --monte-carlo        Sample chance outcomes instead of expanding them
//!   --randomize <P>      Replace decisions with random play with probability P
//!   --max-random <N>     Candidate actions for a random decision (default: all)
//!   --seed <N>           Random seed (default: 0)

use std::env;
use std::process;

use indicatif::ProgressBar;

use cfr_plus::cfr::persist::{load_stats, load_store, save_stats, save_store, Snapshot};
use cfr_plus::cfr::{CfrConfig, CfrPlus, GameNode, InfoSetKey, InfoSetStore, Result};
use cfr_plus::games::kuhn::KuhnNode;
use cfr_plus::games::tictactoe::{SymmetricNode, TicTacToeNode};
use cfr_plus::nodes::{MonteCarloNode, RandomizedNode, RandomizerConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
enum GameChoice {
    Kuhn,
    TicTacToe,
    SymmetricTicTacToe,
}

#[derive(Debug, Clone)]
struct Options {
    game: GameChoice,
    iterations: u64,
    config: CfrConfig,
    output: Option<String>,
    resume: Option<String>,
    hashed: bool,
    monte_carlo: bool,
    randomizer: Option<RandomizerConfig>,
    seed: u64,
}

fn main() {
    env_logger::init();

    let options = match parse_args(env::args().skip(1).collect()) {
        Some(options) => options,
        None => return,
    };

    println!("=================================================");
    println!("  CFR+ Solver");
    println!("=================================================");
    println!();
    println!("Game: {:?}", options.game);
    println!("Iterations: {}", options.iterations);
    println!("Keys: {}", if options.hashed { "hashed (u64)" } else { "exact (String)" });
    if options.monte_carlo {
        println!("Chance: Monte Carlo sampling");
    }
    if let Some(randomizer) = &options.randomizer {
        println!("Randomized decisions: p = {}", randomizer.p_random);
    }
    println!("Seed: {}", options.seed);
    println!();

    let result = if options.hashed {
        solve_game::<u64>(&options)
    } else {
        solve_game::<String>(&options)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn solve_game<K: InfoSetKey>(options: &Options) -> Result<()> {
    match options.game {
        GameChoice::Kuhn => solve_wrapped::<KuhnNode, K>(KuhnNode::root(), options),
        GameChoice::TicTacToe => solve_wrapped::<TicTacToeNode, K>(TicTacToeNode::new(), options),
        GameChoice::SymmetricTicTacToe => solve_wrapped::<SymmetricNode, K>(SymmetricNode::new(), options),
    }
}

fn solve_wrapped<N: GameNode, K: InfoSetKey>(root: N, options: &Options) -> Result<()> {
    match options.randomizer {
        Some(randomizer) => solve::<RandomizedNode<N>, K>(RandomizedNode::root(root, randomizer)?, options),
        None => solve::<N, K>(root, options),
    }
}

fn solve<N: GameNode, K: InfoSetKey>(root: N, options: &Options) -> Result<()> {
    let (store, completed) = match &options.resume {
        Some(prefix) => {
            println!("Resuming from {}.*.json", prefix);
            let store = load_store::<K, _>(regret_path(prefix), strategy_path(prefix))?;
            let completed = match load_stats(stats_path(prefix)) {
                Ok(stats) => stats.iterations,
                Err(e) => {
                    log::warn!("no iteration count to resume from ({}), starting at 0", e);
                    0
                }
            };
            (store, completed)
        }
        None => (InfoSetStore::new(), 0),
    };

    let mut solver: CfrPlus<N, K> = CfrPlus::with_store(root, options.config.clone(), store)?;
    solver.set_iteration(completed);
    println!("Info sets: {}", solver.store().len());
    println!("Starting training...");

    let report_interval = (options.iterations / 10).max(1);
    let bar = ProgressBar::new(options.iterations);
    let seed = options.seed;

    let stats = if options.monte_carlo {
        solver.train_sampled(
            options.iterations,
            |root: &N, iteration: u64| MonteCarloNode::new(root.clone(), seed.wrapping_add(iteration)),
            report_interval,
            |_| bar.inc(report_interval),
        )?
    } else {
        solver.train_with_callback(options.iterations, report_interval, |_| bar.inc(report_interval))?
    };
    bar.finish();
    println!(
        "Trained in {:.2}s ({:.0} it/s)",
        stats.elapsed_seconds, stats.iterations_per_second
    );

    let metric = solver.metric();
    println!();
    println!("Training complete!");
    println!("Iterations: {}", solver.iteration());
    println!("Root utility (player 0): {:.6}", solver.evaluate()?);
    println!("Max instant regret: {:.6}", metric.max_instant_regret);
    println!("Sum of positive instant regrets: {:.6}", metric.sum_positive_instant_regrets);
    println!();

    println!("=== Sample Strategies ===");
    for key in solver.store().keys().into_iter().take(12) {
        let strategy = solver.average_strategy(&key)?;
        let rendered: Vec<String> = strategy.iter().map(|p| format!("{:.3}", p)).collect();
        println!("{:?}: [{}]", key.to_text(), rendered.join(", "));
    }

    if let Some(prefix) = &options.output {
        println!();
        println!("Saving snapshots to {}.*.json...", prefix);
        save_store(solver.store(), regret_path(prefix), strategy_path(prefix))?;
        Snapshot::instant_regret(solver.store()).save(format!("{}.instant.json", prefix))?;
        save_stats(solver.stats(), stats_path(prefix))?;
        println!("Results saved successfully!");
    }

    Ok(())
}

fn regret_path(prefix: &str) -> String {
    format!("{}.regret.json", prefix)
}

fn strategy_path(prefix: &str) -> String {
    format!("{}.strategy.json", prefix)
}

fn stats_path(prefix: &str) -> String {
    format!("{}.stats.json", prefix)
}

fn parse_args(args: Vec<String>) -> Option<Options> {
    let mut options = Options {
        game: GameChoice::Kuhn,
        iterations: 1000,
        config: CfrConfig::default(),
        output: None,
        resume: None,
        hashed: false,
        monte_carlo: false,
        randomizer: None,
        seed: 0,
    };
    let mut max_random: Option<usize> = None;

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--game" | "-g" => {
                options.game = match value.map(String::as_str) {
                    Some("kuhn") => GameChoice::Kuhn,
                    Some("tictactoe") => GameChoice::TicTacToe,
                    Some("tictactoe-sym") => GameChoice::SymmetricTicTacToe,
                    other => {
                        eprintln!("Unknown game: {:?}", other);
                        print_help();
                        return None;
                    }
                };
                i += 1;
            }
            "--iterations" | "-i" => {
                options.iterations = value.and_then(|v| v.parse().ok()).unwrap_or(options.iterations);
                i += 1;
            }
            "--config" | "-c" => {
                if let Some(path) = value {
                    println!("Loading configuration from: {}", path);
                    match CfrConfig::from_json_file(path) {
                        Ok(config) => options.config = config,
                        Err(e) => {
                            eprintln!("Error loading config: {}", e);
                            return None;
                        }
                    }
                }
                i += 1;
            }
            "--output" | "-o" => {
                options.output = value.cloned();
                i += 1;
            }
            "--resume" | "-r" => {
                options.resume = value.cloned();
                i += 1;
            }
            "--hashed" => options.hashed = true,
            "--monte-carlo" | "-m" => options.monte_carlo = true,
            "--randomize" => {
                if let Some(p) = value.and_then(|v| v.parse().ok()) {
                    options.randomizer = Some(RandomizerConfig::new().with_p_random(p));
                }
                i += 1;
            }
            "--max-random" => {
                max_random = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--seed" | "-s" => {
                options.seed = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return None;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                return None;
            }
        }
        i += 1;
    }

    if let Some(randomizer) = options.randomizer.as_mut() {
        randomizer.seed = options.seed;
        randomizer.max_random_actions = max_random;
    }

    Some(options)
}

fn print_help() {
    println!("CFR+ Solver");
    println!();
    println!("Usage: solve [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -g, --game <NAME>        kuhn, tictactoe or tictactoe-sym (default: kuhn)");
    println!("  -i, --iterations <N>     Number of iterations (default: 1000)");
    println!("  -c, --config <FILE>      Solver configuration JSON file");
    println!("  -o, --output <PREFIX>    Save snapshots as PREFIX.{{regret,strategy,instant,stats}}.json");
    println!("  -r, --resume <PREFIX>    Continue from saved snapshots");
    println!("      --hashed             Use u64 info set keys");
    println!("  -m, --monte-carlo        Sample chance outcomes each iteration");
    println!("      --randomize <P>      Randomize decisions with probability P");
    println!("      --max-random <N>     Candidate actions for a random decision");
    println!("  -s, --seed <N>           Random seed");
    println!("  -h, --help               Show this help");
    println!();
    println!("Examples:");
    println!("  # Solve Kuhn poker and save the result");
    println!("  solve --iterations 10000 --output kuhn");
    println!();
    println!("  # Symmetry-reduced tic-tac-toe with hashed keys");
    println!("  solve --game tictactoe-sym --hashed --iterations 50");
}
