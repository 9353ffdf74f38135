mod config;
mod graph_io;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};

use calc_core::{
    arithmetic, combinatorics, equations, probability, Graph, Matrix, ShortestPath, Tail,
};
use calc_mcp::Session;

use crate::config::Config;
use crate::graph_io::GraphFormat;

#[derive(Parser)]
#[command(
    name = "calc",
    version,
    about = "Calculadora - counting, probability, linear algebra and shortest paths"
)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Digits after the decimal point (overrides config)
    #[arg(long, global = true)]
    precision: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Greatest common divisor
    Gcd {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// Least common multiple
    Lcm {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// Primality test
    Prime {
        #[arg(allow_negative_numbers = true)]
        n: i64,
    },

    /// Check whether two integers are coprime
    Coprime {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// n!
    Factorial {
        #[arg(allow_negative_numbers = true)]
        n: i64,
    },

    /// Ordered selections of r out of n: n!/(n-r)!, or n^r with --repetition
    Permutations {
        #[arg(allow_negative_numbers = true)]
        n: i64,
        #[arg(allow_negative_numbers = true)]
        r: i64,

        /// Allow repeated elements
        #[arg(long)]
        repetition: bool,
    },

    /// Unordered selections C(n, r)
    Combinations {
        #[arg(allow_negative_numbers = true)]
        n: i64,
        #[arg(allow_negative_numbers = true)]
        r: i64,
    },

    /// Probability of a simple event: favorable / possible
    Probability {
        #[arg(allow_negative_numbers = true)]
        favorable: i64,
        #[arg(allow_negative_numbers = true)]
        possible: i64,
    },

    /// Probability of the complementary event
    Complement {
        #[arg(allow_negative_numbers = true)]
        p: f64,
    },

    /// P(A or B) for independent events
    Union {
        #[arg(allow_negative_numbers = true)]
        p_a: f64,
        #[arg(allow_negative_numbers = true)]
        p_b: f64,
    },

    /// Binomial distribution
    Binomial {
        /// Number of trials
        #[arg(allow_negative_numbers = true)]
        n: i64,
        /// Number of successes
        #[arg(allow_negative_numbers = true)]
        k: i64,
        /// Success probability per trial
        #[arg(allow_negative_numbers = true)]
        p: f64,

        /// exact = P(X=k), at-most = P(X<=k), at-least = P(X>=k)
        #[arg(short, long, default_value = "exact")]
        mode: BinomialMode,
    },

    /// Multiply two matrices, written as "1,2;3,4"
    Matrix {
        /// Left operand
        #[arg(short, long, allow_hyphen_values = true)]
        a: Matrix,

        /// Right operand
        #[arg(short, long, allow_hyphen_values = true)]
        b: Matrix,
    },

    /// Solve ax^2 + bx + c = 0
    Quadratic {
        #[arg(allow_negative_numbers = true)]
        a: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
        #[arg(allow_negative_numbers = true)]
        c: f64,
    },

    /// Weighted graph commands (Dijkstra shortest paths)
    Graph {
        /// Graph file, TOML or JSON (default: config, then the demo graph)
        #[arg(short, long, global = true)]
        graph: Option<PathBuf>,

        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Show current configuration
    Config,

    /// Launch MCP server (stdio transport)
    Serve {
        /// Initial graph for the session (default: config, then the demo graph)
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GraphCommands {
    /// List nodes and their connections
    Show,

    /// Shortest path between two nodes
    Path {
        start: String,
        end: String,

        /// Print the step-by-step trace
        #[arg(short, long)]
        steps: bool,
    },

    /// Shortest paths from one node to every other node
    PathsFrom { source: String },

    /// Print the graph in file format
    Export {
        #[arg(short, long, default_value = "toml")]
        format: GraphFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BinomialMode {
    Exact,
    AtMost,
    AtLeast,
}

impl BinomialMode {
    fn tail(self) -> Option<Tail> {
        match self {
            Self::Exact => None,
            Self::AtMost => Some(Tail::AtMost),
            Self::AtLeast => Some(Tail::AtLeast),
        }
    }
}

/// Output settings resolved from flags and config.
struct Out {
    json: bool,
    precision: usize,
}

impl Out {
    fn emit(&self, text: String, value: Value) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{text}");
        }
        Ok(())
    }

    fn prob(&self, p: f64) -> String {
        format!("{p:.prec$}", prec = self.precision)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let out = Out {
        json: cli.json || cfg.output.json,
        precision: cli.precision.unwrap_or(cfg.output.precision),
    };

    match cli.command {
        Commands::Gcd { a, b } => {
            let g = arithmetic::gcd(a, b);
            out.emit(format!("gcd({a}, {b}) = {g}"), json!({ "a": a, "b": b, "gcd": g }))
        }
        Commands::Lcm { a, b } => {
            let l = arithmetic::lcm(a, b)?;
            out.emit(format!("lcm({a}, {b}) = {l}"), json!({ "a": a, "b": b, "lcm": l }))
        }
        Commands::Prime { n } => {
            let prime = arithmetic::is_prime(n);
            let verdict = if prime { "is" } else { "is not" };
            out.emit(format!("{n} {verdict} prime"), json!({ "n": n, "prime": prime }))
        }
        Commands::Coprime { a, b } => {
            let coprime = arithmetic::are_coprime(a, b);
            let verdict = if coprime { "are" } else { "are not" };
            out.emit(
                format!("{a} and {b} {verdict} coprime"),
                json!({ "a": a, "b": b, "coprime": coprime }),
            )
        }
        Commands::Factorial { n } => {
            let v = combinatorics::factorial(n)?;
            out.emit(format!("{n}! = {v}"), json!({ "n": n, "factorial": count(v) }))
        }
        Commands::Permutations { n, r, repetition } => cmd_permutations(&out, n, r, repetition),
        Commands::Combinations { n, r } => {
            let v = combinatorics::combinations(n, r)?;
            out.emit(
                format!("C({n}, {r}) = {v}"),
                json!({ "n": n, "r": r, "combinations": count(v) }),
            )
        }
        Commands::Probability {
            favorable,
            possible,
        } => {
            let p = probability::simple_event(favorable, possible)?;
            out.emit(
                format!("P = {favorable}/{possible} = {} ({:.2}%)", out.prob(p), p * 100.0),
                json!({ "favorable": favorable, "possible": possible, "probability": p }),
            )
        }
        Commands::Complement { p } => {
            let q = probability::complement(p)?;
            out.emit(format!("P(A') = {}", out.prob(q)), json!({ "p": p, "complement": q }))
        }
        Commands::Union { p_a, p_b } => {
            let u = probability::union_independent(p_a, p_b)?;
            out.emit(
                format!("P(A ∪ B) = {}", out.prob(u)),
                json!({ "p_a": p_a, "p_b": p_b, "union": u }),
            )
        }
        Commands::Binomial { n, k, p, mode } => cmd_binomial(&out, n, k, p, mode),
        Commands::Matrix { a, b } => cmd_matrix(&out, &a, &b),
        Commands::Quadratic { a, b, c } => {
            let s = equations::solve_quadratic(a, b, c)?;
            out.emit(
                format!("discriminant = {}\n{}", s.discriminant, s.roots),
                serde_json::to_value(s)?,
            )
        }
        Commands::Graph { graph, command } => {
            let graph = graph_io::load_graph(graph_path(graph, &cfg).as_deref())?;
            match command {
                GraphCommands::Show => cmd_graph_show(&out, &graph),
                GraphCommands::Path { start, end, steps } => {
                    cmd_graph_path(&out, &graph, &start, &end, steps)
                }
                GraphCommands::PathsFrom { source } => cmd_graph_paths_from(&out, &graph, &source),
                GraphCommands::Export { format } => {
                    print!("{}", graph_io::render_graph(&graph, format)?);
                    Ok(())
                }
            }
        }
        Commands::Config => cmd_config(&cfg),
        Commands::Serve { graph } => {
            let graph = graph_io::load_graph(graph_path(graph, &cfg).as_deref())?;
            let mut session = Session::new(graph, out.precision);
            calc_mcp::run_server(&mut session, cfg.mcp.instructions.as_deref())
        }
    }
}

fn graph_path(flag: Option<PathBuf>, cfg: &Config) -> Option<PathBuf> {
    flag.or_else(|| cfg.graph.path.as_ref().map(PathBuf::from))
}

/// Counting results as JSON numbers when they fit, strings otherwise.
fn count(v: u128) -> Value {
    u64::try_from(v)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(v.to_string()))
}

// ---------------------------------------------------------------------------
// Calculator commands
// ---------------------------------------------------------------------------

fn cmd_permutations(out: &Out, n: i64, r: i64, repetition: bool) -> Result<()> {
    if repetition {
        let v = combinatorics::permutations_with_repetition(n, r)?;
        out.emit(
            format!("{n}^{r} = {v}"),
            json!({ "n": n, "r": r, "repetition": true, "permutations": count(v) }),
        )
    } else {
        let v = combinatorics::permutations(n, r)?;
        out.emit(
            format!("P({n}, {r}) = {v}"),
            json!({ "n": n, "r": r, "repetition": false, "permutations": count(v) }),
        )
    }
}

fn cmd_binomial(out: &Out, n: i64, k: i64, p: f64, mode: BinomialMode) -> Result<()> {
    let (label, value) = match mode.tail() {
        None => (format!("P(X = {k})"), probability::binomial_pmf(n, k, p)?),
        Some(tail) => {
            let op = match tail {
                Tail::AtMost => "<=",
                Tail::AtLeast => ">=",
            };
            (
                format!("P(X {op} {k})"),
                probability::binomial_cdf(n, k, p, tail)?,
            )
        }
    };
    out.emit(
        format!("{label} = {}", out.prob(value)),
        json!({ "n": n, "k": k, "p": p, "tail": mode.tail(), "probability": value }),
    )
}

fn cmd_matrix(out: &Out, a: &Matrix, b: &Matrix) -> Result<()> {
    let c = a
        .multiply(b)
        .with_context(|| format!("{}x{} times {}x{}", a.rows(), a.cols(), b.rows(), b.cols()))?;
    out.emit(
        format!("{:.prec$}", c, prec = out.precision),
        serde_json::to_value(&c)?,
    )
}

// ---------------------------------------------------------------------------
// Graph commands
// ---------------------------------------------------------------------------

fn cmd_graph_show(out: &Out, graph: &Graph) -> Result<()> {
    if out.json {
        println!("{}", graph.to_json_string()?);
        return Ok(());
    }
    if graph.is_empty() {
        println!("Graph is empty.");
        return Ok(());
    }
    println!(
        "{} nodes, {} connections\n",
        graph.node_count(),
        graph.edge_count()
    );
    print!("{graph}");
    Ok(())
}

fn print_path(result: &ShortestPath) {
    if result.is_reachable() {
        println!(
            "{} -> {}: distance {} ({} nodes)",
            result.start,
            result.end,
            result.distance,
            result.path.len()
        );
        println!("  {}", result.path.join(" -> "));
    } else {
        println!("No path between {} and {}", result.start, result.end);
    }
}

#[derive(Serialize)]
struct PathReport<'a> {
    reachable: bool,
    #[serde(flatten)]
    result: &'a ShortestPath,
}

fn cmd_graph_path(out: &Out, graph: &Graph, start: &str, end: &str, steps: bool) -> Result<()> {
    let result = graph.shortest_path(start, end)?;
    if out.json {
        let report = PathReport {
            reachable: result.is_reachable(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_path(&result);
    if steps {
        println!("\nSteps:");
        for step in &result.steps {
            println!("{step}");
        }
    }
    Ok(())
}

fn cmd_graph_paths_from(out: &Out, graph: &Graph, source: &str) -> Result<()> {
    let results = graph.shortest_paths_from(source)?;
    if out.json {
        let rows: Vec<Value> = results
            .iter()
            .map(|r| {
                json!({
                    "target": r.end,
                    "reachable": r.is_reachable(),
                    "distance": r.distance,
                    "path": r.path,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{source} is the only node in the graph.");
        return Ok(());
    }
    println!("{:<12} {:>10}  Path", "Target", "Distance");
    println!("{}", "-".repeat(40));
    for r in &results {
        if r.is_reachable() {
            println!("{:<12} {:>10}  {}", r.end, r.distance, r.path.join(" -> "));
        } else {
            println!("{:<12} {:>10}  (no path)", r.end, "∞");
        }
    }
    Ok(())
}

fn cmd_config(cfg: &Config) -> Result<()> {
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[output]");
    println!("  precision = {}", cfg.output.precision);
    println!("  json = {}", cfg.output.json);
    println!();
    println!("[graph]");
    println!(
        "  path = {}",
        cfg.graph.path.as_deref().unwrap_or("(built-in demo graph)")
    );
    println!();
    println!("[mcp]");
    if let Some(ref instr) = cfg.mcp.instructions {
        println!("  instructions = {instr}");
    }
    Ok(())
}
