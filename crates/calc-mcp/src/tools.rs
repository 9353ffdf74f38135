use serde_json::{json, Value};
use tracing::debug;

use calc_core::{
    arithmetic, combinatorics, equations, probability, Graph, Matrix, ShortestPath, Tail,
};

use crate::protocol::ToolResult;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Tool schemas for tools/list
// ---------------------------------------------------------------------------

fn int_prop(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

fn num_prop(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn str_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required
        }
    })
}

pub fn tool_definitions() -> Value {
    let matrix_prop = json!({
        "type": "array",
        "items": { "type": "array", "items": { "type": "number" } },
        "description": "Matrix as a list of rows"
    });

    let tools = vec![
        // --- Arithmetic ---
        tool(
            "calc_gcd",
            "Greatest common divisor of two integers.",
            json!({ "a": int_prop("First integer"), "b": int_prop("Second integer") }),
            &["a", "b"],
        ),
        tool(
            "calc_lcm",
            "Least common multiple of two integers.",
            json!({ "a": int_prop("First integer"), "b": int_prop("Second integer") }),
            &["a", "b"],
        ),
        tool(
            "calc_is_prime",
            "Check whether an integer is prime.",
            json!({ "n": int_prop("Integer to test") }),
            &["n"],
        ),
        tool(
            "calc_coprime",
            "Check whether two integers are coprime (gcd = 1).",
            json!({ "a": int_prop("First integer"), "b": int_prop("Second integer") }),
            &["a", "b"],
        ),
        // --- Combinatorics ---
        tool(
            "calc_factorial",
            "Factorial n! of a non-negative integer.",
            json!({ "n": int_prop("Non-negative integer") }),
            &["n"],
        ),
        tool(
            "calc_permutations",
            "Ordered selections of r out of n elements, with or without repetition.",
            json!({
                "n": int_prop("Total number of elements"),
                "r": int_prop("Elements to arrange"),
                "repetition": {
                    "type": "boolean",
                    "default": false,
                    "description": "Allow repeated elements (n^r)"
                }
            }),
            &["n", "r"],
        ),
        tool(
            "calc_combinations",
            "Unordered selections C(n, r).",
            json!({
                "n": int_prop("Total number of elements"),
                "r": int_prop("Elements to choose")
            }),
            &["n", "r"],
        ),
        // --- Probability ---
        tool(
            "calc_probability",
            "Classical probability of a simple event: favorable / possible.",
            json!({
                "favorable": int_prop("Favorable cases"),
                "possible": int_prop("Possible cases")
            }),
            &["favorable", "possible"],
        ),
        tool(
            "calc_complement",
            "Probability of the complementary event, 1 - p.",
            json!({ "p": num_prop("Probability of the event (0..1)") }),
            &["p"],
        ),
        tool(
            "calc_union",
            "Probability of A or B for independent events.",
            json!({
                "p_a": num_prop("Probability of A (0..1)"),
                "p_b": num_prop("Probability of B (0..1)")
            }),
            &["p_a", "p_b"],
        ),
        tool(
            "calc_binomial",
            "Binomial distribution: exactly k, at most k, or at least k successes in n trials.",
            json!({
                "n": int_prop("Number of trials"),
                "k": int_prop("Number of successes"),
                "p": num_prop("Success probability per trial (0..1)"),
                "mode": {
                    "type": "string",
                    "enum": ["exact", "at_most", "at_least"],
                    "default": "exact",
                    "description": "exact = P(X=k), at_most = P(X<=k), at_least = P(X>=k)"
                }
            }),
            &["n", "k", "p"],
        ),
        // --- Linear algebra ---
        tool(
            "calc_matrix_multiply",
            "Multiply two matrices A x B.",
            json!({ "a": matrix_prop.clone(), "b": matrix_prop }),
            &["a", "b"],
        ),
        tool(
            "calc_quadratic",
            "Solve ax^2 + bx + c = 0, including complex roots.",
            json!({
                "a": num_prop("Quadratic coefficient (non-zero)"),
                "b": num_prop("Linear coefficient"),
                "c": num_prop("Constant term")
            }),
            &["a", "b", "c"],
        ),
        // --- Graph ---
        tool(
            "graph_add_edge",
            "Add an undirected weighted connection to the session graph. Missing nodes are created.",
            json!({
                "from": str_prop("First node label"),
                "to": str_prop("Second node label"),
                "weight": num_prop("Non-negative weight")
            }),
            &["from", "to", "weight"],
        ),
        tool(
            "graph_remove_edge",
            "Remove every connection between two nodes of the session graph.",
            json!({
                "from": str_prop("First node label"),
                "to": str_prop("Second node label")
            }),
            &["from", "to"],
        ),
        tool(
            "graph_show",
            "Show the session graph as an adjacency listing.",
            json!({}),
            &[],
        ),
        tool(
            "graph_reset",
            "Replace the session graph with the demo graph, or clear it.",
            json!({
                "empty": {
                    "type": "boolean",
                    "default": false,
                    "description": "Clear the graph instead of restoring the demo"
                }
            }),
            &[],
        ),
        tool(
            "graph_shortest_path",
            "Dijkstra shortest path between two nodes, with the step-by-step trace.",
            json!({
                "start": str_prop("Start node"),
                "end": str_prop("End node"),
                "trace": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include the algorithm steps"
                }
            }),
            &["start", "end"],
        ),
        tool(
            "graph_shortest_paths_from",
            "Shortest distance and path from one node to every other node.",
            json!({ "source": str_prop("Source node") }),
            &["source"],
        ),
    ];

    json!({ "tools": tools })
}

// ---------------------------------------------------------------------------
// Tool dispatch
// ---------------------------------------------------------------------------

type ToolOutcome = Result<String, ToolResult>;

pub fn call_tool(session: &mut Session, name: &str, args: &Value) -> ToolResult {
    debug!(tool = name, "tool call");
    let outcome = match name {
        // Arithmetic
        "calc_gcd" => tool_gcd(args),
        "calc_lcm" => tool_lcm(args),
        "calc_is_prime" => tool_is_prime(args),
        "calc_coprime" => tool_coprime(args),
        // Combinatorics
        "calc_factorial" => tool_factorial(args),
        "calc_permutations" => tool_permutations(args),
        "calc_combinations" => tool_combinations(args),
        // Probability
        "calc_probability" => tool_probability(session, args),
        "calc_complement" => tool_complement(session, args),
        "calc_union" => tool_union(session, args),
        "calc_binomial" => tool_binomial(session, args),
        // Linear algebra
        "calc_matrix_multiply" => tool_matrix_multiply(session, args),
        "calc_quadratic" => tool_quadratic(args),
        // Graph
        "graph_add_edge" => tool_graph_add_edge(session, args),
        "graph_remove_edge" => tool_graph_remove_edge(session, args),
        "graph_show" => Ok(graph_listing(&session.graph)),
        "graph_reset" => tool_graph_reset(session, args),
        "graph_shortest_path" => tool_shortest_path(session, args),
        "graph_shortest_paths_from" => tool_shortest_paths_from(session, args),
        _ => Err(ToolResult::error(format!("unknown tool: {name}"))),
    };
    match outcome {
        Ok(text) => ToolResult::text(text),
        Err(e) => e,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn missing(key: &str) -> ToolResult {
    ToolResult::error(format!("missing required field: {key}"))
}

fn get_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolResult> {
    args.get(key).and_then(|v| v.as_str()).ok_or_else(|| missing(key))
}

fn get_i64(args: &Value, key: &str) -> Result<i64, ToolResult> {
    let v = args.get(key).ok_or_else(|| missing(key))?;
    v.as_i64()
        .ok_or_else(|| ToolResult::error(format!("{key} must be an integer")))
}

fn get_f64(args: &Value, key: &str) -> Result<f64, ToolResult> {
    let v = args.get(key).ok_or_else(|| missing(key))?;
    v.as_f64()
        .ok_or_else(|| ToolResult::error(format!("{key} must be a number")))
}

fn get_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn get_matrix(args: &Value, key: &str) -> Result<Matrix, ToolResult> {
    let v = args.get(key).ok_or_else(|| missing(key))?;
    serde_json::from_value(v.clone())
        .map_err(|e| ToolResult::error(format!("invalid matrix {key}: {e}")))
}

// ---------------------------------------------------------------------------
// Calculator handlers
// ---------------------------------------------------------------------------

fn tool_gcd(args: &Value) -> ToolOutcome {
    let (a, b) = (get_i64(args, "a")?, get_i64(args, "b")?);
    Ok(format!("gcd({a}, {b}) = {}", arithmetic::gcd(a, b)))
}

fn tool_lcm(args: &Value) -> ToolOutcome {
    let (a, b) = (get_i64(args, "a")?, get_i64(args, "b")?);
    Ok(format!("lcm({a}, {b}) = {}", arithmetic::lcm(a, b)?))
}

fn tool_is_prime(args: &Value) -> ToolOutcome {
    let n = get_i64(args, "n")?;
    let verdict = if arithmetic::is_prime(n) { "is" } else { "is not" };
    Ok(format!("{n} {verdict} prime"))
}

fn tool_coprime(args: &Value) -> ToolOutcome {
    let (a, b) = (get_i64(args, "a")?, get_i64(args, "b")?);
    let verdict = if arithmetic::are_coprime(a, b) { "are" } else { "are not" };
    Ok(format!(
        "{a} and {b} {verdict} coprime (gcd = {})",
        arithmetic::gcd(a, b)
    ))
}

fn tool_factorial(args: &Value) -> ToolOutcome {
    let n = get_i64(args, "n")?;
    Ok(format!("{n}! = {}", combinatorics::factorial(n)?))
}

fn tool_permutations(args: &Value) -> ToolOutcome {
    let (n, r) = (get_i64(args, "n")?, get_i64(args, "r")?);
    if get_bool(args, "repetition", false) {
        let v = combinatorics::permutations_with_repetition(n, r)?;
        Ok(format!("{n}^{r} = {v}"))
    } else {
        let v = combinatorics::permutations(n, r)?;
        Ok(format!("P({n}, {r}) = {v}"))
    }
}

fn tool_combinations(args: &Value) -> ToolOutcome {
    let (n, r) = (get_i64(args, "n")?, get_i64(args, "r")?);
    Ok(format!("C({n}, {r}) = {}", combinatorics::combinations(n, r)?))
}

fn tool_probability(session: &Session, args: &Value) -> ToolOutcome {
    let favorable = get_i64(args, "favorable")?;
    let possible = get_i64(args, "possible")?;
    let p = probability::simple_event(favorable, possible)?;
    Ok(format!(
        "P = {favorable}/{possible} = {p:.prec$} ({:.2}%)",
        p * 100.0,
        prec = session.precision
    ))
}

fn tool_complement(session: &Session, args: &Value) -> ToolOutcome {
    let p = get_f64(args, "p")?;
    let q = probability::complement(p)?;
    Ok(format!("P(A') = {q:.prec$}", prec = session.precision))
}

fn tool_union(session: &Session, args: &Value) -> ToolOutcome {
    let (pa, pb) = (get_f64(args, "p_a")?, get_f64(args, "p_b")?);
    let u = probability::union_independent(pa, pb)?;
    Ok(format!("P(A ∪ B) = {u:.prec$}", prec = session.precision))
}

fn tool_binomial(session: &Session, args: &Value) -> ToolOutcome {
    let n = get_i64(args, "n")?;
    let k = get_i64(args, "k")?;
    let p = get_f64(args, "p")?;
    let mode = args.get("mode").and_then(|v| v.as_str()).unwrap_or("exact");
    let prec = session.precision;
    if mode == "exact" {
        let v = probability::binomial_pmf(n, k, p)?;
        return Ok(format!("P(X = {k}) = {v:.prec$}"));
    }
    let tail: Tail = mode.parse().map_err(ToolResult::error)?;
    let v = probability::binomial_cdf(n, k, p, tail)?;
    let op = match tail {
        Tail::AtMost => "<=",
        Tail::AtLeast => ">=",
    };
    Ok(format!("P(X {op} {k}) = {v:.prec$}"))
}

fn tool_matrix_multiply(session: &Session, args: &Value) -> ToolOutcome {
    let a = get_matrix(args, "a")?;
    let b = get_matrix(args, "b")?;
    let c = a.multiply(&b)?;
    Ok(format!(
        "{}x{} result:\n{c:.prec$}",
        c.rows(),
        c.cols(),
        prec = session.precision
    ))
}

fn tool_quadratic(args: &Value) -> ToolOutcome {
    let (a, b, c) = (get_f64(args, "a")?, get_f64(args, "b")?, get_f64(args, "c")?);
    let s = equations::solve_quadratic(a, b, c)?;
    Ok(format!("discriminant = {}\n{}", s.discriminant, s.roots))
}

// ---------------------------------------------------------------------------
// Graph handlers
// ---------------------------------------------------------------------------

fn graph_listing(graph: &Graph) -> String {
    if graph.is_empty() {
        return "Graph is empty. Add connections with graph_add_edge.".into();
    }
    format!(
        "Graph ({} nodes, {} connections):\n{graph}",
        graph.node_count(),
        graph.edge_count()
    )
}

fn tool_graph_add_edge(session: &mut Session, args: &Value) -> ToolOutcome {
    let from = get_str(args, "from")?;
    let to = get_str(args, "to")?;
    let weight = get_f64(args, "weight")?;
    session.graph.add_connection(from, to, weight)?;
    Ok(format!("Added: {from} <-> {to} (weight {weight})"))
}

fn tool_graph_remove_edge(session: &mut Session, args: &Value) -> ToolOutcome {
    let from = get_str(args, "from")?;
    let to = get_str(args, "to")?;
    match session.graph.remove_connection(from, to) {
        0 => Err(ToolResult::error(format!(
            "no connection between {from} and {to}"
        ))),
        n => Ok(format!("Removed {n} connection(s) between {from} and {to}")),
    }
}

fn tool_graph_reset(session: &mut Session, args: &Value) -> ToolOutcome {
    if get_bool(args, "empty", false) {
        session.graph.clear();
        Ok("Graph cleared.".into())
    } else {
        session.graph = Graph::sample();
        Ok(graph_listing(&session.graph))
    }
}

fn describe_path(result: &ShortestPath, trace: bool) -> String {
    let mut output = if result.is_reachable() {
        format!(
            "Shortest path {} -> {}: distance {} ({} nodes)\n  {}\n",
            result.start,
            result.end,
            result.distance,
            result.path.len(),
            result.path.join(" -> ")
        )
    } else {
        format!("No path between {} and {}\n", result.start, result.end)
    };
    if trace {
        output.push_str("\nSteps:\n");
        for step in &result.steps {
            output.push_str(&format!("{step}\n"));
        }
    }
    output
}

fn tool_shortest_path(session: &Session, args: &Value) -> ToolOutcome {
    let start = get_str(args, "start")?;
    let end = get_str(args, "end")?;
    let result = session.graph.shortest_path(start, end)?;
    Ok(describe_path(&result, get_bool(args, "trace", true)))
}

fn tool_shortest_paths_from(session: &Session, args: &Value) -> ToolOutcome {
    let source = get_str(args, "source")?;
    let results = session.graph.shortest_paths_from(source)?;
    if results.is_empty() {
        return Ok(format!("{source} is the only node in the graph."));
    }

    let mut output = format!("{:<12} {:>10}  Path\n", "Target", "Distance");
    output.push_str(&format!("{}\n", "-".repeat(40)));
    for r in &results {
        if r.is_reachable() {
            output.push_str(&format!(
                "{:<12} {:>10}  {}\n",
                r.end,
                r.distance,
                r.path.join(" -> ")
            ));
        } else {
            output.push_str(&format!("{:<12} {:>10}  (no path)\n", r.end, "∞"));
        }
    }
    Ok(output)
}
