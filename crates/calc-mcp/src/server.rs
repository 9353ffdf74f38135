use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::protocol::{JsonRpcMessage, JsonRpcResponse};
use crate::session::Session;
use crate::tools;

const SERVER_NAME: &str = "calc";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the MCP server on stdio. Blocks until stdin is closed.
pub fn run_server(session: &mut Session, instructions: Option<&str>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    info!(
        nodes = session.graph.node_count(),
        "calc MCP server listening on stdio"
    );
    serve(stdin.lock(), &mut stdout, session, instructions)
}

/// Line-delimited JSON-RPC loop over any reader/writer pair.
pub fn serve<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    session: &mut Session,
    instructions: Option<&str>,
) -> anyhow::Result<()> {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };

        if let Some(response) = handle_line(session, instructions, &line) {
            write_response(writer, &response)?;
        }
    }

    Ok(())
}

/// Handle one raw input line. Returns `None` for blank lines and notifications.
pub fn handle_line(
    session: &mut Session,
    instructions: Option<&str>,
    line: &str,
) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let msg: JsonRpcMessage = match serde_json::from_str(line) {
        Ok(m) => m,
        Err(e) => {
            error!("invalid JSON-RPC: {e}");
            return Some(JsonRpcResponse::parse_error(&e));
        }
    };

    let method = msg.method.as_str();
    debug!("MCP request: {method}");

    // Notifications have no id
    let id = msg.id.clone()?;

    if !msg.has_valid_version() {
        warn!(jsonrpc = %msg.jsonrpc, "rejecting request");
        return Some(JsonRpcResponse::invalid_request(id, &msg.jsonrpc));
    }

    let response = match method {
        "initialize" => handle_initialize(id, instructions),
        "ping" => JsonRpcResponse::ok(id, json!({})),
        "tools/list" => JsonRpcResponse::ok(id, tools::tool_definitions()),
        "tools/call" => handle_tools_call(id, &msg.params, session),
        other => JsonRpcResponse::method_not_found(id, other),
    };
    Some(response)
}

fn write_response<W: Write>(writer: &mut W, resp: &JsonRpcResponse) -> anyhow::Result<()> {
    let json = serde_json::to_string(resp)?;
    writeln!(writer, "{json}")?;
    writer.flush()?;
    Ok(())
}

const CALC_INSTRUCTIONS: &str = "\
Calculadora: exact counting, probability and graph tools.\n\
\n\
Use calc_* tools for arithmetic (gcd, lcm, primes), combinatorics (factorial, \
permutations, combinations), probability (simple events, binomial) and linear algebra \
(matrix product, quadratic roots). Inputs are validated; out-of-range values come back \
as errors.\n\
\n\
The graph_* tools edit one in-memory weighted undirected graph that lives for this \
session (it starts as an 8-node demo graph) and compute Dijkstra shortest paths with a \
step-by-step trace.";

fn handle_initialize(id: Value, instructions: Option<&str>) -> JsonRpcResponse {
    let instructions = match instructions {
        Some(extra) => format!("{CALC_INSTRUCTIONS}\n\n{extra}"),
        None => CALC_INSTRUCTIONS.to_string(),
    };
    JsonRpcResponse::ok(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": instructions
        }),
    )
}

fn handle_tools_call(id: Value, params: &Option<Value>, session: &mut Session) -> JsonRpcResponse {
    let params = match params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(id, "missing params"),
    };

    let tool_name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n,
        None => return JsonRpcResponse::invalid_params(id, "missing tool name"),
    };

    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = tools::call_tool(session, tool_name, &args);
    JsonRpcResponse::ok(id, serde_json::to_value(result).unwrap_or(json!(null)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(session: &mut Session, line: &str) -> Value {
        let resp = handle_line(session, None, line).expect("response");
        serde_json::to_value(resp).unwrap()
    }

    #[test]
    fn test_initialize_reports_server_info() {
        let mut session = Session::default();
        let v = call(
            &mut session,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        );
        assert_eq!(v["result"]["serverInfo"]["name"], "calc");
        assert_eq!(v["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn test_custom_instructions_appended() {
        let mut session = Session::default();
        let resp = handle_line(
            &mut session,
            Some("Answer in Spanish."),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
        )
        .unwrap();
        let v = serde_json::to_value(resp).unwrap();
        let text = v["result"]["instructions"].as_str().unwrap();
        assert!(text.ends_with("Answer in Spanish."));
    }

    #[test]
    fn test_notification_and_blank_lines_ignored() {
        let mut session = Session::default();
        assert!(handle_line(&mut session, None, "   ").is_none());
        assert!(handle_line(
            &mut session,
            None,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
        )
        .is_none());
    }

    #[test]
    fn test_parse_error() {
        let mut session = Session::default();
        let v = call(&mut session, "{not json");
        assert_eq!(v["error"]["code"], crate::protocol::PARSE_ERROR);
        assert!(v["id"].is_null());
    }

    #[test]
    fn test_wrong_jsonrpc_version_rejected() {
        let mut session = Session::default();
        let v = call(&mut session, r#"{"jsonrpc":"1.0","id":5,"method":"ping"}"#);
        assert_eq!(v["error"]["code"], crate::protocol::INVALID_REQUEST);
        assert_eq!(v["id"], 5);
    }

    #[test]
    fn test_unknown_method() {
        let mut session = Session::default();
        let v = call(&mut session, r#"{"jsonrpc":"2.0","id":7,"method":"nope"}"#);
        assert_eq!(v["error"]["code"], -32601);
        assert_eq!(v["id"], 7);
    }

    #[test]
    fn test_tools_call_missing_params() {
        let mut session = Session::default();
        let v = call(&mut session, r#"{"jsonrpc":"2.0","id":2,"method":"tools/call"}"#);
        assert_eq!(v["error"]["code"], -32602);
        let v = call(
            &mut session,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#,
        );
        assert_eq!(v["error"]["message"], "missing tool name");
    }

    #[test]
    fn test_tools_call_roundtrip() {
        let mut session = Session::default();
        let v = call(
            &mut session,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"calc_factorial","arguments":{"n":5}}}"#,
        );
        assert_eq!(v["result"]["content"][0]["text"], "5! = 120");
        assert!(v["result"].get("isError").is_none());
    }

    #[test]
    fn test_serve_writes_one_line_per_request() {
        let mut session = Session::default();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut out = Vec::new();
        serve(input.as_bytes(), &mut out, &mut session, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let list: Value = serde_json::from_str(lines[1]).unwrap();
        assert!(list["result"]["tools"].as_array().unwrap().len() > 10);
    }
}
