use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{info, warn};

use crate::use_cases::{InvalidArgument, StatsUseCase, UpdateUseCase};

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, serde::Deserialize)]
struct JsonRpcRequest {
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id: Some(id.unwrap_or(json!(1))),
        }
    }

    fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id: Some(id.unwrap_or(json!(1))),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

pub struct MCPHandler {
    stats_use_case: Arc<StatsUseCase>,
    update_use_case: Arc<UpdateUseCase>,
}

impl MCPHandler {
    pub fn new(stats_use_case: Arc<StatsUseCase>, update_use_case: Arc<UpdateUseCase>) -> Self {
        Self {
            stats_use_case,
            update_use_case,
        }
    }

    /// Line-delimited JSON-RPC 2.0. Notifications get no response.
    pub async fn serve<R, W>(self, reader: R, mut writer: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => {
                    if request.id.is_none() || request.method.starts_with("notifications/") {
                        if request.method == "notifications/initialized" {
                            info!("🎰 Client initialized");
                        }
                        continue;
                    }
                    self.handle_request(request).await
                }
                Err(e) => {
                    warn!("Failed to parse request: {} - Line: {}", e, line);
                    JsonRpcResponse {
                        jsonrpc: "2.0",
                        result: None,
                        error: Some(JsonRpcError {
                            code: PARSE_ERROR,
                            message: "Parse error".to_string(),
                            data: Some(json!(e.to_string())),
                        }),
                        id: None,
                    }
                }
            };

            writeln!(writer, "{}", serde_json::to_string(&response)?)?;
            writer.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => {
                info!("🎰 Initializing Daily Cash 539 MCP server");
                JsonRpcResponse::ok(
                    request.id,
                    json!({
                        "protocolVersion": "2024-11-05",
                        "capabilities": { "tools": {} },
                        "serverInfo": {
                            "name": "daily539-mcp-server",
                            "version": env!("CARGO_PKG_VERSION")
                        }
                    }),
                )
            }
            "tools/list" => JsonRpcResponse::ok(request.id, json!({ "tools": tools() })),
            "tools/call" => self.handle_call_tool(request.params, request.id).await,
            other => JsonRpcResponse::err(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }

    async fn handle_call_tool(&self, params: Option<Value>, id: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::err(id, INVALID_PARAMS, "Missing params");
        };
        let Some(tool_name) = params.get("name").and_then(|n| n.as_str()) else {
            return JsonRpcResponse::err(id, INVALID_PARAMS, "Missing tool name");
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        let arguments: HashMap<String, Value> = serde_json::from_value(arguments).unwrap_or_default();

        match self.execute_tool(tool_name, &arguments).await {
            Ok(content) => JsonRpcResponse::ok(
                id,
                json!({
                    "content": [{ "type": "text", "text": content }]
                }),
            ),
            Err(e) if e.downcast_ref::<InvalidArgument>().is_some() => {
                JsonRpcResponse::err(id, INVALID_PARAMS, e.to_string())
            }
            Err(e) => JsonRpcResponse::err(id, INTERNAL_ERROR, format!("Tool execution error: {}", e)),
        }
    }

    async fn execute_tool(&self, tool_name: &str, arguments: &HashMap<String, Value>) -> Result<String> {
        info!("Calling tool {}", tool_name);
        match tool_name {
            "update_draws" => self.update_use_case.update_draws(arguments).await,
            "get_latest_draws" => self.stats_use_case.get_latest_draws(arguments).await,
            "get_overview" => self.stats_use_case.get_overview(arguments).await,
            "get_frequency" => self.stats_use_case.get_frequency(arguments).await,
            "get_sum_analysis" => self.stats_use_case.get_sum_analysis(arguments).await,
            "get_ratio_analysis" => self.stats_use_case.get_ratio_analysis(arguments).await,
            "get_consecutive_analysis" => self.stats_use_case.get_consecutive_analysis(arguments).await,
            "get_last_digits" => self.stats_use_case.get_last_digits(arguments).await,
            "get_analysis_prompt" => self.stats_use_case.get_analysis_prompt(arguments).await,
            _ => Err(anyhow::anyhow!("Unknown tool: {}", tool_name)),
        }
    }
}

fn window_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "num_draws": {
                "type": "integer",
                "description": description
            }
        }
    })
}

fn tools() -> Vec<Tool> {
    const WINDOW: &str = "Only use the most recent N draws (default: all draws)";

    vec![
        Tool {
            name: "update_draws",
            description: "Fetch new Daily Cash 539 draws from the official API and merge them into the draw table",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        Tool {
            name: "get_latest_draws",
            description: "Get the most recent draws, oldest first",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "count": {
                        "type": "integer",
                        "description": "Number of draws to return (default: 5)"
                    }
                }
            }),
        },
        Tool {
            name: "get_overview",
            description: "Get the total number of draws and the earliest and latest draw dates",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        Tool {
            name: "get_frequency",
            description: "Count how often each number 1-39 was drawn",
            input_schema: window_schema(WINDOW),
        },
        Tool {
            name: "get_sum_analysis",
            description: "Mean, median, standard deviation and range of draw sums",
            input_schema: window_schema(WINDOW),
        },
        Tool {
            name: "get_ratio_analysis",
            description: "Odd/even and big/small ratio of each draw and their distributions",
            input_schema: window_schema(WINDOW),
        },
        Tool {
            name: "get_consecutive_analysis",
            description: "Consecutive number pairs and the share of draws containing one",
            input_schema: window_schema(WINDOW),
        },
        Tool {
            name: "get_last_digits",
            description: "Count how often each last digit 0-9 was drawn",
            input_schema: window_schema(WINDOW),
        },
        Tool {
            name: "get_analysis_prompt",
            description: "Build the statistics digest and AI analysis prompt",
            input_schema: window_schema("Number of recent draws to summarise (default: 30)"),
        },
    ]
}

pub fn stdio() -> (BufReader<io::Stdin>, io::Stdout) {
    (BufReader::new(io::stdin()), io::stdout())
}
