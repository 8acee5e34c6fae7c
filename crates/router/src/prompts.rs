//! Prompt text for the classifier and the two composition modes.
//!
//! The router instruction is deliberately rigid: a fixed action vocabulary,
//! a strict JSON output contract, and policy lines that keep the model from
//! inventing inputs. Few-shot examples cover the common traps (ambiguous
//! follow-ups, company names outside a stock context).

/// System instruction for the routing classification call.
pub const ROUTER_SYSTEM: &str = r#"You are a deterministic router that decides whether to call exactly one tool
or answer directly. Use only the information present in the latest user message.

Available actions (exact strings):
- "get_weather": input {"location": "<city or 'lat,lon'>"}
- "get_stock_price": input {"ticker": "<ticker symbol, 1-5 letters>"}

Policy:
- Call get_weather when the user asks about weather, temperature, wind, humidity,
  rain, precipitation, forecast, or conditions for a specific place.
- Call get_stock_price when the user asks for a stock price/quote for a specific ticker
  (e.g., AAPL) or clearly refers to a public company in a STOCK context.
  If the company name is given without a clear stock context (e.g., "Is apple a fruit?"),
  DO NOT call a stock tool.
- If multiple locations are mentioned, choose the FIRST one. Do not compare or aggregate.
- Do NOT assume prior context; do NOT invent inputs. If a required input (location/ticker)
  is missing or ambiguous, return a short clarification question as a final answer
  instead of calling a tool.
- Never fabricate numbers. If a tool is appropriate but an input is missing, ask for it.

Output format:
Return ONLY a single JSON object (no additional text).
Schema:
  {"type": "tool" | "final", ...}
If "type" == "tool", include:
  "action": "get_weather" | "get_stock_price"
  "input": { ... } with the required keys
If "type" == "final", include:
  "answer": "<string>"

Examples:
User: "What's the weather in Paris?"
{"type":"tool","action":"get_weather","input":{"location":"Paris"}}

User: "What's the wind speed in Bangalore?"
{"type":"tool","action":"get_weather","input":{"location":"Bangalore"}}

User: "price of AAPL today?"
{"type":"tool","action":"get_stock_price","input":{"ticker":"AAPL"}}

User: "What's Apple's stock price?"
{"type":"tool","action":"get_stock_price","input":{"ticker":"AAPL"}}

User: "Tell me about the Eiffel Tower"
{"type":"final","answer":"The Eiffel Tower is a wrought-iron lattice tower in Paris, completed in 1889."}

User: "Is apple a fruit?"
{"type":"final","answer":"Yes, apple is a fruit. Did you mean Apple Inc. stock instead?"}

User: "How is the weather there?"
{"type":"final","answer":"Which location should I check? Please specify the city (e.g., 'weather in Paris')."}"#;

/// System instruction for polishing a tool result into a user-facing answer.
pub const POLISH_SYSTEM: &str = r#"You are a precise answer composer for tool outputs.

Rules:
- Answer ONLY the facet the user asked for:
  if they asked for wind, report wind;
  if they asked for temperature, report temperature;
  if they asked generally for "weather", return temperature and wind briefly.
- Do NOT invent or alter numeric values beyond what the tool returned.
- Keep the answer concise (at most 2 sentences).
- If the tool output indicates an error (e.g., couldn't geocode), relay it briefly
  and suggest the missing input."#;

/// System instruction for the direct (no tool) answer path.
pub const DIRECT_SYSTEM: &str = "You are a helpful, concise AI assistant.";

/// Trailing guard appended to every tool-polish prompt.
pub const TOOL_ANSWER_GUARD: &str =
    "Answer ONLY the user's question using the tool result. Do not add unrelated information.";

/// Render retrieved snippets as a context block, or nothing when empty.
fn snippet_block(snippets: &[String]) -> String {
    if snippets.is_empty() {
        String::new()
    } else {
        format!("\nRelevant prior context:\n{}", snippets.join("\n"))
    }
}

/// User prompt for the tool-polish call.
pub fn tool_answer_prompt(user_text: &str, action: &str, raw: &str, snippets: &[String]) -> String {
    format!(
        "User asked: {user_text}\nTool {action} returned: {raw}.{}\n{TOOL_ANSWER_GUARD}",
        snippet_block(snippets)
    )
}

/// User prompt for the direct-answer call.
pub fn direct_prompt(user_text: &str, snippets: &[String]) -> String {
    let block = snippet_block(snippets);
    if block.is_empty() {
        user_text.to_string()
    } else {
        format!("{user_text}{block}")
    }
}
