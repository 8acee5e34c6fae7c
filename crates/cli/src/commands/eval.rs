//! `switchboard eval`: score routing against a YAML case file.

use std::path::Path;

use switchboard_config::AppConfig;
use switchboard_router::{parse_cases, run_eval, TurnRouter};

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        return Err(format!(
            "Evaluation runs against the configured model and needs an API key. \
             Set SWITCHBOARD_API_KEY or add llm.api_key to {}.",
            AppConfig::config_dir().join("config.toml").display()
        )
        .into());
    }

    let yaml = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let cases = parse_cases(&yaml)?;

    println!(
        "Running {} case(s) against {}",
        cases.len(),
        config.llm.model
    );
    let router = TurnRouter::from_config(&config).await?;
    let report = run_eval(&router, &cases).await?;

    println!();
    for result in &report.results {
        let mark = if result.route_ok { "ok  " } else { "MISS" };
        let contains = match result.contains_ok {
            Some(true) => "  contains=yes",
            Some(false) => "  contains=NO",
            None => "",
        };
        println!(
            "  {mark}  {:<24} route={:<16} wanted={}{contains}",
            result.id,
            result.predicted_action,
            result.expected.join("|"),
        );
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&report.summary)?);

    Ok(())
}
