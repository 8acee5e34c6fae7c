//! `switchboard serve`: start the HTTP API server.

use switchboard_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Switchboard gateway");
    println!("  Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Auth:       {}",
        if config.gateway.auth_token.is_some() {
            "bearer token"
        } else {
            "open"
        }
    );
    println!("  Rate limit: {}/min", config.gateway.rate_limit_per_minute);

    switchboard_gateway::start(config).await?;

    Ok(())
}
