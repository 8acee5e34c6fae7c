//! `switchboard chat`: talk to the router from the terminal.

use std::io::Write;

use switchboard_config::AppConfig;
use switchboard_router::TurnRouter;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(user: &str, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early, with pointers instead of a bare failure
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No model API key configured.");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SWITCHBOARD_API_KEY");
        eprintln!("    OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add llm.api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = TurnRouter::from_config(&config).await?;

    if let Some(message) = message {
        // Single message mode: just the answer on stdout, tool note on stderr
        let response = router.handle_turn(user, &message).await?;
        println!("{}", response.answer);
        if let Some(tool) = response.used_tool {
            eprintln!("[used {tool}]");
        }
        return Ok(());
    }

    println!();
    println!("Switchboard interactive chat");
    println!("  Model: {}", router.model_name());
    println!("  Tools: {}", router.tool_names().join(", "));
    println!("  User:  {user}");
    println!();
    println!("Type a message and press Enter. 'exit' or 'quit' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("you> ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }
        if !text.is_empty() {
            match router.handle_turn(user, text).await {
                Ok(response) => match response.used_tool.as_deref() {
                    Some(tool) => println!("bot> {}  [{tool}]", response.answer),
                    None => println!("bot> {}", response.answer),
                },
                Err(e) => eprintln!("error: {e}"),
            }
        }
        print!("you> ");
        std::io::stdout().flush()?;
    }

    println!("bye");
    Ok(())
}
