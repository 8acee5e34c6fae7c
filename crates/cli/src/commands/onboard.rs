//! `switchboard onboard`: first-time setup.

use switchboard_config::AppConfig;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Switchboard setup");
    println!("=================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Re-run with --force to overwrite it.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Wrote config.toml at: {}", config_path.display());

    println!("\nNext steps:");
    println!(
        "  1. Add a model API key: edit {} or set SWITCHBOARD_API_KEY",
        config_path.display()
    );
    println!("  2. Run: switchboard chat");
    println!("  3. Optional: switchboard serve exposes the HTTP API\n");

    Ok(())
}
