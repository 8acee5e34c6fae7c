//! Built-in tool implementations for Switchboard.
//!
//! Tools give the router something concrete to dispatch to: current
//! weather via Open-Meteo and latest stock prices via Yahoo or Alpha
//! Vantage. Each tool validates its own input and phrases recoverable
//! problems as user-facing answers rather than errors.

pub mod cache;
pub mod stocks;
pub mod weather;

pub use cache::TtlCache;
pub use stocks::StockPriceTool;
pub use weather::WeatherTool;

use switchboard_config::ToolsConfig;
use switchboard_core::tool::ToolRegistry;

/// Create the default tool registry with all built-in tools.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WeatherTool::new(&config.weather)));
    registry.register(Box::new(StockPriceTool::new(&config.stocks)));
    registry
}
