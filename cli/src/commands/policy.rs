use crate::config::SieveConfig;
use crate::error::CliError;
use std::path::Path;

/// Print the effective filter policy as JSON.
pub fn print_policy(config: Option<&Path>) -> Result<(), CliError> {
    let config = SieveConfig::load_or_default(config)?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config.policy)?);
    Ok(())
}
