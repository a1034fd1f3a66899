//! paperbridge config - Show the effective configuration

use clap::Args;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::Config;
use crate::error::{BridgeError, Result};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dotted key to print (e.g. broker.reply_timeout_ms); omit for everything
    pub key: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    match &args.key {
        Some(key) => {
            let value = config_value_at(&ctx.config, key)?;
            if ctx.robot_mode {
                return output::emit_json(&value);
            }
            println!("{}", format_value(&value));
        }
        None => {
            if ctx.robot_mode {
                return output::emit_json(&output::robot_ok(&ctx.config));
            }
            let rendered = toml::to_string_pretty(&ctx.config)
                .map_err(|err| BridgeError::Config(format!("render config: {err}")))?;
            print!("{rendered}");
        }
    }
    Ok(())
}

fn config_value_at(config: &Config, key: &str) -> Result<serde_json::Value> {
    let mut current = serde_json::to_value(config)?;
    for segment in key.split('.') {
        current = current
            .get(segment)
            .cloned()
            .ok_or_else(|| BridgeError::Config(format!("unknown config key: {key}")))?;
    }
    Ok(current)
}

fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
