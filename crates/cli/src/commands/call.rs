use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::runtime::Runtime;
use toolgate_core::config::AppConfig;
use toolgate_gateway::Gateway;

use super::CommandResult;

pub fn run(config: &AppConfig, operation: &str, args: Option<&str>, json: bool) -> CommandResult {
    let arguments = match parse_arguments(args) {
        Ok(arguments) => arguments,
        Err(error) => {
            return CommandResult::failure("call", "invalid_arguments", format!("{error:#}"), 2)
        }
    };
    let gateway = match Gateway::from_config(config) {
        Ok(gateway) => gateway,
        Err(error) => {
            return CommandResult::failure("call", "config_validation", error.to_string(), 2)
        }
    };
    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("call", "runtime", format!("{error:#}"), 1),
    };

    // blocking HTTP clients inside the gateway must be dropped outside the runtime
    let reply = runtime.block_on(gateway.invoke(operation, arguments));
    drop(runtime);

    let exit_code = if reply.result.is_failure() { 1 } else { 0 };
    if json {
        CommandResult::document("call", exit_code, &reply)
    } else {
        CommandResult { exit_code, output: reply.text }
    }
}

fn parse_arguments(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("--args is not valid JSON")?;
    if !value.is_object() {
        bail!("--args must be a JSON object");
    }
    Ok(value)
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("toolgate-worker")
        .build()
        .context("failed to start async runtime")
}
