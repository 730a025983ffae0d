use serde::Serialize;
use toolgate_core::config::AppConfig;
use toolgate_core::OperationDescriptor;
use toolgate_gateway::Gateway;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ToolListing {
    count: usize,
    tools: Vec<&'static OperationDescriptor>,
}

pub fn run(config: &AppConfig) -> CommandResult {
    let gateway = match Gateway::from_config(config) {
        Ok(gateway) => gateway,
        Err(error) => {
            return CommandResult::failure("tools", "config_validation", error.to_string(), 2)
        }
    };

    let tools = gateway.tool_descriptions();
    CommandResult::document("tools", 0, &ToolListing { count: tools.len(), tools })
}
