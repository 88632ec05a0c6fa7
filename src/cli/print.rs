use anyhow::{anyhow, Result};
use clap::Args;
use duallist::DualListWidget;
use serde_json::{json, Value};
use tracing::debug;

/// Resolve the options without a terminal and print them as JSON
#[derive(Args, Debug)]
pub struct PrintCommand {
    /// Pretty-print the JSON output
    #[arg(short = 'p', long = "pretty")]
    pub pretty: bool,
}

impl PrintCommand {
    pub fn execute(&self, widget: &DualListWidget) -> Result<()> {
        debug!("Executing print command");

        if let Some(error) = widget.last_error() {
            return Err(anyhow!("Failed to resolve options: {}", error));
        }

        let report = report(widget);
        let output = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", output);
        Ok(())
    }
}

fn report(widget: &DualListWidget) -> Value {
    json!({
        "name": widget.name(),
        "kind": format!("{:?}", widget.kind()),
        "value": widget.value(),
        "display": widget.display_value(),
        "options": widget.options(),
    })
}
