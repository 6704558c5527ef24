use std::io::Write;
use std::path::Path;

use futures::StreamExt;

use crate::agent::{Agent, OpenAiAgent};
use crate::config::ChatConfig;
use crate::error::Result;
use crate::types::ResponseAccumulator;

/// Execute the `ask` command: send one message and print the reply.
pub async fn execute(config_path: Option<&Path>, message: &str, stream: bool) -> Result<()> {
    let config = ChatConfig::load_with(config_path)?;
    let agent = OpenAiAgent::from_config(&config.model)?;
    tracing::info!(model = agent.model(), stream, "Sending one-shot message");

    if !stream {
        let reply = agent.invoke(message).await?;
        println!("{reply}");
        return Ok(());
    }

    let mut events = agent.invoke_streaming(message);
    let mut acc = ResponseAccumulator::new();
    let mut printed = false;
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        if let Some(delta) = acc.apply(event?) {
            print!("{delta}");
            stdout.flush()?;
            printed = true;
        }
    }

    // Upstreams that answer in one piece produce no deltas to echo
    if !printed {
        print!("{}", acc.text());
    }
    println!();
    Ok(())
}
