use std::future::Future;

use anyhow::{Context, Result};
use clap::Parser;
use lumos_cli::NodeArgs;
use tokio::runtime::Runtime;

#[derive(Debug, Parser)]
#[cfg_attr(test, derive(PartialEq))]
#[command(name = "lumos", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    node: NodeArgs,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        execute_async(self.node.execute())?
    }
}

pub fn execute_async<F: Future>(future: F) -> Result<F::Output> {
    Ok(build_tokio_runtime().context("Failed to build tokio runtime")?.block_on(future))
}

fn build_tokio_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_node_args() {
        let args = ["lumos", "--ws-uri", "ws://10.0.0.2:9944", "--sync.batch-size", "3"];

        let cli = Cli::parse_from(args);
        let node = NodeArgs::parse_from(args);

        similar_asserts::assert_eq!(cli.node, node);
        assert_eq!(cli.node.config().sync.batch_size, 3);
    }

    #[test]
    fn command_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
