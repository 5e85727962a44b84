use anyhow::Result;
use clap::Parser;
use word_label_embedding::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("word_label_embedding=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
