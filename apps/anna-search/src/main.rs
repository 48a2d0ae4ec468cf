use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = anna_search::Args::parse();
	anna_search::run(args).await
}
