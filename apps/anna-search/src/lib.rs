use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use anna_domain::{calculator, slenderness};
use anna_service::{AnnaService, FilteredSearchRequest, MetadataFilter, SearchRequest};

#[derive(Debug, Parser)]
#[command(
	version = anna_cli::VERSION,
	rename_all = "kebab",
	styles = anna_cli::styles(),
)]
pub struct Args {
	/// Required by the `search` and `filtered` commands.
	#[arg(long, short = 'c', value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Hybrid dense + sparse search of the engineering database.
	Search {
		query: String,
		#[arg(long)]
		top_k: Option<u32>,
		#[arg(long)]
		namespace: Option<String>,
		#[arg(long, value_name = "ID")]
		document: Option<String>,
	},
	/// Exact metadata retrieval, concatenated in reading order.
	Filtered {
		#[arg(long, default_value = "")]
		query: String,
		#[arg(long, value_name = "ID")]
		document: Option<String>,
		#[arg(long)]
		page: Option<i64>,
		#[arg(long = "table", value_name = "REF")]
		tables: Vec<String>,
		#[arg(long = "figure", value_name = "REF")]
		figures: Vec<String>,
		#[arg(long = "clause", value_name = "REF")]
		clauses: Vec<String>,
		#[arg(long)]
		top_k: Option<u32>,
		#[arg(long)]
		namespace: Option<String>,
	},
	/// AS 4100 slenderness ratio of a compression member.
	Slenderness {
		/// Effective length in mm.
		effective_length: f64,
		/// Radius of gyration in mm.
		radius_of_gyration: f64,
	},
	/// Evaluate an arithmetic expression.
	Calc { expression: String },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let output = match args.command {
		Command::Search { query, top_k, namespace, document } => {
			let service = load_service(args.config)?;
			let outcome = service
				.search(SearchRequest { query, top_k, namespace, source_document_id: document })
				.await;

			serde_json::to_value(outcome)?
		},
		Command::Filtered {
			query,
			document,
			page,
			tables,
			figures,
			clauses,
			top_k,
			namespace,
		} => {
			let service = load_service(args.config)?;
			let filter = MetadataFilter {
				source_document_id: document,
				page_number: page,
				tables_mentioned: tables,
				figures_mentioned: figures,
				clauses_mentioned: clauses,
			};
			let outcome = service
				.filtered_search(FilteredSearchRequest { query, top_k, namespace, filter })
				.await;

			serde_json::to_value(outcome)?
		},
		Command::Slenderness { effective_length, radius_of_gyration } => {
			init_tracing("info");

			let check = slenderness::slenderness(effective_length, radius_of_gyration)?;
			let mut value = serde_json::to_value(check)?;

			value["report"] = Value::String(check.render());

			value
		},
		Command::Calc { expression } => {
			init_tracing("info");

			let result = calculator::evaluate(&expression)?;

			serde_json::json!({ "expression": expression, "result": result })
		},
	};

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

fn load_service(config: Option<PathBuf>) -> color_eyre::Result<AnnaService> {
	let path = config.ok_or_else(|| eyre::eyre!("--config is required for index searches."))?;
	let config = anna_config::load(&path)?;

	init_tracing(&config.service.log_level);
	tracing::info!(
		config = %path.display(),
		namespace = %config.index.namespace,
		"Configuration loaded."
	);

	Ok(AnnaService::new(config)?)
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
