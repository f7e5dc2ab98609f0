//! Cache access trace filtering and splitting (`tracesplit`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	rand::{rngs::StdRng, SeedableRng},
	std::fs,
	tracesplit::{AddressMode, CommandPartitioner, Config, FilePartitioner, NativePartitioner, Pipeline, Report},
	tracesplit_util::logger,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file, if any, then apply the arguments over it
	let mut config = match &args.config_file {
		Some(config_path) => {
			let config_file = fs::File::open(config_path).context("Unable to open config file")?;
			serde_json::from_reader::<_, Config>(config_file).context("Unable to parse config file")?
		},
		None => Config::default(),
	};
	self::apply_args(&mut config, &args);
	tracing::debug!(?config, "Configuration");

	// Create the random source
	let seed = args.seed.unwrap_or_else(rand::random);
	tracing::info!(seed, "Shuffling with seed");
	let rng = StdRng::seed_from_u64(seed);

	// Then run the pipeline
	let partitioner: Box<dyn FilePartitioner> = match args.external_tools {
		true => Box::new(CommandPartitioner::new()),
		false => Box::new(NativePartitioner),
	};
	let mut pipeline = Pipeline::new(config, partitioner, rng).context("Invalid configuration")?;
	let report = pipeline
		.run(&args.access_trace)
		.with_context(|| format!("Pipeline failed while {}", pipeline.stage()))?;

	tracing::info!(
		"Read {} accesses, accepted {}: train {}, valid {}, test {} ({} dropped)",
		report.records_read,
		report.accepted,
		report.train,
		report.valid,
		report.test,
		report.dropped
	);

	if let Some(report_path) = &args.report_file {
		let run_report = RunReport { seed, report };
		let report_file = fs::File::create(report_path).context("Unable to create report file")?;
		serde_json::to_writer_pretty(report_file, &run_report).context("Unable to write to report file")?;
	}

	Ok(())
}

/// Applies all arguments given over `config`
fn apply_args(config: &mut Config, args: &Args) {
	if let Some(cache_sets) = &args.cache_sets {
		config.cache_sets = Some(cache_sets.clone());
	}
	if let Some(associativity) = args.associativity {
		config.associativity = associativity;
	}
	if let Some(capacity) = args.capacity {
		config.capacity = capacity;
	}
	if let Some(cache_line_size) = args.cache_line_size {
		config.cache_line_size = cache_line_size;
	}
	if let Some(batch_size) = args.batch_size {
		config.batch_size = batch_size;
	}
	if let Some(chunk_size) = args.chunk_size {
		config.chunk_size = chunk_size;
	}
	if args.line_aligned {
		config.address_mode = AddressMode::LineAligned;
	}
	if let Some(output_dir) = &args.output_dir {
		config.output_dir = output_dir.clone();
	}
}

/// Report written to the report file
#[derive(Debug)]
#[derive(serde::Serialize)]
struct RunReport {
	/// Seed used for shuffling
	seed: u64,

	/// Pipeline report
	#[serde(flatten)]
	report: Report,
}
