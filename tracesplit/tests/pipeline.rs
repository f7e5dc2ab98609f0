//! End-to-end pipeline tests

// Imports
use {
	rand::{rngs::StdRng, SeedableRng},
	std::{collections::HashSet, fs, path::Path},
	tracesplit::{
		pipeline::{ALL_FILE, TEST_FILE, TRAIN_FILE, VALID_FILE},
		Access,
		CommandPartitioner,
		Config,
		Error,
		FilePartitioner,
		NativePartitioner,
		Pipeline,
		Report,
		Stage,
	},
};

/// Reads all accesses in `path`
fn read_accesses(path: &Path) -> Vec<Access> {
	fs::read_to_string(path)
		.unwrap()
		.lines()
		.map(|line| line.parse().unwrap())
		.collect()
}

/// Writes a trace with `records` accesses to `path`, where access `idx` has
/// pc `idx` and an address in set `idx % 16`.
fn write_trace(path: &Path, records: u64) {
	let trace = (0..records)
		.map(|idx| format!("{}\n", Access::new(idx, (idx << 12) | (idx % 16))))
		.collect::<String>();
	fs::write(path, trace).unwrap();
}

/// Runs the pipeline over `trace` with `config`, outputting to `config.output_dir`
fn run(config: Config, partitioner: impl FilePartitioner, seed: u64, trace: &Path) -> Report {
	let mut pipeline = Pipeline::new(config, partitioner, StdRng::seed_from_u64(seed)).unwrap();
	let report = pipeline.run(trace).unwrap();
	assert_eq!(pipeline.stage(), Stage::Done);
	report
}

/// Checks the outputs in `dir` against `report`, returning all accepted accesses
fn check_outputs(dir: &Path, report: &Report) -> Vec<Access> {
	let train = self::read_accesses(&dir.join(TRAIN_FILE));
	let valid = self::read_accesses(&dir.join(VALID_FILE));
	let test = self::read_accesses(&dir.join(TEST_FILE));
	let all = self::read_accesses(&dir.join(ALL_FILE));

	assert_eq!(train.len() as u64, report.train);
	assert_eq!(valid.len() as u64, report.valid);
	assert_eq!(test.len() as u64, report.test);
	assert_eq!(all.len() as u64, report.accepted);
	assert_eq!(report.train + report.valid + report.test + report.dropped, report.accepted);

	// The outputs are consecutive slices of the shuffled trace
	let split = train.iter().chain(&valid).chain(&test).copied().collect::<Vec<_>>();
	assert_eq!(split[..], all[..split.len()]);

	// And no access is repeated
	let unique = split.iter().copied().collect::<HashSet<_>>();
	assert_eq!(unique.len(), split.len());

	// No intermediate files are left behind
	let leftovers = fs::read_dir(dir)
		.unwrap()
		.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
		.filter(|name| name.starts_with("_filter_traces") || name.ends_with(".partial"))
		.collect::<Vec<_>>();
	assert!(leftovers.is_empty(), "Leftover files: {leftovers:?}");

	all
}

#[test]
fn small_trace() {
	let dir = tempfile::tempdir().unwrap();
	let trace = dir.path().join("trace.csv");
	fs::write(
		&trace,
		"0x1,0x10\n0x2,0x21\n0x3,0x32\n0x4,0x40\n0x5,0x51\n0x6,0x6f\n0x7,0x70\n0x8,0x81\n0x9,0x90\n0xa,0xa1\n",
	)
	.unwrap();

	let config = Config {
		cache_sets: Some(vec![0, 1]),
		batch_size: 1,
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let report = self::run(config, NativePartitioner, 0, &trace);
	assert_eq!(report.records_read, 10);
	assert_eq!(report.accepted, 8);
	assert_eq!(report.split_len, 0);
	assert_eq!(report.dropped, 8);

	let all = self::check_outputs(dir.path(), &report);
	assert!(all.iter().all(|access| access.addr & 0xf <= 1));
}

#[test]
fn batch_aligned_split() {
	let dir = tempfile::tempdir().unwrap();
	let trace = dir.path().join("trace.csv");

	// 2000 accesses over 16 sets, so 1000 in the first 8 sets
	self::write_trace(&trace, 2000);

	let config = Config {
		cache_sets: Some((0..8).collect()),
		batch_size: 32,
		chunk_size: 50,
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let report = self::run(config, NativePartitioner, 1, &trace);
	assert_eq!(report, Report {
		records_read: 2000,
		accepted:     1000,
		batch_size:   32,
		split_len:    96,
		train:        768,
		valid:        96,
		test:         96,
		dropped:      40,
	});

	let all = self::check_outputs(dir.path(), &report);
	assert!(all.iter().all(|access| access.addr % 16 < 8));
	assert_eq!(all.iter().map(|access| access.pc).collect::<HashSet<_>>().len(), 1000);
}

#[test]
fn batch_size_one() {
	let dir = tempfile::tempdir().unwrap();
	let trace = dir.path().join("trace.csv");
	self::write_trace(&trace, 1234);

	let config = Config {
		cache_sets: Some((0..16).collect()),
		batch_size: 1,
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let report = self::run(config, NativePartitioner, 2, &trace);
	assert_eq!(report.split_len, 123);
	assert_eq!(report.train, 984);
	assert_eq!(report.valid, 123);
	assert_eq!(report.test, 123);
	assert_eq!(report.dropped, 4);

	self::check_outputs(dir.path(), &report);
}

/// Runs with remainders spanning several parts, returning the reports
fn run_long_remainders(partitioner: impl FilePartitioner + Clone) -> Vec<Report> {
	[(400, 32), (19, 1), (1000, 64), (639, 32)]
		.into_iter()
		.map(|(records, batch_size)| {
			let dir = tempfile::tempdir().unwrap();
			let trace = dir.path().join("trace.csv");
			self::write_trace(&trace, records);

			let config = Config {
				cache_sets: Some((0..16).collect()),
				batch_size,
				output_dir: dir.path().to_path_buf(),
				..Config::default()
			};
			let report = self::run(config, partitioner.clone(), 5, &trace);
			assert!(report.dropped > report.split_len, "{report:?}");
			self::check_outputs(dir.path(), &report);

			report
		})
		.collect()
}

#[test]
fn long_remainder() {
	let reports = self::run_long_remainders(NativePartitioner);
	let lens = reports
		.iter()
		.map(|report| (report.split_len, report.train, report.dropped))
		.collect::<Vec<_>>();
	assert_eq!(lens, [(32, 256, 80), (1, 8, 9), (64, 512, 360), (32, 256, 319)]);
}

#[cfg(unix)]
#[test]
fn long_remainder_external_tools() {
	let native = self::run_long_remainders(NativePartitioner);
	let external = self::run_long_remainders(CommandPartitioner::new());
	assert_eq!(native, external);
}

#[test]
fn seeded_runs_are_reproducible() {
	let run_with_seed = |seed| {
		let dir = tempfile::tempdir().unwrap();
		let trace = dir.path().join("trace.csv");
		self::write_trace(&trace, 5000);

		let config = Config {
			chunk_size: 10,
			output_dir: dir.path().to_path_buf(),
			..Config::default()
		};
		self::run(config, NativePartitioner, seed, &trace);
		fs::read(dir.path().join(ALL_FILE)).unwrap()
	};

	assert_eq!(run_with_seed(7), run_with_seed(7));
	assert_ne!(run_with_seed(7), run_with_seed(8));
}

#[test]
fn overwrites_existing_outputs() {
	let dir = tempfile::tempdir().unwrap();
	let trace = dir.path().join("trace.csv");
	self::write_trace(&trace, 320);

	for name in [TRAIN_FILE, VALID_FILE, TEST_FILE, ALL_FILE] {
		fs::write(dir.path().join(name), "0xdead,0xbeef\n".repeat(1000)).unwrap();
	}

	let config = Config {
		cache_sets: Some((0..16).collect()),
		batch_size: 1,
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let report = self::run(config, NativePartitioner, 3, &trace);
	assert_eq!(report.accepted, 320);

	let all = self::check_outputs(dir.path(), &report);
	assert!(!all.contains(&Access::new(0xdead, 0xbeef)));
}

#[test]
fn malformed_trace() {
	let dir = tempfile::tempdir().unwrap();
	let trace = dir.path().join("trace.csv");
	fs::write(&trace, "0x1,0x10\n0x2,0xzz\n").unwrap();

	let config = Config {
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let mut pipeline = Pipeline::new(config, NativePartitioner, StdRng::seed_from_u64(0)).unwrap();
	let err = pipeline.run(&trace).unwrap_err();
	assert!(matches!(err, Error::Parse { line: 2, .. }), "Unexpected error: {err:?}");
	assert_eq!(pipeline.stage(), Stage::Reading);
	assert!(!dir.path().join(TRAIN_FILE).exists());
}

#[test]
fn missing_trace() {
	let dir = tempfile::tempdir().unwrap();
	let config = Config {
		output_dir: dir.path().to_path_buf(),
		..Config::default()
	};
	let mut pipeline = Pipeline::new(config, NativePartitioner, StdRng::seed_from_u64(0)).unwrap();
	let err = pipeline.run(&dir.path().join("missing.csv")).unwrap_err();
	assert!(matches!(err, Error::Io { .. }), "Unexpected error: {err:?}");
}

#[cfg(unix)]
#[test]
fn external_tools_match_native() {
	let run_with = |partitioner: Box<dyn FilePartitioner>| {
		let dir = tempfile::tempdir().unwrap();
		let trace = dir.path().join("trace.csv");
		self::write_trace(&trace, 3000);

		let config = Config {
			output_dir: dir.path().to_path_buf(),
			..Config::default()
		};
		let report = self::run(config, partitioner, 4, &trace);
		self::check_outputs(dir.path(), &report);

		let outputs = [TRAIN_FILE, VALID_FILE, TEST_FILE].map(|name| fs::read(dir.path().join(name)).unwrap());
		(report, outputs)
	};

	let native = run_with(Box::new(NativePartitioner));
	let external = run_with(Box::new(CommandPartitioner::new()));
	assert_eq!(native, external);
}
