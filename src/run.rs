use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::*;
use crate::data::{build_sequences, BuildOutcome};
use crate::error::Result;
use crate::io::CATEGORY_COLUMN;

/// Name of the partition covering the whole selection
pub const ALL_PARTITION: &str = "all";

/// Events of one population.
#[derive( Debug )]
pub struct Partition<'a> {
	name: String,
	events: Vec<&'a Event>,
}

#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum PartitionOutcome {
	/// No entity is left after filtering
	Empty,
	Mined,
}

/// Everything produced for one partition.
#[derive( Debug )]
pub struct PartitionReport {
	name: String,
	database: SequenceDatabase,
	/// entities dropped while building sequences
	rejected: Vec<MiningError>,
	outcome: PartitionOutcome,
	result: MiningResult,
	elapsed: Duration,
}

impl <'a> Partition<'a> {
	pub fn new( name: &str, events: Vec<&'a Event> ) -> Partition<'a> {
		Partition { name: name.to_string(), events }
	}

	pub fn name( &self ) -> &str { &self.name }
	pub fn events( &self ) -> &[&'a Event] { &self.events }
}

impl PartitionReport {
	pub fn name( &self ) -> &str { &self.name }
	pub fn database( &self ) -> &SequenceDatabase { &self.database }
	pub fn rejected( &self ) -> &[MiningError] { &self.rejected }
	pub fn outcome( &self ) -> PartitionOutcome { self.outcome }
	pub fn result( &self ) -> &MiningResult { &self.result }
	pub fn elapsed( &self ) -> Duration { self.elapsed }
}

/// Splits the log into populations according to the run mode and category selection.
pub fn partition_log <'a> ( log: &'a EventLog, config: &MiningConfig ) -> Result<Vec<Partition<'a>>> {
	let requested = config.categories();
	if !log.has_category() {
		if !requested.is_empty() {
			return Err( MiningError::MissingColumn { column: CATEGORY_COLUMN.to_string() } );
		}
		return Ok( vec!( Partition::new( ALL_PARTITION, log.events().iter().collect() )));
	}

	let selected: Vec<String> = if requested.is_empty() {
		log.categories()
	} else {
		requested.to_vec()
	};

	let partitions: Vec<Partition<'a>> = match config.run_mode() {
		RunMode::Separate => selected.iter()
			.map( |category| Partition::new( category, log.select_categories( std::slice::from_ref( category ))))
			.collect(),
		// rows without a category belong to no selection, in either mode
		RunMode::Together => vec!( Partition::new( ALL_PARTITION, log.select_categories( &selected ))),
	};
	Ok( partitions )
}

/// Mines every partition of the log. Partitions run in parallel and share no state.
pub fn run( log: &EventLog, config: &MiningConfig ) -> Result<Vec<PartitionReport>> {
	let partitions = partition_log( log, config )?;
	info!( "Mining {} partitions in {} mode, thresholds {:?}",
		   partitions.len(), config.run_mode(),
		   config.thresholds().iter().map( |t| t.percentage() ).collect::<Vec<f64>>() );

	let reports: Vec<PartitionReport> = partitions.into_par_iter()
		.map( |partition| mine_partition( partition, config ))
		.collect();
	Ok( reports )
}

/// Builds the sequences of one partition and mines them under every threshold
pub fn mine_partition( partition: Partition, config: &MiningConfig ) -> PartitionReport {
	let partition_span = info_span!( "partition", name = partition.name.as_str() );
	let _entered = partition_span.enter();
	let start = Instant::now();

	let BuildOutcome { database, rejected } = build_sequences( partition.events.iter().copied() );
	if !rejected.is_empty() {
		warn!( "{} entities dropped for unordered time keys", rejected.len() );
	}

	let outcome = if database.is_empty() {
		warn!( "Partition {} has no entities", partition.name );
		PartitionOutcome::Empty
	} else {
		PartitionOutcome::Mined
	};
	let result = GspMiner::from_config( config ).mine( &database );

	let elapsed = start.elapsed();
	info!( "Partition {} finished in {:.3}s", partition.name, elapsed.as_secs_f64() );
	PartitionReport {
		name: partition.name,
		database,
		rejected,
		outcome,
		result,
		elapsed,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn departments() -> EventLog {
		let events = vec!(
			Event::new( "s1", "BISC1", 1.0 ).with_category( "BISC" ),
			Event::new( "s1", "BISC2", 2.0 ).with_category( "BISC" ),
			Event::new( "s2", "BISC1", 1.0 ).with_category( "BISC" ),
			Event::new( "s2", "CHEM1", 1.0 ).with_category( "CHEM" ),
			Event::new( "s3", "CHEM1", 1.0 ).with_category( "CHEM" ),
			Event::new( "s4", "MATH1", 1.0 ).with_category( "MATH" ),
		);
		EventLog::new( events, true )
	}

	fn config( categories: &[&str], mode: &str ) -> MiningConfig {
		MiningConfig::new( &["50"], categories, mode, None ).unwrap()
	}

	#[test]
	fn test_separate_partitions() {
		let log = departments();
		let partitions = partition_log( &log, &config( &["CHEM", "BISC"], "separate" )).unwrap();
		let names: Vec<&str> = partitions.iter().map( |p| p.name() ).collect();
		assert_eq!( names, vec!( "CHEM", "BISC" ));
		assert_eq!( partitions[0].events().len(), 2 );
		assert_eq!( partitions[1].events().len(), 3 );

		// no selection means every category
		let partitions = partition_log( &log, &config( &[], "separate" )).unwrap();
		assert_eq!( partitions.len(), 3 );
	}

	#[test]
	fn test_together_partition() {
		let log = departments();
		let partitions = partition_log( &log, &config( &["CHEM", "BISC"], "together" )).unwrap();
		assert_eq!( partitions.len(), 1 );
		assert_eq!( partitions[0].name(), ALL_PARTITION );
		assert_eq!( partitions[0].events().len(), 5 );
	}

	#[test]
	/// Both run modes see the same population when every category is selected
	fn test_uncategorized_rows_excluded() {
		let mut events = departments().events().to_vec();
		events.push( Event::new( "s5", "BISC1", 1.0 ));
		events.push( Event::new( "s6", "BISC1", 1.0 ));
		let log = EventLog::new( events, true );

		let together = partition_log( &log, &config( &[], "together" )).unwrap();
		assert_eq!( together[0].events().len(), 6 );
		assert!( together[0].events().iter().all( |e| e.category.is_some() ));

		let reports = run( &log, &config( &[], "together" )).unwrap();
		assert_eq!( reports[0].result().total(), 4 );
		let separate = run( &log, &config( &[], "separate" )).unwrap();
		let total: Count = separate.iter().map( |r| r.result().total() ).sum();
		// s2 takes part in two categories
		assert_eq!( total, 5 );
	}

	#[test]
	fn test_missing_category_column() {
		let log = EventLog::new( vec!( Event::new( "s1", "X", 1.0 )), false );
		match partition_log( &log, &config( &["CHEM"], "separate" )) {
			Err( MiningError::MissingColumn { column } ) => assert_eq!( column, CATEGORY_COLUMN ),
			other => panic!( "expected missing column, got {other:?}" ),
		}
		let partitions = partition_log( &log, &config( &[], "separate" )).unwrap();
		assert_eq!( partitions.len(), 1 );
		assert_eq!( partitions[0].name(), ALL_PARTITION );
	}

	#[test]
	/// A selected category without entities is reported as empty, not as an error
	fn test_empty_partition() {
		let log = departments();
		let reports = run( &log, &config( &["PHYS", "BISC"], "separate" )).unwrap();
		assert_eq!( reports.len(), 2 );

		let physics = reports.iter().find( |r| r.name() == "PHYS" ).unwrap();
		assert_eq!( physics.outcome(), PartitionOutcome::Empty );
		assert_eq!( physics.result().total(), 0 );

		let biology = reports.iter().find( |r| r.name() == "BISC" ).unwrap();
		assert_eq!( biology.outcome(), PartitionOutcome::Mined );
		assert_eq!( biology.result().total(), 2 );
		// BISC1 occurs for both students
		let run = &biology.result().runs()[0];
		assert_eq!( run.level( 1 ).unwrap().len(), 2 );
	}
}
