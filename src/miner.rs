use tracing::{debug, info, info_span, trace, Level};

use crate::*;

mod support;

pub use support::{SupportCounter, SupportRecord, SupportTable, calc_percentage};

pub trait Miner {
	/// Mines the population to convergence under every threshold
	fn mine <D> ( &self, data: &D ) -> MiningResult where D: Database + Sync;
}

/// Progress of the level-wise search under one threshold.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum RunState {
	Init,
	/// candidates of this level wait to be counted
	Level( usize ),
	Converged,
}

/// Frequent candidates of one level under one threshold.
#[derive( Debug, Clone )]
pub struct LevelResult {
	level: usize,
	/// sorted by candidate
	frequent: Vec<SupportRecord>,
}

/// Independent search under one threshold.
#[derive( Debug, Clone )]
pub struct ThresholdRun {
	threshold: Threshold,
	state: RunState,
	/// one entry per level that produced frequent candidates
	levels: Vec<LevelResult>,
	pending: Vec<Candidate>,
	/// frequent items of level one, used to grow candidates
	extensions: Itemvec,
}

/// Outcome of mining one population.
#[derive( Debug, Clone )]
pub struct MiningResult {
	total: Count,
	runs: Vec<ThresholdRun>,
}

/// Drives the level-wise GSP search.
///
/// All thresholds advance in lock step so that one counting pass per level serves
/// every threshold, while each threshold keeps its own candidates.
pub struct GspMiner<G: Generator = GspGenerator> {
	generator: G,
	thresholds: Vec<Threshold>,
	max_level: Option<usize>,
}

impl <G: Generator> Miner for GspMiner<G> {

	fn mine <D> ( &self, data: &D ) -> MiningResult where D: Database + Sync {
		let total = data.number_sequences();
		let mut runs: Vec<ThresholdRun> = self.thresholds.iter().map( |t| ThresholdRun::new( *t )).collect();
		if total == 0 {
			info!( "Empty population, nothing to mine" );
			for run in runs.iter_mut() {
				run.state = RunState::Converged;
			}
			return MiningResult { total, runs };
		}

		let seed = self.generator.seed( data );
		info!( "Mining {total} sequences over {} items", seed.len() );
		for run in runs.iter_mut() {
			run.pending = seed.clone();
			run.state = RunState::Level( 1 );
		}

		let counter = SupportCounter::new( data );
		let mut level = 1;
		loop {
			let level_span = info_span!( "level", number = level );
			let _entered = level_span.enter();

			// thresholds share the counting pass, not their candidates
			let candidates: Vec<Candidate> = runs.iter()
				.filter( |run| run.is_active() )
				.flat_map( |run| run.pending.iter().cloned() )
				.collect();
			if candidates.is_empty() {
				break;
			}

			let table = counter.count( candidates );
			debug!( "Counted {} distinct candidates", table.len() );
			for run in runs.iter_mut().filter( |run| run.is_active() ) {
				run.advance( &table, &self.generator, self.max_level );
			}
			level += 1;
		}

		for run in &runs {
			run.log( "converged", Level::INFO );
		}
		MiningResult { total, runs }
	}
}

impl GspMiner<GspGenerator> {
	pub fn new( thresholds: &[Threshold] ) -> GspMiner<GspGenerator> {
		GspMiner::with_generator( GspGenerator, thresholds )
	}

	pub fn from_config( config: &MiningConfig ) -> GspMiner<GspGenerator> {
		let mut miner = GspMiner::new( config.thresholds() );
		miner.set_max_level( config.max_level() );
		miner
	}
}

impl <G: Generator> GspMiner<G> {
	pub fn with_generator( generator: G, thresholds: &[Threshold] ) -> GspMiner<G> {
		GspMiner {
			generator,
			thresholds: thresholds.to_vec(),
			max_level: None,
		}
	}

	/// Stops every run after the given level
	pub fn set_max_level( &mut self, max_level: Option<usize> ) {
		self.max_level = max_level;
	}
}

impl ThresholdRun {
	fn new( threshold: Threshold ) -> ThresholdRun {
		ThresholdRun {
			threshold,
			state: RunState::Init,
			levels: Vec::new(),
			pending: Vec::new(),
			extensions: Itemvec::new(),
		}
	}

	pub fn threshold( &self ) -> Threshold { self.threshold }
	pub fn state( &self ) -> RunState { self.state }
	pub fn levels( &self ) -> &[LevelResult] { &self.levels }

	pub fn is_active( &self ) -> bool {
		matches!( self.state, RunState::Level( _ ))
	}

	pub fn level( &self, level: usize ) -> Option<&LevelResult> {
		self.levels.iter().find( |l| l.level == level )
	}

	/// Number of frequent candidates over all levels
	pub fn number_frequent( &self ) -> usize {
		self.levels.iter().map( |l| l.frequent.len() ).sum()
	}

	/// Keeps the counted candidates that meet the threshold and generates the next level.
	fn advance <G: Generator> ( &mut self, table: &SupportTable, generator: &G, max_level: Option<usize> ) {
		let level = match self.state {
			RunState::Level( level ) => level,
			_ => return,
		};
		let threshold = self.threshold;
		// the table also holds the candidates of other thresholds
		let mut pending = std::mem::take( &mut self.pending );
		pending.sort_unstable();
		let frequent: Vec<SupportRecord> = table.frequent( &threshold )
			.filter( |record| pending.binary_search( record.candidate() ).is_ok() )
			.cloned()
			.collect();

		if frequent.is_empty() {
			debug!( "Threshold {threshold}% has no frequent candidates at level {level}" );
			self.state = RunState::Converged;
			return;
		}

		if level == 1 {
			self.extensions = frequent.iter().flat_map( |record| record.candidate().items() ).collect();
		}
		let seeds: Vec<Candidate> = frequent.iter().map( |record| record.candidate().clone() ).collect();
		let result = LevelResult { level, frequent };
		result.log( "frequent", Level::DEBUG );
		self.levels.push( result );

		if max_level.map_or( false, |max| level >= max ) {
			debug!( "Threshold {threshold}% reached the maximum level {level}" );
			self.state = RunState::Converged;
			return;
		}

		self.pending = generator.generate( &seeds, &self.extensions );
		self.state = if self.pending.is_empty() {
			RunState::Converged
		} else {
			RunState::Level( level + 1 )
		};
	}
}

impl LevelResult {
	pub fn level( &self ) -> usize { self.level }
	pub fn frequent( &self ) -> &[SupportRecord] { &self.frequent }
	pub fn len( &self ) -> usize { self.frequent.len() }
	pub fn is_empty( &self ) -> bool { self.frequent.is_empty() }

	pub fn contains( &self, candidate: &Candidate ) -> bool {
		self.frequent.binary_search_by( |record| record.candidate().cmp( candidate )).is_ok()
	}
}

impl MiningResult {
	pub fn total( &self ) -> Count { self.total }
	pub fn runs( &self ) -> &[ThresholdRun] { &self.runs }

	pub fn run( &self, threshold: Threshold ) -> Option<&ThresholdRun> {
		self.runs.iter().find( |run| run.threshold == threshold )
	}
}

impl Loggable for LevelResult {
	fn log( &self, message: &str, level: Level ) {
		log_at!( level, "{message}: level {} has {} frequent candidates", self.level, self.frequent.len() );
		for record in &self.frequent {
			trace!( "{:?} count {} ({:.2}%)", record.candidate(), record.count(), record.percentage() );
		}
	}
}

impl Loggable for ThresholdRun {
	fn log( &self, message: &str, level: Level ) {
		let per_level: Vec<usize> = self.levels.iter().map( |l| l.len() ).collect();
		log_at!( level, "{message}: threshold {}% in state {:?}, frequent per level {per_level:?}", self.threshold, self.state );
	}
}
