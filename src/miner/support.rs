use rayon::prelude::*;
use tracing::trace;

use crate::*;

/// Support of one candidate in one population.
#[derive( Debug, Clone, PartialEq )]
pub struct SupportRecord {
	candidate: Candidate,
	count: Count,
	/// count / entities * 100
	percentage: f64,
}

/// Support records of one level, sorted by candidate.
#[derive( Debug, Clone, Default )]
pub struct SupportTable {
	records: Vec<SupportRecord>,
}

/// Counts candidate supports with one pass over the sequences per level.
pub struct SupportCounter<'d, D> {
	data: &'d D,
}

impl SupportRecord {
	pub fn new( candidate: Candidate, count: Count, total: Count ) -> SupportRecord {
		SupportRecord {
			candidate,
			count,
			percentage: calc_percentage( count, total ),
		}
	}

	pub fn candidate( &self ) -> &Candidate { &self.candidate }
	pub fn count( &self ) -> Count { self.count }
	pub fn percentage( &self ) -> f64 { self.percentage }

	pub fn meets( &self, threshold: &Threshold ) -> bool {
		threshold.is_met_by( self.percentage )
	}
}

impl SupportTable {
	fn new( mut records: Vec<SupportRecord> ) -> SupportTable {
		records.sort_unstable_by( |left, right| left.candidate.cmp( &right.candidate ));
		SupportTable { records }
	}

	pub fn records( &self ) -> &[SupportRecord] { &self.records }
	pub fn len( &self ) -> usize { self.records.len() }
	pub fn is_empty( &self ) -> bool { self.records.is_empty() }

	pub fn get( &self, candidate: &Candidate ) -> Option<&SupportRecord> {
		self.records.binary_search_by( |record| record.candidate.cmp( candidate ))
			.ok()
			.map( |index| &self.records[ index ] )
	}

	/// Records meeting the threshold, sorted by candidate
	pub fn frequent( &self, threshold: &Threshold ) -> impl Iterator<Item = &SupportRecord> + '_ {
		let threshold = *threshold;
		self.records.iter().filter( move |record| record.meets( &threshold ))
	}
}

impl <'d, D: Database + Sync> SupportCounter<'d, D> {

	pub fn new( data: &'d D ) -> SupportCounter<'d, D> {
		SupportCounter { data }
	}

	/// Counts every candidate in parallel. The candidates need not be unique.
	pub fn count( &self, candidates: Vec<Candidate> ) -> SupportTable {
		let total = self.data.number_sequences();
		let mut candidates = candidates;
		candidates.sort_unstable();
		candidates.dedup();

		let records: Vec<SupportRecord> = candidates.into_par_iter()
			.map( |candidate| {
				let count = self.data.query_support( &candidate );
				trace!( "{candidate:?} occurs in {count} of {total} sequences" );
				SupportRecord::new( candidate, count, total )
			})
			.collect();
		SupportTable::new( records )
	}
}

/// Percentage of total, zero for an empty population.
/// Scales before dividing so that whole percentages come out exact.
pub fn calc_percentage( count: Count, total: Count ) -> f64 {
	if total == 0 { 0.0 }
	else { ( count as f64 * 100.0 ) / total as f64 }
}
