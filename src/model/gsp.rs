use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::trace;

use super::*;

/// Level-wise candidate generation for basket sequences with Apriori pruning.
#[derive( Debug, Clone, Copy, Default )]
pub struct GspGenerator;

impl Generator for GspGenerator {

	fn seed <D: Database> ( &self, data: &D ) -> Vec<Candidate> {
		data.create_universe().into_iter().map( Candidate::singleton ).collect()
	}

	fn generate( &self, frequent: &[Candidate], extensions: &[Item] ) -> Vec<Candidate> {
		let known: FxHashSet<&Candidate> = frequent.iter().collect();

		let grown: FxHashSet<Candidate> = frequent.par_iter()
			.flat_map_iter( |candidate| grow( candidate, extensions ))
			.filter( |candidate| is_closed_downward( candidate, &known ))
			.collect();

		let mut candidates: Vec<Candidate> = grown.into_iter().collect();
		candidates.sort_unstable();
		trace!( "{} frequent candidates grew into {} candidates", frequent.len(), candidates.len() );
		candidates
	}
}

/// Extends the candidate by every item, once into its last basket and once as a new basket
fn grow( candidate: &Candidate, extensions: &[Item] ) -> Vec<Candidate> {
	let mut grown = Vec::with_capacity( 2 * extensions.len() );
	for item in extensions {
		if let Some( co_occurring ) = candidate.extend_last_basket( *item ) {
			grown.push( co_occurring );
		}
		grown.push( candidate.append_basket( *item ));
	}
	grown
}

/// Every candidate obtained by removing one item must be frequent
fn is_closed_downward( candidate: &Candidate, known: &FxHashSet<&Candidate> ) -> bool {
	candidate.sub_candidates().all( |sub| known.contains( &sub ))
}
