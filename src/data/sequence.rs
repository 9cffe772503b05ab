use std::collections::BTreeMap;

use bit_set::BitSet;
use tracing::{debug, trace, warn};

use crate::error::MiningError;
use crate::model::Candidate;

use super::{Event, Item, SequenceDatabase, TimeKey, Vocabulary};

/// Items of one entity that share a time key.
#[derive( Debug, Clone, PartialEq )]
pub struct Basket {
	time: TimeKey,
	items: BitSet,
}

/// An entity's history as baskets in ascending time order.
#[derive( Debug, Clone, PartialEq )]
pub struct DelimitedSequence {
	entity: String,
	baskets: Vec<Basket>,
}

/// Sequences of the entities that could be encoded and the entities that were dropped.
#[derive( Debug, Default )]
pub struct BuildOutcome {
	pub database: SequenceDatabase,
	/// one `MalformedTimeKey` per dropped entity
	pub rejected: Vec<MiningError>,
}

impl Basket {
	fn new( time: TimeKey ) -> Basket {
		Basket { time, items: BitSet::new() }
	}

	fn insert( &mut self, item: Item ) {
		self.items.insert( item );
	}

	pub fn time( &self ) -> TimeKey { self.time }
	pub fn len( &self ) -> usize { self.items.len() }
	pub fn is_empty( &self ) -> bool { self.items.is_empty() }

	/// Items in ascending order
	pub fn items( &self ) -> impl Iterator<Item = Item> + '_ {
		self.items.iter()
	}

	/// True if every item of the itemset occurs in this basket
	pub fn contains_all( &self, itemset: &[Item] ) -> bool {
		itemset.iter().all( |item| self.items.contains( *item ))
	}
}

impl DelimitedSequence {
	pub fn entity( &self ) -> &str { &self.entity }
	pub fn baskets( &self ) -> &[Basket] { &self.baskets }

	/// Checks whether the candidate's itemsets occur in strictly increasing baskets.
	/// Matches every itemset at the earliest basket after the previous match.
	pub fn contains( &self, candidate: &Candidate ) -> bool {
		let mut cursor = 0;
		for itemset in candidate.baskets() {
			let remaining = self.baskets.get( cursor .. ).unwrap_or( &[] );
			match remaining.iter().position( |basket| basket.contains_all( itemset )) {
				Some( offset ) => cursor += offset + 1,
				None => return false,
			}
		}
		true
	}

	/// Events in basket order, items ascending within a basket
	pub fn flatten( &self ) -> Vec<(TimeKey, Item)> {
		self.baskets.iter()
			.flat_map( |basket| basket.items().map( move |item| (basket.time, item) ))
			.collect()
	}

	pub fn number_events( &self ) -> usize {
		self.baskets.iter().map( |b| b.len() ).sum()
	}
}

/// Groups the events by entity and encodes every entity as a delimited sequence.
///
/// Entities whose time keys cannot be ordered are dropped and reported in the outcome.
/// The vocabulary only covers items of the entities that were kept.
pub fn build_sequences <'a, I> ( events: I ) -> BuildOutcome where I: IntoIterator<Item = &'a Event> {
	let mut groups: BTreeMap<&'a str, Vec<&'a Event>> = BTreeMap::new();
	for event in events {
		groups.entry( event.entity.as_str() ).or_default().push( event );
	}

	let mut rejected: Vec<MiningError> = Vec::new();
	groups.retain( |entity, group| {
		match group.iter().find( |e| e.time.is_nan() ) {
			Some( event ) => {
				warn!( "Dropping entity {entity}: time key '{}' cannot be ordered", event.raw_time );
				rejected.push( MiningError::MalformedTimeKey {
					entity: entity.to_string(),
					value: event.raw_time.clone(),
				});
				false
			},
			None => true,
		}
	});

	let vocabulary = Vocabulary::from_codes( groups.values().flatten().map( |e| e.item.as_str() ));
	let sequences: Vec<DelimitedSequence> = groups.iter()
		.map( |(entity, group)| encode_entity( entity, group, &vocabulary ))
		.collect();

	debug!( "Built {} sequences over {} items, dropped {}", sequences.len(), vocabulary.len(), rejected.len() );
	BuildOutcome {
		database: SequenceDatabase::new( sequences, vocabulary ),
		rejected,
	}
}

/// Pre: no event in group has a NaN time
fn encode_entity( entity: &str, group: &[&Event], vocabulary: &Vocabulary ) -> DelimitedSequence {
	let mut events: Vec<(TimeKey, Item)> = group.iter()
		.filter_map( |e| vocabulary.item( &e.item ).map( |item| (e.time, item) ))
		.collect();
	events.sort_unstable();
	let before = events.len();
	events.dedup();
	if events.len() < before {
		trace!( "Entity {entity}: collapsed {} duplicate events", before - events.len() );
	}

	// a new basket starts wherever the time increases in the sort order
	let mut baskets: Vec<Basket> = Vec::new();
	for (time, item) in events {
		match baskets.last_mut() {
			Some( basket ) if basket.time == time => basket.insert( item ),
			_ => {
				let mut basket = Basket::new( time );
				basket.insert( item );
				baskets.push( basket );
			},
		}
	}

	DelimitedSequence {
		entity: entity.to_string(),
		baskets,
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::data::Database;

	fn basket_codes( sequence: &DelimitedSequence, vocabulary: &Vocabulary ) -> Vec<Vec<String>> {
		sequence.baskets().iter()
			.map( |b| b.items().map( |i| vocabulary.code( i ).to_string() ).collect() )
			.collect()
	}

	#[test]
	/// Consecutive events with the same time share a basket
	fn test_basket_grouping() {
		let events = vec!(
			Event::new( "A", "Z", 2.0 ),
			Event::new( "A", "Y", 1.0 ),
			Event::new( "A", "X", 1.0 ),
			Event::new( "B", "X", 1.0 ),
			Event::new( "B", "Z", 2.0 ),
			Event::new( "C", "Y", 1.0 ),
		);
		let outcome = build_sequences( &events );
		assert!( outcome.rejected.is_empty() );

		let database = outcome.database;
		let vocabulary = database.vocabulary();
		let sequences = database.sequences();
		assert_eq!( sequences.len(), 3 );
		assert_eq!( sequences[0].entity(), "A" );
		assert_eq!( basket_codes( &sequences[0], vocabulary ), vec!( vec!( "X", "Y" ), vec!( "Z" )));
		assert_eq!( basket_codes( &sequences[1], vocabulary ), vec!( vec!( "X" ), vec!( "Z" )));
		assert_eq!( basket_codes( &sequences[2], vocabulary ), vec!( vec!( "Y" )));
		assert_eq!( sequences[0].baskets()[1].time(), TimeKey::from( 2.0 ));
	}

	#[test]
	fn test_single_event_and_empty_log() {
		let events = vec!( Event::new( "solo", "MATH1", 20231.0 ));
		let database = build_sequences( &events ).database;
		assert_eq!( database.sequences().len(), 1 );
		assert_eq!( database.sequences()[0].baskets().len(), 1 );
		assert_eq!( database.sequences()[0].number_events(), 1 );

		let empty: Vec<Event> = Vec::new();
		let outcome = build_sequences( &empty );
		assert!( outcome.database.is_empty() );
		assert_eq!( outcome.database.number_sequences(), 0 );
		assert!( outcome.rejected.is_empty() );
	}

	#[test]
	/// An entity with a NaN time is dropped and reported, the others stay
	fn test_malformed_time_key() {
		let mut broken = Event::new( "B", "Q", f64::NAN );
		broken.raw_time = "fall".to_string();
		let events = vec!(
			Event::new( "A", "X", 1.0 ),
			Event::new( "B", "X", 1.0 ),
			broken,
		);
		let outcome = build_sequences( &events );
		assert_eq!( outcome.database.number_sequences(), 1 );
		assert_eq!( outcome.database.sequences()[0].entity(), "A" );
		// items of dropped entities are not part of the vocabulary
		assert_eq!( outcome.database.vocabulary().item( "Q" ), None );
		assert_eq!( outcome.rejected.len(), 1 );
		match &outcome.rejected[0] {
			MiningError::MalformedTimeKey { entity, value } => {
				assert_eq!( entity, "B" );
				assert_eq!( value, "fall" );
			},
			other => panic!( "unexpected error {other:?}" ),
		}
	}

	#[test]
	fn test_duplicates_collapse() {
		let events = vec!(
			Event::new( "A", "X", 1.0 ),
			Event::new( "A", "X", 1.0 ),
			Event::new( "A", "X", 2.0 ),
		);
		let database = build_sequences( &events ).database;
		let sequence = &database.sequences()[0];
		assert_eq!( sequence.baskets().len(), 2 );
		assert_eq!( sequence.flatten(), vec!( (TimeKey::from( 1.0 ), 0), (TimeKey::from( 2.0 ), 0) ));
	}

	#[test]
	/// Integer keys beyond the exact range of f64 still open separate baskets
	fn test_large_integer_times() {
		let events = vec!(
			Event::new( "A", "X", 9_007_199_254_740_993_i64 ),
			Event::new( "A", "Y", 9_007_199_254_740_992_i64 ),
		);
		let database = build_sequences( &events ).database;
		let sequence = &database.sequences()[0];
		assert_eq!( sequence.baskets().len(), 2 );
		assert_eq!( sequence.baskets()[0].time(), TimeKey::Integer( 9_007_199_254_740_992 ));
		assert_eq!( sequence.baskets()[0].items().collect::<Vec<Item>>(), vec!( 1 ));
	}

	#[test]
	/// Baskets split exactly where the sort order does, so -0.0 and 0.0 stay apart
	fn test_signed_zero_times() {
		let events = vec!(
			Event::new( "A", "X", 0.0 ),
			Event::new( "A", "Y", -0.0 ),
			Event::new( "A", "Z", 0_i64 ),
		);
		let database = build_sequences( &events ).database;
		let sequence = &database.sequences()[0];
		assert_eq!( sequence.baskets().len(), 2 );
		assert_eq!( sequence.baskets()[0].items().collect::<Vec<Item>>(), vec!( 1 ));
		// the integer zero equals the real zero
		assert_eq!( sequence.baskets()[1].items().collect::<Vec<Item>>(), vec!( 0, 2 ));
	}

	#[test]
	/// Greedy matching must skip baskets that do not contain the whole itemset
	fn test_contains() {
		let events = vec!(
			Event::new( "A", "X", 1.0 ),
			Event::new( "A", "X", 2.0 ),
			Event::new( "A", "Y", 2.0 ),
			Event::new( "A", "X", 3.0 ),
		);
		let database = build_sequences( &events ).database;
		let sequence = &database.sequences()[0];
		let (x, y) = (0, 1);

		assert!( sequence.contains( &Candidate::new( vec!( vec!( x, y )))));
		assert!( sequence.contains( &Candidate::new( vec!( vec!( x ), vec!( x, y )))));
		assert!( sequence.contains( &Candidate::new( vec!( vec!( x ), vec!( x ), vec!( x )))));
		assert!( sequence.contains( &Candidate::new( vec!( vec!( x, y ), vec!( x )))));
		assert!( !sequence.contains( &Candidate::new( vec!( vec!( x, y ), vec!( y )))));
		assert!( !sequence.contains( &Candidate::new( vec!( vec!( x ), vec!( x ), vec!( x ), vec!( x )))));
		assert!( !sequence.contains( &Candidate::new( vec!( vec!( y ), vec!( y )))));
	}
}
