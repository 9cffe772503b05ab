use std::collections::BTreeSet;
use std::iter::IntoIterator;

use crate::*;

mod sequence;
mod time;
mod vocabulary;

pub use sequence::{Basket, BuildOutcome, DelimitedSequence, build_sequences};
pub use time::TimeKey;
pub use vocabulary::Vocabulary;

/// Interned item code. Indices follow the lexicographic order of the codes.
pub type Item = usize;
pub type Itemvec = Vec<Item>;
pub type Count = u64;

/// One row of the event log.
#[derive( Debug, Clone, PartialEq )]
pub struct Event {
	pub entity: String,
	pub item: String,
	pub time: TimeKey,
	pub category: Option<String>,
	/// textual time value as read, kept for error reports
	pub raw_time: String,
}

/// Flat, already validated event log.
#[derive( Debug, Clone, Default )]
pub struct EventLog {
	events: Vec<Event>,
	/// whether the source declared a category column
	has_category: bool,
}

pub trait Database {

	/// Number of entities in the population
	fn number_sequences( &self ) -> Count;

	/// Returns the number of entity sequences containing the candidate
	fn query_support( &self, candidate: &Candidate ) -> Count;

	/// Creates a vector that contains all unique items in the data base
	fn create_universe( &self ) -> Vec<Item>;
}

/// The delimited sequences of one population together with its item vocabulary.
#[derive( Debug, Clone, Default )]
pub struct SequenceDatabase {
	/// ordered by entity id
	sequences: Vec<DelimitedSequence>,
	vocabulary: Vocabulary,
}

impl Event {
	pub fn new <T: Into<TimeKey>> ( entity: &str, item: &str, time: T ) -> Event {
		let time = time.into();
		Event {
			entity: entity.to_string(),
			item: item.to_string(),
			time,
			category: None,
			raw_time: time.to_string(),
		}
	}

	pub fn with_category( mut self, category: &str ) -> Event {
		self.category = Some( category.to_string() );
		self
	}
}

impl EventLog {
	pub fn new( events: Vec<Event>, has_category: bool ) -> EventLog {
		EventLog { events, has_category }
	}

	pub fn events( &self ) -> &[Event] { &self.events }
	pub fn has_category( &self ) -> bool { self.has_category }
	pub fn len( &self ) -> usize { self.events.len() }
	pub fn is_empty( &self ) -> bool { self.events.is_empty() }

	/// Distinct categories present in the log, sorted
	pub fn categories( &self ) -> Vec<String> {
		let categories: BTreeSet<&String> = self.events.iter()
			.filter_map( |e| e.category.as_ref() )
			.collect();
		categories.into_iter().cloned().collect()
	}

	/// Events whose category is one of the given ones
	pub fn select_categories( &self, categories: &[String] ) -> Vec<&Event> {
		self.events.iter()
			.filter( |e| e.category.as_ref().map_or( false, |c| categories.contains( c )))
			.collect()
	}
}

impl Database for SequenceDatabase {

	fn number_sequences( &self ) -> Count {
		self.sequences.len() as Count
	}

	fn query_support( &self, candidate: &Candidate ) -> Count {
		self.sequences.iter()
			.filter( |s| s.contains( candidate ))
			.count() as Count
	}

	fn create_universe( &self ) -> Vec<Item> {
		self.vocabulary.universe().collect()
	}
}

impl <'a> IntoIterator for &'a SequenceDatabase {
	type Item = &'a DelimitedSequence;
	type IntoIter = std::slice::Iter<'a, DelimitedSequence>;

	fn into_iter( self ) -> Self::IntoIter {
		self.sequences.iter()
	}
}

impl SequenceDatabase {
	pub fn new( sequences: Vec<DelimitedSequence>, vocabulary: Vocabulary ) -> SequenceDatabase {
		SequenceDatabase { sequences, vocabulary }
	}

	pub fn sequences( &self ) -> &[DelimitedSequence] { &self.sequences }
	pub fn vocabulary( &self ) -> &Vocabulary { &self.vocabulary }
	pub fn is_empty( &self ) -> bool { self.sequences.is_empty() }
}
