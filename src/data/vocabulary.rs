use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::Item;

/// Maps item codes to dense indices and back.
/// Index order equals the lexicographic order of the codes, so sorting items sorts codes.
#[derive( Debug, Clone, Default )]
pub struct Vocabulary {
	codes: Vec<String>,
	index: FxHashMap<String, Item>,
}

impl Vocabulary {

	pub fn from_codes <'a, I> ( codes: I ) -> Vocabulary where I: IntoIterator<Item = &'a str> {
		let sorted: BTreeSet<&str> = codes.into_iter().collect();
		let codes: Vec<String> = sorted.into_iter().map( |c| c.to_string() ).collect();
		let index = codes.iter().enumerate()
			.map( |(item, code)| (code.clone(), item) )
			.collect();
		Vocabulary { codes, index }
	}

	pub fn item( &self, code: &str ) -> Option<Item> {
		self.index.get( code ).copied()
	}

	/// Pre: item was handed out by this vocabulary
	pub fn code( &self, item: Item ) -> &str {
		&self.codes[ item ]
	}

	pub fn len( &self ) -> usize { self.codes.len() }
	pub fn is_empty( &self ) -> bool { self.codes.is_empty() }

	pub fn universe( &self ) -> impl Iterator<Item = Item> {
		0 .. self.codes.len()
	}
}
