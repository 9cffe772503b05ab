use crate::data::{Item, Itemvec};

/// Ordered list of itemsets searched for in the delimited sequences.
///
/// The representation is canonical: every itemset is sorted, free of duplicates and
/// non-empty, so equality and hashing identify the logical candidate.
#[derive( Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord )]
pub struct Candidate {
	/// total number of items
	level: usize,
	baskets: Vec<Itemvec>,
}

impl Candidate {

	pub fn new( baskets: Vec<Itemvec> ) -> Candidate {
		let baskets: Vec<Itemvec> = baskets.into_iter()
			.map( |mut basket| {
				basket.sort_unstable();
				basket.dedup();
				basket
			})
			.filter( |basket| !basket.is_empty() )
			.collect();
		let level = baskets.iter().map( |b| b.len() ).sum();
		Candidate { level, baskets }
	}

	pub fn singleton( item: Item ) -> Candidate {
		Candidate { level: 1, baskets: vec!( vec!( item )) }
	}

	pub fn level( &self ) -> usize { self.level }
	pub fn baskets( &self ) -> &[Itemvec] { &self.baskets }

	/// Distinct items over all baskets
	pub fn items( &self ) -> Itemvec {
		let mut items: Itemvec = self.baskets.iter().flatten().copied().collect();
		items.sort_unstable();
		items.dedup();
		items
	}

	/// Grows the last basket by the item. None if the item is already part of it.
	pub fn extend_last_basket( &self, item: Item ) -> Option<Candidate> {
		let last = self.baskets.last()?;
		let position = match last.binary_search( &item ) {
			Ok( _ ) => return None,
			Err( position ) => position,
		};
		let mut baskets = self.baskets.clone();
		if let Some( last ) = baskets.last_mut() {
			last.insert( position, item );
		}
		Some( Candidate { level: self.level + 1, baskets } )
	}

	/// Appends the item as a new trailing basket
	pub fn append_basket( &self, item: Item ) -> Candidate {
		let mut baskets = self.baskets.clone();
		baskets.push( vec!( item ));
		Candidate { level: self.level + 1, baskets }
	}

	/// All candidates of the previous level obtained by removing exactly one item.
	/// Baskets that become empty disappear.
	pub fn sub_candidates( &self ) -> impl Iterator<Item = Candidate> + '_ {
		self.baskets.iter().enumerate()
			.flat_map( move |(basket_index, basket)| {
				(0 .. basket.len()).map( move |item_index| self.without( basket_index, item_index ))
			})
	}

	fn without( &self, basket_index: usize, item_index: usize ) -> Candidate {
		let mut baskets = self.baskets.clone();
		baskets[ basket_index ].remove( item_index );
		if baskets[ basket_index ].is_empty() {
			baskets.remove( basket_index );
		}
		Candidate { level: self.level - 1, baskets }
	}
}
