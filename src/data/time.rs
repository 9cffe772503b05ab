use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Orderable time value of an event.
///
/// Integers are kept exact so that large keys such as epoch nanoseconds never merge.
/// Other numbers are reals ordered by `f64::total_cmp`. A NaN real cannot be ordered
/// with the rest of an entity's history and disqualifies the entity.
#[derive( Debug, Clone, Copy )]
pub enum TimeKey {
	Integer( i64 ),
	Real( f64 ),
}

/// 2^63, the first real above every i64
const INTEGER_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl TimeKey {
	/// Integers first, then reals. Text that is neither becomes NaN.
	pub fn parse( text: &str ) -> TimeKey {
		let text = text.trim();
		if let Ok( integer ) = text.parse::<i64>() {
			return TimeKey::Integer( integer );
		}
		TimeKey::Real( text.parse::<f64>().unwrap_or( f64::NAN ))
	}

	pub fn is_nan( &self ) -> bool {
		matches!( self, TimeKey::Real( value ) if value.is_nan() )
	}
}

/// Exact comparison of an integer with a real
fn compare_mixed( integer: i64, real: f64 ) -> Ordering {
	match ( integer as f64 ).total_cmp( &real ) {
		// rounding is monotonic, so a strict order survives it
		Ordering::Equal if real >= INTEGER_BOUND => Ordering::Less,
		Ordering::Equal => integer.cmp( &( real as i64 )),
		strict => strict,
	}
}

impl Ord for TimeKey {
	fn cmp( &self, other: &TimeKey ) -> Ordering {
		match ( *self, *other ) {
			( TimeKey::Integer( left ), TimeKey::Integer( right )) => left.cmp( &right ),
			( TimeKey::Real( left ), TimeKey::Real( right )) => left.total_cmp( &right ),
			( TimeKey::Integer( left ), TimeKey::Real( right )) => compare_mixed( left, right ),
			( TimeKey::Real( left ), TimeKey::Integer( right )) => compare_mixed( right, left ).reverse(),
		}
	}
}

impl PartialOrd for TimeKey {
	fn partial_cmp( &self, other: &TimeKey ) -> Option<Ordering> {
		Some( self.cmp( other ))
	}
}

impl PartialEq for TimeKey {
	fn eq( &self, other: &TimeKey ) -> bool {
		self.cmp( other ) == Ordering::Equal
	}
}

impl Eq for TimeKey {}

impl From<i64> for TimeKey {
	fn from( value: i64 ) -> TimeKey { TimeKey::Integer( value ) }
}

impl From<f64> for TimeKey {
	fn from( value: f64 ) -> TimeKey { TimeKey::Real( value ) }
}

impl FromStr for TimeKey {
	type Err = std::convert::Infallible;

	fn from_str( s: &str ) -> Result<TimeKey, Self::Err> {
		Ok( TimeKey::parse( s ))
	}
}

impl fmt::Display for TimeKey {
	fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
		match self {
			TimeKey::Integer( value ) => write!( f, "{value}" ),
			TimeKey::Real( value ) => write!( f, "{value}" ),
		}
	}
}
