use crate::*;

mod candidate;
mod gsp;
mod serialize;

pub use candidate::Candidate;
pub use gsp::GspGenerator;
pub use serialize::{PatternFormatter, format_times};

pub trait Generator {

    /// Candidates of level one, one per item of the population's vocabulary
    fn seed <D: Database> ( &self, data: &D ) -> Vec<Candidate>;

    /// Generates the candidates of the next level from the frequent candidates of the current one.
    /// Only the given items are used to grow candidates.
    fn generate( &self, frequent: &[Candidate], extensions: &[Item] ) -> Vec<Candidate>;
}
