use crate::*;
use crate::io::{PrettyFormatter, produce_delimited};

/// Renders candidates and sequences with item codes.
/// Items of a basket are joined by commas, baskets by pipes.
pub struct PatternFormatter<'v> {
    vocabulary: &'v Vocabulary,
    /// wrap every basket in braces
    show_braces: bool,
}

impl <'v> PrettyFormatter<Candidate> for PatternFormatter<'v> {

    fn format_pretty( &self, candidate: &Candidate ) -> String {
        let baskets = candidate.baskets().iter()
            .map( |basket| self.format_basket( basket.iter().copied() ));
        produce_delimited( baskets, "|" )
    }
}

impl <'v> PrettyFormatter<DelimitedSequence> for PatternFormatter<'v> {

    fn format_pretty( &self, sequence: &DelimitedSequence ) -> String {
        let baskets = sequence.baskets().iter()
            .map( |basket| self.format_basket( basket.items() ));
        produce_delimited( baskets, "|" )
    }
}

impl <'v> PatternFormatter<'v> {
    pub fn new( vocabulary: &'v Vocabulary ) -> PatternFormatter<'v> {
        PatternFormatter {
            vocabulary,
            show_braces: false,
        }
    }

    pub fn show_braces( &mut self ) { self.show_braces = true; }

    fn format_basket <I: Iterator<Item = Item>> ( &self, items: I ) -> String {
        let joined = produce_delimited( items.map( |item| self.vocabulary.code( item )), "," );
        if self.show_braces {
            format!( "{{{joined}}}" )
        } else {
            joined
        }
    }
}

/// Renders the time keys of a sequence in the same encoding, one entry per item
pub fn format_times( sequence: &DelimitedSequence ) -> String {
    let baskets = sequence.baskets().iter()
        .map( |basket| {
            let time = basket.time().to_string();
            produce_delimited( std::iter::repeat( time ).take( basket.len() ), "," )
        });
    produce_delimited( baskets, "|" )
}
