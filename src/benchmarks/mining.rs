use tracing::{info, debug};
use tracing_subscriber;

use rand::prelude::*;
use statrs::distribution::DiscreteUniform;

use std::time::*;

use gspmine::*;
use gspmine::data::build_sequences;

fn main() -> Result<(), String> {
    prepare_logging();

    let number_entities = 2000;
    let number_items = 40;
    let events = generate_event_log( number_entities, number_items, 8, 4 )?;
    info!( "Generated {} events for {number_entities} entities over {number_items} items", events.len() );

    let outcome = build_sequences( &events );
    let database = outcome.database;

    for percentage in [20.0, 10.0, 5.0] {
        benchmark_threshold( &database, percentage )?;
    }
    benchmark_shared_pass( &database, &[20.0, 10.0, 5.0] )?;

    Result::Ok( () )
}

fn benchmark_threshold( database: &SequenceDatabase, percentage: f64 ) -> Result<(), String> {
    let threshold = Threshold::new( percentage ).map_err( |e| e.to_string() )?;
    info!( "Start benchmark: single threshold {threshold}%" );
    let start = Instant::now();
    let result = GspMiner::new( &[threshold] ).mine( database );
    let time = Instant::now().duration_since( start );
    let per_level: Vec<usize> = result.runs()[0].levels().iter().map( |l| l.len() ).collect();
    info!( "Result: {threshold}% took {}ms, frequent per level {per_level:?}", time.as_millis() );
    Ok( () )
}

/// All thresholds at once share one counting pass per level
fn benchmark_shared_pass( database: &SequenceDatabase, percentages: &[f64] ) -> Result<(), String> {
    let thresholds: Vec<Threshold> = percentages.iter()
        .map( |p| Threshold::new( *p ))
        .collect::<Result<_, MiningError>>()
        .map_err( |e| e.to_string() )?;
    info!( "Start benchmark: {} thresholds in one run", thresholds.len() );
    let start = Instant::now();
    let result = GspMiner::new( &thresholds ).mine( database );
    let time = Instant::now().duration_since( start );
    let frequent: usize = result.runs().iter().map( |run| run.number_frequent() ).sum();
    info!( "Result: shared run took {}ms for {frequent} frequent candidates", time.as_millis() );
    Ok( () )
}

/// Draws a random number of terms per entity and a random number of items per term
fn generate_event_log( number_entities: usize, number_items: usize, max_terms: i64, max_basket: i64 ) -> Result<Vec<Event>, String> {
    let term_distribution = DiscreteUniform::new( 1, max_terms ).map_err( |e| e.to_string() )?;
    let basket_distribution = DiscreteUniform::new( 1, max_basket ).map_err( |e| e.to_string() )?;
    let item_distribution = DiscreteUniform::new( 0, number_items as i64 - 1 ).map_err( |e| e.to_string() )?;
    let mut gen = thread_rng();

    let mut events = Vec::new();
    for entity in 0 .. number_entities {
        let entity = format!( "e{entity}" );
        let terms = term_distribution.sample( &mut gen ) as usize;
        for term in 0 .. terms {
            let basket_size = basket_distribution.sample( &mut gen ) as usize;
            for _ in 0 .. basket_size {
                let item = item_distribution.sample( &mut gen ) as usize;
                events.push( Event::new( &entity, &format!( "i{item:03}" ), term as i64 ));
            }
        }
        debug!( "{entity}: {terms} terms" );
    }
    Ok( events )
}

fn prepare_logging() {
    let tracer = tracing_subscriber::fmt::fmt()
        .with_max_level( tracing_subscriber::filter::LevelFilter::INFO )
        .finish();
    if tracing::subscriber::set_global_default( tracer ).is_err() {
        eprintln!( "logging was already initialized" );
    }
}
