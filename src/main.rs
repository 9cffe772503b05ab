use std::path::PathBuf;

use clap::Parser;
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use gspmine::*;
use gspmine::io::{export_report, read_event_log};

/// Finds frequent sequential patterns in per-entity event logs with the GSP algorithm.
#[derive( Parser, Debug )]
#[command( version, about )]
struct Args {
    /// Comma separated event log with columns entity_id, item_code, time_key and optionally category
    #[arg( long )]
    input_file: PathBuf,

    /// Minimum support percentages, e.g. 50,66.5
    #[arg( long, value_delimiter = ',', required = true )]
    support_thresholds: Vec<String>,

    /// Categories to analyse, e.g. BISC,CHEM. Every category if left out.
    #[arg( long, value_delimiter = ',' )]
    categories: Vec<String>,

    /// 'separate' mines every category on its own, 'together' mines their union
    #[arg( long, default_value = "separate" )]
    run_mode: String,

    /// Directory receiving one folder per partition
    #[arg( long, default_value = "." )]
    output_dir: PathBuf,

    /// Stop after candidates of this many items
    #[arg( long )]
    max_level: Option<usize>,

    /// Worker threads, all cores if left out
    #[arg( long )]
    threads: Option<usize>,

    /// More output, repeat for trace level
    #[arg( short, long, action = clap::ArgAction::Count )]
    verbose: u8,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    prepare_logging( args.verbose );

    // configuration errors surface before the log is touched
    let config = MiningConfig::new( &args.support_thresholds, &args.categories, &args.run_mode, args.max_level )
        .map_err( |e| e.to_string() )?;
    if let Some( threads ) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads( threads )
            .build_global()
            .map_err( |e| e.to_string() )?;
    }

    let log = read_event_log( &args.input_file ).map_err( |e| e.to_string() )?;
    let reports = run::run( &log, &config ).map_err( |e| e.to_string() )?;

    std::fs::create_dir_all( &args.output_dir ).map_err( |e| e.to_string() )?;
    let exported: Vec<PathBuf> = reports.par_iter()
        .map( |report| export_report( report, &args.output_dir ))
        .collect::<Result<_, MiningError>>()
        .map_err( |e| e.to_string() )?;

    for report in &reports {
        if report.outcome() == PartitionOutcome::Empty {
            warn!( "Partition {} has no entities, its results are empty", report.name() );
        }
        for rejected in report.rejected() {
            warn!( "{}: {rejected}", report.name() );
        }
    }
    info!( "Wrote results of {} partitions: {:?}", exported.len(), exported );

    Ok( () )
}

fn prepare_logging( verbosity: u8 ) {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let tracer = tracing_subscriber::fmt::fmt()
        .with_max_level( level )
        .finish();
    if tracing::subscriber::set_global_default( tracer ).is_err() {
        eprintln!( "logging was already initialized" );
    }
}
