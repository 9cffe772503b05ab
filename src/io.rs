use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHasher;
use tracing::{debug, info};

use crate::*;
use crate::error::Result;
use crate::model::{PatternFormatter, format_times};

pub const ENTITY_COLUMN: &str = "entity_id";
pub const ITEM_COLUMN: &str = "item_code";
pub const TIME_COLUMN: &str = "time_key";
pub const CATEGORY_COLUMN: &str = "category";

pub const SEQUENCE_FILE: &str = "sequences.csv";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const RESULT_FILE: &str = "results.json";

/// Converts a structure into a string
pub trait PrettyFormatter<T> {
    fn format_pretty( &self, object: &T ) -> String;
}

/// Positions of the columns the miner reads
struct Columns {
    entity: usize,
    item: usize,
    time: usize,
    category: Option<usize>,
    width: usize,
}

/// Text summary of one threshold run, appended to the partition's summary file.
#[derive( Debug, Clone )]
pub struct RunSummary {
    partition: String,
    threshold: Threshold,
    /// level one counts by item code
    item_counts: BTreeMap<String, Count>,
    /// number of frequent candidates per level
    level_counts: BTreeMap<usize, usize>,
    entities: Count,
    dropped: usize,
    elapsed_secs: f64,
}

/// Reads a comma separated event log with a header row.
pub fn read_event_log( path: &Path ) -> Result<EventLog> {
    let file = File::open( path )?;
    let log = parse_event_log( BufReader::new( file ))?;
    info!( "Read {} events from {}", log.len(), path.display() );
    Ok( log )
}

/// Parses an event log. Fails on a missing required column or a row of the wrong width.
/// Time keys that are no numbers become NaN and are dealt with when sequences are built.
pub fn parse_event_log <R: BufRead> ( reader: R ) -> Result<EventLog> {
    let mut lines = reader.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some( (_, line) ) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            },
            None => return Err( MiningError::MissingColumn { column: ENTITY_COLUMN.to_string() } ),
        }
    };
    let columns = locate_columns( &split_record( header.trim_start_matches( '\u{feff}' )))?;

    let mut events = Vec::new();
    for (index, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_record( &line );
        if fields.len() != columns.width {
            return Err( MiningError::MalformedRow { line: index + 1, expected: columns.width, found: fields.len() } );
        }

        let raw_time = fields[ columns.time ].trim().to_string();
        let time = TimeKey::parse( &raw_time );
        let category = columns.category
            .map( |c| fields[ c ].trim().to_string() )
            .filter( |c| !c.is_empty() );
        events.push( Event {
            entity: fields[ columns.entity ].trim().to_string(),
            item: fields[ columns.item ].trim().to_string(),
            time,
            category,
            raw_time,
        });
    }
    Ok( EventLog::new( events, columns.category.is_some() ))
}

fn locate_columns( header: &[String] ) -> Result<Columns> {
    let find = |name: &str| header.iter().position( |h| h.trim() == name );
    let require = |name: &str| find( name ).ok_or_else( || MiningError::MissingColumn { column: name.to_string() } );
    Ok( Columns {
        entity: require( ENTITY_COLUMN )?,
        item: require( ITEM_COLUMN )?,
        time: require( TIME_COLUMN )?,
        category: find( CATEGORY_COLUMN ),
        width: header.len(),
    })
}

/// Splits one line at commas outside of double quotes. Doubled quotes escape a quote.
pub fn split_record( line: &str ) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some( c ) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some( &'"' ) => {
                field.push( '"' );
                chars.next();
            },
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push( std::mem::take( &mut field )),
            _ => field.push( c ),
        }
    }
    fields.push( field );
    fields
}

/// Quotes a field if it contains a separator or a quote
pub fn quote_field( field: &str ) -> String {
    if field.contains( [',', '"', '\n'] ) {
        format!( "\"{}\"", field.replace( '"', "\"\"" ))
    } else {
        field.to_string()
    }
}

/// Joins the parts with the separator
pub fn produce_delimited <I, S> ( parts: I, separator: &str ) -> String where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (index, part) in parts.enumerate() {
        if index > 0 {
            joined.push_str( separator );
        }
        joined.push_str( part.as_ref() );
    }
    joined
}

/// Writes a serializeable value to a file as JSON
pub fn write_json <S: serde::Serialize> ( value: &S, path: &Path ) -> Result<()> {
    let file = File::create( path )?;
    let mut writer = BufWriter::new( file );
    serde_json::to_writer( &mut writer, value )?;
    writer.flush()?;
    Ok( () )
}

/// Writes one row per entity with its item and time sequences
pub fn write_sequence_table( database: &SequenceDatabase, path: &Path ) -> Result<()> {
    let mut writer = BufWriter::new( File::create( path )?);
    let formatter = PatternFormatter::new( database.vocabulary() );
    writeln!( writer, "{ENTITY_COLUMN},item_code_basket_sequence,time_key_basket_sequence" )?;
    for sequence in database {
        writeln!( writer, "{},{},{}",
                  quote_field( sequence.entity() ),
                  quote_field( &formatter.format_pretty( sequence )),
                  quote_field( &format_times( sequence )))?;
    }
    writer.flush()?;
    Ok( () )
}

/// Writes the frequent candidates of one level, most frequent first
pub fn write_level_table( level: &LevelResult, vocabulary: &Vocabulary, path: &Path ) -> Result<()> {
    let mut writer = BufWriter::new( File::create( path )?);
    writeln!( writer, "candidate,count,percentage" )?;
    for (pattern, count, percentage) in level_rows( level, vocabulary ) {
        writeln!( writer, "{},{},{:.4}", quote_field( &pattern ), count, percentage )?;
    }
    writer.flush()?;
    Ok( () )
}

/// Rows of a level table sorted by count descending, then by candidate
fn level_rows( level: &LevelResult, vocabulary: &Vocabulary ) -> Vec<(String, Count, f64)> {
    let formatter = PatternFormatter::new( vocabulary );
    let mut records: Vec<&SupportRecord> = level.frequent().iter().collect();
    records.sort_by( |left, right| right.count().cmp( &left.count() ).then( left.candidate().cmp( right.candidate() )));
    records.into_iter()
        .map( |record| (formatter.format_pretty( record.candidate() ), record.count(), record.percentage()) )
        .collect()
}

/// Appends the summary to the file, creating it if needed
pub fn append_summary( summary: &RunSummary, path: &Path ) -> Result<()> {
    let text = summary.render()?;
    let mut file = OpenOptions::new().create( true ).append( true ).open( path )?;
    file.write_all( text.as_bytes() )?;
    Ok( () )
}

/// Writes all tables of one partition below the output directory.
///
/// Every partition and threshold owns its own directory, so partitions may be exported in parallel.
pub fn export_report( report: &PartitionReport, output_dir: &Path ) -> Result<PathBuf> {
    let partition_dir = output_dir.join( sanitize( report.name() ));
    fs::create_dir_all( &partition_dir )?;
    write_sequence_table( report.database(), &partition_dir.join( SEQUENCE_FILE ))?;

    let vocabulary = report.database().vocabulary();
    for run in report.result().runs() {
        let threshold_dir = partition_dir.join( format!( "support_{}", run.threshold() ));
        fs::create_dir_all( &threshold_dir )?;

        let mut tables: BTreeMap<usize, Vec<(String, Count, f64)>> = BTreeMap::new();
        for level in run.levels() {
            write_level_table( level, vocabulary, &threshold_dir.join( format!( "level_{}.csv", level.level() )))?;
            tables.insert( level.level(), level_rows( level, vocabulary ));
        }
        write_json( &tables, &threshold_dir.join( RESULT_FILE ))?;

        append_summary( &RunSummary::new( report, run ), &partition_dir.join( SUMMARY_FILE ))?;
        debug!( "Exported threshold {}% of {} to {}", run.threshold(), report.name(), threshold_dir.display() );
    }
    Ok( partition_dir )
}

/// Keeps partition names usable as a single path component.
/// A name that had to be changed gets a hash of the original appended, so distinct
/// partitions never share a directory.
fn sanitize( name: &str ) -> String {
    let cleaned: String = name.chars()
        .map( |c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect();
    let reserved = matches!( cleaned.as_str(), "" | "." | ".." );
    if cleaned == name && !reserved {
        return cleaned;
    }

    let mut hasher = FxHasher::default();
    name.hash( &mut hasher );
    let stem = if reserved { "_" } else { cleaned.as_str() };
    format!( "{stem}_{:08x}", hasher.finish() as u32 )
}

impl RunSummary {
    pub fn new( report: &PartitionReport, run: &ThresholdRun ) -> RunSummary {
        let vocabulary = report.database().vocabulary();
        let item_counts = run.level( 1 )
            .map( |level| level.frequent().iter()
                  .flat_map( |record| record.candidate().items().into_iter().map( move |item| (item, record.count()) ))
                  .map( |(item, count)| (vocabulary.code( item ).to_string(), count) )
                  .collect() )
            .unwrap_or_default();
        let level_counts = run.levels().iter().map( |l| (l.level(), l.len()) ).collect();

        RunSummary {
            partition: report.name().to_string(),
            threshold: run.threshold(),
            item_counts,
            level_counts,
            entities: report.result().total(),
            dropped: report.rejected().len(),
            elapsed_secs: report.elapsed().as_secs_f64(),
        }
    }

    pub fn render( &self ) -> Result<String> {
        let mut text = String::new();
        text.push_str( &"===".repeat( 20 ));
        text.push( '\n' );
        text.push_str( &format!( "Partition: {} | Threshold: {}%\n\n", self.partition, self.threshold ));
        text.push_str( &serde_json::to_string( &self.item_counts )?);
        text.push_str( "\n\n" );
        text.push_str( &serde_json::to_string( &self.level_counts )?);
        text.push_str( "\n\n" );
        text.push_str( &format!( "Entity #: {}\n\n", self.entities ));
        text.push_str( &format!( "Dropped entities: {}\n\n", self.dropped ));
        text.push_str( &format!( "--- {:.4} seconds ---\n\n", self.elapsed_secs ));
        Ok( text )
    }
}
