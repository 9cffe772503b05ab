use std::fs;

use tempfile::TempDir;

use gspmine::*;
use gspmine::io::{export_report, parse_event_log, read_event_log, RESULT_FILE, SEQUENCE_FILE, SUMMARY_FILE};

const ENROLLMENTS: &str = "entity_id,item_code,time_key,category\n\
                           A,X,1,DEPT\n\
                           A,Y,1,DEPT\n\
                           A,Z,2,DEPT\n\
                           B,X,1,DEPT\n\
                           B,Z,2,DEPT\n\
                           C,Y,1,DEPT\n\
                           D,X,1,OTHER\n";

fn mine_text( text: &str, thresholds: &[&str], categories: &[&str], mode: &str ) -> Vec<PartitionReport> {
    let log = parse_event_log( text.as_bytes() ).unwrap();
    let config = MiningConfig::new( thresholds, categories, mode, None ).unwrap();
    run::run( &log, &config ).unwrap()
}

#[test]
fn test_export_layout() {
    let output = TempDir::new().unwrap();
    let reports = mine_text( ENROLLMENTS, &["50"], &["DEPT"], "separate" );
    assert_eq!( reports.len(), 1 );

    let partition_dir = export_report( &reports[0], output.path() ).unwrap();
    assert_eq!( partition_dir, output.path().join( "DEPT" ));

    let sequences = fs::read_to_string( partition_dir.join( SEQUENCE_FILE )).unwrap();
    let lines: Vec<&str> = sequences.lines().collect();
    assert_eq!( lines[0], "entity_id,item_code_basket_sequence,time_key_basket_sequence" );
    assert_eq!( lines[1], "A,\"X,Y|Z\",\"1,1|2\"" );
    assert_eq!( lines[2], "B,X|Z,1|2" );
    assert_eq!( lines[3], "C,Y,1" );
    assert_eq!( lines.len(), 4 );

    let threshold_dir = partition_dir.join( "support_50" );
    let first = fs::read_to_string( threshold_dir.join( "level_1.csv" )).unwrap();
    assert_eq!( first.lines().count(), 4 );
    assert!( first.lines().nth( 1 ).unwrap().starts_with( "X,2,66.66" ));

    let second = fs::read_to_string( threshold_dir.join( "level_2.csv" )).unwrap();
    assert_eq!( second.lines().collect::<Vec<&str>>(), vec!( "candidate,count,percentage", "X|Z,2,66.6667" ));
    assert!( !threshold_dir.join( "level_3.csv" ).exists() );

    let json: serde_json::Value = serde_json::from_str( &fs::read_to_string( threshold_dir.join( RESULT_FILE )).unwrap() ).unwrap();
    assert_eq!( json["1"].as_array().unwrap().len(), 3 );
    assert_eq!( json["2"][0][0], "X|Z" );
    assert_eq!( json["2"][0][1], 2 );
}

#[test]
fn test_summary_appends() {
    let output = TempDir::new().unwrap();
    let reports = mine_text( ENROLLMENTS, &["50", "100"], &[], "together" );
    assert_eq!( reports.len(), 1 );
    assert_eq!( reports[0].name(), "all" );
    assert_eq!( reports[0].result().total(), 4 );

    export_report( &reports[0], output.path() ).unwrap();
    export_report( &reports[0], output.path() ).unwrap();

    let summary = fs::read_to_string( output.path().join( "all" ).join( SUMMARY_FILE )).unwrap();
    assert_eq!( summary.matches( "Partition: all | Threshold: 50%" ).count(), 2 );
    assert_eq!( summary.matches( "Partition: all | Threshold: 100%" ).count(), 2 );
    assert!( summary.contains( "Entity #: 4" ));
    assert!( output.path().join( "all" ).join( "support_100" ).is_dir() );
}

#[test]
fn test_dropped_and_empty_partitions() {
    let text = "entity_id,item_code,time_key,category\n\
                A,X,1,DEPT\n\
                A,Y,later,DEPT\n\
                B,X,1,DEPT\n";
    let reports = mine_text( text, &["50"], &["DEPT", "NONE"], "separate" );

    let dept = reports.iter().find( |r| r.name() == "DEPT" ).unwrap();
    assert_eq!( dept.result().total(), 1 );
    assert_eq!( dept.rejected().len(), 1 );
    assert!( matches!( &dept.rejected()[0], MiningError::MalformedTimeKey { entity, value } if entity == "A" && value == "later" ));
    // Y only occurred for the dropped entity
    assert_eq!( dept.database().vocabulary().len(), 1 );

    let none = reports.iter().find( |r| r.name() == "NONE" ).unwrap();
    assert_eq!( none.outcome(), PartitionOutcome::Empty );
    assert!( none.result().runs()[0].levels().is_empty() );

    let output = TempDir::new().unwrap();
    export_report( none, output.path() ).unwrap();
    let summary = fs::read_to_string( output.path().join( "NONE" ).join( SUMMARY_FILE )).unwrap();
    assert!( summary.contains( "Entity #: 0" ));
}

#[test]
fn test_read_from_file() {
    let input = TempDir::new().unwrap();
    let path = input.path().join( "events.csv" );
    fs::write( &path, ENROLLMENTS ).unwrap();

    let log = read_event_log( &path ).unwrap();
    assert_eq!( log.len(), 7 );
    assert_eq!( log.categories(), vec!( "DEPT".to_string(), "OTHER".to_string() ));

    let missing = read_event_log( &input.path().join( "absent.csv" ));
    assert!( matches!( missing, Err( MiningError::Io( _ ))));
}

#[test]
fn test_invalid_configuration() {
    assert!( matches!( MiningConfig::new( &["0"], &[] as &[&str], "separate", None ), Err( MiningError::InvalidThreshold { .. } )));
    assert!( matches!( MiningConfig::new( &["abc"], &[] as &[&str], "separate", None ), Err( MiningError::InvalidThreshold { .. } )));
    assert!( matches!( MiningConfig::new( &["50"], &[] as &[&str], "sideways", None ), Err( MiningError::UnknownRunMode { .. } )));
}

#[test]
/// Categories that only differ in path separators are written to separate directories
fn test_partition_directories_distinct() {
    let text = "entity_id,item_code,time_key,category\n\
                A,X,1,a/b\n\
                B,Y,1,a_b\n";
    let reports = mine_text( text, &["50"], &[], "separate" );
    assert_eq!( reports.len(), 2 );

    let output = TempDir::new().unwrap();
    let mut directories: Vec<_> = reports.iter()
        .map( |report| export_report( report, output.path() ).unwrap() )
        .collect();
    directories.sort();
    directories.dedup();
    assert_eq!( directories.len(), 2 );
    for directory in &directories {
        assert_eq!( directory.parent(), Some( output.path() ));
        let summary = fs::read_to_string( directory.join( SUMMARY_FILE )).unwrap();
        assert_eq!( summary.matches( "Partition: " ).count(), 1 );
    }
}

#[test]
/// Integer time keys above the exact range of f64 keep their order through parsing
fn test_large_time_keys() {
    let text = "entity_id,item_code,time_key\n\
                A,X,9007199254740993\n\
                A,Y,9007199254740992\n";
    let reports = mine_text( text, &["100"], &[], "separate" );
    let sequence = &reports[0].database().sequences()[0];
    assert_eq!( sequence.baskets().len(), 2 );
    assert_eq!( sequence.baskets()[1].time(), TimeKey::Integer( 9_007_199_254_740_993 ));
}
