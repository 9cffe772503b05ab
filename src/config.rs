use std::fmt;
use std::str::FromStr;

use crate::error::{MiningError, Result};

/// Minimum support, as a percentage of the population.
#[derive( Debug, Clone, Copy, PartialEq, PartialOrd )]
pub struct Threshold( f64 );

/// How categories are turned into populations.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum RunMode {
    /// One population per category.
    Separate,
    /// One population over the union of the selected categories.
    Together,
}

/// Validated settings of a mining job.
#[derive( Debug, Clone )]
pub struct MiningConfig {
    /// ascending and free of duplicates
    thresholds: Vec<Threshold>,
    /// empty selects every category in the log
    categories: Vec<String>,
    run_mode: RunMode,
    /// stops the level loop after this level, if set
    max_level: Option<usize>,
}

impl Threshold {
    pub fn new( percentage: f64 ) -> Result<Threshold> {
        // a zero threshold makes every candidate frequent and the loop never ends
        if percentage.is_finite() && percentage > 0.0 && percentage <= 100.0 {
            Ok( Threshold( percentage ))
        } else {
            Err( MiningError::InvalidThreshold { value: percentage.to_string() } )
        }
    }

    pub fn percentage( &self ) -> f64 {
        self.0
    }

    /// Ties count as meeting the threshold.
    pub fn is_met_by( &self, percentage: f64 ) -> bool {
        percentage >= self.0
    }
}

impl FromStr for Threshold {
    type Err = MiningError;

    fn from_str( s: &str ) -> Result<Threshold> {
        let invalid = || MiningError::InvalidThreshold { value: s.to_string() };
        let percentage: f64 = s.trim().parse().map_err( |_| invalid() )?;
        Threshold::new( percentage ).map_err( |_| invalid() )
    }
}

impl fmt::Display for Threshold {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        write!( f, "{}", self.0 )
    }
}

impl FromStr for RunMode {
    type Err = MiningError;

    fn from_str( s: &str ) -> Result<RunMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "separate" => Ok( RunMode::Separate ),
            "together" => Ok( RunMode::Together ),
            _ => Err( MiningError::UnknownRunMode { value: s.to_string() } ),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        match self {
            RunMode::Separate => write!( f, "separate" ),
            RunMode::Together => write!( f, "together" ),
        }
    }
}

impl MiningConfig {

    /// Parses and validates the raw settings. Nothing is scanned before this succeeds.
    pub fn new <T, C> ( thresholds: &[T], categories: &[C], run_mode: &str, max_level: Option<usize> ) -> Result<MiningConfig> where
        T: AsRef<str>,
        C: AsRef<str>,
    {
        let mut parsed: Vec<Threshold> = thresholds.iter()
            .map( |t| t.as_ref().parse::<Threshold>() )
            .collect::<Result<_>>()?;
        if parsed.is_empty() {
            return Err( MiningError::InvalidThreshold { value: String::new() } );
        }
        parsed.sort_by( |left, right| left.0.total_cmp( &right.0 ));
        parsed.dedup();

        // first mention wins, order is kept
        let mut selected: Vec<String> = Vec::new();
        for category in categories.iter().map( |c| c.as_ref().trim() ).filter( |c| !c.is_empty() ) {
            if !selected.iter().any( |s| s == category ) {
                selected.push( category.to_string() );
            }
        }

        Ok( MiningConfig {
            thresholds: parsed,
            categories: selected,
            run_mode: run_mode.parse()?,
            max_level,
        })
    }

    /// Configuration over already validated thresholds.
    pub fn with_thresholds( thresholds: Vec<Threshold>, run_mode: RunMode ) -> MiningConfig {
        let mut thresholds = thresholds;
        thresholds.sort_by( |left, right| left.0.total_cmp( &right.0 ));
        thresholds.dedup();
        MiningConfig {
            thresholds,
            categories: Vec::new(),
            run_mode,
            max_level: None,
        }
    }

    pub fn set_categories( &mut self, categories: Vec<String> ) {
        self.categories = categories;
    }

    pub fn set_max_level( &mut self, max_level: Option<usize> ) {
        self.max_level = max_level;
    }

    pub fn thresholds( &self ) -> &[Threshold] { &self.thresholds }
    pub fn categories( &self ) -> &[String] { &self.categories }
    pub fn run_mode( &self ) -> RunMode { self.run_mode }
    pub fn max_level( &self ) -> Option<usize> { self.max_level }
}
