/// Alignment QC reports and the downsampling fraction derived from them
use log::warn;
use crate::config::defs::{PipelineError, FLAGSTAT_MAPPED_TOKEN, WGS_STATS_COVERAGE_COLUMN, WGS_STATS_HEADER_TOKEN};
use crate::utils::sample::SampleMap;


/// Number of mapped reads from a samtools flagstat report.
///
/// Takes the first field of the first line carrying a `mapped` token, e.g.
/// `1234 + 0 mapped (99.10% : N/A)`.
pub fn parse_flagstat_mapped(content: &str, source_name: &str) -> Result<u64, PipelineError> {
    let line = content
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<&str>>())
        .find(|fields| fields.contains(&FLAGSTAT_MAPPED_TOKEN))
        .ok_or_else(|| PipelineError::Parse {
            source_name: source_name.to_string(),
            message: format!("no '{}' line", FLAGSTAT_MAPPED_TOKEN),
        })?;

    line[0].parse::<u64>().map_err(|e| PipelineError::Parse {
        source_name: source_name.to_string(),
        message: format!("invalid mapped read count '{}': {}", line[0], e),
    })
}

/// Mean coverage from a Picard CollectWgsMetrics table.
///
/// The header row is the one containing `GENOME_TERRITORY`; the row right
/// after it holds the values. Fields are split on any whitespace and the
/// column is selected by header name.
pub fn parse_wgs_mean_coverage(content: &str, source_name: &str) -> Result<f64, PipelineError> {
    let parse_err = |message: String| PipelineError::Parse {
        source_name: source_name.to_string(),
        message,
    };

    let mut lines = content.lines();
    let header = lines
        .by_ref()
        .find(|l| l.contains(WGS_STATS_HEADER_TOKEN))
        .ok_or_else(|| parse_err(format!("no header row with {}", WGS_STATS_HEADER_TOKEN)))?;
    let data = lines
        .next()
        .ok_or_else(|| parse_err("header row is not followed by a data row".to_string()))?;

    let headers: Vec<&str> = header.split_whitespace().collect();
    let values: Vec<&str> = data.split_whitespace().collect();

    let column = headers
        .iter()
        .position(|h| *h == WGS_STATS_COVERAGE_COLUMN)
        .ok_or_else(|| parse_err(format!("no {} column", WGS_STATS_COVERAGE_COLUMN)))?;
    let value = values
        .get(column)
        .ok_or_else(|| parse_err(format!("data row has no {} value", WGS_STATS_COVERAGE_COLUMN)))?;

    value
        .parse::<f64>()
        .map_err(|e| parse_err(format!("invalid {} '{}': {}", WGS_STATS_COVERAGE_COLUMN, value, e)))
}

/// Fraction of reads to keep so that a sample ends up at `desired_coverage`.
///
/// Computed through the number of reads needed for the target coverage,
/// which reduces to `desired_coverage / mean_coverage`.
pub fn get_downsampling_fraction(
    sample: &str,
    mapped_reads: u64,
    mean_coverage: f64,
    desired_coverage: f64,
) -> Result<f64, PipelineError> {
    let invalid = |message: String| PipelineError::InvalidCoverage {
        sample: sample.to_string(),
        message,
    };

    if mapped_reads == 0 {
        return Err(invalid("no mapped reads".to_string()));
    }
    if !mean_coverage.is_finite() || mean_coverage <= 0.0 {
        return Err(invalid(format!("mean coverage is {}", mean_coverage)));
    }
    if !desired_coverage.is_finite() || desired_coverage <= 0.0 {
        return Err(invalid(format!("desired coverage is {}", desired_coverage)));
    }

    let mapped_reads = mapped_reads as f64;
    let reads_for_wanted_coverage = mapped_reads / mean_coverage * desired_coverage;
    Ok(reads_for_wanted_coverage / mapped_reads)
}

/// Downsampling fraction for every sample with a flagstat report.
///
/// A sample without coverage data is an error. Fractions above 1.0 (sample
/// already below the target) are capped at 1.0.
pub fn downsampling_fractions(
    mapped_reads: &SampleMap<u64>,
    mean_coverage: &SampleMap<f64>,
    desired_coverage: f64,
) -> Result<SampleMap<f64>, PipelineError> {
    let mut fractions = SampleMap::new();
    for (sample, &reads) in mapped_reads {
        let coverage = *mean_coverage.require(sample, "mean coverage")?;
        let mut fraction = get_downsampling_fraction(sample, reads, coverage, desired_coverage)?;
        if fraction > 1.0 {
            warn!(
                "{} has a mean coverage of {} which is below the wanted {}X; keeping all reads",
                sample, coverage, desired_coverage
            );
            fraction = 1.0;
        }
        fractions.insert(sample.clone(), fraction);
    }
    Ok(fractions)
}
