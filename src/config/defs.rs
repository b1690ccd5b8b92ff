use std::collections::HashMap;
use lazy_static::lazy_static;
use thiserror::Error;
use crate::cli::Arguments;

// Platform executables
pub const SWGS_PROJECT: &str = "project-G8KJ7x84q42xKQJ95Fx2P7ZJ";
pub const DIAS_SINGLE_WORKFLOW: &str = "workflow-G8vy0v84q42qqBBf6GfgKZ89";
pub const DOWNSAMPLE_APP: &str = "picard_downsample";
pub const WISECONDORX_APP: &str = "eggd_wisecondorX";

pub const DEFAULT_API_URL: &str = "https://api.dnanexus.com:443";
pub const DX_LINK_KEY: &str = "$dnanexus_link";

// Single-sample workflow stage inputs
pub const SENTIEON_R1_TAG: &str = "sentieon_R1";
pub const SENTIEON_R2_TAG: &str = "sentieon_R2";
pub const SENTIEON_SAMPLE_TAG: &str = "sentieon_sample";
pub const FASTQC_TAG: &str = "fastqc";

lazy_static! {
    pub static ref WORKFLOW_STAGE_INPUTS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(SENTIEON_R1_TAG, "stage-Fy6fpk040vZZPPbq96Jb2KfK.reads_fastqgzs");
        m.insert(SENTIEON_R2_TAG, "stage-Fy6fpk040vZZPPbq96Jb2KfK.reads2_fastqgzs");
        m.insert(SENTIEON_SAMPLE_TAG, "stage-Fy6fpk040vZZPPbq96Jb2KfK.sample");
        m.insert(FASTQC_TAG, "stage-Fy6fpV840vZZ0v6J8qBQYqZF.fastqs");

        m
    };
}

// File patterns
pub const FASTQ_GLOB: &str = "*fastq.gz";
pub const BAM_GLOB: &str = "*.bam";
pub const BAI_GLOB: &str = "*.bai";
pub const NPZ_GLOB: &str = "*.npz";
pub const FLAGSTAT_GLOB: &str = "*.flagstat";
pub const WGS_STATS_GLOB: &str = "*.wgs_stats.tsv";
pub const UNDETERMINED_PREFIX: &str = "Undetermined";

// QC report tokens
pub const FLAGSTAT_MAPPED_TOKEN: &str = "mapped";
pub const WGS_STATS_HEADER_TOKEN: &str = "GENOME_TERRITORY";
pub const WGS_STATS_COVERAGE_COLUMN: &str = "MEAN_COVERAGE";

// WisecondorX app inputs and outputs
pub const WISECONDORX_OUTPUT: &str = "wisecondorx_output";
pub const REF_INSTANCE_TYPE: &str = "mem1_ssd1_v2_x16";
pub const NPZ_SUBFOLDER: &str = "npzs";
pub const REF_SUBFOLDER: &str = "ref";
pub const CNV_SUBFOLDER: &str = "output";
pub const DEFAULT_NPZ_BINSIZE: u32 = 5000;
pub const DEFAULT_REF_BINSIZE: u32 = 100000;


/// Resolved connection settings for the job platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSettings {
    pub api_url: String,
    pub token: String,
    pub project: String,
}

pub struct RunConfig {
    pub args: Arguments,
    pub platform: PlatformSettings,
    pub run_datetime: String,
}


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IOError(String),

    #[error("Failed to parse {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("Found bai for {0} but not a bam")]
    IndexWithoutBam(String),

    #[error("Found bam for {0} but not a bai")]
    BamWithoutIndex(String),

    #[error("No files matching '{pattern}' found in {folders}")]
    NoFilesFound { pattern: String, folders: String },

    #[error("Expected exactly one object matching '{pattern}', found {count}")]
    AmbiguousObject { pattern: String, count: usize },

    #[error("Sample {sample} has no {what}")]
    MissingSample { sample: String, what: String },

    #[error("Invalid coverage data for {sample}: {message}")]
    InvalidCoverage { sample: String, message: String },

    #[error("Executable {executable} has no input named '{input}'")]
    UnknownInput { executable: String, input: String },

    #[error("Input type for {input} is '{class}' but {count} inputs have been gathered: {ids:?}")]
    Cardinality { input: String, class: String, count: usize, ids: Vec<String> },

    #[error("Input {input} is declared as '{class}' and cannot take file links")]
    UnsupportedInputClass { input: String, class: String },

    #[error("Mismatched number of R1/R2 fastqs for {sample}: {r1} vs {r2}")]
    MismatchedReadPairs { sample: String, r1: usize, r2: usize },

    #[error("Unable to determine read number (R1 or R2) for fastq {0}")]
    UnknownReadNumber(String),

    #[error("No normal npz files found")]
    NoNormalSamples,

    #[error("Platform API error on {route} (HTTP {status}): {message}")]
    Api { route: String, status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}
