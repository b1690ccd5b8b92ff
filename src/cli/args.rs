use clap::{Args, Parser, Subcommand};
use crate::config::defs::{DEFAULT_NPZ_BINSIZE, DEFAULT_REF_BINSIZE};

#[derive(Parser, Debug, Clone)]
#[command(name = "swgs-cnv-pipelines", version, about = "Launch sWGS CNV calling jobs on the DNAnexus platform")]
pub struct Arguments {

    #[arg(short = 'v', long = "verbose", action, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, help = "API server URL. Defaults to DX_APISERVER_* variables or the public API server")]
    pub api_url: Option<String>,

    #[arg(long, global = true, env = "DX_AUTH_TOKEN", hide_env_values = true, help = "API token. Falls back to DX_SECURITY_CONTEXT")]
    pub token: Option<String>,

    #[arg(long, global = true, env = "DX_PROJECT_CONTEXT_ID", help = "Project to search and run jobs in")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Align FASTQs with the single-sample workflow
    Align(AlignArgs),

    /// Downsample BAMs to a target mean coverage
    Downsampling(DownsamplingArgs),

    /// WisecondorX CNV calling steps
    #[command(name = "cnv_calling", alias = "cnv-calling")]
    CnvCalling {
        #[command(subcommand)]
        op: CnvOp,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AlignArgs {
    #[arg(required = true, num_args = 1.., help = "DNAnexus folder containing fastqs")]
    pub fastq_folder: Vec<String>,

    #[arg(long, help = "Single-sample workflow id")]
    pub workflow: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DownsamplingArgs {
    #[arg(short = 'f', long = "flagstat_folders", alias = "flagstat-folders", required = true, num_args = 1.., help = "Flagstat DNAnexus folder")]
    pub flagstat_folders: Vec<String>,

    #[arg(short = 'p', long = "picard_folders", alias = "picard-folders", required = true, num_args = 1.., help = "Picard DNAnexus folder")]
    pub picard_folders: Vec<String>,

    #[arg(short = 'c', long, default_value_t = 1.0, help = "Wanted average coverage. Default=1X")]
    pub coverage: f64,

    #[arg(short = 'b', long = "bam_folder", alias = "bam-folder", help = "Folder to look for BAMs in. Defaults to the whole project")]
    pub bam_folder: Option<String>,

    #[arg(short = 'o', long, help = "Output folder for the downsampling jobs")]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CnvOp {
    /// Run the cnv calling without having to run individual commands
    Workflow(CnvWorkflowArgs),

    /// Individual step to generate npz files from BAM and BAI
    Npz(NpzArgs),

    /// Individual step to generate npz reference file
    Ref(RefArgs),

    /// Individual step to generate cnv calling output
    Cnv(CnvArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CnvWorkflowArgs {
    #[arg(short = 'd', long = "downsampled_bam_folder", alias = "downsampled-bam-folder", required = true, num_args = 1.., help = "Downsampled bam DNAnexus folder")]
    pub downsampled_bam_folder: Vec<String>,

    #[arg(short = 'n', long = "normals_file", alias = "normals-file", help = "File containing normal samples")]
    pub normals_file: Option<String>,

    #[arg(short = 's', long = "sex_file", alias = "sex-file", required = true, help = "File containing sample ids and their sex")]
    pub sex_file: String,

    #[arg(long = "npz_binsize", alias = "npz-binsize", default_value_t = DEFAULT_NPZ_BINSIZE)]
    pub npz_binsize: u32,

    #[arg(long = "ref_binsize", alias = "ref-binsize", default_value_t = DEFAULT_REF_BINSIZE)]
    pub ref_binsize: u32,

    #[arg(short = 'o', long, required = true, help = "DNAnexus output folder")]
    pub output: String,
}

#[derive(Args, Debug, Clone)]
pub struct NpzArgs {
    #[arg(required = true, num_args = 1.., help = "Downsampled bam DNAnexus folder")]
    pub downsampled_bam_folder: Vec<String>,

    #[arg(short = 'b', long, default_value_t = DEFAULT_NPZ_BINSIZE)]
    pub binsize: u32,

    #[arg(short = 'o', long, required = true, help = "DNAnexus output folder")]
    pub output: String,
}

#[derive(Args, Debug, Clone)]
pub struct RefArgs {
    #[arg(short = 'f', long = "npz_folder", alias = "npz-folder", required = true, num_args = 1.., help = "Folder containing npz files in DNAnexus")]
    pub npz_folder: Vec<String>,

    #[arg(short = 'n', long = "normals_file", alias = "normals-file", help = "File containing normal samples")]
    pub normals_file: Option<String>,

    #[arg(short = 'b', long, default_value_t = DEFAULT_REF_BINSIZE)]
    pub binsize: u32,

    #[arg(short = 'o', long, required = true, help = "DNAnexus output folder")]
    pub output: String,
}

#[derive(Args, Debug, Clone)]
pub struct CnvArgs {
    #[arg(short = 'f', long = "npz_folder", alias = "npz-folder", required = true, num_args = 1.., help = "Folder containing npz files")]
    pub npz_folder: Vec<String>,

    #[arg(short = 'r', long = "npz_reference", alias = "npz-reference", required = true, help = "DNAnexus path to npz reference")]
    pub npz_reference: String,

    #[arg(short = 's', long = "sex_file", alias = "sex-file", required = true, help = "File containing sample ids and their sex")]
    pub sex_file: String,

    #[arg(short = 'o', long, required = true, help = "DNAnexus output folder")]
    pub output: String,
}
