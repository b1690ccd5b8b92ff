use std::sync::Arc;
use log::{debug, info};
use crate::cli::args::DownsamplingArgs;
use crate::config::defs::{PipelineError, RunConfig, DOWNSAMPLE_APP, FLAGSTAT_GLOB, WGS_STATS_GLOB};
use crate::platform::{remote_folder, DataLink, Executable, InputSchema, JobHandle, Platform, RunRequest};
use crate::utils::locate::find_in_folders;
use crate::utils::qc::{downsampling_fractions, parse_flagstat_mapped, parse_wgs_mean_coverage};
use crate::utils::sample::{sample_id, SampleMap};

const SORTED_BAM_INPUT: &str = "sorted_bam";
const FRACTION_INPUT: &str = "fraction";


/// Number of mapped reads per sample from the flagstat reports in `folders`.
pub async fn get_mapping_numbers<P: Platform>(
    platform: &P,
    folders: &[String],
) -> Result<SampleMap<u64>, PipelineError> {
    info!("Gathering flagstats...");
    let mut flagstats = SampleMap::new();
    for file in find_in_folders(platform, folders, FLAGSTAT_GLOB).await? {
        let content = platform.read_file(&file.id).await?;
        let mapped = parse_flagstat_mapped(&content, &file.name)?;
        debug!("{}: {} mapped reads", file.name, mapped);
        flagstats.insert(sample_id(&file.name), mapped);
    }
    Ok(flagstats)
}

/// Mean coverage per sample from the Picard WGS metrics in `folders`.
pub async fn get_average_coverage<P: Platform>(
    platform: &P,
    folders: &[String],
) -> Result<SampleMap<f64>, PipelineError> {
    info!("Gathering Picard WGS metrics...");
    let mut coverages = SampleMap::new();
    for file in find_in_folders(platform, folders, WGS_STATS_GLOB).await? {
        let content = platform.read_file(&file.id).await?;
        let coverage = parse_wgs_mean_coverage(&content, &file.name)?;
        debug!("{}: mean coverage {}", file.name, coverage);
        coverages.insert(sample_id(&file.name), coverage);
    }
    Ok(coverages)
}

/// The BAM of every sample, found by `<sample>_*.bam`. Exactly one is expected.
pub async fn gather_bams<P: Platform>(
    platform: &P,
    samples: &SampleMap<f64>,
    bam_folder: Option<&str>,
) -> Result<SampleMap<String>, PipelineError> {
    let folder = bam_folder.map(remote_folder);
    let mut bams = SampleMap::new();
    for sample in samples.samples() {
        let bam = platform
            .find_one_file(folder.as_deref(), &format!("{}_*.bam", sample))
            .await?;
        debug!("{}: {} ({})", sample, bam.name, bam.id);
        bams.insert(sample, bam.id);
    }
    Ok(bams)
}

/// Starts one downsampling job per sample.
///
/// # Arguments
///
/// * `platform` - Platform to submit to.
/// * `bams` - Sample to BAM file id.
/// * `fractions` - Sample to downsampling fraction.
/// * `coverage` - Wanted coverage, used in the job names.
/// * `out_folder` - Output folder. Defaults to `/<app>_v<version>`.
///
/// # Returns
/// SampleMap of sample id to downsampling job.
pub async fn start_downsampling_jobs<P: Platform>(
    platform: &P,
    bams: &SampleMap<String>,
    fractions: &SampleMap<f64>,
    coverage: f64,
    out_folder: Option<&str>,
) -> Result<SampleMap<JobHandle>, PipelineError> {
    let executable = Executable::App(DOWNSAMPLE_APP.to_string());
    let desc = platform.describe(&executable).await?;
    let schema = InputSchema::from_description(&desc);

    let (folder, tags) = match (out_folder, &desc.version) {
        (Some(folder), _) => (remote_folder(folder), desc.version.iter().cloned().collect()),
        (None, Some(version)) => (remote_folder(&format!("{}_v{}", desc.name, version)), vec![version.clone()]),
        (None, None) => (remote_folder(&desc.name), Vec::new()),
    };

    info!("Setting up downsampling jobs in {}...", folder);

    let mut jobs = SampleMap::new();
    for (sample, bam) in bams {
        let fraction = *fractions.require(sample, "downsampling fraction")?;
        let inputs = schema
            .inputs()
            .links(SORTED_BAM_INPUT, vec![DataLink::file(bam)])?
            .value(FRACTION_INPUT, fraction)?
            .build();
        let job_name = format!("{} - Downsample ({}X) - {}", desc.name, coverage, sample);

        let request = RunRequest::new(inputs)
            .folder(folder.clone())
            .name(job_name.clone())
            .tags(tags.clone());
        let job = platform.run(&executable, request).await?;
        info!("Started {} with fraction {:.4} ({})", job_name, fraction, job.id);
        jobs.insert(sample.clone(), job);
    }

    info!("Downsampling jobs started...");
    Ok(jobs)
}

pub async fn run<P: Platform>(
    config: Arc<RunConfig>,
    platform: &P,
    args: &DownsamplingArgs,
) -> Result<(), PipelineError> {
    println!("\n-------------\n Downsampling\n-------------\n");
    debug!("Run started at {}", config.run_datetime);

    let mapping_numbers = get_mapping_numbers(platform, &args.flagstat_folders).await?;
    let average_coverage = get_average_coverage(platform, &args.picard_folders).await?;
    let fractions = downsampling_fractions(&mapping_numbers, &average_coverage, args.coverage)?;
    let bams = gather_bams(platform, &fractions, args.bam_folder.as_deref()).await?;
    start_downsampling_jobs(platform, &bams, &fractions, args.coverage, args.output.as_deref()).await?;
    Ok(())
}
