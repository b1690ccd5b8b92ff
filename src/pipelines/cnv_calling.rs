/// WisecondorX CNV calling: npz conversion, reference creation and calling
use std::path::Path;
use std::sync::Arc;
use log::{debug, info};
use crate::cli::args::{CnvArgs, CnvOp, CnvWorkflowArgs, NpzArgs, RefArgs};
use crate::config::defs::{
    PipelineError, RunConfig, CNV_SUBFOLDER, NPZ_SUBFOLDER, REF_INSTANCE_TYPE, REF_SUBFOLDER,
    WISECONDORX_APP, WISECONDORX_OUTPUT,
};
use crate::platform::{
    remote_folder, DataLink, Executable, InputSchema, JobHandle, Platform, RemoteFile, RunRequest,
};
use crate::utils::locate::{get_bams_and_bais, get_npzs_from_folders, select_normal_samples};
use crate::utils::metadata::{parse_normal_sample_file, parse_sex_file};
use crate::utils::sample::SampleMap;

// WisecondorX app inputs
const BAM_INPUT: &str = "bam";
const BAI_INPUT: &str = "bai";
const BINSIZE_CONVERT_INPUT: &str = "binsize_convert";
const CONVERT_NPZ_INPUT: &str = "convert_npz";
const NPZ_INPUT: &str = "npz";
const BINSIZE_NEWREF_INPUT: &str = "binsize_newref";
const CREATE_REF_INPUT: &str = "create_ref";
const REFERENCE_INPUT: &str = "reference";
const VARIANT_CALLING_INPUT: &str = "variant_calling";
const SEX_INPUT: &str = "sex";

/// The WisecondorX app together with its declared inputs.
pub struct CnvCallingApp {
    pub executable: Executable,
    pub name: String,
    pub schema: InputSchema,
}

/// Where the per-sample count files come from.
pub enum NpzSource<'a> {
    /// Existing npz files in these folders
    Folders(&'a [String]),
    /// Outputs of conversion jobs that may still be running
    Jobs(&'a SampleMap<JobHandle>),
}

pub enum ReferenceSource<'a> {
    /// Platform path of an existing reference file
    Path(&'a str),
    /// Output of a reference creation job
    Job(&'a JobHandle),
}

pub async fn setup_cnv_calling_app<P: Platform>(platform: &P) -> Result<CnvCallingApp, PipelineError> {
    let executable = Executable::App(WISECONDORX_APP.to_string());
    let desc = platform.describe(&executable).await?;
    debug!("Using {} ({})", desc.name, desc.id);
    Ok(CnvCallingApp {
        executable,
        name: desc.name.clone(),
        schema: InputSchema::from_description(&desc),
    })
}

async fn gather_npzs<P: Platform>(platform: &P, source: &NpzSource<'_>) -> Result<SampleMap<DataLink>, PipelineError> {
    match source {
        NpzSource::Folders(folders) => get_npzs_from_folders(platform, folders).await,
        NpzSource::Jobs(jobs) => Ok(jobs
            .iter()
            .map(|(sample, job)| (sample.clone(), job.output_ref(WISECONDORX_OUTPUT)))
            .collect()),
    }
}

fn out_subfolder(out_folder: &str, subfolder: &str) -> String {
    format!("{}/{}", remote_folder(out_folder).trim_end_matches('/'), subfolder)
}

/// Splits an absolute platform path into (folder, file name).
pub fn split_remote_path(path: &str) -> Result<(String, String), PipelineError> {
    if !path.starts_with('/') {
        return Err(PipelineError::InvalidConfig(format!(
            "DNAnexus paths need to start with a /: {}",
            path
        )));
    }
    match path.rsplit_once('/') {
        Some((_, "")) | None => Err(PipelineError::InvalidConfig(format!("No file name in path {}", path))),
        Some((folder, name)) => Ok((remote_folder(folder), name.to_string())),
    }
}

/// Glob matching `name` and possibly others: every glob metacharacter
/// becomes a single-character wildcard.
fn literal_glob(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '*' | '?' | '[' | ']') { '?' } else { c })
        .collect()
}

/// Finds the one file at `path`, matching its name exactly. Files with the
/// same name in subfolders do not count.
pub async fn resolve_reference_path<P: Platform>(platform: &P, path: &str) -> Result<RemoteFile, PipelineError> {
    let (folder, name) = split_remote_path(path)?;
    let mut matches: Vec<RemoteFile> = platform
        .find_files(Some(&folder), &literal_glob(&name))
        .await?
        .into_iter()
        .filter(|f| f.name == name)
        .filter(|f| f.folder.as_deref().map_or(true, |f| remote_folder(f) == folder))
        .collect();

    match matches.len() {
        0 => Err(PipelineError::NoFilesFound { pattern: name, folders: folder }),
        1 => Ok(matches.remove(0)),
        count => Err(PipelineError::AmbiguousObject { pattern: path.to_string(), count }),
    }
}

/// Starts one npz conversion job per sample.
///
/// # Arguments
///
/// * `platform` - Platform to submit to.
/// * `app` - WisecondorX app.
/// * `bam_folders` - Folders to look for bams and bais into.
/// * `binsize` - Binsize for the npz.
/// * `out_folder` - Output folder on the platform.
///
/// # Returns
/// SampleMap of sample id to conversion job.
pub async fn convert_npz<P: Platform>(
    platform: &P,
    app: &CnvCallingApp,
    bam_folders: &[String],
    binsize: u32,
    out_folder: &str,
) -> Result<SampleMap<JobHandle>, PipelineError> {
    let sample_bams_bais = get_bams_and_bais(platform, bam_folders).await?;
    let folder = out_subfolder(out_folder, NPZ_SUBFOLDER);

    info!("Setting up conversion jobs...");

    let mut jobs = SampleMap::new();
    for (sample, pair) in &sample_bams_bais {
        let inputs = app
            .schema
            .inputs()
            .links(BAM_INPUT, vec![DataLink::file(&pair.bam)])?
            .links(BAI_INPUT, vec![DataLink::file(&pair.bai)])?
            .value(BINSIZE_CONVERT_INPUT, binsize)?
            .value(CONVERT_NPZ_INPUT, true)?
            .build();
        let job_name = format!("{} - Convert npz ({}) - {}", app.name, binsize, sample);

        let request = RunRequest::new(inputs).folder(folder.clone()).name(job_name.clone());
        let job = platform.run(&app.executable, request).await?;
        info!("Started {} ({})", job_name, job.id);
        jobs.insert(sample.clone(), job);
    }

    info!("Conversion jobs started...");
    Ok(jobs)
}

/// Starts the reference creation job from the normal samples' npz files.
///
/// Without a normals file every npz is taken to be a normal. When the npzs
/// come from conversion jobs, the reference job depends on all of them.
pub async fn create_ref<P: Platform>(
    platform: &P,
    app: &CnvCallingApp,
    binsize: u32,
    out_folder: &str,
    normal_file: Option<&Path>,
    npz_source: NpzSource<'_>,
) -> Result<JobHandle, PipelineError> {
    let npzs = gather_npzs(platform, &npz_source).await?;

    let normals = match normal_file {
        Some(path) => {
            let normal_samples = parse_normal_sample_file(path)?;
            select_normal_samples(npzs, &normal_samples)
        }
        None => npzs,
    };

    if normals.is_empty() {
        return Err(PipelineError::NoNormalSamples);
    }
    info!("Building reference from {} normal samples", normals.len());

    let inputs = app
        .schema
        .inputs()
        .links(NPZ_INPUT, normals.values().cloned().collect())?
        .value(BINSIZE_NEWREF_INPUT, binsize)?
        .value(CREATE_REF_INPUT, true)?
        .build();
    let job_name = format!("{} - Create ref ({})", app.name, binsize);
    let folder = out_subfolder(out_folder, REF_SUBFOLDER);

    info!("Setting up reference job...");

    let mut request = RunRequest::new(inputs)
        .folder(folder)
        .name(job_name.clone())
        .instance_type(REF_INSTANCE_TYPE);
    if let NpzSource::Jobs(jobs) = npz_source {
        request = request.depends_on(jobs.values().cloned().collect());
    }

    let job = platform.run(&app.executable, request).await?;
    info!("Reference job started: {} ({})", job_name, job.id);
    Ok(job)
}

/// Starts one CNV calling job per sample against the reference.
pub async fn call_cnvs<P: Platform>(
    platform: &P,
    app: &CnvCallingApp,
    sex_file: &Path,
    out_folder: &str,
    npz_source: NpzSource<'_>,
    reference: ReferenceSource<'_>,
) -> Result<SampleMap<JobHandle>, PipelineError> {
    let sample_sexes = parse_sex_file(sex_file)?;
    let npzs = gather_npzs(platform, &npz_source).await?;

    let reference_link = match &reference {
        ReferenceSource::Path(path) => DataLink::File(resolve_reference_path(platform, path).await?.id),
        ReferenceSource::Job(job) => job.output_ref(WISECONDORX_OUTPUT),
    };
    let folder = out_subfolder(out_folder, CNV_SUBFOLDER);

    info!("Setting up cnv calling jobs...");

    let mut jobs = SampleMap::new();
    for (sample, npz) in &npzs {
        let sex = sample_sexes.get(sample);

        let mut inputs = app
            .schema
            .inputs()
            .links(NPZ_INPUT, vec![npz.clone()])?
            .links(REFERENCE_INPUT, vec![reference_link.clone()])?
            .value(VARIANT_CALLING_INPUT, true)?;
        if let Some(sex) = sex {
            inputs = inputs.value(SEX_INPUT, sex.as_str())?;
        }
        let job_name = format!(
            "{} - CNV calling ({}) - {}",
            app.name,
            sex.map(String::as_str).unwrap_or("unknown"),
            sample
        );

        let mut depends_on = Vec::new();
        if let NpzSource::Jobs(npz_jobs) = &npz_source {
            depends_on.push(npz_jobs.require(sample, "npz conversion job")?.clone());
        }
        if let ReferenceSource::Job(ref_job) = &reference {
            depends_on.push((*ref_job).clone());
        }

        let request = RunRequest::new(inputs.build())
            .folder(folder.clone())
            .name(job_name.clone())
            .depends_on(depends_on);
        let job = platform.run(&app.executable, request).await?;
        info!("Started {} ({})", job_name, job.id);
        jobs.insert(sample.clone(), job);
    }

    info!("Cnv calling jobs started...");
    Ok(jobs)
}

/// Chains conversion, reference creation and calling without waiting on any job.
pub async fn run_cnv_calling<P: Platform>(
    platform: &P,
    app: &CnvCallingApp,
    args: &CnvWorkflowArgs,
) -> Result<SampleMap<JobHandle>, PipelineError> {
    let npz_jobs = convert_npz(platform, app, &args.downsampled_bam_folder, args.npz_binsize, &args.output).await?;
    let ref_job = create_ref(
        platform,
        app,
        args.ref_binsize,
        &args.output,
        args.normals_file.as_deref().map(Path::new),
        NpzSource::Jobs(&npz_jobs),
    )
    .await?;
    call_cnvs(
        platform,
        app,
        Path::new(&args.sex_file),
        &args.output,
        NpzSource::Jobs(&npz_jobs),
        ReferenceSource::Job(&ref_job),
    )
    .await
}

/// Entry point for the `cnv_calling` subcommands.
pub async fn run<P: Platform>(config: Arc<RunConfig>, platform: &P, op: &CnvOp) -> Result<(), PipelineError> {
    println!("\n-------------\n CNV calling\n-------------\n");
    debug!("Run started at {}", config.run_datetime);

    let app = setup_cnv_calling_app(platform).await?;

    match op {
        CnvOp::Workflow(args) => {
            run_cnv_calling(platform, &app, args).await?;
        }
        CnvOp::Npz(NpzArgs { downsampled_bam_folder, binsize, output }) => {
            convert_npz(platform, &app, downsampled_bam_folder, *binsize, output).await?;
        }
        CnvOp::Ref(RefArgs { npz_folder, normals_file, binsize, output }) => {
            create_ref(
                platform,
                &app,
                *binsize,
                output,
                normals_file.as_deref().map(Path::new),
                NpzSource::Folders(npz_folder),
            )
            .await?;
        }
        CnvOp::Cnv(CnvArgs { npz_folder, npz_reference, sex_file, output }) => {
            call_cnvs(
                platform,
                &app,
                Path::new(sex_file),
                output,
                NpzSource::Folders(npz_folder),
                ReferenceSource::Path(npz_reference),
            )
            .await?;
        }
    }
    Ok(())
}
