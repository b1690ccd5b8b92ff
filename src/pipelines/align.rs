use std::collections::BTreeMap;
use std::sync::Arc;
use log::{debug, info};
use serde_json::{Map, Value};
use crate::cli::args::AlignArgs;
use crate::config::defs::{
    PipelineError, RunConfig, DIAS_SINGLE_WORKFLOW, FASTQC_TAG, FASTQ_GLOB, SENTIEON_R1_TAG,
    SENTIEON_R2_TAG, SENTIEON_SAMPLE_TAG, WORKFLOW_STAGE_INPUTS,
};
use crate::platform::{DataLink, Executable, ExecutableDescription, InputSchema, JobHandle, Platform, RunRequest};
use crate::utils::fastq::{pair_fastqs, ReadPairs};
use crate::utils::locate::find_in_folders;
use crate::utils::sample::SampleMap;

/// A workflow with the descriptions of its stage executables.
pub struct WorkflowInfo {
    pub executable: Executable,
    pub description: ExecutableDescription,
    pub stages: Vec<(String, ExecutableDescription)>,
}

impl WorkflowInfo {
    pub fn schema(&self) -> InputSchema {
        InputSchema::for_workflow(&self.description, &self.stages)
    }

    /// Output folder of every stage, named after the stage's app.
    pub fn stage_output_folders(&self) -> BTreeMap<String, String> {
        self.stages
            .iter()
            .map(|(stage_id, desc)| (stage_id.clone(), desc.name.clone()))
            .collect()
    }
}

/// FASTQs found in `folders`, paired per sample.
pub async fn make_fq_dict<P: Platform>(
    platform: &P,
    folders: &[String],
) -> Result<SampleMap<ReadPairs>, PipelineError> {
    info!("Gathering fastqs...");
    let fastqs = find_in_folders(platform, folders, FASTQ_GLOB).await?;
    let pairs = pair_fastqs(fastqs)?;
    if pairs.is_empty() {
        return Err(PipelineError::NoFilesFound {
            pattern: FASTQ_GLOB.to_string(),
            folders: folders.join(", "),
        });
    }
    info!("Found fastqs for {} samples", pairs.len());
    Ok(pairs)
}

/// Describes the workflow and the executable behind each of its stages.
pub async fn get_workflow_stage_info<P: Platform>(
    platform: &P,
    workflow_id: &str,
) -> Result<WorkflowInfo, PipelineError> {
    let executable = Executable::Id(workflow_id.to_string());
    let description = platform.describe(&executable).await?;

    let mut stages = Vec::with_capacity(description.stages.len());
    for stage in &description.stages {
        let stage_desc = platform.describe(&Executable::Id(stage.executable.clone())).await?;
        debug!("Stage {}: {} ({})", stage.id, stage_desc.name, stage.executable);
        stages.push((stage.id.clone(), stage_desc));
    }

    Ok(WorkflowInfo { executable, description, stages })
}

fn stage_input(tag: &str) -> Result<&'static str, PipelineError> {
    WORKFLOW_STAGE_INPUTS
        .get(tag)
        .copied()
        .ok_or_else(|| PipelineError::InvalidConfig(format!("No workflow input configured for {}", tag)))
}

/// Inputs of the single-sample workflow for one sample.
pub fn setup_inputs_workflow(
    schema: &InputSchema,
    sample: &str,
    reads: &ReadPairs,
) -> Result<Map<String, Value>, PipelineError> {
    let r1: Vec<DataLink> = reads.r1_ids().into_iter().map(DataLink::File).collect();
    let r2: Vec<DataLink> = reads.r2_ids().into_iter().map(DataLink::File).collect();
    let all_reads: Vec<DataLink> = r1.iter().chain(r2.iter()).cloned().collect();

    Ok(schema
        .inputs()
        .links(stage_input(SENTIEON_R1_TAG)?, r1)?
        .links(stage_input(SENTIEON_R2_TAG)?, r2)?
        .links(stage_input(FASTQC_TAG)?, all_reads)?
        .value(stage_input(SENTIEON_SAMPLE_TAG)?, sample)?
        .build())
}

/// Starts the workflow once per sample into `/output_<run_datetime>`.
pub async fn run_workflow<P: Platform>(
    platform: &P,
    workflow: &WorkflowInfo,
    fastq_dict: &SampleMap<ReadPairs>,
    run_datetime: &str,
) -> Result<SampleMap<JobHandle>, PipelineError> {
    let schema = workflow.schema();
    let stage_folders = workflow.stage_output_folders();
    let folder = format!("/output_{}", run_datetime);

    let mut analyses = SampleMap::new();
    for (sample, reads) in fastq_dict {
        let inputs = setup_inputs_workflow(&schema, sample, reads)?;
        let request = RunRequest::new(inputs)
            .folder(folder.clone())
            .name(format!("{} - {}", workflow.description.name, sample))
            .stage_folders(stage_folders.clone());
        let analysis = platform.run(&workflow.executable, request).await?;
        info!("Started {} for {} ({})", workflow.description.name, sample, analysis.id);
        analyses.insert(sample.clone(), analysis);
    }
    Ok(analyses)
}

pub async fn run<P: Platform>(
    config: Arc<RunConfig>,
    platform: &P,
    args: &AlignArgs,
) -> Result<(), PipelineError> {
    println!("\n-------------\n Alignment\n-------------\n");

    let fastq_dict = make_fq_dict(platform, &args.fastq_folder).await?;
    let workflow_id = args.workflow.as_deref().unwrap_or(DIAS_SINGLE_WORKFLOW);
    let workflow = get_workflow_stage_info(platform, workflow_id).await?;
    run_workflow(platform, &workflow, &fastq_dict, &config.run_datetime).await?;
    Ok(())
}
