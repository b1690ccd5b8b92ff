mod common;

use anyhow::Result;
use serde_json::{json, Value};
use swgs_cnv_pipelines::config::defs::PipelineError;
use swgs_cnv_pipelines::pipelines::align::{get_workflow_stage_info, make_fq_dict, run_workflow};
use swgs_cnv_pipelines::pipelines::downsample::{
    gather_bams, get_average_coverage, get_mapping_numbers, start_downsampling_jobs,
};
use swgs_cnv_pipelines::utils::qc::downsampling_fractions;
use common::{downsample_description, link, MockPlatform};

const ALIGN_STAGE: &str = "stage-Fy6fpk040vZZPPbq96Jb2KfK";
const FASTQC_STAGE: &str = "stage-Fy6fpV840vZZ0v6J8qBQYqZF";

fn flagstat(mapped: u64) -> String {
    format!(
        "{} + 0 in total (QC-passed reads + QC-failed reads)\n0 + 0 secondary\n{} + 0 mapped (99.00% : N/A)\n",
        mapped + 10,
        mapped
    )
}

fn wgs_stats(mean_coverage: &str) -> String {
    format!(
        "## htsjdk.samtools.metrics.StringHeader\n\n## METRICS CLASS\tpicard.analysis.WgsMetrics\n\
         GENOME_TERRITORY\tMEAN_COVERAGE\tSD_COVERAGE\n2745186691\t{}\t2.1\n",
        mean_coverage
    )
}

fn qc_platform() -> MockPlatform {
    MockPlatform::new()
        .with_executable("app-picard_downsample", downsample_description())
        .with_file("/qc/flagstat", "X1_S1_markdup.flagstat", &flagstat(1000))
        .with_file("/qc/flagstat", "X2_S2_markdup.flagstat", &flagstat(2000))
        .with_file("/qc/picard", "X1_S1_markdup.wgs_stats.tsv", &wgs_stats("4.0"))
        .with_file("/qc/picard", "X2_S2_markdup.wgs_stats.tsv", &wgs_stats("0.5"))
        .with_file("/bams", "X1_S1_markdup.bam", "")
        .with_file("/bams", "X2_S2_markdup.bam", "")
}

#[tokio::test]
async fn test_downsampling_end_to_end() -> Result<()> {
    let platform = qc_platform();

    let mapped = get_mapping_numbers(&platform, &["/qc/flagstat".to_string()]).await?;
    assert_eq!(mapped.get("X1_S1"), Some(&1000));
    assert_eq!(mapped.get("X2_S2"), Some(&2000));

    let coverage = get_average_coverage(&platform, &["qc/picard".to_string()]).await?;
    assert_eq!(coverage.get("X1_S1"), Some(&4.0));

    let fractions = downsampling_fractions(&mapped, &coverage, 1.0)?;
    assert_eq!(fractions.get("X1_S1"), Some(&0.25));
    // already below 1X
    assert_eq!(fractions.get("X2_S2"), Some(&1.0));

    let bams = gather_bams(&platform, &fractions, None).await?;
    let jobs = start_downsampling_jobs(&platform, &bams, &fractions, 1.0, None).await?;
    assert_eq!(jobs.len(), 2);

    let submitted = platform.submitted();
    assert_eq!(submitted.len(), 2);
    let x1 = &submitted[0];
    assert_eq!(x1.route, "app-picard_downsample");
    assert_eq!(x1.request.folder.as_deref(), Some("/picard_downsample_v1.1.0"));
    assert_eq!(x1.request.tags, vec!["1.1.0".to_string()]);
    assert_eq!(x1.request.name.as_deref(), Some("picard_downsample - Downsample (1X) - X1_S1"));
    assert_eq!(Value::Object(x1.request.input.clone()), json!({
        "sorted_bam": link(&platform.file_id("X1_S1_markdup.bam")),
        "fraction": 0.25,
    }));
    assert_eq!(submitted[1].request.input.get("fraction"), Some(&json!(1.0)));
    Ok(())
}

#[tokio::test]
async fn test_downsampling_explicit_output_folder() -> Result<()> {
    let platform = qc_platform();
    let fractions = vec![("X1_S1".to_string(), 0.5)].into_iter().collect();

    let bams = gather_bams(&platform, &fractions, Some("bams")).await?;
    start_downsampling_jobs(&platform, &bams, &fractions, 2.0, Some("downsampled/")).await?;

    let submitted = platform.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].request.folder.as_deref(), Some("/downsampled"));
    assert_eq!(submitted[0].request.name.as_deref(), Some("picard_downsample - Downsample (2X) - X1_S1"));
    Ok(())
}

#[tokio::test]
async fn test_downsampling_missing_coverage() -> Result<()> {
    let platform = qc_platform().with_file("/qc/flagstat", "X3_S3_markdup.flagstat", &flagstat(500));

    let mapped = get_mapping_numbers(&platform, &["/qc".to_string()]).await?;
    let coverage = get_average_coverage(&platform, &["/qc".to_string()]).await?;
    let res = downsampling_fractions(&mapped, &coverage, 1.0);
    assert!(matches!(res, Err(PipelineError::MissingSample { sample, .. }) if sample == "X3_S3"));
    assert!(platform.submitted().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_downsampling_bam_lookup() -> Result<()> {
    let platform = qc_platform().with_file("/bams/old", "X1_S1_markdup.bam", "");
    let fractions = vec![("X1_S1".to_string(), 0.5)].into_iter().collect();

    let res = gather_bams(&platform, &fractions, Some("/bams")).await;
    assert!(matches!(res, Err(PipelineError::AmbiguousObject { count: 2, .. })));

    let missing = vec![("X7_S7".to_string(), 0.5)].into_iter().collect();
    let res = gather_bams(&platform, &missing, Some("/bams")).await;
    assert!(matches!(res, Err(PipelineError::NoFilesFound { .. })));
    Ok(())
}

fn workflow_platform() -> MockPlatform {
    MockPlatform::new()
        .with_executable("workflow-dias", json!({
            "id": "workflow-dias",
            "name": "dias_single",
            "stages": [
                {"id": FASTQC_STAGE, "executable": "app-fastqc", "name": "fastqc"},
                {"id": ALIGN_STAGE, "executable": "app-sentieon", "name": "sentieon"},
            ]
        }))
        .with_executable("app-fastqc", json!({
            "id": "app-fastqc",
            "name": "fastqc",
            "inputSpec": [{"name": "fastqs", "class": "array:file"}]
        }))
        .with_executable("app-sentieon", json!({
            "id": "app-sentieon",
            "name": "sentieon-bwa",
            "inputSpec": [
                {"name": "reads_fastqgzs", "class": "array:file"},
                {"name": "reads2_fastqgzs", "class": "array:file"},
                {"name": "sample", "class": "string"},
            ]
        }))
        .with_file("/run1", "X1_S1_L002_R1_001.fastq.gz", "")
        .with_file("/run1", "X1_S1_L001_R1_001.fastq.gz", "")
        .with_file("/run1", "X1_S1_L002_R2_001.fastq.gz", "")
        .with_file("/run1", "X1_S1_L001_R2_001.fastq.gz", "")
        .with_file("/run1", "Undetermined_S0_L001_R1_001.fastq.gz", "")
}

#[tokio::test]
async fn test_align_workflow_per_sample() -> Result<()> {
    let platform = workflow_platform();

    let fastqs = make_fq_dict(&platform, &["/run1".to_string()]).await?;
    assert_eq!(fastqs.samples().collect::<Vec<_>>(), vec!["X1_S1"]);

    let workflow = get_workflow_stage_info(&platform, "workflow-dias").await?;
    let analyses = run_workflow(&platform, &workflow, &fastqs, "261017-1200").await?;
    assert_eq!(analyses.len(), 1);

    let submitted = platform.submitted();
    assert_eq!(submitted.len(), 1);
    let run = &submitted[0];
    assert_eq!(run.route, "workflow-dias");
    assert_eq!(run.request.folder.as_deref(), Some("/output_261017-1200"));
    assert_eq!(run.request.name.as_deref(), Some("dias_single - X1_S1"));
    assert_eq!(run.request.stage_folders.get(ALIGN_STAGE).map(String::as_str), Some("sentieon-bwa"));
    assert_eq!(run.request.stage_folders.get(FASTQC_STAGE).map(String::as_str), Some("fastqc"));

    let r1 = vec![
        link(&platform.file_id("X1_S1_L001_R1_001.fastq.gz")),
        link(&platform.file_id("X1_S1_L002_R1_001.fastq.gz")),
    ];
    let r2 = vec![
        link(&platform.file_id("X1_S1_L001_R2_001.fastq.gz")),
        link(&platform.file_id("X1_S1_L002_R2_001.fastq.gz")),
    ];
    let all_reads: Vec<Value> = r1.iter().chain(r2.iter()).cloned().collect();
    assert_eq!(Value::Object(run.request.input.clone()), json!({
        format!("{}.reads_fastqgzs", ALIGN_STAGE): r1,
        format!("{}.reads2_fastqgzs", ALIGN_STAGE): r2,
        format!("{}.sample", ALIGN_STAGE): "X1_S1",
        format!("{}.fastqs", FASTQC_STAGE): all_reads,
    }));
    Ok(())
}

#[tokio::test]
async fn test_align_unpaired_reads() -> Result<()> {
    let platform = workflow_platform().with_file("/run1", "X1_S1_L003_R1_001.fastq.gz", "");

    let res = make_fq_dict(&platform, &["/run1".to_string()]).await;
    assert!(matches!(res, Err(PipelineError::MismatchedReadPairs { r1: 3, r2: 2, .. })));
    Ok(())
}

#[tokio::test]
async fn test_align_no_fastqs() -> Result<()> {
    let platform = workflow_platform();

    let res = make_fq_dict(&platform, &["/run2".to_string()]).await;
    assert!(matches!(res, Err(PipelineError::NoFilesFound { .. })));
    Ok(())
}
