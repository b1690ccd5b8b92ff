/// Lookup of remote files by folder and glob, grouped by sample
use std::collections::HashSet;
use log::{debug, info, warn};
use crate::config::defs::{PipelineError, BAI_GLOB, BAM_GLOB, NPZ_GLOB};
use crate::platform::{remote_folder, DataLink, Platform, RemoteFile};
use crate::utils::sample::{sample_id, SampleMap};

#[derive(Debug, Clone, PartialEq)]
pub struct BamPair {
    pub bam: String,
    pub bai: String,
}

/// All files matching `pattern` in any of `folders`. Nothing found is an error.
///
/// Lookups recurse, so overlapping folders can return the same object more
/// than once; each file id is kept only the first time it is seen.
pub async fn find_in_folders<P: Platform>(
    platform: &P,
    folders: &[String],
    pattern: &str,
) -> Result<Vec<RemoteFile>, PipelineError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for folder in folders {
        let folder = remote_folder(folder);
        let found = platform.find_files(Some(&folder), pattern).await?;
        debug!("{} files matching {} in {}", found.len(), pattern, folder);
        files.extend(found.into_iter().filter(|f| seen.insert(f.id.clone())));
    }

    if files.is_empty() {
        return Err(PipelineError::NoFilesFound {
            pattern: pattern.to_string(),
            folders: folders.join(", "),
        });
    }
    Ok(files)
}

/// Groups files by sample, requiring exactly one file per sample.
fn one_file_per_sample(files: Vec<RemoteFile>, pattern: &str) -> Result<SampleMap<String>, PipelineError> {
    let mut grouped: SampleMap<Vec<String>> = SampleMap::new();
    for file in files {
        grouped.get_or_insert_default(&sample_id(&file.name)).push(file.id);
    }

    let mut per_sample = SampleMap::new();
    for (sample, mut ids) in grouped {
        if ids.len() > 1 {
            return Err(PipelineError::AmbiguousObject {
                pattern: format!("{} ({})", pattern, sample),
                count: ids.len(),
            });
        }
        if let Some(id) = ids.pop() {
            per_sample.insert(sample, id);
        }
    }
    Ok(per_sample)
}

/// BAMs and their indexes, per sample.
///
/// # Arguments
///
/// * `platform` - Platform to search.
/// * `folders` - Folders to look into for bams and bais.
///
/// # Returns
/// SampleMap of BamPair. An index without BAM, a BAM without index, or
/// several distinct BAMs or indexes for one sample is an error.
pub async fn get_bams_and_bais<P: Platform>(
    platform: &P,
    folders: &[String],
) -> Result<SampleMap<BamPair>, PipelineError> {
    info!("Gathering bams and bais...");

    let bams = one_file_per_sample(find_in_folders(platform, folders, BAM_GLOB).await?, BAM_GLOB)?;
    let mut bais = one_file_per_sample(find_in_folders(platform, folders, BAI_GLOB).await?, BAI_GLOB)?;

    if let Some(sample) = bais.samples().find(|sample| !bams.contains(sample)) {
        return Err(PipelineError::IndexWithoutBam(sample.to_string()));
    }

    let mut bams_bais = SampleMap::new();
    for (sample, bam) in bams {
        let bai = bais
            .remove(&sample)
            .ok_or_else(|| PipelineError::BamWithoutIndex(sample.clone()))?;
        bams_bais.insert(sample, BamPair { bam, bai });
    }

    info!("Found bams and bais for {} samples", bams_bais.len());
    Ok(bams_bais)
}

/// Count (npz) files per sample.
pub async fn get_npzs_from_folders<P: Platform>(
    platform: &P,
    folders: &[String],
) -> Result<SampleMap<DataLink>, PipelineError> {
    info!("Gathering npzs...");

    let mut npzs = SampleMap::new();
    for npz in find_in_folders(platform, folders, NPZ_GLOB).await? {
        npzs.insert(sample_id(&npz.name), DataLink::File(npz.id));
    }

    info!("Found npzs for {} samples", npzs.len());
    Ok(npzs)
}

/// Restricts per-sample references to the normal samples.
///
/// Returns exactly the intersection; listed normals with no entry are
/// reported and skipped.
pub fn select_normal_samples<V>(per_sample: SampleMap<V>, normal_samples: &[String]) -> SampleMap<V> {
    for normal in normal_samples {
        if !per_sample.contains(normal) {
            warn!("Normal sample {} has no npz and is left out of the reference", normal);
        }
    }
    per_sample.retain_samples(normal_samples)
}
