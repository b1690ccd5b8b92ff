/// Pairing of remote FASTQ files into per-sample R1/R2 lists
use log::{debug, warn};
use crate::config::defs::{PipelineError, UNDETERMINED_PREFIX};
use crate::platform::RemoteFile;
use crate::utils::sample::{sample_id, SampleMap};

const R1_TAG: &str = "_R1_";
const R2_TAG: &str = "_R2_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadNumber {
    R1,
    R2,
}

pub fn read_number(file_name: &str) -> Option<ReadNumber> {
    if file_name.contains(R1_TAG) {
        Some(ReadNumber::R1)
    } else if file_name.contains(R2_TAG) {
        Some(ReadNumber::R2)
    } else {
        None
    }
}

/// Lane files of one sample. After `pair_fastqs` the file at position n in
/// `r1` is the mate of the file at position n in `r2`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadPairs {
    pub r1: Vec<RemoteFile>,
    pub r2: Vec<RemoteFile>,
}

impl ReadPairs {
    pub fn r1_ids(&self) -> Vec<String> {
        self.r1.iter().map(|f| f.id.clone()).collect()
    }

    pub fn r2_ids(&self) -> Vec<String> {
        self.r2.iter().map(|f| f.id.clone()).collect()
    }
}

/// Groups FASTQs by sample and read number, sorted by file name.
///
/// # Arguments
///
/// * `files` - FASTQ files found on the platform.
///
/// # Returns
/// SampleMap of ReadPairs. `Undetermined` files are skipped; a file without
/// R1/R2 tag or a sample with unequal R1/R2 counts is an error.
pub fn pair_fastqs(files: Vec<RemoteFile>) -> Result<SampleMap<ReadPairs>, PipelineError> {
    let mut pairs: SampleMap<ReadPairs> = SampleMap::new();

    for file in files {
        if file.name.starts_with(UNDETERMINED_PREFIX) {
            warn!("Skipping {}", file.name);
            continue;
        }
        let sample = sample_id(&file.name);
        let read = read_number(&file.name)
            .ok_or_else(|| PipelineError::UnknownReadNumber(file.name.clone()))?;
        debug!("{} -> {} {:?}", file.name, sample, read);

        let entry = pairs.get_or_insert_default(&sample);
        match read {
            ReadNumber::R1 => entry.r1.push(file),
            ReadNumber::R2 => entry.r2.push(file),
        }
    }

    let mut sorted = SampleMap::new();
    for (sample, mut reads) in pairs {
        reads.r1.sort_by(|a, b| a.name.cmp(&b.name));
        reads.r2.sort_by(|a, b| a.name.cmp(&b.name));
        if reads.r1.len() != reads.r2.len() {
            return Err(PipelineError::MismatchedReadPairs {
                sample,
                r1: reads.r1.len(),
                r2: reads.r2.len(),
            });
        }
        sorted.insert(sample, reads);
    }
    Ok(sorted)
}
