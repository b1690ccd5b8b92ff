pub mod fastq;
pub mod locate;
pub mod metadata;
pub mod qc;
pub mod sample;
pub mod system;
