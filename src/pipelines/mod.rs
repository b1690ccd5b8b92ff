pub mod align;
pub mod cnv_calling;
pub mod downsample;
