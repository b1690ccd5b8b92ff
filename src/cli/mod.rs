pub mod args;

use clap::Parser;
pub use args::{Arguments, Command, CnvOp};

pub fn parse() -> Arguments {
    Arguments::parse()
}
