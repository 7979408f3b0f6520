//! hic: hi-IR on stdin, lowered through fi-IR, to C on stdout

use clap::Parser as ClapParser;

#[derive(ClapParser)]
#[command(name = "hic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "hi compiler - lower hi-IR on stdin to C on stdout", long_about = None)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();
    fic::cli::main_for(fic::Pipeline::Hi);
}
