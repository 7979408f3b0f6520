//! fic: fi-IR on stdin to C on stdout

use clap::Parser as ClapParser;

#[derive(ClapParser)]
#[command(name = "fic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "fi compiler - translate fi-IR on stdin to C on stdout", long_about = None)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();
    fic::cli::main_for(fic::Pipeline::Fi);
}
