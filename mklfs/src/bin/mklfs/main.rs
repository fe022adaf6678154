mod cli;

use std::process::ExitCode;

use clap::Parser;
use lfs::{BSIZE, FSSIZE, NMETA};

use self::cli::{Cli, Command};

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:?}");
            eprintln!("mklfs: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> mklfs::Result<()> {
    match cli.command {
        Command::Build {
            image,
            files,
            checkpoint_policy,
        } => {
            println!(
                "nmeta {NMETA} (boot, super, checkpoint1, checkpoint2) blocks {} total {FSSIZE}",
                FSSIZE - NMETA
            );
            let report = mklfs::build(&image, &files, checkpoint_policy.into())?;
            println!(
                "balloc: first {} blocks have been allocated",
                NMETA + report.blocks_allocated
            );
            println!(
                "{} inodes, {} segments, {} KiB image at {image:?}",
                report.inodes_allocated,
                report.segments_used,
                FSSIZE * BSIZE / 1024
            );
        }
        Command::Inspect { image } => print!("{}", mklfs::inspect(&image)?),
    }
    Ok(())
}
