// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::{fs, io};

use clap::Parser;
use log::debug;
use report::{write_report, ReportOptions};
use sigblock_api::{inspect_apk, inspect_signing_block, Result, SchemeRegistry, SigBlockError};

mod report;

#[derive(Parser)]
#[command(name = "sigblock", version, about = "Inspect the APK Signing Block of an APK")]
struct Cli {
    /// APK to inspect, or an extracted signing block with --raw-block
    input: PathBuf,

    /// The input is a signing block on its own rather than a whole APK
    #[arg(long)]
    raw_block: bool,

    /// Print signer certificates as PEM
    #[arg(long, conflicts_with = "no_certs")]
    pem: bool,

    /// Don't decode certificates and public keys
    #[arg(long)]
    no_certs: bool,

    /// Log what the parser finds along the way
    #[arg(short, long)]
    verbose: bool
}

/// Prints the APK Signing Block of an APK: every ID-value pair, then the
/// signers of each signature scheme found.
///
/// ```text
/// $ sigblock app-release.apk
/// $ sigblock --pem app-release.apk
/// $ sigblock --raw-block extracted.bin
/// ```
///
/// A block whose framing is broken fails the whole run. A scheme that can't
/// be decoded is reported and the others are still printed.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let input = fs::read(&cli.input)?;
    debug!("Read {} bytes from {:?}", input.len(), cli.input);
    if input.is_empty() {
        return Err(SigBlockError::Cli(format!("{:?} is empty", cli.input)));
    }

    let registry = SchemeRegistry::default();
    let inspection = if cli.raw_block {
        inspect_signing_block(&input, None, &registry)?
    } else {
        match inspect_apk(&input, &registry)? {
            Some(inspection) => inspection,
            None => {
                println!("{:?} has no APK Signing Block", cli.input);
                return Ok(());
            }
        }
    };

    let options = ReportOptions {
        certificates: !cli.no_certs,
        pem: cli.pem
    };
    write_report(&mut io::stdout().lock(), &inspection, &options)
}
