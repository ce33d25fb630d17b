// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Host shim: `time-oracle [OPTIONS] <FUNCTION>`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use time_oracle::config::{DEFAULT_NTP_LIST, DEFAULT_NTS_LIST};
use time_oracle::{Oracle, OracleConfig, Response};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Arguments for the oracle CLI
#[derive(Parser, Debug)]
#[command(version, about = "Trusted time from ordered NTP and NTS server lists")]
struct Args {
    #[clap(value_name = "FUNCTION", help = "Function to invoke: GetTimeNtp or GetTimeNts")]
    function: String,

    #[clap(
        long,
        value_name = "PATH",
        help = "Plain NTP server list, one host or host|port per line",
        default_value = DEFAULT_NTP_LIST
    )]
    ntp_list: PathBuf,

    #[clap(
        long,
        value_name = "PATH",
        help = "NTS server list, one host or host|port per line",
        default_value = DEFAULT_NTS_LIST
    )]
    nts_list: PathBuf,

    #[clap(
        long,
        value_name = "SECS",
        help = "Timeout for each query and each key establishment",
        default_value_t = 5
    )]
    timeout: u64,

    #[clap(long, value_name = "N", help = "IP TTL / hop limit", default_value_t = 128)]
    ttl: u32,

    #[clap(long, value_name = "IP", help = "Local address to send from")]
    local_address: Option<IpAddr>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    debug!("command line: {:?}", args);

    let mut builder = OracleConfig::builder()
        .ntp_list(args.ntp_list)
        .nts_list(args.nts_list)
        .timeout(Duration::from_secs(args.timeout))
        .ttl(args.ttl);
    if let Some(addr) = args.local_address {
        builder = builder.local_address(addr);
    }
    let oracle = Oracle::new(builder.build());

    match oracle.invoke(&args.function) {
        Response::Success(payload) => {
            println!("{}", String::from_utf8_lossy(&payload));
            ExitCode::SUCCESS
        }
        Response::Error(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
