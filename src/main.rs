//! caching-proxy
//!
//! A transparent HTTP proxy that caches upstream GET responses on disk.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  CACHING PROXY                   │
//!                       │                                                  │
//!   Client Request      │  ┌────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ────────────────────┼─▶│ server │──▶│ PathPolicy │──▶│ResponseCache│  │
//!                       │  └────────┘   └────────────┘   └──────┬──────┘  │
//!                       │                                  hit  │  miss   │
//!   Client Response     │  ┌──────────┐              ┌─────────▼───────┐  │
//!   ◀───────────────────┼──│ response │◀─────────────│ UpstreamClient  │◀─┼── Upstream
//!     (X-Cache: HIT/MISS)  └──────────┘   store GET  └─────────────────┘  │    Origin
//!                       │                 2xx/3xx                          │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! Exit codes: 0 on success or interrupt, 1 on invalid arguments or
//! configuration, 2 on unexpected internal errors.

use std::process::ExitCode;

use clap::Parser;

use caching_proxy::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(cli::parse_error_exit_code(&e));
        }
    };

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
