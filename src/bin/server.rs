//! Support inbox server binary.
//! Run with: cargo run --bin support-inbox-server

use std::process::ExitCode;

use support_inbox::start_support_inbox;

fn main() -> ExitCode {
    start_support_inbox::run()
}
