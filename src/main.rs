use clap::Parser;
use std::process;
use thingspeak_uplink::cli::{args::Args, commands};
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Ctrl+C stops the producer; the worker still drains what was queued
        let cancellation_token = CancellationToken::new();
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, finishing queued uploads...");
                signal_token.cancel();
            }
        });

        commands::run(args, cancellation_token).await
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("ThingSpeak Uplink - Weather Station Channel Publisher");
    println!("====================================================");
    println!();
    println!("Publish locally recorded weather observations to a ThingSpeak channel.");
    println!();
    println!("USAGE:");
    println!("    thingspeak-uplink <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    selftest    Post one synthetic record to check the key and endpoint");
    println!("    replay      Stream JSON-lines archive records through the upload worker");
    println!("    fields      Print the resolved channel field layout");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    thingspeak-uplink selftest --api-key KEY --unit-system US");
    println!("    thingspeak-uplink replay archive.jsonl --post-interval 300");
    println!("    thingspeak-uplink fields --unit-system METRICWX --units-label");
    println!();
    println!("Configuration is read from ~/.config/thingspeak-uplink/config.toml,");
    println!("then THINGSPEAK_API_KEY, THINGSPEAK_SERVER_URL and THINGSPEAK_UNIT_SYSTEM.");
    println!();
    println!("For detailed help on any command, use:");
    println!("    thingspeak-uplink <COMMAND> --help");
}
