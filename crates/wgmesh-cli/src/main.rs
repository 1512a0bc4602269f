//! wgmesh CLI binary entrypoint.
//!
//! This is the main entry point for the `wgmesh` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wgmesh_cli::cli::{Cli, Commands};
use wgmesh_cli::commands::{GenerateCommand, KeygenCommand, PubkeyCommand, ShowCommand};
use wgmesh_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), wgmesh_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Generate(args) => {
            let cmd = GenerateCommand::new(args.defaults.load()?);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Show(args) => {
            let cmd = ShowCommand::new(args.defaults.load()?);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Keygen => {
            let cmd = KeygenCommand::new();
            cmd.execute(&mut stdout, &format)?;
        }
        Commands::Pubkey(args) => {
            let cmd = PubkeyCommand::new();
            cmd.execute(&mut stdout, &format, &args)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgmesh_cli::cli::Format;

    #[test]
    fn cli_parses_keygen() {
        let cli = Cli::parse_from(["wgmesh", "keygen"]);
        assert!(matches!(cli.command, Commands::Keygen));
        assert_eq!(cli.format, Format::Text);
    }

    #[test]
    fn cli_parses_generate_with_defaults_flags() {
        let cli = Cli::parse_from([
            "wgmesh",
            "generate",
            "mesh.json",
            "-o",
            "out",
            "--address",
            "10.2.1.0/16",
            "--listen-port",
            "51820",
            "--dns",
            "1.1.1.1,8.8.8.8",
            "--keepalive",
            "25",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.topology.to_str(), Some("mesh.json"));
                assert_eq!(args.output.to_str(), Some("out"));
                assert_eq!(args.defaults.address.as_deref(), Some("10.2.1.0/16"));
                assert_eq!(args.defaults.listen_port, Some(51820));
                assert_eq!(args.defaults.dns, ["1.1.1.1", "8.8.8.8"]);
                assert_eq!(args.defaults.keepalive, Some(25));
                assert!(args.resolved.is_none());
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn cli_generate_output_defaults_to_current_dir() {
        let cli = Cli::parse_from(["wgmesh", "generate", "mesh.json"]);
        match cli.command {
            Commands::Generate(args) => assert_eq!(args.output.to_str(), Some(".")),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn cli_parses_show() {
        let cli = Cli::parse_from(["wgmesh", "show", "mesh.json", "edge-1"]);
        match cli.command {
            Commands::Show(args) => assert_eq!(args.hostname, "edge-1"),
            other => panic!("expected show, got {other:?}"),
        }
    }

    #[test]
    fn cli_respects_format_flag_after_subcommand() {
        let cli = Cli::parse_from(["wgmesh", "keygen", "--format", "json"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn run_pubkey_with_bad_key_fails() {
        let cli = Cli::parse_from(["wgmesh", "pubkey", "garbage"]);
        assert!(run(cli).is_err());
    }
}
