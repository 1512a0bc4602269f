//! Generate command implementation.
//!
//! Compiles a topology file and writes one `<hostname>.conf` per host into
//! the output directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;
use wgmesh_core::{MeshCompiler, NetDefaults, NetworkTopology};

use crate::cli::GenerateArgs;
use crate::error::CliError;
use crate::output::{GenerateSummary, OutputFormat, WrittenConfig};

/// Returns the file name for a host's configuration, refusing hostnames
/// that would escape the output directory.
fn config_file_name(hostname: &str) -> Result<String, CliError> {
    if hostname == "." || hostname == ".." || hostname.contains(['/', '\\']) {
        return Err(CliError::InvalidArgument(format!(
            "hostname '{hostname}' cannot be used as a file name"
        )));
    }
    Ok(format!("{hostname}.conf"))
}

/// Generate command executor.
pub struct GenerateCommand {
    defaults: NetDefaults,
}

impl GenerateCommand {
    /// Create a new generate command with the given network defaults.
    #[must_use]
    pub const fn new(defaults: NetDefaults) -> Self {
        Self { defaults }
    }

    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be compiled or a file cannot
    /// be written.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat, args: &GenerateArgs) -> Result<(), CliError> {
        let summary = self.generate(args)?;
        format.write(writer, &summary)
    }

    /// Compile the topology and write every configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be compiled or a file cannot
    /// be written.
    pub fn generate(&self, args: &GenerateArgs) -> Result<GenerateSummary, CliError> {
        let topology = NetworkTopology::from_file(&args.topology)?;
        let compiler = MeshCompiler::new(&topology, &self.defaults)?;
        let configs = compiler.compile_all();

        let names = configs
            .iter()
            .map(|(hostname, _)| config_file_name(hostname))
            .collect::<Result<Vec<_>, _>>()?;

        fs::create_dir_all(&args.output)?;
        let mut files = Vec::with_capacity(configs.len());
        for ((hostname, config), name) in configs.into_iter().zip(names) {
            let path = args.output.join(name);
            fs::write(&path, config.to_ini_string())?;
            info!(hostname = %hostname, path = %path.display(), "wrote configuration");
            files.push(WrittenConfig { hostname, path });
        }

        if let Some(path) = &args.resolved {
            write_resolved(path, compiler.resolved_topology())?;
        }

        Ok(GenerateSummary {
            network: compiler.resolved_topology().name.clone(),
            subnet: compiler.subnet().to_string(),
            files,
            rekeyed: compiler.rekeyed_hosts().into_iter().map(String::from).collect(),
            resolved: args.resolved.clone(),
        })
    }
}

fn write_resolved(path: &Path, topology: &NetworkTopology) -> Result<(), CliError> {
    let mut json = serde_json::to_string_pretty(topology)
        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    fs::write(path, json)?;
    info!(path = %path.display(), "wrote resolved topology");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DefaultsArgs;

    const TOPOLOGY: &str = r#"{
        "name": "lab",
        "address": "10.30.0.0/24",
        "groups": [
            { "name": "dc", "visibility": "CLOUD", "hosts": [
                { "server": { "hostname": "db", "public_address": "203.0.113.5", "private_address": "172.16.0.5" } },
                { "server": { "hostname": "web", "public_address": "203.0.113.6", "private_address": "172.16.0.6" } }
            ] }
        ]
    }"#;

    fn args(dir: &Path) -> GenerateArgs {
        let topology = dir.join("mesh.json");
        fs::write(&topology, TOPOLOGY).expect("write topology");
        GenerateArgs {
            topology,
            output: dir.join("out"),
            resolved: None,
            defaults: DefaultsArgs::default(),
        }
    }

    #[test]
    fn writes_one_file_per_host() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = args(dir.path());
        let summary = GenerateCommand::new(NetDefaults::default())
            .generate(&args)
            .expect("generates");

        assert_eq!(summary.network, "lab");
        assert_eq!(summary.subnet, "10.30.0.0/24");
        assert_eq!(summary.rekeyed, ["db", "web"]);
        let db = fs::read_to_string(dir.path().join("out/db.conf")).expect("db.conf");
        assert!(db.starts_with("[Interface]\n# Name = db\nAddress = 10.30.0.1\n"));
        assert!(dir.path().join("out/web.conf").exists());
    }

    #[test]
    fn resolved_topology_makes_keys_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut args = args(dir.path());
        args.resolved = Some(dir.path().join("resolved.json"));
        let command = GenerateCommand::new(NetDefaults::default());
        command.generate(&args).expect("first run");
        let first = fs::read_to_string(dir.path().join("out/db.conf")).expect("db.conf");

        args.topology = dir.path().join("resolved.json");
        args.resolved = None;
        let summary = command.generate(&args).expect("second run");
        let second = fs::read_to_string(dir.path().join("out/db.conf")).expect("db.conf");

        assert!(summary.rekeyed.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn path_like_hostnames_are_refused() {
        assert!(config_file_name("edge-1").is_ok());
        assert!(matches!(config_file_name("../etc/passwd"), Err(CliError::InvalidArgument(_))));
        assert!(config_file_name("..").is_err());
        assert!(config_file_name("a\\b").is_err());
    }

    #[test]
    fn missing_topology_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut args = args(dir.path());
        args.topology = dir.path().join("absent.json");
        let err = GenerateCommand::new(NetDefaults::default())
            .generate(&args)
            .expect_err("missing file");
        assert!(matches!(err, CliError::Mesh(_)));
    }
}
