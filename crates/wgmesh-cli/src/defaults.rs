//! Network defaults assembly.
//!
//! The defaults file (if any) is loaded first; each flag that was given then
//! replaces the matching field.

use tracing::debug;
use wgmesh_core::NetDefaults;

use crate::cli::DefaultsArgs;
use crate::error::CliError;

impl DefaultsArgs {
    /// Builds the effective defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults file cannot be read or parsed.
    pub fn load(&self) -> Result<NetDefaults, CliError> {
        let mut defaults = match &self.defaults {
            Some(path) => {
                debug!(path = %path.display(), "loading network defaults");
                NetDefaults::from_file(path).map_err(|e| {
                    CliError::Config(format!("cannot load defaults from {}: {e}", path.display()))
                })?
            }
            None => NetDefaults::default(),
        };
        self.apply_overrides(&mut defaults);
        Ok(defaults)
    }

    fn apply_overrides(&self, defaults: &mut NetDefaults) {
        if let Some(address) = &self.address {
            defaults.address = Some(address.clone());
        }
        if let Some(netmask) = &self.netmask {
            defaults.netmask = Some(netmask.clone());
        }
        if self.listen_port.is_some() {
            defaults.listen_port = self.listen_port;
        }
        if !self.dns.is_empty() {
            defaults.dns.clone_from(&self.dns);
        }
        if self.mtu.is_some() {
            defaults.mtu = self.mtu;
        }
        if let Some(table) = &self.table {
            defaults.table = Some(table.clone());
        }
        if self.keepalive.is_some() {
            defaults.persistent_keepalive = self.keepalive;
        }
    }
}
