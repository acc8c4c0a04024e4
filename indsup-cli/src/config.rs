//! Configuration from TOML files and command line options.
use anyhow::Error;

use indsup::{MinimizerConfigUpdate, OracleConfigUpdate};

/// Accumulated configuration updates.
///
/// Options in an `oracle` table configure the oracle, all others the minimizer.
#[derive(Default)]
pub struct ConfigUpdates {
    pub minimizer: MinimizerConfigUpdate,
    pub oracle: OracleConfigUpdate,
}

impl ConfigUpdates {
    /// Merge options given as TOML. Later options override earlier ones.
    pub fn merge_toml(&mut self, source: &str) -> Result<(), Error> {
        let mut table: toml::value::Table = toml::from_str(source)?;

        if let Some(oracle) = table.remove("oracle") {
            self.oracle.merge(oracle.try_into()?);
        }

        self.minimizer.merge(toml::Value::Table(table).try_into()?);

        Ok(())
    }
}
