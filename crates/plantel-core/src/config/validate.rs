//! Configuration validation

use super::{Config, GenealogyConfig, InventoryConfig};
use crate::{Error, Result};

impl Config {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any values are out of range
    pub fn validate(&self) -> Result<()> {
        let ceiling = self.inventory.range_ceiling;
        if ceiling == 0 || ceiling > InventoryConfig::MAX_RANGE_CEILING {
            return Err(Error::invalid_config(format!(
                "inventory.range_ceiling must be 1-{}, got {ceiling}",
                InventoryConfig::MAX_RANGE_CEILING
            )));
        }

        let depth = self.genealogy.default_depth;
        if depth == 0 || depth > GenealogyConfig::MAX_DEPTH {
            return Err(Error::invalid_config(format!(
                "genealogy.default_depth must be 1-{}, got {depth}",
                GenealogyConfig::MAX_DEPTH
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let mut config = Config::default();
        config.inventory.range_ceiling = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_ceiling_bounds() {
        let mut config = Config::default();
        config.inventory.range_ceiling = 100_000;
        assert!(config.validate().is_ok());
        config.inventory.range_ceiling = 100_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_depth_bounds() {
        let mut config = Config::default();
        config.genealogy.default_depth = 6;
        assert!(config.validate().is_ok());
        config.genealogy.default_depth = 7;
        assert!(config.validate().is_err());
        config.genealogy.default_depth = 0;
        assert!(config.validate().is_err());
    }
}
