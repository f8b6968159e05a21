//! Store configuration.
//!
//! [`StoreOptions`] controls declared capacities applied at decode time, the
//! growth limits of each axis, and the style names the encoders attach to
//! cells, columns and rows. Options can be built in code or loaded from YAML:
//!
//! ```
//! use sheet_runs::config::StoreOptions;
//!
//! # fn main() -> sheet_runs::Result<()> {
//! let options = StoreOptions::from_yaml_str("max_columns: 1024\nalternate_cell_style: ce9\n")?;
//! assert_eq!(options.max_columns, 1024);
//! assert_eq!(options.alternate_cell_style, "ce9");
//! assert_eq!(options.max_rows, 1_048_576);
//! # Ok(())
//! # }
//! ```

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column limit of current spreadsheet applications.
pub const DEFAULT_MAX_COLUMNS: u32 = 16_384;

/// Row limit of current spreadsheet applications.
pub const DEFAULT_MAX_ROWS: u32 = 1_048_576;

/// Options shared by the positional decoders and the attribute stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Declared column capacity; the decoded capacity is never below the sum
    /// of the column runs.
    pub column_capacity: Option<u32>,
    /// Declared row capacity, with the same rule as `column_capacity`.
    pub row_capacity: Option<u32>,
    /// Growing the column axis past this count is rejected.
    pub max_columns: u32,
    /// Growing the row axis past this count is rejected.
    pub max_rows: u32,
    /// Style name written for cells whose alternate-style flag is set.
    pub alternate_cell_style: String,
    /// Style name written for every other non-empty cell.
    pub default_cell_style: Option<String>,
    /// Style name written on hidden column runs.
    pub hidden_column_style: Option<String>,
    /// Style name written on hidden row runs.
    pub hidden_row_style: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            column_capacity: None,
            row_capacity: None,
            max_columns: DEFAULT_MAX_COLUMNS,
            max_rows: DEFAULT_MAX_ROWS,
            alternate_cell_style: "ce2".to_string(),
            default_cell_style: None,
            hidden_column_style: None,
            hidden_row_style: None,
        }
    }
}

impl StoreOptions {
    /// Load options from a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let options: Self = serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse store options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize the options back to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize store options: {}", e)))
    }

    /// Check that the limits can hold the declared capacities.
    pub fn validate(&self) -> Result<()> {
        if self.max_columns == 0 || self.max_rows == 0 {
            return Err(Error::Config("Axis limits must be at least 1".to_string()));
        }
        if let Some(columns) = self.column_capacity
            && columns > self.max_columns
        {
            return Err(Error::Config(format!(
                "Column capacity {} exceeds max_columns {}",
                columns, self.max_columns
            )));
        }
        if let Some(rows) = self.row_capacity
            && rows > self.max_rows
        {
            return Err(Error::Config(format!(
                "Row capacity {} exceeds max_rows {}",
                rows, self.max_rows
            )));
        }
        Ok(())
    }

    /// Builder-style setter for the declared column capacity.
    pub fn with_column_capacity(mut self, capacity: u32) -> Self {
        self.column_capacity = Some(capacity);
        self
    }

    /// Builder-style setter for the declared row capacity.
    pub fn with_row_capacity(mut self, capacity: u32) -> Self {
        self.row_capacity = Some(capacity);
        self
    }
}
