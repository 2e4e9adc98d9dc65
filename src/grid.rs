//! Grid geometry for the camera wall
//!
//! Maps a split mode to its column count and slot capacity. The grid is
//! always square: capacity = columns².

use serde::{Deserialize, Serialize};

/// Camera-wall grid size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitMode {
    Single,
    Four,
    Nine,
    Sixteen,
}

impl SplitMode {
    /// Every variant, for exhaustiveness assertions in tests
    pub const ALL: [SplitMode; 4] = [
        SplitMode::Single,
        SplitMode::Four,
        SplitMode::Nine,
        SplitMode::Sixteen,
    ];

    /// Columns per row
    pub fn columns(self) -> usize {
        match self {
            SplitMode::Single => 1,
            SplitMode::Four => 2,
            SplitMode::Nine => 3,
            SplitMode::Sixteen => 4,
        }
    }

    /// Total slot count
    pub fn capacity(self) -> usize {
        self.columns() * self.columns()
    }
}

impl Default for SplitMode {
    fn default() -> Self {
        Self::Four
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_columns_squared_for_every_mode() {
        for mode in SplitMode::ALL {
            assert_eq!(mode.capacity(), mode.columns() * mode.columns());
        }
    }

    #[test]
    fn capacities_match_mode_names() {
        let capacities: Vec<usize> = SplitMode::ALL.iter().map(|m| m.capacity()).collect();
        assert_eq!(capacities, vec![1, 4, 9, 16]);
    }

    #[test]
    fn wire_names_are_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(SplitMode::Sixteen).unwrap(),
            serde_json::json!("SIXTEEN")
        );
        assert_eq!(
            serde_json::from_value::<SplitMode>(serde_json::json!("NINE")).unwrap(),
            SplitMode::Nine
        );
    }

    #[test]
    fn default_is_four() {
        assert_eq!(SplitMode::default(), SplitMode::Four);
    }
}
