//! Season Selector Module
//! Partitions the time axis into boreal winter and summer subsets.

use std::fmt;

/// Three-month season used for ITCZ detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// December, January, February
    Djf,
    /// June, July, August
    Jja,
}

impl Season {
    pub const ALL: [Season; 2] = [Season::Djf, Season::Jja];

    pub fn months(self) -> [u32; 3] {
        match self {
            Season::Djf => [12, 1, 2],
            Season::Jja => [6, 7, 8],
        }
    }

    pub fn contains(self, month: u32) -> bool {
        self.months().contains(&month)
    }

    /// Short label, e.g. `"DJF"`.
    pub fn label(self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Jja => "JJA",
        }
    }

    /// Label used in map titles.
    pub fn long_label(self) -> &'static str {
        match self {
            Season::Djf => "DJF (Winter)",
            Season::Jja => "JJA (Summer)",
        }
    }

    /// Indices of the timesteps falling in this season.
    pub fn select(self, months: &[u32]) -> Vec<usize> {
        months
            .iter()
            .enumerate()
            .filter(|(_, m)| self.contains(**m))
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Timestep indices of both seasons. Months in neither season are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonPartition {
    pub djf: Vec<usize>,
    pub jja: Vec<usize>,
}

impl SeasonPartition {
    pub fn from_months(months: &[u32]) -> Self {
        Self {
            djf: Season::Djf.select(months),
            jja: Season::Jja.select(months),
        }
    }

    pub fn get(&self, season: Season) -> &[usize] {
        match season {
            Season::Djf => &self.djf,
            Season::Jja => &self.jja,
        }
    }
}
