//! Month-to-season mapping.

use std::fmt;

use serde::Deserialize;

use crate::error::{Result, SimError};

/// Meteorological season label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        };
        f.write_str(name)
    }
}

/// Total assignment of calendar months (1-12) to seasons.
///
/// A season may wrap around the turn of the year (December with
/// January/February); aggregation merges the wrapped segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonMap {
    by_month: [Season; 12],
}

impl SeasonMap {
    /// Builds a map from per-season month lists.
    ///
    /// Every month 1-12 must appear exactly once across the four lists.
    pub fn from_lists(
        winter: &[u32],
        spring: &[u32],
        summer: &[u32],
        autumn: &[u32],
    ) -> Result<Self> {
        let mut slots: [Option<Season>; 12] = [None; 12];
        let lists = [
            (Season::Winter, winter),
            (Season::Spring, spring),
            (Season::Summer, summer),
            (Season::Autumn, autumn),
        ];
        for (season, months) in lists {
            for &month in months {
                if !(1..=12).contains(&month) {
                    return Err(SimError::invalid(
                        "seasons",
                        format!("month {month} is outside 1-12"),
                    ));
                }
                let slot = &mut slots[(month - 1) as usize];
                if let Some(existing) = slot {
                    return Err(SimError::invalid(
                        "seasons",
                        format!("month {month} assigned to both {existing} and {season}"),
                    ));
                }
                *slot = Some(season);
            }
        }

        let mut by_month = [Season::Winter; 12];
        for (i, slot) in slots.iter().enumerate() {
            by_month[i] = slot.ok_or_else(|| {
                SimError::invalid("seasons", format!("month {} has no season", i + 1))
            })?;
        }
        Ok(Self { by_month })
    }

    /// Season of a calendar month. Out-of-range months are clamped to 1-12,
    /// so 0 maps to January and 13 to December.
    pub fn season_of(&self, month: u32) -> Season {
        let idx = month.clamp(1, 12) - 1;
        self.by_month[idx as usize]
    }

    /// Months assigned to `season`, ascending.
    pub fn months_of(&self, season: Season) -> Vec<u32> {
        (1..=12).filter(|m| self.season_of(*m) == season).collect()
    }
}

impl Default for SeasonMap {
    /// December-February winter, then three-month blocks.
    fn default() -> Self {
        use Season::{Autumn, Spring, Summer, Winter};
        Self {
            by_month: [
                Winter, Winter, Spring, Spring, Spring, Summer, Summer, Summer, Autumn, Autumn,
                Autumn, Winter,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_wraps_winter_over_new_year() {
        let map = SeasonMap::default();
        assert_eq!(map.season_of(12), Season::Winter);
        assert_eq!(map.season_of(1), Season::Winter);
        assert_eq!(map.season_of(6), Season::Summer);
        assert_eq!(map.months_of(Season::Winter), vec![1, 2, 12]);
    }

    #[test]
    fn out_of_range_months_clamp_to_nearest_end() {
        let map = SeasonMap::from_lists(&[1, 2, 3], &[4, 5, 6], &[7, 8, 9], &[10, 11, 12])
            .expect("valid map");
        assert_eq!(map.season_of(0), Season::Winter);
        assert_eq!(map.season_of(13), Season::Autumn);
    }

    #[test]
    fn from_lists_matches_default() {
        let map = SeasonMap::from_lists(&[12, 1, 2], &[3, 4, 5], &[6, 7, 8], &[9, 10, 11])
            .expect("valid map");
        assert_eq!(map, SeasonMap::default());
    }

    #[test]
    fn duplicate_month_is_rejected() {
        let err = SeasonMap::from_lists(&[12, 1, 2, 3], &[3, 4, 5], &[6, 7, 8], &[9, 10, 11]);
        assert!(err.is_err());
    }

    #[test]
    fn missing_month_is_rejected() {
        let err = SeasonMap::from_lists(&[1, 2], &[3, 4, 5], &[6, 7, 8], &[9, 10, 11]);
        assert!(err.is_err());
    }
}
