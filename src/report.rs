//! Plain-text reports assembled from analysis results.
//!
//! Every report is a borrowed view implementing [`fmt::Display`]; the
//! pipeline renders it with `to_string()` and writes the file.

use std::fmt;

use crate::analysis::c_rate::CRateStats;
use crate::analysis::day_night::{DailyRequirement, DayBoundaries};
use crate::analysis::sizing::{
    BoundarySizing, CapacityStats, DailyDemandStats, ReferenceDayCheck, SeasonalRecommendation,
};
use crate::analysis::solar_window::WindowSummary;
use crate::series::{DailyEnergy, EnergyTotals, MonthlyEnergy, SeasonMap, SeasonTotals};
use crate::sim::grid::{GridKpis, fmt_percent};
use crate::sim::stats::TrajectoryStats;

const RULE: usize = 50;

fn title(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "{text}")?;
    writeln!(f, "{}", "=".repeat(RULE))?;
    writeln!(f)
}

fn section(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{text}:")?;
    writeln!(f, "{}", "-".repeat(20))
}

fn kwh(wh: f64) -> f64 {
    wh / 1000.0
}

fn write_totals(f: &mut fmt::Formatter<'_>, totals: &EnergyTotals) -> fmt::Result {
    writeln!(f, "Total energy produced:  {:.2} kWh", kwh(totals.production_wh))?;
    writeln!(f, "Total energy demanded:  {:.2} kWh", kwh(totals.demand_wh))?;
    writeln!(f, "Total difference:       {:.2} kWh", kwh(totals.difference_wh()))
}

/// Whole-series energy overview.
pub struct EnergyReport<'a> {
    pub totals: EnergyTotals,
    pub monthly: &'a [MonthlyEnergy],
    pub demand: Option<DailyDemandStats>,
    /// Highest-demand days, largest first.
    pub top_demand_days: &'a [DailyEnergy],
    pub incomplete_days: usize,
}

impl fmt::Display for EnergyReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Energy Analysis")?;
        write_totals(f, &self.totals)?;
        if self.incomplete_days > 0 {
            writeln!(f, "Incomplete days:        {}", self.incomplete_days)?;
        }

        if let Some(demand) = &self.demand {
            section(f, "Daily Statistics")?;
            writeln!(f, "{demand}")?;
        }

        section(f, "Monthly Totals")?;
        for m in self.monthly {
            writeln!(
                f,
                "{}-{:02}: production {:>12.2} kWh, demand {:>12.2} kWh, difference {:>12.2} kWh",
                m.year,
                m.month,
                kwh(m.totals.production_wh),
                kwh(m.totals.demand_wh),
                kwh(m.totals.difference_wh())
            )?;
        }

        section(f, "Highest Demand Days")?;
        for d in self.top_demand_days {
            writeln!(
                f,
                "{}: demand {:.2} kWh, production {:.2} kWh",
                d.date,
                kwh(d.totals.demand_wh),
                kwh(d.totals.production_wh)
            )?;
        }
        Ok(())
    }
}

/// Seasonal totals and seasonal storage recommendation.
pub struct SeasonalReport<'a> {
    pub totals: EnergyTotals,
    pub seasons: &'a [SeasonTotals],
    pub season_map: &'a SeasonMap,
    pub recommendation: SeasonalRecommendation,
}

impl fmt::Display for SeasonalReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Seasonal Storage Analysis")?;
        write_totals(f, &self.totals)?;
        section(f, "Seasonal Statistics")?;
        for s in self.seasons {
            let months: Vec<String> = self
                .season_map
                .months_of(s.season)
                .iter()
                .map(u32::to_string)
                .collect();
            writeln!(f, "{} (months {}):", s.season, months.join(", "))?;
            writeln!(f, "  Production: {:.2} kWh", kwh(s.totals.production_wh))?;
            writeln!(f, "  Demand:     {:.2} kWh", kwh(s.totals.demand_wh))?;
            writeln!(f, "  Difference: {:.2} kWh", kwh(s.totals.difference_wh()))?;
        }
        section(f, "Recommended Seasonal Storage")?;
        writeln!(f, "{}", self.recommendation)
    }
}

/// Production windows and the boundaries they suggest.
pub struct SolarWindowReport<'a> {
    pub summary: &'a WindowSummary,
    pub fraction: f64,
    pub recommended: Option<DayBoundaries>,
}

impl fmt::Display for SolarWindowReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Solar Production Windows")?;
        writeln!(
            f,
            "Producing threshold: {:.0}% of each day's peak",
            self.fraction * 100.0
        )?;
        writeln!(f, "{}", self.summary)?;
        section(f, "Recommended Day Boundaries")?;
        match self.recommended {
            Some(b) => writeln!(f, "{b}"),
            None => writeln!(f, "undefined (mean window does not form a valid day)"),
        }
    }
}

/// Daily-cycling battery sizing.
pub struct SizingReport<'a> {
    pub boundaries: DayBoundaries,
    pub stats: CapacityStats,
    pub incomplete_days: usize,
    pub summer: Option<&'a DailyRequirement>,
    pub winter: Option<&'a DailyRequirement>,
    pub top_days: &'a [DailyRequirement],
    pub comparison: &'a [BoundarySizing],
    pub demand: Option<DailyDemandStats>,
    /// Reference days simulated at the recommended capacity.
    pub checks: &'a [ReferenceDayCheck],
}

fn write_requirement(f: &mut fmt::Formatter<'_>, r: &DailyRequirement) -> fmt::Result {
    writeln!(
        f,
        "{}: {:.2} kWh (day excess {:.2} kWh, night deficit {:.2} kWh)",
        r.date,
        kwh(r.required_wh),
        kwh(r.day_excess_wh),
        kwh(r.night_deficit_wh)
    )
}

impl fmt::Display for SizingReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Battery Sizing Analysis")?;
        writeln!(f, "Day period: {}", self.boundaries)?;
        writeln!(
            f,
            "Required capacity per day = min(day excess, night deficit)."
        )?;
        if self.incomplete_days > 0 {
            writeln!(
                f,
                "{} incomplete day(s) excluded from the statistics.",
                self.incomplete_days
            )?;
        }

        section(f, "Results")?;
        writeln!(f, "{}", self.stats)?;

        if let Some(demand) = &self.demand {
            section(f, "Daily Totals")?;
            writeln!(f, "{demand}")?;
        }

        section(f, "Reference Days")?;
        for (name, day) in [("Summer", self.summer), ("Winter", self.winter)] {
            match day {
                Some(r) => {
                    write!(f, "{name} (nearest {}): ", r.date)?;
                    write_requirement(f, r)?;
                }
                None => writeln!(f, "{name}: no data")?,
            }
        }

        section(f, "Empty by Morning")?;
        if self.checks.is_empty() {
            writeln!(f, "not simulated")?;
        } else {
            writeln!(
                f,
                "Capacity {:.2} kWh, state read at {:02}:00.",
                kwh(self.stats.percentile_wh),
                self.boundaries.morning_start()
            )?;
            for c in self.checks {
                writeln!(f, "{c}")?;
            }
        }

        if !self.comparison.is_empty() {
            section(f, "Boundary Comparison")?;
            for c in self.comparison {
                writeln!(
                    f,
                    "{:<12} {}  mean {:>10.2} kWh  P{} {:>10.2} kWh  max {:>10.2} kWh",
                    c.label,
                    c.boundaries,
                    kwh(c.stats.mean_wh),
                    c.stats.percentile,
                    kwh(c.stats.percentile_wh),
                    kwh(c.stats.max_wh)
                )?;
            }
        }

        section(f, "Highest Requirement Days")?;
        for r in self.top_days {
            write_requirement(f, r)?;
        }

        section(f, "Recommendation")?;
        writeln!(
            f,
            "A capacity of {:.2} kWh covers {}% of days; {:.2} kWh covers every day.",
            kwh(self.stats.percentile_wh),
            self.stats.percentile,
            kwh(self.stats.max_wh)
        )
    }
}

/// One or more simulated trajectories.
pub struct SimulationReport<'a> {
    pub runs: &'a [(String, TrajectoryStats)],
    pub failures: &'a [(String, String)],
}

impl fmt::Display for SimulationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Battery Simulation")?;
        for (label, stats) in self.runs {
            section(f, label)?;
            writeln!(f, "{stats}")?;
        }
        for (label, error) in self.failures {
            section(f, label)?;
            writeln!(f, "failed: {error}")?;
        }
        Ok(())
    }
}

/// Grid KPIs side by side.
pub struct LoadDurationReport<'a> {
    pub totals: EnergyTotals,
    pub kpis: &'a [GridKpis],
}

impl fmt::Display for LoadDurationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Load Duration Analysis")?;
        writeln!(f, "Total production: {:.2} MWh", self.totals.production_wh / 1e6)?;
        writeln!(f, "Total demand:     {:.2} MWh", self.totals.demand_wh / 1e6)?;
        writeln!(f)?;

        let width = 32 + 21 * self.kpis.len();
        writeln!(f, "{}", "-".repeat(width))?;
        write!(f, "{:<30}", "Metric")?;
        for k in self.kpis {
            write!(f, " | {:^18}", k.label)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(width))?;

        let rows: [(&str, fn(&GridKpis) -> String); 7] = [
            ("Peak import (kW)", |k| format!("{:.1}", k.peak_import_w / 1000.0)),
            ("Peak export (kW)", |k| format!("{:.1}", k.peak_export_w / 1000.0)),
            ("Annual grid import (MWh)", |k| format!("{:.1}", k.import_wh / 1e6)),
            ("Annual grid export (MWh)", |k| format!("{:.1}", k.export_wh / 1e6)),
            ("Grid dependency (hours)", |k| format!("{:.1}", k.grid_dependency_hours)),
            ("Self-sufficiency (%)", |k| fmt_percent(k.self_sufficiency_percent)),
            ("Self-consumption (%)", |k| fmt_percent(k.self_consumption_percent)),
        ];
        for (name, value) in rows {
            write!(f, "{name:<30}")?;
            for k in self.kpis {
                write!(f, " | {:>18}", value(k))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{}", "-".repeat(width))
    }
}

/// C-rate requirements per battery.
pub struct CRateReport<'a> {
    pub stats: &'a [CRateStats],
}

impl fmt::Display for CRateReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        title(f, "Battery C-Rate Analysis")?;
        for s in self.stats {
            writeln!(f, "{s}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}
