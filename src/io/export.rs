//! CSV export of daily energy, daily requirements and trajectories.
//!
//! Column layouts are fixed so external plotting scripts can rely on them.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analysis::DailyRequirement;
use crate::error::Result;
use crate::series::{Cadence, DailyEnergy, EnergyInterval};
use crate::sim::Trajectory;

const DAILY_ENERGY_HEADER: &str = "date,production_wh,demand_wh,difference_wh,intervals,complete";

const REQUIREMENT_HEADER: &str =
    "date,day_excess_wh,night_deficit_wh,required_wh,intervals,complete";

const TRAJECTORY_HEADER: &str = "time,net_wh,state_wh,state_percent,export_wh,import_wh";

fn header(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim)
}

fn create(path: &Path) -> io::Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Writes one row per day of production/demand totals.
pub fn write_daily_energy(days: &[DailyEnergy], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(DAILY_ENERGY_HEADER))?;
    for d in days {
        wtr.write_record(&[
            d.date.to_string(),
            format!("{:.4}", d.totals.production_wh),
            format!("{:.4}", d.totals.demand_wh),
            format!("{:.4}", d.totals.difference_wh()),
            d.intervals.to_string(),
            d.complete.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_daily_energy(days: &[DailyEnergy], path: &Path) -> Result<()> {
    write_daily_energy(days, create(path)?)
}

/// Writes one row per day of shiftable day/night energy.
pub fn write_requirements(requirements: &[DailyRequirement], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(REQUIREMENT_HEADER))?;
    for r in requirements {
        wtr.write_record(&[
            r.date.to_string(),
            format!("{:.4}", r.day_excess_wh),
            format!("{:.4}", r.night_deficit_wh),
            format!("{:.4}", r.required_wh),
            r.intervals.to_string(),
            r.complete.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_requirements(requirements: &[DailyRequirement], path: &Path) -> Result<()> {
    write_requirements(requirements, create(path)?)
}

/// Writes a trajectory aligned with the intervals it was simulated from.
///
/// Rows stop at the shorter of the two inputs.
pub fn write_trajectory(
    intervals: &[EnergyInterval],
    trajectory: &Trajectory,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(TRAJECTORY_HEADER))?;
    for (interval, p) in intervals.iter().zip(&trajectory.points) {
        wtr.write_record(&[
            interval.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", p.net_wh),
            format!("{:.4}", p.state_wh),
            format!("{:.4}", p.state_percent),
            format!("{:.4}", p.export_wh),
            format!("{:.4}", p.import_wh),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_trajectory(
    intervals: &[EnergyInterval],
    trajectory: &Trajectory,
    path: &Path,
) -> Result<()> {
    write_trajectory(intervals, trajectory, create(path)?)
}

/// Writes load-duration curves side by side, one column per scenario.
///
/// `hours` is the cumulative duration at each rank. Curves are expected
/// to have equal length; shorter ones leave their cells empty.
pub fn write_duration_curves(
    curves: &[(&str, Vec<f64>)],
    cadence: Cadence,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let mut head = vec!["rank".to_owned(), "hours".to_owned()];
    head.extend(curves.iter().map(|(label, _)| format!("{label}_w")));
    wtr.write_record(&head)?;

    let rows = curves.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
    for rank in 0..rows {
        let mut record = vec![
            rank.to_string(),
            format!("{:.4}", (rank + 1) as f64 * cadence.hours()),
        ];
        record.extend(
            curves
                .iter()
                .map(|(_, c)| c.get(rank).map_or_else(String::new, |v| format!("{v:.4}"))),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_duration_curves(
    curves: &[(&str, Vec<f64>)],
    cadence: Cadence,
    path: &Path,
) -> Result<()> {
    write_duration_curves(curves, cadence, create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::EnergyTotals;
    use crate::sim::simulate;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap_or_default()
    }

    fn to_text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn daily_energy_header_and_rows() {
        let days: Vec<DailyEnergy> = (1..=3)
            .map(|d| DailyEnergy {
                date: date(d),
                totals: EnergyTotals {
                    production_wh: 100.0,
                    demand_wh: 40.0,
                },
                intervals: 96,
                complete: true,
            })
            .collect();
        let mut buf = Vec::new();
        write_daily_energy(&days, &mut buf).ok();
        let text = to_text(buf);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(DAILY_ENERGY_HEADER));
        assert_eq!(
            lines.next(),
            Some("2023-05-01,100.0000,40.0000,60.0000,96,true")
        );
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn requirement_rows_flag_partial_days() {
        let reqs = vec![DailyRequirement {
            date: date(9),
            day_excess_wh: 10.0,
            night_deficit_wh: 4.0,
            required_wh: 4.0,
            intervals: 50,
            complete: false,
        }];
        let mut buf = Vec::new();
        write_requirements(&reqs, &mut buf).ok();
        let text = to_text(buf);
        assert!(text.ends_with("2023-05-09,10.0000,4.0000,4.0000,50,false\n"));
    }

    #[test]
    fn trajectory_rows_align_with_intervals() {
        let intervals: Vec<EnergyInterval> = [100.0, -250.0]
            .iter()
            .enumerate()
            .map(|(h, &net_wh)| EnergyInterval {
                timestamp: date(1).and_hms_opt(h as u32, 0, 0).unwrap_or_default(),
                production_wh: 0.0,
                demand_wh: 0.0,
                net_wh,
            })
            .collect();
        let trajectory = simulate(&[100.0, -250.0], 200.0, 0.0).expect("simulate");
        let mut buf = Vec::new();
        write_trajectory(&intervals, &trajectory, &mut buf).ok();
        let text = to_text(buf);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            "2023-05-01 01:00:00,-250.0000,0.0000,0.0000,0.0000,150.0000"
        );
    }

    #[test]
    fn duration_curves_share_rank_column() {
        let hourly = Cadence::from_minutes(60).expect("cadence");
        let curves = [
            ("no_battery", vec![900.0, 100.0, -400.0]),
            ("daily_battery", vec![500.0, 0.0, 0.0]),
        ];
        let mut buf = Vec::new();
        write_duration_curves(&curves, hourly, &mut buf).expect("write");
        let text = to_text(buf);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "rank,hours,no_battery_w,daily_battery_w");
        assert_eq!(rows[1], "0,1.0000,900.0000,500.0000");
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("daily_requirements.csv");
        export_requirements(&[], &path).expect("export");
        let text = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(text.trim_end(), REQUIREMENT_HEADER);
    }
}
