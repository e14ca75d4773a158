//! DRC report writers.
//!
//! The text form is line oriented: a header, then the violations in pass
//! order grouped into a general section, an unconnected-items section and a
//! footprint-versus-netlist section. Each record names its code and title,
//! its severity, and one `@(x mm, y mm)` line per implicated item.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use boardcheck_core::{to_mm, Board, Point};
use boardcheck_drc::{DrcCategory, DrcReport, DrcViolation, RunState, Subject};

use crate::config::ReportFormat;
use crate::error::IoError;

pub struct ReportWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write(&mut self, report: &DrcReport, board: &Board, format: ReportFormat) -> Result<(), IoError> {
        match format {
            ReportFormat::Text => self.write_text(report, board),
            ReportFormat::Json => self.write_json(report),
        }
    }

    pub fn write_json(&mut self, report: &DrcReport) -> Result<(), IoError> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        Ok(())
    }

    /// Item descriptions and positions are looked up in `board`, which must
    /// be the board the report was produced from.
    pub fn write_text(&mut self, report: &DrcReport, board: &Board) -> Result<(), IoError> {
        writeln!(self.writer, "** Drc report for {} **", display_name(report))?;
        writeln!(self.writer, "** Board {} **", report.board_id)?;
        if report.status == RunState::Cancelled {
            writeln!(self.writer, "** Check cancelled: report is incomplete **")?;
        }
        writeln!(self.writer)?;

        let (unconnected, rest): (Vec<_>, Vec<_>) = report
            .violations
            .iter()
            .partition(|v| v.code.category() == DrcCategory::Unconnected);
        let (footprints, general): (Vec<_>, Vec<_>) = rest
            .into_iter()
            .partition(|v| v.code.category() == DrcCategory::Footprints);

        writeln!(self.writer, "** Found {} DRC violations **", general.len())?;
        for violation in &general {
            self.write_violation(violation, board)?;
        }
        writeln!(self.writer)?;

        writeln!(self.writer, "** Found {} unconnected pads **", unconnected.len())?;
        for violation in &unconnected {
            self.write_violation(violation, board)?;
        }
        writeln!(self.writer)?;

        if report.categories_skipped.contains(&DrcCategory::Footprints) && footprints.is_empty() {
            writeln!(self.writer, "** Footprints not checked against a netlist **")?;
        } else {
            writeln!(self.writer, "** Found {} Footprint errors **", footprints.len())?;
            for violation in &footprints {
                self.write_violation(violation, board)?;
            }
        }
        writeln!(self.writer)?;

        writeln!(self.writer, "** End of Report **")?;
        Ok(())
    }

    fn write_violation(&mut self, violation: &DrcViolation, board: &Board) -> Result<(), IoError> {
        writeln!(self.writer, "[{}]: {}", violation.code, violation.message)?;
        writeln!(self.writer, "    Severity: {}", violation.severity)?;

        let mut wrote_position = false;
        for subject in &violation.subjects {
            match subject {
                Subject::Item(item) => match board.item(*item) {
                    Some(resolved) => {
                        writeln!(
                            self.writer,
                            "    {}: {}",
                            format_position(resolved.position()),
                            resolved.describe(board)
                        )?;
                        wrote_position = true;
                    }
                    None => writeln!(self.writer, "    {:?}: <not on this board>", item)?,
                },
                Subject::NetClass(name) => writeln!(self.writer, "    NetClass '{}'", name)?,
                Subject::Component(reference) => writeln!(self.writer, "    Component {}", reference)?,
            }
        }
        if !wrote_position {
            writeln!(self.writer, "    {}", format_position(violation.location))?;
        }
        Ok(())
    }
}

fn display_name(report: &DrcReport) -> &str {
    if report.board_name.is_empty() {
        "<unnamed board>"
    } else {
        &report.board_name
    }
}

/// `@(x mm, y mm)` with four decimals.
pub fn format_position(point: Point) -> String {
    format!(
        "@({:.4} mm, {:.4} mm)",
        to_mm(point.x as f64),
        to_mm(point.y as f64)
    )
}

pub fn save_report(
    path: impl AsRef<Path>,
    report: &DrcReport,
    board: &Board,
    format: ReportFormat,
) -> Result<(), IoError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::open(path, e))?;
    let mut writer = ReportWriter::new(BufWriter::new(file));
    writer.write(report, board, format)?;
    writer.into_inner().flush()?;
    log::info!("Wrote {} violations to {}", report.violations.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcheck_core::layer::F_CU;
    use boardcheck_core::{mm, Netlist, Track};
    use boardcheck_drc::{DrcEngine, DrcOptions, NullObserver};

    fn crowded_board() -> Board {
        let mut board = Board::new("crowded");
        let a = board.add_net("A");
        let b = board.add_net("B");
        board.add_track(Track::new(Point::new(0, 0), Point::new(mm(5.0), 0), mm(0.25), F_CU, a));
        board.add_track(Track::new(
            Point::new(0, mm(0.3)),
            Point::new(mm(5.0), mm(0.3)),
            mm(0.25),
            F_CU,
            b,
        ));
        board
    }

    fn text_of(report: &DrcReport, board: &Board) -> String {
        let mut writer = ReportWriter::new(Vec::new());
        writer.write_text(report, board).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(Point::new(mm(1.5), -mm(0.25))), "@(1.5000 mm, -0.2500 mm)");
    }

    #[test]
    fn test_text_report_sections() {
        let board = crowded_board();
        let report = DrcEngine::new(DrcOptions::default()).run(&board, None, &mut NullObserver);
        let text = text_of(&report, &board);

        assert!(text.starts_with("** Drc report for crowded **"));
        assert!(text.contains("** Found 1 DRC violations **"));
        assert!(text.contains("[TRACK_NEAR_TRACK]: "));
        assert!(text.contains("    Severity: error"));
        assert!(text.contains("@(0.0000 mm, 0.0000 mm)"));
        assert!(text.contains("** Found 0 unconnected pads **"));
        assert!(text.contains("** Footprints not checked against a netlist **"));
        assert!(text.trim_end().ends_with("** End of Report **"));
    }

    #[test]
    fn test_footprint_section_with_netlist() {
        let board = Board::new("empty");
        let netlist = Netlist::new().with_component(boardcheck_core::NetlistComponent::new("U1", "MCU"));
        let report = DrcEngine::new(DrcOptions::default()).run(&board, Some(&netlist), &mut NullObserver);
        let text = text_of(&report, &board);

        assert!(text.contains("** Found 1 Footprint errors **"));
        assert!(text.contains("[MISSING_FOOTPRINT]: "));
        assert!(text.contains("    Component U1"));
    }

    #[test]
    fn test_same_input_gives_identical_reports() {
        let json = r#"{
            "name": "repeat",
            "nets": [{"code": 0, "name": ""}, {"code": 1, "name": "A"}, {"code": 2, "name": "B"}],
            "tracks": [
                {"start": {"x": 0, "y": 0}, "end": {"x": 5000000, "y": 0}, "width": 250000, "layer": 0, "net": 1},
                {"start": {"x": 0, "y": 300000}, "end": {"x": 5000000, "y": 300000}, "width": 250000, "layer": 0, "net": 2}
            ]
        }"#;
        let render = |format: ReportFormat| {
            let board = crate::read_board(json.as_bytes()).unwrap();
            let report = DrcEngine::new(DrcOptions::default()).run(&board, None, &mut NullObserver);
            let mut writer = ReportWriter::new(Vec::new());
            writer.write(&report, &board, format).unwrap();
            writer.into_inner()
        };

        let first = render(ReportFormat::Text);
        assert_eq!(first, render(ReportFormat::Text));
        assert!(String::from_utf8(first).unwrap().contains("[TRACK_NEAR_TRACK]"));
        assert_eq!(render(ReportFormat::Json), render(ReportFormat::Json));
    }

    #[test]
    fn test_json_report_file() {
        let board = crowded_board();
        let report = DrcEngine::new(DrcOptions::default()).run(&board, None, &mut NullObserver);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        save_report(&path, &report, &board, ReportFormat::Json).unwrap();

        let parsed: DrcReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
