//! Board and netlist documents: JSON in the serde form of the core model.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use boardcheck_core::{Board, Netlist};

use crate::error::IoError;

/// Parse a board and check its internal references.
pub fn read_board<R: Read>(reader: R) -> Result<Board, IoError> {
    let board: Board = serde_json::from_reader(reader)?;
    board.validate()?;
    Ok(board)
}

pub fn load_board(path: impl AsRef<Path>) -> Result<Board, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let board = read_board(BufReader::new(file))?;
    log::info!(
        "Loaded board '{}' from {}: {} tracks, {} vias, {} footprints, {} zones",
        board.name,
        path.display(),
        board.tracks.len(),
        board.vias.len(),
        board.footprints.len(),
        board.zones.len()
    );
    Ok(board)
}

pub fn write_board<W: Write>(writer: W, board: &Board) -> Result<(), IoError> {
    serde_json::to_writer_pretty(writer, board)?;
    Ok(())
}

pub fn save_board(path: impl AsRef<Path>, board: &Board) -> Result<(), IoError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::open(path, e))?;
    let mut writer = BufWriter::new(file);
    write_board(&mut writer, board)?;
    writer.flush()?;
    Ok(())
}

pub fn read_netlist<R: Read>(reader: R) -> Result<Netlist, IoError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_netlist(path: impl AsRef<Path>) -> Result<Netlist, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let netlist = read_netlist(BufReader::new(file))?;
    log::info!(
        "Loaded netlist from {}: {} components",
        path.display(),
        netlist.components.len()
    );
    Ok(netlist)
}

pub fn save_netlist(path: impl AsRef<Path>, netlist: &Netlist) -> Result<(), IoError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::open(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, netlist)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcheck_core::layer::F_CU;
    use boardcheck_core::{mm, Footprint, NetlistComponent, Pad, Point, Size, Track};

    fn sample() -> Board {
        let mut board = Board::new("sample");
        let gnd = board.add_net("GND");
        board.add_track(Track::new(Point::new(0, 0), Point::new(mm(2.0), 0), mm(0.25), F_CU, gnd));
        board.add_footprint(
            Footprint::new("R1", "10k", Point::new(0, 0))
                .with_pad(Pad::smd("1", Point::new(0, 0), Size::new(mm(1.0), mm(1.0)), F_CU, gnd)),
        );
        board.text_vars.insert("REVISION".to_string(), "A".to_string());
        board
    }

    #[test]
    fn test_board_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let board = sample();
        save_board(&path, &board).unwrap();
        let loaded = load_board(&path).unwrap();
        assert_eq!(loaded, board);
    }

    #[test]
    fn test_minimal_board_document() {
        let json = r#"{
            "name": "minimal",
            "nets": [{"code": 0, "name": ""}, {"code": 1, "name": "VCC"}],
            "tracks": [{"start": {"x": 0, "y": 0}, "end": {"x": 1000, "y": 0},
                        "width": 250000, "layer": 0, "net": 1}]
        }"#;
        let board = read_board(json.as_bytes()).unwrap();
        assert_eq!(board.tracks.len(), 1);
        assert_eq!(board.net_name(1), Some("VCC"));
        assert!(board.layers.is_enabled(F_CU));
    }

    #[test]
    fn test_unknown_net_is_rejected() {
        let json = r#"{"tracks": [{"start": {"x": 0, "y": 0}, "end": {"x": 1, "y": 0},
                                   "width": 1, "layer": 0, "net": 7}]}"#;
        let err = read_board(json.as_bytes()).unwrap_err();
        assert!(matches!(err, IoError::Board(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_board(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, IoError::Open { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_netlist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netlist.json");
        let netlist = Netlist::new().with_component(NetlistComponent::new("R1", "10k").with_pin("1", "GND"));
        save_netlist(&path, &netlist).unwrap();
        assert_eq!(load_netlist(&path).unwrap(), netlist);
    }
}
