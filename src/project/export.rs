use serde::{Deserialize, Serialize};

use crate::compiler::{
    codegen::Compilation,
    expander::Expansion,
    layout::{Coord, GridCell, Linkage},
};

/// One occupied cell as the archive exporter reads it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    /// `None` for a turn marker.
    pub command: Option<String>,
    pub linkage: String,
    pub facing: String,
    /// Line of the primitive text, or of the structured source once the
    /// export has been passed through [`GridExport::locate`].
    pub source_line: Option<u32>,
    /// Unit of `source_line` after [`GridExport::locate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_unit: Option<String>,
}

impl CellRecord {
    fn new(at: Coord, cell: &GridCell) -> CellRecord {
        CellRecord {
            row: at.row,
            col: at.col,
            command: cell.command.clone(),
            linkage: match cell.linkage {
                Linkage::Origin => "origin".into(),
                Linkage::Chained => "chained".into(),
            },
            facing: cell.orientation.facing().into(),
            source_line: cell.source_line,
            source_unit: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub name: String,
    pub row: usize,
    pub col: usize,
}

/// The interchange form of a compiled grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GridExport {
    pub width: usize,
    pub height: usize,
    pub entry: (usize, usize),
    pub labels: Vec<LabelRecord>,
    pub cells: Vec<CellRecord>,
}

impl GridExport {
    pub fn extract(compilation: &Compilation) -> GridExport {
        let grid = compilation.grid();
        let entry = compilation.entry();

        let labels = compilation
            .labels()
            .iter()
            .map(|(name, at)| LabelRecord {
                name: name.to_string(),
                row: at.row,
                col: at.col,
            })
            .collect();

        let cells = grid
            .cells()
            .map(|(at, cell)| CellRecord::new(at, cell))
            .collect();

        GridExport {
            width: grid.width(),
            height: grid.height(),
            entry: (entry.row, entry.col),
            labels,
            cells,
        }
    }

    /// Point every cell at the structured line it was expanded from.  Cells
    /// for lines the expander added on its own lose their line.
    pub fn locate(mut self, expansion: &Expansion) -> GridExport {
        for cell in &mut self.cells {
            let origin = cell
                .source_line
                .and_then(|l| expansion.origin(l))
                .filter(|o| o.line > 0);
            cell.source_line = origin.map(|o| o.line);
            cell.source_unit = origin.map(|o| o.unit.clone());
        }
        self
    }

    /// Loads an export from the given reader.
    pub fn read<R: std::io::Read>(reader: R) -> Result<GridExport, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Writes the export as pretty printed JSON.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, self)
    }
}
