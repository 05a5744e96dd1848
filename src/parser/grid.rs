//! Row/column grid reading shared by the tabular section parsers.
//!
//! Grids are one header line followed by rows of matching cell count,
//! terminated by a blank line or a recognized summary trailer. The log
//! producer is not consistent across engine versions, so two repair
//! behaviors are preserved here: rows one cell too long are repaired by
//! merging their first two cells (class names containing a space), and
//! rows off by more than one are skipped with a diagnostic.

use log::warn;
use serde::{Deserialize, Serialize};

/// A parsed grid: header plus rows of equal cell count
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridSection {
    /// The opener line that introduced this grid
    pub heading: String,

    /// Column names from the header line
    pub header: Vec<String>,

    /// Data rows, each the same length as `header`
    pub rows: Vec<Vec<String>>,
}

/// Split one grid line into trimmed, non-empty cells
pub fn split_cells(line: &str, delimiters: &[char]) -> Vec<String> {
    line.split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a grid starting at the header line under `cursor`.
///
/// Consumes the header, every row, the trailer (when `is_trailer`
/// recognizes one) and a single terminating blank line, leaving the
/// cursor on the first line after the section.
pub fn read_grid(
    heading: &str,
    lines: &[String],
    cursor: &mut usize,
    delimiters: &[char],
    is_trailer: Option<fn(&[String]) -> bool>,
) -> GridSection {
    let mut grid = GridSection {
        heading: heading.to_string(),
        ..GridSection::default()
    };

    if *cursor >= lines.len() {
        return grid;
    }

    grid.header = split_cells(&lines[*cursor], delimiters);
    *cursor += 1;

    while *cursor < lines.len() {
        let line = &lines[*cursor];
        if line.is_empty() {
            *cursor += 1;
            break;
        }

        let mut cells = split_cells(line, delimiters);

        if let Some(trailer) = is_trailer {
            if trailer(&cells) {
                *cursor += 1;
                // the trailer is followed by the section's blank terminator
                if *cursor < lines.len() && lines[*cursor].is_empty() {
                    *cursor += 1;
                }
                break;
            }
        }

        // One extra cell means a name containing the delimiter; the
        // producer never quotes, so merge the first two cells.
        if cells.len() == grid.header.len() + 1 {
            let merged = format!("{} {}", cells[0], cells[1]);
            cells.splice(0..2, [merged]);
        }

        if cells.len() != grid.header.len() {
            warn!(
                "Skipping malformed grid row ({} cells, expected {}): {}",
                cells.len(),
                grid.header.len(),
                line
            );
            *cursor += 1;
            continue;
        }

        grid.rows.push(cells);
        *cursor += 1;
    }

    grid
}

impl GridSection {
    /// Index of the first header column matching any of `names`
    pub fn find_column(&self, names: &[&str]) -> Option<usize> {
        self.header
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    }

    /// Cell at (row, column), if present
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_grid_stops_at_blank() {
        let input = lines(&["Class Count", "A 1", "B 2", "", "unrelated"]);
        let mut cursor = 0;
        let grid = read_grid("Objects", &input, &mut cursor, &[' '], None);

        assert_eq!(grid.rows.len(), 2);
        assert_eq!(cursor, 4);
        assert_eq!(input[cursor], "unrelated");
    }

    #[test]
    fn test_off_by_one_row_merges_first_two_cells() {
        let input = lines(&["Class Count", "Skeletal Mesh 4"]);
        let mut cursor = 0;
        let grid = read_grid("Objects", &input, &mut cursor, &[' '], None);

        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0], vec!["Skeletal Mesh", "4"]);
    }

    #[test]
    fn test_badly_split_row_is_skipped() {
        let input = lines(&["Class Count", "A B C D 1", "E 2"]);
        let mut cursor = 0;
        let grid = read_grid("Objects", &input, &mut cursor, &[' '], None);

        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0][0], "E");
    }
}
