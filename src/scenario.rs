//! Finished scenarios and their dataset line format.
//!
//! A line is `<width>|<height>|<goal>|<cell>|...` with unpadded header
//! fields and one two-digit cell code per grid cell in row-major order.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::types::CellKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub goal: CellKind,
    pub grid: Grid,
}

impl Scenario {
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Dataset line, without the trailing newline.
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Framed ASCII drawing of the map, one text row per grid row.
    pub fn render(&self) -> String {
        let size = self.size();
        let mut out = String::new();
        out.push_str(&format!("goal: {} ({})\n", self.goal, self.goal.code()));
        let border: String = std::iter::repeat('#').take(size + 2).collect();
        out.push_str(&border);
        out.push('\n');
        for row in self.grid.rows() {
            out.push('#');
            out.extend(row.iter().map(|k| k.symbol()));
            out.push('#');
            out.push('\n');
        }
        out.push_str(&border);
        out.push('\n');
        out
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        write!(f, "{}|{}|{}", size, size, self.goal.code())?;
        for kind in self.grid.cells() {
            write!(f, "|{:02}", kind.code())?;
        }
        Ok(())
    }
}

fn parse_field<T: FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::Parse(format!("{what} is not a number: {field:?}")))
}

fn parse_kind(field: &str, what: &str) -> Result<CellKind> {
    let code: u8 = parse_field(field, what)?;
    CellKind::from_code(code)
        .ok_or_else(|| Error::Parse(format!("unknown {what} code {code}")))
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('|').collect();
        if fields.len() < 4 {
            return Err(Error::Parse(format!(
                "expected at least 4 '|'-separated fields, got {}",
                fields.len()
            )));
        }
        let width: usize = parse_field(fields[0], "width")?;
        let height: usize = parse_field(fields[1], "height")?;
        if width != height {
            return Err(Error::Parse(format!(
                "grid must be square, got {width}x{height}"
            )));
        }
        let goal = parse_kind(fields[2], "goal")?;
        let cells_len = width.checked_mul(height).unwrap_or(usize::MAX);
        if fields.len() - 3 != cells_len {
            return Err(Error::Parse(format!(
                "header says {width}x{height} but line has {} cells",
                fields.len() - 3
            )));
        }
        let cells = fields[3..]
            .iter()
            .map(|f| parse_kind(f, "cell"))
            .collect::<Result<Vec<_>>>()?;
        let grid = Grid::from_cells(width, cells)
            .ok_or_else(|| Error::Parse("cell count mismatch".into()))?;
        Ok(Scenario { goal, grid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Scenario {
        let mut grid = Grid::new(3);
        grid.set((0, 0), CellKind::Agent);
        grid.set((1, 1), CellKind::Gem);
        grid.set((2, 2), CellKind::Furnace);
        Scenario { goal: CellKind::GemRing, grid }
    }

    #[test]
    fn line_format() {
        assert_eq!(
            small().to_line(),
            "3|3|25|00|26|26|26|14|26|26|26|05"
        );
    }

    #[test]
    fn parse_recovers_header_and_cells() {
        let line = small().to_line();
        let parsed: Scenario = line.parse().expect("parse");
        assert_eq!(parsed, small());
        let codes: Vec<String> = parsed
            .grid
            .cells()
            .iter()
            .map(|k| format!("{:02}", k.code()))
            .collect();
        assert_eq!(codes, line.split('|').skip(3).collect::<Vec<_>>());
    }

    #[test]
    fn parse_accepts_trailing_newline() {
        let line = format!("{}\n", small().to_line());
        assert!(line.parse::<Scenario>().is_ok());
    }

    #[test]
    fn parse_rejects_short_line() {
        assert!(matches!("3|3|25".parse::<Scenario>(), Err(Error::Parse(_))));
    }

    #[test]
    fn parse_rejects_length_mismatch() {
        assert!(matches!(
            "2|2|21|26|26|26".parse::<Scenario>(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert!("1|1|99|26".parse::<Scenario>().is_err());
        assert!("1|1|21|27".parse::<Scenario>().is_err());
        assert!("1|1|21|xx".parse::<Scenario>().is_err());
    }

    #[test]
    fn parse_rejects_non_square() {
        assert!("1|2|21|26|26".parse::<Scenario>().is_err());
    }

    #[test]
    fn render_draws_symbols() {
        let text = small().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "goal: GemRing (25)");
        assert_eq!(lines[1], "#####");
        assert_eq!(lines[2], "#@  #");
        assert_eq!(lines[3], "# * #");
        assert_eq!(lines[4], "#  F#");
        assert_eq!(lines[5], "#####");
    }

    #[test]
    fn render_header_is_its_own_line() {
        let text = small().render();
        assert!(text.starts_with("goal: GemRing (25)\n#####\n"));
        assert!(text.ends_with("#####\n"));
        assert_eq!(text.lines().count(), small().size() + 3);
    }
}
