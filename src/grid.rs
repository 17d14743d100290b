// ============================================================================
// Cells
// ============================================================================

/// Largest width or height a grid may have. Cell coordinates are `i16`.
pub const MAX_DIMENSION: usize = 1024;

/// Number of entries in the piece palette.
pub const PALETTE_SIZE: u8 = 7;

/// Palette index of a piece color. Mapping an index to an actual color is
/// left to whoever draws the grid.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct ColorId(u8);

impl ColorId {
    pub fn new(index: u8) -> Option<Self> {
        (index < PALETTE_SIZE).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ColorId> {
        (0..PALETTE_SIZE).map(ColorId)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(ColorId),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i16, y: i16 },
    #[error("row {row} has {len} cells, expected {width}")]
    RaggedRow { row: usize, len: usize, width: usize },
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge { width: usize, height: usize },
}

// ============================================================================
// Grid
// ============================================================================

/// Fixed-size play field. Row 0 is the top.
///
/// The grid never changes shape: every row holds `width` cells and removing
/// rows always prepends the same number of empty rows.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Empty grid. Dimensions above `MAX_DIMENSION` are capped.
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = (width.min(MAX_DIMENSION), height.min(MAX_DIMENSION));
        Self {
            width,
            height,
            rows: vec![vec![Cell::Empty; width]; height],
        }
    }

    /// Builds a grid from explicit rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, Vec::len);
        if width > MAX_DIMENSION || rows.len() > MAX_DIMENSION {
            return Err(GridError::TooLarge {
                width,
                height: rows.len(),
            });
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GridError::RaggedRow {
                row,
                len: cells.len(),
                width,
            });
        }
        Ok(Self {
            width,
            height: rows.len(),
            rows,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn in_bounds(&self, x: i16, y: i16) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: i16, y: i16) -> Result<Cell, GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds { x, y });
        }
        Ok(self.rows[y as usize][x as usize])
    }

    pub fn is_empty(&self, x: i16, y: i16) -> Result<bool, GridError> {
        self.cell(x, y).map(Cell::is_empty)
    }

    pub(crate) fn set_cell(&mut self, x: i16, y: i16, color: ColorId) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds { x, y });
        }
        self.rows[y as usize][x as usize] = Cell::Occupied(color);
        Ok(())
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|cell| !cell.is_empty()))
    }

    /// Indices of full rows, top to bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_row_full(y)).collect()
    }

    /// Removes the given rows and prepends as many empty rows, keeping the
    /// remaining rows in their relative order.
    pub(crate) fn clear_rows(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let mut kept: Vec<Vec<Cell>> = Vec::with_capacity(self.height);
        let mut removed = 0;
        for (y, row) in self.rows.drain(..).enumerate() {
            if indices.contains(&y) {
                removed += 1;
            } else {
                kept.push(row);
            }
        }
        let mut rows = vec![vec![Cell::Empty; self.width]; removed];
        rows.extend(kept);
        self.rows = rows;
    }

    #[cfg(test)]
    fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows
            .get(y)
            .map_or(0, |row| row.iter().filter(|cell| !cell.is_empty()).count())
    }

    #[cfg(test)]
    fn total_filled_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(i: u8) -> ColorId {
        ColorId::new(i).unwrap()
    }

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(4, 5);
        assert_eq!(grid.rows().len(), 5);
        assert!(grid.rows().iter().all(|row| row.len() == 4));
        assert_eq!(grid.total_filled_cells(), 0);
    }

    #[test]
    fn out_of_bounds_lookup_fails() {
        let grid = Grid::new(4, 5);
        assert_eq!(grid.is_empty(-1, 0), Err(GridError::OutOfBounds { x: -1, y: 0 }));
        assert_eq!(grid.is_empty(4, 0), Err(GridError::OutOfBounds { x: 4, y: 0 }));
        assert_eq!(grid.is_empty(0, 5), Err(GridError::OutOfBounds { x: 0, y: 5 }));
        assert_eq!(grid.is_empty(3, 4), Ok(true));
    }

    #[test]
    fn set_cell_marks_occupied() {
        let mut grid = Grid::new(4, 5);
        grid.set_cell(2, 3, color(1)).unwrap();
        assert_eq!(grid.cell(2, 3), Ok(Cell::Occupied(color(1))));
        assert!(grid.set_cell(9, 3, color(1)).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![Cell::Empty; 4], vec![Cell::Empty; 3]];
        assert_eq!(
            Grid::from_rows(rows),
            Err(GridError::RaggedRow { row: 1, len: 3, width: 4 })
        );
    }

    #[test]
    fn clear_rows_prepends_empty_rows() {
        let mut grid = Grid::new(2, 3);
        grid.set_cell(0, 0, color(0)).unwrap();
        grid.set_cell(0, 1, color(1)).unwrap();
        grid.set_cell(1, 1, color(1)).unwrap();

        grid.clear_rows(&[1]);

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.filled_count_in_row(0), 0);
        assert_eq!(grid.cell(0, 1), Ok(Cell::Occupied(color(0))));
        assert_eq!(grid.filled_count_in_row(2), 0);
    }

    #[test]
    fn oversized_grids_are_capped_or_rejected() {
        let grid = Grid::new(40_000, 20);
        assert_eq!((grid.width(), grid.height()), (MAX_DIMENSION, 20));

        let rows = vec![vec![Cell::Empty; MAX_DIMENSION + 1]; 2];
        assert_eq!(
            Grid::from_rows(rows),
            Err(GridError::TooLarge { width: MAX_DIMENSION + 1, height: 2 })
        );
    }

    #[test]
    fn errors_describe_the_cell() {
        assert_eq!(
            GridError::OutOfBounds { x: -1, y: 3 }.to_string(),
            "cell (-1, 3) is outside the grid"
        );
        assert_eq!(
            GridError::RaggedRow { row: 1, len: 3, width: 4 }.to_string(),
            "row 1 has 3 cells, expected 4"
        );
    }

    #[test]
    fn palette_rejects_unknown_index() {
        assert!(ColorId::new(PALETTE_SIZE).is_none());
        assert_eq!(ColorId::all().count(), PALETTE_SIZE as usize);
    }
}
