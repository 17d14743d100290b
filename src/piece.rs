use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{ColorId, PALETTE_SIZE};

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

pub type Offsets = [(i16, i16); 4];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shape {
    S,
    Z,
    L,
    J,
    O,
    I,
    T,
}

// ============================================================================
// Rotation Table
// ============================================================================

// Each state lists four non-negative (x, y) offsets from the piece origin,
// y growing downward. States are ordered clockwise.
const S_STATES: &[Offsets] = &[
    [(0, 1), (1, 1), (1, 0), (2, 0)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_STATES: &[Offsets] = &[
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (0, 1), (0, 2)],
];

const L_STATES: &[Offsets] = &[
    [(0, 0), (0, 1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (2, 0), (0, 1)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
    [(2, 0), (0, 1), (1, 1), (2, 1)],
];

const J_STATES: &[Offsets] = &[
    [(0, 2), (1, 2), (1, 1), (1, 0)],
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(0, 0), (1, 0), (0, 1), (0, 2)],
    [(0, 0), (1, 0), (2, 0), (2, 1)],
];

const O_STATES: &[Offsets] = &[[(0, 1), (1, 1), (1, 0), (0, 0)]];

const I_STATES: &[Offsets] = &[
    [(0, 0), (0, 1), (0, 2), (0, 3)],
    [(0, 0), (1, 0), (2, 0), (3, 0)],
];

const T_STATES: &[Offsets] = &[
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (1, 1), (1, 2), (0, 1)],
    [(0, 1), (1, 1), (2, 1), (1, 0)],
    [(1, 0), (1, 1), (1, 2), (2, 1)],
];

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::S,
        Shape::Z,
        Shape::L,
        Shape::J,
        Shape::O,
        Shape::I,
        Shape::T,
    ];

    pub fn rotations(self) -> &'static [Offsets] {
        match self {
            Shape::S => S_STATES,
            Shape::Z => Z_STATES,
            Shape::L => L_STATES,
            Shape::J => J_STATES,
            Shape::O => O_STATES,
            Shape::I => I_STATES,
            Shape::T => T_STATES,
        }
    }

    pub fn state_count(self) -> usize {
        self.rotations().len()
    }
}

// ============================================================================
// Piece
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    pub shape: Shape,
    pub rotation: usize,
    pub origin: Position,
    pub color: ColorId,
}

impl Piece {
    pub fn new(shape: Shape, color: ColorId, x: i16, y: i16) -> Self {
        Self {
            shape,
            rotation: 0,
            origin: Position { x, y },
            color,
        }
    }

    /// Fresh piece at the spawn point of a field `width` cells wide.
    pub fn spawn(source: &mut dyn PieceSource, width: usize) -> Self {
        let (shape, color) = source.next_piece();
        Self::new(shape, color, (width / 2) as i16, 1)
    }

    pub fn offsets(&self) -> &'static Offsets {
        let states = self.shape.rotations();
        &states[self.rotation % states.len()]
    }

    /// Absolute grid cells occupied by the piece.
    pub fn cells(&self) -> [Position; 4] {
        self.cells_at(self.origin.x)
    }

    /// Cells the piece would occupy with its origin moved to column `x`.
    pub fn cells_at(&self, x: i16) -> [Position; 4] {
        (*self.offsets()).map(|(dx, dy)| Position {
            x: x + dx,
            y: self.origin.y + dy,
        })
    }

    pub fn left_offset(&self) -> i16 {
        self.offsets().iter().map(|&(x, _)| x).min().unwrap_or(0)
    }

    pub fn right_offset(&self) -> i16 {
        self.offsets().iter().map(|&(x, _)| x).max().unwrap_or(0)
    }

    pub fn bottom_offset(&self) -> i16 {
        self.offsets().iter().map(|&(_, y)| y).max().unwrap_or(0)
    }

    pub(crate) fn rotated(&self, clockwise: bool) -> Self {
        let count = self.shape.state_count();
        let rotation = if clockwise {
            (self.rotation + 1) % count
        } else {
            (self.rotation + count - 1) % count
        };
        Self {
            rotation,
            ..self.clone()
        }
    }
}

// ============================================================================
// Piece Sources
// ============================================================================

/// Supplies the shape and color of every spawned piece.
pub trait PieceSource {
    fn next_piece(&mut self) -> (Shape, ColorId);
}

/// Uniformly random shapes and colors from an injectable generator.
pub struct RandomPieceSource<R: Rng = StdRng> {
    rng: R,
}

impl RandomPieceSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomPieceSource<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> PieceSource for RandomPieceSource<R> {
    fn next_piece(&mut self) -> (Shape, ColorId) {
        let shape = Shape::ALL[self.rng.gen_range(0..Shape::ALL.len())];
        let color = ColorId::new(self.rng.gen_range(0..PALETTE_SIZE)).unwrap_or_default();
        (shape, color)
    }
}

/// Replays a fixed list of pieces, wrapping around at the end.
pub struct SequencePieceSource {
    pieces: Vec<(Shape, ColorId)>,
    index: usize,
}

impl SequencePieceSource {
    pub fn new(pieces: Vec<(Shape, ColorId)>) -> Self {
        Self { pieces, index: 0 }
    }

    /// Same color for every piece.
    pub fn shapes(shapes: &[Shape]) -> Self {
        Self::new(shapes.iter().map(|&s| (s, ColorId::default())).collect())
    }
}

impl PieceSource for SequencePieceSource {
    fn next_piece(&mut self) -> (Shape, ColorId) {
        let piece = self
            .index
            .checked_rem(self.pieces.len())
            .and_then(|i| self.pieces.get(i).copied())
            .unwrap_or((Shape::O, ColorId::default()));
        self.index += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_state_has_four_distinct_non_negative_offsets() {
        for shape in Shape::ALL {
            for state in shape.rotations() {
                let unique: HashSet<_> = state.iter().collect();
                assert_eq!(unique.len(), 4, "{shape:?}");
                assert!(state.iter().all(|&(x, y)| x >= 0 && y >= 0), "{shape:?}");
            }
        }
    }

    #[test]
    fn o_shape_has_single_state() {
        assert_eq!(Shape::O.state_count(), 1);
        let piece = Piece::new(Shape::O, ColorId::default(), 3, 3);
        assert_eq!(piece.rotated(true).cells(), piece.cells());
        assert_eq!(piece.rotated(false).cells(), piece.cells());
    }

    #[test]
    fn rotation_wraps_around() {
        let piece = Piece::new(Shape::T, ColorId::default(), 3, 3);
        let mut rotated = piece.clone();
        for _ in 0..Shape::T.state_count() {
            rotated = rotated.rotated(true);
        }
        assert_eq!(rotated, piece);
        assert_eq!(piece.rotated(false).rotation, 3);
    }

    #[test]
    fn extents_follow_current_state() {
        let mut piece = Piece::new(Shape::I, ColorId::default(), 0, 0);
        assert_eq!((piece.left_offset(), piece.right_offset(), piece.bottom_offset()), (0, 0, 3));
        piece = piece.rotated(true);
        assert_eq!((piece.left_offset(), piece.right_offset(), piece.bottom_offset()), (0, 3, 0));
    }

    #[test]
    fn spawn_uses_center_column_and_second_row() {
        let mut source = SequencePieceSource::shapes(&[Shape::L]);
        let piece = Piece::spawn(&mut source, 15);
        assert_eq!(piece.origin, Position { x: 7, y: 1 });
        assert_eq!(piece.rotation, 0);
        assert_eq!(piece.shape, Shape::L);
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RandomPieceSource::seeded(42);
        let mut b = RandomPieceSource::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.next_piece(), b.next_piece());
        }
    }

    #[test]
    fn sequence_source_cycles() {
        let mut source = SequencePieceSource::shapes(&[Shape::I, Shape::O]);
        let drawn: Vec<Shape> = (0..4).map(|_| source.next_piece().0).collect();
        assert_eq!(drawn, vec![Shape::I, Shape::O, Shape::I, Shape::O]);
    }
}
