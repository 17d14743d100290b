use std::time::Duration;

use crate::config::{CollisionMode, EngineConfig, LevelMode, RotationMode};
use crate::grid::{Cell, Grid, GridError};
use crate::piece::{Piece, PieceSource, RandomPieceSource};

// ============================================================================
// Events
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceFrozen,
    RowsCleared { rows: u32, points: u32 },
    LevelUp(u32),
    GameOver,
}

// ============================================================================
// Engine
// ============================================================================

/// One game session: the field, the falling and preview pieces, score and
/// level. Once `is_game_over` turns true nothing mutates the session again.
pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    active: Piece,
    next: Piece,
    score: u32,
    level: u32,
    rows_since_level: u32,
    gravity_interval: Duration,
    level_clock: Duration,
    game_over: bool,
    source: Box<dyn PieceSource>,
    events: Vec<GameEvent>,
}

impl Engine {
    /// Fresh session. Field dimensions above `MAX_DIMENSION` are capped.
    pub fn new(mut config: EngineConfig, mut source: Box<dyn PieceSource>) -> Self {
        let grid = Grid::new(config.width, config.height);
        config.width = grid.width();
        config.height = grid.height();
        let active = Piece::spawn(source.as_mut(), config.width);
        let mut engine = Self::assemble(config, grid, active, source);
        engine.check_spawn();
        engine
    }

    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::new(config, Box::new(RandomPieceSource::seeded(seed)))
    }

    /// Session over a prepared field with a piece already falling through it.
    /// The field dimensions replace the ones in `config`, and the piece is
    /// taken as placed, without the spawn check.
    pub fn with_grid(
        mut config: EngineConfig,
        grid: Grid,
        active: Piece,
        source: Box<dyn PieceSource>,
    ) -> Self {
        config.width = grid.width();
        config.height = grid.height();
        Self::assemble(config, grid, active, source)
    }

    fn assemble(
        config: EngineConfig,
        grid: Grid,
        active: Piece,
        mut source: Box<dyn PieceSource>,
    ) -> Self {
        let next = Piece::spawn(source.as_mut(), config.width);
        Self {
            config,
            grid,
            active,
            next,
            score: 0,
            level: config.start_level.max(1),
            rows_since_level: 0,
            gravity_interval: config.gravity.interval_at(config.start_level),
            level_clock: Duration::ZERO,
            game_over: false,
            source,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Collision rules
    // ------------------------------------------------------------------------

    fn occupied(&self, x: i16, y: i16) -> bool {
        matches!(self.grid.is_empty(x, y), Ok(false))
    }

    fn free(&self, x: i16, y: i16) -> bool {
        matches!(self.grid.is_empty(x, y), Ok(true))
    }

    pub fn can_move_horizontal(&self, piece: &Piece, candidate_x: i16) -> bool {
        let width = self.grid.width() as i16;
        if candidate_x + piece.left_offset() < 0 || candidate_x + piece.right_offset() >= width {
            return false;
        }

        let cells = piece.cells_at(candidate_x);
        match self.config.collision {
            CollisionMode::Footprint => cells.iter().all(|c| self.free(c.x, c.y)),
            CollisionMode::Adjacency => cells
                .iter()
                .all(|c| !self.occupied(c.x - 1, c.y) && !self.occupied(c.x + 1, c.y)),
        }
    }

    pub fn can_move_down(&self, piece: &Piece) -> bool {
        let height = self.grid.height() as i16;
        if piece.origin.y + piece.bottom_offset() + 1 >= height {
            return false;
        }
        piece.cells().iter().all(|c| self.free(c.x, c.y + 1))
    }

    fn fits(&self, piece: &Piece) -> bool {
        piece.cells().iter().all(|c| self.free(c.x, c.y))
    }

    // ------------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------------

    pub fn move_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1)
    }

    fn shift(&mut self, dx: i16) -> bool {
        if self.game_over {
            return false;
        }
        let candidate_x = self.active.origin.x + dx;
        if !self.can_move_horizontal(&self.active, candidate_x) {
            return false;
        }
        self.active.origin.x = candidate_x;
        self.events.push(GameEvent::PieceMoved);
        true
    }

    /// Clockwise rotation.
    pub fn rotate(&mut self) -> bool {
        self.rotate_piece(true)
    }

    /// Counter-clockwise rotation.
    pub fn rotate_back(&mut self) -> bool {
        self.rotate_piece(false)
    }

    fn rotate_piece(&mut self, clockwise: bool) -> bool {
        if self.game_over {
            return false;
        }
        let mut rotated = self.active.rotated(clockwise);

        // Shift back inside the side walls.
        let width = self.grid.width() as i16;
        let overflow = rotated.origin.x + rotated.right_offset() - (width - 1);
        if overflow > 0 {
            rotated.origin.x -= overflow;
        }
        let underflow = rotated.origin.x + rotated.left_offset();
        if underflow < 0 {
            rotated.origin.x -= underflow;
        }

        let height = self.grid.height() as i16;
        if rotated.origin.x + rotated.left_offset() < 0
            || rotated.origin.x + rotated.right_offset() >= width
            || rotated.origin.y + rotated.bottom_offset() >= height
        {
            return false;
        }

        if self.config.rotation == RotationMode::Revert
            && !self.can_move_horizontal(&rotated, rotated.origin.x)
        {
            return false;
        }

        if rotated == self.active {
            return false;
        }
        self.active = rotated;
        self.events.push(GameEvent::PieceRotated);
        true
    }

    fn step_down(&mut self) -> bool {
        if !self.can_move_down(&self.active) {
            return false;
        }
        self.active.origin.y += 1;
        true
    }

    /// Moves the piece down one row, or freezes it into the grid and brings
    /// in the next piece when it cannot fall any further.
    pub fn tick_gravity(&mut self) -> Result<(), GridError> {
        if self.game_over || self.step_down() {
            return Ok(());
        }
        self.freeze()?;
        if !self.game_over {
            self.spawn_next();
        }
        Ok(())
    }

    pub fn soft_drop(&mut self) -> Result<(), GridError> {
        self.tick_gravity()
    }

    /// Drops the piece as far as it falls without freezing it. Returns the
    /// number of rows travelled.
    pub fn hard_drop(&mut self) -> u32 {
        if self.game_over {
            return 0;
        }
        let mut rows = 0;
        while self.step_down() {
            rows += 1;
        }
        if rows > 0 {
            self.events.push(GameEvent::PieceMoved);
        }
        rows
    }

    fn freeze(&mut self) -> Result<(), GridError> {
        let color = self.active.color;
        for cell in self.active.cells() {
            self.grid.set_cell(cell.x, cell.y, color)?;
        }
        self.events.push(GameEvent::PieceFrozen);
        Ok(())
    }

    fn spawn_next(&mut self) {
        let fresh = Piece::spawn(self.source.as_mut(), self.grid.width());
        self.active = std::mem::replace(&mut self.next, fresh);
        self.check_spawn();
    }

    fn check_spawn(&mut self) {
        if !self.fits(&self.active) || !self.can_move_down(&self.active) {
            self.game_over = true;
            self.events.push(GameEvent::GameOver);
        }
    }

    // ------------------------------------------------------------------------
    // Rows, score and levels
    // ------------------------------------------------------------------------

    /// Removes every full row and scores it. Scoring is `rows * level` plus
    /// one for each pair of cleared rows that sat directly on top of each
    /// other. Returns the points gained; calling with no full row is a no-op.
    pub fn clear_full_rows(&mut self) -> u32 {
        if self.game_over {
            return 0;
        }
        let full = self.grid.full_rows();
        if full.is_empty() {
            return 0;
        }

        let rows = full.len() as u32;
        let bonus = full.windows(2).filter(|pair| pair[1] - pair[0] == 1).count() as u32;
        let points = rows.saturating_mul(self.level).saturating_add(bonus);

        self.grid.clear_rows(&full);
        self.score = self.score.saturating_add(points);
        self.rows_since_level = self.rows_since_level.saturating_add(rows);
        self.events.push(GameEvent::RowsCleared { rows, points });

        if let LevelMode::Rows { threshold } = self.config.leveling {
            if self.rows_since_level >= threshold.saturating_add(self.level) {
                self.level_up();
            }
        }
        points
    }

    /// Feeds elapsed play time to the timed leveling rule. Does nothing when
    /// levels are driven by cleared rows.
    pub fn advance_clock(&mut self, elapsed: Duration) {
        let LevelMode::Timed { period } = self.config.leveling else {
            return;
        };
        if self.game_over || period.is_zero() {
            return;
        }
        self.level_clock += elapsed;
        while self.level_clock >= period {
            self.level_clock -= period;
            if self.gravity_interval > self.config.gravity.floor {
                self.level_up();
            }
        }
    }

    fn level_up(&mut self) {
        self.level = self.level.saturating_add(1);
        self.gravity_interval = self.config.gravity.faster(self.gravity_interval);
        self.rows_since_level = 0;
        self.events.push(GameEvent::LevelUp(self.level));
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> &Piece {
        &self.active
    }

    pub fn next(&self) -> &Piece {
        &self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn rows_cleared_since_level_start(&self) -> u32 {
        self.rows_since_level
    }

    pub fn gravity_interval(&self) -> Duration {
        self.gravity_interval
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Returns the grid rows with the falling piece drawn in.
    pub fn render_grid(&self) -> Vec<Vec<Cell>> {
        let mut visual = self.grid.rows().to_vec();
        for cell in self.active.cells() {
            if self.grid.in_bounds(cell.x, cell.y) {
                visual[cell.y as usize][cell.x as usize] = Cell::Occupied(self.active.color);
            }
        }
        visual
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
