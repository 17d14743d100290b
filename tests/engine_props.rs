//! Property tests for the engine.
//!
//! Invariants covered:
//! - Clearing rows never changes the grid dimensions.
//! - A grid without full rows is left untouched, and clearing twice in a
//!   row gains nothing the second time.
//! - Points follow `rows * level + adjacent pairs`.
//! - Random play never writes outside the grid, never lowers the score and
//!   keeps the falling piece inside the field.

use proptest::prelude::*;

use blockfall::{
    Cell, ColorId, Engine, EngineConfig, Grid, Piece, PieceSource, Profile, SequencePieceSource,
    Shape,
};

fn grid_strategy() -> impl Strategy<Value = Vec<Vec<Cell>>> {
    (2usize..8, 2usize..10).prop_flat_map(|(width, height)| {
        let cell = prop::bool::weighted(0.8).prop_map(|filled| {
            if filled {
                Cell::Occupied(ColorId::default())
            } else {
                Cell::Empty
            }
        });
        prop::collection::vec(prop::collection::vec(cell, width), height)
    })
}

fn engine_over(rows: Vec<Vec<Cell>>) -> Engine {
    let grid = Grid::from_rows(rows).unwrap();
    let source: Box<dyn PieceSource> = Box::new(SequencePieceSource::shapes(&[Shape::O]));
    Engine::with_grid(
        EngineConfig::current(0, 0),
        grid,
        Piece::new(Shape::O, ColorId::default(), 0, 0),
        source,
    )
}

proptest! {
    #[test]
    fn clearing_keeps_dimensions(rows in grid_strategy()) {
        let mut engine = engine_over(rows);
        let (width, height) = (engine.grid().width(), engine.grid().height());

        engine.clear_full_rows();

        prop_assert_eq!(engine.grid().height(), height);
        prop_assert_eq!(engine.grid().rows().len(), height);
        prop_assert!(engine.grid().rows().iter().all(|row| row.len() == width));
    }

    #[test]
    fn clearing_is_idempotent(rows in grid_strategy()) {
        let mut engine = engine_over(rows);
        let had_full_rows = !engine.grid().full_rows().is_empty();
        let before = engine.grid().clone();

        let gained = engine.clear_full_rows();
        if !had_full_rows {
            prop_assert_eq!(gained, 0);
            prop_assert_eq!(engine.grid(), &before);
        }

        let after = engine.grid().clone();
        let score = engine.score();
        prop_assert_eq!(engine.clear_full_rows(), 0);
        prop_assert_eq!(engine.grid(), &after);
        prop_assert_eq!(engine.score(), score);
    }

    #[test]
    fn points_follow_rows_and_pairs(rows in grid_strategy()) {
        let full: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|cell| !cell.is_empty()))
            .map(|(y, _)| y)
            .collect();
        let pairs = full.iter().zip(full.iter().skip(1)).filter(|(a, b)| **b == **a + 1).count();
        let mut engine = engine_over(rows);

        let gained = engine.clear_full_rows();

        // fresh engines score at level 1
        prop_assert_eq!(gained as usize, full.len() + pairs);
        prop_assert_eq!(engine.score(), gained);
        prop_assert!(engine.grid().full_rows().is_empty());
    }

    #[test]
    fn random_play_stays_in_bounds(
        seed in any::<u64>(),
        legacy in any::<bool>(),
        actions in prop::collection::vec(0u8..7, 1..300),
    ) {
        let profile = if legacy { Profile::Legacy } else { Profile::Current };
        let mut engine = Engine::seeded(EngineConfig::for_profile(profile, 8, 12), seed);

        for action in actions {
            let score = engine.score();
            match action {
                0 => { engine.move_left(); }
                1 => { engine.move_right(); }
                2 => { engine.rotate(); }
                3 => { engine.rotate_back(); }
                4 => { engine.hard_drop(); }
                _ => {
                    prop_assert!(engine.tick_gravity().is_ok());
                }
            }
            engine.clear_full_rows();

            prop_assert!(engine.score() >= score);
            prop_assert_eq!(engine.grid().height(), 12);
            let grid = engine.grid();
            prop_assert!(engine.active().cells().iter().all(|c| grid.in_bounds(c.x, c.y)));
        }
    }
}
