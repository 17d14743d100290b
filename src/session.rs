use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::piece::PieceSource;

/// Owns the running session and the best score of the sessions before it.
///
/// Restarting discards the engine after folding its score into the high
/// score; nothing else survives from one session to the next.
pub struct SessionManager {
    config: EngineConfig,
    engine: Engine,
    high_score: u32,
    games_finished: u32,
    new_source: Box<dyn FnMut() -> Box<dyn PieceSource>>,
}

impl SessionManager {
    pub fn new<F>(config: EngineConfig, mut new_source: F) -> Self
    where
        F: FnMut() -> Box<dyn PieceSource> + 'static,
    {
        let engine = Engine::new(config, new_source());
        Self {
            config,
            engine,
            high_score: 0,
            games_finished: 0,
            new_source: Box::new(new_source),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Best score among the sessions already finished.
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Best score including the running session.
    pub fn best_score(&self) -> u32 {
        self.high_score.max(self.engine.score())
    }

    pub fn games_finished(&self) -> u32 {
        self.games_finished
    }

    /// Ends the running session and starts a fresh one. Returns the score of
    /// the session that ended.
    pub fn restart(&mut self) -> u32 {
        let source = (self.new_source)();
        let finished = std::mem::replace(&mut self.engine, Engine::new(self.config, source));
        self.high_score = fold_high_score(self.high_score, finished.score());
        self.games_finished += 1;
        finished.score()
    }
}

pub fn fold_high_score(previous: u32, finished: u32) -> u32 {
    previous.max(finished)
}
