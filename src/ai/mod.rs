pub mod background;
pub mod engine;
pub mod evaluation;

pub use background::{SearchHandle, SearchOutcome, spawn_search};
pub use engine::{
    AiEngine, CancelToken, DEFAULT_HINT_DEPTH, MinimaxAi, SearchStats, default_engine,
};
