pub mod difficulty;
pub mod sheet;

pub use difficulty::{Difficulty, ParseDifficultyError};
pub use sheet::{Progress, Question, Sheet, SubTopic, Topic};
