//! Task, item and answer types shared by the tracker, stores and aggregator.

pub mod answer;
pub mod document;
pub mod task;

pub use answer::{
    check_answer, is_valid_answer, Answer, AnswerRules, Item, TaskType, ValidationError,
    DEFAULT_MIN_TEXT_LENGTH,
};
pub use document::TaskDocument;
pub use task::{AnswerSequence, NewTask, Task};
