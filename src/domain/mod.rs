pub mod progress;
pub mod question;
pub mod word;

pub use progress::{ProgressEntry, User};
pub use question::{Direction, Question, QuestionFormat};
pub use word::{Book, Chapter, Word};
