mod ids;
mod question;
mod result;
mod user;

pub use ids::{AnswerId, CategoryId, ParseIdError, QuestionId, ResultId, TestId, UserId};
pub use question::{Question, QuestionError, QuestionKind};
pub use result::{Answer, ResultDetail, TestResult};
pub use test::{Category, Test, TestError};
pub use user::{Role, User};
