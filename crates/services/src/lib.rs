#![forbid(unsafe_code)]

pub mod answer_buffer;
pub mod countdown;
pub mod error;
pub mod result_view;
pub mod runner;

pub use answer_buffer::AnswerBuffer;
pub use countdown::{format_clock, Countdown, CountdownHandle};
pub use error::RunnerError;
pub use result_view::{QuestionOutcome, ResultBreakdown};
pub use runner::{spawn_session_countdown, LoadFailure, SessionPhase, SessionRunner};
