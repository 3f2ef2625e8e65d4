//! Job envelope: the message describing one conversion on the queue.

mod codec;
mod types;

pub use codec::{DecodeError, MAX_WORDS_PER_LINE};
pub use types::{ConversionOptions, FilePayload, JobEnvelope};
