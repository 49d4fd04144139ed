mod classifier;
mod model;

pub use classifier::{
    attachment_filename, classify_response, correlation_id, elapsed_seconds, find_header,
    CORRELATION_HEADER, DEFAULT_FILENAME, EXECUTION_TIME_HEADER,
};
pub use model::{Attachment, Classification, ClassifiedResponse, Payload, ResponseOutcome};
