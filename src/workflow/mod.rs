pub mod batch_ctx;
pub mod completion;
pub mod upload_session;

pub use batch_ctx::BatchCtx;
pub use completion::{await_completion, CompletionSignal};
pub use upload_session::{FailurePolicy, Phase, SessionReport, UploadSession};
