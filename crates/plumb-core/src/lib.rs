pub mod cancel;
pub mod error;
pub mod event;
pub mod exec;
pub mod pipeline;
pub mod store;
pub mod supervisor;
pub mod truncate;

pub use cancel::CancelToken;
pub use error::{CoreError, CoreResult};
pub use event::{Pane, PreviewEvent};
pub use exec::{ShellRunner, StageRunner, StageSpec};
pub use pipeline::PipelineState;
pub use store::{StageGate, StageResultStore};
pub use supervisor::ExecutionSupervisor;
pub use truncate::{LineTruncator, TruncateStep};
