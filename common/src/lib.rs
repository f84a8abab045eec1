pub mod api;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod row;
pub mod services;
pub mod supervisor;
pub mod task;

#[cfg(test)]
mod test_support;

pub use api::{CancelResponse, ErrorBody, SubmitResponse, TaskResults, TaskSummary};
pub use error::{GenerationError, RegistryError, SchemaError, StorageError};
pub use pipeline::{Checkpoint, PipelineOutcome, RowPipeline};
pub use registry::TaskRegistry;
pub use row::Row;
pub use services::{GenerationService, PersistenceService};
pub use supervisor::{TaskHandle, TaskSupervisor};
pub use task::{percentage, TaskId, TaskState, TaskStatus};
