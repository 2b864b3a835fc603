pub mod workflow_client;

pub use workflow_client::{WorkflowApi, WorkflowClient};
