pub mod order_flow;
pub mod order_stage;

pub use order_flow::OrderFlow;
pub use order_stage::OrderStage;
