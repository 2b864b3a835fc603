pub mod flow_assembler;
pub mod link_distributor;
pub mod resource_locator;

pub use flow_assembler::FlowAssembler;
pub use link_distributor::LinkDistributor;
pub use resource_locator::ResourceLocator;
