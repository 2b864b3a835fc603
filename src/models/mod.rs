pub mod catalog;
pub mod money;
pub mod order;
pub mod resources;

pub use catalog::Product;
pub use money::{Money, Totals};
pub use order::{LineItem, NormalizedOrder, Order, OrderItem};
pub use resources::{Document, DocumentField, Flow, Organization, Role, ShareLink, Template};
