pub mod clock;
pub mod element;
pub mod op;
pub mod position;

pub use clock::{ActorId, Clock, LogicalClock, OpId};
pub use element::{Element, ElementId, Field};
pub use op::Operation;
pub use position::PositionKey;
