mod hire;
mod invoice;
mod lifecycle;
mod money;
mod reference;
mod settlement;
mod validation;

pub use hire::*;
pub use invoice::*;
pub use lifecycle::*;
pub use money::*;
pub use reference::*;
pub use settlement::*;
pub use validation::*;
