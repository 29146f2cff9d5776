pub(crate) mod position_model;
pub(crate) mod position_resolver;

pub use position_model::{CurrencyClass, Instrument, Position, ResolvedPosition};
pub use position_resolver::PositionResolver;
