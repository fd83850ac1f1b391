mod helpers;
mod points;

pub mod op;
mod secret;

pub use helpers::parse_env_or_default;
pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;
