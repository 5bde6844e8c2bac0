pub mod artwork;
pub mod assembly;
pub mod config;
pub mod duration;
pub mod errors;
pub mod reconciler;
pub mod records;
pub mod scheduler;

pub use duration::parse_duration;
pub use errors::{ErrorKind, GuideError};
pub use reconciler::{reconcile_live_segments, LiveSegment};
pub use records::CatalogItem;
pub use scheduler::{synthesize_daily_schedule, CatalogScheduler, GuideEntry};
