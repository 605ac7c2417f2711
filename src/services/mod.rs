pub mod backfill;
pub mod placement;
pub mod providers;
pub mod ranking;
pub mod scoring;
pub mod taste;

pub use backfill::BackfillService;
pub use placement::{PlacementService, PlacementSession};
pub use ranking::RankMaintainer;
