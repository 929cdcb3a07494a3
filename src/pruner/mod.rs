pub mod cutoff;
pub mod engine;
pub mod filter;
pub mod interrupt;
pub mod observer;
pub mod result;

pub use cutoff::Cutoff;
pub use engine::{prune, PruneOptions};
pub use filter::EntryFilter;
pub use interrupt::{Interrupt, INTERRUPTED_MESSAGE};
pub use observer::{PruneObserver, RemovalList, TracingObserver};
pub use result::TraversalResult;
