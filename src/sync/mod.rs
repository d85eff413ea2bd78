pub mod cascade;
pub mod debounce;
pub mod list;
pub mod scoped;

pub use cascade::FilterCascade;
pub use debounce::Debounced;
pub use list::{ListView, OptionList, OptionSource, PendingFetch, Rescope};
pub use scoped::{Loadable, Scoped, Ticket};
