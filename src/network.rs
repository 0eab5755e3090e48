pub mod link;
pub mod topology;

pub use link::{is_valid_cost, Link, LinkTable};
pub use topology::{Acceptance, LinkStateDatabase, LsdbEntry};
