mod catalog;

pub use catalog::{AddOutcome, Catalog, DelOutcome, LogoutOutcome};
