pub mod instances;
pub mod reservations;
pub mod schedule;
pub mod templates;
