//! Repositories over a borrowed connection.
//!
//! Each repository wraps `&mut PgConnection` so callers decide the
//! transaction scope: pass `&mut *tx` inside a transaction or a plain pool
//! connection for reads.

mod instances;
mod instructors;
mod reservations;
mod templates;

pub use instances::Instances;
pub use instructors::Instructors;
pub use reservations::Reservations;
pub use templates::Templates;
