pub mod csv;
pub mod events;
