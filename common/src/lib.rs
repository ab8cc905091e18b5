pub mod config;
pub mod plot;
pub mod record;
pub mod series;
