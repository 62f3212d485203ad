mod healthcheck;

pub use healthcheck::{CheckIn, HealthReporter};
