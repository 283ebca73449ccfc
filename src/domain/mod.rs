// Calendar helpers
pub mod calendar;

// Report binders
pub mod databind;

// Request-scoped debug trail
pub mod debug_log;

// Domain-specific error types
pub mod errors;

// Fee calculators
pub mod fees;

// Port interfaces
pub mod ports;

// Embedded calc table and asset-type groups
pub mod reference;

pub mod rounding;
pub mod sanitize;
pub mod table;
