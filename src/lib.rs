// Value paths and coercion
pub mod value;

// Entity state snapshots
pub mod state;

// Card schema and application config
pub mod config;

// Cell formatting (numbers, dates, units)
pub mod format;

// Conditional styling and overwrite rules
pub mod rules;

// Row ordering
pub mod sort;

// Gesture actions
pub mod actions;

// Table view and HTML rendering
pub mod view;
