//! On-disk layout for dated backup runs.

mod layout;

pub use layout::OutputLayout;
