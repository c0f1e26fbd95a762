//! Campaign control endpoints

pub mod handler;

// vim: ts=4
