//! VR/VA Benefit Engine
//!
//! This crate reconciles the monthly personnel sources of a company into one
//! record per employee and computes each employee's meal/food voucher
//! entitlement, split between the employer and the employee.

#![warn(missing_docs)]

pub mod calculation;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod normalize;
pub mod pipeline;
