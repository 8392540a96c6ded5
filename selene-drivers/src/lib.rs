//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in selene-core:
//!
//! - Stepper drivers (DRV8825 step/dir)

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
