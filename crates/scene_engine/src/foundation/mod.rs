//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the node [`Transform`](math::Transform)
//! - CRC-32/CRC-64 hashing and hashed [`StringId`](string_id::StringId)s
//! - The dependency-ordered [`DependencyMap`](dependency_map::DependencyMap)
//! - Logging utilities

pub mod crc;
pub mod dependency_map;
pub mod logging;
pub mod math;
pub mod string_id;
