// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for signup abuse simulation.
//!
//! This module provides utilities for replaying abusive signup patterns
//! against the guard on a simulated clock.

pub mod attacks;
pub mod generators;
pub mod metrics;
