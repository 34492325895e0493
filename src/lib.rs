/* This file is part of pubdao (https://codeberg.org/pubdao/pubdao)
 *
 * Copyright (C) 2025-2026 pubdao developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Client library for the Public DAO governance contract.
//!
//! All authoritative state (proposals, vote counters, deadlines,
//! ownership) lives in the on-chain contract. This crate is the
//! request-dispatch layer in front of it: a chain client adapter,
//! a bound contract handle, and the proposal interaction layer with
//! its pre-flight guard checks.

/// Chain client adapter and provider seam
pub mod chain;

/// Bound contract handle and ABI descriptor
pub mod contract;

/// Proposal interaction layer
pub mod dao;

/// Error types
pub mod error;

/// JSON-RPC primitives and client
pub mod rpc;

pub use error::{Error, GuardFailed, Result};
