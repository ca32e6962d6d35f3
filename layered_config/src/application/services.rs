// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Services
//!
//! The composer and its construction surface.

pub mod config_manager;

pub use config_manager::{
    CallbackId, ComposerState, ComposerStats, ConfigManager, ConfigManagerBuilder, ReloadMode, ValidationStats,
};
