// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Change Watching
//!
//! OS-notification-backed file watching with an interval-polling safety
//! net, used by the composer's automatic reload mode.

pub mod file_watcher;

pub use file_watcher::FileWatcher;
