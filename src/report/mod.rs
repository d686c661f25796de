// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Reporters - render the repository list of a cycle

pub mod conky;
pub mod console;
pub mod delimited;

pub use conky::ConkyReporter;
pub use console::ConsoleReporter;
pub use delimited::DelimitedReporter;

use crate::types::Repository;
use anyhow::Result;

/// Consumes the finalized repository list once per cycle
pub trait Reporter {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Render one cycle's repositories
    fn report(&mut self, repos: &[Repository]) -> Result<()>;
}
