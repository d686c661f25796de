// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Shell completion generation

use anyhow::Result;
use clap_complete::Shell;
use std::io::Write;

/// Write completions for `shell` describing `command`
pub fn run<W: Write>(shell: Shell, command: &mut clap::Command, out: &mut W) -> Result<()> {
    let name = command.get_name().to_string();
    clap_complete::generate(shell, command, name, out);
    Ok(())
}
