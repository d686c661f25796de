// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
//! Fuzz the status classifiers with arbitrary git output

#![no_main]

use libfuzzer_sys::fuzz_target;
use repoporter::status::{classify_blob, classify_porcelain};

fuzz_target!(|data: &[u8]| {
    let output = String::from_utf8_lossy(data);

    let lines = output.lines().count();
    let counts = classify_porcelain(&output);
    let total = u64::from(counts.added) + u64::from(counts.modified) + u64::from(counts.deleted);
    assert!(total <= lines as u64);

    let _ = classify_blob(&output);
});
