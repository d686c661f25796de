// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
//! Fuzz the ownership check with arbitrary owners and config text

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use repoporter::owner::{OwnerMatcher, DEFAULT_HOST};

#[derive(Debug, Arbitrary)]
struct Input {
    owner: String,
    config: String,
}

fuzz_target!(|input: Input| {
    // Empty or oversized owners are rejected up front
    let Ok(matcher) = OwnerMatcher::new(&input.owner, DEFAULT_HOST) else {
        return;
    };

    let first = matcher.matches_config(&input.config);
    assert_eq!(first, matcher.matches_config(&input.config));

    let remote = format!("{}\nurl = https://{DEFAULT_HOST}/{}/x.git\n", input.config, input.owner);
    assert!(matcher.matches_config(&remote));
});
