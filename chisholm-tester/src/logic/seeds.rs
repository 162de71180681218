use anyhow::{Context, Result, bail, ensure};
use std::collections::HashSet;

/// Largest range a single token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

/// Resolve CLI seed arguments into a deduplicated list.
///
/// Supports literal integers (negative values use their magnitude) and
/// half-open ranges such as `10..20`. An empty input falls back to `1337`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        for seed in expand_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(1337);
    }

    Ok(seeds)
}

fn expand_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start: u64 = start
            .parse()
            .with_context(|| format!("bad range start in seed token: {token}"))?;
        let end: u64 = end
            .parse()
            .with_context(|| format!("bad range end in seed token: {token}"))?;
        ensure!(start < end, "empty seed range: {token}");
        ensure!(
            end - start <= MAX_RANGE_LEN,
            "seed range {token} is wider than {MAX_RANGE_LEN}"
        );
        return Ok((start..end).collect());
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(vec![value.unsigned_abs()]);
    }

    if let Ok(value) = token.parse::<u64>() {
        return Ok(vec![value]);
    }

    bail!("Unrecognized seed token: {token}");
}
