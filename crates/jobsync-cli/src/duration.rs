/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Duration strings like "90d", "24h" or "1h30m".

use anyhow::{anyhow, Context, Result};
use chrono::Duration;

/// Parses a duration string into a `chrono::Duration`.
///
/// Supported units: `d` days, `h` hours, `m` minutes and `s` seconds. Units
/// can be chained ("7d12h"); the total must be positive and representable.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let input = s.trim().to_lowercase();
    if input.is_empty() {
        return Err(anyhow!("Duration string cannot be empty"));
    }

    let mut total = Duration::zero();
    let mut rest = input.as_str();
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| {
                anyhow!(
                    "Duration '{}' is missing a unit. Use d (days), h (hours), m (minutes), or s (seconds)",
                    input
                )
            })?;
        let unit = rest[digits..]
            .chars()
            .next()
            .ok_or_else(|| anyhow!("Duration '{}' is missing a unit", input))?;
        if digits == 0 {
            return Err(anyhow!(
                "Invalid duration format: expected number before '{}'",
                unit
            ));
        }

        let amount: i64 = rest[..digits]
            .parse()
            .with_context(|| format!("Invalid number in duration: {}", &rest[..digits]))?;
        let part = unit_duration(amount, unit)?;
        total = total
            .checked_add(&part)
            .ok_or_else(|| anyhow!("Duration '{}' is too large", input))?;

        rest = &rest[digits + unit.len_utf8()..];
    }

    if total <= Duration::zero() {
        return Err(anyhow!("Duration must be greater than zero"));
    }

    Ok(total)
}

fn unit_duration(amount: i64, unit: char) -> Result<Duration> {
    let part = match unit {
        'd' => Duration::try_days(amount),
        'h' => Duration::try_hours(amount),
        'm' => Duration::try_minutes(amount),
        's' => Duration::try_seconds(amount),
        _ => return Err(anyhow!("Unknown duration unit: '{}'. Use d, h, m, or s", unit)),
    };
    part.ok_or_else(|| anyhow!("Duration '{}{}' is too large", amount, unit))
}

/// Parses a duration string into a `std::time::Duration`.
pub fn parse_std_duration(s: &str) -> Result<std::time::Duration> {
    parse_duration(s)?
        .to_std()
        .with_context(|| format!("Duration out of range: '{}'", s))
}
