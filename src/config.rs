use std::{env, fmt::Display, str::FromStr};

use chrono::{FixedOffset, Offset, Utc};

use crate::{pricing::NegativePricePolicy, schedule::BusinessHours};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/salon.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Salon local time, used for calendar-day queries and slot generation.
    pub utc_offset: FixedOffset,
    pub hours: BusinessHours,
    pub negative_price: NegativePricePolicy,
    /// Rows kept in the activity log; older rows are pruned on insert.
    pub activity_retention: u32,
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            utc_offset: utc(),
            hours: BusinessHours::default(),
            negative_price: NegativePricePolicy::Allow,
            activity_retention: 500,
            seed: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or invalid keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let offset_minutes: i32 = load(&lookup, "SALON_UTC_OFFSET_MINUTES", 0);
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!("SALON_UTC_OFFSET_MINUTES={offset_minutes} is out of range, using UTC");
                utc()
            });

        let open: u32 = load(&lookup, "SALON_OPEN_HOUR", defaults.hours.open_hour);
        let close: u32 = load(&lookup, "SALON_CLOSE_HOUR", defaults.hours.close_hour);
        let hours = BusinessHours::new(open, close).unwrap_or_else(|| {
            log::warn!("Business hours {open}..{close} are invalid, using defaults");
            defaults.hours.clone()
        });

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: load(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            utc_offset,
            hours,
            negative_price: load(&lookup, "SALON_NEGATIVE_PRICE", defaults.negative_price),
            activity_retention: load(
                &lookup,
                "SALON_ACTIVITY_RETENTION",
                defaults.activity_retention,
            ),
            seed: load(&lookup, "SALON_SEED", defaults.seed),
        }
    }
}

fn load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|err| {
        log::warn!("Invalid {key} value {raw:?}: {err}; using default");
        default
    })
}

fn utc() -> FixedOffset {
    Utc.fix()
}
