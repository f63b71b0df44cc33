use log::{error, info};
use solana_sdk::signature::{read_keypair_file, Keypair};

use crate::error::BotError;

pub fn setup_logging() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .level_for("solana_client", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;
    info!("Logging initialized.");
    Ok(())
}

pub fn load_keypair(path: &str) -> Result<Keypair, BotError> {
    match read_keypair_file(path) {
        Ok(kp) => {
            info!("Successfully loaded keypair from: {}", path);
            Ok(kp)
        }
        Err(e) => {
            let error_msg = format!("Failed to load keypair from path '{}': {}", path, e);
            error!("{}", error_msg);
            Err(BotError::ConfigError(error_msg))
        }
    }
}

/// Converts a UI amount to smallest units using the token's decimals.
pub fn to_smallest_units(amount_ui: f64, decimals: u8) -> u64 {
    (amount_ui * 10f64.powi(decimals as i32)).round() as u64
}

/// Converts a smallest-unit amount (possibly negative) to UI units.
pub fn to_ui_amount(amount_units: i64, decimals: u8) -> f64 {
    amount_units as f64 / 10f64.powi(decimals as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smallest_unit_conversion() {
        assert_eq!(to_smallest_units(0.1, 9), 100_000_000);
        assert_eq!(to_smallest_units(13.0, 6), 13_000_000);
        assert_eq!(to_smallest_units(0.0, 9), 0);
    }

    #[test]
    fn test_ui_amount_conversion() {
        assert!((to_ui_amount(500_000, 9) - 0.0005).abs() < 1e-12);
        assert!((to_ui_amount(-1_000_000_000, 9) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_conversion_is_stable() {
        let units = to_smallest_units(0.123_456_789, 9);
        assert_eq!(units, 123_456_789);
        assert!((to_ui_amount(units as i64, 9) - 0.123_456_789).abs() < 1e-12);
    }
}
