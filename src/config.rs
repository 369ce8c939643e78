// Raffle configuration and per-network defaults
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::error::RaffleError;

/// 0.01 SOL in lamports
pub const DEFAULT_ENTRANCE_FEE: u64 = 10_000_000;
/// Seconds between draws
pub const DEFAULT_INTERVAL: u64 = 30;
pub const DEFAULT_CALLBACK_COMPUTE_LIMIT: u32 = 50_000;
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
/// Gas lane selecting the coordinator's proving key
pub const DEFAULT_KEY_HASH: [u8; 32] = [
    0xd8, 0x9b, 0x2b, 0xf1, 0x50, 0xe3, 0xb9, 0xe1, 0x34, 0x46, 0x98, 0x6e, 0x57, 0x1f, 0xb9,
    0xca, 0xb2, 0x4b, 0x13, 0xce, 0xa0, 0xa4, 0x3e, 0xa2, 0x0a, 0x60, 0x49, 0xa8, 0x5c, 0xc8,
    0x07, 0xcc,
];

pub const MIN_REQUEST_CONFIRMATIONS: u16 = 1;
pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;
/// Upper bound of a single Solana transaction's compute budget
pub const MAX_CALLBACK_COMPUTE_LIMIT: u32 = 1_400_000;
/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Parameters fixed for the lifetime of a raffle account
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum lamports per entry
    pub entrance_fee: u64,
    /// Minimum seconds between round start and a draw
    pub interval: u64,
    /// Coordinator key hash (gas lane)
    pub key_hash: [u8; 32],
    /// Funded coordinator subscription
    pub subscription_id: u64,
    /// Confirmations the coordinator waits before answering
    pub request_confirmations: u16,
    /// Compute units reserved for the fulfillment callback
    pub callback_compute_limit: u32,
    /// Program id of the VRF coordinator
    pub vrf_coordinator: Pubkey,
}

impl RaffleConfig {
    pub const LEN: usize = 8 + 8 + 32 + 8 + 2 + 4 + 32;

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 {
            msg!("Entrance fee must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        if self.interval == 0 || self.interval > i64::MAX as u64 {
            msg!("Interval must be a positive number of seconds");
            return Err(RaffleError::InvalidConfig);
        }
        if !(MIN_REQUEST_CONFIRMATIONS..=MAX_REQUEST_CONFIRMATIONS)
            .contains(&self.request_confirmations)
        {
            msg!(
                "Request confirmations must be within {}..={}",
                MIN_REQUEST_CONFIRMATIONS,
                MAX_REQUEST_CONFIRMATIONS
            );
            return Err(RaffleError::InvalidConfig);
        }
        if self.callback_compute_limit == 0
            || self.callback_compute_limit > MAX_CALLBACK_COMPUTE_LIMIT
        {
            msg!("Callback compute limit out of range");
            return Err(RaffleError::InvalidConfig);
        }
        if self.vrf_coordinator == Pubkey::default() {
            msg!("VRF coordinator must be set");
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }

    /// Builds the configuration for a known network name.
    pub fn for_network(
        network: &str,
        vrf_coordinator: Pubkey,
        subscription_id: u64,
    ) -> Option<Self> {
        NETWORK_PRESETS
            .iter()
            .find(|preset| preset.name == network)
            .map(|preset| Self {
                entrance_fee: preset.entrance_fee,
                interval: preset.interval,
                key_hash: preset.key_hash,
                subscription_id,
                request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
                callback_compute_limit: preset.callback_compute_limit,
                vrf_coordinator,
            })
    }
}

pub struct NetworkPreset {
    pub name: &'static str,
    pub entrance_fee: u64,
    pub key_hash: [u8; 32],
    pub callback_compute_limit: u32,
    pub interval: u64,
}

pub const NETWORK_PRESETS: [NetworkPreset; 2] = [
    NetworkPreset {
        name: "devnet",
        entrance_fee: DEFAULT_ENTRANCE_FEE,
        key_hash: DEFAULT_KEY_HASH,
        callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
        interval: DEFAULT_INTERVAL,
    },
    NetworkPreset {
        name: "localnet",
        entrance_fee: DEFAULT_ENTRANCE_FEE,
        key_hash: DEFAULT_KEY_HASH,
        callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
        interval: DEFAULT_INTERVAL,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn localnet() -> RaffleConfig {
        RaffleConfig::for_network("localnet", Pubkey::new_unique(), 1).unwrap()
    }

    #[test]
    fn presets_produce_valid_configs() {
        for preset in NETWORK_PRESETS.iter() {
            let config = RaffleConfig::for_network(preset.name, Pubkey::new_unique(), 7).unwrap();
            assert_eq!(config.subscription_id, 7);
            assert!(config.validate().is_ok());
        }
        assert!(RaffleConfig::for_network("mainnet", Pubkey::new_unique(), 1).is_none());
    }

    #[test]
    fn rejects_zero_fee_and_interval() {
        let mut config = localnet();
        config.entrance_fee = 0;
        assert_eq!(config.validate(), Err(RaffleError::InvalidConfig));

        let mut config = localnet();
        config.interval = 0;
        assert_eq!(config.validate(), Err(RaffleError::InvalidConfig));
    }

    #[test]
    fn rejects_out_of_range_oracle_parameters() {
        let mut config = localnet();
        config.request_confirmations = 0;
        assert_eq!(config.validate(), Err(RaffleError::InvalidConfig));

        let mut config = localnet();
        config.callback_compute_limit = MAX_CALLBACK_COMPUTE_LIMIT + 1;
        assert_eq!(config.validate(), Err(RaffleError::InvalidConfig));

        let mut config = localnet();
        config.vrf_coordinator = Pubkey::default();
        assert_eq!(config.validate(), Err(RaffleError::InvalidConfig));
    }

    #[test]
    fn encoded_length_matches_len() {
        let bytes = localnet().try_to_vec().unwrap();
        assert_eq!(bytes.len(), RaffleConfig::LEN);
    }
}
