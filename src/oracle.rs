// Interface to the external VRF coordinator
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    pubkey::Pubkey,
};

use crate::{config::RaffleConfig, config::NUM_WORDS, error::RaffleError};

/// Seed of the PDA a coordinator signs fulfillment callbacks with
pub const COORDINATOR_AUTHORITY_SEED: &[u8] = b"coordinator";

/// 256-bit random value, big-endian
pub type RandomWord = [u8; 32];

/// Routing parameters of a single randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn from_config(config: &RaffleConfig) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_compute_limit: config.callback_compute_limit,
            num_words: NUM_WORDS,
        }
    }
}

/// Instructions a coordinator must accept from consumers.
///
/// `RequestRandomWords` accounts:
/// 0. `[signer]` The consumer (raffle PDA)
/// 1.. Coordinator-specific accounts, forwarded as given
///
/// The coordinator answers with the request id as 8 little-endian bytes of return data
/// and later invokes the consumer's `FulfillRandomWords`, signed by its
/// [`COORDINATOR_AUTHORITY_SEED`] PDA.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    RequestRandomWords(RandomnessRequest),
}

/// Port through which a draw asks for randomness.
pub trait RandomnessOracle {
    /// Issues `request` and returns the coordinator-assigned request id.
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError>;
}

/// Address that must sign fulfillments coming from `coordinator_program`
pub fn coordinator_authority(coordinator_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_AUTHORITY_SEED], coordinator_program)
}

pub fn decode_request_id(data: &[u8]) -> Option<u64> {
    data.get(..8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
}

/// Issues requests by invoking the coordinator program, the raffle PDA signing as consumer.
pub struct CoordinatorCpi<'a, 'b> {
    pub coordinator_program: &'b AccountInfo<'a>,
    pub consumer: &'b AccountInfo<'a>,
    pub forwarded: &'b [AccountInfo<'a>],
    pub consumer_seeds: &'b [&'b [u8]],
}

impl<'a, 'b> RandomnessOracle for CoordinatorCpi<'a, 'b> {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        let mut metas = vec![AccountMeta::new_readonly(*self.consumer.key, true)];
        metas.extend(self.forwarded.iter().map(|info| {
            if info.is_writable {
                AccountMeta::new(*info.key, info.is_signer)
            } else {
                AccountMeta::new_readonly(*info.key, info.is_signer)
            }
        }));
        let instruction = Instruction::new_with_borsh(
            *self.coordinator_program.key,
            &CoordinatorInstruction::RequestRandomWords(*request),
            metas,
        );

        let mut infos = Vec::with_capacity(self.forwarded.len() + 2);
        infos.push(self.consumer.clone());
        infos.extend(self.forwarded.iter().cloned());
        infos.push(self.coordinator_program.clone());

        invoke_signed(&instruction, &infos, &[self.consumer_seeds]).map_err(|e| {
            msg!("Coordinator rejected the randomness request: {}", e);
            RaffleError::OracleRequestFailed
        })?;

        match get_return_data() {
            Some((program_id, data)) if program_id == *self.coordinator_program.key => {
                decode_request_id(&data).ok_or(RaffleError::OracleRequestFailed)
            }
            _ => {
                msg!("Coordinator returned no request id");
                Err(RaffleError::OracleRequestFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_config_routing() {
        let config = RaffleConfig::for_network("devnet", Pubkey::new_unique(), 9713).unwrap();
        let request = RandomnessRequest::from_config(&config);
        assert_eq!(request.key_hash, config.key_hash);
        assert_eq!(request.subscription_id, 9713);
        assert_eq!(request.request_confirmations, config.request_confirmations);
        assert_eq!(request.callback_compute_limit, config.callback_compute_limit);
        assert_eq!(request.num_words, 1);
    }

    #[test]
    fn decodes_little_endian_request_id() {
        assert_eq!(decode_request_id(&7u64.to_le_bytes()), Some(7));
        assert_eq!(decode_request_id(&[1, 2, 3]), None);
    }
}
