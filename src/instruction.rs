// Raffle program - instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::{config::RaffleConfig, error::RaffleError, oracle::RandomWord};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle account and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority paying for the raffle account
    /// 1. `[writable]` The raffle account (PDA of `["raffle", authority]`)
    /// 2. `[]` The system program
    InitializeRaffle { config: RaffleConfig },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw may be triggered, as return data (`UpkeepCheck`).
    /// Meant to be simulated; never mutates state.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Start a draw by requesting randomness from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The VRF coordinator program
    /// 3.. Accounts forwarded to the coordinator
    PerformUpkeep { perform_data: Vec<u8> },

    /// Coordinator callback delivering randomness
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority PDA
    /// 1. `[writable]` The raffle account
    /// 2.. `[writable]` Candidate winner accounts, one of which must be the winner
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, RaffleError> {
        Self::try_from_slice(input).map_err(|_| RaffleError::InvalidInstruction)
    }
}

pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    raffle: &Pubkey,
    config: RaffleConfig,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::InitializeRaffle { config },
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, raffle: &Pubkey, amount: u64) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::EnterRaffle { amount },
        vec![
            AccountMeta::new(*player, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

pub fn check_upkeep(program_id: &Pubkey, raffle: &Pubkey, check_data: Vec<u8>) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::CheckUpkeep { check_data },
        vec![AccountMeta::new_readonly(*raffle, false)],
    )
}

pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle: &Pubkey,
    vrf_coordinator: &Pubkey,
    coordinator_accounts: Vec<AccountMeta>,
    perform_data: Vec<u8>,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(*vrf_coordinator, false),
    ];
    accounts.extend(coordinator_accounts);
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::PerformUpkeep { perform_data },
        accounts,
    )
}

pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator_authority: &Pubkey,
    raffle: &Pubkey,
    candidates: &[Pubkey],
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*coordinator_authority, true),
        AccountMeta::new(*raffle, false),
    ];
    accounts.extend(candidates.iter().map(|candidate| AccountMeta::new(*candidate, false)));
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::FulfillRandomWords {
            request_id,
            random_words,
        },
        accounts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_what_builders_pack() {
        let program_id = Pubkey::new_unique();
        let ix = enter_raffle(&program_id, &Pubkey::new_unique(), &Pubkey::new_unique(), 42);
        assert_eq!(
            RaffleInstruction::unpack(&ix.data),
            Ok(RaffleInstruction::EnterRaffle { amount: 42 })
        );
    }

    #[test]
    fn rejects_unknown_tag() {
        assert_eq!(
            RaffleInstruction::unpack(&[9]),
            Err(RaffleError::InvalidInstruction)
        );
        assert_eq!(RaffleInstruction::unpack(&[]), Err(RaffleError::InvalidInstruction));
    }
}
