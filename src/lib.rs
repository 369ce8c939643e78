// Automated raffle drawing its winner from a VRF coordinator

pub mod config;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

// Raffle core
pub mod eligibility;
pub mod gateway;
pub mod invariants;
pub mod ledger;
pub mod machine;
pub mod resolver;

// Randomness coordinator interface and a local stand-in
pub mod mock_coordinator;
pub mod oracle;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
