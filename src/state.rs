// Raffle account state
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{config::RaffleConfig, error::RaffleError};

/// Players a single raffle account can hold per round
pub const MAX_PLAYERS: usize = 64;

pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries, a draw may be triggered
    Open,
    /// Waiting for the coordinator to deliver randomness
    Calculating,
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// The single outstanding randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    /// Coordinator-assigned id
    pub request_id: u64,
    pub requested_at: UnixTimestamp,
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    pub is_initialized: bool,
    /// Bump of the raffle PDA
    pub bump: u8,
    /// Account that created the raffle (PDA seed only, holds no privileges)
    pub authority: Pubkey,
    pub config: RaffleConfig,
    pub state: RaffleState,
    /// Players of the current round in entry order
    pub players: Vec<Pubkey>,
    /// Lamports paid in by the current round
    pub balance: u64,
    /// Start of the current round
    pub last_timestamp: UnixTimestamp,
    pub pending_request: Option<PendingRequest>,
    pub recent_winner: Option<Pubkey>,
    /// Number of draws resolved so far
    pub round: u64,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    pub const LEN: usize = 1
        + 1
        + 32
        + RaffleConfig::LEN
        + 1
        + (4 + 32 * MAX_PLAYERS)
        + 8
        + 8
        + (1 + 8 + 8)
        + (1 + 32)
        + 8;

    /// Fresh raffle, open with an empty ledger starting at `now`
    pub fn new(authority: Pubkey, bump: u8, config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            bump,
            authority,
            config,
            state: RaffleState::Open,
            players: Vec::new(),
            balance: 0,
            last_timestamp: now,
            pending_request: None,
            recent_winner: None,
            round: 0,
        }
    }

    /// Loads an initialized raffle. Trailing bytes of the fixed-size account are ignored.
    pub fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.try_borrow_data()?;
        let raffle = Self::deserialize(&mut &data[..]).map_err(|_| {
            msg!("Raffle account data could not be decoded");
            ProgramError::InvalidAccountData
        })?;
        if !raffle.is_initialized() {
            msg!("Raffle account is not initialized");
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }

    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        let bytes = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        let mut data = account.try_borrow_mut_data()?;
        if bytes.len() > data.len() {
            msg!("Raffle account too small: need {} bytes", bytes.len());
            return Err(ProgramError::AccountDataTooSmall);
        }
        data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn signer_seeds<'a>(authority: &'a Pubkey, bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
        [RAFFLE_SEED, authority.as_ref(), bump]
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    /// 0 = open, 1 = calculating
    pub fn raffle_state(&self) -> u8 {
        self.state.into()
    }

    pub fn player(&self, index: u64) -> Result<Pubkey, RaffleError> {
        crate::ledger::participant_at(self, index)
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn number_of_players(&self) -> u64 {
        crate::ledger::participant_count(self)
    }

    pub fn num_words(&self) -> u32 {
        crate::config::NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        self.config.request_confirmations
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request.map(|pending| pending.request_id)
    }
}
