// Local VRF coordinator for tests and localnet. Its words are predictable.

use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    keccak, msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};
use thiserror::Error;

use crate::{
    instruction,
    oracle::{coordinator_authority, RandomWord, RandomnessRequest, COORDINATOR_AUTHORITY_SEED},
};

pub const STATE_SEED: &[u8] = b"coordinator-state";
pub const MAX_OPEN_REQUESTS: usize = 8;
pub const MAX_NUM_WORDS: u32 = 10;
/// Offset keeping coordinator error codes apart from the raffle's
pub const ERROR_CODE_BASE: u32 = 1_000;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Invalid coordinator instruction")]
    InvalidInstruction,
    #[error("Coordinator already initialized")]
    AlreadyInitialized,
    #[error("nonexistent request")]
    NonexistentRequest,
    #[error("Too many open requests")]
    TooManyOpenRequests,
    #[error("Number of words out of range")]
    InvalidNumWords,
    #[error("Account does not match the request")]
    AccountMismatch,
}

impl From<CoordinatorError> for ProgramError {
    fn from(e: CoordinatorError) -> Self {
        ProgramError::Custom(ERROR_CODE_BASE + e as u32)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum MockCoordinatorInstruction {
    /// Same encoding as `CoordinatorInstruction::RequestRandomWords`
    ///
    /// Accounts expected:
    /// 0. `[signer]` The consumer account
    /// 1. `[writable]` The coordinator state account
    RequestRandomWords(RandomnessRequest),

    /// Accounts expected:
    /// 0. `[signer, writable]` The payer
    /// 1. `[writable]` The coordinator state account (PDA of `["coordinator-state"]`)
    /// 2. `[]` The system program
    Initialize,

    /// Deliver words for an open request
    ///
    /// Accounts expected:
    /// 0. `[writable]` The coordinator state account
    /// 1. `[]` The coordinator authority PDA
    /// 2. `[writable]` The consumer account
    /// 3. `[]` The consumer program
    /// 4.. Accounts forwarded to the consumer callback
    FulfillRandomWords { request_id: u64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestSlot {
    pub in_use: bool,
    pub request_id: u64,
    pub consumer: Pubkey,
    pub consumer_program: Pubkey,
    pub num_words: u32,
}

impl RequestSlot {
    const LEN: usize = 1 + 8 + 32 + 32 + 4;

    fn unpack(src: &[u8; RequestSlot::LEN]) -> Self {
        let (in_use, request_id, consumer, consumer_program, num_words) =
            array_refs![src, 1, 8, 32, 32, 4];
        Self {
            in_use: in_use[0] != 0,
            request_id: u64::from_le_bytes(*request_id),
            consumer: Pubkey::new_from_array(*consumer),
            consumer_program: Pubkey::new_from_array(*consumer_program),
            num_words: u32::from_le_bytes(*num_words),
        }
    }

    fn pack(&self, dst: &mut [u8; RequestSlot::LEN]) {
        let (in_use_dst, request_id_dst, consumer_dst, consumer_program_dst, num_words_dst) =
            mut_array_refs![dst, 1, 8, 32, 32, 4];
        in_use_dst[0] = self.in_use as u8;
        *request_id_dst = self.request_id.to_le_bytes();
        consumer_dst.copy_from_slice(self.consumer.as_ref());
        consumer_program_dst.copy_from_slice(self.consumer_program.as_ref());
        *num_words_dst = self.num_words.to_le_bytes();
    }
}

const SLOTS_LEN: usize = RequestSlot::LEN * MAX_OPEN_REQUESTS;

/// Coordinator state account data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinatorState {
    pub is_initialized: bool,
    pub next_request_id: u64,
    pub slots: [RequestSlot; MAX_OPEN_REQUESTS],
}

impl Sealed for CoordinatorState {}

impl IsInitialized for CoordinatorState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for CoordinatorState {
    const LEN: usize = 1 + 8 + SLOTS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, CoordinatorState::LEN];
        let (is_initialized, next_request_id, slots_src) = array_refs![src, 1, 8, SLOTS_LEN];

        let mut slots = [RequestSlot::default(); MAX_OPEN_REQUESTS];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = RequestSlot::unpack(array_ref![
                slots_src,
                i * RequestSlot::LEN,
                RequestSlot::LEN
            ]);
        }

        Ok(CoordinatorState {
            is_initialized: is_initialized[0] != 0,
            next_request_id: u64::from_le_bytes(*next_request_id),
            slots,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, CoordinatorState::LEN];
        let (is_initialized_dst, next_request_id_dst, slots_dst) =
            mut_array_refs![dst, 1, 8, SLOTS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        *next_request_id_dst = self.next_request_id.to_le_bytes();
        for (i, slot) in self.slots.iter().enumerate() {
            slot.pack(array_mut_ref![
                slots_dst,
                i * RequestSlot::LEN,
                RequestSlot::LEN
            ]);
        }
    }
}

impl CoordinatorState {
    /// Opens a slot for `consumer` and returns the new request id.
    pub fn open_request(
        &mut self,
        consumer: Pubkey,
        consumer_program: Pubkey,
        num_words: u32,
    ) -> Result<u64, CoordinatorError> {
        if num_words == 0 || num_words > MAX_NUM_WORDS {
            return Err(CoordinatorError::InvalidNumWords);
        }
        let request_id = self.next_request_id;
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| !slot.in_use)
            .ok_or(CoordinatorError::TooManyOpenRequests)?;
        *slot = RequestSlot {
            in_use: true,
            request_id,
            consumer,
            consumer_program,
            num_words,
        };
        self.next_request_id = request_id + 1;
        Ok(request_id)
    }

    /// Removes and returns the open request `request_id`.
    pub fn take_request(&mut self, request_id: u64) -> Result<RequestSlot, CoordinatorError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.in_use && slot.request_id == request_id)
            .ok_or(CoordinatorError::NonexistentRequest)?;
        let taken = *slot;
        *slot = RequestSlot::default();
        Ok(taken)
    }
}

/// Deterministic words for `request_id`
pub fn random_words(request_id: u64, num_words: u32) -> Vec<RandomWord> {
    (0..num_words as u64)
        .map(|i| keccak::hashv(&[&request_id.to_le_bytes()[..], &i.to_le_bytes()[..]]).to_bytes())
        .collect()
}

pub fn find_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STATE_SEED], program_id)
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = MockCoordinatorInstruction::try_from_slice(instruction_data)
        .map_err(|_| CoordinatorError::InvalidInstruction)?;

    match instruction {
        MockCoordinatorInstruction::Initialize => {
            msg!("Coordinator: Initialize");
            process_initialize(program_id, accounts)
        }
        MockCoordinatorInstruction::RequestRandomWords(request) => {
            msg!("Coordinator: Request Random Words");
            process_request_random_words(program_id, accounts, &request)
        }
        MockCoordinatorInstruction::FulfillRandomWords { request_id } => {
            msg!("Coordinator: Fulfill Random Words");
            process_fulfill_random_words(program_id, accounts, request_id)
        }
    }
}

fn process_initialize(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let payer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let system_program_info = next_account_info(account_info_iter)?;

    if !payer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    let (expected_state, bump) = find_state_address(program_id);
    if *state_info.key != expected_state {
        return Err(ProgramError::InvalidSeeds);
    }
    if state_info.owner == program_id {
        return Err(CoordinatorError::AlreadyInitialized.into());
    }

    let rent = Rent::get()?;
    invoke_signed(
        &system_instruction::create_account(
            payer_info.key,
            state_info.key,
            rent.minimum_balance(CoordinatorState::LEN),
            CoordinatorState::LEN as u64,
            program_id,
        ),
        &[
            payer_info.clone(),
            state_info.clone(),
            system_program_info.clone(),
        ],
        &[&[STATE_SEED, &[bump]]],
    )?;

    let state = CoordinatorState {
        is_initialized: true,
        next_request_id: 1,
        slots: [RequestSlot::default(); MAX_OPEN_REQUESTS],
    };
    CoordinatorState::pack(state, &mut state_info.data.borrow_mut())?;
    Ok(())
}

fn process_request_random_words(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    request: &RandomnessRequest,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let consumer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;

    if !consumer_info.is_signer {
        msg!("Consumer must sign the request");
        return Err(ProgramError::MissingRequiredSignature);
    }
    if state_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }

    let mut state = CoordinatorState::unpack(&state_info.data.borrow())?;
    let request_id =
        state.open_request(*consumer_info.key, *consumer_info.owner, request.num_words)?;
    CoordinatorState::pack(state, &mut state_info.data.borrow_mut())?;

    msg!(
        "RandomWordsRequested: request_id={} consumer={} subscription={} confirmations={}",
        request_id,
        consumer_info.key,
        request.subscription_id,
        request.request_confirmations
    );
    set_return_data(&request_id.to_le_bytes());
    Ok(())
}

fn process_fulfill_random_words(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    request_id: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let state_info = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let consumer_info = next_account_info(account_info_iter)?;
    let consumer_program_info = next_account_info(account_info_iter)?;
    let forwarded = account_info_iter.as_slice();

    if state_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }

    let mut state = CoordinatorState::unpack(&state_info.data.borrow())?;
    let slot = state.take_request(request_id)?;
    if slot.consumer != *consumer_info.key || slot.consumer_program != *consumer_program_info.key
    {
        return Err(CoordinatorError::AccountMismatch.into());
    }
    CoordinatorState::pack(state, &mut state_info.data.borrow_mut())?;

    let (authority, bump) = coordinator_authority(program_id);
    if *authority_info.key != authority {
        return Err(CoordinatorError::AccountMismatch.into());
    }

    let candidates: Vec<Pubkey> = forwarded.iter().map(|info| *info.key).collect();
    let callback = instruction::fulfill_random_words(
        consumer_program_info.key,
        &authority,
        consumer_info.key,
        &candidates,
        request_id,
        random_words(request_id, slot.num_words),
    );

    let mut infos = Vec::with_capacity(forwarded.len() + 3);
    infos.push(authority_info.clone());
    infos.push(consumer_info.clone());
    infos.extend(forwarded.iter().cloned());
    infos.push(consumer_program_info.clone());

    invoke_signed(&callback, &infos, &[&[COORDINATOR_AUTHORITY_SEED, &[bump]]])?;

    msg!("RandomWordsFulfilled: request_id={}", request_id);
    Ok(())
}

pub fn initialize(program_id: &Pubkey, payer: &Pubkey) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &MockCoordinatorInstruction::Initialize,
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(find_state_address(program_id).0, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Accounts a consumer forwards with its `RequestRandomWords` call
pub fn request_accounts(program_id: &Pubkey) -> Vec<AccountMeta> {
    vec![AccountMeta::new(find_state_address(program_id).0, false)]
}

pub fn fulfill_random_words(
    program_id: &Pubkey,
    consumer: &Pubkey,
    consumer_program: &Pubkey,
    forwarded: &[Pubkey],
    request_id: u64,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new(find_state_address(program_id).0, false),
        AccountMeta::new_readonly(coordinator_authority(program_id).0, false),
        AccountMeta::new(*consumer, false),
        AccountMeta::new_readonly(*consumer_program, false),
    ];
    accounts.extend(forwarded.iter().map(|key| AccountMeta::new(*key, false)));
    Instruction::new_with_borsh(
        *program_id,
        &MockCoordinatorInstruction::FulfillRandomWords { request_id },
        accounts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CoordinatorInstruction;

    fn empty_state() -> CoordinatorState {
        CoordinatorState {
            is_initialized: true,
            next_request_id: 1,
            slots: [RequestSlot::default(); MAX_OPEN_REQUESTS],
        }
    }

    #[test]
    fn request_encoding_matches_consumer_interface() {
        let request = RandomnessRequest {
            key_hash: [3; 32],
            subscription_id: 1,
            request_confirmations: 3,
            callback_compute_limit: 50_000,
            num_words: 1,
        };
        let consumer_side = CoordinatorInstruction::RequestRandomWords(request)
            .try_to_vec()
            .unwrap();
        assert_eq!(
            MockCoordinatorInstruction::try_from_slice(&consumer_side).unwrap(),
            MockCoordinatorInstruction::RequestRandomWords(request)
        );
    }

    #[test]
    fn ids_start_at_one_and_are_consumed_once() {
        let mut state = empty_state();
        let consumer = Pubkey::new_unique();
        let first = state.open_request(consumer, Pubkey::new_unique(), 1).unwrap();
        let second = state.open_request(consumer, Pubkey::new_unique(), 1).unwrap();
        assert_eq!((first, second), (1, 2));

        assert_eq!(state.take_request(first).unwrap().consumer, consumer);
        assert_eq!(
            state.take_request(first).unwrap_err(),
            CoordinatorError::NonexistentRequest
        );
        assert_eq!(
            state.take_request(0).unwrap_err(),
            CoordinatorError::NonexistentRequest
        );
    }

    #[test]
    fn rejects_when_slots_exhausted() {
        let mut state = empty_state();
        for _ in 0..MAX_OPEN_REQUESTS {
            state.open_request(Pubkey::new_unique(), Pubkey::new_unique(), 1).unwrap();
        }
        assert_eq!(
            state
                .open_request(Pubkey::new_unique(), Pubkey::new_unique(), 1)
                .unwrap_err(),
            CoordinatorError::TooManyOpenRequests
        );
    }

    #[test]
    fn state_survives_pack_round_trip() {
        let mut state = empty_state();
        state.open_request(Pubkey::new_unique(), Pubkey::new_unique(), 2).unwrap();
        let mut data = vec![0u8; CoordinatorState::LEN];
        CoordinatorState::pack(state, &mut data).unwrap();
        assert_eq!(CoordinatorState::unpack(&data).unwrap(), state);
    }

    #[test]
    fn words_are_deterministic_per_request() {
        assert_eq!(random_words(1, 2), random_words(1, 2));
        assert_ne!(random_words(1, 1), random_words(2, 1));
        assert_eq!(random_words(1, 3).len(), 3);
    }
}
