// Raffle program - instruction processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    config::RaffleConfig,
    error::RaffleError,
    instruction::RaffleInstruction,
    machine::{Effects, Payout, PrizeVault, RaffleMachine},
    oracle::{coordinator_authority, CoordinatorCpi, RandomWord},
    state::Raffle,
    utils,
};

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { config } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(program_id, accounts, config)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts, &check_data)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts, &perform_data)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, &random_words)
            }
        }
    }

    fn process_initialize_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        config: RaffleConfig,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        config.validate()?;

        let (expected_raffle, bump) = utils::find_raffle_address(program_id, authority_info.key);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidSeeds);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        let bump_seed = [bump];
        let seeds = Raffle::signer_seeds(authority_info.key, &bump_seed);
        invoke_signed(
            &system_instruction::create_account(
                authority_info.key,
                raffle_info.key,
                rent.minimum_balance(Raffle::LEN),
                Raffle::LEN as u64,
                program_id,
            ),
            &[
                authority_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[&seeds[..]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(*authority_info.key, bump, config, now);
        raffle.save(raffle_info)?;

        msg!(
            "Raffle initialized: EntranceFee={} SOL, Interval={}s, Coordinator={}",
            utils::lamports_to_sol(config.entrance_fee),
            config.interval,
            config.vrf_coordinator
        );
        Ok(())
    }

    fn process_enter_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut machine = RaffleMachine::new(Raffle::load(raffle_info)?);
        let effects = machine.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        machine.raffle().save(raffle_info)?;
        emit(&effects);
        Ok(())
    }

    fn process_check_upkeep(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        check_data: &[u8],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let machine = RaffleMachine::new(Raffle::load(raffle_info)?);
        let check = machine.check_upkeep(Clock::get()?.unix_timestamp);
        msg!(
            "Upkeep needed: {} ({:?}, {} bytes of check data)",
            check.upkeep_needed,
            check.status,
            check_data.len()
        );

        let data = check
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        perform_data: &[u8],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let forwarded = account_info_iter.as_slice();

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(raffle_info)?;
        if *coordinator_info.key != raffle.config.vrf_coordinator {
            msg!("Coordinator {} is not the configured one", coordinator_info.key);
            return Err(RaffleError::CoordinatorMismatch.into());
        }

        let authority = raffle.authority;
        let bump_seed = [raffle.bump];
        let seeds = Raffle::signer_seeds(&authority, &bump_seed);
        let mut oracle = CoordinatorCpi {
            coordinator_program: coordinator_info,
            consumer: raffle_info,
            forwarded,
            consumer_seeds: &seeds[..],
        };

        let mut machine = RaffleMachine::new(raffle);
        let effects =
            machine.perform_upkeep(Clock::get()?.unix_timestamp, perform_data, &mut oracle)?;

        machine.raffle().save(raffle_info)?;
        emit(&effects);
        Ok(())
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[RandomWord],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let candidates = account_info_iter.as_slice();

        if !authority_info.is_signer {
            msg!("Coordinator authority must sign the callback");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(raffle_info)?;
        let (expected_authority, _) = coordinator_authority(&raffle.config.vrf_coordinator);
        if *authority_info.key != expected_authority {
            msg!("Callback signer {} is not the coordinator", authority_info.key);
            return Err(RaffleError::UnauthorizedFulfiller.into());
        }

        let mut vault = LamportVault {
            raffle_info,
            candidates,
        };
        let mut machine = RaffleMachine::new(raffle);
        let effects = machine.fulfill_random_words(
            request_id,
            random_words,
            Clock::get()?.unix_timestamp,
            &mut vault,
        )?;

        machine.raffle().save(raffle_info)?;
        emit(&effects);
        Ok(())
    }
}

/// Pays the pool out of the raffle account's lamports
struct LamportVault<'a, 'b> {
    raffle_info: &'b AccountInfo<'a>,
    candidates: &'b [AccountInfo<'a>],
}

impl<'a, 'b> PrizeVault for LamportVault<'a, 'b> {
    fn pay(&mut self, payout: &Payout) -> Result<(), RaffleError> {
        let winner_info = self
            .candidates
            .iter()
            .find(|candidate| *candidate.key == payout.winner)
            .ok_or_else(|| {
                msg!("Winner account {} was not supplied", payout.winner);
                RaffleError::PayoutFailed
            })?;
        if !winner_info.is_writable {
            msg!("Winner account {} is not writable", payout.winner);
            return Err(RaffleError::PayoutFailed);
        }

        let remaining = self
            .raffle_info
            .lamports()
            .checked_sub(payout.amount)
            .ok_or(RaffleError::PayoutFailed)?;
        let credited = winner_info
            .lamports()
            .checked_add(payout.amount)
            .ok_or(RaffleError::PayoutFailed)?;

        **self
            .raffle_info
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = remaining;
        **winner_info
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = credited;

        msg!(
            "Paid {} SOL to {}",
            utils::lamports_to_sol(payout.amount),
            payout.winner
        );
        Ok(())
    }
}

fn emit(effects: &Effects) {
    for event in &effects.events {
        event.emit();
    }
}
