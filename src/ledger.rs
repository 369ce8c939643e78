// Entry ledger: players and pooled balance of the current round
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    machine::Effects,
    state::{Raffle, RaffleState, MAX_PLAYERS},
};

/// Records `player` paying `paid` lamports into the current round.
///
/// Overpayment is accepted and the whole amount joins the pool.
pub fn enter(raffle: &Raffle, player: Pubkey, paid: u64) -> Result<(Raffle, Effects), RaffleError> {
    if raffle.state != RaffleState::Open {
        msg!("Raffle is calculating, entries are closed");
        return Err(RaffleError::RoundNotOpen);
    }
    if paid < raffle.config.entrance_fee {
        msg!(
            "Entry of {} lamports is below the entrance fee of {}",
            paid,
            raffle.config.entrance_fee
        );
        return Err(RaffleError::InsufficientPayment);
    }
    if raffle.players.len() >= MAX_PLAYERS {
        return Err(RaffleError::RaffleFull);
    }

    let mut next = raffle.clone();
    next.balance = next
        .balance
        .checked_add(paid)
        .ok_or(RaffleError::Overflow)?;
    next.players.push(player);

    let index = participant_count(&next) - 1;
    let effects = Effects::event(RaffleEvent::EntryAccepted { player, index });
    Ok((next, effects))
}

pub fn participant_at(raffle: &Raffle, index: u64) -> Result<Pubkey, RaffleError> {
    usize::try_from(index)
        .ok()
        .and_then(|index| raffle.players.get(index))
        .copied()
        .ok_or(RaffleError::IndexOutOfRange)
}

pub fn participant_count(raffle: &Raffle) -> u64 {
    raffle.players.len() as u64
}

pub fn current_balance(raffle: &Raffle) -> u64 {
    raffle.balance
}
