// Invariant checks run before every committed transition

use solana_program::msg;

use crate::{
    error::RaffleError,
    state::{Raffle, RaffleState, MAX_PLAYERS},
};

/// Check all invariants. Returns Err if any violated.
pub fn check_invariants(raffle: &Raffle) -> Result<(), RaffleError> {
    // PendingIffCalculating
    if raffle.pending_request.is_some() != (raffle.state == RaffleState::Calculating) {
        return violated("PendingIffCalculating");
    }

    // EmptyRoundHoldsNothing
    if raffle.players.is_empty() != (raffle.balance == 0) {
        return violated("EmptyRoundHoldsNothing");
    }

    // BalanceCoversFees
    let minimum = (raffle.players.len() as u64)
        .checked_mul(raffle.config.entrance_fee)
        .ok_or(RaffleError::Overflow)?;
    if raffle.balance < minimum {
        return violated("BalanceCoversFees");
    }

    // DrawHasPlayers
    if raffle.state == RaffleState::Calculating && raffle.players.is_empty() {
        return violated("DrawHasPlayers");
    }

    if raffle.players.len() > MAX_PLAYERS {
        return violated("PlayerCapacity");
    }

    Ok(())
}

fn violated(name: &str) -> Result<(), RaffleError> {
    msg!("Invariant violated: {}", name);
    Err(RaffleError::InvariantViolation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RaffleConfig, state::PendingRequest};
    use solana_program::pubkey::Pubkey;

    fn raffle() -> Raffle {
        let config = RaffleConfig::for_network("localnet", Pubkey::new_unique(), 1).unwrap();
        Raffle::new(Pubkey::new_unique(), 255, config, 0)
    }

    #[test]
    fn fresh_raffle_holds() {
        assert!(check_invariants(&raffle()).is_ok());
    }

    #[test]
    fn pending_request_requires_calculating() {
        let mut raffle = raffle();
        raffle.players.push(Pubkey::new_unique());
        raffle.balance = raffle.config.entrance_fee;
        raffle.pending_request = Some(PendingRequest {
            request_id: 1,
            requested_at: 0,
        });
        assert_eq!(check_invariants(&raffle), Err(RaffleError::InvariantViolation));

        raffle.state = RaffleState::Calculating;
        assert!(check_invariants(&raffle).is_ok());

        raffle.pending_request = None;
        assert_eq!(check_invariants(&raffle), Err(RaffleError::InvariantViolation));
    }

    #[test]
    fn balance_must_match_players() {
        let mut raffle = raffle();
        raffle.balance = 1;
        assert_eq!(check_invariants(&raffle), Err(RaffleError::InvariantViolation));

        raffle.players.push(Pubkey::new_unique());
        raffle.balance = raffle.config.entrance_fee - 1;
        assert_eq!(check_invariants(&raffle), Err(RaffleError::InvariantViolation));
    }
}
