// Randomness request gateway: moves an eligible round into a draw
use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    eligibility,
    error::RaffleError,
    events::RaffleEvent,
    machine::Effects,
    oracle::{RandomnessOracle, RandomnessRequest},
    state::{PendingRequest, Raffle, RaffleState},
};

/// Starts a draw if the round is eligible at `now`.
///
/// Eligibility is re-evaluated here whatever the caller observed when probing, and
/// `perform_data` is only logged. The round is closed before the oracle is asked, so no
/// entry can slip in between the request and its fulfillment.
pub fn trigger_draw<O: RandomnessOracle>(
    raffle: &Raffle,
    now: UnixTimestamp,
    perform_data: &[u8],
    oracle: &mut O,
) -> Result<(Raffle, Effects), RaffleError> {
    let status = eligibility::check_upkeep(raffle, now);
    if !status.needed() {
        msg!(
            "Upkeep not needed: balance={} players={} state={}",
            raffle.balance,
            raffle.players.len(),
            raffle.raffle_state()
        );
        return Err(RaffleError::UpkeepNotNeeded);
    }
    msg!("Performing upkeep with {} bytes of perform data", perform_data.len());

    let mut next = raffle.clone();
    next.state = RaffleState::Calculating;

    let request = RandomnessRequest::from_config(&next.config);
    let request_id = oracle.request_random_words(&request)?;
    next.pending_request = Some(PendingRequest {
        request_id,
        requested_at: now,
    });

    let effects = Effects::event(RaffleEvent::DrawRequested {
        request_id,
        round: next.round,
    });
    Ok((next, effects))
}
