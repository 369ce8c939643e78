// Draw resolver: turns a fulfillment into a winner and a fresh round
use solana_program::{clock::UnixTimestamp, msg};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    ledger,
    machine::{Effects, Payout},
    oracle::RandomWord,
    state::{Raffle, RaffleState},
    utils,
};

/// Picks the winner for `request_id` and resets the ledger.
///
/// The returned effects carry the payout; the caller must apply it before committing.
pub fn fulfill(
    raffle: &Raffle,
    request_id: u64,
    random_words: &[RandomWord],
    now: UnixTimestamp,
) -> Result<(Raffle, Effects), RaffleError> {
    let pending = match (raffle.state, raffle.pending_request) {
        (RaffleState::Calculating, Some(pending)) if pending.request_id == request_id => pending,
        _ => {
            msg!(
                "Fulfillment for request {} does not match pending request {:?}",
                request_id,
                raffle.pending_request_id()
            );
            return Err(RaffleError::UnknownRequest);
        }
    };
    let word = random_words.first().ok_or(RaffleError::MissingRandomWords)?;

    let count = ledger::participant_count(raffle);
    if count == 0 {
        return Err(RaffleError::InvariantViolation);
    }
    let index = utils::reduce_word(word, count);
    let winner = ledger::participant_at(raffle, index)?;
    let amount = ledger::current_balance(raffle);
    msg!(
        "Request {} (issued at {}) picked index {} of {}",
        pending.request_id,
        pending.requested_at,
        index,
        count
    );

    let mut next = raffle.clone();
    next.players.clear();
    next.balance = 0;
    next.last_timestamp = now;
    next.state = RaffleState::Open;
    next.pending_request = None;
    next.recent_winner = Some(winner);
    next.round = next.round.checked_add(1).ok_or(RaffleError::Overflow)?;

    let effects = Effects {
        events: vec![RaffleEvent::WinnerSelected {
            winner,
            amount,
            round: raffle.round,
        }],
        payout: Some(Payout { winner, amount }),
    };
    Ok((next, effects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RaffleConfig, state::PendingRequest, utils::word_from_u64};
    use solana_program::pubkey::Pubkey;

    fn calculating_raffle(players: &[Pubkey]) -> Raffle {
        let config = RaffleConfig::for_network("localnet", Pubkey::new_unique(), 1).unwrap();
        let mut raffle = Raffle::new(Pubkey::new_unique(), 255, config, 0);
        for player in players {
            raffle = ledger::enter(&raffle, *player, config.entrance_fee).unwrap().0;
        }
        raffle.state = RaffleState::Calculating;
        raffle.pending_request = Some(PendingRequest {
            request_id: 5,
            requested_at: 40,
        });
        raffle
    }

    #[test]
    fn picks_word_mod_count_and_resets() {
        let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let raffle = calculating_raffle(&players);
        let pool = raffle.balance;

        let (next, effects) = fulfill(&raffle, 5, &[word_from_u64(4 * 1_000 + 2)], 100).unwrap();

        assert_eq!(
            effects.payout,
            Some(Payout {
                winner: players[2],
                amount: pool
            })
        );
        assert!(next.players.is_empty());
        assert_eq!(next.balance, 0);
        assert_eq!(next.state, RaffleState::Open);
        assert_eq!(next.pending_request, None);
        assert_eq!(next.recent_winner, Some(players[2]));
        assert_eq!(next.last_timestamp, 100);
        assert_eq!(next.round, 1);
    }

    #[test]
    fn rejects_mismatched_request() {
        let raffle = calculating_raffle(&[Pubkey::new_unique()]);
        assert_eq!(
            fulfill(&raffle, 6, &[word_from_u64(1)], 100).unwrap_err(),
            RaffleError::UnknownRequest
        );
    }

    #[test]
    fn rejects_fulfillment_while_open() {
        let mut raffle = calculating_raffle(&[Pubkey::new_unique()]);
        raffle.state = RaffleState::Open;
        raffle.pending_request = None;
        assert_eq!(
            fulfill(&raffle, 5, &[word_from_u64(1)], 100).unwrap_err(),
            RaffleError::UnknownRequest
        );
    }

    #[test]
    fn rejects_empty_words() {
        let raffle = calculating_raffle(&[Pubkey::new_unique()]);
        assert_eq!(
            fulfill(&raffle, 5, &[], 100).unwrap_err(),
            RaffleError::MissingRandomWords
        );
    }
}
