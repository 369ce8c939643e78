// Draw eligibility, evaluated without touching state
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::{
    ledger,
    state::{Raffle, RaffleState},
};

/// Outcome of each condition a draw requires
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    pub fn needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Return data of the `CheckUpkeep` instruction
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    /// Opaque payload handed back to `PerformUpkeep`; never trusted there
    pub perform_data: Vec<u8>,
    pub status: UpkeepStatus,
}

pub fn check_upkeep(raffle: &Raffle, now: UnixTimestamp) -> UpkeepStatus {
    let elapsed = now.checked_sub(raffle.last_timestamp).unwrap_or(-1);
    UpkeepStatus {
        is_open: raffle.state == RaffleState::Open,
        time_passed: elapsed >= 0 && elapsed as u64 >= raffle.config.interval,
        has_players: ledger::participant_count(raffle) > 0,
        has_balance: ledger::current_balance(raffle) > 0,
    }
}

/// Probe used by automation: eligibility plus the round number as payload.
pub fn probe(raffle: &Raffle, now: UnixTimestamp) -> UpkeepCheck {
    let status = check_upkeep(raffle, now);
    UpkeepCheck {
        upkeep_needed: status.needed(),
        perform_data: raffle.round.to_le_bytes().to_vec(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RaffleConfig;
    use solana_program::pubkey::Pubkey;

    const START: UnixTimestamp = 1_700_000_000;

    fn raffle_with_player() -> Raffle {
        let config = RaffleConfig::for_network("localnet", Pubkey::new_unique(), 1).unwrap();
        let raffle = Raffle::new(Pubkey::new_unique(), 255, config, START);
        let (raffle, _) = ledger::enter(&raffle, Pubkey::new_unique(), config.entrance_fee).unwrap();
        raffle
    }

    #[test]
    fn needed_once_interval_passed_with_players() {
        let raffle = raffle_with_player();
        assert!(check_upkeep(&raffle, START + 31).needed());
        assert!(check_upkeep(&raffle, START + 30).needed());
    }

    #[test]
    fn not_needed_before_interval() {
        let raffle = raffle_with_player();
        let status = check_upkeep(&raffle, START + 28);
        assert!(!status.time_passed);
        assert!(!status.needed());
    }

    #[test]
    fn not_needed_without_players() {
        let config = RaffleConfig::for_network("localnet", Pubkey::new_unique(), 1).unwrap();
        let raffle = Raffle::new(Pubkey::new_unique(), 255, config, START);
        let status = check_upkeep(&raffle, START + 31);
        assert!(!status.has_players);
        assert!(!status.has_balance);
        assert!(!status.needed());
    }

    #[test]
    fn not_needed_while_calculating() {
        let mut raffle = raffle_with_player();
        raffle.state = RaffleState::Calculating;
        let status = check_upkeep(&raffle, START + 31);
        assert!(!status.is_open);
        assert!(!status.needed());
    }

    #[test]
    fn clock_behind_round_start_is_not_elapsed() {
        let raffle = raffle_with_player();
        assert!(!check_upkeep(&raffle, START - 100).time_passed);
    }

    #[test]
    fn probe_does_not_mutate() {
        let raffle = raffle_with_player();
        let before = raffle.clone();
        let check = probe(&raffle, START + 31);
        assert!(check.upkeep_needed);
        assert_eq!(check.perform_data, 0u64.to_le_bytes().to_vec());
        assert_eq!(raffle, before);
    }
}
