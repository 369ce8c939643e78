// Raffle state machine: commits a transition only once invariants and effects succeed

use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::{
    eligibility::{self, UpkeepCheck},
    error::RaffleError,
    events::RaffleEvent,
    gateway, invariants, ledger,
    oracle::{RandomWord, RandomnessOracle},
    resolver,
    state::Raffle,
};

/// Transfer of the pool to the round's winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub winner: Pubkey,
    pub amount: u64,
}

/// Effects produced by a transition (data, not side effects).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Effects {
    pub events: Vec<RaffleEvent>,
    pub payout: Option<Payout>,
}

impl Effects {
    pub fn event(event: RaffleEvent) -> Self {
        Self {
            events: vec![event],
            payout: None,
        }
    }
}

/// Port through which the pool reaches the winner.
pub trait PrizeVault {
    fn pay(&mut self, payout: &Payout) -> Result<(), RaffleError>;
}

/// Context object owning the raffle between transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleMachine {
    raffle: Raffle,
}

impl RaffleMachine {
    pub fn new(raffle: Raffle) -> Self {
        Self { raffle }
    }

    pub fn raffle(&self) -> &Raffle {
        &self.raffle
    }

    pub fn into_raffle(self) -> Raffle {
        self.raffle
    }

    pub fn enter(&mut self, player: Pubkey, paid: u64) -> Result<Effects, RaffleError> {
        let (next, effects) = ledger::enter(&self.raffle, player, paid)?;
        self.commit(next, effects)
    }

    /// Read-only probe for automation
    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        eligibility::probe(&self.raffle, now)
    }

    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        now: UnixTimestamp,
        perform_data: &[u8],
        oracle: &mut O,
    ) -> Result<Effects, RaffleError> {
        let (next, effects) = gateway::trigger_draw(&self.raffle, now, perform_data, oracle)?;
        self.commit(next, effects)
    }

    /// Resolves the pending draw and pays the winner through `vault`.
    pub fn fulfill_random_words<V: PrizeVault>(
        &mut self,
        request_id: u64,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        vault: &mut V,
    ) -> Result<Effects, RaffleError> {
        let (next, effects) = resolver::fulfill(&self.raffle, request_id, random_words, now)?;
        invariants::check_invariants(&next)?;
        if let Some(payout) = &effects.payout {
            vault.pay(payout)?;
        }
        self.raffle = next;
        Ok(effects)
    }

    fn commit(&mut self, next: Raffle, effects: Effects) -> Result<Effects, RaffleError> {
        invariants::check_invariants(&next)?;
        self.raffle = next;
        Ok(effects)
    }
}
