// Raffle notifications, logged for off-chain listeners
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player joined the current round at `index`
    EntryAccepted { player: Pubkey, index: u64 },
    /// A randomness request is in flight
    DrawRequested { request_id: u64, round: u64 },
    /// The pool was paid out
    WinnerSelected {
        winner: Pubkey,
        amount: u64,
        round: u64,
    },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match self {
            RaffleEvent::EntryAccepted { player, index } => {
                msg!("EntryAccepted: player={} index={}", player, index);
            }
            RaffleEvent::DrawRequested { request_id, round } => {
                msg!("DrawRequested: request_id={} round={}", request_id, round);
            }
            RaffleEvent::WinnerSelected {
                winner,
                amount,
                round,
            } => {
                msg!(
                    "WinnerSelected: winner={} amount={} round={}",
                    winner,
                    amount,
                    round
                );
            }
        }
        if let Ok(bytes) = self.try_to_vec() {
            sol_log_data(&[&bytes]);
        }
    }
}
