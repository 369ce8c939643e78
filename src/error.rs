use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Instruction data could not be decoded
    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Raffle not initialized")]
    NotInitialized,

    /// Configuration failed validation at initialization
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Entry paid less than the entrance fee
    #[error("Not enough lamports entered")]
    InsufficientPayment,

    /// Entry attempted while a draw is in flight
    #[error("Raffle is not open")]
    RoundNotOpen,

    /// The player list reached the account capacity
    #[error("Raffle is full")]
    RaffleFull,

    /// Draw triggered while the eligibility check fails
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a stale, foreign or absent request
    #[error("Unknown randomness request")]
    UnknownRequest,

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// Winner transfer was rejected
    #[error("Winner payout failed")]
    PayoutFailed,

    #[error("Player index out of range")]
    IndexOutOfRange,

    /// Callback was not signed by the configured coordinator authority
    #[error("Only the VRF coordinator can fulfill")]
    UnauthorizedFulfiller,

    /// Coordinator program account does not match the configuration
    #[error("VRF coordinator mismatch")]
    CoordinatorMismatch,

    /// Coordinator returned no usable request id
    #[error("Randomness request failed")]
    OracleRequestFailed,

    #[error("Raffle invariant violated")]
    InvariantViolation,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_codes_follow_declaration_order() {
        assert_eq!(
            ProgramError::from(RaffleError::InvalidInstruction),
            ProgramError::Custom(0)
        );
        assert_eq!(
            ProgramError::from(RaffleError::UpkeepNotNeeded),
            ProgramError::Custom(7)
        );
        assert_eq!(
            ProgramError::from(RaffleError::UnknownRequest),
            ProgramError::Custom(8)
        );
    }
}
