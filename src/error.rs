/* This file is part of pubdao (https://codeberg.org/pubdao/pubdao)
 *
 * Copyright (C) 2025-2026 pubdao developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ========================
    // Wallet and input errors
    // ========================
    #[error("No wallet is available to sign transactions")]
    NoWallet,

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    // ====================
    // Guard check failures
    // ====================
    #[error(transparent)]
    GuardFailed(#[from] GuardFailed),

    // ===============
    // Contract errors
    // ===============
    #[error("Method \"{0}\" is not part of the contract ABI")]
    UnknownContractMethod(String),

    // ======================
    // Network-related errors
    // ======================
    #[error("Unsupported RPC transport: {0}")]
    UnsupportedTransport(String),

    #[error("Connection failed")]
    ConnectFailed,

    #[error("Network operation failed")]
    NetworkOperationFailed,

    #[error("Timeout Error")]
    TimeoutError,

    #[error("Channel stopped")]
    ChannelStopped,

    #[error("JSON-RPC error: {0}")]
    JsonRpcError(String),

    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("URL parse error: {0}")]
    UrlParse(String),

    #[error("serde_json error: {0}")]
    SerdeJsonError(String),

    // ====
    // Misc
    // ====
    #[error("io error: {0}")]
    IoError(String),

    #[error("SetLoggerError")]
    SetLoggerError,
}

/// Pre-flight guard violations raised before a transaction is submitted.
/// The messages are the user-facing feedback, so keep them descriptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardFailed {
    #[error("The deadline has passed for this Proposal")]
    DeadlinePassed,

    #[error("You have already voted on this Proposal")]
    AlreadyVoted,

    #[error("This Proposal does not exist")]
    ProposalNotFound,

    #[error("You are not the Contract Owner. Only the Contract Owner can count votes")]
    NotContractOwner,

    #[error("Voting has not yet concluded. You still have time until all voting is finished")]
    VotingNotConcluded,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJsonError(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(_err: log::SetLoggerError) -> Self {
        Self::SetLoggerError
    }
}

impl From<smol::channel::RecvError> for Error {
    fn from(_err: smol::channel::RecvError) -> Self {
        Self::ChannelStopped
    }
}

impl<T> From<smol::channel::SendError<T>> for Error {
    fn from(_err: smol::channel::SendError<T>) -> Self {
        Self::ChannelStopped
    }
}
