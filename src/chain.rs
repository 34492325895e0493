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

//! Chain client adapter. Wraps a JSON-RPC provider and exposes the
//! signer identity, the chain clock, and contract binding.
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use crate::{
    contract::{Abi, Contract},
    Error, Result,
};

/// Seam between the interaction layer and whatever endpoint answers
/// JSON-RPC requests. Production code uses [`crate::rpc::client::RpcClient`];
/// tests inject an in-memory chain.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Perform a single request against the provider and await its reply.
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// Handle to the wallet-backed chain endpoint. Holds no state beyond the
/// provider it was constructed with, so clones are cheap and share the
/// underlying connection.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn Provider>,
}

impl ChainClient {
    /// Instantiate a new [`ChainClient`] on top of the given provider.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Return the active wallet address used to sign transactions.
    /// Fails with [`Error::NoWallet`] if the endpoint has no wallet loaded.
    pub async fn request_account(&self) -> Result<String> {
        let rep = self.provider.request("wallet.get_address", json!([])).await?;

        match rep.as_str() {
            Some(addr) if !addr.is_empty() => {
                debug!(target: "chain", "Active signer: {}", addr);
                Ok(addr.to_string())
            }
            _ => Err(Error::NoWallet),
        }
    }

    /// Return the latest block height known to the endpoint. This is the
    /// clock used for proposal deadline comparisons.
    pub async fn block_height(&self) -> Result<u64> {
        let rep = self.provider.request("chain.block_height", json!([])).await?;
        rep.as_u64().ok_or(Error::ParseFailed("Block height is not a u64"))
    }

    /// Bind a [`Contract`] handle to the given address with the given ABI.
    /// Pure construction, no network I/O.
    pub fn contract(&self, address: &str, abi: &'static Abi) -> Contract {
        Contract::new(self.provider.clone(), address, abi)
    }
}
