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

//! Callable handle to a deployed contract, bound to an address and an
//! ABI descriptor. Reads go through `contract.call`, state changes
//! through `contract.submit` followed by a confirmation wait.
use std::{sync::Arc, time::Duration};

use log::debug;
use serde_json::{json, Value};

use crate::{chain::Provider, Error, Result};

/// Structured interface descriptor for a deployed contract: the set of
/// method names the contract answers to. Supplied out-of-band alongside
/// the contract address.
pub struct Abi {
    pub methods: &'static [&'static str],
}

impl Abi {
    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }
}

/// A contract handle bound to an address, authorized to sign as the
/// provider's current account.
pub struct Contract {
    provider: Arc<dyn Provider>,
    address: String,
    abi: &'static Abi,
}

impl Contract {
    pub(crate) fn new(provider: Arc<dyn Provider>, address: &str, abi: &'static Abi) -> Self {
        Self { provider, address: address.to_string(), abi }
    }

    /// Read-only contract call. Methods missing from the ABI are rejected
    /// before any network I/O happens.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if !self.abi.contains(method) {
            return Err(Error::UnknownContractMethod(method.to_string()))
        }

        debug!(target: "contract", "call {}::{}", self.address, method);
        self.provider.request("contract.call", json!([self.address, method, params])).await
    }

    /// Submit a state-changing transaction. Returns a [`PendingTx`] that
    /// can be awaited for inclusion.
    pub async fn submit(&self, method: &str, params: Value) -> Result<PendingTx> {
        if !self.abi.contains(method) {
            return Err(Error::UnknownContractMethod(method.to_string()))
        }

        debug!(target: "contract", "submit {}::{}", self.address, method);
        let rep =
            self.provider.request("contract.submit", json!([self.address, method, params])).await?;

        let Some(hash) = rep.as_str() else {
            return Err(Error::ParseFailed("Transaction hash is not a string"))
        };

        Ok(PendingTx { provider: self.provider.clone(), hash: hash.to_string() })
    }
}

/// A submitted transaction awaiting inclusion in a block.
pub struct PendingTx {
    provider: Arc<dyn Provider>,
    pub hash: String,
}

impl std::fmt::Debug for PendingTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTx").field("hash", &self.hash).finish_non_exhaustive()
    }
}

impl PendingTx {
    /// Poll the endpoint until the transaction is confirmed. There is no
    /// upper bound on the wait; a stalled endpoint stalls the caller.
    pub async fn wait(&self) -> Result<()> {
        loop {
            let rep = self.provider.request("tx.is_confirmed", json!([self.hash])).await?;

            let Some(confirmed) = rep.as_bool() else {
                return Err(Error::ParseFailed("Confirmation status is not a bool"))
            };

            if confirmed {
                debug!(target: "contract", "tx {} confirmed", self.hash);
                return Ok(())
            }

            smol::Timer::after(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// Provider that fails the test if anything reaches the network layer.
    struct UnreachableProvider;

    #[async_trait]
    impl Provider for UnreachableProvider {
        async fn request(&self, method: &str, _params: Value) -> Result<Value> {
            panic!("Unexpected request: {method}");
        }
    }

    static TEST_ABI: Abi = Abi { methods: &["known_method"] };

    #[test]
    fn unknown_method_is_rejected_before_dispatch() {
        smol::block_on(async {
            let contract = Contract::new(Arc::new(UnreachableProvider), "0xdead", &TEST_ABI);

            let err = contract.call("bogus", json!([])).await.unwrap_err();
            assert!(matches!(err, Error::UnknownContractMethod(m) if m == "bogus"));

            let err = contract.submit("bogus", json!([])).await.unwrap_err();
            assert!(matches!(err, Error::UnknownContractMethod(m) if m == "bogus"));
        });
    }
}
