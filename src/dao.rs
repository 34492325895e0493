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

//! Proposal interaction layer. Every state-changing operation resolves
//! the signer, runs its pre-flight guard checks, and only then submits
//! a transaction and awaits inclusion.
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    chain::ChainClient,
    contract::{Abi, Contract},
    Error, GuardFailed, Result,
};

/// Address of the deployed governance contract.
pub const DAO_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Interface descriptor for the governance contract.
pub static DAO_ABI: Abi = Abi {
    methods: &[
        "create_proposal",
        "vote_on_proposal",
        "count_votes",
        "next_proposal",
        "proposal",
        "deadline",
        "vote_status",
        "exists",
        "contract_owner",
    ],
};

/// A contract-resident proposal record. Read-only on this side; the
/// counters and `passed` flag mutate only through contract transactions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// Sequential id, assigned by the contract starting at 1
    pub id: u64,
    /// Free-text description
    pub description: String,
    /// Block height after which voting closes
    pub deadline: u64,
    /// Upvote counter
    pub votes_up: u64,
    /// Downvote counter
    pub votes_down: u64,
    /// Set once the owner has counted votes
    pub passed: bool,
}

/// Session-scoped handle to the governance contract. Holds the fetched
/// proposal list and the currently selected proposal id; both are
/// rebuilt from the chain and never persisted.
pub struct Dao {
    chain: ChainClient,
    address: String,
    /// Last fetched proposal list, replaced wholesale on refresh
    pub proposals: Vec<Proposal>,
    /// Proposal id the next `count_votes` call will act on
    pub selected: Option<u64>,
}

impl Dao {
    /// Create a session against the compiled-in [`DAO_ADDRESS`].
    pub fn new(chain: ChainClient) -> Self {
        Self::with_address(chain, DAO_ADDRESS)
    }

    /// Create a session against a contract deployed elsewhere.
    pub fn with_address(chain: ChainClient, address: &str) -> Self {
        Self { chain, address: address.to_string(), proposals: vec![], selected: None }
    }

    fn contract(&self) -> Contract {
        self.chain.contract(&self.address, &DAO_ABI)
    }

    /// Submit a new proposal and await its inclusion. Returns the
    /// transaction hash.
    pub async fn create_proposal(&self, description: &str) -> Result<String> {
        if description.is_empty() {
            return Err(Error::InvalidInput("Proposal description is empty"))
        }

        self.chain.request_account().await?;
        let contract = self.contract();

        let tx = contract.submit("create_proposal", json!([description])).await?;
        tx.wait().await?;

        info!(target: "dao", "Created proposal: {}", tx.hash);
        Ok(tx.hash)
    }

    /// Fetch a single proposal by id. Read failures are logged before
    /// being returned.
    pub async fn get_proposal(&self, id: u64) -> Result<Proposal> {
        if id == 0 {
            return Err(Error::InvalidInput("Proposal id is zero"))
        }

        self.chain.request_account().await?;
        let contract = self.contract();

        match fetch_proposal(&contract, id).await {
            Ok(proposal) => {
                info!(target: "dao", "{:?}", proposal);
                Ok(proposal)
            }
            Err(e) => {
                error!(target: "dao", "Fetching proposal {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Cast a vote on a proposal and await inclusion. Guard order follows
    /// the contract's expectations: deadline, duplicate vote, existence.
    pub async fn vote(&self, id: u64, vote: bool) -> Result<String> {
        if id == 0 {
            return Err(Error::InvalidInput("Proposal id is zero"))
        }

        let signer = self.chain.request_account().await?;
        let contract = self.contract();

        // Check that the deadline hasn't passed. Votes at the deadline
        // height itself are still accepted.
        let deadline = contract
            .call("deadline", json!([id]))
            .await?
            .as_u64()
            .ok_or(Error::ParseFailed("Deadline is not a u64"))?;
        if self.chain.block_height().await? > deadline {
            return Err(GuardFailed::DeadlinePassed.into())
        }

        // Check that the signer hasn't voted yet on the proposal
        let voted = contract
            .call("vote_status", json!([id, signer]))
            .await?
            .as_bool()
            .ok_or(Error::ParseFailed("Vote status is not a bool"))?;
        if voted {
            return Err(GuardFailed::AlreadyVoted.into())
        }

        // Check that the proposal even exists
        let exists = contract
            .call("exists", json!([id]))
            .await?
            .as_bool()
            .ok_or(Error::ParseFailed("Existence flag is not a bool"))?;
        if !exists {
            return Err(GuardFailed::ProposalNotFound.into())
        }

        let tx = contract.submit("vote_on_proposal", json!([id, vote])).await?;
        tx.wait().await?;

        info!(target: "dao", "Voted {} on proposal {}: {}", vote, id, tx.hash);
        Ok(tx.hash)
    }

    /// Select the proposal id the next [`Dao::count_votes`] call acts on.
    pub fn select(&mut self, id: u64) {
        self.selected = Some(id);
    }

    /// Finalize the tally of the selected proposal and await inclusion.
    /// Owner-only; guard order: ownership, existence, deadline reached.
    pub async fn count_votes(&self) -> Result<String> {
        let Some(id) = self.selected else {
            return Err(Error::InvalidInput("No proposal selected"))
        };

        let signer = self.chain.request_account().await?;
        let contract = self.contract();

        // Check that the signer is the contract owner
        let is_owner = contract
            .call("contract_owner", json!([signer]))
            .await?
            .as_bool()
            .ok_or(Error::ParseFailed("Owner flag is not a bool"))?;
        if !is_owner {
            return Err(GuardFailed::NotContractOwner.into())
        }

        // Check that the proposal exists
        let exists = contract
            .call("exists", json!([id]))
            .await?
            .as_bool()
            .ok_or(Error::ParseFailed("Existence flag is not a bool"))?;
        if !exists {
            return Err(GuardFailed::ProposalNotFound.into())
        }

        // Make sure that voting has concluded. Counting opens at the
        // deadline height itself.
        let deadline = contract
            .call("deadline", json!([id]))
            .await?
            .as_u64()
            .ok_or(Error::ParseFailed("Deadline is not a u64"))?;
        if self.chain.block_height().await? < deadline {
            return Err(GuardFailed::VotingNotConcluded.into())
        }

        let tx = contract.submit("count_votes", json!([id])).await?;
        tx.wait().await?;

        info!(target: "dao", "Counted votes on proposal {}: {}", id, tx.hash);
        Ok(tx.hash)
    }

    /// Rebuild the proposal list by scanning ids `1..next_proposal`
    /// sequentially. The stored list is replaced in a single assignment
    /// once the scan completes, so readers never observe a partial list.
    pub async fn refresh_proposals(&mut self) -> Result<&[Proposal]> {
        self.chain.request_account().await?;
        let contract = self.contract();

        let next = contract
            .call("next_proposal", json!([]))
            .await?
            .as_u64()
            .ok_or(Error::ParseFailed("Next proposal id is not a u64"))?;

        let mut proposals = Vec::with_capacity(next.saturating_sub(1) as usize);
        for id in 1..next {
            proposals.push(fetch_proposal(&contract, id).await?);
        }

        self.proposals = proposals;
        Ok(&self.proposals)
    }
}

async fn fetch_proposal(contract: &Contract, id: u64) -> Result<Proposal> {
    let rep = contract.call("proposal", json!([id])).await?;
    Ok(serde_json::from_value(rep)?)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::chain::Provider;

    const ALICE: &str = "0xa11ce";
    const OWNER: &str = "0x0wner";

    #[derive(Default)]
    struct ChainState {
        wallet: Option<String>,
        owner: String,
        height: u64,
        next_proposal: u64,
        proposals: HashMap<u64, Proposal>,
        vote_status: HashMap<(u64, String), bool>,
        /// Log of `contract.call` reads as (method, params)
        reads: Vec<(String, Value)>,
        /// Log of `contract.submit` transactions as (method, params)
        submitted: Vec<(String, Value)>,
    }

    /// In-memory chain standing in for the RPC endpoint.
    struct MockChain {
        state: Mutex<ChainState>,
    }

    impl MockChain {
        fn new(wallet: Option<&str>, owner: &str, height: u64) -> Arc<Self> {
            let state = ChainState {
                wallet: wallet.map(String::from),
                owner: owner.to_string(),
                height,
                next_proposal: 1,
                ..Default::default()
            };
            Arc::new(Self { state: Mutex::new(state) })
        }

        fn add_proposal(&self, description: &str, deadline: u64) -> u64 {
            let mut state = self.state.lock().unwrap();
            let id = state.next_proposal;
            state.proposals.insert(
                id,
                Proposal {
                    id,
                    description: description.to_string(),
                    deadline,
                    votes_up: 0,
                    votes_down: 0,
                    passed: false,
                },
            );
            state.next_proposal += 1;
            id
        }

        fn mark_voted(&self, id: u64, addr: &str) {
            self.state.lock().unwrap().vote_status.insert((id, addr.to_string()), true);
        }

        fn submitted(&self) -> Vec<(String, Value)> {
            self.state.lock().unwrap().submitted.clone()
        }

        fn proposal_reads(&self) -> Vec<u64> {
            let state = self.state.lock().unwrap();
            state
                .reads
                .iter()
                .filter(|(m, _)| m == "proposal")
                .map(|(_, p)| p[0].as_u64().unwrap())
                .collect()
        }

        fn contract_call(&self, method: &str, params: &Value) -> Result<Value> {
            let mut state = self.state.lock().unwrap();
            state.reads.push((method.to_string(), params.clone()));

            match method {
                "next_proposal" => Ok(json!(state.next_proposal)),
                "proposal" => {
                    let id = params[0].as_u64().unwrap();
                    match state.proposals.get(&id) {
                        Some(p) => Ok(serde_json::to_value(p)?),
                        None => Err(Error::JsonRpcError("Unknown proposal".to_string())),
                    }
                }
                // Solidity mapping semantics: missing entries read as
                // zero values, they don't fail.
                "deadline" => {
                    let id = params[0].as_u64().unwrap();
                    Ok(json!(state.proposals.get(&id).map(|p| p.deadline).unwrap_or(0)))
                }
                "vote_status" => {
                    let id = params[0].as_u64().unwrap();
                    let addr = params[1].as_str().unwrap().to_string();
                    Ok(json!(state.vote_status.get(&(id, addr)).copied().unwrap_or(false)))
                }
                "exists" => {
                    let id = params[0].as_u64().unwrap();
                    Ok(json!(state.proposals.contains_key(&id)))
                }
                "contract_owner" => {
                    let addr = params[0].as_str().unwrap();
                    Ok(json!(addr == state.owner))
                }
                _ => Err(Error::JsonRpcError(format!("Unknown read method {method}"))),
            }
        }

        fn contract_submit(&self, method: &str, params: &Value) -> Result<Value> {
            let mut state = self.state.lock().unwrap();
            state.submitted.push((method.to_string(), params.clone()));

            match method {
                "create_proposal" => {
                    let id = state.next_proposal;
                    let deadline = state.height + 10;
                    state.proposals.insert(
                        id,
                        Proposal {
                            id,
                            description: params[0].as_str().unwrap().to_string(),
                            deadline,
                            votes_up: 0,
                            votes_down: 0,
                            passed: false,
                        },
                    );
                    state.next_proposal += 1;
                }
                "vote_on_proposal" => {
                    let id = params[0].as_u64().unwrap();
                    let vote = params[1].as_bool().unwrap();
                    let voter = state.wallet.clone().unwrap();
                    let proposal = state.proposals.get_mut(&id).unwrap();
                    if vote {
                        proposal.votes_up += 1;
                    } else {
                        proposal.votes_down += 1;
                    }
                    state.vote_status.insert((id, voter), true);
                }
                "count_votes" => {
                    let id = params[0].as_u64().unwrap();
                    let proposal = state.proposals.get_mut(&id).unwrap();
                    proposal.passed = proposal.votes_up > proposal.votes_down;
                }
                _ => return Err(Error::JsonRpcError(format!("Unknown tx method {method}"))),
            }

            Ok(json!(format!("tx{:04}", state.submitted.len())))
        }
    }

    #[async_trait]
    impl Provider for MockChain {
        async fn request(&self, method: &str, params: Value) -> Result<Value> {
            match method {
                "wallet.get_address" => match &self.state.lock().unwrap().wallet {
                    Some(addr) => Ok(json!(addr)),
                    None => Ok(json!(null)),
                },
                "chain.block_height" => Ok(json!(self.state.lock().unwrap().height)),
                "contract.call" => {
                    self.contract_call(params[1].as_str().unwrap(), &params[2])
                }
                "contract.submit" => {
                    self.contract_submit(params[1].as_str().unwrap(), &params[2])
                }
                "tx.is_confirmed" => Ok(json!(true)),
                _ => Err(Error::JsonRpcError(format!("Unknown method {method}"))),
            }
        }
    }

    fn session(mock: &Arc<MockChain>) -> Dao {
        Dao::new(ChainClient::new(mock.clone()))
    }

    #[test]
    fn refresh_scans_all_proposals_in_order() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            mock.add_proposal("Fund the treasury", 110);
            mock.add_proposal("Rotate the multisig", 120);

            let mut dao = session(&mock);
            let proposals = dao.refresh_proposals().await.unwrap();

            assert_eq!(proposals.len(), 2);
            assert_eq!(proposals.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
            // next_proposal == 3 means exactly ids 1 and 2 are read, in order
            assert_eq!(mock.proposal_reads(), vec![1, 2]);
        });
    }

    #[test]
    fn refresh_with_empty_contract_yields_empty_list() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let mut dao = session(&mock);
            dao.proposals = vec![Proposal {
                id: 9,
                description: "stale".to_string(),
                deadline: 0,
                votes_up: 0,
                votes_down: 0,
                passed: false,
            }];

            // The stale entry is replaced, not merged
            assert!(dao.refresh_proposals().await.unwrap().is_empty());
            assert!(dao.proposals.is_empty());
        });
    }

    #[test]
    fn create_rejects_empty_description() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let dao = session(&mock);

            let err = dao.create_proposal("").await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn create_requires_wallet() {
        smol::block_on(async {
            let mock = MockChain::new(None, OWNER, 100);
            let dao = session(&mock);

            let err = dao.create_proposal("Fund the treasury").await.unwrap_err();
            assert!(matches!(err, Error::NoWallet));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn create_then_refresh_round_trip() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let mut dao = session(&mock);

            dao.create_proposal("Fund the treasury").await.unwrap();
            let proposals = dao.refresh_proposals().await.unwrap();

            assert_eq!(proposals.len(), 1);
            let p = &proposals[0];
            assert_eq!(p.id, 1);
            assert_eq!(p.description, "Fund the treasury");
            assert_eq!(p.votes_up, 0);
            assert_eq!(p.votes_down, 0);
            assert!(!p.passed);
        });
    }

    #[test]
    fn vote_rejects_passed_deadline() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 99);

            let dao = session(&mock);
            let err = dao.vote(id, true).await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::DeadlinePassed)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn vote_accepted_at_deadline_height() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 100);

            let dao = session(&mock);
            dao.vote(id, true).await.unwrap();

            let submitted = mock.submitted();
            assert_eq!(submitted.len(), 1);
            assert_eq!(submitted[0].0, "vote_on_proposal");
            assert_eq!(mock.state.lock().unwrap().proposals[&id].votes_up, 1);
        });
    }

    #[test]
    fn vote_rejects_duplicate() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 110);
            mock.mark_voted(id, ALICE);

            let dao = session(&mock);
            let err = dao.vote(id, false).await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::AlreadyVoted)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn second_vote_by_same_signer_is_rejected() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 110);

            let dao = session(&mock);
            dao.vote(id, true).await.unwrap();

            let err = dao.vote(id, true).await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::AlreadyVoted)));
            assert_eq!(mock.submitted().len(), 1);
        });
    }

    #[test]
    fn vote_rejects_missing_proposal() {
        smol::block_on(async {
            // Height 0 so the zero-valued deadline of the missing entry
            // does not trip the deadline guard first
            let mock = MockChain::new(Some(ALICE), OWNER, 0);
            let dao = session(&mock);

            let err = dao.vote(7, true).await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::ProposalNotFound)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn vote_on_missing_proposal_reports_deadline_first() {
        smol::block_on(async {
            // Guard order is deadline before existence; a missing entry
            // reads a zero deadline, which at height > 0 is in the past
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let dao = session(&mock);

            let err = dao.vote(7, true).await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::DeadlinePassed)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn count_rejects_non_owner() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 90);

            let mut dao = session(&mock);
            dao.select(id);
            let err = dao.count_votes().await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::NotContractOwner)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn count_rejects_missing_proposal() {
        smol::block_on(async {
            let mock = MockChain::new(Some(OWNER), OWNER, 100);
            let mut dao = session(&mock);
            dao.select(7);

            let err = dao.count_votes().await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::ProposalNotFound)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn count_rejects_before_deadline() {
        smol::block_on(async {
            let mock = MockChain::new(Some(OWNER), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 110);

            let mut dao = session(&mock);
            dao.select(id);
            let err = dao.count_votes().await.unwrap_err();
            assert!(matches!(err, Error::GuardFailed(GuardFailed::VotingNotConcluded)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn count_requires_selection() {
        smol::block_on(async {
            let mock = MockChain::new(Some(OWNER), OWNER, 100);
            let dao = session(&mock);

            let err = dao.count_votes().await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            assert!(mock.submitted().is_empty());
        });
    }

    #[test]
    fn count_finalizes_passed_proposal() {
        smol::block_on(async {
            let mock = MockChain::new(Some(OWNER), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 100);
            {
                let mut state = mock.state.lock().unwrap();
                let proposal = state.proposals.get_mut(&id).unwrap();
                proposal.votes_up = 2;
                proposal.votes_down = 1;
            }

            let mut dao = session(&mock);
            dao.select(id);
            dao.count_votes().await.unwrap();

            let submitted = mock.submitted();
            assert_eq!(submitted.len(), 1);
            assert_eq!(submitted[0].0, "count_votes");
            assert!(mock.state.lock().unwrap().proposals[&id].passed);
        });
    }

    #[test]
    fn get_proposal_returns_record() {
        smol::block_on(async {
            let mock = MockChain::new(Some(ALICE), OWNER, 100);
            let id = mock.add_proposal("Fund the treasury", 110);

            let dao = session(&mock);
            let proposal = dao.get_proposal(id).await.unwrap();
            assert_eq!(proposal.id, id);
            assert_eq!(proposal.description, "Fund the treasury");

            let err = dao.get_proposal(0).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        });
    }
}
