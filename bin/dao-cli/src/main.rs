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

use std::{process::exit, sync::Arc};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use prettytable::{format, row, Table};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use url::Url;

use pubdao::{
    chain::ChainClient,
    dao::{Dao, DAO_ADDRESS},
    rpc::client::RpcClient,
    Result,
};

#[derive(Parser)]
#[command(name = "dao", about = "Command-line client for the Public DAO governance contract", version)]
struct Args {
    /// Increase verbosity (-vv supported)
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,

    /// JSON-RPC endpoint of the chain node
    #[arg(short, long, default_value = "tcp://127.0.0.1:7777")]
    endpoint: Url,

    /// Address of the governance contract
    #[arg(long, default_value = DAO_ADDRESS)]
    dao: String,

    #[command(subcommand)]
    command: DaoSubcommand,
}

#[derive(Copy, Clone, ValueEnum)]
enum VoteChoice {
    Yes,
    No,
}

#[derive(Subcommand)]
enum DaoSubcommand {
    /// Submit a new proposal
    Propose {
        /// Proposal description
        description: String,
    },

    /// Fetch a single proposal by id
    Get {
        /// Proposal id
        id: u64,
    },

    /// Cast a vote on a proposal
    Vote {
        /// Proposal id
        id: u64,

        /// Vote choice [yes/no]
        #[arg(value_enum)]
        vote: VoteChoice,
    },

    /// Count votes on a proposal (contract owner only)
    Count {
        /// Proposal id
        id: u64,
    },

    /// List all proposals
    List,
}

async fn start(args: Args) -> Result<()> {
    let rpc_client = RpcClient::new(args.endpoint).await?;
    let chain = ChainClient::new(Arc::new(rpc_client));
    let mut dao = Dao::with_address(chain, &args.dao);

    match args.command {
        DaoSubcommand::Propose { description } => {
            let tx_hash = dao.create_proposal(&description).await?;
            println!("Proposal submitted: {tx_hash}");
        }

        DaoSubcommand::Get { id } => {
            let proposal = dao.get_proposal(id).await?;
            println!("ID: {}", proposal.id);
            println!("Description: {}", proposal.description);
            println!("Deadline: {}", proposal.deadline);
            println!("Votes Up: {}", proposal.votes_up);
            println!("Votes Down: {}", proposal.votes_down);
            println!("Passed: {}", if proposal.passed { "Yes" } else { "No" });
        }

        DaoSubcommand::Vote { id, vote } => {
            let vote = matches!(vote, VoteChoice::Yes);
            let tx_hash = dao.vote(id, vote).await?;
            println!("Vote submitted: {tx_hash}");
        }

        DaoSubcommand::Count { id } => {
            dao.select(id);
            let tx_hash = dao.count_votes().await?;
            println!("Votes counted: {tx_hash}");
        }

        DaoSubcommand::List => {
            let proposals = dao.refresh_proposals().await?;

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
            table.set_titles(row![
                "ID",
                "Description",
                "Deadline",
                "Votes Up",
                "Votes Down",
                "Passed"
            ]);

            for proposal in proposals {
                table.add_row(row![
                    proposal.id,
                    proposal.description,
                    proposal.deadline,
                    proposal.votes_up,
                    proposal.votes_down,
                    if proposal.passed { "Yes" } else { "No" },
                ]);
            }

            if table.is_empty() {
                println!("No proposals.");
            } else {
                println!("{table}");
            }
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
    {
        eprintln!("Failed to initialize logger: {e}");
        exit(1);
    }

    if let Err(e) = smol::block_on(start(args)) {
        eprintln!("Error: {e}");
        exit(1);
    }
}
