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

//! JSON-RPC client-side implementation.
use std::time::Duration;

use async_trait::async_trait;
use futures::{select, AsyncReadExt, AsyncWriteExt, FutureExt};
use log::{debug, error};
use serde_json::Value;
use smol::net::TcpStream;
use url::Url;

use super::jsonrpc::{JsonRequest, JsonResult};
use crate::{chain::Provider, Error, Result};

/// JSON-RPC client implementation using asynchronous channels.
pub struct RpcClient {
    send: smol::channel::Sender<Value>,
    recv: smol::channel::Receiver<JsonResult>,
    stop_signal: smol::channel::Sender<()>,
    url: Url,
}

impl RpcClient {
    /// Instantiate a new JSON-RPC client that will connect to the given URL.
    pub async fn new(url: Url) -> Result<Self> {
        let (send, recv, stop_signal) = Self::open_channels(&url).await?;
        Ok(Self { send, recv, stop_signal, url })
    }

    /// Close the channels of an instantiated [`RpcClient`].
    pub async fn close(&self) -> Result<()> {
        self.stop_signal.send(()).await?;
        Ok(())
    }

    /// Send a given JSON-RPC request over the instantiated client.
    pub async fn request(&self, value: JsonRequest) -> Result<Value> {
        let req_id = value.id.as_u64().ok_or(Error::ParseFailed("Request ID is not a u64"))?;

        debug!(target: "rpc_client", "--> {}", serde_json::to_string(&value)?);

        // If the connection is closed, the sender will get an error for
        // sending to a closed channel.
        if let Err(e) = self.send.send(serde_json::to_value(&value)?).await {
            error!(
                target: "rpc_client",
                "JSON-RPC client unable to send to {} (channels closed): {}", self.url, e
            );
            return Err(Error::NetworkOperationFailed)
        }

        // If the connection is closed, the receiver will get an error for
        // waiting on a closed channel.
        let reply = self.recv.recv().await;
        if reply.is_err() {
            error!(
                target: "rpc_client",
                "JSON-RPC client unable to recv from {} (channels closed)", self.url
            );
            return Err(Error::NetworkOperationFailed)
        }

        match reply? {
            JsonResult::Response(r) => {
                debug!(target: "rpc_client", "<-- {}", serde_json::to_string(&r)?);

                // Check if the IDs match
                match r.id.as_u64() {
                    Some(resp_id) if resp_id == req_id => Ok(r.result),
                    _ => Err(Error::JsonRpcError("Reply ID mismatch".to_string())),
                }
            }
            JsonResult::Error(e) => {
                debug!(target: "rpc_client", "<-- {}", serde_json::to_string(&e)?);
                Err(Error::JsonRpcError(e.error.message.to_string()))
            }
            JsonResult::Notification(n) => {
                debug!(target: "rpc_client", "<-- {}", serde_json::to_string(&n)?);
                Err(Error::JsonRpcError("Unexpected reply".to_string()))
            }
        }
    }

    /// Instantiate channels for a new [`RpcClient`]. Only `tcp://` endpoints
    /// are supported.
    async fn open_channels(
        url: &Url,
    ) -> Result<(
        smol::channel::Sender<Value>,
        smol::channel::Receiver<JsonResult>,
        smol::channel::Sender<()>,
    )> {
        if url.scheme() != "tcp" {
            return Err(Error::UnsupportedTransport(url.scheme().to_string()))
        }

        let Ok(sockaddrs) = url.socket_addrs(|| None) else {
            return Err(Error::UrlParse(format!("Missing host in {url}")))
        };

        let Some(sockaddr) = sockaddrs.first() else { return Err(Error::ConnectFailed) };

        let stream = match TcpStream::connect(sockaddr).await {
            Ok(v) => v,
            Err(e) => {
                error!(target: "rpc_client", "JSON-RPC client connection to {} failed: {}", url, e);
                return Err(Error::ConnectFailed)
            }
        };

        let (data_send, data_recv) = smol::channel::unbounded();
        let (result_send, result_recv) = smol::channel::unbounded();
        let (stop_send, stop_recv) = smol::channel::unbounded();

        smol::spawn(Self::reqrep_loop(stream, result_send, data_recv, stop_recv)).detach();

        Ok((data_send, result_recv, stop_send))
    }

    /// Internal function that loops on a given stream and multiplexes the data.
    async fn reqrep_loop(
        mut stream: TcpStream,
        result_send: smol::channel::Sender<JsonResult>,
        data_recv: smol::channel::Receiver<Value>,
        stop_recv: smol::channel::Receiver<()>,
    ) -> Result<()> {
        // If we don't get a reply within 30 seconds, we'll fail.
        let read_timeout = Duration::from_secs(30);

        loop {
            let mut buf = vec![0; 2048 * 10];

            select! {
                data = data_recv.recv().fuse() => {
                    let data_bytes = serde_json::to_vec(&data?)?;
                    stream.write_all(&data_bytes).await?;

                    let n = {
                        let mut read_fut = stream.read(&mut buf[..]).fuse();
                        let mut timeout = smol::Timer::after(read_timeout).fuse();

                        select! {
                            n = read_fut => n?,
                            _ = timeout => return Err(Error::TimeoutError),
                        }
                    };

                    let reply: JsonResult = serde_json::from_slice(&buf[0..n])?;
                    result_send.send(reply).await?;
                }

                _ = stop_recv.recv().fuse() => break
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Provider for RpcClient {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let req = JsonRequest::new(method, params);
        RpcClient::request(self, req).await
    }
}
