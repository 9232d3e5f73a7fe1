// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded concurrent signing.
//!
//! `SigningPool::run_all` issues a batch of requests against one shared signer.
//! Each request runs on tokio's blocking pool in its own instance; a semaphore caps
//! how many run at once. The call returns when every request has finished, failed or
//! timed out, and results come back in request order. A timed-out call is
//! interrupted, so its instance is released and its permit returned shortly after.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::config::PoolConfig;
use crate::errors::{ExecutionError, SigboxResult};
use crate::observability::messages::pool::{BatchCompleted, BatchStarted, CallTimedOut};
use crate::signer::{PluginSigner, SignerRequest, SignerResponse};

/// Runs batches of signing requests with bounded concurrency.
#[derive(Debug, Clone)]
pub struct SigningPool {
    signer: Arc<PluginSigner>,
    max_concurrency: usize,
    call_timeout: Option<Duration>,
}

impl SigningPool {
    /// A pool running at most `max_concurrency` calls at once (at least one).
    pub fn new(signer: PluginSigner, max_concurrency: usize) -> Self {
        Self {
            signer: Arc::new(signer),
            max_concurrency: max_concurrency.max(1),
            call_timeout: None,
        }
    }

    pub fn from_config(signer: PluginSigner, config: &PoolConfig) -> Self {
        let pool = Self::new(signer, config.get_max_concurrency());
        match config.call_timeout() {
            Some(timeout) => pool.with_call_timeout(timeout),
            None => pool,
        }
    }

    /// Reports calls running longer than `timeout` as `ExecutionError::Timeout`.
    ///
    /// The guest is interrupted at its next function entry or loop back-edge; its
    /// instance is released and its permit freed once the blocking worker unwinds.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn signer(&self) -> &PluginSigner {
        &self.signer
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Executes every request and returns one result per request, in order.
    pub async fn run_all(
        &self,
        requests: Vec<SignerRequest>,
    ) -> Vec<SigboxResult<SignerResponse>> {
        let started = Instant::now();
        tracing::info!(
            "{}",
            BatchStarted {
                signer: self.signer.kind().as_str(),
                requests: requests.len(),
                max_concurrency: self.max_concurrency,
            }
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::with_capacity(requests.len());

        for (index, request) in requests.into_iter().enumerate() {
            let signer = Arc::clone(&self.signer);
            let semaphore = Arc::clone(&semaphore);
            let call_timeout = self.call_timeout;
            let interrupt = signer.interrupt_handle();
            let watchdog = interrupt.clone();

            tasks.push(tokio::spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(ExecutionError::WorkerFailed(e.to_string()).into()),
                };

                // The permit moves with the work so it is held until the guest returns.
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    signer.execute_interruptible(&request, &interrupt)
                });

                match call_timeout {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(joined) => flatten(joined),
                        Err(_) => {
                            watchdog.interrupt();
                            tracing::warn!(
                                "{}",
                                CallTimedOut {
                                    index,
                                    timeout: limit,
                                }
                            );
                            Err(ExecutionError::Timeout(limit).into())
                        }
                    },
                    None => flatten(work.await),
                }
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(match task.await {
                Ok(result) => result,
                Err(join_error) => Err(ExecutionError::WorkerFailed(join_error.to_string()).into()),
            });
        }

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        tracing::info!(
            "{}",
            BatchCompleted {
                succeeded,
                failed: results.len() - succeeded,
                elapsed: started.elapsed(),
            }
        );
        results
    }
}

fn flatten<T>(joined: Result<SigboxResult<T>, JoinError>) -> SigboxResult<T> {
    joined.unwrap_or_else(|e| Err(ExecutionError::WorkerFailed(e.to_string()).into()))
}
