//! Bounded-concurrency transaction fetcher.
//!
//! Workers share a semaphore and a 100ms ticker. Each worker writes to the
//! slot matching its input index, so the assembled output follows the input
//! order regardless of completion order.

use crate::client::{validate_signature, SvmClient};
use crate::types::TransactionResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wallet_types::{truncate_id, ChainError, ErrorKind, RangeResult};

const MAX_CONCURRENT: usize = 20;
const REQUEST_INTERVAL: Duration = Duration::from_millis(100);
const RANGE_DEADLINE: Duration = Duration::from_secs(5 * 60);
const MAX_ATTEMPTS: u32 = 3;

/// Folds several failures into one error of the first failure's kind.
fn aggregate(mut errors: Vec<(usize, ChainError)>) -> ChainError {
	errors.sort_by_key(|(index, _)| *index);
	if errors.len() == 1 {
		return errors.remove(0).1;
	}
	let message = format!(
		"multiple errors occurred: {}",
		errors
			.iter()
			.map(|(_, e)| e.to_string())
			.collect::<Vec<_>>()
			.join("; ")
	);
	match errors.first().map(|(_, e)| e) {
		Some(ChainError::Rpc { code, .. }) => ChainError::Rpc { code: *code, message },
		Some(first) => match first.kind() {
			ErrorKind::InvalidInput => ChainError::InvalidInput(message),
			ErrorKind::NotFound => ChainError::NotFound(message),
			ErrorKind::Transport => ChainError::Transport(message),
			ErrorKind::Protocol => ChainError::Protocol(message),
			ErrorKind::Integrity => ChainError::Integrity(message),
			ErrorKind::NotImplemented => ChainError::NotImplemented(message),
		},
		None => ChainError::Protocol(message),
	}
}

async fn fetch_with_retry(
	client: &SvmClient,
	limiter: &Mutex<tokio::time::Interval>,
	signature: &str,
) -> Result<TransactionResult, ChainError> {
	let mut attempt = 0;
	loop {
		limiter.lock().await.tick().await;
		match client.get_transaction(signature).await {
			Ok(tx) => return Ok(tx),
			Err(e) if e.kind() == ErrorKind::Transport && attempt + 1 < MAX_ATTEMPTS => {
				attempt += 1;
				debug!(signature = %truncate_id(signature), attempt, error = %e, "retrying transaction fetch");
				tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
			},
			Err(e) => return Err(e.context(format!("transaction {}", truncate_id(signature)))),
		}
	}
}

impl SvmClient {
	/// Fetches every transaction in `signatures`.
	///
	/// All signatures are validated before any request is made. Failures do
	/// not discard successes: the result carries every transaction recovered,
	/// in input order, plus an aggregate of the failures.
	pub async fn get_transaction_range(
		&self,
		signatures: &[String],
	) -> Result<RangeResult<TransactionResult>, ChainError> {
		self.fetch_range(signatures, RANGE_DEADLINE).await
	}

	async fn fetch_range(
		&self,
		signatures: &[String],
		limit: Duration,
	) -> Result<RangeResult<TransactionResult>, ChainError> {
		if signatures.is_empty() {
			return Err(ChainError::InvalidInput("empty signatures".into()));
		}
		let mut validated = Vec::with_capacity(signatures.len());
		for (index, sig) in signatures.iter().enumerate() {
			let sig = validate_signature(sig).map_err(|e| e.context(format!("signature at index {}", index)))?;
			validated.push(sig.to_string());
		}

		if let [single] = validated.as_slice() {
			let tx = self
				.get_transaction(single)
				.await
				.map_err(|e| e.context("single transaction"))?;
			return Ok(RangeResult::complete(vec![tx]));
		}

		info!(count = validated.len(), "fetching transaction range");
		let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT));
		let mut ticker = tokio::time::interval(REQUEST_INTERVAL);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let limiter = Arc::new(Mutex::new(ticker));

		let mut workers = JoinSet::new();
		for (index, signature) in validated.iter().cloned().enumerate() {
			let client = self.clone();
			let semaphore = Arc::clone(&semaphore);
			let limiter = Arc::clone(&limiter);
			workers.spawn(async move {
				let outcome = match semaphore.acquire_owned().await {
					Ok(_permit) => fetch_with_retry(&client, &limiter, &signature).await,
					Err(_) => Err(ChainError::Transport("worker pool closed".into())),
				};
				(index, outcome)
			});
		}

		let mut slots: Vec<Option<TransactionResult>> = vec![None; validated.len()];
		let mut finished = vec![false; validated.len()];
		let mut errors = Vec::new();
		let mut timed_out = false;
		let deadline = Instant::now() + limit;
		loop {
			match tokio::time::timeout_at(deadline, workers.join_next()).await {
				Ok(Some(Ok((index, outcome)))) => {
					finished[index] = true;
					match outcome {
						Ok(tx) => slots[index] = Some(tx),
						Err(e) => errors.push((index, e)),
					}
				},
				Ok(Some(Err(join_err))) => warn!(error = %join_err, "transaction worker failed"),
				Ok(None) => break,
				Err(_) => {
					workers.abort_all();
					timed_out = true;
					break;
				},
			}
		}

		// Workers that never reported are named individually.
		for (index, signature) in validated.iter().enumerate() {
			if finished[index] {
				continue;
			}
			let err = if timed_out {
				ChainError::Timeout(format!("transaction {} unfinished after {:?}", signature, limit))
			} else {
				ChainError::Transport(format!("worker for transaction {} failed", signature))
			};
			errors.push((index, err));
		}

		let items: Vec<TransactionResult> = slots
			.into_iter()
			.flatten()
			.filter(|tx| {
				let valid = !tx.transaction.signatures.is_empty();
				if !valid {
					warn!(slot = tx.slot, "skipping transaction without signatures");
				}
				valid
			})
			.collect();

		if !errors.is_empty() {
			warn!(failed = errors.len(), recovered = items.len(), "transaction range incomplete");
			return Ok(RangeResult::partial(items, aggregate(errors)));
		}
		if items.is_empty() {
			return Ok(RangeResult::partial(
				items,
				ChainError::Protocol("no valid transactions found".into()),
			));
		}
		Ok(RangeResult::complete(items))
	}
}
