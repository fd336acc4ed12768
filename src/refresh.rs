//! Updating one row without a full-table pass, after a vote or on request.
//!
//! These functions borrow the session only between `.await`s, so a full-table pass may land while a row request is in
//! flight. The response is then dropped (as [`RefreshError::Superseded`]) if the row's table is no longer live.

use crate::{
	dom::Dom,
	model::{RowData, StatusAction, TestResult},
	session::{AckStep, TableSession, VoteChoice},
	transport::{RowTransport, TransportError},
};
use core::cell::RefCell;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum RefreshError {
	#[error("no live row has path hash {0}")]
	UnknownRow(String),
	#[error("row {0} was replaced or detached before its update arrived")]
	Superseded(String),
	#[error("the response lacks row {row_key} (path id {path_id:?}, locale {locale})")]
	RowMissing { row_key: String, path_id: Option<u64>, locale: String },
	#[error("the server reported: {0}")]
	Server(String),
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// How a vote ended, if it didn't fail.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
	/// The vote was recorded and the row re-rendered from this data.
	Accepted(RowData),
	/// The server held the vote back, usually because the value fails checks.
	NotSubmitted { test_results: Vec<TestResult>, status_action: Option<StatusAction> },
}

/// Fetches the row with `path_hash` again and re-renders it in place.
///
/// The row shows [`crate::row::VotingState::Checking1`] while the request is in flight.
///
/// # Errors
///
/// Iff the row is unknown, was superseded, or couldn't be loaded. In the latter two cases the row shows an error.
#[instrument(skip(session, transport))]
pub async fn refresh_one<D: Dom, T: RowTransport + ?Sized>(session: &RefCell<TableSession<D>>, transport: &T, path_hash: &str) -> Result<RowData, RefreshError> {
	let (table, request) = session.borrow_mut().begin_refresh(path_hash)?;
	let response = transport.fetch_row(request).await;
	session.borrow_mut().finish_refresh(table, path_hash, response)
}

/// Submits a vote on the row with `path_hash` and, if it is accepted, refreshes that row.
///
/// The row shows [`crate::row::VotingState::Checking1`] until the vote is acknowledged
/// and [`crate::row::VotingState::Checking2`] while the refreshed row is loading.
///
/// # Errors
///
/// Iff the row is unknown or superseded, the vote or refresh request failed, or the server rejected the vote outright.
#[instrument(skip(session, transport))]
pub async fn submit_vote<D: Dom, T: RowTransport + ?Sized>(session: &RefCell<TableSession<D>>, transport: &T, path_hash: &str, choice: VoteChoice) -> Result<VoteOutcome, RefreshError> {
	let (table, vote) = session.borrow_mut().begin_vote(path_hash, choice)?;
	let ack = transport.submit_vote(vote).await;

	let step = session.borrow_mut().acknowledge_vote(table, path_hash, ack)?;
	let request = match step {
		AckStep::Refresh(request) => request,
		AckStep::NotSubmitted(ack) => {
			debug!("Vote on row {} was not submitted.", path_hash);
			return Ok(VoteOutcome::NotSubmitted {
				test_results: ack.test_results,
				status_action: ack.status_action,
			});
		}
	};

	let response = transport.fetch_row(request).await;
	session.borrow_mut().finish_refresh(table, path_hash, response).map(VoteOutcome::Accepted)
}
