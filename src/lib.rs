#![doc(html_root_url = "https://docs.rs/vetting-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Incremental DOM reconciliation for a locale-data vetting table.
//!
//! A [`TableSession`] owns the table shown for one page. Feeding it a [`FullTablePayload`] through
//! [`TableSession::insert_rows`] either updates the live table in place (if the payload is
//! [compatible](`compat::is_compatible`) with it) or builds a new one. Rows whose [`Fingerprint`](`fingerprint::Fingerprint`)
//! didn't change are left alone, and rows with a vote in flight are never touched by a full-table pass.
//!
//! Single rows are updated with [`refresh::refresh_one`] and [`refresh::submit_vote`], which talk to the server through a
//! [`RowTransport`](`transport::RowTransport`).
//!
//! The DOM itself is abstracted as [`Dom`](`dom::Dom`): [`web::WebDom`] drives a browser document,
//! [`memory::MemoryDom`] an in-memory tree that is convenient for tests.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod compat;
pub mod dom;
pub mod fingerprint;
pub mod memory;
pub mod model;
pub mod notifications;
pub mod partition;
pub mod path_headers;
pub mod payload;
pub mod reconcile;
pub mod refresh;
pub mod render;
pub mod row;
pub mod session;
pub mod strings;
pub mod transport;
pub mod web;

pub use payload::{FullTablePayload, SingleRowPayload};
pub use reconcile::ReconcileReport;
pub use session::{PageContext, TableOptions, TableSession};

/// Row values and other locale data only show up in logs with the `"dangerous-logging"` feature.
pub(crate) fn loggable(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"<redacted>"
	}
}
