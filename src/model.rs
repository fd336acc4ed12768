//! Row data as delivered by the vetting server.
//!
//! Field names follow the current JSON API (`camelCase`), with `alias`es for the names the legacy `SurveyAjax` endpoint still emits.

use core::{convert::TryFrom, fmt};
use serde::{
	de::{self, MapAccess, Visitor},
	ser::SerializeMap,
	Deserialize, Deserializer, Serialize, Serializer,
};
use std::collections::BTreeMap;

/// Sentinel value hash (and value) meaning "there is no winning value".
pub const NO_WINNING_VALUE: &str = "no-winning-value";

/// Candidate value standing for "inherit the value from the parent locale".
pub const INHERITANCE_MARKER: &str = "↑↑↑";

/// Coverage level of rows that are shown but not required.
pub const OPTIONAL_COVERAGE: i32 = 101;

/// Paths whose inheritance marker may legitimately resolve to no inherited value.
const NULL_VALUE_PATH_FRAGMENTS: [&str; 3] = ["/timeZoneNames/metazone", "/timeZoneNames/zone", "/dayPeriods/dayPeriodContext"];

pub type RowKey = String;

/// One row of the vetting table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowData {
	#[serde(default, alias = "xpathId")]
	pub path_id: Option<u64>,
	#[serde(alias = "xpstrid")]
	pub path_hash: String,
	#[serde(default, alias = "xpath", skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	#[serde(default)]
	pub display_name: Option<String>,
	#[serde(default)]
	pub display_example: Option<String>,
	#[serde(default)]
	pub code: String,
	#[serde(default, alias = "coverageValue", deserialize_with = "lenient_coverage")]
	pub coverage_level: i32,
	#[serde(default, alias = "items")]
	pub candidate_items: CandidateItems,
	#[serde(default, alias = "winningVhash", deserialize_with = "non_empty")]
	pub winning_value_hash: Option<String>,
	#[serde(default, alias = "voteVhash", deserialize_with = "non_empty")]
	pub user_vote_value_hash: Option<String>,
	#[serde(default, alias = "hasVoted")]
	pub has_user_voted: bool,
	#[serde(default, deserialize_with = "null_as_default")]
	pub status_action: StatusAction,
	#[serde(default, deserialize_with = "null_as_default")]
	pub confirm_status: ConfirmStatus,
	#[serde(default)]
	pub inherited_value: Option<String>,
	#[serde(default)]
	pub inherited_locale: Option<String>,
	#[serde(default)]
	pub inherited_xpid: Option<String>,
	#[serde(default, alias = "voteResolver")]
	pub vote_resolver_summary: Option<VoteResolverSummary>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub extra_attributes: BTreeMap<String, String>,
	/// Text direction of the locale's values (`"ltr"` or `"rtl"`).
	#[serde(default)]
	pub dir: Option<String>,
	#[serde(flatten)]
	pub flags: RowFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFlags {
	#[serde(default)]
	pub row_flagged: bool,
	#[serde(default)]
	pub can_flag_on_losing: bool,
}

impl RowData {
	/// The winning candidate, unless there is none or it is the [`NO_WINNING_VALUE`] sentinel.
	#[must_use]
	pub fn valid_winning_item(&self) -> Option<&CandidateItem> {
		let hash = self.winning_value_hash.as_deref()?;
		if hash == NO_WINNING_VALUE {
			return None;
		}
		let item = self.candidate_items.get(hash)?;
		match item.value() {
			"" | NO_WINNING_VALUE => None,
			_ => Some(item),
		}
	}

	#[must_use]
	pub fn winning_value(&self) -> Option<&str> {
		self.valid_winning_item().map(CandidateItem::value)
	}

	/// The status class suffix, promoted to an `inherited-*` status if the winner is the [`INHERITANCE_MARKER`].
	#[must_use]
	pub fn approval_status(&self) -> &'static str {
		let status = self.confirm_status.as_str();
		if self.winning_value() == Some(INHERITANCE_MARKER) {
			match self.confirm_status {
				ConfirmStatus::Unconfirmed | ConfirmStatus::Missing | ConfirmStatus::Unknown => "inherited-unconfirmed",
				ConfirmStatus::Provisional => "inherited-provisional",
				ConfirmStatus::Approved | ConfirmStatus::Contributed => status,
			}
		} else {
			status
		}
	}

	#[must_use]
	pub fn is_optional(&self) -> bool {
		self.coverage_level == OPTIONAL_COVERAGE
	}

	/// Whether `path` is one of the paths whose inherited value may be absent.
	#[must_use]
	pub fn allows_null_inherited_value(&self) -> bool {
		self.path.as_deref().map_or(false, |path| NULL_VALUE_PATH_FRAGMENTS.iter().any(|fragment| path.contains(fragment)))
	}

	/// Structural problems worth logging. None of them prevent rendering.
	#[must_use]
	pub fn check_consistency(&self) -> Vec<Inconsistency> {
		let mut found = Vec::new();
		match self.winning_value_hash.as_deref() {
			None => found.push(Inconsistency::NoWinningHash),
			Some(hash) => {
				if self.candidate_items.is_empty() {
					found.push(Inconsistency::NoItems);
				} else if hash != NO_WINNING_VALUE && self.candidate_items.get(hash).is_none() {
					found.push(Inconsistency::WinningItemMissing { value_hash: hash.to_owned() });
				}
			}
		}
		for item in self.candidate_items.iter().filter(|item| item.value() == INHERITANCE_MARKER) {
			if self.inherited_value.is_none() && !self.allows_null_inherited_value() {
				found.push(Inconsistency::InheritanceWithoutValue { value_hash: item.value_hash.clone() });
			}
			if self.inherited_locale.is_none() && self.inherited_xpid.is_none() {
				found.push(Inconsistency::InheritanceWithoutSource { value_hash: item.value_hash.clone() });
			}
		}
		found
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
	NoWinningHash,
	NoItems,
	WinningItemMissing { value_hash: String },
	InheritanceWithoutValue { value_hash: String },
	/// Informational only: the inheritance marker names neither a locale nor a path to inherit from.
	InheritanceWithoutSource { value_hash: String },
}

impl Inconsistency {
	#[must_use]
	pub fn is_error(&self) -> bool {
		!matches!(self, Self::InheritanceWithoutSource { .. })
	}
}

impl fmt::Display for Inconsistency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoWinningHash => f.write_str("row has no winning value hash"),
			Self::NoItems => f.write_str("row has no candidate items"),
			Self::WinningItemMissing { value_hash } => write!(f, "winning value hash {:?} names no candidate item", value_hash),
			Self::InheritanceWithoutValue { value_hash } => write!(f, "candidate {:?} is the inheritance marker, but the row has no inherited value", value_hash),
			Self::InheritanceWithoutSource { value_hash } => write!(f, "candidate {:?} is the inheritance marker, but the row names neither an inherited locale nor an inherited path", value_hash),
		}
	}
}

/// One candidate value of a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
	/// Filled in from the key of the surrounding map if the server omits it.
	#[serde(default)]
	pub value_hash: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub raw_value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	#[serde(default, alias = "pClass", deserialize_with = "null_as_default")]
	pub display_class: DisplayClass,
	#[serde(default, alias = "votes", deserialize_with = "null_as_default")]
	pub votes_by_user_id: BTreeMap<String, VoteInfo>,
	#[serde(default)]
	pub is_baseline_value: bool,
	#[serde(default, alias = "tests", deserialize_with = "null_as_default")]
	pub test_results: Vec<TestResult>,
	#[serde(default)]
	pub example: Option<String>,
	#[serde(default)]
	pub history: Option<String>,
}

impl CandidateItem {
	/// The value as shown, which may be the [`INHERITANCE_MARKER`].
	#[must_use]
	pub fn value(&self) -> &str {
		self.value.as_deref().unwrap_or(&self.raw_value)
	}

	/// The value to display, resolving the [`INHERITANCE_MARKER`] through the row.
	#[must_use]
	pub fn display_value<'a>(&'a self, row: &'a RowData) -> Option<&'a str> {
		match self.value() {
			INHERITANCE_MARKER => row.inherited_value.as_deref(),
			value => Some(value),
		}
	}

	/// [`Severity::Error`] beats [`Severity::Warning`].
	#[must_use]
	pub fn test_kind(&self) -> Option<Severity> {
		if self.test_results.iter().any(|test| test.severity == Severity::Error) {
			Some(Severity::Error)
		} else if self.test_results.iter().any(|test| test.severity == Severity::Warning) {
			Some(Severity::Warning)
		} else {
			None
		}
	}
}

/// Candidates of a row, in the order the server sent them.
///
/// On the wire this is a map from value hash to item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateItems(pub Vec<CandidateItem>);

impl CandidateItems {
	#[must_use]
	pub fn get(&self, value_hash: &str) -> Option<&CandidateItem> {
		self.0.iter().find(|item| item.value_hash == value_hash)
	}

	pub fn iter(&self) -> impl Iterator<Item = &CandidateItem> {
		self.0.iter()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl Serialize for CandidateItems {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for item in &self.0 {
			map.serialize_entry(&item.value_hash, item)?;
		}
		map.end()
	}
}

impl<'de> Deserialize<'de> for CandidateItems {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct ItemsVisitor;
		impl<'de> Visitor<'de> for ItemsVisitor {
			type Value = CandidateItems;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("a map from value hash to candidate item")
			}

			fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
				Ok(CandidateItems::default())
			}

			fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
				Ok(CandidateItems::default())
			}

			fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
				let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
				while let Some((key, mut item)) = access.next_entry::<String, CandidateItem>()? {
					if item.value_hash.is_empty() {
						item.value_hash = key;
					}
					items.push(item);
				}
				Ok(CandidateItems(items))
			}
		}
		deserializer.deserialize_any(ItemsVisitor)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInfo {
	#[serde(default, alias = "overridedVotes")]
	pub override_votes: Option<u32>,
	#[serde(default)]
	pub org: Option<String>,
	#[serde(default)]
	pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
	#[serde(alias = "type")]
	pub severity: Severity,
	#[serde(default)]
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
	Warning,
	Error,
	#[serde(other)]
	Info,
}

impl Severity {
	/// Class of a candidate's `<div>` for this test outcome.
	#[must_use]
	pub fn item_class(severity: Option<Self>) -> &'static str {
		match severity {
			Some(Self::Error) => "d-item-err",
			Some(Self::Warning) => "d-item-warn",
			Some(Self::Info) | None => "d-item",
		}
	}
}

/// Display classification of a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayClass {
	Winner,
	Value,
	Alias,
	Fallback,
	FallbackCode,
	FallbackRoot,
	Loser,
	#[serde(other)]
	Other,
}

impl Default for DisplayClass {
	fn default() -> Self {
		Self::Value
	}
}

impl DisplayClass {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Winner => "winner",
			Self::Value | Self::Other => "value",
			Self::Alias => "alias",
			Self::Fallback => "fallback",
			Self::FallbackCode => "fallback_code",
			Self::FallbackRoot => "fallback_root",
			Self::Loser => "loser",
		}
	}
}

/// What the current user may do with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusAction {
	Allow,
	AllowVotingAndTicket,
	AllowVotingButNoAdd,
	AllowTicketOnly,
	#[serde(other)]
	Forbid,
}

impl Default for StatusAction {
	fn default() -> Self {
		Self::Forbid
	}
}

impl StatusAction {
	#[must_use]
	pub fn capabilities(self) -> StatusCapabilities {
		let (vote, ticket, change) = match self {
			Self::Allow => (true, false, true),
			Self::AllowVotingAndTicket => (true, true, false),
			Self::AllowVotingButNoAdd => (true, false, false),
			Self::AllowTicketOnly => (false, true, true),
			Self::Forbid => (false, false, false),
		};
		StatusCapabilities { vote, ticket, change }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCapabilities {
	pub vote: bool,
	pub ticket: bool,
	pub change: bool,
}

impl StatusCapabilities {
	/// Combines the row's capabilities with the table-wide modify permission.
	#[must_use]
	pub fn for_table(self, table_can_modify: bool) -> RowCapabilities {
		let can_modify = table_can_modify && self.vote;
		RowCapabilities {
			can_modify,
			ticket_only: table_can_modify && self.ticket,
			can_change: can_modify && self.change,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCapabilities {
	pub can_modify: bool,
	pub ticket_only: bool,
	pub can_change: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmStatus {
	Approved,
	Contributed,
	Provisional,
	Unconfirmed,
	Missing,
	#[serde(other)]
	Unknown,
}

impl Default for ConfirmStatus {
	fn default() -> Self {
		Self::Missing
	}
}

impl ConfirmStatus {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Approved => "approved",
			Self::Contributed => "contributed",
			Self::Provisional => "provisional",
			Self::Unconfirmed => "unconfirmed",
			Self::Missing | Self::Unknown => "missing",
		}
	}
}

/// Opaque tallies from the vote resolver. Only carried along for the info panel and fingerprinting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResolverSummary {
	#[serde(default)]
	pub required_votes: Option<u32>,
	#[serde(default)]
	pub winning_status: Option<String>,
	#[serde(default)]
	pub winning_value: Option<String>,
	#[serde(default, alias = "value_vote", deserialize_with = "null_as_default")]
	pub value_votes: Vec<serde_json::Value>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub orgs: BTreeMap<String, serde_json::Value>,
}

pub(crate) fn null_as_default<'de, D: Deserializer<'de>, T: Default + Deserialize<'de>>(deserializer: D) -> Result<T, D::Error> {
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.is_empty()))
}

/// Accepts `10`, `"10"` and `null` (as `0`).
fn lenient_coverage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Lenient {
		Number(i64),
		Text(String),
	}

	match Option::<Lenient>::deserialize(deserializer)? {
		None => Ok(0),
		Some(Lenient::Number(number)) => i32::try_from(number).map_err(de::Error::custom),
		Some(Lenient::Text(text)) => text.trim().parse().map_err(de::Error::custom),
	}
}
