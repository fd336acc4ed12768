//! User-facing text.

/// Looks up user-facing strings by key.
pub trait Localizer {
	/// The string for `key`. Unknown keys should come back as the key itself.
	fn get(&self, key: &str) -> String;

	/// The string for `key` with `{0}`, `{1}`, … replaced by `args`.
	fn sub(&self, key: &str, args: &[&str]) -> String {
		args.iter().enumerate().fold(self.get(key), |text, (i, arg)| text.replace(&format!("{{{}}}", i), arg))
	}
}

/// Built-in English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStrings;

impl Localizer for EnglishStrings {
	fn get(&self, key: &str) -> String {
		match key {
			"approved" => "Approved",
			"contributed" => "Contributed",
			"provisional" => "Provisional",
			"unconfirmed" => "Unconfirmed",
			"missing" => "Missing",
			"inherited-unconfirmed" => "Inherited and Unconfirmed",
			"inherited-provisional" => "Inherited and Provisional",
			"draftStatus" => "Status: {0}",
			"voTrue" => "You have already voted on this item.",
			"voFalse" => "You have not yet voted on this item.",
			"flag_desc" => "This item has been flagged for review by the technical committee.",
			"flag_d_desc" => "Losing items may be flagged for review by the technical committee.",
			"voteInfo_baseline_desc" => "This is the baseline value.",
			"voteInfo_override_desc" => "Your vote counts with an overridden weight of {0}.",
			"file_a_ticket" => "File a ticket to change this value.",
			"file_ticket_notice" => "This value can only be changed by filing a ticket.",
			"file_ticket_unofficial" => "This is not the production Survey Tool, so tickets filed here are ignored.",
			"forumNewPostButton" => "Forum",
			"forumNewPostButton_desc" => "Open a forum post about this item.",
			"abstain" => "Abstain",
			"addValue" => "Add",
			"optional" => "optional",
			"history" => "history",
			"missingRow" => "ERROR: missing row",
			"loadError" => "Error while loading: {0}",
			"voteError" => "Could not check value. Try reloading the page. {0}",
			"code" => "Code",
			"comparison" => "English",
			"status" => "A",
			"proposed" => "Winning",
			"add" => "Add",
			"others" => "Others",
			other => other,
		}
		.to_owned()
	}
}
