use chrono::Local;

use crate::wire::Message;

pub(crate) const SEARCH_SYSTEM_PROMPT: &str = "You are a web search assistant \
with access to live web results. Search the web for the information the user \
asks about and answer with a JSON-encoded list of results. Each result must \
include a `url`, a short `title`, and a `summary` snippet of the page content. \
Return only the JSON list, without surrounding prose.";

pub(crate) const FETCH_SYSTEM_PROMPT: &str = "You are a web page reader. Fetch \
the page at the URL the user provides and convert its complete content to \
well-structured Markdown. Preserve headings, text, links, images, tables, and \
code blocks; drop scripts, styles, and navigation chrome. Do not summarize, \
modify, or translate the content.";

/// Focus and result-count constraints folded into a search prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    /// Platforms the search should focus on ("Twitter", "GitHub", ...).
    pub platform: Option<String>,
    /// Lower bound on the number of returned results.
    pub min_results: u32,
    /// Upper bound on the number of returned results. Zero drops the
    /// result-count constraint from the prompt.
    pub max_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            platform: None,
            min_results: 3,
            max_results: 10,
        }
    }
}

pub(crate) fn search_messages(query: &str, options: &SearchOptions) -> Vec<Message> {
    let mut user = String::new();
    if needs_time_context(query) {
        user.push_str(&time_context());
        user.push('\n');
    }
    user.push_str(query);

    if let Some(platform) = options.platform.as_deref().filter(|p| !p.is_empty()) {
        user.push_str(
            "\n\nYou should search the web for the information you need, \
             and focus on these platform: ",
        );
        user.push_str(platform);
    }

    if options.max_results > 0 {
        user.push_str(&format!(
            "\n\nYou should return the results in a JSON format, and the \
             results should at least be {} and at most be {} results.",
            options.min_results, options.max_results
        ));
    }

    vec![Message::system(SEARCH_SYSTEM_PROMPT), Message::user(user)]
}

pub(crate) fn fetch_messages(url: &str) -> Vec<Message> {
    vec![
        Message::system(FETCH_SYSTEM_PROMPT),
        Message::user(format!(
            "{url}\nFetch this page and return its content as structured Markdown"
        )),
    ]
}

const TIME_KEYWORDS_EN: [&str; 21] = [
    "current",
    "now",
    "today",
    "tomorrow",
    "yesterday",
    "this week",
    "last week",
    "next week",
    "this month",
    "last month",
    "next month",
    "this year",
    "last year",
    "next year",
    "latest",
    "recent",
    "recently",
    "just now",
    "real-time",
    "realtime",
    "up-to-date",
];

const TIME_KEYWORDS_ZH: [&str; 22] = [
    "当前", "现在", "今天", "明天", "昨天", "本周", "上周", "下周", "这周", "本月", "上月",
    "下月", "这个月", "今年", "去年", "明年", "最新", "最近", "近期", "刚刚", "刚才", "实时",
];

/// Whether the query asks about something time-sensitive and should carry
/// the current-time context block.
fn needs_time_context(query: &str) -> bool {
    let lowered = query.to_lowercase();
    TIME_KEYWORDS_EN.iter().any(|kw| lowered.contains(kw))
        || TIME_KEYWORDS_ZH.iter().any(|kw| query.contains(kw))
}

/// Current local date/time block injected ahead of time-sensitive queries.
fn time_context() -> String {
    let now = Local::now();
    format!(
        "[Current Time Context]\n- Date: {} ({})\n- Time: {}\n- Timezone: UTC{}\n",
        now.format("%Y-%m-%d"),
        now.format("%A"),
        now.format("%H:%M:%S"),
        now.format("%:z"),
    )
}
