/// Text shown after a bulk delivery: the subscriber listing followed by the tool output
pub fn delivery_report(kind: &str, subscribers: &str, status: &str) -> String {
    format!("{} Report:\nSubscribers:\n{}\nStatus:\n{}", kind, subscribers, status)
}
