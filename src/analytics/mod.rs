/// Structured call log and its summaries.
///
/// Every API call appends one JSONL line; `crmlens history` reads them back.
pub mod logger;
pub mod reporter;
