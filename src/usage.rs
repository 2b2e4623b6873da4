use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use log::warn;

use crate::deepseek::UsageCounters;

/// DeepSeek pricing, dollars per 1M tokens
const INPUT_PRICE_PER_M: f64 = 0.07;
const OUTPUT_PRICE_PER_M: f64 = 1.1;

#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub endpoint: &'static str,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl UsageEntry {
    pub fn new(endpoint: &'static str, usage: UsageCounters) -> Self {
        Self {
            endpoint,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }

    pub fn input_cost(&self) -> f64 {
        self.input_tokens as f64 / 1_000_000.0 * INPUT_PRICE_PER_M
    }

    pub fn output_cost(&self) -> f64 {
        self.output_tokens as f64 / 1_000_000.0 * OUTPUT_PRICE_PER_M
    }

    pub fn total_cost(&self) -> f64 {
        self.input_cost() + self.output_cost()
    }
}

/// Where usage records go. Recording is observability only: implementations
/// swallow their own failures and must never fail the request.
pub trait UsageSink: Send + Sync {
    fn record(&self, entry: &UsageEntry);
}

/// Sink used when usage logging is disabled
pub struct NullUsageSink;

impl UsageSink for NullUsageSink {
    fn record(&self, _entry: &UsageEntry) {}
}

/// Human-readable markdown log, created with a pricing header on first use
/// and appended to afterwards. The file is opened in append mode per write
/// so concurrent requests interleave rather than clobber.
pub struct FileUsageLog {
    path: PathBuf,
}

impl FileUsageLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, entry: &UsageEntry) -> std::io::Result<()> {
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if is_new {
            file.write_all(log_header().as_bytes())?;
        }
        file.write_all(format_entry(entry, &Utc::now().to_rfc3339()).as_bytes())?;
        Ok(())
    }
}

impl UsageSink for FileUsageLog {
    fn record(&self, entry: &UsageEntry) {
        if let Err(e) = self.append(entry) {
            warn!("Failed to record token usage: {e}");
        }
    }
}

fn log_header() -> String {
    format!(
        "# DeepSeek API Token Usage Log\n\n\
         ## Pricing\n\
         - Input: ${INPUT_PRICE_PER_M} per 1M tokens\n\
         - Output: ${OUTPUT_PRICE_PER_M} per 1M tokens\n\n"
    )
}

fn format_entry(entry: &UsageEntry, timestamp: &str) -> String {
    format!(
        "\n## API Call at {timestamp}\n\
         - **Endpoint**: {}\n\
         - **Input Tokens**: {} (${:.4})\n\
         - **Output Tokens**: {} (${:.4})\n\
         - **Total Tokens**: {}\n\
         - **Total Cost**: ${:.4}\n",
        entry.endpoint,
        entry.input_tokens,
        entry.input_cost(),
        entry.output_tokens,
        entry.output_cost(),
        entry.total_tokens,
        entry.total_cost(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(input: u64, output: u64) -> UsageEntry {
        UsageEntry {
            endpoint: "research",
            input_tokens: input,
            output_tokens: output,
            total_tokens: input + output,
        }
    }

    #[test]
    fn test_cost_per_million_tokens() {
        let e = entry(1_000_000, 1_000_000);
        assert!((e.input_cost() - 0.07).abs() < 1e-9);
        assert!((e.output_cost() - 1.1).abs() < 1e-9);
        assert!((e.total_cost() - 1.17).abs() < 1e-9);
    }

    #[test]
    fn test_cost_zero_tokens() {
        let e = entry(0, 0);
        assert_eq!(e.total_cost(), 0.0);
    }

    #[test]
    fn test_format_entry_fields() {
        let text = format_entry(&entry(1200, 340), "2026-08-06T12:00:00+00:00");
        assert!(text.contains("## API Call at 2026-08-06T12:00:00+00:00"));
        assert!(text.contains("- **Endpoint**: research"));
        assert!(text.contains("- **Input Tokens**: 1200 ($0.0001)"));
        assert!(text.contains("- **Total Tokens**: 1540"));
    }

    #[test]
    fn test_header_lists_prices() {
        let header = log_header();
        assert!(header.contains("- Input: $0.07 per 1M tokens"));
        assert!(header.contains("- Output: $1.1 per 1M tokens"));
    }

    #[test]
    fn test_file_log_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token-usage.md");
        let log = FileUsageLog::new(path.clone());

        log.record(&entry(100, 50));
        log.record(&entry(200, 75));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("# DeepSeek API Token Usage Log").count(), 1);
        assert_eq!(content.matches("## API Call at ").count(), 2);
    }

    #[test]
    fn test_file_log_failure_is_swallowed() {
        // Unwritable location: parent directory does not exist
        let log = FileUsageLog::new(PathBuf::from("/nonexistent-dir/usage.md"));
        log.record(&entry(1, 1));
    }

    #[test]
    fn test_null_sink_is_noop() {
        NullUsageSink.record(&entry(1, 1));
    }
}
