//! Pre-flight diagnostics
//!
//! Checks that the configuration is usable before starting the assistant:
//! credentials, the session store, a test completion against the chat
//! model, a test embedding and the knowledge base directory.

use crate::config::{Config, StorageConfig};
use crate::embeddings::create_embedder;
use crate::error::{AuraError, Result};
use crate::knowledge::discover_documents;
use crate::providers::{create_provider, Message};
use crate::storage::SqliteStorage;

use colored::Colorize;
use std::fmt;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check succeeded
    Pass,
    /// Problem that does not block the assistant
    Warn,
    /// Problem that does
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CheckStatus::Pass => "✓".green(),
            CheckStatus::Warn => "!".yellow(),
            CheckStatus::Fail => "✗".red(),
        };
        write!(f, "{}", symbol)
    }
}

/// One line of the pre-flight report
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// What was checked
    pub name: &'static str,
    /// Outcome
    pub status: CheckStatus,
    /// Human readable detail
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    fn warn(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }
}

/// All pre-flight checks, in the order they ran
#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Number of failed checks
    pub fn failures(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    /// Status of the named check, if it ran
    pub fn status_of(&self, name: &str) -> Option<CheckStatus> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.status)
    }

    /// Render the report with a trailing summary
    pub fn render(&self) -> String {
        let mut out = format!("\n{}\n\n", "Aura pre-flight checks".bold());
        for check in &self.checks {
            out.push_str(&format!("{} {}: {}\n", check.status, check.name.bold(), check.detail));
        }

        let summary = format!(
            "{} passed, {} warnings, {} failed",
            self.count(CheckStatus::Pass),
            self.count(CheckStatus::Warn),
            self.failures()
        );
        let summary = if self.failures() > 0 {
            summary.red()
        } else {
            summary.green()
        };
        out.push_str(&format!("\n{}\n", summary));
        out
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

/// The session store must already exist with every table; nothing is created
fn database_check(storage: &StorageConfig) -> CheckResult {
    let path = match storage.resolve_db_path() {
        Ok(path) => path,
        Err(e) => return CheckResult::fail("Database", format!("{:#}", e)),
    };
    let storage = match SqliteStorage::attach(&path) {
        Ok(storage) => storage,
        Err(_) => {
            return CheckResult::fail(
                "Database",
                format!("{} not found; run `aura setup-db`", path.display()),
            )
        }
    };

    match storage.missing_tables() {
        Ok(missing) if missing.is_empty() => {
            CheckResult::pass("Database", format!("{}", path.display()))
        }
        Ok(missing) => CheckResult::fail(
            "Database",
            format!("missing tables: {}; run `aura setup-db`", missing.join(", ")),
        ),
        Err(e) => CheckResult::fail("Database", format!("{:#}", e)),
    }
}

/// Run every check against `config`
///
/// Never fails; problems are reported as failed checks.
pub async fn run_checks(config: &Config) -> PreflightReport {
    let mut report = PreflightReport::default();

    report.checks.push(match config.validate() {
        Ok(()) => CheckResult::pass(
            "Configuration",
            format!(
                "provider {}, embeddings {}",
                config.provider.provider_type,
                config.embeddings.effective_provider(&config.provider)
            ),
        ),
        Err(e) => CheckResult::fail("Configuration", format!("{:#}", e)),
    });

    report.checks.push(database_check(&config.storage));

    let provider = create_provider(&config.provider.provider_type, &config.provider);
    report.checks.push(match &provider {
        Ok(provider) => CheckResult::pass(
            "Chat credentials",
            format!(
                "model {}",
                provider
                    .get_current_model()
                    .unwrap_or_else(|_| "unknown".to_string())
            ),
        ),
        Err(e) => CheckResult::fail("Chat credentials", format!("{:#}", e)),
    });

    report.checks.push(match &provider {
        Ok(provider) => match provider.complete(&[Message::user("Say 'OK'")], &[]).await {
            Ok(response) => CheckResult::pass(
                "Chat model",
                format!("responded \"{}\"", first_line(response.message.text())),
            ),
            Err(e) => CheckResult::fail("Chat model", format!("{:#}", e)),
        },
        Err(_) => CheckResult::fail("Chat model", "skipped: no usable provider"),
    });

    report
        .checks
        .push(match create_embedder(&config.embeddings, &config.provider) {
            Ok(embedder) => match embedder.embed_query("test").await {
                Ok(vector) => CheckResult::pass(
                    "Embeddings",
                    format!("{} returned dimension {}", embedder.model_name(), vector.len()),
                ),
                Err(e) => CheckResult::fail("Embeddings", format!("{:#}", e)),
            },
            Err(e) => CheckResult::fail("Embeddings", format!("{:#}", e)),
        });

    let base = &config.knowledge.base_path;
    report.checks.push(match discover_documents(base) {
        Ok(documents) if documents.is_empty() => CheckResult::warn(
            "Knowledge base",
            format!("{} contains no markdown guides", base.display()),
        ),
        Ok(documents) => CheckResult::pass(
            "Knowledge base",
            format!("{} guides in {}", documents.len(), base.display()),
        ),
        Err(_) => CheckResult::warn(
            "Knowledge base",
            format!("{} not found; guide search will be unavailable", base.display()),
        ),
    });

    report
}

/// Print the pre-flight report
///
/// # Errors
///
/// Returns an error when any check failed, so the process exits non-zero
pub async fn run_preflight(config: &Config) -> Result<()> {
    let report = run_checks(config).await;
    print!("{}", report.render());

    match report.failures() {
        0 => Ok(()),
        n => Err(AuraError::Config(format!("{} pre-flight checks failed", n)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.db_path = Some(dir.join("aura.db"));
        config.knowledge.base_path = dir.join("no-such-guides");
        SqliteStorage::new_with_path(dir.join("aura.db")).unwrap();
        config
    }

    fn database_detail(report: &PreflightReport) -> String {
        report
            .checks
            .iter()
            .find(|c| c.name == "Database")
            .map(|c| c.detail.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_database_is_reported_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        let db_path = dir.path().join("state").join("absent.db");
        config.storage.db_path = Some(db_path.clone());

        let report = run_checks(&config).await;
        assert_eq!(report.status_of("Database"), Some(CheckStatus::Fail));
        assert!(database_detail(&report).contains("aura setup-db"));
        assert!(!db_path.exists());
        assert!(!dir.path().join("state").exists());
    }

    #[tokio::test]
    async fn test_database_without_schema_lists_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        let db_path = dir.path().join("empty.db");
        std::fs::write(&db_path, b"").unwrap();
        config.storage.db_path = Some(db_path);

        let report = run_checks(&config).await;
        assert_eq!(report.status_of("Database"), Some(CheckStatus::Fail));
        let detail = database_detail(&report);
        assert!(detail.starts_with("missing tables: messages, sessions"));
        assert!(detail.ends_with("run `aura setup-db`"));
    }

    #[tokio::test]
    async fn test_missing_azure_credentials_fail_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_checks(&offline_config(dir.path())).await;

        assert_eq!(report.status_of("Configuration"), Some(CheckStatus::Pass));
        assert_eq!(report.status_of("Database"), Some(CheckStatus::Pass));
        assert_eq!(report.status_of("Chat credentials"), Some(CheckStatus::Fail));
        assert_eq!(report.status_of("Chat model"), Some(CheckStatus::Fail));
        assert_eq!(report.status_of("Embeddings"), Some(CheckStatus::Fail));
        assert_eq!(report.status_of("Knowledge base"), Some(CheckStatus::Warn));
        assert_eq!(report.failures(), 3);
    }

    #[tokio::test]
    async fn test_preflight_errors_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_preflight(&offline_config(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("3 pre-flight checks failed"));
    }

    #[tokio::test]
    async fn test_guides_directory_counts_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let guides = dir.path().join("guides");
        std::fs::create_dir_all(&guides).unwrap();
        std::fs::write(guides.join("vacuum.md"), "# Vacuum\n").unwrap();

        let mut config = offline_config(dir.path());
        config.knowledge.base_path = guides;
        let report = run_checks(&config).await;

        let check = report
            .checks
            .iter()
            .find(|c| c.name == "Knowledge base")
            .unwrap();
        assert_eq!(check.status, CheckStatus::Pass);
        assert!(check.detail.starts_with("1 guides"));
    }

    #[test]
    fn test_render_summary() {
        let report = PreflightReport {
            checks: vec![
                CheckResult::pass("Database", "ok"),
                CheckResult::warn("Knowledge base", "missing"),
            ],
        };
        let text = report.render();
        assert!(text.contains("1 passed, 1 warnings, 0 failed"));
    }
}
