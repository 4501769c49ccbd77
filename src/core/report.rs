use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 停用流程的固定步驟，宣告順序即執行順序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    FetchIdentity,
    DisableSignIn,
    ResetCredential,
    RevokeSessions,
    RemoveGroupMemberships,
    ConvertMailbox,
    SetForwarding,
    SetAutoReply,
    RemoveLicenses,
}

impl StepName {
    pub const ALL: [StepName; 9] = [
        StepName::FetchIdentity,
        StepName::DisableSignIn,
        StepName::ResetCredential,
        StepName::RevokeSessions,
        StepName::RemoveGroupMemberships,
        StepName::ConvertMailbox,
        StepName::SetForwarding,
        StepName::SetAutoReply,
        StepName::RemoveLicenses,
    ];

    /// 信箱分支的三個步驟，跳過時一起處理。
    pub const MAILBOX_BRANCH: [StepName; 3] = [
        StepName::ConvertMailbox,
        StepName::SetForwarding,
        StepName::SetAutoReply,
    ];

    pub fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or(Self::ALL.len())
    }

    /// 每個步驟失敗時的處理方式。
    pub fn policy(self) -> StepPolicy {
        match self {
            StepName::FetchIdentity
            | StepName::DisableSignIn
            | StepName::ResetCredential
            | StepName::RevokeSessions => StepPolicy::Fatal,
            StepName::ConvertMailbox => StepPolicy::SkipBranch,
            StepName::RemoveGroupMemberships
            | StepName::SetForwarding
            | StepName::SetAutoReply
            | StepName::RemoveLicenses => StepPolicy::ContinueItem,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepName::FetchIdentity => "fetch-identity",
            StepName::DisableSignIn => "disable-sign-in",
            StepName::ResetCredential => "reset-credential",
            StepName::RevokeSessions => "revoke-sessions",
            StepName::RemoveGroupMemberships => "remove-group-memberships",
            StepName::ConvertMailbox => "convert-mailbox",
            StepName::SetForwarding => "set-forwarding",
            StepName::SetAutoReply => "set-auto-reply",
            StepName::RemoveLicenses => "remove-licenses",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 步驟失敗政策：中止整個流程、跳過剩餘分支、或記錄後繼續。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    Fatal,
    SkipBranch,
    ContinueItem,
}

/// 跳過原因要保留區別：營運人員需要分辨「基礎設施故障」和「本來就沒有信箱」。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MailboxServiceUnavailable,
    MailboxAbsent,
    ConversionFailed,
    NoForwardingTarget,
}

impl SkipReason {
    /// 缺少轉寄目標是呼叫端的選擇，不算流程降級。
    pub fn degrades(self) -> bool {
        !matches!(self, SkipReason::NoForwardingTarget)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MailboxServiceUnavailable => "mailbox service unavailable",
            SkipReason::MailboxAbsent => "no mailbox for this identity",
            SkipReason::ConversionFailed => "mailbox conversion failed",
            SkipReason::NoForwardingTarget => "no forwarding target supplied",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    NotExecuted,
    Success,
    Skipped { reason: SkipReason },
    Failed { detail: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// 單一群組成員資格的移除結果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemResult {
    Removed,
    Failed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub id: String,
    pub display_name: String,
    #[serde(flatten)]
    pub result: ItemResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepName,
    pub policy: StepPolicy,
    pub outcome: StepOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemOutcome>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Partial,
    Failed,
}

impl OverallStatus {
    /// FATAL 中止必須和其他結果區分；PARTIAL 在 forward-only 的設計下視同完成。
    pub fn exit_code(self) -> i32 {
        match self {
            OverallStatus::Success | OverallStatus::Partial => 0,
            OverallStatus::Failed => 1,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallStatus::Success => "SUCCESS",
            OverallStatus::Partial => "PARTIAL",
            OverallStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffboardingReport {
    pub user: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
    pub overall: OverallStatus,
}

impl OffboardingReport {
    /// 給終端使用者看的摘要表格。
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Offboarding report for {}", self.user));
        lines.push(format!(
            "  started {} / finished {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for (index, record) in self.steps.iter().enumerate() {
            let outcome = match &record.outcome {
                StepOutcome::NotExecuted => "not executed".to_string(),
                StepOutcome::Success => "success".to_string(),
                StepOutcome::Skipped { reason } => format!("skipped ({})", reason),
                StepOutcome::Failed { detail } => format!("failed: {}", detail),
            };
            lines.push(format!(
                "  {}. {:<26} {} ({} ms)",
                index + 1,
                record.step.as_str(),
                outcome,
                record.duration_ms
            ));

            for item in &record.items {
                let result = match &item.result {
                    ItemResult::Removed => "removed".to_string(),
                    ItemResult::Failed { detail } => format!("failed: {}", detail),
                };
                lines.push(format!("       - {} ({}): {}", item.display_name, item.id, result));
            }
        }

        lines.push(format!("  overall: {}", self.overall));
        lines.join("\n")
    }
}

/// 報告建構器。步驟先以 NotExecuted 依序預填，
/// 之後不論流程從哪個點中止，報告的步驟順序和未執行標記都成立。
pub struct ReportBuilder {
    user: String,
    started_at: DateTime<Utc>,
    steps: Vec<StepRecord>,
}

impl ReportBuilder {
    pub fn new(user: impl Into<String>) -> Self {
        let steps = StepName::ALL
            .iter()
            .map(|step| StepRecord {
                step: *step,
                policy: step.policy(),
                outcome: StepOutcome::NotExecuted,
                items: Vec::new(),
                duration_ms: 0,
            })
            .collect();

        Self {
            user: user.into(),
            started_at: Utc::now(),
            steps,
        }
    }

    pub fn record(&mut self, step: StepName, outcome: StepOutcome, duration: Duration) {
        let record = &mut self.steps[step.ordinal()];
        record.outcome = outcome;
        record.duration_ms = duration.as_millis() as u64;
    }

    pub fn record_items(
        &mut self,
        step: StepName,
        outcome: StepOutcome,
        items: Vec<ItemOutcome>,
        duration: Duration,
    ) {
        let record = &mut self.steps[step.ordinal()];
        record.outcome = outcome;
        record.items = items;
        record.duration_ms = duration.as_millis() as u64;
    }

    pub fn finish(self) -> OffboardingReport {
        let overall = compute_overall(&self.steps);
        OffboardingReport {
            user: self.user,
            started_at: self.started_at,
            finished_at: Utc::now(),
            steps: self.steps,
            overall,
        }
    }
}

fn compute_overall(steps: &[StepRecord]) -> OverallStatus {
    let fatal_failure = steps
        .iter()
        .any(|record| record.policy == StepPolicy::Fatal && record.outcome.is_failure());
    if fatal_failure {
        return OverallStatus::Failed;
    }

    let degraded = steps.iter().any(|record| {
        let step_degraded = match &record.outcome {
            StepOutcome::Failed { .. } => true,
            StepOutcome::Skipped { reason } => reason.degrades(),
            _ => false,
        };
        step_degraded
            || record
                .items
                .iter()
                .any(|item| matches!(item.result, ItemResult::Failed { .. }))
    });

    if degraded {
        OverallStatus::Partial
    } else {
        OverallStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_success_builder() -> ReportBuilder {
        let mut builder = ReportBuilder::new("alice@contoso.com");
        for step in StepName::ALL {
            builder.record(step, StepOutcome::Success, Duration::from_millis(5));
        }
        builder
    }

    #[test]
    fn test_steps_are_seeded_in_ordinal_order() {
        let report = ReportBuilder::new("alice@contoso.com").finish();
        let names: Vec<StepName> = report.steps.iter().map(|r| r.step).collect();
        assert_eq!(names, StepName::ALL.to_vec());
        assert!(report
            .steps
            .iter()
            .all(|r| r.outcome == StepOutcome::NotExecuted));
    }

    #[test]
    fn test_all_success_is_success() {
        let report = all_success_builder().finish();
        assert_eq!(report.overall, OverallStatus::Success);
        assert_eq!(report.overall.exit_code(), 0);
    }

    #[test]
    fn test_fatal_failure_is_failed() {
        let mut builder = ReportBuilder::new("alice@contoso.com");
        builder.record(StepName::FetchIdentity, StepOutcome::Success, Duration::ZERO);
        builder.record(
            StepName::DisableSignIn,
            StepOutcome::Failed {
                detail: "401".to_string(),
            },
            Duration::ZERO,
        );
        let report = builder.finish();
        assert_eq!(report.overall, OverallStatus::Failed);
        assert_eq!(report.overall.exit_code(), 1);
    }

    #[test]
    fn test_branch_skip_is_partial() {
        let mut builder = all_success_builder();
        for step in StepName::MAILBOX_BRANCH {
            builder.record(
                step,
                StepOutcome::Skipped {
                    reason: SkipReason::MailboxServiceUnavailable,
                },
                Duration::ZERO,
            );
        }
        let report = builder.finish();
        assert_eq!(report.overall, OverallStatus::Partial);
        assert_eq!(report.overall.exit_code(), 0);
    }

    #[test]
    fn test_missing_forwarding_target_does_not_degrade() {
        let mut builder = all_success_builder();
        builder.record(
            StepName::SetForwarding,
            StepOutcome::Skipped {
                reason: SkipReason::NoForwardingTarget,
            },
            Duration::ZERO,
        );
        let report = builder.finish();
        assert_eq!(report.overall, OverallStatus::Success);
    }

    #[test]
    fn test_failed_item_is_partial() {
        let mut builder = all_success_builder();
        builder.record_items(
            StepName::RemoveGroupMemberships,
            StepOutcome::Success,
            vec![ItemOutcome {
                id: "g2".to_string(),
                display_name: "Engineering".to_string(),
                result: ItemResult::Failed {
                    detail: "permission denied".to_string(),
                },
            }],
            Duration::ZERO,
        );
        let report = builder.finish();
        assert_eq!(report.overall, OverallStatus::Partial);
    }

    #[test]
    fn test_report_serializes_and_round_trips() {
        let mut builder = all_success_builder();
        builder.record(
            StepName::SetForwarding,
            StepOutcome::Skipped {
                reason: SkipReason::NoForwardingTarget,
            },
            Duration::from_millis(3),
        );
        let report = builder.finish();

        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"fetch-identity\""));
        assert!(json.contains("no_forwarding_target"));

        let parsed: OffboardingReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.overall, report.overall);
        assert_eq!(parsed.steps.len(), StepName::ALL.len());
    }

    #[test]
    fn test_render_lists_every_step_and_items() {
        let mut builder = all_success_builder();
        builder.record_items(
            StepName::RemoveGroupMemberships,
            StepOutcome::Success,
            vec![ItemOutcome {
                id: "g1".to_string(),
                display_name: "Sales".to_string(),
                result: ItemResult::Removed,
            }],
            Duration::ZERO,
        );
        let rendered = builder.finish().render();
        for step in StepName::ALL {
            assert!(rendered.contains(step.as_str()), "missing {}", step);
        }
        assert!(rendered.contains("Sales"));
        assert!(rendered.contains("overall: SUCCESS"));
    }
}
