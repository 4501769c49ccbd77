use crate::core::report::{
    ItemOutcome, ItemResult, OffboardingReport, ReportBuilder, SkipReason, StepName, StepOutcome,
    StepPolicy,
};
use crate::domain::model::{AutoReplyConfig, MembershipKind, OneTimeCredential};
use crate::domain::ports::{DirectoryPort, MailboxPort};
use crate::utils::error::Result;
use std::time::{Duration, Instant};

/// 一次停用流程的輸入。轉寄目標可以不給（或給空字串），
/// 憑證值由呼叫端產生，流程結束後即丟棄。
pub struct OffboardRequest {
    pub user: String,
    pub forwarding_target: Option<String>,
    pub auto_reply: AutoReplyConfig,
    pub credential: OneTimeCredential,
}

/// 依固定順序對兩個子系統執行停用步驟的協調器。
/// 失敗不重試、不回滾；每一步的結果記入報告後依政策決定是否前進。
pub struct OffboardingWorkflow<D: DirectoryPort, M: MailboxPort> {
    directory: D,
    mailbox: M,
}

/// 步驟收尾後的流程走向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Abort,
    SkipBranch,
}

/// 信箱分支資格，整個分支只判定一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchEligibility {
    Eligible,
    Skip(SkipReason),
}

impl<D: DirectoryPort, M: MailboxPort> OffboardingWorkflow<D, M> {
    pub fn new(directory: D, mailbox: M) -> Self {
        Self { directory, mailbox }
    }

    /// 交還兩個連線供呼叫端收尾。
    pub fn into_ports(self) -> (D, M) {
        (self.directory, self.mailbox)
    }

    pub async fn run(&self, request: &OffboardRequest) -> OffboardingReport {
        let user = request.user.as_str();
        let mut report = ReportBuilder::new(user);

        tracing::info!("Starting offboarding for {}", user);

        // 快照只讀一次，授權集合沿用到最後一步
        let started = Instant::now();
        let identity = match self.directory.get_identity(user).await {
            Ok(identity) => {
                tracing::info!(
                    "✅ {}: {} ({} license grants)",
                    StepName::FetchIdentity,
                    identity.display_name,
                    identity.license_skus.len()
                );
                report.record(StepName::FetchIdentity, StepOutcome::Success, started.elapsed());
                identity
            }
            Err(e) => {
                tracing::error!("❌ {} failed, aborting: {}", StepName::FetchIdentity, e);
                report.record(
                    StepName::FetchIdentity,
                    StepOutcome::Failed { detail: e.to_string() },
                    started.elapsed(),
                );
                return report.finish();
            }
        };

        // 撤銷存取的三個步驟，任何失敗都中止
        let started = Instant::now();
        let result = self.directory.disable_sign_in(user).await;
        if finish_step(&mut report, StepName::DisableSignIn, result, started.elapsed()) == Flow::Abort {
            return report.finish();
        }

        let started = Instant::now();
        let result = self
            .directory
            .set_one_time_credential(user, &request.credential)
            .await;
        if finish_step(&mut report, StepName::ResetCredential, result, started.elapsed()) == Flow::Abort {
            return report.finish();
        }

        let started = Instant::now();
        let result = self.directory.revoke_all_sessions(user).await;
        if finish_step(&mut report, StepName::RevokeSessions, result, started.elapsed()) == Flow::Abort {
            return report.finish();
        }

        self.remove_group_memberships(user, &mut report).await;

        match self.mailbox_branch_eligibility(user).await {
            BranchEligibility::Skip(reason) => {
                tracing::warn!("📪 Skipping mailbox steps: {}", reason);
                for step in StepName::MAILBOX_BRANCH {
                    report.record(step, StepOutcome::Skipped { reason }, Duration::ZERO);
                }
            }
            BranchEligibility::Eligible => {
                self.process_mailbox(user, request, &mut report).await;
            }
        }

        // 授權移除只依據快照；空集合是合法的 no-op
        let started = Instant::now();
        if identity.license_skus.is_empty() {
            tracing::info!("No license grants on the snapshot, nothing to reclaim");
        }
        let result = self
            .directory
            .remove_license_grants(user, &identity.license_skus)
            .await;
        finish_step(&mut report, StepName::RemoveLicenses, result, started.elapsed());

        let report = report.finish();
        tracing::info!("Offboarding for {} finished: {}", user, report.overall);
        report
    }

    /// 逐一移除群組成員資格。單項失敗只記錄，不會中止整個流程。
    async fn remove_group_memberships(&self, user: &str, report: &mut ReportBuilder) {
        let started = Instant::now();
        let memberships = match self.directory.list_group_memberships(user).await {
            Ok(memberships) => memberships,
            Err(e) => {
                tracing::warn!("⚠️ Could not enumerate group memberships: {}", e);
                report.record(
                    StepName::RemoveGroupMemberships,
                    StepOutcome::Failed { detail: e.to_string() },
                    started.elapsed(),
                );
                return;
            }
        };

        // memberOf 也會連到角色等其他物件，只有真正的群組可以動
        let groups: Vec<_> = memberships
            .into_iter()
            .filter(|membership| membership.kind == MembershipKind::Group)
            .collect();

        let mut items = Vec::with_capacity(groups.len());
        let mut failures = 0usize;

        for group in &groups {
            let result = match self.directory.remove_group_membership(user, &group.id).await {
                Ok(()) => {
                    tracing::info!("✅ Removed from group {}", group.display_name);
                    ItemResult::Removed
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!("⚠️ Could not remove from group {}: {}", group.display_name, e);
                    ItemResult::Failed { detail: e.to_string() }
                }
            };
            items.push(ItemOutcome {
                id: group.id.clone(),
                display_name: group.display_name.clone(),
                result,
            });
        }

        let outcome = if failures == 0 {
            StepOutcome::Success
        } else {
            StepOutcome::Failed {
                detail: format!(
                    "{}/{} group memberships could not be removed",
                    failures,
                    groups.len()
                ),
            }
        };
        report.record_items(StepName::RemoveGroupMemberships, outcome, items, started.elapsed());
    }

    async fn mailbox_branch_eligibility(&self, user: &str) -> BranchEligibility {
        if !self.mailbox.probe_availability().await {
            return BranchEligibility::Skip(SkipReason::MailboxServiceUnavailable);
        }
        match self.mailbox.mailbox_exists(user).await {
            Ok(true) => BranchEligibility::Eligible,
            Ok(false) => BranchEligibility::Skip(SkipReason::MailboxAbsent),
            Err(e) => {
                tracing::warn!("⚠️ Mailbox lookup failed, treating service as unavailable: {}", e);
                BranchEligibility::Skip(SkipReason::MailboxServiceUnavailable)
            }
        }
    }

    async fn process_mailbox(
        &self,
        user: &str,
        request: &OffboardRequest,
        report: &mut ReportBuilder,
    ) {
        let started = Instant::now();
        let result = self.mailbox.convert_to_shared(user).await;
        if finish_step(report, StepName::ConvertMailbox, result, started.elapsed()) == Flow::SkipBranch {
            // 轉換失敗後，轉寄和自動回覆的前提不成立
            for step in [StepName::SetForwarding, StepName::SetAutoReply] {
                report.record(
                    step,
                    StepOutcome::Skipped {
                        reason: SkipReason::ConversionFailed,
                    },
                    Duration::ZERO,
                );
            }
            return;
        }

        match request.forwarding_target.as_deref().map(str::trim) {
            Some(target) if !target.is_empty() => {
                let started = Instant::now();
                let result = self.mailbox.set_forwarding(user, target).await;
                finish_step(report, StepName::SetForwarding, result, started.elapsed());
            }
            _ => {
                tracing::info!("⏭️ No forwarding target supplied, skipping forwarding");
                report.record(
                    StepName::SetForwarding,
                    StepOutcome::Skipped {
                        reason: SkipReason::NoForwardingTarget,
                    },
                    Duration::ZERO,
                );
            }
        }

        let started = Instant::now();
        let result = self.mailbox.set_auto_reply(user, &request.auto_reply).await;
        finish_step(report, StepName::SetAutoReply, result, started.elapsed());
    }
}

/// 單一的步驟收尾程序：記錄結果，並依步驟政策決定流程走向。
fn finish_step(
    report: &mut ReportBuilder,
    step: StepName,
    result: Result<()>,
    elapsed: Duration,
) -> Flow {
    match result {
        Ok(()) => {
            tracing::info!("✅ {}", step);
            report.record(step, StepOutcome::Success, elapsed);
            Flow::Continue
        }
        Err(e) => {
            let detail = e.to_string();
            let flow = match step.policy() {
                StepPolicy::Fatal => {
                    tracing::error!("❌ {} failed, aborting: {}", step, detail);
                    Flow::Abort
                }
                StepPolicy::SkipBranch => {
                    tracing::warn!("⚠️ {} failed, skipping the rest of the branch: {}", step, detail);
                    Flow::SkipBranch
                }
                StepPolicy::ContinueItem => {
                    tracing::warn!("⚠️ {} failed, continuing: {}", step, detail);
                    Flow::Continue
                }
            };
            report.record(step, StepOutcome::Failed { detail }, elapsed);
            flow
        }
    }
}
