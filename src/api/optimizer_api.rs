// ==========================================
// PPC 竞价优化引擎 - 优化 API
// ==========================================
// 职责: 串联 导入 → 活动索引 → 决策 → 审核提交 → 导出 → 快照
// 红线: 结构性导入错误整批失败; 快照失败不阻断导出
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{load_settings, OptimizerConfigReader, OptimizerSettings};
use crate::domain::change::{ChangeSet, ChangeSummary, FinalChangeSet};
use crate::domain::report::{KeywordRow, RowError};
use crate::domain::snapshot::WeeklySnapshot;
use crate::domain::types::{ExportFormat, ExportLocale};
use crate::engine::analysis::{AnalysisReport, PerformanceAnalyzer};
use crate::engine::campaign_index::{CampaignConflict, CampaignIndexBuilder};
use crate::engine::decision::DecisionEngine;
use crate::engine::exporter;
use crate::engine::snapshot::{SnapshotOutcome, SnapshotWriter};
use crate::importer::{BulkIngest, ReportImporter, SearchTermIngest, TabularSource};
use crate::repository::WeeklySnapshotRepository;

// ==========================================
// 请求 / 响应
// ==========================================

/// 一次运行的输入: 两份报表 + 可选目标 ACOS 覆写
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub bulk: TabularSource,
    pub search_terms: TabularSource,
    /// 百分数; None 时使用配置值
    pub target_acos_pct: Option<f64>,
}

/// 运行结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    ChangesProposed,
    NoChanges,
    PartialWithRowErrors,
}

impl RunStatus {
    fn classify(changes: usize, row_errors: usize) -> Self {
        if row_errors > 0 {
            RunStatus::PartialWithRowErrors
        } else if changes == 0 {
            RunStatus::NoChanges
        } else {
            RunStatus::ChangesProposed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::ChangesProposed => "CHANGES_PROPOSED",
            RunStatus::NoChanges => "NO_CHANGES",
            RunStatus::PartialWithRowErrors => "PARTIAL_WITH_ROW_ERRORS",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub run_id: String,
    pub status: RunStatus,
    pub draft: ChangeSet,
    pub summary: ChangeSummary,
    /// Bulk 行错误、活动重名警告、搜索词行错误（依次）
    pub row_errors: Vec<RowError>,
    pub campaign_conflicts: Vec<CampaignConflict>,
    pub analysis: AnalysisReport,
    /// 快照需要的关键词行
    pub keyword_rows: Vec<KeywordRow>,
}

/// 落盘的草稿（供之后审核）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftDocument {
    pub run_id: String,
    pub draft: ChangeSet,
    pub keyword_rows: Vec<KeywordRow>,
}

impl From<&OptimizeResponse> for DraftDocument {
    fn from(response: &OptimizeResponse) -> Self {
        Self {
            run_id: response.run_id.clone(),
            draft: response.draft.clone(),
            keyword_rows: response.keyword_rows.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FinalizeResponse {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub summary: ChangeSummary,
    pub snapshot: SnapshotOutcome,
}

struct Ingested {
    bulk: BulkIngest,
    search_terms: SearchTermIngest,
}

// ==========================================
// OptimizerApi
// ==========================================
pub struct OptimizerApi {
    settings: OptimizerSettings,
    snapshot_repo: Arc<dyn WeeklySnapshotRepository>,
    snapshot_writer: SnapshotWriter,
}

impl OptimizerApi {
    /// # 参数
    /// - settings: 已合并 CLI 覆写的运行设置
    /// - snapshot_repo: 周度快照仓储
    pub fn new(settings: OptimizerSettings, snapshot_repo: Arc<dyn WeeklySnapshotRepository>) -> Self {
        Self {
            settings,
            snapshot_writer: SnapshotWriter::new(snapshot_repo.clone()),
            snapshot_repo,
        }
    }

    /// 从配置读取设置后创建
    pub async fn from_config<R>(
        reader: &R,
        snapshot_repo: Arc<dyn WeeklySnapshotRepository>,
    ) -> ApiResult<Self>
    where
        R: OptimizerConfigReader + ?Sized,
    {
        let settings = load_settings(reader).await?;
        Ok(Self::new(settings, snapshot_repo))
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    fn target_acos(&self, request: &ReportRequest) -> ApiResult<f64> {
        let pct = request
            .target_acos_pct
            .unwrap_or(self.settings.target_acos_pct);
        if !pct.is_finite() || pct < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "target ACOS must be a non-negative percentage, got {}",
                pct
            )));
        }
        Ok(pct / 100.0)
    }

    fn ingest(&self, request: &ReportRequest) -> ApiResult<Ingested> {
        let importer = ReportImporter::new(self.settings.acos_is_percent);
        let bulk = importer.ingest_bulk(&request.bulk)?;
        let search_terms = importer.ingest_search_terms(&request.search_terms)?;
        Ok(Ingested { bulk, search_terms })
    }

    /// 表现分析（只读,不产生变更）
    #[instrument(skip_all, fields(bulk = %request.bulk.file_name))]
    pub fn analyze(&self, request: &ReportRequest) -> ApiResult<AnalysisReport> {
        let target_acos = self.target_acos(request)?;
        let ingested = self.ingest(request)?;
        let keywords = ingested.bulk.keyword_rows();

        Ok(PerformanceAnalyzer::new(self.settings.decision.clone()).analyze(
            &keywords,
            &ingested.search_terms.rows,
            target_acos,
        ))
    }

    /// 生成草稿变更集
    ///
    /// # 返回
    /// - Ok(OptimizeResponse): 草稿 + 行错误 + 状态
    /// - Err(ApiError::Ingestion): 任一报表缺少标识列,无任何变更
    #[instrument(skip_all, fields(bulk = %request.bulk.file_name, search_terms = %request.search_terms.file_name))]
    pub fn optimize(&self, request: &ReportRequest) -> ApiResult<OptimizeResponse> {
        let target_acos = self.target_acos(request)?;
        let ingested = self.ingest(request)?;
        let keywords = ingested.bulk.keyword_rows();

        // 索引构建必须先于决策
        let build = CampaignIndexBuilder::new(self.settings.duplicate_policy).build(&ingested.bulk.rows);
        for conflict in &build.conflicts {
            warn!(
                campaign = %conflict.campaign_name,
                kept = %conflict.kept_id,
                discarded = %conflict.discarded_id,
                "活动名称重复"
            );
        }

        let engine = DecisionEngine::new(self.settings.decision.clone());
        let draft = engine.decide(&keywords, &ingested.search_terms.rows, &build.index, target_acos);
        let analysis = PerformanceAnalyzer::new(self.settings.decision.clone()).analyze(
            &keywords,
            &ingested.search_terms.rows,
            target_acos,
        );

        let mut row_errors = ingested.bulk.errors;
        row_errors.extend(build.conflicts.iter().map(CampaignConflict::to_row_error));
        row_errors.extend(ingested.search_terms.errors);

        let summary = draft.summary();
        let status = RunStatus::classify(draft.len(), row_errors.len());
        let run_id = Uuid::new_v4().to_string();

        info!(
            run_id = %run_id,
            status = status.as_str(),
            updates = summary.updates,
            creates = summary.new_keywords,
            row_errors = row_errors.len(),
            "优化草稿已生成"
        );

        Ok(OptimizeResponse {
            run_id,
            status,
            draft,
            summary,
            row_errors,
            campaign_conflicts: build.conflicts,
            analysis,
            keyword_rows: keywords,
        })
    }

    /// 导出最终变更集并写入周度快照
    ///
    /// 导出先于快照; 快照失败只体现在 snapshot 字段
    #[instrument(skip(self, final_set, keyword_rows), fields(changes = final_set.len()))]
    pub async fn finalize(
        &self,
        final_set: &FinalChangeSet,
        keyword_rows: &[KeywordRow],
        client_id: &str,
        today: NaiveDate,
        locale: ExportLocale,
        format: ExportFormat,
    ) -> ApiResult<FinalizeResponse> {
        let bytes = exporter::serialize(final_set, locale, format)?;
        let file_name = exporter::file_name(today, locale, format);
        info!(file = %file_name, bytes = bytes.len(), "导出完成");

        let snapshot = self
            .snapshot_writer
            .record(client_id, keyword_rows, today)
            .await;

        Ok(FinalizeResponse {
            file_name,
            bytes,
            summary: final_set.summary(),
            snapshot,
        })
    }

    /// 客户快照历史（按周倒序）
    pub async fn history(&self, client_id: &str, limit: usize) -> ApiResult<Vec<WeeklySnapshot>> {
        Ok(self.snapshot_repo.list_by_client(client_id, limit).await?)
    }

    /// 写入外部生成的周度摘要
    pub async fn set_ai_summary(
        &self,
        client_id: &str,
        week_start_date: NaiveDate,
        summary: &str,
    ) -> ApiResult<()> {
        Ok(self
            .snapshot_repo
            .set_ai_summary(client_id, week_start_date, summary)
            .await?)
    }
}
