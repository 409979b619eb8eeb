//! 视图投影
//!
//! 纯函数：{认证状态, 积分, 任务状态, 结果, 错误} → 可渲染结构

use crate::models::{AnalysisResult, AuthStatus, CandidateAnalysis, RankingResult, SessionSnapshot};
use crate::workflow::{JobSnapshot, JobState};
use std::fmt;

/// 视图模型
#[derive(Debug, Clone, PartialEq)]
pub enum ViewModel {
    Login,
    Workspace(WorkspaceView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceView {
    pub credits_label: String,
    pub can_submit: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Single(SingleView),
    Ranking(RankingView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleView {
    pub name: String,
    pub contact: Vec<String>,
    pub score_label: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingView {
    pub rows: Vec<RankingRow>,
    pub conclusion: String,
    pub can_export: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub position: usize,
    pub name: String,
    pub score_label: String,
    pub fit_label: String,
    /// 小写的样式键
    pub fit_key: String,
    pub reason_for: String,
    pub reason_against: String,
}

/// 把会话和任务状态投影为视图
pub fn project(session: &SessionSnapshot, job: &JobSnapshot) -> ViewModel {
    let credits = match session.status {
        AuthStatus::Anonymous => return ViewModel::Login,
        AuthStatus::Authenticated { credits } => credits,
    };

    let busy = job.state == JobState::Submitting;
    let credits_label = match (credits, session.credits_hint) {
        (Some(c), _) => format!("{} 积分", c),
        (None, Some(hint)) => format!("{} 积分 (同步中)", hint),
        (None, None) => "积分同步中".to_string(),
    };

    let result = job.result.as_ref().map(|r| match r {
        AnalysisResult::Single(analysis) => ResultView::Single(single_view(analysis)),
        AnalysisResult::Ranking(ranking) => ResultView::Ranking(ranking_view(ranking, busy)),
    });

    ViewModel::Workspace(WorkspaceView {
        credits_label,
        can_submit: !busy && credits != Some(0),
        busy,
        error: job.error.clone(),
        result,
    })
}

/// 分数显示为 "<score>/100"
pub fn score_label(score: u8) -> String {
    format!("{}/100", score)
}

fn single_view(analysis: &CandidateAnalysis) -> SingleView {
    SingleView {
        name: analysis.name.clone(),
        contact: [analysis.email.as_ref(), analysis.phone.as_ref()]
            .into_iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect(),
        score_label: score_label(analysis.score),
        strengths: analysis.strengths.clone(),
        improvements: analysis.improvements.clone(),
    }
}

fn ranking_view(ranking: &RankingResult, busy: bool) -> RankingView {
    RankingView {
        rows: ranking
            .ranking
            .iter()
            .enumerate()
            .map(|(i, c)| RankingRow {
                position: i + 1,
                name: c.name.clone(),
                score_label: score_label(c.score),
                fit_label: c.fit.as_str().to_string(),
                fit_key: c.fit.display_key(),
                reason_for: c.reason_for.clone(),
                reason_against: c.reason_against.clone(),
            })
            .collect(),
        conclusion: ranking.conclusion.clone(),
        can_export: !busy && !ranking.ranking.is_empty(),
    }
}

// ========== 文本渲染（命令行使用） ==========

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewModel::Login => writeln!(f, "🔒 请先使用访问码登录"),
            ViewModel::Workspace(view) => write!(f, "{}", view),
        }
    }
}

impl fmt::Display for WorkspaceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "⚡ {}", self.credits_label)?;
        if self.busy {
            writeln!(f, "⏳ 分析中...")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "❌ {}", error)?;
        }
        if let Some(result) = &self.result {
            write!(f, "{}", result)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultView::Single(view) => {
                writeln!(f, "👤 {}  {}", view.name, view.score_label)?;
                for line in &view.contact {
                    writeln!(f, "   {}", line)?;
                }
                writeln!(f, "优势:")?;
                for s in &view.strengths {
                    writeln!(f, "  ✅ {}", s)?;
                }
                writeln!(f, "改进:")?;
                for s in &view.improvements {
                    writeln!(f, "  ⚠️ {}", s)?;
                }
                Ok(())
            }
            ResultView::Ranking(view) => {
                writeln!(f, "{}", "=".repeat(60))?;
                writeln!(f, "📊 候选人排名")?;
                writeln!(f, "{}", "=".repeat(60))?;
                for row in &view.rows {
                    writeln!(
                        f,
                        "{:>2}. {}  {}  [{}]",
                        row.position, row.name, row.score_label, row.fit_label
                    )?;
                    writeln!(f, "    ✅ {}", row.reason_for)?;
                    writeln!(f, "    ⚠️ {}", row.reason_against)?;
                }
                writeln!(f, "{}", "─".repeat(60))?;
                writeln!(f, "结论: {}", view.conclusion)
            }
        }
    }
}
