pub mod projection;

pub use projection::{project, score_label, RankingRow, RankingView, ResultView, SingleView, ViewModel, WorkspaceView};
