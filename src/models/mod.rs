pub mod analysis;
pub mod document;
pub mod session;
pub mod wire;

pub use analysis::{AnalysisResult, CandidateAnalysis, CandidateScore, FitLabel, RankingResult};
pub use document::Document;
pub use session::{AuthStatus, AuthToken, Redemption, SessionSnapshot};
